mod engine;
mod error;
mod normalize;
mod types;

pub use engine::{calculate, margin_for_year, weighted_average_cost_of_capital};
pub use error::ValuationError;
pub use normalize::{SCALE_FACTOR, THRESHOLD, normalize, normalize_inputs};
pub use types::{
    MAX_GROWTH_PERIOD_YEARS, MonetaryUnit, ValuationInputs, ValuationResult, YearProjection,
};
