//! Magnitude guard for monetary inputs.
//!
//! Market-data sources occasionally report amounts in raw currency units
//! where the model works in crores. No company is large enough to exceed
//! `THRESHOLD` crores, so anything above it is assumed to be raw units and
//! divided by `SCALE_FACTOR`.
//!
//! The guard is idempotent only on already-correct input: a value that is
//! still above `THRESHOLD` after one pass (anything beyond 1e16) gets
//! divided again on a second pass.

use super::types::ValuationInputs;

/// Largest magnitude accepted as already expressed in the working unit.
pub const THRESHOLD: f64 = 1_000_000_000.0;

/// Raw currency units per working unit.
pub const SCALE_FACTOR: f64 = 10_000_000.0;

/// Absent values count as zero.
pub fn normalize(value: impl Into<Option<f64>>) -> f64 {
    let value = value.into().unwrap_or(0.0);
    if value.abs() > THRESHOLD {
        value / SCALE_FACTOR
    } else {
        value
    }
}

/// Copy of `inputs` with revenue, EBIT, cash and debt passed through
/// `normalize`. Rates and the share count are left alone.
pub fn normalize_inputs(inputs: &ValuationInputs) -> ValuationInputs {
    ValuationInputs {
        current_revenue: normalize(inputs.current_revenue),
        current_ebit: normalize(inputs.current_ebit),
        cash_and_equivalents: normalize(inputs.cash_and_equivalents),
        total_debt: normalize(inputs.total_debt),
        ..inputs.clone()
    }
}
