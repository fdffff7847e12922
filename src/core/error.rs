use thiserror::Error;

/// Everything `calculate` can reject or fail on. No partial results are
/// ever returned alongside an error.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValuationError {
    /// A field is missing, non-finite or outside its documented domain.
    #[error("invalid input `{field}`: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    /// The perpetuity spread `wacc - terminal_growth_rate` is zero.
    #[error(
        "terminal value undefined: wacc ({wacc}) equals terminal growth rate ({terminal_growth_rate})"
    )]
    TerminalValueUndefined {
        wacc: f64,
        terminal_growth_rate: f64,
    },

    /// An intermediate or final quantity overflowed or became NaN.
    #[error("non-finite result while computing {quantity}")]
    NonFiniteResult { quantity: &'static str },
}

impl ValuationError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// Stable snake_case identifier used in service error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid_input",
            Self::TerminalValueUndefined { .. } => "terminal_value_undefined",
            Self::NonFiniteResult { .. } => "non_finite_result",
        }
    }

    pub fn is_domain_error(&self) -> bool {
        !matches!(self, Self::InvalidInput { .. })
    }
}
