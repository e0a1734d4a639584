use thiserror::Error;

use super::types::MAX_AGE;

/// Input problems detected before any simulation step runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("{field} must be a number, got {value:?}")]
    NotNumeric { field: &'static str, value: String },

    #[error("{field} must be a whole number of years")]
    NotWholeYears { field: &'static str },

    #[error("Invalid {field} {value}. Age should be between 1 and {max}.", max = MAX_AGE)]
    AgeOutOfRange { field: &'static str, value: i64 },

    #[error("Retirement age must be greater than current age")]
    RetirementNotAfterCurrent { current_age: i64, retirement_age: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Calculation error: balance became too large or invalid at age {age}")]
    Overflow { age: u32 },
}

impl ProjectionError {
    pub fn kind(&self) -> &'static str {
        match self {
            ProjectionError::Validation(_) => "validation",
            ProjectionError::Overflow { .. } => "overflow",
        }
    }
}
