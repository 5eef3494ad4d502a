//! Error types for the coin economy engine
//!
//! The calculation functions never fail. Errors only come out of policy
//! validation and the strict parsing entry points.

use thiserror::Error;

/// Result type alias for economy operations
pub type Result<T> = std::result::Result<T, EconomyError>;

/// Errors raised by the economy engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EconomyError {
    /// Configuration violates a policy constraint
    #[error("Invalid economy configuration: {0}")]
    InvalidConfig(String),

    /// Difficulty label outside the closed enum (strict mode only)
    #[error("Invalid difficulty: {0:?}")]
    InvalidDifficulty(String),

    /// Penalty label outside the closed enum (strict mode only)
    #[error("Unknown penalty type: {0:?}")]
    UnknownPenaltyType(String),
}

impl EconomyError {
    /// Get the error code for API responses
    pub fn code(&self) -> u32 {
        match self {
            Self::InvalidConfig(_) => 2001,
            Self::InvalidDifficulty(_) => 2002,
            Self::UnknownPenaltyType(_) => 2003,
        }
    }

    /// Retrying with the same input never helps for these
    pub fn is_recoverable(&self) -> bool {
        false
    }
}
