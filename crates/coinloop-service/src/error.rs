//! Service error types

use coinloop_economics::EconomyError;
use coinloop_storage::StorageError;
use thiserror::Error;

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors surfaced by the economy service
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Economy(#[from] EconomyError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Every attempt lost the commit race; the stored state is untouched
    #[error("Commit failed after {attempts} attempts")]
    CommitRetriesExhausted { attempts: u32 },
}

impl ServiceError {
    /// Check if the caller can simply try again
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_recoverable(),
            Self::CommitRetriesExhausted { .. } => true,
            Self::Economy(_) | Self::Config(_) => false,
        }
    }
}
