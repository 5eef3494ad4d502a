//! # Coinloop Service
//!
//! Transactional front of the coin economy: configuration loading and the
//! [`EconomyService`] that runs each economy operation against a
//! [`StateStore`](coinloop_storage::StateStore).

pub mod config;
pub mod error;
pub mod service;

pub use config::{CoinloopConfig, LoggingConfig, ServiceConfig, StorageConfig};
pub use error::{Result, ServiceError};
pub use service::{CompletionEvent, CompletionReceipt, EconomyService};
