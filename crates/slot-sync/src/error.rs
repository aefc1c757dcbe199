//! Error types for sync runs and collaborator calls.

use slot_engine::EngineError;
use thiserror::Error;

/// A failed call to a remote collaborator (slot store, calendar, cursor store).
///
/// Provider errors are never retried inside a run; the next scheduled run
/// converges instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// The remote answered with a non-2xx status.
    #[error("HTTP {code}: {message}")]
    Status { code: u16, message: String },

    /// The response could not be parsed.
    #[error("Unparsable payload: {0}")]
    Payload(String),

    /// The remote could not be reached.
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

/// Errors that abort a whole sync run.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The configuration source is unusable (missing headers, unreadable store).
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid settings: {0}")]
    Settings(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
