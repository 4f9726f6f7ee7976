//! Errors surfaced by the application layer.
//!
//! Cache faults never appear here: they are logged and treated as misses
//! inside the cache service.

use validator::ValidationErrors;

pub type Result<T> = std::result::Result<T, StorefrontError>;

#[derive(Debug, thiserror::Error)]
pub enum StorefrontError {
    /// A remote call failed. Not retried automatically and never cached.
    #[error("remote request failed: {0:#}")]
    Fetch(#[source] anyhow::Error),

    /// The request failed field validation; no remote call was made.
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationErrors),

    /// The action cannot run in the current state; no remote call was made.
    #[error("action rejected: {0}")]
    Rejected(String),

    /// The view that asked for the result was torn down before delivery.
    #[error("view was torn down before the result was delivered")]
    Cancelled,
}

impl StorefrontError {
    /// True for failures that were blocked locally before any remote call.
    pub fn is_validation(&self) -> bool {
        matches!(self, StorefrontError::Validation(_) | StorefrontError::Rejected(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, StorefrontError::Cancelled)
    }
}
