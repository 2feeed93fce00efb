//! Error types for engine operations.

use database::DatabaseError;
use mpago_gateway::GatewayError;
use thiserror::Error;

/// Errors that can occur during booking and payment orchestration.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input violates a business invariant.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Slot collision or cross-appointment order mismatch.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Persistence failure, including missing rows.
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// Payment gateway failure, rejection or transport.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl EngineError {
    /// Whether the underlying cause is a missing row.
    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::Database(DatabaseError::NotFound { .. }))
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
