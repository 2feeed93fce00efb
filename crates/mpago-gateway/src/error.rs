//! Gateway error types.
//!
//! Transport failures and gateway rejections are distinct classes: a request
//! that never produced an HTTP response is [`GatewayError::Network`] and the
//! charge may still have succeeded server-side, while
//! [`GatewayError::Rejected`] means the gateway answered and declined.

use thiserror::Error;

/// Errors that can occur talking to the payment gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Missing or unusable credentials/settings.
    #[error("gateway configuration error: {0}")]
    Configuration(String),

    /// Transport-level failure (connect, timeout, body read). The outcome of
    /// the charge is unknown and must be resolved by polling.
    #[error("gateway network error: {0}")]
    Network(String),

    /// The gateway responded with an error status.
    #[error("gateway rejected request ({status}): {code}: {message}")]
    Rejected {
        status: u16,
        code: String,
        message: String,
        /// Safe to show to an end user.
        user_message: String,
    },

    /// The gateway answered 2xx but the body did not carry what it must.
    #[error("invalid gateway response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Message safe to surface to an end user. Rejections carry their mapped
    /// message; everything else gets a generic retry line so provider
    /// internals never leak.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Rejected { user_message, .. } => user_message.clone(),
            _ => crate::messages::GENERIC_RETRY.to_string(),
        }
    }
}

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
