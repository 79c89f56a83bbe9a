//! Error handling for the Velora client core

use std::fmt;
use thiserror::Error;

/// Unified error type for the Velora client core
#[derive(Error, Debug)]
pub enum Error {
    /// The session could not be kept alive: refresh failed or no refresh
    /// token was available. The credential store has been cleared.
    #[error("Authentication expired: please log in again")]
    AuthenticationExpired,

    /// Network or transport level errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend returned a well-formed error response
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The payment provider reported a failed checkout
    #[error("Payment failed: {0}")]
    ProviderFailure(String),

    /// The user cancelled the hosted checkout
    #[error("Payment cancelled")]
    ProviderCancelled,

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Credential store read/write errors
    #[error("Credential store error: {0}")]
    Store(String),
}

impl Error {
    /// Create a new server error
    pub fn server<T: fmt::Display>(status: u16, msg: T) -> Self {
        Error::Server {
            status,
            message: msg.to_string(),
        }
    }

    /// Create a new credential store error
    pub fn store<T: fmt::Display>(msg: T) -> Self {
        Error::Store(msg.to_string())
    }
}
