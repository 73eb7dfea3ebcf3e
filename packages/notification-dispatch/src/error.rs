//! Delivery error types.

use thiserror::Error;

/// Failure of a delivery attempt. Terminal for the call that produced it.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// HTTP transport error (connect, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("{provider} rejected the message: HTTP {status}: {body}")]
    Rejected {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// Provider asked to send without its credentials
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

/// Result type alias using DeliveryError.
pub type DeliveryResult<T> = Result<T, DeliveryError>;
