//! Observability error types.

use thiserror::Error;

/// Errors raised while building or running the logger.
///
/// Everything except [`ObservabilityError::Rejected`] is a startup condition:
/// it propagates out of [`crate::init`] / [`crate::logger`] so the service
/// refuses to start instead of running without logs.
#[derive(Error, Debug)]
pub enum ObservabilityError {
    /// Level name outside the syslog set
    #[error("unknown log level: {0}")]
    UnknownLevel(String),

    /// Deployment environment name not recognized
    #[error("unknown deployment environment: {0}")]
    UnknownEnvironment(String),

    /// Cloud intake endpoint could not be built from the configured site
    #[error("invalid cloud sink endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Cloud intake answered with a non-success status
    #[error("cloud intake rejected batch: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Worker thread could not be spawned
    #[error("failed to start cloud sink worker: {0}")]
    Worker(#[from] std::io::Error),

    /// Worker thread exited before reporting readiness
    #[error("cloud sink worker exited during startup")]
    WorkerGone,

    /// `init` called after the process logger already exists
    #[error("logger already initialized")]
    AlreadyInitialized,
}

/// Result type alias using ObservabilityError.
pub type ObservabilityResult<T> = Result<T, ObservabilityError>;
