//! Service configuration.
//!
//! Everything is read from the process environment once at startup:
//!
//! | Variable | Default |
//! |---|---|
//! | `APP_ENV` | `development` |
//! | `APP_NAME` | `app` |
//! | `LOG_LEVEL` | `info` |
//! | `DATADOG_API_KEY`, `DD_SITE` | unset, `datadoghq.com` |
//! | `TRACE_ID_HEADER` | `x-datadog-trace-id` |
//! | `POSTMAN_API_KEY`, `POSTMAN_API_URL` | unset, Postman transactional endpoint |
//! | `SENDGRID_API_KEY`, `SENDGRID_FROM_ADDRESS` | unset |
//!
//! Blank values count as unset.

use http::header::{HeaderName, InvalidHeaderName};
use notification_dispatch::MailConfig;
use observability::{LogConfig, Logger, ObservabilityError};
use procedure_middleware::trace::DEFAULT_TRACE_ID_HEADER;
use procedure_middleware::{ProcedureFactory, UserStore};
use std::sync::Arc;
use thiserror::Error;

/// Configuration error type.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid logging settings (unknown environment or level)
    #[error("Logging configuration: {0}")]
    Logging(#[from] ObservabilityError),

    /// `TRACE_ID_HEADER` is not a valid header name
    #[error("Invalid TRACE_ID_HEADER: {0}")]
    TraceHeader(#[from] InvalidHeaderName),
}

/// Result type alias using ConfigError.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Full service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub log: LogConfig,
    pub mail: MailConfig,
    /// Inbound header carrying the upstream trace id.
    pub trace_header: HeaderName,
}

impl ServiceConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let log = LogConfig::from_lookup(&lookup)?;
        let mail = MailConfig::from_lookup(&lookup);
        let trace_header = match lookup("TRACE_ID_HEADER").map(|v| v.trim().to_ascii_lowercase()) {
            Some(name) if !name.is_empty() => HeaderName::try_from(name)?,
            _ => HeaderName::from_static(DEFAULT_TRACE_ID_HEADER),
        };
        Ok(Self {
            log,
            mail,
            trace_header,
        })
    }

    /// Procedure factory that correlates calls through `trace_header`.
    pub fn procedure_factory(&self, logger: Logger, store: Arc<dyn UserStore>) -> ProcedureFactory {
        ProcedureFactory::new(logger, store).with_trace_header(self.trace_header.clone())
    }
}
