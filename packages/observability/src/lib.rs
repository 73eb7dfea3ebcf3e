//! # Observability
//!
//! Process-wide structured logger for procedure calls.
//!
//! ## Design
//!
//! - Syslog priority levels only (`emerg`=80 .. `debug`=10). Level names
//!   outside that set are rejected.
//! - One base logger per process, built lazily behind a single-initialization
//!   guard and never torn down. Per-call loggers are children of it.
//! - Every record is a JSON object with `level`, `timestamp`, `env`, the
//!   logger's bindings, the record's fields and `message`.
//! - Where records go is decided once, at construction, from the deployment
//!   environment and whether a cloud credential is present (see [`sink`]).
//!
//! ## Usage
//!
//! ```rust,ignore
//! fn main() -> anyhow::Result<()> {
//!     let logger = observability::init(observability::LogConfig::from_env()?)?;
//!     let call_logger = logger.child(serde_json::json!({ "path": "me.get" }));
//!     call_logger.info(serde_json::Value::Null, "ready");
//!     Ok(())
//! }
//! ```
//!
//! The crate's own diagnostics (dropped records, failed shipments) go
//! through `tracing`; binaries install [`init_diagnostics`] to see them.

mod environment;
mod error;
mod level;
mod logger;
mod record;
pub mod sink;

pub use environment::Environment;
pub use error::{ObservabilityError, ObservabilityResult};
pub use level::LogLevel;
pub use logger::Logger;
pub use record::{into_fields, Fields, LogRecord};

use once_cell::sync::OnceCell;
use url::Url;

const DEFAULT_DD_SITE: &str = "datadoghq.com";
const DEFAULT_SERVICE_NAME: &str = "app";

static BASE_LOGGER: OnceCell<Logger> = OnceCell::new();

/// Cloud sink configuration.
#[derive(Debug, Clone)]
pub struct CloudSinkConfig {
    /// Intake API key. Its presence is what enables the cloud sink.
    pub api_key: String,
    /// Datadog site, e.g. `datadoghq.com` or `datadoghq.eu`.
    pub site: String,
    /// `ddsource` attribute.
    pub source: String,
    /// Ship every record as soon as it is written.
    pub send_immediate: bool,
    /// Max records per shipment when not sending immediately.
    pub batch_size: usize,
    /// Internal queue capacity.
    pub queue_capacity: usize,
    /// Flush interval in milliseconds.
    pub flush_interval_ms: u64,
}

impl CloudSinkConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            site: DEFAULT_DD_SITE.to_string(),
            source: "rust".to_string(),
            send_immediate: true,
            batch_size: 50,
            queue_capacity: 2_000,
            flush_interval_ms: 2_000,
        }
    }

    /// Logs intake URL for the configured site.
    pub fn endpoint(&self) -> ObservabilityResult<Url> {
        let site = self.site.trim().trim_end_matches('/');
        Ok(Url::parse(&format!("https://http-intake.logs.{site}/api/v2/logs"))?)
    }
}

/// Configuration for the base logger.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Service name used to tag cloud records.
    pub service_name: String,

    /// Deployment environment, written to every record as `env`.
    pub environment: Environment,

    /// Minimum level emitted.
    pub min_level: LogLevel,

    /// Cloud sink credential and settings. `None` disables the cloud sink.
    pub cloud: Option<CloudSinkConfig>,

    /// Colorize local output.
    pub colorize: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.into(),
            environment: Environment::Development,
            min_level: LogLevel::Info,
            cloud: None,
            colorize: true,
        }
    }
}

impl LogConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> ObservabilityResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup`.
    ///
    /// Variables: `APP_ENV`, `APP_NAME`, `LOG_LEVEL`, `DATADOG_API_KEY`,
    /// `DD_SITE`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> ObservabilityResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).and_then(non_empty);

        let environment = match get("APP_ENV") {
            Some(raw) => raw.parse()?,
            None => Environment::default(),
        };
        let min_level = match get("LOG_LEVEL") {
            Some(raw) => raw.parse()?,
            None => LogLevel::default(),
        };
        let service_name = get("APP_NAME")
            .map(|name| service_name_from(&name))
            .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string());
        let cloud = get("DATADOG_API_KEY").map(|api_key| CloudSinkConfig {
            site: get("DD_SITE").unwrap_or_else(|| DEFAULT_DD_SITE.to_string()),
            ..CloudSinkConfig::new(api_key)
        });

        Ok(Self {
            service_name,
            environment,
            min_level,
            cloud,
            ..Default::default()
        })
    }
}

/// Service tag derived from a display name: whitespace becomes `-`,
/// everything lower-cased.
pub fn service_name_from(app_name: &str) -> String {
    app_name
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// Build the process logger from `config`.
///
/// Fails with [`ObservabilityError::AlreadyInitialized`] if the logger
/// already exists, and with the sink error if construction fails.
pub fn init(config: LogConfig) -> ObservabilityResult<&'static Logger> {
    let mut created = false;
    let logger = BASE_LOGGER.get_or_try_init(|| {
        created = true;
        Logger::from_config(&config)
    })?;
    if !created {
        return Err(ObservabilityError::AlreadyInitialized);
    }
    Ok(logger)
}

/// The process logger, built from the environment on first use.
pub fn logger() -> ObservabilityResult<&'static Logger> {
    BASE_LOGGER.get_or_try_init(|| Logger::from_config(&LogConfig::from_env()?))
}

/// Install a compact stderr `tracing` subscriber for the crate's own
/// diagnostics. Filter via `RUST_LOG`, default `warn`. Safe to call twice.
pub fn init_diagnostics() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact()
        .try_init();
}

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
