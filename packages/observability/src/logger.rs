//! Base and child loggers.

use crate::record::{into_fields, Fields};
use crate::sink::{build_sink, Sink};
use crate::{Environment, LogConfig, LogLevel, LogRecord, ObservabilityResult};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// State shared by a base logger and all of its children. Set once at
/// construction, read-only afterwards.
struct Shared {
    environment: Environment,
    min_level: LogLevel,
    sink: Arc<dyn Sink>,
}

/// Structured logger.
///
/// Cloning is cheap. [`Logger::child`] returns a new logger that shares the
/// level, environment and sink of its parent and adds its own bindings.
#[derive(Clone)]
pub struct Logger {
    shared: Arc<Shared>,
    bindings: Fields,
}

impl Logger {
    /// Build a base logger, including its sinks. Sink failures propagate.
    pub fn from_config(config: &LogConfig) -> ObservabilityResult<Self> {
        let sink = build_sink(config)?;
        Ok(Self::with_sink(config.environment, config.min_level, sink))
    }

    /// Build a base logger over an existing sink.
    pub fn with_sink(environment: Environment, min_level: LogLevel, sink: Arc<dyn Sink>) -> Self {
        Self {
            shared: Arc::new(Shared {
                environment,
                min_level,
                sink,
            }),
            bindings: Fields::new(),
        }
    }

    /// Derive a logger whose records also carry `fields`.
    pub fn child(&self, fields: Value) -> Logger {
        let mut bindings = self.bindings.clone();
        for (key, value) in into_fields(fields) {
            if key == "env" {
                continue;
            }
            bindings.insert(key, value);
        }
        Logger {
            shared: Arc::clone(&self.shared),
            bindings,
        }
    }

    pub fn bindings(&self) -> &Fields {
        &self.bindings
    }

    pub fn environment(&self) -> Environment {
        self.shared.environment
    }

    pub fn min_level(&self) -> LogLevel {
        self.shared.min_level
    }

    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level.passes(self.shared.min_level)
    }

    /// Emit a record at `level` if it passes the minimum level.
    pub fn log(&self, level: LogLevel, fields: Value, message: impl Into<String>) {
        if !self.is_enabled(level) {
            return;
        }
        let record = LogRecord::new(
            level,
            self.shared.environment,
            &self.bindings,
            into_fields(fields),
            message.into(),
        );
        self.shared.sink.write(&record);
    }

    pub fn emerg(&self, fields: Value, message: impl Into<String>) {
        self.log(LogLevel::Emerg, fields, message);
    }

    pub fn alert(&self, fields: Value, message: impl Into<String>) {
        self.log(LogLevel::Alert, fields, message);
    }

    pub fn crit(&self, fields: Value, message: impl Into<String>) {
        self.log(LogLevel::Crit, fields, message);
    }

    pub fn error(&self, fields: Value, message: impl Into<String>) {
        self.log(LogLevel::Error, fields, message);
    }

    pub fn warn(&self, fields: Value, message: impl Into<String>) {
        self.log(LogLevel::Warn, fields, message);
    }

    pub fn notice(&self, fields: Value, message: impl Into<String>) {
        self.log(LogLevel::Notice, fields, message);
    }

    pub fn info(&self, fields: Value, message: impl Into<String>) {
        self.log(LogLevel::Info, fields, message);
    }

    pub fn debug(&self, fields: Value, message: impl Into<String>) {
        self.log(LogLevel::Debug, fields, message);
    }

    /// Flush buffered sinks. Call before process exit.
    pub fn flush(&self) {
        self.shared.sink.flush();
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("environment", &self.shared.environment)
            .field("min_level", &self.shared.min_level)
            .field("bindings", &self.bindings)
            .finish()
    }
}
