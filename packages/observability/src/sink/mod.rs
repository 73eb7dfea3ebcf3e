//! Log sinks and the environment-driven sink policy.
//!
//! ```text
//!                 cloud credential?
//!                 no            yes
//! development  |  Local    |  FanOut (Local + Cloud)
//! test         |  Local    |  FanOut (Local + Cloud)
//! staging      |  Local    |  Cloud
//! production   |  Local    |  Cloud
//! ```

mod cloud;
mod memory;
mod pretty;

pub use cloud::{CloudLogEntry, CloudSink, CloudTransport, DatadogTransport};
pub use memory::MemorySink;
pub use pretty::PrettySink;

use crate::{Environment, LogConfig, LogRecord, ObservabilityResult};
use std::sync::Arc;

/// Destination for emitted records.
pub trait Sink: Send + Sync {
    /// Write one record. Must not block on network I/O.
    fn write(&self, record: &LogRecord);

    /// Push out anything buffered. Default: nothing buffered.
    fn flush(&self) {}
}

/// Which sinks a logger writes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkPolicy {
    /// Human-readable colorized output only.
    Local,
    /// Cloud log intake only.
    Cloud,
    /// Both: pretty output for humans plus a cloud copy.
    FanOut,
}

/// Resolve the sink policy from the environment and credential presence.
pub fn resolve_sink_policy(environment: Environment, has_cloud_credential: bool) -> SinkPolicy {
    match (has_cloud_credential, environment.is_local()) {
        (false, _) => SinkPolicy::Local,
        (true, true) => SinkPolicy::FanOut,
        (true, false) => SinkPolicy::Cloud,
    }
}

/// Writes every record to each inner sink in order.
pub struct FanOutSink {
    sinks: Vec<Arc<dyn Sink>>,
}

impl FanOutSink {
    pub fn new(sinks: Vec<Arc<dyn Sink>>) -> Self {
        Self { sinks }
    }
}

impl Sink for FanOutSink {
    fn write(&self, record: &LogRecord) {
        for sink in &self.sinks {
            sink.write(record);
        }
    }

    fn flush(&self) {
        for sink in &self.sinks {
            sink.flush();
        }
    }
}

/// Assemble the sink for `policy`. Only the constructors the policy needs are
/// invoked; a cloud constructor failure propagates.
pub fn assemble_sink<L, C>(policy: SinkPolicy, local: L, cloud: C) -> ObservabilityResult<Arc<dyn Sink>>
where
    L: FnOnce() -> Arc<dyn Sink>,
    C: FnOnce() -> ObservabilityResult<Arc<dyn Sink>>,
{
    Ok(match policy {
        SinkPolicy::Local => local(),
        SinkPolicy::Cloud => cloud()?,
        SinkPolicy::FanOut => {
            let cloud = cloud()?;
            Arc::new(FanOutSink::new(vec![local(), cloud]))
        }
    })
}

/// Build the production sink for `config`.
pub fn build_sink(config: &LogConfig) -> ObservabilityResult<Arc<dyn Sink>> {
    let policy = resolve_sink_policy(config.environment, config.cloud.is_some());

    tracing::debug!(
        environment = %config.environment,
        policy = ?policy,
        "resolved log sink policy"
    );

    let local = || Arc::new(PrettySink::stdout(config.colorize)) as Arc<dyn Sink>;
    let Some(cloud) = &config.cloud else {
        return Ok(local());
    };

    assemble_sink(policy, local, || {
        let sink = CloudSink::new(cloud, config.environment, &config.service_name)?;
        Ok(Arc::new(sink) as Arc<dyn Sink>)
    })
}
