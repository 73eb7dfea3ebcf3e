//! Cloud log intake sink (Datadog HTTP intake) with a dedicated shipping thread.

use super::Sink;
use crate::{CloudSinkConfig, Environment, LogRecord, ObservabilityError, ObservabilityResult};
use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::mpsc::{sync_channel, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::time::Duration;
use url::Url;

const FLUSH_WAIT: Duration = Duration::from_secs(5);
const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

const DENYLIST_KEYS: [&str; 9] = [
    "authorization",
    "cookie",
    "token",
    "password",
    "secret",
    "api_key",
    "apikey",
    "api-key",
    "private_key",
];

/// One item of the intake payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CloudLogEntry {
    pub ddsource: String,
    pub ddtags: String,
    pub service: String,
    /// The full record serialized as JSON; the intake parses it into attributes.
    pub message: String,
}

/// Ships batches to the intake. Runs on the sink worker thread only.
pub trait CloudTransport {
    fn ship(&self, batch: &[CloudLogEntry]) -> ObservabilityResult<()>;
}

/// HTTP transport for the Datadog logs intake.
pub struct DatadogTransport {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl DatadogTransport {
    /// Must be called off any async runtime; the blocking client owns one.
    pub fn new(endpoint: Url, api_key: String) -> ObservabilityResult<Self> {
        let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

impl CloudTransport for DatadogTransport {
    fn ship(&self, batch: &[CloudLogEntry]) -> ObservabilityResult<()> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header("DD-API-KEY", &self.api_key)
            .json(batch)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ObservabilityError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

enum WorkerMessage {
    Entry(CloudLogEntry),
    Flush(SyncSender<()>),
}

/// Settings the worker needs, resolved once at construction.
#[derive(Debug, Clone)]
struct WorkerSettings {
    batch_size: usize,
    flush_interval: Duration,
}

/// Non-blocking sink: records are queued and shipped by a background thread.
pub struct CloudSink {
    sender: SyncSender<WorkerMessage>,
    ddsource: String,
    ddtags: String,
    service: String,
}

impl CloudSink {
    /// Build the sink with the Datadog HTTP transport.
    pub fn new(
        config: &CloudSinkConfig,
        environment: Environment,
        service: &str,
    ) -> ObservabilityResult<Self> {
        let endpoint = config.endpoint()?;
        let api_key = config.api_key.clone();
        Self::with_transport(config, environment, service, move || {
            DatadogTransport::new(endpoint, api_key)
        })
    }

    /// Build the sink with a custom transport. `make_transport` runs on the
    /// worker thread; its error is returned from here.
    pub fn with_transport<T, F>(
        config: &CloudSinkConfig,
        environment: Environment,
        service: &str,
        make_transport: F,
    ) -> ObservabilityResult<Self>
    where
        T: CloudTransport,
        F: FnOnce() -> ObservabilityResult<T> + Send + 'static,
    {
        let settings = WorkerSettings {
            batch_size: if config.send_immediate {
                1
            } else {
                config.batch_size.max(1)
            },
            flush_interval: Duration::from_millis(config.flush_interval_ms.max(100)),
        };

        let (sender, receiver) = sync_channel(config.queue_capacity.max(100));
        let (ready_tx, ready_rx) = sync_channel::<ObservabilityResult<()>>(1);

        std::thread::Builder::new()
            .name("observability-cloud-sink".to_string())
            .spawn(move || match make_transport() {
                Ok(transport) => {
                    let _ = ready_tx.send(Ok(()));
                    run_sink_worker(receiver, transport, settings);
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            })?;

        ready_rx.recv().map_err(|_| ObservabilityError::WorkerGone)??;

        Ok(Self {
            sender,
            ddsource: config.source.clone(),
            ddtags: format!("env:{},service:{}", environment, service),
            service: service.to_string(),
        })
    }

    fn entry_for(&self, record: &LogRecord) -> CloudLogEntry {
        let message = match record.to_value() {
            Value::Object(map) => Value::Object(sanitize_object(&map)).to_string(),
            other => other.to_string(),
        };
        CloudLogEntry {
            ddsource: self.ddsource.clone(),
            ddtags: self.ddtags.clone(),
            service: self.service.clone(),
            message,
        }
    }
}

impl Sink for CloudSink {
    fn write(&self, record: &LogRecord) {
        match self.sender.try_send(WorkerMessage::Entry(self.entry_for(record))) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!("cloud log queue full, dropping record");
            }
            Err(TrySendError::Disconnected(_)) => {
                tracing::warn!("cloud log worker gone, dropping record");
            }
        }
    }

    /// Blocks until the worker has shipped everything queued so far, or
    /// a few seconds pass.
    fn flush(&self) {
        let (ack_tx, ack_rx) = sync_channel(1);
        if self.sender.send(WorkerMessage::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv_timeout(FLUSH_WAIT);
        }
    }
}

fn run_sink_worker<T: CloudTransport>(
    receiver: Receiver<WorkerMessage>,
    transport: T,
    settings: WorkerSettings,
) {
    let mut batch = Vec::with_capacity(settings.batch_size);

    loop {
        match receiver.recv_timeout(settings.flush_interval) {
            Ok(WorkerMessage::Entry(entry)) => {
                batch.push(entry);
                if batch.len() >= settings.batch_size {
                    ship_batch(&transport, &mut batch);
                }
            }
            Ok(WorkerMessage::Flush(ack)) => {
                ship_batch(&transport, &mut batch);
                let _ = ack.send(());
            }
            Err(RecvTimeoutError::Timeout) => ship_batch(&transport, &mut batch),
            Err(RecvTimeoutError::Disconnected) => {
                ship_batch(&transport, &mut batch);
                break;
            }
        }
    }
}

fn ship_batch<T: CloudTransport>(transport: &T, batch: &mut Vec<CloudLogEntry>) {
    if batch.is_empty() {
        return;
    }
    let entries = std::mem::take(batch);
    if let Err(e) = transport.ship(&entries) {
        tracing::warn!(error = %e, dropped = entries.len(), "failed to ship log batch");
    }
}

fn sanitize_object(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), sanitize_value(k, v)))
        .collect()
}

fn sanitize_value(key: &str, value: &Value) -> Value {
    if is_sensitive_key(key) {
        return Value::String("[REDACTED]".to_string());
    }

    match value {
        Value::Object(map) => Value::Object(sanitize_object(map)),
        Value::Array(items) => Value::Array(items.iter().map(|item| sanitize_value(key, item)).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    DENYLIST_KEYS.iter().any(|entry| lower.contains(entry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Fields, LogLevel};
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct RecordingTransport {
        batches: Arc<Mutex<Vec<Vec<CloudLogEntry>>>>,
    }

    impl CloudTransport for RecordingTransport {
        fn ship(&self, batch: &[CloudLogEntry]) -> ObservabilityResult<()> {
            self.batches.lock().push(batch.to_vec());
            Ok(())
        }
    }

    fn config(send_immediate: bool) -> CloudSinkConfig {
        CloudSinkConfig {
            send_immediate,
            batch_size: 10,
            ..CloudSinkConfig::new("key")
        }
    }

    fn record(message: &str, bindings: Value) -> LogRecord {
        let bindings = crate::record::into_fields(bindings);
        LogRecord::new(LogLevel::Info, Environment::Production, &bindings, Fields::new(), message.into())
    }

    #[test]
    fn test_entries_carry_tags_and_record_json() {
        let transport = RecordingTransport::default();
        let sink = CloudSink::with_transport(&config(true), Environment::Production, "my-app", {
            let transport = transport.clone();
            move || Ok(transport)
        })
        .unwrap();

        sink.write(&record("hello", json!({ "path": "me.get" })));
        sink.flush();

        let batches = transport.batches.lock();
        assert_eq!(batches.len(), 1);
        let entry = &batches[0][0];
        assert_eq!(entry.ddtags, "env:production,service:my-app");
        assert_eq!(entry.service, "my-app");
        let message: Value = serde_json::from_str(&entry.message).unwrap();
        assert_eq!(message["message"], "hello");
        assert_eq!(message["path"], "me.get");
        assert_eq!(message["level"], "INFO");
    }

    #[test]
    fn test_batches_until_flush() {
        let transport = RecordingTransport::default();
        let sink = CloudSink::with_transport(&config(false), Environment::Staging, "svc", {
            let transport = transport.clone();
            move || Ok(transport)
        })
        .unwrap();

        for i in 0..3 {
            sink.write(&record(&format!("m{i}"), Value::Null));
        }
        sink.flush();

        let batches = transport.batches.lock();
        let total: usize = batches.iter().map(Vec::len).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_headers_are_redacted() {
        let transport = RecordingTransport::default();
        let sink = CloudSink::with_transport(&config(true), Environment::Production, "svc", {
            let transport = transport.clone();
            move || Ok(transport)
        })
        .unwrap();

        sink.write(&record(
            "m",
            json!({ "requestHeaders": { "authorization": "Bearer abc", "cookie": "sid=1", "accept": "*/*" } }),
        ));
        sink.flush();

        let batches = transport.batches.lock();
        let message: Value = serde_json::from_str(&batches[0][0].message).unwrap();
        assert_eq!(message["requestHeaders"]["authorization"], "[REDACTED]");
        assert_eq!(message["requestHeaders"]["cookie"], "[REDACTED]");
        assert_eq!(message["requestHeaders"]["accept"], "*/*");
    }

    #[test]
    fn test_transport_construction_error_propagates() {
        let result = CloudSink::with_transport(&config(true), Environment::Production, "svc", || {
            Err::<RecordingTransport, _>(ObservabilityError::WorkerGone)
        });
        assert!(matches!(result, Err(ObservabilityError::WorkerGone)));
    }

    #[test]
    fn test_malformed_site_is_rejected() {
        let config = CloudSinkConfig {
            site: "not a site".into(),
            ..CloudSinkConfig::new("key")
        };
        assert!(matches!(
            CloudSink::new(&config, Environment::Production, "svc"),
            Err(ObservabilityError::InvalidEndpoint(_))
        ));
    }
}
