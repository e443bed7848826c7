//! Forwarding of log events to the server's log collection endpoint.
//!
//! [`RemoteLogLayer`] turns each `tracing` event into a [`LogRecord`] and
//! hands it to a bounded queue without blocking. [`RemoteLogWorker`] drains
//! the queue and posts each record as JSON. Delivery is fire-and-forget:
//! failures are reported on the console only and are never retried.
//!
//! Only replykit's own events are forwarded. [`forwards`] is attached as the
//! layer's filter; it rejects the worker's diagnostics under
//! [`REMOTE_LOG_TARGET`] and every event from the HTTP stack, since posting a
//! record would otherwise log new records.

use std::fmt::{self, Write as _};

use replykit_types::{LogLevel, LogRecord};
use reqwest::Client;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use url::Url;

use crate::redact_sensitive;

/// Target used for the sink's own diagnostics.
pub const REMOTE_LOG_TARGET: &str = "replykit::remote_log";

const DEFAULT_QUEUE_CAPACITY: usize = 1024;

const FORWARDED_TARGET_PREFIX: &str = "replykit";

/// Whether an event with `metadata` is sent to the collection endpoint.
///
/// Records bridged from the `log` crate carry the `log` target and are
/// rejected with the rest of the transport noise.
pub fn forwards(metadata: &Metadata<'_>) -> bool {
    let target = metadata.target();
    target.starts_with(FORWARDED_TARGET_PREFIX) && !target.starts_with(REMOTE_LOG_TARGET)
}

/// Builds a connected layer/worker pair posting to `endpoint`.
pub fn channel(client: Client, endpoint: Url) -> (RemoteLogLayer, RemoteLogWorker) {
    let (sender, receiver) = mpsc::channel(DEFAULT_QUEUE_CAPACITY);
    (
        RemoteLogLayer { sender },
        RemoteLogWorker {
            client,
            endpoint,
            receiver,
        },
    )
}

/// `tracing` layer that queues every event for delivery.
#[derive(Debug, Clone)]
pub struct RemoteLogLayer {
    sender: Sender<LogRecord>,
}

impl<S: Subscriber> Layer<S> for RemoteLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut fields = EventFields::default();
        event.record(&mut fields);
        let record = LogRecord::new(
            fields.level(metadata.level()),
            file_name(metadata.file()),
            &redact_sensitive(&fields.render()),
        );
        // Fire-and-forget: a full or closed queue drops the record.
        let _ = self.sender.try_send(record);
    }
}

/// Background task posting queued records.
#[derive(Debug)]
pub struct RemoteLogWorker {
    client: Client,
    endpoint: Url,
    receiver: Receiver<LogRecord>,
}

impl RemoteLogWorker {
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Runs until every layer holding the sending side is dropped.
    pub async fn run(mut self) {
        while let Some(record) = self.receiver.recv().await {
            deliver(&self.client, &self.endpoint, &record).await;
        }
    }
}

async fn deliver(client: &Client, endpoint: &Url, record: &LogRecord) {
    match client.post(endpoint.clone()).json(record).send().await {
        Ok(response) if response.status().is_success() => {
            tracing::trace!(target: REMOTE_LOG_TARGET, level = %record.level, "Log sent to server successfully.");
        }
        Ok(response) => {
            tracing::warn!(
                target: REMOTE_LOG_TARGET,
                status = %response.status(),
                "Failed to send {} log to server.",
                record.level
            );
        }
        Err(error) => {
            tracing::warn!(target: REMOTE_LOG_TARGET, error = %error, "Error sending {} log to server.", record.level);
        }
    }
}

/// Base name of the source file that emitted an event.
pub(crate) fn file_name(path: Option<&str>) -> String {
    path.and_then(|path| path.rsplit(['/', '\\']).next())
        .filter(|name| !name.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

/// Collects the message and structured fields of an event.
#[derive(Debug, Default)]
pub(crate) struct EventFields {
    message: String,
    extra: Vec<(String, String)>,
    critical: bool,
}

impl EventFields {
    pub(crate) fn level(&self, level: &Level) -> LogLevel {
        if self.critical {
            return LogLevel::Critical;
        }
        match *level {
            Level::ERROR => LogLevel::Error,
            Level::WARN => LogLevel::Warn,
            Level::INFO => LogLevel::Info,
            Level::DEBUG | Level::TRACE => LogLevel::Debug,
        }
    }

    pub(crate) fn render(&self) -> String {
        let mut out = self.message.clone();
        for (name, value) in &self.extra {
            if !out.is_empty() {
                out.push(' ');
            }
            let _ = write!(out, "{name}={value}");
        }
        out
    }
}

impl Visit for EventFields {
    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == "critical" {
            self.critical = value;
            return;
        }
        self.extra.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.extra.push((field.name().to_string(), value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.extra.push((field.name().to_string(), format!("{value:?}")));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tracing_subscriber::filter::filter_fn;
    use tracing_subscriber::layer::SubscriberExt;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn endpoint(server: &MockServer) -> Url {
        Url::parse(&format!("{}/log", server.uri())).expect("endpoint url")
    }

    #[tokio::test]
    async fn posts_level_message_and_file_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/log"))
            .and(body_json(json!({
                "level": "warn",
                "message": "remote_log.rs - Navigation shortcuts not found",
                "fileName": "remote_log.rs",
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let (layer, worker) = channel(Client::new(), endpoint(&server));
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("Navigation shortcuts not found");
        });
        worker.run().await;
        server.verify().await;
    }

    #[tokio::test]
    async fn critical_flag_and_fields_are_forwarded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/log"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let (layer, worker) = channel(Client::new(), endpoint(&server));
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::error!(critical = true, step = 3, "Sequencer state lost");
        });
        worker.run().await;

        let requests = server.received_requests().await.expect("recording enabled");
        assert_eq!(requests.len(), 1);
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).expect("json body");
        assert_eq!(body["level"], "critical");
        assert_eq!(body["message"], "remote_log.rs - Sequencer state lost step=3");
    }

    #[tokio::test]
    async fn server_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let (layer, worker) = channel(Client::new(), endpoint(&server));
        let subscriber = tracing_subscriber::registry().with(layer.with_filter(filter_fn(forwards)));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("Copy button clicked");
            tracing::warn!(target: REMOTE_LOG_TARGET, "own diagnostics are never forwarded");
        });
        worker.run().await;
        server.verify().await;
    }

    #[tokio::test]
    async fn transport_events_are_filtered_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let (layer, worker) = channel(Client::new(), endpoint(&server));
        let subscriber = tracing_subscriber::registry().with(layer.with_filter(filter_fn(forwards)));
        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!(target: "reqwest::connect", "starting new connection");
            tracing::debug!(target: "hyper_util::client::legacy::connect::http", "connecting to 127.0.0.1:5000");
            tracing::debug!(target: "log", "bridged record");
            tracing::info!(target: "replykit_tui::app", "Submit button clicked");
        });
        worker.run().await;

        let requests = server.received_requests().await.expect("recording enabled");
        assert_eq!(requests.len(), 1);
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).expect("json body");
        assert_eq!(body["message"], "remote_log.rs - Submit button clicked");
    }

    #[test]
    fn file_name_strips_directories() {
        assert_eq!(file_name(Some("crates/tui/src/app.rs")), "app.rs");
        assert_eq!(file_name(Some("C:\\src\\form.rs")), "form.rs");
        assert_eq!(file_name(None), "unknown");
    }
}
