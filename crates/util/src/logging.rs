//! Logging setup shared by the replykit binaries.
//!
//! Console lines use the `app-1  | LEVEL - file - message` shape the log
//! collection server prints, so local and forwarded logs read the same.

use std::fmt;
use std::fs::{OpenOptions, create_dir_all};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::remote_log::{self, EventFields, RemoteLogWorker, file_name};

const CONSOLE_PREFIX: &str = "app-1  |";

/// Where console lines are written.
#[derive(Debug, Clone)]
pub enum ConsoleTarget {
    Stderr,
    /// Used while the terminal UI owns the screen.
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct LoggingOptions {
    pub console: ConsoleTarget,
    /// Log collection endpoint; `None` disables forwarding.
    pub remote_endpoint: Option<url::Url>,
    /// Filter used when `RUST_LOG` is not set.
    pub default_filter: String,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            console: ConsoleTarget::Stderr,
            remote_endpoint: None,
            default_filter: "info".to_string(),
        }
    }
}

/// Installs the global subscriber.
///
/// Returns the remote log worker when forwarding is enabled; the caller
/// spawns it on its runtime.
pub fn init(options: LoggingOptions) -> anyhow::Result<Option<RemoteLogWorker>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&options.default_filter));

    let console = match &options.console {
        ConsoleTarget::Stderr => tracing_subscriber::fmt::layer()
            .event_format(ConsoleFormat)
            .with_writer(std::io::stderr)
            .boxed(),
        ConsoleTarget::File(path) => {
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt::layer()
                .event_format(ConsoleFormat)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .boxed()
        }
    };

    let (remote, worker) = match options.remote_endpoint {
        Some(endpoint) => {
            let (layer, worker) = remote_log::channel(reqwest::Client::new(), endpoint);
            (Some(layer.with_filter(filter_fn(remote_log::forwards))), Some(worker))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(remote)
        .try_init()?;
    Ok(worker)
}

/// Event format for console lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleFormat;

impl<S, N> FormatEvent<S, N> for ConsoleFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, _ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
        let metadata = event.metadata();
        let mut fields = EventFields::default();
        event.record(&mut fields);
        let level = fields.level(metadata.level()).as_str().to_uppercase();
        writeln!(
            writer,
            "{CONSOLE_PREFIX} {level} - {} - {}",
            file_name(metadata.file()),
            crate::redact_sensitive(&fields.render())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Arc;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Capture {
        type Writer = Capture;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn console_lines_follow_server_shape() {
        let capture = Capture::default();
        let subscriber = tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .event_format(ConsoleFormat)
                .with_writer(capture.clone()),
        );
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("All components initialized.");
            tracing::error!(critical = true, "Status display lost");
        });
        let output = String::from_utf8(capture.0.lock().expect("capture lock").clone()).expect("utf8");
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "app-1  | INFO - logging.rs - All components initialized.");
        assert_eq!(lines[1], "app-1  | CRITICAL - logging.rs - Status display lost");
    }
}
