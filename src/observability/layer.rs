//! Bridge from `tracing` events to a [`LogSink`].
//!
//! Lets dependency and ad-hoc `tracing::info!` output share the sink's
//! format, rotation and file. Structured fields are appended to the message
//! as `key=value`.

use std::fmt::{self, Write as _};
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use crate::config::schema::LogLevel;
use crate::observability::logging::{Location, LogSink};

/// A `tracing_subscriber` layer writing into a [`LogSink`].
#[derive(Clone)]
pub struct LogSinkLayer {
    sink: Arc<LogSink>,
}

impl LogSinkLayer {
    pub fn new(sink: Arc<LogSink>) -> Self {
        Self { sink }
    }
}

fn map_level(level: &Level) -> LogLevel {
    match *level {
        Level::ERROR => LogLevel::Error,
        Level::WARN => LogLevel::Warn,
        Level::INFO => LogLevel::Info,
        _ => LogLevel::Debug,
    }
}

impl<S: Subscriber> Layer<S> for LogSinkLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = map_level(metadata.level());
        if !self.sink.should_log(level) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let location = match (metadata.file(), metadata.line()) {
            (Some(file), Some(line)) => Some(Location::new(file, line)),
            _ => None,
        };
        self.sink.log(level, &visitor.finish(), location);
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        match (self.message.is_empty(), self.fields.is_empty()) {
            (_, true) => self.message,
            (true, false) => self.fields,
            (false, false) => format!("{} {}", self.message, self.fields),
        }
    }

    fn push_field(&mut self, name: &str, value: fmt::Arguments<'_>) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{}={}", name, value);
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_field(field.name(), format_args!("{}", value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.push_field(field.name(), format_args!("{:?}", value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogConfig;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_events_reach_sink() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(LogSink::new());
        sink.initialize(&LogConfig {
            level: LogLevel::Info,
            file: dir.path().join("t.log").to_string_lossy().into_owned(),
            console_output: false,
            file_output: true,
        })
        .unwrap();

        let subscriber = tracing_subscriber::registry().with(LogSinkLayer::new(sink.clone()));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(order_id = 42, side = "buy", "Order accepted");
            tracing::debug!("hidden at info level");
            tracing::error!("Gateway down");
        });

        let content = std::fs::read_to_string(sink.current_file().unwrap()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("[INFO ] [layer.rs:"));
        assert!(lines[0].ends_with("Order accepted order_id=42 side=buy"));
        assert!(lines[1].ends_with("Gateway down"));
    }
}
