//! Tracing Layer that forwards events into a [`Sink`].
//!
//! Lets an application keep using `tracing` macros while the sink handles
//! formatting and rotation. Events go through the sink's level threshold
//! like any other write.

use std::fmt::Write as FmtWrite;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use crate::level::Level;
use crate::sink::Sink;

/// Events from this crate are never forwarded: they are emitted while the
/// sink lock may be held.
const OWN_TARGET: &str = "rotalog_core";

/// A tracing Layer that writes events to a rotating [`Sink`].
///
/// ```ignore
/// use rotalog_core::{Sink, SinkLayer};
/// use tracing_subscriber::prelude::*;
///
/// let sink = Sink::new();
/// sink.rotate_by_date("./logs", "app.log", 1)?;
///
/// tracing_subscriber::registry()
///     .with(SinkLayer::new(sink.clone()))
///     .init();
/// ```
#[derive(Debug, Clone)]
pub struct SinkLayer {
    sink: Sink,
}

impl SinkLayer {
    pub fn new(sink: Sink) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &Sink {
        &self.sink
    }
}

impl<S> Layer<S> for SinkLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if metadata.target().starts_with(OWN_TARGET) {
            return;
        }

        let level = Level::from(metadata.level());
        if !level.passes(self.sink.level()) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let file = metadata.file().unwrap_or_else(|| metadata.target());
        let line = metadata.line().unwrap_or(0);
        self.sink
            .log_at(level, file, line, format_args!("{}", visitor.finish()));
    }
}

/// Collects the message followed by ` key=value` for every other field.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(mut self) -> String {
        self.message.push_str(&self.fields);
        self.message
    }
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(&mut self.message, "{:?}", value);
        } else {
            let _ = write!(&mut self.fields, " {}={:?}", field.name(), value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(&mut self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        let _ = write!(&mut self.fields, " {}={}", field.name(), value);
    }
}
