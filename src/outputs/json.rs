use std::io::Write;
use tracing::warn;

use super::sink::EventSink;
use crate::kernel::event::RumEvent;

/// Writes one JSON document per line.
/// Write failures are logged and swallowed; collection must never take the host down.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EventSink for JsonLinesSink<W> {
    fn write(&mut self, event: RumEvent) {
        let result = serde_json::to_writer(&mut self.writer, &event)
            .map_err(std::io::Error::from)
            .and_then(|_| self.writer.write_all(b"\n"));
        if let Err(e) = result {
            warn!("Failed to write {} event: {}", event.type_name(), e);
        }
    }
}
