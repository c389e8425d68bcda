use tokio::sync::mpsc;
use tracing::debug;

use super::sink::EventSink;
use crate::kernel::event::RumEvent;

/// Forwards events to an async consumer (batching/upload task).
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<RumEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<RumEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn write(&mut self, event: RumEvent) {
        if self.tx.send(event).is_err() {
            debug!("Event consumer is gone, dropping event");
        }
    }
}
