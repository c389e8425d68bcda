use std::collections::VecDeque;
use tracing::{debug, warn};

use super::event::TelemetryEvent;
use super::metrics::{compute_snapshot, TelemetrySnapshot};

const MAX_EVENTS: usize = 10_000;

/// Injected into the scope tree. Keeps the most recent events and mirrors each one to `tracing`.
#[derive(Debug)]
pub struct TelemetryRecorder {
    buffer: VecDeque<TelemetryEvent>,
}

impl Default for TelemetryRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryRecorder {
    pub fn new() -> Self {
        Self {
            buffer: VecDeque::with_capacity(256),
        }
    }

    pub fn record(&mut self, event: TelemetryEvent) {
        match &event {
            TelemetryEvent::UsageWarning { message } => warn!("{}", message),
            other => debug!(event = ?other, "rum telemetry"),
        }
        if self.buffer.len() >= MAX_EVENTS {
            self.buffer.pop_front();
        }
        self.buffer.push_back(event);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.record(TelemetryEvent::UsageWarning { message: message.into() });
    }

    pub fn events(&self) -> impl Iterator<Item = &TelemetryEvent> {
        self.buffer.iter()
    }

    pub fn warnings(&self) -> Vec<&str> {
        self.buffer
            .iter()
            .filter_map(|e| match e {
                TelemetryEvent::UsageWarning { message } => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        compute_snapshot(&self.buffer)
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
