use std::collections::VecDeque;

use crate::kernel::event::RumEvent;

/// Consumer of finished event payloads. Persistence and upload live behind it.
pub trait EventSink {
    fn write(&mut self, event: RumEvent);
}

impl EventSink for Vec<RumEvent> {
    fn write(&mut self, event: RumEvent) {
        self.push(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn write(&mut self, event: RumEvent) {
        (**self).write(event);
    }
}

const DEFAULT_CAPACITY: usize = 10_000;

/// Bounded in-memory sink. Oldest events are evicted first.
#[derive(Debug)]
pub struct EventRecorder {
    buffer: VecDeque<RumEvent>,
    capacity: usize,
}

impl Default for EventRecorder {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn events(&self) -> impl Iterator<Item = &RumEvent> {
        self.buffer.iter()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn drain(&mut self) -> Vec<RumEvent> {
        self.buffer.drain(..).collect()
    }
}

impl EventSink for EventRecorder {
    fn write(&mut self, event: RumEvent) {
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(event);
    }
}
