pub mod channel;
pub mod json;
pub mod sink;

pub use channel::ChannelSink;
pub use json::JsonLinesSink;
pub use sink::{EventRecorder, EventSink};
