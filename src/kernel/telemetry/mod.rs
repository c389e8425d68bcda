//! SDK self-telemetry: the single human-readable warning channel plus lifecycle bookkeeping.
//!
//! # INVARIANT
//! Telemetry is a write-only side channel of the scope tree.
//! Scopes record into it but never read it back to take decisions.

pub mod event;
pub mod metrics;
pub mod recorder;

pub use event::{SessionEndReason, TelemetryEvent};
pub use metrics::TelemetrySnapshot;
pub use recorder::TelemetryRecorder;
