use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kernel::scopes::ViewKind;

// Allowed: IDs, command kinds, reasons, counts.
// Forbidden: payload contents (URLs, error messages, view names) except in usage warnings.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    SessionStarted {
        session_id: Uuid,
        is_initial: bool,
        is_sampled: bool,
    },

    SessionEnded {
        session_id: Uuid,
        reason: SessionEndReason,
    },

    ViewStarted {
        view_id: Uuid,
        kind: ViewKind,
    },

    /// A view carried over into the successor of an expired session.
    ViewResumed {
        view_id: Uuid,
    },

    /// Developer-facing misuse. The command was dropped.
    UsageWarning {
        message: String,
    },

    /// Command dropped by policy, not by misuse.
    CommandDropped {
        command: String,
        reason: DropReason,
    },

    /// Expired session discarded while it still tracked in-flight work.
    InFlightDiscarded {
        session_id: Uuid,
        views: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEndReason {
    MaxDuration,
    Timeout,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropReason {
    /// Heartbeat or stop signal that hit an expired session.
    Rollover,
    /// Heartbeat or stop signal with no session to receive it.
    NoSession,
    /// Start of a resource whose key is already in flight.
    DuplicateResource,
}
