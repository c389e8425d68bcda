use std::collections::VecDeque;

use super::event::{SessionEndReason, TelemetryEvent};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub session_stats: SessionStats,
    pub view_stats: ViewStats,
    pub usage_warnings: u64,
    pub dropped_commands: u64,
    pub discarded_in_flight_views: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStats {
    pub started: u64,
    pub sampled_out: u64,
    pub expired_max_duration: u64,
    pub expired_timeout: u64,
    pub stopped: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewStats {
    pub started: u64,
    pub resumed: u64,
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    for event in events {
        match event {
            TelemetryEvent::SessionStarted { is_sampled, .. } => {
                snap.session_stats.started += 1;
                if !is_sampled {
                    snap.session_stats.sampled_out += 1;
                }
            }
            TelemetryEvent::SessionEnded { reason, .. } => match reason {
                SessionEndReason::MaxDuration => snap.session_stats.expired_max_duration += 1,
                SessionEndReason::Timeout => snap.session_stats.expired_timeout += 1,
                SessionEndReason::Stopped => snap.session_stats.stopped += 1,
            },
            TelemetryEvent::ViewStarted { .. } => snap.view_stats.started += 1,
            TelemetryEvent::ViewResumed { .. } => snap.view_stats.resumed += 1,
            TelemetryEvent::UsageWarning { .. } => snap.usage_warnings += 1,
            TelemetryEvent::CommandDropped { .. } => snap.dropped_commands += 1,
            TelemetryEvent::InFlightDiscarded { views, .. } => {
                snap.discarded_in_flight_views += *views as u64;
            }
        }
    }

    snap
}
