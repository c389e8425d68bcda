use std::collections::HashSet;
use std::time::Duration;
use uuid::Uuid;

use super::view::ChildStatus;
use crate::kernel::command::{ActionType, Command};
use crate::kernel::event::{ActionPayload, EventPayload};
use crate::kernel::time::Timestamp;

/// Hard cap on any action's duration.
pub const USER_ACTION_MAX_DURATION: Duration = Duration::from_secs(10);
/// Idle time after which a discrete action with no pending resource is complete.
pub const DISCRETE_ACTION_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionMode {
    /// `StartUserAction` .. `StopUserAction`.
    Continuous,
    /// `AddUserAction`: a tap, closed by inactivity.
    Discrete,
}

/// One user interaction and the work it caused.
///
/// Timers are passive: expiry is only noticed when the next command reaches the view,
/// so the completion time is computed from the recorded timestamps, not from `now`.
#[derive(Debug, Clone)]
pub struct ActionScope {
    id: Uuid,
    action_type: ActionType,
    name: String,
    mode: ActionMode,
    start_time: Timestamp,
    last_activity: Timestamp,
    pending_resources: HashSet<String>,
    resource_count: u64,
    error_count: u64,
    long_task_count: u64,
}

impl ActionScope {
    pub fn new(id: Uuid, action_type: ActionType, name: String, mode: ActionMode, start_time: Timestamp) -> Self {
        Self {
            id,
            action_type,
            name,
            mode,
            start_time,
            last_activity: start_time,
            pending_resources: HashSet::new(),
            resource_count: 0,
            error_count: 0,
            long_task_count: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> ActionMode {
        self.mode
    }

    /// `is_current` is false when the owning view is not the one receiving new work;
    /// only completions of our own resources count then.
    pub(crate) fn process(&mut self, command: &Command, is_current: bool) -> ChildStatus {
        let now = command.time();

        if now.duration_since(self.start_time) >= USER_ACTION_MAX_DURATION {
            return self.finish(self.start_time + USER_ACTION_MAX_DURATION);
        }
        if self.mode == ActionMode::Discrete
            && self.pending_resources.is_empty()
            && now.duration_since(self.last_activity) >= DISCRETE_ACTION_TIMEOUT
        {
            return self.finish(self.last_activity);
        }

        match command {
            Command::StartResource { key, .. } if is_current => {
                self.pending_resources.insert(key.clone());
                self.last_activity = now;
            }
            Command::StopResource { key, .. } => {
                if self.pending_resources.remove(key) {
                    self.resource_count += 1;
                    self.last_activity = now;
                }
            }
            Command::StopResourceWithError { key, .. } => {
                if self.pending_resources.remove(key) {
                    self.error_count += 1;
                    self.last_activity = now;
                }
            }
            Command::AddError { .. } if is_current => self.error_count += 1,
            Command::AddLongTask { .. } if is_current => self.long_task_count += 1,
            Command::StopUserAction { action_type, name, .. }
                if is_current && self.mode == ActionMode::Continuous =>
            {
                self.action_type = *action_type;
                if let Some(name) = name {
                    self.name = name.clone();
                }
                return self.finish(now);
            }
            _ => {}
        }
        ChildStatus::Open
    }

    /// Forced completion, used when the owning view stops.
    pub(crate) fn close(&mut self, time: Timestamp) -> ChildStatus {
        let capped = time.min(self.start_time + USER_ACTION_MAX_DURATION);
        self.finish(capped)
    }

    fn finish(&mut self, end: Timestamp) -> ChildStatus {
        ChildStatus::Finished {
            date: self.start_time,
            payload: EventPayload::Action(ActionPayload {
                id: self.id,
                action_type: self.action_type,
                name: self.name.clone(),
                duration_ms: end.duration_since(self.start_time).as_millis() as u64,
                resource_count: self.resource_count,
                error_count: self.error_count,
                long_task_count: self.long_task_count,
            }),
        }
    }
}
