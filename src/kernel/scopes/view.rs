use uuid::Uuid;

use super::action::{ActionMode, ActionScope};
use super::resource::ResourceScope;
use super::{Dependencies, ParentContext, Routing, ScopeOutput, ViewKind};
use crate::kernel::command::{Command, ViewIdentity};
use crate::kernel::event::{
    ErrorPayload, EventContext, EventPayload, LongTaskPayload, RumEvent, ViewAttributes, ViewPayload,
};
use crate::kernel::telemetry::event::{DropReason, TelemetryEvent};
use crate::kernel::time::Timestamp;

/// Transient work owned by a view. Closed set, dispatched by match.
#[derive(Debug, Clone)]
pub enum ChildScope {
    Resource(ResourceScope),
    Action(ActionScope),
}

#[derive(Debug, Clone)]
pub(crate) enum ChildStatus {
    Open,
    Finished { date: Timestamp, payload: EventPayload },
}

impl ChildScope {
    fn process(&mut self, command: &Command, is_current: bool, deps: &Dependencies) -> ChildStatus {
        match self {
            ChildScope::Resource(resource) => resource.process(command, deps),
            ChildScope::Action(action) => action.process(command, is_current),
        }
    }
}

/// One visible screen and everything attributed to it.
#[derive(Debug, Clone)]
pub struct ViewScope {
    view_id: Uuid,
    /// `None` for synthesized views, which no `StopView` can address.
    identity: Option<ViewIdentity>,
    kind: ViewKind,
    name: String,
    path: String,
    start_time: Timestamp,
    end_time: Option<Timestamp>,
    is_active: bool,
    has_started: bool,
    document_version: u64,

    resource_count: u64,
    error_count: u64,
    action_count: u64,
    long_task_count: u64,

    children: Vec<ChildScope>,
}

impl ViewScope {
    pub fn new(
        view_id: Uuid,
        identity: Option<ViewIdentity>,
        kind: ViewKind,
        name: String,
        path: String,
        start_time: Timestamp,
    ) -> Self {
        Self {
            view_id,
            identity,
            kind,
            name,
            path,
            start_time,
            end_time: None,
            is_active: true,
            has_started: false,
            document_version: 0,
            resource_count: 0,
            error_count: 0,
            action_count: 0,
            long_task_count: 0,
            children: Vec::new(),
        }
    }

    pub fn view_id(&self) -> Uuid {
        self.view_id
    }

    pub fn identity(&self) -> Option<&ViewIdentity> {
        self.identity.as_ref()
    }

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub fn view_name(&self) -> &str {
        &self.name
    }

    pub fn view_path(&self) -> &str {
        &self.path
    }

    pub fn view_start_time(&self) -> Timestamp {
        self.start_time
    }

    pub fn is_active_view(&self) -> bool {
        self.is_active
    }

    pub fn document_version(&self) -> u64 {
        self.document_version
    }

    pub fn resource_count(&self) -> u64 {
        self.resource_count
    }

    pub fn error_count(&self) -> u64 {
        self.error_count
    }

    pub fn action_count(&self) -> u64 {
        self.action_count
    }

    pub fn long_task_count(&self) -> u64 {
        self.long_task_count
    }

    pub fn children(&self) -> &[ChildScope] {
        &self.children
    }

    pub fn active_action_id(&self) -> Option<Uuid> {
        self.open_action().map(|a| a.id())
    }

    fn open_action(&self) -> Option<&ActionScope> {
        self.children.iter().find_map(|c| match c {
            ChildScope::Action(a) => Some(a),
            _ => None,
        })
    }

    fn has_resource(&self, key: &str) -> bool {
        self.children
            .iter()
            .any(|c| matches!(c, ChildScope::Resource(r) if r.key() == key))
    }

    /// Returns false once the view is stopped and no child is in flight.
    pub fn process(
        &mut self,
        command: &Command,
        routing: Routing,
        parent: &ParentContext<'_>,
        deps: &Dependencies,
        out: &mut ScopeOutput<'_>,
    ) -> bool {
        let now = command.time();

        if !self.has_started {
            self.has_started = true;
            out.telemetry.record(TelemetryEvent::ViewStarted {
                view_id: self.view_id,
                kind: self.kind,
            });
            self.emit_view_update(now, parent, out);
        }

        // === 1. Existing children see the command first ===
        let mut finished = Vec::new();
        let is_current = routing.accepts_new_children && self.is_active;
        self.children.retain_mut(|child| match child.process(command, is_current, deps) {
            ChildStatus::Open => true,
            ChildStatus::Finished { date, payload } => {
                finished.push((date, payload));
                false
            }
        });
        let mut needs_update = !finished.is_empty();
        for (date, payload) in finished {
            self.count(&payload);
            self.emit(date, payload, parent, out);
        }

        // === 2. View-level handling ===
        match command {
            Command::StopView { identity, .. }
                if routing.is_stop_target && self.is_active && self.identity.as_ref() == Some(identity) =>
            {
                self.stop(now, parent, out);
                needs_update = true;
            }
            _ if is_current => needs_update |= self.start_child(command, parent, deps, out),
            _ => {}
        }

        // === 3. View document ===
        if needs_update {
            self.emit_view_update(now, parent, out);
        }

        self.is_active || !self.children.is_empty()
    }

    /// Ends the view without a `StopView`, e.g. when its session expires.
    pub fn close(&mut self, time: Timestamp, parent: &ParentContext<'_>, out: &mut ScopeOutput<'_>) {
        if !self.is_active {
            return;
        }
        self.stop(time, parent, out);
        self.emit_view_update(time, parent, out);
    }

    fn stop(&mut self, time: Timestamp, parent: &ParentContext<'_>, out: &mut ScopeOutput<'_>) {
        self.is_active = false;
        self.end_time = Some(time);

        // A stopping view completes its open action, whatever its state
        if let Some(pos) = self.children.iter().position(|c| matches!(c, ChildScope::Action(_))) {
            if let ChildScope::Action(mut action) = self.children.remove(pos) {
                if let ChildStatus::Finished { date, payload } = action.close(time) {
                    self.count(&payload);
                    self.emit(date, payload, parent, out);
                }
            }
        }
    }

    /// Returns true when a counter changed.
    fn start_child(
        &mut self,
        command: &Command,
        parent: &ParentContext<'_>,
        deps: &Dependencies,
        out: &mut ScopeOutput<'_>,
    ) -> bool {
        let action_id = self.active_action_id();
        match command {
            Command::StartResource { time, key, url, method, trace } => {
                if self.has_resource(key) {
                    out.telemetry.record(TelemetryEvent::CommandDropped {
                        command: command.kind().to_string(),
                        reason: DropReason::DuplicateResource,
                    });
                    return false;
                }
                self.children.push(ChildScope::Resource(ResourceScope::new(
                    deps.ids.next_id(),
                    key.clone(),
                    url.clone(),
                    *method,
                    *time,
                    action_id,
                    *trace,
                )));
                false
            }
            Command::AddError { time, message, source, stack } => {
                let payload = EventPayload::Error(ErrorPayload {
                    id: deps.ids.next_id(),
                    action_id,
                    message: message.clone(),
                    source: *source,
                    stack: stack.clone(),
                    resource_url: None,
                    status_code: None,
                });
                self.count(&payload);
                self.emit(*time, payload, parent, out);
                true
            }
            Command::AddLongTask { time, duration_ms } => {
                let payload = EventPayload::LongTask(LongTaskPayload {
                    id: deps.ids.next_id(),
                    action_id,
                    duration_ms: *duration_ms,
                });
                self.count(&payload);
                self.emit(*time, payload, parent, out);
                true
            }
            Command::StartUserAction { time, action_type, name } | Command::AddUserAction { time, action_type, name } => {
                if let Some(open) = self.open_action() {
                    out.telemetry.warn(format!(
                        "RUM action '{}' was started while action '{}' is still in progress. '{}' will be ignored.",
                        name,
                        open.name(),
                        name
                    ));
                    return false;
                }
                let mode = if matches!(command, Command::StartUserAction { .. }) {
                    ActionMode::Continuous
                } else {
                    ActionMode::Discrete
                };
                self.children.push(ChildScope::Action(ActionScope::new(
                    deps.ids.next_id(),
                    *action_type,
                    name.clone(),
                    mode,
                    *time,
                )));
                false
            }
            _ => false,
        }
    }

    fn count(&mut self, payload: &EventPayload) {
        match payload {
            EventPayload::Resource(_) => self.resource_count += 1,
            EventPayload::Error(_) => self.error_count += 1,
            EventPayload::Action(_) => self.action_count += 1,
            EventPayload::LongTask(_) => self.long_task_count += 1,
            EventPayload::View(_) => {}
        }
    }

    fn emit_view_update(&mut self, now: Timestamp, parent: &ParentContext<'_>, out: &mut ScopeOutput<'_>) {
        let end = self.end_time.unwrap_or(now);
        let payload = EventPayload::View(ViewPayload {
            is_active: self.is_active,
            time_spent_ms: end.duration_since(self.start_time).as_millis() as u64,
            resource_count: self.resource_count,
            error_count: self.error_count,
            action_count: self.action_count,
            long_task_count: self.long_task_count,
        });
        self.emit(self.start_time, payload, parent, out);
    }

    fn emit(&mut self, date: Timestamp, payload: EventPayload, parent: &ParentContext<'_>, out: &mut ScopeOutput<'_>) {
        self.document_version += 1;
        out.sink.write(RumEvent {
            date,
            context: EventContext {
                application_id: parent.application_id.to_string(),
                session_id: parent.session_id,
                view: ViewAttributes {
                    id: self.view_id,
                    name: self.name.clone(),
                    path: self.path.clone(),
                },
                document_version: self.document_version,
            },
            payload,
        });
    }
}
