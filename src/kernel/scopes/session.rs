use uuid::Uuid;

use super::view::ViewScope;
use super::{Dependencies, ParentContext, Routing, ScopeOutput, ViewKind};
use crate::kernel::command::{ApplicationState, Command, ViewIdentity};
use crate::kernel::event::RumContext;
use crate::kernel::telemetry::event::{SessionEndReason, TelemetryEvent};
use crate::kernel::telemetry::TelemetryRecorder;
use crate::kernel::time::Timestamp;

pub const APPLICATION_LAUNCH_VIEW_NAME: &str = "ApplicationLaunch";
pub const APPLICATION_LAUNCH_VIEW_PATH: &str = "rum/application-launch/view";
pub const BACKGROUND_VIEW_NAME: &str = "Background";
pub const BACKGROUND_VIEW_PATH: &str = "rum/background/view";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    /// Terminal. The parent removes the scope.
    Expired(SessionEndReason),
}

/// Enough of a tracked view to restart it in a successor session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumableView {
    pub identity: ViewIdentity,
    pub name: String,
    pub path: String,
}

#[derive(Debug)]
pub struct SessionScope {
    /// `Uuid::nil()` when sampled out, so dropped sessions never leak a real id.
    session_id: Uuid,
    is_initial: bool,
    /// Drawn once at creation, immutable afterwards.
    is_sampled: bool,
    start_time: Timestamp,
    last_activity: Timestamp,
    has_tracked_any_view: bool,
    state: SessionState,
    resumable: Option<ResumableView>,
    /// Insertion order is activation order.
    views: Vec<ViewScope>,
}

impl SessionScope {
    pub fn new(
        is_initial: bool,
        start_time: Timestamp,
        deps: &Dependencies,
        telemetry: &mut TelemetryRecorder,
    ) -> Self {
        let is_sampled = deps.sampler.sample(deps.config.session_sample_rate);
        let session_id = if is_sampled { deps.ids.next_id() } else { Uuid::nil() };
        telemetry.record(TelemetryEvent::SessionStarted {
            session_id,
            is_initial,
            is_sampled,
        });
        Self {
            session_id,
            is_initial,
            is_sampled,
            start_time,
            last_activity: start_time,
            has_tracked_any_view: false,
            state: SessionState::Active,
            resumable: None,
            views: Vec::new(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn is_initial_session(&self) -> bool {
        self.is_initial
    }

    pub fn is_sampled(&self) -> bool {
        self.is_sampled
    }

    pub fn start_time(&self) -> Timestamp {
        self.start_time
    }

    pub fn last_activity_time(&self) -> Timestamp {
        self.last_activity
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn view_scopes(&self) -> &[ViewScope] {
        &self.views
    }

    pub fn has_active_view(&self) -> bool {
        self.views.iter().any(|v| v.is_active_view())
    }

    pub fn context(&self, application_id: &str) -> RumContext {
        let view = self.views.iter().rev().find(|v| v.is_active_view());
        RumContext {
            application_id: application_id.to_string(),
            session_id: self.session_id,
            view_id: view.map(|v| v.view_id()),
            view_name: view.map(|v| v.view_name().to_string()),
            view_path: view.map(|v| v.view_path().to_string()),
            action_id: view.and_then(|v| v.active_action_id()),
        }
    }

    /// Returns false when the session has expired; the caller must create a successor
    /// and decide whether to redeliver `command` to it.
    pub fn process(
        &mut self,
        command: &Command,
        application_state: ApplicationState,
        deps: &Dependencies,
        out: &mut ScopeOutput<'_>,
    ) -> bool {
        if self.state != SessionState::Active {
            return false;
        }
        let now = command.time();

        if let Some(reason) = self.expiry_reason(now, deps) {
            self.expire(reason, self.last_activity, deps, out);
            return false;
        }
        if let Command::StopSession { .. } = command {
            self.last_activity = now;
            self.expire(SessionEndReason::Stopped, now, deps, out);
            return false;
        }

        self.last_activity = now;

        if !self.is_sampled {
            // Kept alive to absorb commands until it expires, but never tracks anything
            return true;
        }

        match command {
            Command::StartView { time, identity, name, path } => {
                self.close_synthesized_views(*time, deps, out);
                self.start_view(Some(identity.clone()), name.clone(), path.clone(), ViewKind::Tracked, *time, deps);
            }
            _ if !self.has_active_view() => self.start_off_view(command, application_state, deps, out),
            _ => {}
        }

        self.dispatch(command, false, deps, out);
        true
    }

    /// Finishing pass for an expired session: only completes in-flight children.
    /// Returns false once nothing is left to finish.
    pub fn drain(&mut self, command: &Command, deps: &Dependencies, out: &mut ScopeOutput<'_>) -> bool {
        self.dispatch(command, true, deps, out);
        !self.views.is_empty()
    }

    pub fn take_resumable_view(&mut self) -> Option<ResumableView> {
        self.resumable.take()
    }

    /// Restarts a view carried over from the expired predecessor.
    pub fn resume_view(&mut self, view: ResumableView, time: Timestamp, deps: &Dependencies, out: &mut ScopeOutput<'_>) {
        if !self.is_sampled {
            return;
        }
        let view_id = self.start_view(Some(view.identity), view.name, view.path, ViewKind::Tracked, time, deps);
        out.telemetry.record(TelemetryEvent::ViewResumed { view_id });
    }

    fn expiry_reason(&self, now: Timestamp, deps: &Dependencies) -> Option<SessionEndReason> {
        if now.duration_since(self.start_time) >= deps.config.session_max_duration {
            Some(SessionEndReason::MaxDuration)
        } else if now.duration_since(self.last_activity) >= deps.config.session_timeout {
            Some(SessionEndReason::Timeout)
        } else {
            None
        }
    }

    fn expire(&mut self, reason: SessionEndReason, end: Timestamp, deps: &Dependencies, out: &mut ScopeOutput<'_>) {
        self.state = SessionState::Expired(reason);
        out.telemetry.record(TelemetryEvent::SessionEnded {
            session_id: self.session_id,
            reason,
        });

        self.resumable = self
            .views
            .iter()
            .rev()
            .find(|v| v.is_active_view())
            .filter(|v| v.kind() == ViewKind::Tracked)
            .and_then(|v| {
                v.identity().map(|identity| ResumableView {
                    identity: identity.clone(),
                    name: v.view_name().to_string(),
                    path: v.view_path().to_string(),
                })
            });

        let parent = ParentContext {
            application_id: &deps.config.application_id,
            session_id: self.session_id,
        };
        for view in &mut self.views {
            view.close(end, &parent, out);
        }
        self.views.retain(|v| !v.children().is_empty());
    }

    /// Launch and background views have no identity to stop them by; the first tracked
    /// view ends them.
    fn close_synthesized_views(&mut self, time: Timestamp, deps: &Dependencies, out: &mut ScopeOutput<'_>) {
        let parent = ParentContext {
            application_id: &deps.config.application_id,
            session_id: self.session_id,
        };
        for view in self.views.iter_mut().filter(|v| v.kind() != ViewKind::Tracked) {
            view.close(time, &parent, out);
        }
    }

    /// Heuristics for commands arriving with no active view.
    fn start_off_view(
        &mut self,
        command: &Command,
        application_state: ApplicationState,
        deps: &Dependencies,
        out: &mut ScopeOutput<'_>,
    ) {
        let now = command.time();
        if command.can_start_application_launch_view()
            && self.is_initial
            && !self.has_tracked_any_view
            && application_state == ApplicationState::Foreground
        {
            self.start_view(
                None,
                APPLICATION_LAUNCH_VIEW_NAME.to_string(),
                APPLICATION_LAUNCH_VIEW_PATH.to_string(),
                ViewKind::ApplicationLaunch,
                now,
                deps,
            );
        } else if command.can_start_background_view() && deps.config.background_events_tracking {
            self.start_view(
                None,
                BACKGROUND_VIEW_NAME.to_string(),
                BACKGROUND_VIEW_PATH.to_string(),
                ViewKind::Background,
                now,
                deps,
            );
        } else if command.warns_when_off_view() {
            out.telemetry.warn(format!(
                "{} was detected, but no view is active. To track views automatically, enable \
                 view tracking in the host integration. You can also track views manually \
                 with start_view() and stop_view().",
                command
            ));
        }
    }

    fn start_view(
        &mut self,
        identity: Option<ViewIdentity>,
        name: String,
        path: String,
        kind: ViewKind,
        time: Timestamp,
        deps: &Dependencies,
    ) -> Uuid {
        let view_id = deps.ids.next_id();
        self.views.push(ViewScope::new(view_id, identity, kind, name, path, time));
        self.has_tracked_any_view = true;
        view_id
    }

    fn dispatch(&mut self, command: &Command, draining: bool, deps: &Dependencies, out: &mut ScopeOutput<'_>) {
        let current = if draining {
            None
        } else {
            self.views.iter().rposition(|v| v.is_active_view())
        };
        let stop_target = match command {
            Command::StopView { identity, .. } if !draining => self
                .views
                .iter()
                .rposition(|v| v.is_active_view() && v.identity() == Some(identity)),
            _ => None,
        };
        let parent = ParentContext {
            application_id: &deps.config.application_id,
            session_id: self.session_id,
        };

        let mut index = 0;
        self.views.retain_mut(|view| {
            let routing = Routing {
                accepts_new_children: current == Some(index),
                is_stop_target: stop_target == Some(index),
            };
            index += 1;
            view.process(command, routing, &parent, deps, out)
        });
    }
}
