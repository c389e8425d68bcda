use super::session::{ResumableView, SessionScope};
use super::{Dependencies, ScopeOutput};
use crate::kernel::command::{ApplicationState, Command};
use crate::kernel::event::RumContext;
use crate::kernel::telemetry::event::{DropReason, TelemetryEvent};

/// Root of the tree. Never expires while the SDK is enabled.
///
/// Rollover policy, applied when the current session reports expiry:
/// - the expired session is retired; it stays around as `previous` only while it still
///   has in-flight children, and keeps receiving commands in drain mode;
/// - commands that can start a session are redelivered to a fresh, non-initial successor;
/// - `KeepAlive` and `StopSession` are not redelivered and open no successor. The next
///   session-starting command does, and reopens the expired session's tracked view unless
///   a `StopSession` came in between.
pub struct ApplicationScope {
    dependencies: Dependencies,
    application_state: ApplicationState,
    current: Option<SessionScope>,
    previous: Option<SessionScope>,
    /// Tracked view of the last expired session, waiting for a successor to reopen it.
    pending_resume: Option<ResumableView>,
    sessions_started: u64,
}

impl ApplicationScope {
    pub fn new(dependencies: Dependencies) -> Self {
        Self {
            dependencies,
            application_state: ApplicationState::Foreground,
            current: None,
            previous: None,
            pending_resume: None,
            sessions_started: 0,
        }
    }

    pub fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }

    pub fn application_state(&self) -> ApplicationState {
        self.application_state
    }

    pub fn current_session(&self) -> Option<&SessionScope> {
        self.current.as_ref()
    }

    pub fn previous_session(&self) -> Option<&SessionScope> {
        self.previous.as_ref()
    }

    pub fn context(&self) -> Option<RumContext> {
        self.current
            .as_ref()
            .map(|s| s.context(&self.dependencies.config.application_id))
    }

    /// Always true: the root never asks to be removed.
    pub fn process(&mut self, command: &Command, out: &mut ScopeOutput<'_>) -> bool {
        if let Command::ApplicationStateChanged { state, .. } = command {
            self.application_state = *state;
            return true;
        }

        self.process_current(command, out);

        if let Some(previous) = self.previous.as_mut() {
            if !previous.drain(command, &self.dependencies, out) {
                self.previous = None;
            }
        }
        true
    }

    fn process_current(&mut self, command: &Command, out: &mut ScopeOutput<'_>) {
        let now = command.time();
        let mut rolled_over = false;

        if let Some(session) = self.current.as_mut() {
            if session.process(command, self.application_state, &self.dependencies, out) {
                return;
            }

            // === Rollover ===
            rolled_over = true;
            if let Some(mut expired) = self.current.take() {
                self.pending_resume = expired.take_resumable_view();
                if !expired.view_scopes().is_empty() {
                    if let Some(discarded) = self.previous.replace(expired) {
                        out.telemetry.record(TelemetryEvent::InFlightDiscarded {
                            session_id: discarded.session_id(),
                            views: discarded.view_scopes().len(),
                        });
                    }
                }
            }
        }

        if !command.can_start_session() {
            match command {
                Command::StopSession { .. } => self.pending_resume = None,
                Command::KeepAlive { .. } if rolled_over => out.telemetry.record(TelemetryEvent::CommandDropped {
                    command: command.kind().to_string(),
                    reason: DropReason::Rollover,
                }),
                _ => {}
            }
            if !rolled_over {
                out.telemetry.record(TelemetryEvent::CommandDropped {
                    command: command.kind().to_string(),
                    reason: DropReason::NoSession,
                });
            }
            return;
        }

        let deps = &self.dependencies;
        let is_initial = self.sessions_started == 0;
        let mut session = SessionScope::new(is_initial, now, deps, out.telemetry);
        self.sessions_started += 1;
        if let Some(view) = self.pending_resume.take() {
            // An explicit view command decides the successor's first view by itself
            if !matches!(command, Command::StartView { .. } | Command::StopView { .. }) {
                session.resume_view(view, now, deps, out);
            }
        }
        session.process(command, self.application_state, deps, out);
        self.current = Some(session);
    }
}
