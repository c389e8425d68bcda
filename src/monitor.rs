//! Producer-side handle. Safe to clone and call from any thread or task.
//!
//! Every call stamps the command with `Timestamp::now()` and hands it to the reactor's
//! queue without blocking. A full queue drops the command (counted, logged).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::kernel::command::{
    ActionType, ApplicationState, Command, ErrorSource, HttpMethod, ResourceKind, ViewIdentity,
};
use crate::kernel::time::Timestamp;
use crate::kernel::trace::TraceInjector;

#[derive(Clone)]
pub struct RumMonitor {
    tx: mpsc::Sender<Command>,
    injector: Option<Arc<TraceInjector>>,
    dropped: Arc<AtomicU64>,
}

impl RumMonitor {
    pub fn new(tx: mpsc::Sender<Command>) -> Self {
        Self {
            tx,
            injector: None,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_trace_injector(mut self, injector: TraceInjector) -> Self {
        self.injector = Some(Arc::new(injector));
        self
    }

    /// Commands lost to a full queue since creation, across all clones.
    pub fn dropped_commands(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Returns whether the command was queued.
    pub fn send(&self, command: Command) -> bool {
        match self.tx.try_send(command) {
            Ok(()) => true,
            Err(TrySendError::Full(command)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("RUM command queue is full, dropping {}", command.kind());
                false
            }
            Err(TrySendError::Closed(command)) => {
                debug!("RUM reactor is gone, dropping {}", command.kind());
                false
            }
        }
    }

    pub fn application_start(&self) -> bool {
        self.send(Command::ApplicationStart { time: Timestamp::now() })
    }

    pub fn set_application_state(&self, state: ApplicationState) -> bool {
        self.send(Command::ApplicationStateChanged { time: Timestamp::now(), state })
    }

    pub fn start_view(&self, identity: impl Into<ViewIdentity>, name: impl Into<String>, path: impl Into<String>) -> bool {
        self.send(Command::StartView {
            time: Timestamp::now(),
            identity: identity.into(),
            name: name.into(),
            path: path.into(),
        })
    }

    pub fn stop_view(&self, identity: impl Into<ViewIdentity>) -> bool {
        self.send(Command::StopView {
            time: Timestamp::now(),
            identity: identity.into(),
        })
    }

    /// Returns the tracing headers to attach to the outgoing request (empty for
    /// third-party hosts or unsampled requests under `sampled` injection).
    pub fn start_resource(&self, key: impl Into<String>, url: impl Into<String>, method: HttpMethod) -> Vec<(String, String)> {
        let url = url.into();
        let (trace, headers) = match self.injector.as_ref().and_then(|i| i.inject(&url)) {
            Some((context, headers)) => (Some(context), headers),
            None => (None, Vec::new()),
        };
        self.send(Command::StartResource {
            time: Timestamp::now(),
            key: key.into(),
            url,
            method,
            trace,
        });
        headers
    }

    pub fn stop_resource(&self, key: impl Into<String>, kind: ResourceKind, status_code: Option<u16>, size: Option<u64>) -> bool {
        self.send(Command::StopResource {
            time: Timestamp::now(),
            key: key.into(),
            kind,
            status_code,
            size,
        })
    }

    pub fn stop_resource_with_error(&self, key: impl Into<String>, message: impl Into<String>, status_code: Option<u16>) -> bool {
        self.send(Command::StopResourceWithError {
            time: Timestamp::now(),
            key: key.into(),
            message: message.into(),
            status_code,
        })
    }

    pub fn add_error(&self, message: impl Into<String>, source: ErrorSource, stack: Option<String>) -> bool {
        self.send(Command::AddError {
            time: Timestamp::now(),
            message: message.into(),
            source,
            stack,
        })
    }

    pub fn start_action(&self, action_type: ActionType, name: impl Into<String>) -> bool {
        self.send(Command::StartUserAction {
            time: Timestamp::now(),
            action_type,
            name: name.into(),
        })
    }

    pub fn stop_action(&self, action_type: ActionType, name: Option<String>) -> bool {
        self.send(Command::StopUserAction {
            time: Timestamp::now(),
            action_type,
            name,
        })
    }

    pub fn add_action(&self, action_type: ActionType, name: impl Into<String>) -> bool {
        self.send(Command::AddUserAction {
            time: Timestamp::now(),
            action_type,
            name: name.into(),
        })
    }

    pub fn add_long_task(&self, duration: Duration) -> bool {
        self.send(Command::AddLongTask {
            time: Timestamp::now(),
            duration_ms: duration.as_millis() as u64,
        })
    }

    pub fn keep_alive(&self) -> bool {
        self.send(Command::KeepAlive { time: Timestamp::now() })
    }

    pub fn stop_session(&self) -> bool {
        self.send(Command::StopSession { time: Timestamp::now() })
    }
}
