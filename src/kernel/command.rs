use serde::{Deserialize, Serialize};
use std::fmt;

use super::time::Timestamp;
use super::trace::TraceContext;

/// Opaque reference to the host's UI entity (screen, controller, route).
/// Equality is the only operation the scope tree needs from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewIdentity(pub String);

impl ViewIdentity {
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }
}

impl From<&str> for ViewIdentity {
    fn from(identity: &str) -> Self {
        Self(identity.to_string())
    }
}

impl From<String> for ViewIdentity {
    fn from(identity: String) -> Self {
        Self(identity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationState {
    Foreground,
    Background,
}

impl Default for ApplicationState {
    fn default() -> Self {
        Self::Foreground
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Xhr,
    Fetch,
    Image,
    Document,
    Media,
    Native,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSource {
    Source,
    Network,
    Console,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Tap,
    Scroll,
    Swipe,
    Click,
    Custom,
}

/// One user/app/system occurrence, time-stamped by its producer.
/// Read-only to the scope tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    ApplicationStart {
        time: Timestamp,
    },
    ApplicationStateChanged {
        time: Timestamp,
        state: ApplicationState,
    },
    StartView {
        time: Timestamp,
        identity: ViewIdentity,
        name: String,
        path: String,
    },
    StopView {
        time: Timestamp,
        identity: ViewIdentity,
    },
    StartResource {
        time: Timestamp,
        key: String,
        url: String,
        method: HttpMethod,
        trace: Option<TraceContext>,
    },
    StopResource {
        time: Timestamp,
        key: String,
        kind: ResourceKind,
        status_code: Option<u16>,
        size: Option<u64>,
    },
    StopResourceWithError {
        time: Timestamp,
        key: String,
        message: String,
        status_code: Option<u16>,
    },
    AddError {
        time: Timestamp,
        message: String,
        source: ErrorSource,
        stack: Option<String>,
    },
    StartUserAction {
        time: Timestamp,
        action_type: ActionType,
        name: String,
    },
    StopUserAction {
        time: Timestamp,
        action_type: ActionType,
        name: Option<String>,
    },
    AddUserAction {
        time: Timestamp,
        action_type: ActionType,
        name: String,
    },
    AddLongTask {
        time: Timestamp,
        duration_ms: u64,
    },
    /// Background heartbeat: extends the session, routes nowhere.
    KeepAlive {
        time: Timestamp,
    },
    StopSession {
        time: Timestamp,
    },
}

impl Command {
    pub fn time(&self) -> Timestamp {
        match self {
            Command::ApplicationStart { time }
            | Command::ApplicationStateChanged { time, .. }
            | Command::StartView { time, .. }
            | Command::StopView { time, .. }
            | Command::StartResource { time, .. }
            | Command::StopResource { time, .. }
            | Command::StopResourceWithError { time, .. }
            | Command::AddError { time, .. }
            | Command::StartUserAction { time, .. }
            | Command::StopUserAction { time, .. }
            | Command::AddUserAction { time, .. }
            | Command::AddLongTask { time, .. }
            | Command::KeepAlive { time }
            | Command::StopSession { time } => *time,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Command::ApplicationStart { .. } => "ApplicationStart",
            Command::ApplicationStateChanged { .. } => "ApplicationStateChanged",
            Command::StartView { .. } => "StartView",
            Command::StopView { .. } => "StopView",
            Command::StartResource { .. } => "StartResource",
            Command::StopResource { .. } => "StopResource",
            Command::StopResourceWithError { .. } => "StopResourceWithError",
            Command::AddError { .. } => "AddError",
            Command::StartUserAction { .. } => "StartUserAction",
            Command::StopUserAction { .. } => "StopUserAction",
            Command::AddUserAction { .. } => "AddUserAction",
            Command::AddLongTask { .. } => "AddLongTask",
            Command::KeepAlive { .. } => "KeepAlive",
            Command::StopSession { .. } => "StopSession",
        }
    }

    /// May synthesize the application-launch view when nothing is tracked yet.
    pub fn can_start_application_launch_view(&self) -> bool {
        matches!(
            self,
            Command::ApplicationStart { .. }
                | Command::StartResource { .. }
                | Command::AddError { .. }
                | Command::StartUserAction { .. }
                | Command::AddUserAction { .. }
        )
    }

    /// May synthesize the background view when no view is active.
    pub fn can_start_background_view(&self) -> bool {
        matches!(
            self,
            Command::StartResource { .. }
                | Command::AddError { .. }
                | Command::StartUserAction { .. }
                | Command::AddUserAction { .. }
        )
    }

    /// Arriving with no active view is a usage mistake worth telling the developer about.
    /// Completions and lifecycle signals are expected to race the view lifecycle.
    pub fn warns_when_off_view(&self) -> bool {
        matches!(
            self,
            Command::ApplicationStart { .. }
                | Command::StartResource { .. }
                | Command::AddError { .. }
                | Command::StartUserAction { .. }
                | Command::AddUserAction { .. }
                | Command::AddLongTask { .. }
        )
    }

    /// Heartbeats and session stops never open a session on their own, and are not
    /// redelivered to the successor when they hit an expired one.
    pub fn can_start_session(&self) -> bool {
        !matches!(
            self,
            Command::KeepAlive { .. } | Command::StopSession { .. } | Command::ApplicationStateChanged { .. }
        )
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::StartResource { key, url, .. } => write!(f, "StartResource(key: {key}, url: {url})"),
            Command::AddError { message, .. } => write!(f, "AddError(message: {message})"),
            Command::StartUserAction { name, .. } | Command::AddUserAction { name, .. } => {
                write!(f, "{}(name: {name})", self.kind())
            }
            Command::StartView { name, .. } => write!(f, "StartView(name: {name})"),
            _ => f.write_str(self.kind()),
        }
    }
}
