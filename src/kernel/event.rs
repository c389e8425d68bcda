use serde::Serialize;
use uuid::Uuid;

use super::command::{ActionType, ErrorSource, HttpMethod, ResourceKind};
use super::time::Timestamp;
use super::trace::TraceContext;

/// Identifiers inherited from the scope ancestry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RumContext {
    pub application_id: String,
    pub session_id: Uuid,
    pub view_id: Option<Uuid>,
    pub view_name: Option<String>,
    pub view_path: Option<String>,
    pub action_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewAttributes {
    pub id: Uuid,
    pub name: String,
    pub path: String,
}

/// Stamped by the owning view on everything it emits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventContext {
    pub application_id: String,
    pub session_id: Uuid,
    pub view: ViewAttributes,
    /// Per-view, strictly increasing. Lets storage keep the newest copy of a view document.
    pub document_version: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RumEvent {
    pub date: Timestamp,
    #[serde(flatten)]
    pub context: EventContext,
    #[serde(flatten)]
    pub payload: EventPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    View(ViewPayload),
    Resource(ResourcePayload),
    Action(ActionPayload),
    Error(ErrorPayload),
    LongTask(LongTaskPayload),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewPayload {
    pub is_active: bool,
    pub time_spent_ms: u64,
    pub resource_count: u64,
    pub error_count: u64,
    pub action_count: u64,
    pub long_task_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourcePayload {
    pub id: Uuid,
    pub action_id: Option<Uuid>,
    pub url: String,
    pub method: HttpMethod,
    pub kind: ResourceKind,
    pub status_code: Option<u16>,
    pub size: Option<u64>,
    pub duration_ms: u64,
    pub trace: Option<TraceContext>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionPayload {
    pub id: Uuid,
    pub action_type: ActionType,
    pub name: String,
    pub duration_ms: u64,
    pub resource_count: u64,
    pub error_count: u64,
    pub long_task_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorPayload {
    pub id: Uuid,
    pub action_id: Option<Uuid>,
    pub message: String,
    pub source: ErrorSource,
    pub stack: Option<String>,
    pub resource_url: Option<String>,
    pub status_code: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongTaskPayload {
    pub id: Uuid,
    pub action_id: Option<Uuid>,
    pub duration_ms: u64,
}

impl RumEvent {
    pub fn view(&self) -> Option<&ViewPayload> {
        match &self.payload {
            EventPayload::View(v) => Some(v),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self.payload {
            EventPayload::View(_) => "view",
            EventPayload::Resource(_) => "resource",
            EventPayload::Action(_) => "action",
            EventPayload::Error(_) => "error",
            EventPayload::LongTask(_) => "long_task",
        }
    }
}
