use uuid::Uuid;

use super::view::ChildStatus;
use super::Dependencies;
use crate::kernel::command::{Command, ErrorSource, HttpMethod};
use crate::kernel::event::{ErrorPayload, EventPayload, ResourcePayload};
use crate::kernel::time::Timestamp;
use crate::kernel::trace::TraceContext;

/// One in-flight network request, keyed by the producer's resource key.
#[derive(Debug, Clone)]
pub struct ResourceScope {
    id: Uuid,
    key: String,
    url: String,
    method: HttpMethod,
    start_time: Timestamp,
    action_id: Option<Uuid>,
    trace: Option<TraceContext>,
}

impl ResourceScope {
    pub fn new(
        id: Uuid,
        key: String,
        url: String,
        method: HttpMethod,
        start_time: Timestamp,
        action_id: Option<Uuid>,
        trace: Option<TraceContext>,
    ) -> Self {
        Self {
            id,
            key,
            url,
            method,
            start_time,
            action_id,
            trace,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Completion commands for other keys are not ours and leave the resource open.
    pub(crate) fn process(&mut self, command: &Command, deps: &Dependencies) -> ChildStatus {
        match command {
            Command::StopResource {
                time,
                key,
                kind,
                status_code,
                size,
            } if *key == self.key => ChildStatus::Finished {
                // Resource documents are dated at request start
                date: self.start_time,
                payload: EventPayload::Resource(ResourcePayload {
                    id: self.id,
                    action_id: self.action_id,
                    url: self.url.clone(),
                    method: self.method,
                    kind: *kind,
                    status_code: *status_code,
                    size: *size,
                    duration_ms: time.duration_since(self.start_time).as_millis() as u64,
                    trace: self.trace,
                }),
            },
            Command::StopResourceWithError {
                time,
                key,
                message,
                status_code,
            } if *key == self.key => ChildStatus::Finished {
                date: *time,
                payload: EventPayload::Error(ErrorPayload {
                    id: deps.ids.next_id(),
                    action_id: self.action_id,
                    message: message.clone(),
                    source: ErrorSource::Network,
                    stack: None,
                    resource_url: Some(self.url.clone()),
                    status_code: *status_code,
                }),
            },
            _ => ChildStatus::Open,
        }
    }
}
