//! The scope tree: Application → Session → View → Resource/Action.
//!
//! Every level exposes a total `process(command) -> bool`; `false` tells the parent to
//! drop the scope. Parents pass identity down as borrowed context structs, children never
//! point back up. The tree is single-threaded and driven by the `Reactor`.

pub mod action;
pub mod application;
pub mod resource;
pub mod session;
pub mod view;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::kernel::config::RumConfig;
use crate::kernel::id::{IdGenerator, RandomIdGenerator};
use crate::kernel::sampler::{RandomSampler, Sampler};
use crate::kernel::telemetry::TelemetryRecorder;
use crate::outputs::EventSink;

pub use action::ActionScope;
pub use application::ApplicationScope;
pub use resource::ResourceScope;
pub use session::SessionScope;
pub use view::ViewScope;

/// Shared, read-only collaborators for the whole tree.
#[derive(Clone)]
pub struct Dependencies {
    pub config: RumConfig,
    pub sampler: Arc<dyn Sampler>,
    pub ids: Arc<dyn IdGenerator>,
}

impl Dependencies {
    /// Takes `config` as is; run `RumConfig::validate` first when it was built in code.
    pub fn new(config: RumConfig) -> Self {
        Self {
            config,
            sampler: Arc::new(RandomSampler),
            ids: Arc::new(RandomIdGenerator),
        }
    }

    pub fn with_sampler(mut self, sampler: impl Sampler + 'static) -> Self {
        self.sampler = Arc::new(sampler);
        self
    }

    pub fn with_ids(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Arc::new(ids);
        self
    }
}

/// Where scopes put what they produce: finished events and telemetry.
pub struct ScopeOutput<'a> {
    pub sink: &'a mut dyn EventSink,
    pub telemetry: &'a mut TelemetryRecorder,
}

impl<'a> ScopeOutput<'a> {
    pub fn new(sink: &'a mut dyn EventSink, telemetry: &'a mut TelemetryRecorder) -> Self {
        Self { sink, telemetry }
    }
}

/// Session identity handed to views when they emit.
#[derive(Debug, Clone, Copy)]
pub struct ParentContext<'a> {
    pub application_id: &'a str,
    pub session_id: Uuid,
}

/// How a session addresses one of its views for the current command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Routing {
    /// Most recently started active view: new resources, actions, errors and long tasks land here.
    pub accepts_new_children: bool,
    /// Most recent active view whose identity matches a `StopView`.
    pub is_stop_target: bool,
}

impl Routing {
    pub const PASSIVE: Routing = Routing {
        accepts_new_children: false,
        is_stop_target: false,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewKind {
    /// Started by an explicit `StartView`.
    Tracked,
    ApplicationLaunch,
    Background,
}
