use std::time::Duration;

use rumscope::kernel::command::{ApplicationState, Command, ErrorSource, HttpMethod, ResourceKind};
use rumscope::kernel::config::RumConfig;
use rumscope::kernel::event::RumEvent;
use rumscope::kernel::id::SequentialIdGenerator;
use rumscope::kernel::sampler::FixedSampler;
use rumscope::kernel::scopes::session::{
    SessionScope, SessionState, APPLICATION_LAUNCH_VIEW_NAME, APPLICATION_LAUNCH_VIEW_PATH, BACKGROUND_VIEW_NAME,
    BACKGROUND_VIEW_PATH,
};
use rumscope::kernel::scopes::{Dependencies, ScopeOutput, ViewKind};
use rumscope::kernel::telemetry::{SessionEndReason, TelemetryRecorder};
use rumscope::kernel::time::Timestamp;
use uuid::Uuid;

const MINUTE: u64 = 60_000;

struct Harness {
    deps: Dependencies,
    sink: Vec<RumEvent>,
    telemetry: TelemetryRecorder,
}

impl Harness {
    fn new(config: RumConfig) -> Self {
        Self::with_deps(
            Dependencies::new(config)
                .with_sampler(FixedSampler::always())
                .with_ids(SequentialIdGenerator::new()),
        )
    }

    fn with_deps(deps: Dependencies) -> Self {
        Self {
            deps,
            sink: Vec::new(),
            telemetry: TelemetryRecorder::new(),
        }
    }

    fn session(&mut self, is_initial: bool, ms: u64) -> SessionScope {
        SessionScope::new(is_initial, at(ms), &self.deps, &mut self.telemetry)
    }

    fn process(&mut self, session: &mut SessionScope, command: Command) -> bool {
        self.process_in(session, command, ApplicationState::Foreground)
    }

    fn process_in(&mut self, session: &mut SessionScope, command: Command, state: ApplicationState) -> bool {
        let mut out = ScopeOutput::new(&mut self.sink, &mut self.telemetry);
        session.process(&command, state, &self.deps, &mut out)
    }
}

fn at(ms: u64) -> Timestamp {
    Timestamp::from_millis(ms)
}

fn start_view(ms: u64, identity: &str) -> Command {
    Command::StartView {
        time: at(ms),
        identity: identity.into(),
        name: identity.to_uppercase(),
        path: format!("app/{identity}"),
    }
}

fn stop_view(ms: u64, identity: &str) -> Command {
    Command::StopView { time: at(ms), identity: identity.into() }
}

fn start_resource(ms: u64, key: &str) -> Command {
    Command::StartResource {
        time: at(ms),
        key: key.into(),
        url: "https://api.example.com/items".into(),
        method: HttpMethod::Get,
        trace: None,
    }
}

fn stop_resource(ms: u64, key: &str) -> Command {
    Command::StopResource {
        time: at(ms),
        key: key.into(),
        kind: ResourceKind::Fetch,
        status_code: Some(200),
        size: Some(512),
    }
}

fn add_error(ms: u64) -> Command {
    Command::AddError {
        time: at(ms),
        message: "boom".into(),
        source: ErrorSource::Source,
        stack: None,
    }
}

fn config() -> RumConfig {
    RumConfig::new("rum-app")
}

fn tracking_background() -> RumConfig {
    let mut config = config();
    config.background_events_tracking = true;
    config
}

fn full_journey(h: &mut Harness, session: &mut SessionScope) {
    h.process(session, start_view(0, "home"));
    h.process(session, start_resource(10, "r1"));
    h.process(session, stop_resource(40, "r1"));
    h.process(session, add_error(50));
    h.process(session, stop_view(100, "home"));
}

#[test]
fn zero_sample_rate_suppresses_every_event() {
    let mut config = config();
    config.session_sample_rate = 0.0;
    let mut h = Harness::with_deps(Dependencies::new(config).with_ids(SequentialIdGenerator::new()));
    let mut session = h.session(true, 0);

    full_journey(&mut h, &mut session);

    assert!(!session.is_sampled());
    assert_eq!(session.session_id(), Uuid::nil());
    assert!(session.view_scopes().is_empty());
    assert!(h.sink.is_empty());
}

#[test]
fn full_sample_rate_keeps_every_event() {
    let mut h = Harness::with_deps(Dependencies::new(config()).with_ids(SequentialIdGenerator::new()));
    let mut session = h.session(true, 0);

    full_journey(&mut h, &mut session);

    assert!(session.is_sampled());
    assert_ne!(session.session_id(), Uuid::nil());
    let kinds: Vec<&str> = h.sink.iter().map(|e| e.type_name()).collect();
    assert!(kinds.contains(&"resource"));
    assert!(kinds.contains(&"error"));
    assert!(h.sink.iter().all(|e| e.context.session_id == session.session_id()));
}

#[test]
fn expires_after_max_duration() {
    let mut config = config();
    config.session_max_duration = Duration::from_secs(60);
    let mut h = Harness::new(config);
    let mut session = h.session(true, 0);

    assert!(h.process(&mut session, start_view(0, "home")));
    assert!(h.process(&mut session, add_error(59_999)));
    assert!(!h.process(&mut session, add_error(60_000)));
    assert_eq!(session.state(), SessionState::Expired(SessionEndReason::MaxDuration));
}

#[test]
fn expires_after_inactivity() {
    let timeout = 15 * MINUTE;
    let mut h = Harness::new(config());
    let mut session = h.session(true, 0);
    let id = session.session_id();

    assert!(h.process(&mut session, start_view(0, "home")));
    assert!(h.process(&mut session, add_error(timeout / 2)));
    assert_eq!(session.session_id(), id);
    assert!(!h.process(&mut session, add_error(timeout / 2 + timeout)));
    assert_eq!(session.state(), SessionState::Expired(SessionEndReason::Timeout));
}

#[test]
fn expiry_closes_views_at_last_activity() {
    let mut h = Harness::new(config());
    let mut session = h.session(true, 0);

    h.process(&mut session, start_view(0, "home"));
    h.process(&mut session, add_error(5_000));
    assert!(!h.process(&mut session, add_error(5_000 + 15 * MINUTE)));

    let last = h.sink.iter().rev().find_map(|e| e.view()).unwrap();
    assert!(!last.is_active);
    assert_eq!(last.time_spent_ms, 5_000);
    assert!(session.view_scopes().is_empty());
}

#[test]
fn start_stop_cycles_do_not_leak_views() {
    let mut h = Harness::new(config());
    let mut session = h.session(true, 0);

    for cycle in 0..3 {
        let t = cycle * 1_000;
        h.process(&mut session, start_view(t, "home"));
        assert_eq!(session.view_scopes().len(), 1);
        h.process(&mut session, stop_view(t + 500, "home"));
        assert_eq!(session.view_scopes().len(), 0);
    }
}

#[test]
fn background_view_starts_when_tracking_is_enabled() {
    let mut h = Harness::new(tracking_background());
    let mut session = h.session(false, 0);

    h.process(&mut session, start_resource(10, "r1"));

    let views = session.view_scopes();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].kind(), ViewKind::Background);
    assert_eq!(views[0].view_name(), BACKGROUND_VIEW_NAME);
    assert_eq!(views[0].view_path(), BACKGROUND_VIEW_PATH);
}

#[test]
fn background_view_is_not_started_when_tracking_is_disabled() {
    let mut h = Harness::new(config());
    let mut session = h.session(false, 0);

    h.process(&mut session, start_resource(10, "r1"));
    h.process(&mut session, add_error(20));

    assert!(session.view_scopes().is_empty());
    assert_eq!(h.telemetry.warnings().len(), 2);
}

#[test]
fn application_launch_view_takes_precedence_over_background() {
    let mut h = Harness::new(tracking_background());
    let mut session = h.session(true, 0);

    h.process(&mut session, start_resource(10, "r1"));

    let views = session.view_scopes();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].kind(), ViewKind::ApplicationLaunch);
    assert_eq!(views[0].view_name(), APPLICATION_LAUNCH_VIEW_NAME);
    assert_eq!(views[0].view_path(), APPLICATION_LAUNCH_VIEW_PATH);
}

#[test]
fn application_launch_view_needs_the_foreground() {
    let mut h = Harness::new(tracking_background());
    let mut session = h.session(true, 0);

    h.process_in(&mut session, start_resource(10, "r1"), ApplicationState::Background);

    let views = session.view_scopes();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].kind(), ViewKind::Background);
}

#[test]
fn non_initial_session_does_not_start_application_launch_view() {
    let mut h = Harness::new(tracking_background());
    let mut session = h.session(false, 0);

    h.process(&mut session, Command::ApplicationStart { time: at(0) });

    assert!(session.view_scopes().is_empty());
}

#[test]
fn application_launch_view_only_before_any_tracked_view() {
    let mut h = Harness::new(config());
    let mut session = h.session(true, 0);

    h.process(&mut session, start_view(0, "home"));
    h.process(&mut session, stop_view(100, "home"));
    h.process(&mut session, add_error(200));

    assert!(session.view_scopes().is_empty());
    assert_eq!(h.telemetry.warnings().len(), 1);
}

#[test]
fn first_tracked_view_ends_the_application_launch_view() {
    let mut h = Harness::new(config());
    let mut session = h.session(true, 0);

    h.process(&mut session, Command::ApplicationStart { time: at(0) });
    assert_eq!(session.view_scopes()[0].kind(), ViewKind::ApplicationLaunch);

    h.process(&mut session, start_view(100, "home"));
    let views = session.view_scopes();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].kind(), ViewKind::Tracked);

    let launch = h
        .sink
        .iter()
        .filter(|e| e.context.view.name == APPLICATION_LAUNCH_VIEW_NAME)
        .filter_map(|e| e.view())
        .last()
        .unwrap();
    assert!(!launch.is_active);
    assert_eq!(launch.time_spent_ms, 100);

    h.process(&mut session, stop_view(5_000, "home"));
    h.process(&mut session, add_error(6_000));

    assert!(!session.has_active_view());
    assert!(session.view_scopes().is_empty());
    assert_eq!(h.telemetry.warnings().len(), 1);
}

#[test]
fn tracked_view_ends_the_background_view() {
    let mut h = Harness::new(tracking_background());
    let mut session = h.session(false, 0);

    h.process(&mut session, add_error(10));
    assert_eq!(session.view_scopes()[0].kind(), ViewKind::Background);
    assert_eq!(session.view_scopes()[0].view_start_time(), at(10));

    h.process(&mut session, start_view(50, "home"));
    h.process(&mut session, add_error(60));

    let views = session.view_scopes();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].view_name(), "HOME");
    assert_eq!(views[0].error_count(), 1);
}

#[test]
fn command_without_view_is_dropped_with_one_warning() {
    let mut h = Harness::new(tracking_background());
    let mut session = h.session(true, 0);

    h.process(&mut session, Command::AddLongTask { time: at(10), duration_ms: 150 });

    assert!(session.view_scopes().is_empty());
    assert!(h.sink.is_empty());
    let warnings = h.telemetry.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("AddLongTask"));
    assert!(warnings[0].contains("no view is active"));
}

#[test]
fn completions_without_view_are_silent() {
    let mut h = Harness::new(config());
    let mut session = h.session(false, 0);

    h.process(&mut session, stop_resource(10, "unknown"));
    h.process(&mut session, stop_view(20, "gone"));
    h.process(&mut session, Command::KeepAlive { time: at(30) });

    assert!(session.view_scopes().is_empty());
    assert!(h.telemetry.warnings().is_empty());
}

#[test]
fn new_work_goes_to_the_most_recent_active_view() {
    let mut h = Harness::new(config());
    let mut session = h.session(true, 0);

    h.process(&mut session, start_view(0, "list"));
    h.process(&mut session, start_view(10, "detail"));
    h.process(&mut session, add_error(20));

    let views = session.view_scopes();
    assert_eq!(views.len(), 2);
    assert_eq!(views[0].error_count(), 0);
    assert_eq!(views[1].error_count(), 1);

    h.process(&mut session, stop_view(30, "detail"));
    h.process(&mut session, add_error(40));
    let views = session.view_scopes();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].view_name(), "LIST");
    assert_eq!(views[0].error_count(), 1);
}

#[test]
fn context_reflects_sampling_and_active_view() {
    let mut h = Harness::new(config());
    let mut session = h.session(true, 0);
    h.process(&mut session, start_view(0, "home"));

    let context = session.context("rum-app");
    assert_eq!(context.application_id, "rum-app");
    assert_eq!(context.session_id, session.session_id());
    assert_eq!(context.view_name.as_deref(), Some("HOME"));

    let mut unsampled = Harness::new(config());
    unsampled.deps = unsampled.deps.clone().with_sampler(FixedSampler::never());
    let mut dropped = unsampled.session(true, 0);
    unsampled.process(&mut dropped, start_view(0, "home"));
    let context = dropped.context("rum-app");
    assert_eq!(context.session_id, Uuid::nil());
    assert_eq!(context.view_id, None);
}
