use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use rumscope::kernel::command::{ActionType, ErrorSource, HttpMethod, ResourceKind};
use rumscope::outputs::JsonLinesSink;
use rumscope::{Reactor, RumConfig};

const QUEUE_CAPACITY: usize = 1024;

fn load_config() -> Result<RumConfig> {
    match std::env::args().nth(1) {
        Some(path) => RumConfig::from_file(&path).with_context(|| format!("loading config from {path}")),
        None => {
            let mut config = RumConfig::new("demo-app");
            config.background_events_tracking = true;
            config.first_party_hosts = vec!["api.example.com".to_string()];
            config.trace_sample_rate = 100.0;
            Ok(config)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber")?;

    let config = load_config()?;
    tracing::info!(application_id = %config.application_id, "RUM demo booting");

    let (monitor, mut reactor) = Reactor::from_config(config, JsonLinesSink::new(io::stdout()), QUEUE_CAPACITY)?;

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let driver = tokio::spawn(async move {
        reactor.run(shutdown).await;
        reactor
    });

    monitor.application_start();
    monitor.start_view("home", "Home", "demo/home");

    let headers = monitor.start_resource("feed", "https://api.example.com/feed", HttpMethod::Get);
    for (name, value) in &headers {
        tracing::info!(%name, %value, "trace header");
    }
    tokio::time::sleep(Duration::from_millis(30)).await;
    monitor.stop_resource("feed", ResourceKind::Xhr, Some(200), Some(2048));

    monitor.add_action(ActionType::Tap, "Refresh");
    monitor.add_error("pull to refresh failed", ErrorSource::Source, None);
    monitor.add_long_task(Duration::from_millis(120));
    monitor.stop_view("home");

    let dropped = monitor.dropped_commands();
    drop(monitor);

    let reactor = driver.await.context("reactor task panicked")?;
    let snapshot = reactor.telemetry.snapshot();
    tracing::info!(
        processed = reactor.processed(),
        dropped,
        sessions = snapshot.session_stats.started,
        views = snapshot.view_stats.started,
        warnings = snapshot.usage_warnings,
        "RUM demo finished"
    );
    Ok(())
}
