use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::command::Command;
use super::config::{ConfigError, RumConfig};
use super::scopes::{ApplicationScope, Dependencies, ScopeOutput};
use super::telemetry::TelemetryRecorder;
use super::trace::TraceInjector;
use crate::monitor::RumMonitor;
use crate::outputs::EventSink;

/// The single serial consumer of commands. All tree mutation happens here, in arrival order.
pub struct Reactor<S: EventSink> {
    pub receiver: mpsc::Receiver<Command>,
    pub application: ApplicationScope,
    pub sink: S,
    pub telemetry: TelemetryRecorder,
    processed: u64,
}

impl<S: EventSink> Reactor<S> {
    pub fn new(receiver: mpsc::Receiver<Command>, application: ApplicationScope, sink: S) -> Self {
        Self {
            receiver,
            application,
            sink,
            telemetry: TelemetryRecorder::new(),
            processed: 0,
        }
    }

    /// Wires a producer handle and its reactor around one bounded queue.
    pub fn build(dependencies: Dependencies, sink: S, queue_capacity: usize) -> (RumMonitor, Self) {
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let injector = TraceInjector::new(
            &dependencies.config,
            dependencies.sampler.clone(),
            dependencies.ids.clone(),
        );
        let monitor = RumMonitor::new(tx).with_trace_injector(injector);
        let reactor = Self::new(rx, ApplicationScope::new(dependencies), sink);
        (monitor, reactor)
    }

    /// Validates `config` first. `build` trusts its dependencies as given.
    pub fn from_config(config: RumConfig, sink: S, queue_capacity: usize) -> Result<(RumMonitor, Self), ConfigError> {
        config.validate()?;
        Ok(Self::build(Dependencies::new(config), sink, queue_capacity))
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Pure step: feeds commands into the tree in order. No I/O, no awaiting.
    pub fn step(&mut self, commands: Vec<Command>) -> usize {
        let count = commands.len();
        for command in commands {
            let mut out = ScopeOutput::new(&mut self.sink, &mut self.telemetry);
            self.application.process(&command, &mut out);
        }
        self.processed += count as u64;
        count
    }

    /// Async driver. Returns when `shutdown` fires or every producer handle is dropped;
    /// commands already queued at shutdown are still processed.
    pub async fn run(&mut self, shutdown: CancellationToken) {
        info!("RUM reactor started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                received = self.receiver.recv() => match received {
                    Some(command) => {
                        let mut batch = vec![command];
                        while let Ok(next) = self.receiver.try_recv() {
                            batch.push(next);
                        }
                        self.step(batch);
                    }
                    None => {
                        debug!("All RUM producers dropped");
                        break;
                    }
                },
            }
        }

        let mut remaining = Vec::new();
        while let Ok(command) = self.receiver.try_recv() {
            remaining.push(command);
        }
        self.step(remaining);

        info!(processed = self.processed, "RUM reactor stopped");
    }
}
