//! Tuner orchestration
//!
//! Owns the periodic monitor loop and runs the decision pipeline on each
//! tick: collect a sample, record it, notify the metrics subscriber, run
//! the control law through the gates, and apply any surviving change to
//! the runtime's pacer.

use crate::collector::SampleCollector;
use crate::config::TunerConfig;
use crate::container::ResourceProber;
use crate::engine::{confidence, control, oscillation};
use crate::history::TunerHistory;
use crate::models::{ContainerResources, Decision, Sample, TunerStats};
use crate::runtime::GcRuntime;
use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;
use tokio::time::{interval_at, Instant};
use tracing::{debug, error, info, warn};

/// Smallest ratio change worth acting on
const MIN_CHANGE: i64 = 10;

/// Subscriber invoked after each applied decision
pub type DecisionHook = Arc<dyn Fn(&Decision) + Send + Sync>;

/// Subscriber invoked after each recorded sample
pub type MetricsHook = Arc<dyn Fn(&Sample) + Send + Sync>;

/// Adaptive controller for the runtime's GC pacer ratio.
///
/// Cheap to clone; all handles share one tuner and its methods may be
/// called from any thread. The monitor loop runs as a spawned tokio
/// task between `start` and `stop`.
#[derive(Clone)]
pub struct Tuner {
    inner: Arc<Inner>,
}

struct Inner {
    config: TunerConfig,
    collector: SampleCollector,
    runtime: Arc<dyn GcRuntime>,
    resources: ContainerResources,
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    running: bool,
    stopped: bool,
    shutdown: Option<broadcast::Sender<()>>,
    history: TunerHistory,
    total_decisions: u64,
    reverted_tunes: u64,
    stability_count: u64,
    last_ratio: i64,
    on_decision: Option<DecisionHook>,
    on_metrics: Option<MetricsHook>,
}

impl Tuner {
    /// Build a tuner over the given runtime, probing container limits
    /// from the standard filesystem locations.
    pub async fn new(config: TunerConfig, runtime: Arc<dyn GcRuntime>) -> Result<Tuner> {
        Self::with_prober(config, runtime, ResourceProber::new()).await
    }

    /// As [`Tuner::new`], with an explicit prober.
    pub async fn with_prober(
        config: TunerConfig,
        runtime: Arc<dyn GcRuntime>,
        prober: ResourceProber,
    ) -> Result<Tuner> {
        config.validate().context("invalid config")?;

        let resources = prober.probe().await;
        if resources.containerized {
            info!(
                memory_limit_bytes = resources.memory_limit_bytes,
                cpu_limit_cores = resources.cpu_limit_cores,
                "detected container resource limits"
            );
        }

        let last_ratio = match runtime.snapshot() {
            Ok(snapshot) => snapshot.gc_ratio,
            Err(error) => {
                warn!(%error, "could not read initial pacer ratio");
                0
            }
        };

        let collector = SampleCollector::new(
            runtime.clone(),
            resources.clone(),
            config.memory_limit_percent,
        );

        Ok(Tuner {
            inner: Arc::new(Inner {
                config,
                collector,
                runtime,
                resources,
                state: RwLock::new(State {
                    last_ratio,
                    ..Default::default()
                }),
            }),
        })
    }

    /// Begin the periodic tuning loop.
    ///
    /// Fails if the tuner is already running or was stopped; a stopped
    /// tuner cannot be restarted.
    pub fn start(&self) -> Result<()> {
        let mut state = self.inner.state_write();
        if state.running {
            bail!("tuner is already running");
        }
        if state.stopped {
            bail!("tuner cannot be restarted after stop");
        }

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        state.shutdown = Some(shutdown_tx);
        state.running = true;
        drop(state);

        info!(
            interval_secs = self.inner.config.monitor_interval.as_secs(),
            "starting gc pacer tuner"
        );

        let inner = self.inner.clone();
        tokio::spawn(async move { inner.run(shutdown_rx).await });

        Ok(())
    }

    /// Stop the tuning loop. Returns without waiting for an in-flight
    /// tick. Fails if the tuner is not running.
    pub fn stop(&self) -> Result<()> {
        let mut state = self.inner.state_write();
        if !state.running {
            bail!("tuner is not running");
        }
        state.running = false;
        state.stopped = true;
        let shutdown = state.shutdown.take();
        drop(state);

        if let Some(tx) = shutdown {
            let _ = tx.send(());
        }
        info!("stopping gc pacer tuner");

        Ok(())
    }

    /// Synthesize a fresh sample without recording it. The result is
    /// consistent for this call but independent of the sample history.
    pub fn metrics(&self) -> Result<Sample> {
        let state = self.inner.state_read();
        self.inner.collector.collect(state.history.samples().last())
    }

    /// Aggregate counters and state.
    pub fn stats(&self) -> TunerStats {
        let state = self.inner.state_read();
        let current_ratio = self
            .inner
            .runtime
            .snapshot()
            .map(|s| s.gc_ratio)
            .unwrap_or(state.last_ratio);

        TunerStats {
            total_decisions: state.total_decisions,
            reverted_tunes: state.reverted_tunes,
            stability_count: state.stability_count,
            current_ratio,
            samples_recorded: state.history.samples().len(),
            decisions_recorded: state.history.decisions().len(),
            running: state.running,
        }
    }

    /// Container limits discovered at construction.
    pub fn resources(&self) -> &ContainerResources {
        &self.inner.resources
    }

    /// Subscribe to applied decisions. The hook runs on the monitor task
    /// with the tuner lock released, so it may call back into the tuner.
    pub fn set_on_decision(&self, hook: impl Fn(&Decision) + Send + Sync + 'static) {
        self.inner.state_write().on_decision = Some(Arc::new(hook));
    }

    /// Subscribe to recorded samples. Same invocation contract as
    /// [`Tuner::set_on_decision`].
    pub fn set_on_metrics(&self, hook: impl Fn(&Sample) + Send + Sync + 'static) {
        self.inner.state_write().on_metrics = Some(Arc::new(hook));
    }
}

impl Inner {
    fn state_read(&self) -> RwLockReadGuard<'_, State> {
        // A tick that panicked is caught and logged; its state is still
        // usable, so poisoning is recovered rather than propagated.
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        let period = self.config.monitor_interval;
        // First fire lands one full interval after start.
        let mut ticker = interval_at(Instant::now() + period, period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(cause) = panic::catch_unwind(AssertUnwindSafe(|| self.tick())) {
                        error!(cause = panic_message(cause.as_ref()), "panic in tuning cycle");
                    }
                }
                _ = shutdown.recv() => {
                    debug!("tuning loop shut down");
                    break;
                }
            }
        }
    }

    /// One complete tuning cycle: sample, record, notify, evaluate.
    fn tick(&self) {
        let sample = {
            let state = self.state_read();
            match self.collector.collect(state.history.samples().last()) {
                Ok(sample) => sample,
                Err(error) => {
                    warn!(%error, "runtime snapshot failed, skipping sample");
                    return;
                }
            }
        };

        let metrics_hook = {
            let mut state = self.state_write();
            state.history.push_sample(sample.clone());
            state.on_metrics.clone()
        };
        if let Some(hook) = metrics_hook {
            hook(&sample);
        }

        self.evaluate(sample);
    }

    /// Run the control law and the gates over a recorded sample, applying
    /// the change if every gate passes.
    fn evaluate(&self, sample: Sample) {
        let mut state = self.state_write();

        // A lone sample has no frequency reference; wait for more data.
        if state.history.samples().len() < 2 {
            return;
        }

        let target = control::target_ratio(&sample, &self.config);
        let change = target - sample.gc_ratio;
        if change.abs() < MIN_CHANGE {
            state.stability_count += 1;
            return;
        }

        let capped = if change.abs() > self.config.max_change_per_interval {
            sample.gc_ratio + change.signum() * self.config.max_change_per_interval
        } else {
            target
        };
        let new_ratio = capped.clamp(self.config.min_ratio, self.config.max_ratio);

        // Clamping can land back on the current ratio when it is already
        // pinned to a bound; there is nothing to apply then.
        if new_ratio == sample.gc_ratio {
            state.stability_count += 1;
            return;
        }

        let now = Utc::now();
        if oscillation::is_oscillating(&state.history, self.config.stabilization_window, now) {
            debug!("recent decisions are oscillating, skipping tuning");
            return;
        }

        let confidence = confidence::estimate(&sample, &state.history, &self.config);
        if confidence < confidence::MIN_CONFIDENCE {
            debug!(confidence, "confidence too low, skipping tuning");
            return;
        }

        let reason = build_reason(&sample, &self.config, sample.gc_ratio, new_ratio);

        // The setter reports what it replaced; record that as the old
        // ratio so the decision stays truthful even if something else
        // moved the knob.
        let old_ratio = self.runtime.set_gc_ratio(new_ratio);
        let decision = Decision {
            old_ratio,
            new_ratio,
            reason,
            confidence,
            timestamp: now,
            sample,
        };

        state.history.push_decision(decision.clone());
        state.total_decisions += 1;
        state.last_ratio = new_ratio;
        state.stability_count = 0;
        let hook = state.on_decision.clone();
        drop(state);

        info!(
            confidence = decision.confidence,
            reason = %decision.reason,
            "Applied GC tuning"
        );
        if let Some(hook) = hook {
            hook(&decision);
        }
    }
}

/// Human-readable summary of the triggers behind a decision.
fn build_reason(sample: &Sample, config: &TunerConfig, old_ratio: i64, new_ratio: i64) -> String {
    let mut reasons = Vec::new();

    if sample.gc_pause > config.target_pause {
        reasons.push(format!(
            "GC pause {:.2}ms > target {:.2}ms",
            sample.gc_pause.as_secs_f64() * 1000.0,
            config.target_pause.as_secs_f64() * 1000.0
        ));
    }
    if sample.memory_pressure > 0.8 {
        reasons.push(format!(
            "high memory pressure {:.1}%",
            sample.memory_pressure * 100.0
        ));
    }
    if sample.gc_frequency > 2.0 {
        reasons.push(format!("high GC frequency {:.1}/sec", sample.gc_frequency));
    }

    let direction = if new_ratio < old_ratio {
        "decreasing"
    } else {
        "increasing"
    };

    if reasons.is_empty() {
        format!("optimizing performance by {direction} GC ratio {old_ratio} -> {new_ratio}")
    } else {
        format!(
            "{direction} GC ratio {old_ratio} -> {new_ratio} due to: {}",
            reasons.join(", ")
        )
    }
}

fn panic_message(cause: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = cause.downcast_ref::<&str>() {
        message
    } else if let Some(message) = cause.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
