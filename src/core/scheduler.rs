//! Timer-driven auto mode.
//!
//! One background task runs the pipeline every interval while enabled. Runs
//! are spawned so the timer keeps ticking; a tick landing while a run is
//! still in flight is skipped because the pipeline guard is held. Missed ticks
//! are dropped, never replayed in a burst.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::core::agent_log::AgentLog;
use crate::core::pipeline::{PipelineError, PipelineRunner};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub enabled: bool,
    pub interval: Duration,
}

impl ScheduleConfig {
    pub fn from_minutes(enabled: bool, minutes: u64) -> Self {
        Self {
            enabled,
            interval: Duration::from_secs(minutes.max(1) * 60),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleStatus {
    pub enabled: bool,
    pub interval_minutes: u64,
    pub running: bool,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_outcome: Option<String>,
    pub next_run_at: Option<DateTime<Utc>>,
    pub skipped_runs: u64,
}

#[derive(Debug, Default)]
struct RunState {
    last_run_at: Option<DateTime<Utc>>,
    last_outcome: Option<String>,
    next_run_at: Option<DateTime<Utc>>,
    skipped_runs: u64,
}

type SharedState = Arc<Mutex<RunState>>;

fn with_state<R>(state: &SharedState, f: impl FnOnce(&mut RunState) -> R) -> R {
    let mut guard = state.lock().unwrap_or_else(|e| e.into_inner());
    f(&mut guard)
}

pub struct AutoScheduler {
    runner: Arc<dyn PipelineRunner>,
    log: Arc<AgentLog>,
    config: watch::Sender<ScheduleConfig>,
    state: SharedState,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl AutoScheduler {
    pub fn new(runner: Arc<dyn PipelineRunner>, log: Arc<AgentLog>, config: ScheduleConfig) -> Self {
        let (config, _) = watch::channel(config);
        Self {
            runner,
            log,
            config,
            state: Arc::new(Mutex::new(RunState::default())),
            task: Mutex::new(None),
        }
    }

    /// Spawn the timer task; calling it again is a no-op
    pub fn start(&self) {
        let mut task = self.task.lock().unwrap_or_else(|e| e.into_inner());
        if task.is_some() {
            return;
        }

        let runner = Arc::clone(&self.runner);
        let log = Arc::clone(&self.log);
        let state = Arc::clone(&self.state);
        let config = self.config.subscribe();
        *task = Some(tokio::spawn(run_timer(runner, log, state, config)));
        tracing::info!("Auto scheduler started");
    }

    pub fn shutdown(&self) {
        let mut task = self.task.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = task.take() {
            handle.abort();
            tracing::info!("Auto scheduler stopped");
        }
    }

    /// Change the schedule; the running timer picks it up immediately
    pub fn update(&self, enabled: Option<bool>, interval: Option<Duration>) -> ScheduleStatus {
        self.config.send_modify(|config| {
            if let Some(enabled) = enabled {
                config.enabled = enabled;
            }
            if let Some(interval) = interval {
                config.interval = interval;
            }
        });

        let config = *self.config.borrow();
        tracing::info!(
            "Auto mode {} every {:?}",
            if config.enabled { "enabled" } else { "disabled" },
            config.interval
        );
        self.log.info(format!(
            "Auto mode {}, interval {} min",
            if config.enabled { "enabled" } else { "disabled" },
            config.interval.as_secs() / 60
        ));
        if !config.enabled {
            with_state(&self.state, |s| s.next_run_at = None);
        }
        self.status()
    }

    pub fn status(&self) -> ScheduleStatus {
        let config = *self.config.borrow();
        with_state(&self.state, |s| ScheduleStatus {
            enabled: config.enabled,
            interval_minutes: config.interval.as_secs() / 60,
            running: self.runner.is_busy(),
            last_run_at: s.last_run_at,
            last_outcome: s.last_outcome.clone(),
            next_run_at: if config.enabled { s.next_run_at } else { None },
            skipped_runs: s.skipped_runs,
        })
    }
}

impl Drop for AutoScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_timer(
    runner: Arc<dyn PipelineRunner>,
    log: Arc<AgentLog>,
    state: SharedState,
    mut config: watch::Receiver<ScheduleConfig>,
) {
    loop {
        let current = *config.borrow_and_update();

        if !current.enabled {
            with_state(&state, |s| s.next_run_at = None);
            if config.changed().await.is_err() {
                return;
            }
            continue;
        }

        let mut ticker = tokio::time::interval_at(Instant::now() + current.interval, current.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        set_next_run(&state, current.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    set_next_run(&state, current.interval);
                    tokio::spawn(run_once(Arc::clone(&runner), Arc::clone(&log), Arc::clone(&state)));
                }
                changed = config.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    break;
                }
            }
        }
    }
}

fn set_next_run(state: &SharedState, interval: Duration) {
    let next = chrono::Duration::from_std(interval)
        .ok()
        .map(|step| Utc::now() + step);
    with_state(state, |s| s.next_run_at = next);
}

async fn run_once(runner: Arc<dyn PipelineRunner>, log: Arc<AgentLog>, state: SharedState) {
    let started = Utc::now();
    match runner.run_auto().await {
        Ok(report) => {
            let outcome = if report.success {
                "success"
            } else {
                "completed with errors"
            };
            with_state(&state, |s| {
                s.last_run_at = Some(started);
                s.last_outcome = Some(outcome.to_string());
            });
        }
        Err(PipelineError::Busy) => {
            tracing::warn!("Scheduled run skipped: previous run still in progress");
            log.warn("Scheduled run skipped: previous run still in progress");
            with_state(&state, |s| s.skipped_runs += 1);
        }
        Err(e) => {
            tracing::error!("Scheduled run failed: {}", e);
            log.error(format!("Scheduled run failed: {}", e));
            with_state(&state, |s| {
                s.last_run_at = Some(started);
                s.last_outcome = Some(format!("failed: {}", e));
            });
        }
    }
}
