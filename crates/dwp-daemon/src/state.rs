//! Shared runtime state for dwp-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. Passes always go
//! through [`execute_pass`], whether a timer or an operator asked for them.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dwp_config::ScheduleSection;
use dwp_runtime::{PassError, PassOutcome, PassReport, PromotionRunner};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use tracing::{error, warn};
use uuid::Uuid;

use crate::schedule::{Registration, ScheduleInfo, ScheduleRegistry};

// ---------------------------------------------------------------------------
// BusMsg: SSE event bus payload
// ---------------------------------------------------------------------------

/// Messages broadcast over the internal event bus and surfaced as SSE events.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMsg {
    Heartbeat { ts_millis: i64 },
    Status(StatusSnapshot),
    PassCompleted(PassReport),
    LogLine { level: String, msg: String },
}

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// StatusSnapshot
// ---------------------------------------------------------------------------

/// Returned by GET /v1/status and carried inside SSE `status` events.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub daemon_uptime_secs: u64,
    /// "idle" | "running"
    pub state: String,
    pub config_hash: Option<String>,
    pub schedules: Vec<ScheduleInfo>,
    pub passes_completed: u64,
    pub passes_skipped_overlap: u64,
    pub passes_failed: u64,
    pub orders_promoted_total: u64,
    pub last_pass_id: Option<Uuid>,
    pub last_pass_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Who asked for a pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassTrigger {
    Schedule,
    Manual,
}

impl PassTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassTrigger::Schedule => "schedule",
            PassTrigger::Manual => "manual",
        }
    }
}

/// Why [`execute_pass`] produced no report.
#[derive(Debug)]
pub enum ExecuteError {
    Pass(PassError),
    /// The blocking task panicked or was cancelled.
    Join(String),
}

impl std::fmt::Display for ExecuteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecuteError::Pass(e) => write!(f, "{e}"),
            ExecuteError::Join(msg) => write!(f, "PASS_TASK_FAILED: {msg}"),
        }
    }
}

impl std::error::Error for ExecuteError {}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Cloneable (Arc) handle shared across all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Broadcast bus for SSE.
    pub bus: broadcast::Sender<BusMsg>,
    pub build: BuildInfo,
    pub status: Arc<RwLock<StatusSnapshot>>,
    pub last_report: Arc<RwLock<Option<PassReport>>>,
    pub runner: Arc<PromotionRunner>,
    pub schedules: ScheduleRegistry,
}

impl AppState {
    pub fn new(runner: Arc<PromotionRunner>, config_hash: Option<String>) -> Self {
        let (bus, _rx) = broadcast::channel::<BusMsg>(1024);

        let initial_status = StatusSnapshot {
            daemon_uptime_secs: uptime_secs(),
            state: "idle".to_string(),
            config_hash,
            ..StatusSnapshot::default()
        };

        Self {
            bus,
            build: BuildInfo {
                service: "dwp-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            status: Arc::new(RwLock::new(initial_status)),
            last_report: Arc::new(RwLock::new(None)),
            runner,
            schedules: ScheduleRegistry::new(),
        }
    }

    /// Current status with live uptime, schedule list and running flag.
    pub async fn snapshot(&self) -> StatusSnapshot {
        let mut snap = self.status.read().await.clone();
        snap.daemon_uptime_secs = uptime_secs();
        snap.schedules = self.schedules.list();
        snap.state = if self.runner.is_running() {
            "running"
        } else {
            "idle"
        }
        .to_string();
        snap
    }
}

// ---------------------------------------------------------------------------
// Passes
// ---------------------------------------------------------------------------

/// Run one pass on the blocking pool and fold the result into shared state.
pub async fn execute_pass(
    state: &Arc<AppState>,
    trigger: PassTrigger,
) -> Result<PassOutcome, ExecuteError> {
    let runner = Arc::clone(&state.runner);
    let result = tokio::task::spawn_blocking(move || runner.run_once())
        .await
        .map_err(|e| ExecuteError::Join(e.to_string()))
        .and_then(|r| r.map_err(ExecuteError::Pass));

    match &result {
        Ok(PassOutcome::Completed(report)) => {
            {
                let mut s = state.status.write().await;
                s.passes_completed += 1;
                s.orders_promoted_total += report.promoted as u64;
                s.last_pass_id = Some(report.pass_id);
                s.last_pass_at = Some(report.finished_at);
                s.last_error = None;
            }
            *state.last_report.write().await = Some(report.clone());
            let _ = state.bus.send(BusMsg::PassCompleted(report.clone()));
            let _ = state.bus.send(BusMsg::LogLine {
                level: if report.failed > 0 { "WARN" } else { "INFO" }.to_string(),
                msg: format!(
                    "{} pass: {} inspected, {} promoted, {} failed",
                    trigger.as_str(),
                    report.inspected,
                    report.promoted,
                    report.failed
                ),
            });
        }
        Ok(PassOutcome::SkippedOverlap) => {
            state.status.write().await.passes_skipped_overlap += 1;
            warn!(trigger = trigger.as_str(), "pass skipped: previous pass still running");
        }
        Err(e) => {
            {
                let mut s = state.status.write().await;
                s.passes_failed += 1;
                s.last_error = Some(e.to_string());
            }
            error!(trigger = trigger.as_str(), error = %e, "pass failed");
            let _ = state.bus.send(BusMsg::LogLine {
                level: "ERROR".to_string(),
                msg: e.to_string(),
            });
        }
    }

    result
}

/// Register the periodic promotion pass described by `cfg`.
pub fn schedule_promotion(state: &Arc<AppState>, cfg: &ScheduleSection) -> Registration {
    let st = Arc::clone(state);
    state.schedules.register(
        &cfg.name,
        Duration::from_secs(cfg.interval_secs),
        cfg.run_on_start,
        move || {
            let st = Arc::clone(&st);
            async move {
                // Failures are already recorded in state and logged.
                let _ = execute_pass(&st, PassTrigger::Schedule).await;
            }
        },
    )
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Monotonically increasing uptime since first call (process lifetime).
pub fn uptime_secs() -> u64 {
    static START: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();
    START
        .get_or_init(std::time::Instant::now)
        .elapsed()
        .as_secs()
}

/// Spawn a background task that emits a heartbeat SSE every `interval`.
pub fn spawn_heartbeat(bus: broadcast::Sender<BusMsg>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let ts = chrono::Utc::now().timestamp_millis();
            let _ = bus.send(BusMsg::Heartbeat { ts_millis: ts });
        }
    });
}
