//! Named periodic jobs.
//!
//! Registration is keyed by name and idempotent: registering a name that is
//! already scheduled returns [`Registration::AlreadyScheduled`] and spawns
//! nothing, so startup code can call `register` unconditionally.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{info, warn};

/// Start used when `now + period` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Registration {
    Scheduled,
    AlreadyScheduled,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleInfo {
    pub name: String,
    pub period_secs: u64,
    pub run_on_start: bool,
}

struct Entry {
    info: ScheduleInfo,
    handle: JoinHandle<()>,
}

#[derive(Clone, Default)]
pub struct ScheduleRegistry {
    entries: Arc<Mutex<BTreeMap<String, Entry>>>,
}

impl ScheduleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `job` every `period` under `name`.
    ///
    /// With `run_on_start` the first run happens immediately; otherwise one
    /// full period after registration. A run that overruns its period makes
    /// the missed ticks collapse into one instead of firing back-to-back.
    /// Must be called from within a Tokio runtime.
    pub fn register<F, Fut>(
        &self,
        name: &str,
        period: Duration,
        run_on_start: bool,
        job: F,
    ) -> Registration
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut entries = self.lock();
        if entries.contains_key(name) {
            info!(schedule = name, "already scheduled; keeping existing registration");
            return Registration::AlreadyScheduled;
        }

        let now = Instant::now();
        let start = if run_on_start {
            now
        } else {
            now.checked_add(period).unwrap_or_else(|| {
                warn!(schedule = name, period_secs = period.as_secs(), "period too long; first run deferred indefinitely");
                now + FAR_FUTURE
            })
        };
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                job().await;
            }
        });

        info!(schedule = name, period_secs = period.as_secs(), run_on_start, "scheduled");
        entries.insert(
            name.to_string(),
            Entry {
                info: ScheduleInfo {
                    name: name.to_string(),
                    period_secs: period.as_secs(),
                    run_on_start,
                },
                handle,
            },
        );
        Registration::Scheduled
    }

    /// Stop and forget `name`. Returns false when it was not scheduled.
    pub fn unschedule(&self, name: &str) -> bool {
        match self.lock().remove(name) {
            Some(entry) => {
                entry.handle.abort();
                info!(schedule = name, "unscheduled");
                true
            }
            None => false,
        }
    }

    pub fn is_scheduled(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    /// Registered schedules in name order.
    pub fn list(&self) -> Vec<ScheduleInfo> {
        self.lock().values().map(|e| e.info.clone()).collect()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for ScheduleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduleRegistry")
            .field("schedules", &self.list())
            .finish()
    }
}
