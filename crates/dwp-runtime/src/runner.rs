use std::sync::Arc;

use tracing::{info, warn};

use dwp_orders::OrderStore;

use crate::clock::{Clock, SystemClock};
use crate::guard::PassGuard;
use crate::pass::{run_pass, PassError, PassSettings};
use crate::report::PassReport;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PassOutcome {
    Completed(PassReport),
    /// Another pass held the guard; nothing was read or written.
    SkippedOverlap,
}

/// Owns everything a scheduled pass needs.
pub struct PromotionRunner {
    store: Arc<dyn OrderStore>,
    settings: PassSettings,
    clock: Arc<dyn Clock>,
    guard: PassGuard,
}

impl PromotionRunner {
    pub fn new(store: Arc<dyn OrderStore>, settings: PassSettings) -> Self {
        Self::with_clock(store, settings, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn OrderStore>,
        settings: PassSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            settings,
            clock,
            guard: PassGuard::new(),
        }
    }

    pub fn settings(&self) -> &PassSettings {
        &self.settings
    }

    pub fn guard(&self) -> &PassGuard {
        &self.guard
    }

    pub fn is_running(&self) -> bool {
        self.guard.is_running()
    }

    /// Run one pass unless one is already in flight.
    pub fn run_once(&self) -> Result<PassOutcome, PassError> {
        let Some(_permit) = self.guard.try_acquire() else {
            warn!("pass already running; skipping");
            return Ok(PassOutcome::SkippedOverlap);
        };

        let now = self.clock.now();
        let report = run_pass(&*self.store, &*self.store, &self.settings, now)?;
        info!(
            pass_id = %report.pass_id,
            inspected = report.inspected,
            promoted = report.promoted,
            not_due = report.not_due,
            skipped = report.skipped,
            failed = report.failed,
            aborted = report.aborted,
            "pass complete"
        );
        Ok(PassOutcome::Completed(report))
    }
}

impl std::fmt::Debug for PromotionRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromotionRunner")
            .field("settings", &self.settings)
            .field("running", &self.guard.is_running())
            .finish_non_exhaustive()
    }
}
