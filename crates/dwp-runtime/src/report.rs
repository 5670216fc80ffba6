use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use dwp_config::FailurePolicy;

/// What a pass did with one order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderAction {
    /// Moved from pending to processing.
    Promoted,
    /// Metadata parsed, delivery outside the window.
    NotDue,
    /// No longer pending, metadata absent, or no representable instant.
    Skipped,
    /// A store read or the transition failed.
    Failed,
}

impl OrderAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderAction::Promoted => "promoted",
            OrderAction::NotDue => "not_due",
            OrderAction::Skipped => "skipped",
            OrderAction::Failed => "failed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderOutcome {
    pub order_id: String,
    pub action: OrderAction,
    /// Machine-readable detail, e.g. `within_window`, `not_pending`.
    pub reason: String,
    /// Local wall-clock delivery instant, `%Y-%m-%d %H:%M:%S`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_secs: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of one pass. Counters always add up to `inspected`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    pub pass_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub failure_policy: FailurePolicy,
    pub inspected: usize,
    pub promoted: usize,
    pub not_due: usize,
    pub skipped: usize,
    pub failed: usize,
    /// True when `FailurePolicy::Abort` stopped the pass early.
    pub aborted: bool,
    pub outcomes: Vec<OrderOutcome>,
}

impl PassReport {
    pub(crate) fn begin(started_at: DateTime<Utc>, failure_policy: FailurePolicy) -> Self {
        Self {
            pass_id: Uuid::new_v4(),
            started_at,
            finished_at: started_at,
            failure_policy,
            inspected: 0,
            promoted: 0,
            not_due: 0,
            skipped: 0,
            failed: 0,
            aborted: false,
            outcomes: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, outcome: OrderOutcome) {
        self.inspected += 1;
        match outcome.action {
            OrderAction::Promoted => self.promoted += 1,
            OrderAction::NotDue => self.not_due += 1,
            OrderAction::Skipped => self.skipped += 1,
            OrderAction::Failed => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }

    pub fn outcome_for(&self, order_id: &str) -> Option<&OrderOutcome> {
        self.outcomes.iter().find(|o| o.order_id == order_id)
    }

    pub fn promoted_ids(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.action == OrderAction::Promoted)
            .map(|o| o.order_id.as_str())
            .collect()
    }
}
