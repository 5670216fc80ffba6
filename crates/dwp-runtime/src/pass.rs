//! A single promotion pass.
//!
//! Per order, in listing order:
//! 1. read the status once; anything but `pending` is skipped
//! 2. read both metadata fields and log them
//! 3. evaluate the window and log the computed instant
//! 4. move to `processing` when due
//!
//! A failed read or transition is contained to its order under
//! [`FailurePolicy::Isolate`] and ends the pass under [`FailurePolicy::Abort`].
//! Only a failed listing fails the pass as a whole.

use std::time::Instant;

use anyhow::Result;
use chrono::{DateTime, TimeDelta, Utc};
use tracing::{info, warn};

use dwp_config::{FailurePolicy, PromoterConfig};
use dwp_orders::{OrderId, OrderSource, OrderStatus, OrderStoreError, StatusChange, StatusUpdater};
use dwp_window::{DeliveryZone, WindowDecision, WindowPolicy, WindowReason};

use crate::report::{OrderAction, OrderOutcome, PassReport};

const DELIVERY_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub struct PassSettings {
    pub zone: DeliveryZone,
    pub policy: WindowPolicy,
    pub failure_policy: FailurePolicy,
}

impl Default for PassSettings {
    fn default() -> Self {
        Self {
            zone: DeliveryZone::Local,
            policy: WindowPolicy::default(),
            failure_policy: FailurePolicy::Isolate,
        }
    }
}

impl PassSettings {
    /// Reads `/window` and `/pass`.
    pub fn from_config(cfg: &PromoterConfig) -> Result<Self> {
        Ok(Self {
            zone: cfg.zone()?,
            policy: cfg.window_policy(),
            failure_policy: cfg.pass.failure_policy,
        })
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassError {
    /// The pending listing could not be fetched; no order was touched.
    Listing(OrderStoreError),
}

impl std::fmt::Display for PassError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PassError::Listing(e) => write!(f, "PASS_LISTING_FAILED: {e}"),
        }
    }
}

impl std::error::Error for PassError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PassError::Listing(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Pass
// ---------------------------------------------------------------------------

/// Run one pass at instant `now`.
pub fn run_pass<S, U>(
    source: &S,
    updater: &U,
    settings: &PassSettings,
    now: DateTime<Utc>,
) -> Result<PassReport, PassError>
where
    S: OrderSource + ?Sized,
    U: StatusUpdater + ?Sized,
{
    let started = Instant::now();
    let mut report = PassReport::begin(now, settings.failure_policy);

    let ids = source.list_pending_order_ids().map_err(PassError::Listing)?;

    for id in ids {
        match process_order(source, updater, settings, now, &id) {
            Ok(outcome) => report.record(outcome),
            Err(e) => {
                warn!(order_id = %id, error = %e, policy = settings.failure_policy.as_str(), "order failed");
                report.record(OrderOutcome {
                    order_id: id.to_string(),
                    action: OrderAction::Failed,
                    reason: "store_error".to_string(),
                    delivery_at: None,
                    diff_secs: None,
                    error: Some(e.to_string()),
                });
                if settings.failure_policy == FailurePolicy::Abort {
                    report.aborted = true;
                    break;
                }
            }
        }
    }

    report.finished_at =
        now + TimeDelta::from_std(started.elapsed()).unwrap_or_else(|_| TimeDelta::zero());
    Ok(report)
}

fn process_order<S, U>(
    source: &S,
    updater: &U,
    settings: &PassSettings,
    now: DateTime<Utc>,
    id: &OrderId,
) -> Result<OrderOutcome, OrderStoreError>
where
    S: OrderSource + ?Sized,
    U: StatusUpdater + ?Sized,
{
    // The listing may be stale by the time we get here.
    let status = source.order_status(id)?;
    if !status.is_pending() {
        return Ok(outcome(id, OrderAction::Skipped, "not_pending", None));
    }

    let delivery_date = source.delivery_date(id)?;
    let time_slot = source.time_slot(id)?;
    info!(
        order_id = %id,
        delivery_date = delivery_date.as_deref().unwrap_or(""),
        time_slot = time_slot.as_deref().unwrap_or(""),
        "order delivery metadata"
    );

    let decision = settings.zone.evaluate(
        now,
        delivery_date.as_deref(),
        time_slot.as_deref(),
        &settings.policy,
    );
    if let Some(at) = decision.delivery_at {
        info!(
            order_id = %id,
            delivery_at = %at.format(DELIVERY_AT_FORMAT),
            diff_secs = decision.diff_secs.unwrap_or_default(),
            due = decision.due,
            "calculated delivery date"
        );
    }

    let action = match decision.reason {
        WindowReason::WithinWindow => OrderAction::Promoted,
        WindowReason::OutsideWindow => OrderAction::NotDue,
        WindowReason::MissingDeliveryDate
        | WindowReason::MissingTimeSlot
        | WindowReason::UnrepresentableInstant => OrderAction::Skipped,
    };
    if action != OrderAction::Promoted {
        return Ok(outcome(id, action, decision.reason.as_str(), Some(&decision)));
    }

    match updater.set_order_status(id, OrderStatus::Processing)? {
        StatusChange::Applied { from } => {
            info!(order_id = %id, from = %from, to = "processing", "order promoted");
            Ok(outcome(id, OrderAction::Promoted, decision.reason.as_str(), Some(&decision)))
        }
        // Someone else moved it between our read and our write.
        StatusChange::Unchanged => Ok(outcome(
            id,
            OrderAction::Skipped,
            "already_processing",
            Some(&decision),
        )),
    }
}

fn outcome(
    id: &OrderId,
    action: OrderAction,
    reason: &str,
    decision: Option<&WindowDecision>,
) -> OrderOutcome {
    OrderOutcome {
        order_id: id.to_string(),
        action,
        reason: reason.to_string(),
        delivery_at: decision
            .and_then(|d| d.delivery_at)
            .map(|at| at.format(DELIVERY_AT_FORMAT).to_string()),
        diff_secs: decision.and_then(|d| d.diff_secs),
        error: None,
    }
}
