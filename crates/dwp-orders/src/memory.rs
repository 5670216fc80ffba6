//! Deterministic in-memory order store.
//!
//! Behaviour:
//! - Listings and snapshots come back in insertion order (file order for
//!   [`crate::JsonFileOrderStore`]), not id order.
//! - Writing the status an order already has is a no-op and is not recorded.
//! - Every effective write is appended to a transition log for assertions.
//! - Faults can be armed per order id (read or update) and for the listing
//!   call, so pass-level isolation can be exercised without a real backend.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use crate::store::{OrderSource, OrderStoreError, StatusChange, StatusUpdater};
use crate::types::{OrderId, OrderRecord, OrderStatus};

/// Which call on an order should fail.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum FaultPoint {
    /// `order_status`, `delivery_date`, `time_slot`.
    Read,
    /// `set_order_status`.
    Update,
}

/// One effective status write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusTransition {
    pub order_id: OrderId,
    pub from: OrderStatus,
    pub to: OrderStatus,
}

#[derive(Debug, Default)]
struct Inner {
    orders: BTreeMap<OrderId, OrderRecord>,
    /// Ids in first-insertion order.
    order: Vec<OrderId>,
    transitions: Vec<StatusTransition>,
    faults: BTreeMap<OrderId, BTreeSet<FaultPoint>>,
    fail_listing: bool,
}

#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    inner: Mutex<Inner>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_orders<I: IntoIterator<Item = OrderRecord>>(orders: I) -> Self {
        let store = Self::new();
        for r in orders {
            store.insert(r);
        }
        store
    }

    /// Insert or replace an order.
    pub fn insert(&self, record: OrderRecord) {
        let mut g = self.lock();
        let id = record.id.clone();
        if g.orders.insert(id.clone(), record).is_none() {
            g.order.push(id);
        }
    }

    pub fn get(&self, id: &OrderId) -> Option<OrderRecord> {
        self.lock().orders.get(id).cloned()
    }

    /// Snapshot of all orders in insertion order.
    pub fn records(&self) -> Vec<OrderRecord> {
        let g = self.lock();
        let records: Vec<OrderRecord> = g.in_order().cloned().collect();
        records
    }

    pub fn transitions(&self) -> Vec<StatusTransition> {
        self.lock().transitions.clone()
    }

    /// Number of effective transitions recorded for `id`.
    pub fn transition_count(&self, id: &OrderId) -> usize {
        self.lock()
            .transitions
            .iter()
            .filter(|t| &t.order_id == id)
            .count()
    }

    /// Make the given call fail for `id` until cleared.
    pub fn inject_fault(&self, id: impl Into<OrderId>, point: FaultPoint) {
        self.lock()
            .faults
            .entry(id.into())
            .or_default()
            .insert(point);
    }

    pub fn clear_faults(&self) {
        let mut g = self.lock();
        g.faults.clear();
        g.fail_listing = false;
    }

    pub fn fail_listing(&self, fail: bool) {
        self.lock().fail_listing = fail;
    }

    /// Undo a transition whose write-back failed: put `status` back and drop
    /// the transition's log entry.
    pub(crate) fn restore_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<(), OrderStoreError> {
        let mut g = self.lock();
        let rec = g
            .orders
            .get_mut(id)
            .ok_or_else(|| OrderStoreError::UnknownOrder(id.clone()))?;
        rec.status = status;
        if let Some(pos) = g.transitions.iter().rposition(|t| &t.order_id == id) {
            g.transitions.remove(pos);
        }
        Ok(())
    }

    // A panicking caller cannot leave the map half-written: every mutation
    // is a single insert/push, so a poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Inner {
    fn in_order(&self) -> impl Iterator<Item = &OrderRecord> {
        self.order.iter().filter_map(|id| self.orders.get(id))
    }

    fn check_fault(&self, id: &OrderId, point: FaultPoint) -> Result<(), OrderStoreError> {
        let armed = self
            .faults
            .get(id)
            .map(|set| set.contains(&point))
            .unwrap_or(false);
        if !armed {
            return Ok(());
        }
        match point {
            FaultPoint::Read => Err(OrderStoreError::Backend(format!(
                "injected read fault for order {id}"
            ))),
            FaultPoint::Update => Err(OrderStoreError::Rejected {
                order_id: id.clone(),
                reason: "injected update fault".to_string(),
            }),
        }
    }

    fn record(&self, id: &OrderId) -> Result<&OrderRecord, OrderStoreError> {
        self.check_fault(id, FaultPoint::Read)?;
        self.orders
            .get(id)
            .ok_or_else(|| OrderStoreError::UnknownOrder(id.clone()))
    }
}

impl OrderSource for InMemoryOrderStore {
    fn list_pending_order_ids(&self) -> Result<Vec<OrderId>, OrderStoreError> {
        let g = self.lock();
        if g.fail_listing {
            return Err(OrderStoreError::Backend(
                "injected listing fault".to_string(),
            ));
        }
        let ids = g
            .in_order()
            .filter(|r| r.status.is_pending())
            .map(|r| r.id.clone())
            .collect();
        Ok(ids)
    }

    fn order_status(&self, id: &OrderId) -> Result<OrderStatus, OrderStoreError> {
        Ok(self.lock().record(id)?.status.clone())
    }

    fn delivery_date(&self, id: &OrderId) -> Result<Option<String>, OrderStoreError> {
        Ok(self.lock().record(id)?.delivery_date.clone())
    }

    fn time_slot(&self, id: &OrderId) -> Result<Option<String>, OrderStoreError> {
        Ok(self.lock().record(id)?.time_slot.clone())
    }
}

impl StatusUpdater for InMemoryOrderStore {
    fn set_order_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<StatusChange, OrderStoreError> {
        let mut g = self.lock();
        g.check_fault(id, FaultPoint::Update)?;

        let rec = g
            .orders
            .get_mut(id)
            .ok_or_else(|| OrderStoreError::UnknownOrder(id.clone()))?;
        if rec.status == status {
            return Ok(StatusChange::Unchanged);
        }

        let from = std::mem::replace(&mut rec.status, status.clone());
        g.transitions.push(StatusTransition {
            order_id: id.clone(),
            from: from.clone(),
            to: status,
        });
        Ok(StatusChange::Applied { from })
    }
}
