//! Consumed interfaces of the host order platform.
//!
//! Both traits are synchronous: a pass is a plain sequential loop and the
//! async daemon moves it onto the blocking pool. Implementations own their
//! own atomicity; the promoter never retries.

use crate::types::{OrderId, OrderStatus};

// ---------------------------------------------------------------------------
// OrderStoreError
// ---------------------------------------------------------------------------

/// Failure reported by an order store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderStoreError {
    /// The id is not known to the store.
    UnknownOrder(OrderId),
    /// The platform refused the transition.
    Rejected { order_id: OrderId, reason: String },
    /// IO / transport / storage failure.
    Backend(String),
}

impl std::fmt::Display for OrderStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStoreError::UnknownOrder(id) => write!(f, "ORDER_UNKNOWN: {id}"),
            OrderStoreError::Rejected { order_id, reason } => {
                write!(f, "ORDER_TRANSITION_REJECTED: {order_id}: {reason}")
            }
            OrderStoreError::Backend(msg) => write!(f, "ORDER_STORE_BACKEND: {msg}"),
        }
    }
}

impl std::error::Error for OrderStoreError {}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Read side of the platform.
pub trait OrderSource: Send + Sync {
    /// All orders currently `pending`. Unordered; may be empty.
    fn list_pending_order_ids(&self) -> Result<Vec<OrderId>, OrderStoreError>;

    fn order_status(&self, id: &OrderId) -> Result<OrderStatus, OrderStoreError>;

    /// Raw delivery-date metadata, `None` when the order has none.
    fn delivery_date(&self, id: &OrderId) -> Result<Option<String>, OrderStoreError>;

    /// Raw time-slot metadata, `None` when the order has none.
    fn time_slot(&self, id: &OrderId) -> Result<Option<String>, OrderStoreError>;
}

/// Outcome of a status write that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusChange {
    Applied { from: OrderStatus },
    /// The order already had the requested status; nothing was written.
    Unchanged,
}

/// Write side of the platform.
///
/// # Contract
/// Setting a status the order already has MUST be a no-op returning
/// [`StatusChange::Unchanged`].
pub trait StatusUpdater: Send + Sync {
    fn set_order_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<StatusChange, OrderStoreError>;
}

/// Convenience bound for stores that implement both sides.
pub trait OrderStore: OrderSource + StatusUpdater {}

impl<T: OrderSource + StatusUpdater> OrderStore for T {}
