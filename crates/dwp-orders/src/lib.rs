//! dwp-orders
//!
//! Order model and the narrow interfaces the promoter consumes from the host
//! commerce platform. The platform owns orders; this crate only describes how
//! to list pending ones, read their delivery metadata and request a status
//! transition.
//!
//! Two stores ship here:
//! - [`InMemoryOrderStore`]: deterministic BTreeMap store with fault injection,
//!   used by tests and as the backing map of the file store.
//! - [`JsonFileOrderStore`]: JSON order file, rewritten after each transition,
//!   for running the daemon and CLI without a live platform.

mod file;
mod memory;
mod store;
mod types;

pub use file::JsonFileOrderStore;
pub use memory::{FaultPoint, InMemoryOrderStore, StatusTransition};
pub use store::{OrderSource, OrderStore, OrderStoreError, StatusChange, StatusUpdater};
pub use types::{OrderId, OrderRecord, OrderStatus};
