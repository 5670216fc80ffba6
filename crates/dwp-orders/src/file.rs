//! JSON order file store.
//!
//! File format: a JSON array of [`OrderRecord`]:
//!
//! ```text
//! [
//!   { "id": 1042, "status": "pending",
//!     "delivery_date": "mardi 14 mars 2024", "time_slot": "09:00 - 09:30" }
//! ]
//! ```
//!
//! The whole file is rewritten (temp file + rename) after every effective
//! transition. Only the `status` of orders whose status changed is touched:
//! entry order, id form, status spelling and unknown fields are written back
//! as they were read. Reads are served from memory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, warn};

use crate::memory::{InMemoryOrderStore, StatusTransition};
use crate::store::{OrderSource, OrderStoreError, StatusChange, StatusUpdater};
use crate::types::{OrderId, OrderRecord, OrderStatus};

#[derive(Debug)]
pub struct JsonFileOrderStore {
    path: PathBuf,
    orders: InMemoryOrderStore,
    /// File entries as last read or written.
    entries: Mutex<Vec<Value>>,
    /// When false, transitions stay in memory and the file is never written.
    persist: bool,
}

impl JsonFileOrderStore {
    /// Load `path`. The file must exist and hold a JSON array of orders.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("read order file: {}", path.display()))?;
        let entries: Vec<Value> = serde_json::from_str(&raw)
            .with_context(|| format!("parse order file json: {}", path.display()))?;
        let records = entries
            .iter()
            .enumerate()
            .map(|(idx, v)| {
                serde_json::from_value::<OrderRecord>(v.clone())
                    .with_context(|| format!("parse order #{idx} in {}", path.display()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            path,
            orders: InMemoryOrderStore::with_orders(records),
            entries: Mutex::new(entries),
            persist: true,
        })
    }

    /// Same as [`open`](Self::open) but never writes back (dry runs).
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        let mut store = Self::open(path)?;
        store.persist = false;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> Vec<OrderRecord> {
        self.orders.records()
    }

    /// Effective transitions since open, oldest first.
    pub fn transitions(&self) -> Vec<StatusTransition> {
        self.orders.transitions()
    }

    fn write_back(&self) -> Result<()> {
        let mut entries = self.lock_entries();
        let mut next = entries.clone();
        for entry in next.iter_mut() {
            let Some(obj) = entry.as_object_mut() else {
                continue;
            };
            let Some(id) = obj
                .get("id")
                .and_then(|v| serde_json::from_value::<OrderId>(v.clone()).ok())
            else {
                continue;
            };
            let Some(current) = self.orders.get(&id).map(|r| r.status) else {
                continue;
            };
            let on_disk = obj
                .get("status")
                .and_then(Value::as_str)
                .map(OrderStatus::parse);
            if on_disk.as_ref() != Some(&current) {
                obj.insert("status".to_string(), Value::String(current.as_str().to_string()));
            }
        }

        let body = serde_json::to_string_pretty(&next).context("serialize order file")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body).with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replace order file: {}", self.path.display()))?;
        *entries = next;
        debug!(path = %self.path.display(), "order file rewritten");
        Ok(())
    }

    fn lock_entries(&self) -> MutexGuard<'_, Vec<Value>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl OrderSource for JsonFileOrderStore {
    fn list_pending_order_ids(&self) -> Result<Vec<OrderId>, OrderStoreError> {
        self.orders.list_pending_order_ids()
    }

    fn order_status(&self, id: &OrderId) -> Result<OrderStatus, OrderStoreError> {
        self.orders.order_status(id)
    }

    fn delivery_date(&self, id: &OrderId) -> Result<Option<String>, OrderStoreError> {
        self.orders.delivery_date(id)
    }

    fn time_slot(&self, id: &OrderId) -> Result<Option<String>, OrderStoreError> {
        self.orders.time_slot(id)
    }
}

impl StatusUpdater for JsonFileOrderStore {
    fn set_order_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<StatusChange, OrderStoreError> {
        let change = self.orders.set_order_status(id, status)?;
        if let StatusChange::Applied { from } = &change {
            if self.persist {
                if let Err(e) = self.write_back() {
                    // Keep memory and file in agreement.
                    if let Err(restore) = self.orders.restore_status(id, from.clone()) {
                        warn!(order_id = %id, error = %restore, "status restore after failed write failed");
                    }
                    return Err(OrderStoreError::Backend(format!("{e:#}")));
                }
            }
        }
        Ok(change)
    }
}
