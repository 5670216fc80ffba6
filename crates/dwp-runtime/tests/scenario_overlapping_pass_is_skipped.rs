//! Scenario: re-entrancy guard
//!
//! GREEN when:
//! - a pass requested while another holds the guard is skipped
//! - a skipped pass reads nothing and writes nothing
//! - the guard is released after a pass, so the next one runs

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use dwp_orders::{
    InMemoryOrderStore, OrderId, OrderRecord, OrderSource, OrderStatus, OrderStoreError,
    StatusChange, StatusUpdater,
};
use dwp_runtime::{PassOutcome, PassSettings, PromotionRunner};

/// Listing blocks until the test releases it.
struct GatedStore {
    inner: InMemoryOrderStore,
    entered: std::sync::Mutex<Option<mpsc::Sender<()>>>,
    release: std::sync::Mutex<mpsc::Receiver<()>>,
}

impl OrderSource for GatedStore {
    fn list_pending_order_ids(&self) -> Result<Vec<OrderId>, OrderStoreError> {
        if let Some(tx) = self.entered.lock().unwrap().take() {
            tx.send(()).unwrap();
            self.release.lock().unwrap().recv().unwrap();
        }
        self.inner.list_pending_order_ids()
    }
    fn order_status(&self, id: &OrderId) -> Result<OrderStatus, OrderStoreError> {
        self.inner.order_status(id)
    }
    fn delivery_date(&self, id: &OrderId) -> Result<Option<String>, OrderStoreError> {
        self.inner.delivery_date(id)
    }
    fn time_slot(&self, id: &OrderId) -> Result<Option<String>, OrderStoreError> {
        self.inner.time_slot(id)
    }
}

impl StatusUpdater for GatedStore {
    fn set_order_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<StatusChange, OrderStoreError> {
        self.inner.set_order_status(id, status)
    }
}

#[test]
fn held_guard_skips_the_pass() {
    let store = Arc::new(InMemoryOrderStore::with_orders([OrderRecord::pending(
        1u64,
        Some("lundi 01 janvier 2024"),
        Some("00:00 - 00:30"),
    )]));
    store.fail_listing(true);
    let runner = PromotionRunner::new(store.clone(), PassSettings::default());

    let permit = runner.guard().try_acquire().unwrap();
    // Listing would fail if it were called; a skip never gets that far.
    assert_eq!(runner.run_once().unwrap(), PassOutcome::SkippedOverlap);
    drop(permit);

    assert!(runner.run_once().is_err(), "guard released, listing reached");
    assert!(!runner.is_running(), "guard released after a failed pass too");
}

#[test]
fn concurrent_pass_is_skipped_while_first_is_in_flight() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let store = Arc::new(GatedStore {
        inner: InMemoryOrderStore::new(),
        entered: std::sync::Mutex::new(Some(entered_tx)),
        release: std::sync::Mutex::new(release_rx),
    });
    let runner = Arc::new(PromotionRunner::new(store, PassSettings::default()));

    let first = {
        let runner = runner.clone();
        thread::spawn(move || runner.run_once())
    };
    entered_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("first pass reached the listing");

    assert!(runner.is_running());
    assert_eq!(runner.run_once().unwrap(), PassOutcome::SkippedOverlap);

    release_tx.send(()).unwrap();
    let outcome = first.join().unwrap().unwrap();
    assert!(matches!(outcome, PassOutcome::Completed(_)));
    assert!(!runner.is_running());
}
