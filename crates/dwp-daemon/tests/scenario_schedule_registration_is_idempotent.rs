//! Scenario: schedule registration
//!
//! GREEN when:
//! - registering the same name twice spawns one job, not two
//! - run_on_start fires immediately, then once per period
//! - without run_on_start the first run waits a full period
//! - unschedule stops the job

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dwp_daemon::schedule::{Registration, ScheduleRegistry};

const HOUR: Duration = Duration::from_secs(3_600);

fn counting_job(counter: &Arc<AtomicUsize>) -> impl Fn() -> std::future::Ready<()> + Send + Sync + 'static {
    let counter = Arc::clone(counter);
    move || {
        counter.fetch_add(1, Ordering::SeqCst);
        std::future::ready(())
    }
}

#[tokio::test(start_paused = true)]
async fn duplicate_registration_is_a_noop() {
    let reg = ScheduleRegistry::new();
    let runs = Arc::new(AtomicUsize::new(0));

    assert_eq!(
        reg.register("auto_update_order_status", HOUR, true, counting_job(&runs)),
        Registration::Scheduled
    );
    assert_eq!(
        reg.register("auto_update_order_status", HOUR, true, counting_job(&runs)),
        Registration::AlreadyScheduled
    );
    assert_eq!(reg.list().len(), 1);

    // Ticks at 0h, 1h, 2h.
    tokio::time::sleep(HOUR * 2 + Duration::from_secs(1)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn deferred_start_waits_one_period() {
    let reg = ScheduleRegistry::new();
    let runs = Arc::new(AtomicUsize::new(0));
    reg.register("deferred", HOUR, false, counting_job(&runs));

    tokio::time::sleep(HOUR - Duration::from_secs(1)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn unschedule_stops_the_job_and_frees_the_name() {
    let reg = ScheduleRegistry::new();
    let runs = Arc::new(AtomicUsize::new(0));
    reg.register("job", HOUR, true, counting_job(&runs));
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    assert!(reg.unschedule("job"));
    assert!(!reg.is_scheduled("job"));
    assert!(!reg.unschedule("job"));

    tokio::time::sleep(HOUR * 3).await;
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    assert_eq!(
        reg.register("job", HOUR, true, counting_job(&runs)),
        Registration::Scheduled
    );
}
