//! `dwp run-once`: one pass over a JSON order file.

use std::sync::Arc;

use anyhow::{Context, Result};
use dwp_orders::JsonFileOrderStore;
use dwp_runtime::{FixedClock, PassOutcome, PassSettings, PromotionRunner};

use super::{load_settings, opt, parse_now};

pub struct RunOnceArgs {
    pub orders: String,
    pub now: Option<String>,
    pub dry_run: bool,
    pub json: bool,
    pub config_paths: Vec<String>,
}

pub fn run(args: RunOnceArgs) -> Result<()> {
    let (loaded, cfg) = load_settings(&args.config_paths)?;
    let settings = PassSettings::from_config(&cfg)?;
    let now = parse_now(args.now.as_deref())?;

    let store = if args.dry_run {
        JsonFileOrderStore::open_read_only(&args.orders)?
    } else {
        JsonFileOrderStore::open(&args.orders)?
    };

    let runner =
        PromotionRunner::with_clock(Arc::new(store), settings, Arc::new(FixedClock::new(now)));
    let report = match runner.run_once().context("run-once pass failed")? {
        PassOutcome::Completed(report) => report,
        // A fresh runner owns its guard; nothing else can hold it.
        PassOutcome::SkippedOverlap => anyhow::bail!("PASS_ALREADY_RUNNING"),
    };

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("serialize pass report")?
        );
        return Ok(());
    }

    println!("pass_id={}", report.pass_id);
    println!("config_hash={}", loaded.config_hash);
    println!("dry_run={}", args.dry_run);
    println!("inspected={}", report.inspected);
    println!("promoted={}", report.promoted);
    println!("not_due={}", report.not_due);
    println!("skipped={}", report.skipped);
    println!("failed={}", report.failed);
    println!("aborted={}", report.aborted);
    for o in &report.outcomes {
        println!(
            "order={} action={} reason={} delivery_at={} diff_secs={}",
            o.order_id,
            o.action.as_str(),
            o.reason,
            opt(o.delivery_at.as_deref()),
            opt(o.diff_secs),
        );
    }
    Ok(())
}
