//! `dwp evaluate`: dry evaluation of one date/slot pair.

use anyhow::{Context, Result};
use dwp_window::DeliveryZone;

use super::{load_settings, opt, parse_now};

pub struct EvaluateArgs {
    pub date: Option<String>,
    pub slot: Option<String>,
    pub now: Option<String>,
    pub timezone: Option<String>,
    pub config_paths: Vec<String>,
}

pub fn run(args: EvaluateArgs) -> Result<()> {
    let (_, cfg) = load_settings(&args.config_paths)?;
    let zone: DeliveryZone = match &args.timezone {
        Some(tz) => tz
            .parse()
            .with_context(|| format!("invalid --timezone '{tz}'"))?,
        None => cfg.zone()?,
    };
    let now = parse_now(args.now.as_deref())?;

    let decision = zone.evaluate(
        now,
        args.date.as_deref(),
        args.slot.as_deref(),
        &cfg.window_policy(),
    );

    println!("timezone={}", zone);
    println!("now={}", now.to_rfc3339());
    println!("due={}", decision.due);
    println!("reason={}", decision.reason);
    println!(
        "delivery_at={}",
        opt(decision.delivery_at.map(|at| at.format("%Y-%m-%d %H:%M:%S")))
    );
    println!("delivery_ts={}", opt(decision.delivery_ts));
    println!("diff_secs={}", opt(decision.diff_secs));
    Ok(())
}
