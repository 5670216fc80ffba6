//! Command handler modules for dwp-cli.
//!
//! Shared utilities used by multiple command paths live here.
//! Command-specific logic lives in the submodules.

pub mod evaluate;
pub mod run_once;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use dwp_config::{report_unused_keys, ConfigMode, LoadedConfig, PromoterConfig, UnusedKeyPolicy};
use tracing::warn;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Load layered config (defaults only when no paths are given) and warn
/// about keys the CLI never reads.
pub fn load_settings(config_paths: &[String]) -> Result<(LoadedConfig, PromoterConfig)> {
    let loaded = if config_paths.is_empty() {
        dwp_config::load_defaults()?
    } else {
        let path_refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
        dwp_config::load_layered_yaml(&path_refs)?
    };

    let report = report_unused_keys(ConfigMode::Cli, &loaded.config_json, UnusedKeyPolicy::Warn)?;
    if !report.is_clean() {
        warn!(unused = ?report.unused_leaf_pointers, "unused config keys");
    }

    let cfg = loaded.settings()?;
    Ok((loaded, cfg))
}

/// Parse an RFC 3339 `--now`, or take the wall clock.
pub fn parse_now(now: Option<&str>) -> Result<DateTime<Utc>> {
    match now {
        Some(raw) => Ok(DateTime::parse_from_rfc3339(raw.trim())
            .with_context(|| format!("invalid --now '{raw}': expected RFC 3339"))?
            .with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}

pub fn opt<T: std::fmt::Display>(v: Option<T>) -> String {
    v.map(|x| x.to_string()).unwrap_or_else(|| "NULL".to_string())
}
