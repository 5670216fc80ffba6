//! Unused-key guard.
//!
//! Every entry point declares the JSON-pointer prefixes it actually reads.
//! Any leaf of the merged config not under one of those prefixes is reported
//! as unused: usually a typo (`windw:`) or a key left over from an older
//! deployment. Callers choose whether that is a warning or a hard error.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigMode {
    /// Long-running scheduler + HTTP surface.
    Daemon,
    /// One-shot CLI commands (`evaluate`, `run-once`).
    Cli,
}

impl ConfigMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigMode::Daemon => "DAEMON",
            ConfigMode::Cli => "CLI",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    pub mode: String,
    /// Consumed prefixes used for this analysis (sorted, unique).
    pub consumed_prefixes: Vec<String>,
    /// Unused leaf pointers (sorted).
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Prefixes read by each mode. Must track what the code reads today.
///
/// - dwp-runtime::PassSettings::from_config: /window, /pass
/// - dwp-daemon main + ScheduleRegistry:     /schedule, /daemon
pub fn consumed_pointers_for_mode(mode: ConfigMode) -> &'static [&'static str] {
    match mode {
        ConfigMode::Daemon => &["/schedule", "/window", "/pass", "/daemon"],
        // The CLI never schedules and never binds a socket.
        ConfigMode::Cli => &["/window", "/pass"],
    }
}

/// Produce an unused-key report for `mode`.
///
/// `Fail` turns a non-clean report into an error; `Warn` always returns it.
pub fn report_unused_keys(
    mode: ConfigMode,
    config_json: &Value,
    policy: UnusedKeyPolicy,
) -> Result<UnusedKeyReport> {
    let consumed: BTreeSet<String> = consumed_pointers_for_mode(mode)
        .iter()
        .map(|p| normalize_pointer(p))
        .collect();

    let mut leaves = Vec::new();
    collect_leaf_pointers(config_json, "", &mut leaves);

    let unused: BTreeSet<String> = leaves
        .into_iter()
        .filter(|leaf| !consumed.iter().any(|c| is_prefix_pointer(c, leaf)))
        .collect();

    let report = UnusedKeyReport {
        mode: mode.as_str().to_string(),
        consumed_prefixes: consumed.into_iter().collect(),
        unused_leaf_pointers: unused.into_iter().collect(),
    };

    if policy == UnusedKeyPolicy::Fail && !report.is_clean() {
        bail!(
            "CONFIG_UNUSED_KEYS (mode={}): {} unused config leaf key(s) detected. \
            Remove them or update the consumed registry. First few: {:?}",
            report.mode,
            report.unused_leaf_pointers.len(),
            report.unused_leaf_pointers.iter().take(12).collect::<Vec<_>>()
        );
    }

    Ok(report)
}

fn normalize_pointer(p: &str) -> String {
    let t = p.trim().trim_end_matches('/');
    if t.is_empty() {
        "/".to_string()
    } else if t.starts_with('/') {
        t.to_string()
    } else {
        format!("/{t}")
    }
}

/// "/a/b" consumes "/a/b" and "/a/b/c" but NOT "/a/bc". "/" consumes everything.
fn is_prefix_pointer(prefix: &str, leaf: &str) -> bool {
    if prefix == "/" || leaf == prefix {
        return true;
    }
    leaf.strip_prefix(prefix)
        .map(|rest| rest.starts_with('/'))
        .unwrap_or(false)
}

pub(crate) fn collect_leaf_pointers(v: &Value, prefix: &str, out: &mut Vec<String>) {
    match v {
        Value::Object(map) => {
            for (k, vv) in map {
                let token = k.replace('~', "~0").replace('/', "~1");
                collect_leaf_pointers(vv, &format!("{prefix}/{token}"), out);
            }
        }
        Value::Array(arr) => {
            for (i, vv) in arr.iter().enumerate() {
                collect_leaf_pointers(vv, &format!("{prefix}/{i}"), out);
            }
        }
        _ if prefix.is_empty() => out.push("/".to_string()),
        _ => out.push(prefix.to_string()),
    }
}
