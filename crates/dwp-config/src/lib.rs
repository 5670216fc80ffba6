//! dwp-config
//!
//! Layered YAML configuration for the delivery-window promoter.
//!
//! - Documents merge in order: earlier docs are the base, later docs override.
//! - The merged tree is hashed (SHA-256 over canonical JSON) so every pass
//!   report and daemon status can say exactly which config produced it.
//! - Literal secrets are refused; configs name env vars instead.
//! - Typed settings are extracted with defaults by [`PromoterConfig::from_json`].

use anyhow::{bail, Context, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;

mod consumption;
mod settings;

pub use consumption::{consumed_pointers_for_mode, report_unused_keys, ConfigMode, UnusedKeyPolicy, UnusedKeyReport};
pub use settings::{
    DaemonSection, FailurePolicy, PassSection, PromoterConfig, ScheduleSection, WindowSection,
    DEFAULT_SCHEDULE_NAME, MAX_INTERVAL_SECS,
};

/// Leaf string values starting with any of these are treated as pasted secrets.
const SECRET_PREFIXES: &[&str] = &[
    "sk-",        // OpenAI style
    "sk_live",    // Stripe live
    "sk_test",    // Stripe test
    "ck_",        // WooCommerce REST consumer key
    "cs_",        // WooCommerce REST consumer secret
    "AKIA",       // AWS access key ID
    "-----BEGIN", // PEM private keys
    "ghp_",       // GitHub PAT
    "xoxb-",      // Slack bot token
];

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

impl LoadedConfig {
    /// Typed view of the merged tree.
    pub fn settings(&self) -> Result<PromoterConfig> {
        PromoterConfig::from_json(&self.config_json)
    }
}

/// Read and merge YAML files in the given order.
pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let docs = paths
        .iter()
        .map(|p| fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}")))
        .collect::<Result<Vec<String>>>()?;

    let doc_refs: Vec<&str> = docs.iter().map(String::as_str).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = serde_json::json!({});
    for (idx, raw) in yaml_docs.iter().enumerate() {
        let v_yaml: serde_yaml::Value =
            serde_yaml::from_str(raw).with_context(|| format!("invalid yaml (layer {idx})"))?;
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        // An empty document parses as null; treat it as an empty layer.
        if v_json.is_null() {
            continue;
        }
        merged = deep_merge(merged, v_json);
    }

    enforce_no_secret_literals(&merged)?;

    // serde_json's default Map is a BTreeMap, so serialisation is key-sorted
    // and independent of the key order in the source YAML.
    let canonical_json = serde_json::to_string(&merged).context("canonical json serialize failed")?;
    let config_hash = sha256_hex(canonical_json.as_bytes());
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

/// Built-in defaults only (no files). Hash is still computed.
pub fn load_defaults() -> Result<LoadedConfig> {
    load_layered_yaml_from_strings(&[])
}

fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (k, v) in overlay_map {
                let prev = base_map.remove(&k).unwrap_or(Value::Null);
                base_map.insert(k, deep_merge(prev, v));
            }
            Value::Object(base_map)
        }
        (_, other) => other,
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn enforce_no_secret_literals(v: &Value) -> Result<()> {
    let mut leaves = Vec::new();
    consumption::collect_leaf_pointers(v, "", &mut leaves);

    for ptr in leaves {
        let Some(s) = v.pointer(&ptr).and_then(Value::as_str) else {
            continue;
        };
        if looks_like_secret(s) {
            bail!("CONFIG_SECRET_DETECTED leaf={} value=REDACTED", ptr);
        }
    }
    Ok(())
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim();
    t.len() >= 8 && SECRET_PREFIXES.iter().any(|p| t.starts_with(p))
}
