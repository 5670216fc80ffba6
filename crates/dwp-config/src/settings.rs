//! Typed settings extracted from the merged config tree.
//!
//! ```yaml
//! schedule:
//!   name: auto_update_order_status
//!   interval_secs: 3600
//!   run_on_start: true
//! window:
//!   window_secs: 86400
//!   fallback_slot: "01:00 - 01:30"
//!   timezone: local            # or an IANA name, e.g. Europe/Paris
//! pass:
//!   failure_policy: isolate    # isolate | abort
//! daemon:
//!   addr: 127.0.0.1:8898
//!   cors_origins: ["http://localhost", "http://127.0.0.1"]
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use dwp_window::{DeliveryZone, WindowPolicy, ASAP_FALLBACK_SLOT, DEFAULT_WINDOW_SECS};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_SCHEDULE_NAME: &str = "auto_update_order_status";

/// Longest accepted schedule period (365 days).
pub const MAX_INTERVAL_SECS: u64 = 365 * 86_400;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromoterConfig {
    pub schedule: ScheduleSection,
    pub window: WindowSection,
    pub pass: PassSection,
    pub daemon: DaemonSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSection {
    /// Registration key; re-registering the same name is a no-op.
    pub name: String,
    pub interval_secs: u64,
    /// Run one pass immediately at startup instead of waiting a full period.
    pub run_on_start: bool,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            name: DEFAULT_SCHEDULE_NAME.to_string(),
            interval_secs: 3_600,
            run_on_start: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSection {
    pub window_secs: i64,
    pub fallback_slot: String,
    pub timezone: String,
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            window_secs: DEFAULT_WINDOW_SECS,
            fallback_slot: ASAP_FALLBACK_SLOT.to_string(),
            timezone: "local".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassSection {
    pub failure_policy: FailurePolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonSection {
    pub addr: String,
    /// Browser origins allowed by CORS. Empty means no cross-origin access.
    pub cors_origins: Vec<String>,
}

impl Default for DaemonSection {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8898".to_string(),
            cors_origins: vec![
                "http://localhost".to_string(),
                "http://127.0.0.1".to_string(),
            ],
        }
    }
}

/// What a pass does when one order's read or transition fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the failure, count it, continue with the next order.
    #[default]
    Isolate,
    /// Stop the pass at the first failing order.
    Abort,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::Isolate => "isolate",
            FailurePolicy::Abort => "abort",
        }
    }
}

impl PromoterConfig {
    /// Deserialize with defaults for every missing key, then validate.
    pub fn from_json(v: &Value) -> Result<Self> {
        let cfg: PromoterConfig =
            serde_json::from_value(v.clone()).context("CONFIG_INVALID: settings shape")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.schedule.name.trim().is_empty() {
            bail!("CONFIG_INVALID: schedule.name must not be empty");
        }
        if self.schedule.interval_secs == 0 {
            bail!("CONFIG_INVALID: schedule.interval_secs must be > 0");
        }
        if self.schedule.interval_secs > MAX_INTERVAL_SECS {
            bail!(
                "CONFIG_INVALID: schedule.interval_secs must be <= {MAX_INTERVAL_SECS} (got {})",
                self.schedule.interval_secs
            );
        }
        if self.window.window_secs <= 0 {
            bail!(
                "CONFIG_INVALID: window.window_secs must be > 0 (got {})",
                self.window.window_secs
            );
        }
        if self.window.fallback_slot.trim().is_empty() {
            bail!("CONFIG_INVALID: window.fallback_slot must not be empty");
        }
        self.zone()?;
        Ok(())
    }

    pub fn zone(&self) -> Result<DeliveryZone> {
        self.window
            .timezone
            .parse::<DeliveryZone>()
            .context("CONFIG_INVALID: window.timezone")
    }

    pub fn window_policy(&self) -> WindowPolicy {
        WindowPolicy::new(self.window.window_secs, self.window.fallback_slot.clone())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.schedule.interval_secs)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.daemon
            .addr
            .parse()
            .with_context(|| format!("CONFIG_INVALID: daemon.addr '{}'", self.daemon.addr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tree_yields_defaults() {
        let cfg = PromoterConfig::from_json(&serde_json::json!({})).unwrap();
        assert_eq!(cfg, PromoterConfig::default());
        assert_eq!(cfg.interval(), Duration::from_secs(3_600));
        assert_eq!(cfg.window_policy(), WindowPolicy::default());
        assert_eq!(cfg.zone().unwrap(), DeliveryZone::Local);
        assert_eq!(cfg.pass.failure_policy, FailurePolicy::Isolate);
    }

    #[test]
    fn cors_origins_default_to_plain_localhost_and_can_be_replaced() {
        let cfg = PromoterConfig::default();
        assert_eq!(
            cfg.daemon.cors_origins,
            vec!["http://localhost".to_string(), "http://127.0.0.1".to_string()]
        );

        let cfg = PromoterConfig::from_json(&serde_json::json!({
            "daemon": {"cors_origins": ["https://ops.example.fr"]}
        }))
        .unwrap();
        assert_eq!(cfg.daemon.cors_origins, vec!["https://ops.example.fr".to_string()]);
        assert_eq!(cfg.daemon.addr, "127.0.0.1:8898");
    }

    #[test]
    fn abort_policy_parses() {
        let cfg =
            PromoterConfig::from_json(&serde_json::json!({"pass": {"failure_policy": "abort"}}))
                .unwrap();
        assert_eq!(cfg.pass.failure_policy, FailurePolicy::Abort);
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let err =
            PromoterConfig::from_json(&serde_json::json!({"pass": {"failure_policy": "retry"}}))
                .unwrap_err();
        assert!(format!("{err:#}").contains("CONFIG_INVALID"));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err =
            PromoterConfig::from_json(&serde_json::json!({"schedule": {"interval_secs": 0}}))
                .unwrap_err();
        assert!(err.to_string().contains("interval_secs"));
    }

    #[test]
    fn interval_longer_than_a_year_is_rejected() {
        let err = PromoterConfig::from_json(&serde_json::json!({
            "schedule": {"interval_secs": u64::MAX, "run_on_start": false}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("CONFIG_INVALID: schedule.interval_secs"));

        let at_limit = PromoterConfig::from_json(
            &serde_json::json!({"schedule": {"interval_secs": MAX_INTERVAL_SECS}}),
        )
        .unwrap();
        assert_eq!(at_limit.interval(), Duration::from_secs(MAX_INTERVAL_SECS));
    }

    #[test]
    fn bad_timezone_is_rejected() {
        let err =
            PromoterConfig::from_json(&serde_json::json!({"window": {"timezone": "Paris"}}))
                .unwrap_err();
        assert!(format!("{err:#}").contains("window.timezone"));
    }
}
