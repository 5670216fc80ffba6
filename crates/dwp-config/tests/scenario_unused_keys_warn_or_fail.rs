//! Scenario: unused config keys
//!
//! GREEN when:
//! - WARN reports unused keys without failing
//! - FAIL errors with CONFIG_UNUSED_KEYS
//! - daemon-only sections are unused for the CLI
//! - unused pointers come back sorted

use dwp_config::{load_layered_yaml_from_strings, report_unused_keys, ConfigMode, UnusedKeyPolicy};

#[test]
fn warn_mode_reports_typos_without_error() {
    let yaml = r#"
window:
  window_secs: 86400
windw:
  timezone: Europe/Paris
"#;
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
    let report =
        report_unused_keys(ConfigMode::Daemon, &loaded.config_json, UnusedKeyPolicy::Warn)
            .expect("warn mode must not error");

    assert!(!report.is_clean());
    assert_eq!(report.unused_leaf_pointers, vec!["/windw/timezone".to_string()]);
}

#[test]
fn fail_mode_errors_on_unused_keys() {
    let yaml = "extra:\n  foo: 1\n";
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
    let err = report_unused_keys(ConfigMode::Daemon, &loaded.config_json, UnusedKeyPolicy::Fail)
        .unwrap_err();
    assert!(format!("{err:?}").contains("CONFIG_UNUSED_KEYS"));
}

#[test]
fn daemon_sections_are_unused_for_cli() {
    let yaml = r#"
schedule:
  interval_secs: 3600
daemon:
  addr: 0.0.0.0:8898
pass:
  failure_policy: abort
"#;
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();

    let daemon =
        report_unused_keys(ConfigMode::Daemon, &loaded.config_json, UnusedKeyPolicy::Fail).unwrap();
    assert!(daemon.is_clean());

    let cli =
        report_unused_keys(ConfigMode::Cli, &loaded.config_json, UnusedKeyPolicy::Warn).unwrap();
    assert_eq!(
        cli.unused_leaf_pointers,
        vec!["/daemon/addr".to_string(), "/schedule/interval_secs".to_string()]
    );
}

#[test]
fn unused_pointer_ordering_is_deterministic() {
    let yaml = "zzz:\n  b: 2\n  a: 1\n";
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
    let report =
        report_unused_keys(ConfigMode::Cli, &loaded.config_json, UnusedKeyPolicy::Warn).unwrap();
    assert_eq!(
        report.unused_leaf_pointers,
        vec!["/zzz/a".to_string(), "/zzz/b".to_string()]
    );
}
