#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use tally_exporter::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
server:
  port: 9100
retention:
  windw_secs: 7200 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.class().as_str(), "CONFIGURATION");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.server.port, 9100);
    assert_eq!(cfg.socket_addr().unwrap().to_string(), "0.0.0.0:9100");

    let sweep = cfg.sweep_config();
    assert_eq!(sweep.interval, Duration::from_secs(600));
    assert_eq!(sweep.retention, Duration::from_secs(3600));
}

#[test]
fn unsupported_version_is_rejected() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert!(matches!(err, tally_core::TallyError::UnsupportedVersion));
}

#[test]
fn sweep_interval_must_fit_in_window() {
    let bad = r#"
version: 1
retention:
  window_secs: 120
  sweep_interval_secs: 600
"#;
    assert!(config::load_from_str(bad).is_err());
}

#[test]
fn port_override() {
    let mut cfg = config::load_from_str("version: 1\n").unwrap();
    config::apply_port_override(&mut cfg, None).unwrap();
    assert_eq!(cfg.server.port, 9100);

    config::apply_port_override(&mut cfg, Some("9200")).unwrap();
    assert_eq!(cfg.server.port, 9200);

    assert!(config::apply_port_override(&mut cfg, Some("not-a-port")).is_err());
    assert!(config::apply_port_override(&mut cfg, Some("0")).is_err());
}

#[test]
fn custom_server_name() {
    let cfg = config::load_from_str(
        r#"
version: 1
server:
  server_name: "bot-metrics/2.1"
"#,
    )
    .unwrap();
    assert_eq!(cfg.server_name(), "bot-metrics/2.1");
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let cfg = config::load_or_default("/nonexistent/tally.yaml").unwrap();
    assert_eq!(cfg.server.port, 9100);
}

#[test]
fn process_metrics_default_on_and_can_be_disabled() {
    let cfg = config::load_from_str("version: 1\n").unwrap();
    assert!(cfg.export.process_metrics);

    let cfg = config::load_from_str("version: 1\nexport:\n  process_metrics: false\n").unwrap();
    assert!(!cfg.export.process_metrics);
}
