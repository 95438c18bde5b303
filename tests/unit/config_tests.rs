// Configuration loading through the public API

use hoverscan::config::{Config, ConfigError};
use hoverscan::logging::LogFormat;
use std::io::Write;
use std::time::Duration;

#[test]
fn test_sample_config_file_loads() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
backend:
  base_url: "http://127.0.0.1:8000"
  analyze_path: "/analyze_hover"
  health_paths: ["/health"]
  request_timeout_secs: 20
  page_origin: "https://shop.example"
cache:
  capacity: 50
  ttl_secs: 300
  failure_ttl_secs: 15
hover:
  debounce_ms: 250
  cooldown_secs: 60
  min_target_px: 80
  max_ancestor_depth: 3
  consent: true
logging:
  format: pretty
"#
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();

    assert_eq!(config.backend.analyze_url(), "http://127.0.0.1:8000/analyze_hover");
    assert_eq!(config.backend.health_paths, vec!["/health".to_string()]);
    assert_eq!(config.backend.request_timeout(), Duration::from_secs(20));
    assert_eq!(config.cache.capacity, 50);
    assert_eq!(config.cache.failure_ttl(), Some(Duration::from_secs(15)));
    assert_eq!(config.hover.debounce(), Duration::from_millis(250));
    assert_eq!(config.hover.cooldown(), Duration::from_secs(60));
    assert_eq!(config.hover.max_ancestor_depth, 3);
    assert!(config.hover.consent);
    assert_eq!(config.logging.format, LogFormat::Pretty);
}

#[test]
fn test_default_config_is_valid() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.backend.analyze_url(), "http://127.0.0.1:8000/analyze");
    assert_eq!(config.cache.ttl(), Duration::from_secs(600));
}

#[test]
fn test_negative_min_target_is_rejected() {
    let err = Config::from_yaml_with_env("hover:\n  min_target_px: -5\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    assert!(err.to_string().contains("min_target_px"));
}

#[test]
fn test_unknown_log_format_is_parse_error() {
    let err = Config::from_yaml_with_env("logging:\n  format: xml\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}
