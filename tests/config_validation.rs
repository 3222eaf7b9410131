//! Integration tests for configuration validation

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use courier_protocol::config::{
    ClientConfig, CodecConfig, LoggingConfig, ProtocolConfig, MAX_FRAME_SIZE,
};
use courier_protocol::{PacketCodec, ProtocolError};
use std::collections::HashMap;
use std::time::Duration;
use tracing::Level;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_default_config_validates() {
    let config = ProtocolConfig::default();
    let errors = config.validate();
    assert!(
        errors.is_empty(),
        "Default config should be valid, but got errors: {:?}",
        errors
    );
    assert_eq!(config.codec.max_frame_size, MAX_FRAME_SIZE);
}

#[test]
fn test_zero_frame_size() {
    let config = ProtocolConfig::default_with_overrides(|c| c.codec.max_frame_size = 0);
    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("cannot be 0")));
}

#[test]
fn test_frame_size_bounds() {
    let small = CodecConfig {
        max_frame_size: 512,
    };
    assert!(small
        .validate()
        .iter()
        .any(|e| e.contains("too small")));

    let large = CodecConfig {
        max_frame_size: u32::MAX as usize + 1,
    };
    assert!(large
        .validate()
        .iter()
        .any(|e| e.contains("too large")));

    let ok = CodecConfig { max_frame_size: 1024 };
    assert!(ok.validate().is_empty());
}

#[test]
fn test_invalid_client_address() {
    let mut config = ProtocolConfig::default();
    config.client.address = "invalid_address".to_string();

    let errors = config.validate();
    assert!(!errors.is_empty(), "Should have validation errors");
    assert!(errors.iter().any(|e| e.contains("Invalid client address")));
}

#[test]
fn test_empty_client_fields() {
    let config = ClientConfig {
        address: String::new(),
        client_id: String::new(),
        ..ClientConfig::default()
    };
    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("address cannot be empty")));
    assert!(errors.iter().any(|e| e.contains("id cannot be empty")));
}

#[test]
fn test_dial_timeout_bounds() {
    let short = ClientConfig {
        dial_timeout: Duration::from_millis(50),
        ..ClientConfig::default()
    };
    assert!(short.validate().iter().any(|e| e.contains("too short")));

    let long = ClientConfig {
        dial_timeout: Duration::from_secs(301),
        ..ClientConfig::default()
    };
    assert!(long.validate().iter().any(|e| e.contains("too long")));
}

#[test]
fn test_logging_requires_an_output() {
    let config = LoggingConfig {
        log_to_console: false,
        log_to_file: false,
        ..LoggingConfig::default()
    };
    assert!(config
        .validate()
        .iter()
        .any(|e| e.contains("At least one logging output")));

    let missing_path = LoggingConfig {
        log_to_file: true,
        log_file_path: None,
        ..LoggingConfig::default()
    };
    assert!(missing_path
        .validate()
        .iter()
        .any(|e| e.contains("log_file_path must be specified")));
}

#[test]
fn test_validate_strict_collects_all_errors() {
    let config = ProtocolConfig::default_with_overrides(|c| {
        c.codec.max_frame_size = 0;
        c.client.client_id.clear();
    });
    match config.validate_strict() {
        Err(ProtocolError::ConfigError(msg)) => {
            assert!(msg.contains("cannot be 0"));
            assert!(msg.contains("Client id"));
        }
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn test_toml_roundtrip() {
    let config = ProtocolConfig::default_with_overrides(|c| {
        c.client.address = "10.0.0.5:9000".to_string();
        c.client.dial_timeout = Duration::from_millis(2500);
        c.codec.max_frame_size = 64 * 1024;
        c.logging.log_level = Level::DEBUG;
    });

    let text = toml::to_string_pretty(&config).expect("serialize");
    let parsed = ProtocolConfig::from_toml(&text).expect("parse");
    assert_eq!(parsed.client.address, "10.0.0.5:9000");
    assert_eq!(parsed.client.dial_timeout, Duration::from_millis(2500));
    assert_eq!(parsed.codec.max_frame_size, 64 * 1024);
    assert_eq!(parsed.logging.log_level, Level::DEBUG);
}

#[test]
fn test_partial_toml_uses_defaults() {
    let parsed = ProtocolConfig::from_toml(
        r#"
        [codec]
        max_frame_size = 4096
        "#,
    )
    .expect("parse");
    assert_eq!(parsed.codec.max_frame_size, 4096);
    assert_eq!(parsed.client.address, ClientConfig::default().address);
}

#[test]
fn test_example_config_parses() {
    let text = ProtocolConfig::example_config();
    let parsed = ProtocolConfig::from_toml(&text).expect("example config should parse");
    assert!(parsed.validate().is_empty());
}

#[test]
fn test_file_roundtrip() {
    let path = std::env::temp_dir().join(format!("courier-config-{}.toml", std::process::id()));
    let config = ProtocolConfig::default_with_overrides(|c| c.client.client_name = "bob".into());
    config.save_to_file(&path).expect("save");

    let loaded = ProtocolConfig::from_file(&path).expect("load");
    assert_eq!(loaded.client.client_name, "bob");
    let _ = std::fs::remove_file(path);
}

#[test]
fn test_missing_file() {
    let err = ProtocolConfig::from_file("/nonexistent/courier.toml").unwrap_err();
    assert!(matches!(err, ProtocolError::ConfigError(_)));
}

#[test]
fn test_env_overrides() {
    let mut config = ProtocolConfig::default();
    config
        .apply_env(env(&[
            ("COURIER_CLIENT_ADDRESS", "192.168.1.2:7000"),
            ("COURIER_DIAL_TIMEOUT_MS", "750"),
            ("COURIER_MAX_FRAME_SIZE", "65536"),
            ("COURIER_LOG_LEVEL", "warn"),
        ]))
        .expect("apply env");

    assert_eq!(config.client.address, "192.168.1.2:7000");
    assert_eq!(config.client.dial_timeout, Duration::from_millis(750));
    assert_eq!(config.codec.max_frame_size, 65536);
    assert_eq!(config.logging.log_level, Level::WARN);
    assert_eq!(PacketCodec::from_config(&config.codec).max_frame_size(), 65536);
}

#[test]
fn test_env_rejects_garbage() {
    let mut config = ProtocolConfig::default();
    let err = config
        .apply_env(env(&[("COURIER_DIAL_TIMEOUT_MS", "soon")]))
        .unwrap_err();
    assert!(matches!(err, ProtocolError::ConfigError(ref msg) if msg.contains("COURIER_DIAL_TIMEOUT_MS")));

    let err = config
        .apply_env(env(&[("COURIER_LOG_LEVEL", "loud")]))
        .unwrap_err();
    assert!(matches!(err, ProtocolError::ConfigError(ref msg) if msg.contains("COURIER_LOG_LEVEL")));
}
