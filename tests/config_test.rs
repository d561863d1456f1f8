//! Configuration file loading

use openapi_bridge::config::{BridgeConfig, ConfirmationTiming};
use openapi_bridge::error::BridgeError;
use openapi_bridge::registry::RegistrarOptions;
use openapi_bridge::utils::NameFormat;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_load_from_yaml_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("openapi-bridge.yaml");
    fs::write(
        &config_path,
        r#"
api_key_header: X-Api-Key
confirm_dangerous_actions: false
confirmation_timing: before_request
request_timeout_secs: 15
tags: [pets, store]
tool_name_format: snake
version: "1.4.0"
logging:
  level: debug
  format: json
"#,
    )
    .unwrap();

    let config = BridgeConfig::load(&config_path).unwrap();

    assert_eq!(config.api_key_header.as_deref(), Some("X-Api-Key"));
    assert!(!config.confirm_dangerous_actions);
    assert_eq!(config.confirmation_timing, ConfirmationTiming::BeforeRequest);
    assert_eq!(config.request_timeout(), Some(Duration::from_secs(15)));
    assert_eq!(config.tool_name_format, Some(NameFormat::Snake));
    assert!(config.logging.is_json());

    let options = RegistrarOptions::from_config(&config);
    assert_eq!(options.tags, vec!["pets", "store"]);
    assert_eq!(options.tool_name("getPetById"), "get_pet_by_id");
    assert_eq!(options.version.as_deref(), Some("1.4.0"));
    assert!(!options.confirm_dangerous_actions);
}

#[test]
fn test_missing_file_yields_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config = BridgeConfig::load(temp_dir.path().join("absent.yaml")).unwrap();

    assert!(config.confirm_dangerous_actions);
    assert!(config.tags.is_empty());
    assert_eq!(config.confirmation_timing, ConfirmationTiming::AfterResponse);
}

#[test]
fn test_invalid_files_are_config_errors() {
    let temp_dir = TempDir::new().unwrap();

    let malformed = temp_dir.path().join("malformed.yaml");
    fs::write(&malformed, "tags: [unterminated").unwrap();
    assert!(matches!(BridgeConfig::load(&malformed), Err(BridgeError::Config { .. })));

    let bad_timeout = temp_dir.path().join("timeout.yaml");
    fs::write(&bad_timeout, "request_timeout_secs: 0\n").unwrap();
    assert!(matches!(BridgeConfig::load(&bad_timeout), Err(BridgeError::Config { .. })));

    let bad_format = temp_dir.path().join("format.yaml");
    fs::write(&bad_format, "tool_name_format: kebab\n").unwrap();
    assert!(BridgeConfig::load(&bad_format).is_err());
}
