//! Loading configuration from files and environment.

use harpia_daq::config::{ConfigError, HarpiaConfig};
use harpia_daq::tracing_setup::{OutputFormat, TracingConfig};
use serial_test::serial;
use std::fs;
use tempfile::TempDir;
use tracing::Level;

fn write_config(contents: &str) -> (TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("harpia.toml");
    fs::write(&path, contents).unwrap();
    (dir, path)
}

#[test]
#[serial]
fn test_load_from_file() {
    let (_dir, path) = write_config(
        r#"
[application]
name = "ta-scan"
log_level = "debug"
log_format = "json"

[instrument]
base_url = "http://192.168.10.4:20050/v1/"
timeout_ms = 15000

[notifier]
enabled = true
bot_token = "123:abc"
chat_id = "-1001"
"#,
    );

    let config = HarpiaConfig::load_from(&path).unwrap();
    assert_eq!(config.application.name, "ta-scan");
    assert_eq!(config.instrument.base_url, "http://192.168.10.4:20050/v1/");
    assert_eq!(config.instrument.timeout_ms, Some(15000));
    assert!(config.notifier.enabled);
    assert_eq!(config.notifier.api_url, "https://api.telegram.org");

    let tracing = TracingConfig::from_config(&config).unwrap();
    assert_eq!(tracing.level, Level::DEBUG);
    assert_eq!(tracing.format, OutputFormat::Json);
}

#[test]
#[serial]
fn test_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = HarpiaConfig::load_from(dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, HarpiaConfig::default());
}

#[test]
#[serial]
fn test_partial_file_keeps_other_defaults() {
    let (_dir, path) = write_config("[instrument]\nbase_url = \"http://lab:1/v1/\"\n");
    let config = HarpiaConfig::load_from(&path).unwrap();
    assert_eq!(config.instrument.base_url, "http://lab:1/v1/");
    assert_eq!(config.application.log_level, "info");
    assert!(!config.notifier.enabled);
}

#[test]
#[serial]
fn test_malformed_file_is_load_error() {
    let (_dir, path) = write_config("[instrument\nbase_url = ");
    let err = HarpiaConfig::load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::LoadError(_)));
}

#[test]
#[serial]
fn test_invalid_values_fail_validation() {
    let (_dir, path) = write_config("[notifier]\nenabled = true\n");
    let err = HarpiaConfig::load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)));
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    let (_dir, path) = write_config("[instrument]\nbase_url = \"http://from-file:1/v1/\"\n");

    std::env::set_var("HARPIA_INSTRUMENT__BASE_URL", "http://from-env:2/v1/");
    std::env::set_var("HARPIA_APPLICATION__LOG_LEVEL", "warn");
    let result = HarpiaConfig::load_from(&path);
    std::env::remove_var("HARPIA_INSTRUMENT__BASE_URL");
    std::env::remove_var("HARPIA_APPLICATION__LOG_LEVEL");

    let config = result.unwrap();
    assert_eq!(config.instrument.base_url, "http://from-env:2/v1/");
    assert_eq!(config.application.log_level, "warn");
}

#[test]
#[serial]
fn test_numeric_chat_id_from_environment() {
    let dir = tempfile::tempdir().unwrap();
    let absent = dir.path().join("absent.toml");

    std::env::set_var("HARPIA_NOTIFIER__CHAT_ID", "987654321");
    let private_chat = HarpiaConfig::load_from(&absent);
    std::env::set_var("HARPIA_NOTIFIER__CHAT_ID", "-1001234");
    let group_chat = HarpiaConfig::load_from(&absent);
    std::env::remove_var("HARPIA_NOTIFIER__CHAT_ID");

    assert_eq!(private_chat.unwrap().notifier.chat_id, "987654321");
    assert_eq!(group_chat.unwrap().notifier.chat_id, "-1001234");
}

#[test]
#[serial]
fn test_numeric_chat_id_in_file() {
    let (_dir, path) = write_config(
        "[notifier]\nenabled = true\nbot_token = \"123:abc\"\nchat_id = 987654321\n",
    );
    let config = HarpiaConfig::load_from(&path).unwrap();
    assert_eq!(config.notifier.chat_id, "987654321");
}
