use std::path::PathBuf;

use prefbridge::config::{Config, ConfigError};
use prefbridge::LocationContext;
use tempfile::TempDir;

/// Test that Config::default() produces the expected values.
#[test]
fn test_config_default_values() {
    let config = Config::default();

    assert_eq!(config.layout.app_folder, "PrefBridge");
    assert_eq!(config.layout.host_id, "com.example.host");
    assert_eq!(config.layout.module_id, "com.example.module");
    assert!(config.layout.list_keys.is_empty());
    assert_eq!(config.paths.preferences_name, "settings");
    assert!(config.watch.enabled);
    assert_eq!(config.watch.debounce_ms, 200);
    assert!(config.validate().is_ok());
}

/// Test that Config::config_path() returns a path ending with the expected filename.
#[test]
fn test_config_path_ends_with_expected() {
    let path = Config::config_path();
    assert!(path.ends_with("prefbridge/config.toml"));
}

#[test]
fn test_load_from_partial_file_fills_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[layout]
host_id = "org.host"
module_id = "org.module"
list_keys = ["hidden_chats", "blocked_users"]

[paths]
host_data_dir = "/data/user/0/org.host"
external_storage_root = "/sdcard"
"#,
    )
    .unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.layout.app_folder, "PrefBridge");
    assert_eq!(config.layout.list_keys.len(), 2);
    assert_eq!(config.paths.preferences_name, "settings");
    assert_eq!(config.watch.debounce_ms, 200);

    let location = config.location();
    assert_eq!(
        location.host_data_dir().unwrap(),
        PathBuf::from("/data/user/0/org.host")
    );
    assert_eq!(
        location.external_storage_root().unwrap(),
        PathBuf::from("/sdcard")
    );
}

#[test]
fn test_default_host_dir_uses_host_id() {
    let config = Config::default();
    assert_eq!(
        config.location().host_data_dir().unwrap(),
        PathBuf::from("/data/data/com.example.host")
    );
}

#[test]
fn test_load_from_missing_file_is_read_error() {
    let temp_dir = TempDir::new().unwrap();
    let result = Config::load_from(&temp_dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ConfigError::ReadError { .. })));
}

#[test]
fn test_load_from_invalid_toml_is_parse_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "invalid { toml }").unwrap();

    let result = Config::load_from(&path);
    assert!(matches!(result, Err(ConfigError::ParseError { .. })));
}

#[test]
fn test_validation_fails_same_host_and_module() {
    let mut config = Config::default();
    config.layout.module_id = config.layout.host_id.clone();

    match config.validate().unwrap_err() {
        ConfigError::ValidationError { message } => {
            assert!(message.contains("must differ"));
        }
        _ => panic!("Expected ValidationError"),
    }
}

#[test]
fn test_validation_fails_list_key_with_space() {
    let mut config = Config::default();
    config.layout.list_keys = vec!["ok".to_string(), "not ok".to_string()];

    match config.validate().unwrap_err() {
        ConfigError::ValidationError { message } => {
            assert!(message.contains("not ok"));
        }
        _ => panic!("Expected ValidationError"),
    }
}

#[test]
fn test_validation_fails_nested_app_folder() {
    let mut config = Config::default();
    config.layout.app_folder = "a/b".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.layout.host_id = "  ".to_string();
    assert!(config.validate().is_err());
}
