//! Configuration system tests.

use std::path::PathBuf;
use std::time::Duration;

use mssqlprobe_lib::core::config::LogLevel;
use mssqlprobe_lib::core::{Config, ConfigBuilder};
use mssqlprobe_lib::storage::FileStateStore;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.connection.initial_database, "master");
    assert_eq!(config.connection.connect_timeout, Duration::from_secs(30));
    assert_eq!(config.connection.default_port, 1433);
    assert!(config.connection.trust_server_certificate);
    assert_eq!(config.state.dir, std::env::temp_dir());
    assert_eq!(config.logging.level, LogLevel::Warn);
}

#[test]
fn test_config_builder() {
    let config = ConfigBuilder::new()
        .state_dir(PathBuf::from("/srv/nagios/state"))
        .connect_timeout(Duration::from_secs(3))
        .log_level(LogLevel::Error)
        .debug(true)
        .build()
        .unwrap();

    assert_eq!(config.state.dir, PathBuf::from("/srv/nagios/state"));
    assert_eq!(config.connection.connect_timeout.as_secs(), 3);
    assert_eq!(config.logging.level, LogLevel::Error);
    assert!(config.debug);
}

#[test]
fn test_yaml_config() {
    let yaml = r#"
connection:
  initial_database: monitoring
  connect_timeout: 1m
  default_port: 14330
state:
  dir: /var/lib/mssqlprobe
  file_prefix: probe-
logging:
  level: info
  structured: true
"#;

    let config = ConfigBuilder::new()
        .from_yaml(yaml)
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(config.connection.initial_database, "monitoring");
    assert_eq!(config.connection.connect_timeout.as_secs(), 60);
    assert_eq!(config.connection.default_port, 14330);
    assert_eq!(config.state.file_prefix, "probe-");
    assert_eq!(config.logging.level, LogLevel::Info);
    assert!(config.logging.structured);
}

#[test]
fn test_cli_overrides_file() {
    let config = ConfigBuilder::new()
        .from_yaml("state:\n  dir: /from/file\n")
        .unwrap()
        .state_dir(PathBuf::from("/from/cli"))
        .build()
        .unwrap();

    assert_eq!(config.state.dir, PathBuf::from("/from/cli"));
}

#[test]
fn test_config_validation() {
    assert!(Config::default().validate().is_ok());

    let result = ConfigBuilder::new().connect_timeout(Duration::ZERO).build();
    assert!(result.is_err());

    let result = ConfigBuilder::new()
        .from_yaml("connection:\n  default_port: 0\n")
        .unwrap()
        .build();
    assert!(result.is_err());

    let result = ConfigBuilder::new()
        .from_yaml("connection:\n  initial_database: \"  \"\n")
        .unwrap()
        .build();
    assert!(result.is_err());
}

#[test]
fn test_error_handling() {
    let result = ConfigBuilder::new().from_yaml("invalid: yaml: content: [");
    assert!(result.is_err());

    let result = ConfigBuilder::new().from_yaml(
        r#"
connection:
  connect_timeout: "soon"
"#,
    );
    assert!(result.is_err());

    let result = ConfigBuilder::new().from_yaml("logging:\n  level: loud\n");
    assert!(result.is_err());
}

#[test]
fn test_state_store_follows_config() {
    let config = ConfigBuilder::new()
        .from_yaml("state:\n  dir: /tmp/probe-state\n  file_prefix: x-\n")
        .unwrap()
        .build()
        .unwrap();

    let store = FileStateStore::from_config(&config.state);
    let key = mssqlprobe_lib::storage::SampleKey::derive("h", "d", "q");
    let path = store.path_for(&key);

    assert!(path.starts_with("/tmp/probe-state"));
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("x-"));
    assert!(name.ends_with(".state"));
}
