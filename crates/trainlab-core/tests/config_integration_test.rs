//! Configuration files and environment overrides.

use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;
use trainlab_core::config::{ENV_GRACE_PERIOD_MS, ENV_STORE_LATENCY_MS};
use trainlab_core::{ConfigError, ErrorKind, Workbench, WorkbenchConfig, WorkbenchError};

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_from_file() {
    let file = config_file(
        r"
seed_sample_data = false

[store]
latency_ms = 300

[simulation]
tick_interval_ms = 100
seed = 42
",
    );
    let config = WorkbenchConfig::load_from_file(file.path()).unwrap();
    assert!(!config.seed_sample_data);
    assert_eq!(config.store_latency(), Duration::from_millis(300));
    assert_eq!(config.simulation.seed, Some(42));

    let settings = config.simulation_settings();
    assert_eq!(settings.tick_interval, Duration::from_millis(100));
    assert_eq!(settings.grace_period, Duration::from_millis(1000));
}

#[test]
fn test_env_overrides_file_values() {
    let file = config_file("[store]\nlatency_ms = 300\n");
    let mut config = WorkbenchConfig::load_from_file(file.path()).unwrap();
    config
        .apply_env_overrides(|key| match key {
            k if k == ENV_STORE_LATENCY_MS => Some("0".to_string()),
            k if k == ENV_GRACE_PERIOD_MS => Some("250".to_string()),
            _ => None,
        })
        .unwrap();
    assert_eq!(config.store.latency_ms, 0);
    assert_eq!(config.simulation.grace_period_ms, 250);
}

#[test]
fn test_malformed_file_is_parse_error() {
    let file = config_file("[simulation]\ntick_interval_ms = \"fast\"\n");
    let err = WorkbenchConfig::load_from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
}

#[test]
fn test_invalid_settings_rejected_by_workbench() {
    let mut config = WorkbenchConfig::default();
    config.simulation.history_len = 0;
    let err = Workbench::new(config).err().unwrap();
    assert!(matches!(err, WorkbenchError::Config(ConfigError::InvalidValue(_))));
    assert_eq!(err.kind(), ErrorKind::Config);
}
