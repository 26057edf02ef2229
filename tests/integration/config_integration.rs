//! Integration tests for layered configuration loading

use meshforge::config::{global_config_path, ConfigLoader};
use meshforge::provider::ProviderId;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

use crate::integration::with_xdg_env;

#[test]
fn test_global_config_file_is_loaded_from_xdg_home() {
    let temp_dir = TempDir::new().unwrap();
    with_xdg_env(&temp_dir, || {
        let config_dir = temp_dir.path().join("config").join("meshforge");
        fs::create_dir_all(&config_dir).unwrap();
        let config_path = config_dir.join("config.toml");
        fs::write(
            &config_path,
            r#"
active_provider = "tripo"

[providers.tripo]
api_key = "tsk_global"
poll_interval_ms = 2000

[batch]
delay_ms = 1500
"#,
        )
        .unwrap();

        assert_eq!(global_config_path().unwrap(), config_path);

        let config = ConfigLoader::load(None).unwrap();
        assert_eq!(config.active_provider().unwrap(), Some(ProviderId::Tripo));
        assert_eq!(config.batch.delay(), Duration::from_millis(1500));
        assert!(config.credentials().is_configured(ProviderId::Tripo));
        assert!(!config.credentials().is_configured(ProviderId::Meshy));

        let registry = config.build_registry().unwrap();
        assert_eq!(
            registry.schedule_for(ProviderId::Tripo).interval,
            Duration::from_millis(2000)
        );
    });
}

#[test]
fn test_explicit_config_overrides_global() {
    let temp_dir = TempDir::new().unwrap();
    with_xdg_env(&temp_dir, || {
        let config_dir = temp_dir.path().join("config").join("meshforge");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(
            config_dir.join("config.toml"),
            "active_provider = \"tripo\"\n\n[batch]\ndelay_ms = 1500\nauto_download = true\n",
        )
        .unwrap();

        let explicit = temp_dir.path().join("project.toml");
        fs::write(&explicit, "active_provider = \"meshy\"\n\n[batch]\ndelay_ms = 250\n").unwrap();

        let config = ConfigLoader::load(Some(&explicit)).unwrap();
        assert_eq!(config.active_provider().unwrap(), Some(ProviderId::Meshy));
        assert_eq!(config.batch.delay_ms, 250);
        // Keys not set by the explicit file keep the global value.
        assert!(config.batch.auto_download);
    });
}

#[test]
fn test_defaults_without_any_config_file() {
    let temp_dir = TempDir::new().unwrap();
    with_xdg_env(&temp_dir, || {
        let config = ConfigLoader::load(None).unwrap();
        assert_eq!(config.active_provider().unwrap(), None);
        assert_eq!(config.batch.delay_ms, 3_000);
        assert_eq!(config.logging.level, "warn");
        assert!(!config.credentials().any_configured());
        assert!(config.validate().is_ok());
    });
}

#[test]
fn test_api_key_variable_overrides_file_key() {
    let temp_dir = TempDir::new().unwrap();
    with_xdg_env(&temp_dir, || {
        let explicit = temp_dir.path().join("keys.toml");
        fs::write(&explicit, "[providers.meshy]\napi_key = \"msy_file\"\n").unwrap();

        std::env::set_var("MESHY_API_KEY", "msy_env");
        let config = ConfigLoader::load(Some(&explicit));
        std::env::remove_var("MESHY_API_KEY");

        let credentials = config.unwrap().credentials();
        assert_eq!(credentials.get(ProviderId::Meshy), "msy_env");
    });
}

#[test]
fn test_missing_explicit_config_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    with_xdg_env(&temp_dir, || {
        let missing = temp_dir.path().join("nope.toml");
        assert!(ConfigLoader::load(Some(&missing)).is_err());
    });
}
