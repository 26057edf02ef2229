//! End-to-end runs of the meshforge binary with an isolated home.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn meshforge(home: &Path, args: &[&str]) -> Output {
    let bin = env!("CARGO_BIN_EXE_meshforge");
    let mut command = Command::new(bin);
    command
        .env("HOME", home.join("home"))
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env_remove("MESHFORGE_LOG")
        .env_remove("MESHFORGE_LOG_OUTPUT")
        .env_remove("MESHFORGE_LOG_FORMAT")
        .env_remove("MESHFORGE_LOG_MODULES");
    for var in ["MESHY_API_KEY", "TRIPO_API_KEY", "CSM_API_KEY"] {
        command.env_remove(var);
    }
    command.args(args).output().unwrap()
}

#[test]
fn test_enhance_prints_prompt() {
    let temp_dir = TempDir::new().unwrap();
    let output = meshforge(temp_dir.path(), &["enhance", "robot", "--style", "cyberpunk"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("A robot, neon-lit"), "stdout: {}", stdout);
    assert!(stdout.trim_end().ends_with("professional render"));
}

#[test]
fn test_generate_without_keys_exits_with_hint() {
    let temp_dir = TempDir::new().unwrap();
    let output = meshforge(temp_dir.path(), &["generate", "a chair"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("meshforge configure --provider"), "stderr: {}", stderr);
}

#[test]
fn test_configured_key_survives_between_runs() {
    let temp_dir = TempDir::new().unwrap();
    let output = meshforge(
        temp_dir.path(),
        &["configure", "--provider", "meshy", "--key", "msy_saved"],
    );
    assert!(output.status.success());

    let output = meshforge(temp_dir.path(), &["providers", "--format", "json"]);
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let meshy = &value["providers"][0];
    assert_eq!(meshy["id"], "meshy");
    assert_eq!(meshy["configured"], true);
    assert_eq!(meshy["active"], true);
}

#[test]
fn test_log_file_receives_command_logs() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs").join("meshforge.log");
    let output = meshforge(
        temp_dir.path(),
        &[
            "--log-level",
            "info",
            "--log-file",
            log_path.to_str().unwrap(),
            "providers",
        ],
    );

    assert!(output.status.success());
    let log = fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("Executing command"), "log: {}", log);
    assert!(log.contains("providers"));
}
