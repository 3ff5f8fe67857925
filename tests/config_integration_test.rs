//! Integration tests for configuration loading and validation
//!
//! Tests that modify environment variables hold `ENV_MUTEX`.

use keepsake::config::{load_config, KeepsakeConfig};
use keepsake::domain::KeepsakeError;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn cleanup_env_vars() {
    std::env::remove_var("KEEPSAKE_APPLICATION_LOG_LEVEL");
    std::env::remove_var("KEEPSAKE_BACKEND_BASE_URL");
    std::env::remove_var("KEEPSAKE_EXPORT_OUTPUT_DIR");
    std::env::remove_var("KEEPSAKE_EXPORT_IMAGE_TIMEOUT_MS");
    std::env::remove_var("KEEPSAKE_EXPORT_INCLUDE_IMAGES");
    std::env::remove_var("TEST_KEEPSAKE_TOKEN");
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(
        r#"
[application]
log_level = "debug"

[backend]
base_url = "https://api.example.com/v1"
api_token = "token-123"
timeout_seconds = 10

[backend.retry]
max_retries = 5
initial_delay_ms = 100
max_delay_ms = 1000
backoff_multiplier = 1.5

[export]
output_dir = "/tmp/keepsake-out"
image_timeout_ms = 2000
finalize_delay_ms = 0
include_images = false
count_separator_steps = false

[export.labels]
target = "Pour : "
question = "Question : "
answer = "Réponse : "

[export.progress]
hide_after_done_ms = 500
hide_after_cancel_ms = 400
hide_after_empty_ms = 300

[layout]
page_width_mm = 216.0
page_height_mm = 279.0
content_width_mm = 196.0
content_bottom_mm = 270.0
response_break_mm = 250.0

[logging]
local_enabled = true
local_path = "/tmp/keepsake-logs"
local_rotation = "hourly"
"#,
    );

    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.backend.base_url, "https://api.example.com/v1");
    assert_eq!(config.backend.api_token.as_deref(), Some("token-123"));
    assert_eq!(config.backend.retry.max_retries, 5);
    assert_eq!(config.export.output_dir, "/tmp/keepsake-out");
    assert_eq!(config.export.image_timeout_ms, 2000);
    assert!(!config.export.include_images);
    assert!(!config.export.count_separator_steps);
    assert_eq!(config.export.labels.answer, "Réponse : ");
    assert_eq!(config.export.progress.hide_after_empty_ms, 300);
    assert_eq!(config.layout.page_width_mm, 216.0);
    assert_eq!(config.layout.margin_mm, 10.0);
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_empty_file_uses_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config("");
    let config = load_config(file.path()).unwrap();
    let defaults = KeepsakeConfig::default();

    assert_eq!(config.backend.base_url, defaults.backend.base_url);
    assert_eq!(config.export.image_timeout_ms, 8000);
    assert_eq!(config.export.finalize_delay_ms, 100);
    assert!(config.export.count_separator_steps);
    assert_eq!(config.export.labels.target, "For: ");
    assert_eq!(config.export.progress.hide_after_done_ms, 1200);
    assert_eq!(config.export.progress.hide_after_cancel_ms, 900);
    assert_eq!(config.export.progress.hide_after_empty_ms, 1600);
    assert_eq!(config.layout, defaults.layout);
}

#[test]
fn test_env_var_substitution() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("TEST_KEEPSAKE_TOKEN", "from-env");

    let file = write_config(
        r#"
[backend]
# api_token = "${NOT_SET_ANYWHERE}"
api_token = "${TEST_KEEPSAKE_TOKEN}"
"#,
    );
    let config = load_config(file.path()).unwrap();
    assert_eq!(config.backend.api_token.as_deref(), Some("from-env"));

    cleanup_env_vars();
}

#[test]
fn test_missing_env_var_is_reported() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(
        r#"
[backend]
api_token = "${TEST_KEEPSAKE_TOKEN}"
"#,
    );
    let err = load_config(file.path()).unwrap_err();
    assert!(matches!(err, KeepsakeError::Configuration(_)));
    assert!(err.to_string().contains("TEST_KEEPSAKE_TOKEN"));
}

#[test]
fn test_env_overrides() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("KEEPSAKE_APPLICATION_LOG_LEVEL", "warn");
    std::env::set_var("KEEPSAKE_EXPORT_OUTPUT_DIR", "/srv/exports");
    std::env::set_var("KEEPSAKE_EXPORT_IMAGE_TIMEOUT_MS", "1500");
    std::env::set_var("KEEPSAKE_EXPORT_INCLUDE_IMAGES", "false");

    let file = write_config(
        r#"
[export]
output_dir = "./exports"
image_timeout_ms = 8000
"#,
    );
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.log_level, "warn");
    assert_eq!(config.export.output_dir, "/srv/exports");
    assert_eq!(config.export.image_timeout_ms, 1500);
    assert!(!config.export.include_images);

    cleanup_env_vars();
}

#[test]
fn test_invalid_values_are_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let cases = [
        "[application]\nlog_level = \"loud\"",
        "[backend]\nbase_url = \"ftp://example.com\"",
        "[backend]\ntimeout_seconds = 0",
        "[export]\nimage_timeout_ms = 10",
        "[layout]\ncontent_width_mm = 500.0",
        "[logging]\nlocal_rotation = \"weekly\"",
    ];

    for case in cases {
        let file = write_config(case);
        let err = load_config(file.path()).unwrap_err();
        assert!(
            matches!(err, KeepsakeError::Configuration(_)),
            "expected configuration error for {case:?}"
        );
    }
}

#[test]
fn test_missing_file() {
    let err = load_config("/nonexistent/keepsake.toml").unwrap_err();
    assert!(matches!(
        err,
        KeepsakeError::Configuration(_) | KeepsakeError::Io(_)
    ));
}

#[test]
fn test_malformed_toml() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config("[export\noutput_dir = ");
    assert!(load_config(file.path()).is_err());
}
