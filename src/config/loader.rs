//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::KeepsakeConfig;
use crate::domain::errors::KeepsakeError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into KeepsakeConfig
/// 4. Applies environment variable overrides (KEEPSAKE_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use keepsake::config::loader::load_config;
///
/// let config = load_config("keepsake.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<KeepsakeConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(KeepsakeError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        KeepsakeError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    load_config_from_str(&contents)
}

/// Loads configuration from TOML text
///
/// Runs the same substitution, override and validation steps as
/// [`load_config`].
pub fn load_config_from_str(contents: &str) -> Result<KeepsakeConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: KeepsakeConfig = toml::from_str(&contents)
        .map_err(|e| KeepsakeError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        KeepsakeError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| KeepsakeError::Configuration(format!("Invalid placeholder pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(KeepsakeError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Applies environment variable overrides using the KEEPSAKE_* prefix
///
/// Variables follow the pattern `KEEPSAKE_<SECTION>_<KEY>`, for example
/// `KEEPSAKE_BACKEND_BASE_URL` or `KEEPSAKE_EXPORT_OUTPUT_DIR`. Values that
/// fail to parse are ignored.
fn apply_env_overrides(config: &mut KeepsakeConfig) {
    // Application
    if let Ok(val) = std::env::var("KEEPSAKE_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Backend
    if let Ok(val) = std::env::var("KEEPSAKE_BACKEND_BASE_URL") {
        config.backend.base_url = val;
    }
    if let Ok(val) = std::env::var("KEEPSAKE_BACKEND_API_TOKEN") {
        config.backend.api_token = Some(val);
    }
    if let Some(val) = env_parse("KEEPSAKE_BACKEND_TIMEOUT_SECONDS") {
        config.backend.timeout_seconds = val;
    }
    if let Some(val) = env_parse("KEEPSAKE_BACKEND_MAX_RETRIES") {
        config.backend.retry.max_retries = val;
    }

    // Export
    if let Ok(val) = std::env::var("KEEPSAKE_EXPORT_OUTPUT_DIR") {
        config.export.output_dir = val;
    }
    if let Some(val) = env_parse("KEEPSAKE_EXPORT_IMAGE_TIMEOUT_MS") {
        config.export.image_timeout_ms = val;
    }
    if let Some(val) = env_parse("KEEPSAKE_EXPORT_FINALIZE_DELAY_MS") {
        config.export.finalize_delay_ms = val;
    }
    if let Some(val) = env_parse("KEEPSAKE_EXPORT_INCLUDE_IMAGES") {
        config.export.include_images = val;
    }
    if let Ok(val) = std::env::var("KEEPSAKE_EXPORT_FONT_PATH") {
        config.export.font_path = Some(val);
    }

    // Logging
    if let Some(val) = env_parse("KEEPSAKE_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val;
    }
    if let Ok(val) = std::env::var("KEEPSAKE_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("KEEPSAKE_TEST_TOKEN", "token_value");
        let input = "api_token = \"${KEEPSAKE_TEST_TOKEN}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "api_token = \"token_value\"\n");
        std::env::remove_var("KEEPSAKE_TEST_TOKEN");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("KEEPSAKE_MISSING_VAR");
        let input = "api_token = \"${KEEPSAKE_MISSING_VAR}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("KEEPSAKE_MISSING_VAR"));
    }

    #[test]
    fn test_substitute_env_vars_skips_comments() {
        std::env::remove_var("KEEPSAKE_COMMENTED_VAR");
        let input = "# api_token = \"${KEEPSAKE_COMMENTED_VAR}\"\nlog_level = \"info\"";
        let result = substitute_env_vars(input).unwrap();
        assert!(result.contains("${KEEPSAKE_COMMENTED_VAR}"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent-keepsake.toml");
        assert!(matches!(result, Err(KeepsakeError::Configuration(_))));
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
[application]
log_level = "debug"

[backend]
base_url = "https://api.example.com"

[export]
output_dir = "/tmp/keepsake-out"
image_timeout_ms = 2000

[export.labels]
target = "Pour: "

[layout]
image_width_mm = 80.0
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.backend.base_url, "https://api.example.com");
        assert_eq!(config.export.image_timeout_ms, 2000);
        assert_eq!(config.export.labels.target, "Pour: ");
        assert_eq!(config.export.labels.answer, "Answer: ");
        assert_eq!(config.layout.image_width_mm, 80.0);
    }

    #[test]
    fn test_load_config_rejects_invalid_values() {
        let err = load_config_from_str("[export]\nimage_timeout_ms = 1\n").unwrap_err();
        assert!(err.to_string().contains("image_timeout_ms"));
    }
}
