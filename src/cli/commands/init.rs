//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "keepsake.toml")]
    pub output: String,

    /// Include every setting with comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("Initializing Keepsake configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2); // Configuration error exit code
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your backend URL", self.output);
                println!("  2. Put KEEPSAKE_API_TOKEN in a .env file if the backend needs one");
                println!("  3. Validate configuration: keepsake validate-config");
                println!("  4. Run export: keepsake export --book-id <ID> --user-id <ID>");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(5) // Fatal error exit code
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Keepsake Configuration File
# Renders personalized-book responses into PDF documents

[application]
log_level = "info"

[backend]
base_url = "http://localhost:8000"
# api_token = "${KEEPSAKE_API_TOKEN}"

[export]
output_dir = "./exports"
image_timeout_ms = 8000
include_images = true

[logging]
local_enabled = false
local_path = "./logs"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with every setting and comments
    fn generate_config_with_examples() -> String {
        r#"# Keepsake Configuration File
#
# Every setting below shows its default value.
# Values can reference environment variables as ${VAR_NAME}, and every
# setting can be overridden with KEEPSAKE_<SECTION>_<KEY>.

[application]
# trace | debug | info | warn | error
log_level = "info"

[backend]
# REST backend owning users, books and responses
base_url = "http://localhost:8000"
# Bearer token sent with every request
# api_token = "${KEEPSAKE_API_TOKEN}"
timeout_seconds = 30

[backend.retry]
max_retries = 3
initial_delay_ms = 500
max_delay_ms = 5000
backoff_multiplier = 2.0

[export]
# Directory receiving the generated PDF files
output_dir = "./exports"
# Per-image fetch budget; slower images are left out of the document
image_timeout_ms = 8000
# Pause before rendering so the "Preparing file..." status is visible
finalize_delay_ms = 100
include_images = true
# Count one step per response for the gap after it
count_separator_steps = true
# Font file to use instead of the bundled fonts
# font_path = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"
# font_family = "DejaVu Sans"

[export.labels]
target = "For: "
question = "Question: "
answer = "Answer: "
author = "User Name: "
placeholder = "—"

[export.progress]
# How long the final status stays visible
hide_after_done_ms = 1200
hide_after_cancel_ms = 900
hide_after_empty_ms = 1600

[layout]
# A4 portrait
page_width_mm = 210.0
page_height_mm = 297.0
margin_mm = 10.0
content_width_mm = 190.0
# Blocks that would cross this line go to the next page
content_bottom_mm = 290.0
# A response ending below this line starts a new page
response_break_mm = 270.0
header_font_pt = 12.0
header_line_mm = 6.0
body_font_pt = 10.0
body_line_mm = 5.0
block_gap_mm = 2.0
image_width_mm = 90.0
image_gap_mm = 5.0
response_gap_mm = 5.0
# Average glyph width relative to the font size, used for wrapping
char_width_factor = 0.5

[logging]
# JSON log files next to the console output
local_enabled = false
local_path = "./logs"
# daily | hourly
local_rotation = "daily"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_config_from_str, KeepsakeConfig};
    use tempfile::TempDir;

    #[test]
    fn test_init_args_defaults() {
        let args = InitArgs {
            output: "keepsake.toml".to_string(),
            with_examples: false,
            force: false,
        };

        assert_eq!(args.output, "keepsake.toml");
        assert!(!args.with_examples);
        assert!(!args.force);
    }

    #[test]
    fn test_generate_minimal_config() {
        let config = InitArgs::generate_minimal_config();
        assert!(config.contains("[application]"));
        assert!(config.contains("[backend]"));
        assert!(config.contains("[export]"));

        let parsed = load_config_from_str(&config).unwrap();
        assert_eq!(parsed.export.output_dir, "./exports");
    }

    #[test]
    fn test_generate_config_with_examples_matches_defaults() {
        let config = InitArgs::generate_config_with_examples();
        assert!(config.contains("# Keepsake Configuration File"));

        let parsed = load_config_from_str(&config).unwrap();
        let defaults = KeepsakeConfig::default();
        assert_eq!(parsed.layout, defaults.layout);
        assert_eq!(parsed.export.labels.answer, defaults.export.labels.answer);
        assert_eq!(
            parsed.export.progress.hide_after_done_ms,
            defaults.export.progress.hide_after_done_ms
        );
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("keepsake.toml");
        std::fs::write(&output, "existing").unwrap();

        let args = InitArgs {
            output: output.to_string_lossy().to_string(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 2);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "existing");

        let args = InitArgs { force: true, ..args };
        assert_eq!(args.execute().await.unwrap(), 0);
        assert!(std::fs::read_to_string(&output).unwrap().contains("[backend]"));
    }
}
