//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Keepsake configuration file.

use crate::config::load_config;
use crate::core::export::TypstPdfRenderer;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Also load the configured font file
    #[arg(long)]
    pub check_fonts: bool,
}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => {
                println!("Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        if let Err(e) = config.validate() {
            println!("Configuration validation failed");
            println!("   Error: {e}");
            println!();
            return Ok(2);
        }

        if self.check_fonts {
            match TypstPdfRenderer::from_config(&config.export) {
                Ok(renderer) => println!("Fonts loaded: {}", renderer.font_count()),
                Err(e) => {
                    println!("Font check failed");
                    println!("   Error: {e}");
                    return Ok(2);
                }
            }
        }

        println!("Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Backend: {}", config.backend.base_url);
        println!(
            "  API Token: {}",
            if config.backend.api_token.is_some() {
                "set"
            } else {
                "not set"
            }
        );
        println!("  Output Directory: {}", config.export.output_dir);
        println!("  Image Timeout: {}ms", config.export.image_timeout_ms);
        println!("  Images: {}", if config.export.include_images { "on" } else { "off" });
        println!(
            "  Page: {}x{}mm, margin {}mm",
            config.layout.page_width_mm, config.layout.page_height_mm, config.layout.margin_mm
        );
        println!(
            "  Font: {}",
            config
                .export
                .font_path
                .as_deref()
                .unwrap_or("bundled")
        );
        println!();
        Ok(0)
    }
}
