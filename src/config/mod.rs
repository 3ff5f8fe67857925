//! Configuration management for Keepsake.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Keepsake uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `KEEPSAKE_<SECTION>_<KEY>` environment overrides
//! - Default values for every setting
//! - Validation with descriptive messages
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use keepsake::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("keepsake.toml")?;
//!
//! println!("Backend: {}", config.backend.base_url);
//! println!("Output: {}", config.export.output_dir);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`BackendConfig`] - REST backend URL, token, timeout and retries
//! - [`ExportConfig`] - Output directory, image timeout, fonts, labels, progress timings
//! - [`LayoutConfig`] - Page geometry, font sizes and gaps
//! - [`LoggingConfig`] - Local file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [backend]
//! base_url = "https://api.example.com"
//! api_token = "${KEEPSAKE_API_TOKEN}"
//!
//! [export]
//! output_dir = "./exports"
//! image_timeout_ms = 8000
//!
//! [export.labels]
//! target = "For: "
//!
//! [layout]
//! image_width_mm = 90.0
//! ```

pub mod loader;
pub mod schema;

// Re-export commonly used types
pub use loader::{load_config, load_config_from_str};
pub use schema::{
    ApplicationConfig, BackendConfig, ExportConfig, KeepsakeConfig, LabelConfig, LayoutConfig,
    LoggingConfig, ProgressConfig, RetryConfig,
};
