//! Configuration schema types
//!
//! This module defines the configuration structure for Keepsake. Every section
//! has defaults, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Main Keepsake configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeepsakeConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// REST backend holding users, books and responses
    #[serde(default)]
    pub backend: BackendConfig,

    /// Export behaviour
    #[serde(default)]
    pub export: ExportConfig,

    /// Page geometry used by the document layout
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl KeepsakeConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.backend.validate()?;
        self.export.validate()?;
        self.layout.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// REST backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the backend API
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    /// Bearer token sent with every request (optional)
    #[serde(default)]
    pub api_token: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            api_token: None,
            timeout_seconds: default_timeout_seconds(),
            retry: RetryConfig::default(),
        }
    }
}

impl BackendConfig {
    fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("backend.base_url cannot be empty".to_string());
        }
        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| format!("backend.base_url is not a valid URL: {e}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err("backend.base_url must start with http:// or https://".to_string());
        }
        if self.timeout_seconds == 0 {
            return Err("backend.timeout_seconds must be > 0".to_string());
        }
        if self.retry.max_retries == 0 || self.retry.max_retries > 10 {
            return Err(format!(
                "backend.retry.max_retries must be between 1 and 10, got {}",
                self.retry.max_retries
            ));
        }
        Ok(())
    }
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory the finished documents are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Per-image fetch timeout in milliseconds
    #[serde(default = "default_image_timeout_ms")]
    pub image_timeout_ms: u64,

    /// Pause before the file is produced so progress observers can repaint
    #[serde(default = "default_finalize_delay_ms")]
    pub finalize_delay_ms: u64,

    /// Embed images referenced by answers
    #[serde(default = "default_true")]
    pub include_images: bool,

    /// Count one trailing separator step per response in the progress total
    #[serde(default = "default_true")]
    pub count_separator_steps: bool,

    /// Extra TrueType/OpenType font file to register with the renderer
    #[serde(default)]
    pub font_path: Option<String>,

    /// Preferred font family; falls back to the bundled fonts
    #[serde(default)]
    pub font_family: Option<String>,

    /// Text prefixes written in front of each block
    #[serde(default)]
    pub labels: LabelConfig,

    /// Progress display timings
    #[serde(default)]
    pub progress: ProgressConfig,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            image_timeout_ms: default_image_timeout_ms(),
            finalize_delay_ms: default_finalize_delay_ms(),
            include_images: true,
            count_separator_steps: true,
            font_path: None,
            font_family: None,
            labels: LabelConfig::default(),
            progress: ProgressConfig::default(),
        }
    }
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.output_dir.trim().is_empty() {
            return Err("export.output_dir cannot be empty".to_string());
        }
        if !(100..=120_000).contains(&self.image_timeout_ms) {
            return Err(format!(
                "export.image_timeout_ms must be between 100 and 120000, got {}",
                self.image_timeout_ms
            ));
        }
        if self.finalize_delay_ms > 5_000 {
            return Err(format!(
                "export.finalize_delay_ms must be <= 5000, got {}",
                self.finalize_delay_ms
            ));
        }
        if let Some(path) = &self.font_path {
            if path.trim().is_empty() {
                return Err("export.font_path cannot be blank when set".to_string());
            }
        }
        Ok(())
    }
}

/// Block label prefixes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelConfig {
    /// Prefix of the response header line
    #[serde(default = "default_target_label")]
    pub target: String,

    /// Prefix of question lines
    #[serde(default = "default_question_label")]
    pub question: String,

    /// Prefix of answer lines
    #[serde(default = "default_answer_label")]
    pub answer: String,

    /// Prefix of the author line of single-response exports
    #[serde(default = "default_author_label")]
    pub author: String,

    /// Shown instead of a blank answer or author in single-response exports
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            target: default_target_label(),
            question: default_question_label(),
            answer: default_answer_label(),
            author: default_author_label(),
            placeholder: default_placeholder(),
        }
    }
}

/// Auto-hide delays applied after a terminal export state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Delay after a successful export
    #[serde(default = "default_hide_after_done_ms")]
    pub hide_after_done_ms: u64,

    /// Delay after a cancelled export
    #[serde(default = "default_hide_after_cancel_ms")]
    pub hide_after_cancel_ms: u64,

    /// Delay after an export with nothing to do
    #[serde(default = "default_hide_after_empty_ms")]
    pub hide_after_empty_ms: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            hide_after_done_ms: default_hide_after_done_ms(),
            hide_after_cancel_ms: default_hide_after_cancel_ms(),
            hide_after_empty_ms: default_hide_after_empty_ms(),
        }
    }
}

/// Page geometry in millimetres and font sizes in points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_page_width_mm")]
    pub page_width_mm: f64,

    #[serde(default = "default_page_height_mm")]
    pub page_height_mm: f64,

    /// Left margin and the top of every page's cursor
    #[serde(default = "default_margin_mm")]
    pub margin_mm: f64,

    /// Width available for wrapped text
    #[serde(default = "default_content_width_mm")]
    pub content_width_mm: f64,

    /// A block whose bottom would pass this line starts a new page
    #[serde(default = "default_content_bottom_mm")]
    pub content_bottom_mm: f64,

    /// After a response, a cursor past this line forces a page break
    #[serde(default = "default_response_break_mm")]
    pub response_break_mm: f64,

    #[serde(default = "default_header_font_pt")]
    pub header_font_pt: f64,

    #[serde(default = "default_header_line_mm")]
    pub header_line_mm: f64,

    #[serde(default = "default_body_font_pt")]
    pub body_font_pt: f64,

    #[serde(default = "default_body_line_mm")]
    pub body_line_mm: f64,

    /// Gap after each text block
    #[serde(default = "default_block_gap_mm")]
    pub block_gap_mm: f64,

    #[serde(default = "default_image_width_mm")]
    pub image_width_mm: f64,

    /// Gap after each image
    #[serde(default = "default_image_gap_mm")]
    pub image_gap_mm: f64,

    /// Gap after each response
    #[serde(default = "default_response_gap_mm")]
    pub response_gap_mm: f64,

    /// Average glyph width as a fraction of the font size
    #[serde(default = "default_char_width_factor")]
    pub char_width_factor: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_width_mm: default_page_width_mm(),
            page_height_mm: default_page_height_mm(),
            margin_mm: default_margin_mm(),
            content_width_mm: default_content_width_mm(),
            content_bottom_mm: default_content_bottom_mm(),
            response_break_mm: default_response_break_mm(),
            header_font_pt: default_header_font_pt(),
            header_line_mm: default_header_line_mm(),
            body_font_pt: default_body_font_pt(),
            body_line_mm: default_body_line_mm(),
            block_gap_mm: default_block_gap_mm(),
            image_width_mm: default_image_width_mm(),
            image_gap_mm: default_image_gap_mm(),
            response_gap_mm: default_response_gap_mm(),
            char_width_factor: default_char_width_factor(),
        }
    }
}

impl LayoutConfig {
    fn validate(&self) -> Result<(), String> {
        let positive = [
            ("page_width_mm", self.page_width_mm),
            ("page_height_mm", self.page_height_mm),
            ("content_width_mm", self.content_width_mm),
            ("header_font_pt", self.header_font_pt),
            ("header_line_mm", self.header_line_mm),
            ("body_font_pt", self.body_font_pt),
            ("body_line_mm", self.body_line_mm),
            ("image_width_mm", self.image_width_mm),
            ("char_width_factor", self.char_width_factor),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("layout.{name} must be > 0, got {value}"));
            }
        }

        let non_negative = [
            ("margin_mm", self.margin_mm),
            ("block_gap_mm", self.block_gap_mm),
            ("image_gap_mm", self.image_gap_mm),
            ("response_gap_mm", self.response_gap_mm),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("layout.{name} must be >= 0, got {value}"));
            }
        }

        if self.margin_mm + self.content_width_mm > self.page_width_mm {
            return Err(format!(
                "layout.margin_mm + layout.content_width_mm ({}) exceeds page_width_mm ({})",
                self.margin_mm + self.content_width_mm,
                self.page_width_mm
            ));
        }
        if self.content_bottom_mm <= self.margin_mm
            || self.content_bottom_mm > self.page_height_mm
        {
            return Err(format!(
                "layout.content_bottom_mm must be between margin_mm and page_height_mm, got {}",
                self.content_bottom_mm
            ));
        }
        if self.response_break_mm > self.content_bottom_mm {
            return Err(format!(
                "layout.response_break_mm ({}) must not exceed content_bottom_mm ({})",
                self.response_break_mm, self.content_bottom_mm
            ));
        }
        if self.margin_mm + self.image_width_mm > self.page_width_mm {
            return Err("layout.image_width_mm does not fit on the page".to_string());
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily or hourly)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local_enabled".to_string());
        }
        Ok(())
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_retries() -> usize {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    5000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_output_dir() -> String {
    "./exports".to_string()
}

fn default_image_timeout_ms() -> u64 {
    8000
}

fn default_finalize_delay_ms() -> u64 {
    100
}

fn default_target_label() -> String {
    "For: ".to_string()
}

fn default_question_label() -> String {
    "Question: ".to_string()
}

fn default_answer_label() -> String {
    "Answer: ".to_string()
}

fn default_author_label() -> String {
    "User Name: ".to_string()
}

fn default_placeholder() -> String {
    "—".to_string()
}

fn default_hide_after_done_ms() -> u64 {
    1200
}

fn default_hide_after_cancel_ms() -> u64 {
    900
}

fn default_hide_after_empty_ms() -> u64 {
    1600
}

fn default_page_width_mm() -> f64 {
    210.0
}

fn default_page_height_mm() -> f64 {
    297.0
}

fn default_margin_mm() -> f64 {
    10.0
}

fn default_content_width_mm() -> f64 {
    190.0
}

fn default_content_bottom_mm() -> f64 {
    290.0
}

fn default_response_break_mm() -> f64 {
    270.0
}

fn default_header_font_pt() -> f64 {
    12.0
}

fn default_header_line_mm() -> f64 {
    6.0
}

fn default_body_font_pt() -> f64 {
    10.0
}

fn default_body_line_mm() -> f64 {
    5.0
}

fn default_block_gap_mm() -> f64 {
    2.0
}

fn default_image_width_mm() -> f64 {
    90.0
}

fn default_image_gap_mm() -> f64 {
    5.0
}

fn default_response_gap_mm() -> f64 {
    5.0
}

fn default_char_width_factor() -> f64 {
    0.5
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
