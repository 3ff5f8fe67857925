//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Configurable log levels
//! - Console output on stderr
//! - Local JSON file logging with rotation
//!
//! # Example
//!
//! ```no_run
//! use keepsake::logging::init_logging;
//! use keepsake::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of an export run
///
/// # Example
///
/// ```no_run
/// use keepsake::log_export_start;
///
/// log_export_start!("book:42", 3, 17);
/// ```
#[macro_export]
macro_rules! log_export_start {
    ($target:expr, $responses:expr, $total_steps:expr) => {
        tracing::info!(
            target_id = %$target,
            responses = $responses,
            total_steps = $total_steps,
            "Starting export"
        );
    };
}

/// Log the completion of an export run
///
/// # Example
///
/// ```no_run
/// use keepsake::log_export_complete;
/// use std::time::Duration;
///
/// log_export_complete!("book_42_responses.pdf", 4, Duration::from_secs(3));
/// ```
#[macro_export]
macro_rules! log_export_complete {
    ($file_name:expr, $pages:expr, $duration:expr) => {
        tracing::info!(
            file_name = %$file_name,
            pages = $pages,
            duration_ms = $duration.as_millis() as u64,
            "Export completed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use keepsake::log_error_with_context;
/// use keepsake::domain::KeepsakeError;
///
/// let error = KeepsakeError::Render("font missing".to_string());
/// log_error_with_context!(&error, "Failed to render document");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use keepsake::log_retry_attempt;
///
/// log_retry_attempt!(2, 3, "Connection timeout");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = %$reason,
            "Retrying operation"
        );
    };
}
