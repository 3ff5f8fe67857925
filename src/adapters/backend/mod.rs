//! REST backend integration
//!
//! Fetches the already-collected responses that feed an export.

pub mod client;
pub mod models;

pub use client::BackendClient;
pub use models::UserSummary;
