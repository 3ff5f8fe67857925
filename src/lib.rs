// Keepsake - Personalized Book Export Engine
// Copyright (c) 2025 Keepsake Contributors
// Licensed under the MIT License

//! # Keepsake - Personalized Book Export Engine
//!
//! Keepsake renders the responses collected for a personalized book into a
//! paginated PDF document, reporting progress and an ETA while it works and
//! honoring cancellation requests at well-defined checkpoints.
//!
//! ## Overview
//!
//! This library provides:
//! - **Progress tracking** with percentage, ETA and a cancellation flag
//! - **Asset resolution** of answer images with a per-image timeout
//! - **Document assembly** of headers, questions, answers and images into pages
//! - **Rendering** of the laid-out pages to PDF
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Export state machine, progress, layout and rendering
//! - [`adapters`] - External integrations (REST backend, image fetching, output directory)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use keepsake::config::load_config;
//! use keepsake::core::export::{DocumentAssembler, ExportOutcome};
//! use keepsake::domain::{BookId, ExportRequest, QuestionAnswer, ResponseRecord};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("keepsake.toml")?;
//!     let assembler = DocumentAssembler::from_config(&config)?;
//!
//!     let record = ResponseRecord::new("Mother")
//!         .with_question(QuestionAnswer::new("Favorite place?", "The lake house"));
//!     let request = ExportRequest::for_book(BookId::new("42")?, vec![record]);
//!
//!     if let ExportOutcome::Done(summary) = assembler.export(&request).await {
//!         println!("Wrote {} pages to {}", summary.pages, summary.path.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Observing Progress
//!
//! Every assembler publishes its progress on a watch channel. Observers read
//! snapshots and may request cancellation:
//!
//! ```rust,no_run
//! use keepsake::core::export::DocumentAssembler;
//!
//! # async fn example(assembler: &DocumentAssembler) {
//! let progress = assembler.progress();
//! let mut rx = progress.subscribe();
//!
//! tokio::spawn(async move {
//!     while rx.changed().await.is_ok() {
//!         let p = rx.borrow_and_update().clone();
//!         println!("{}% {} (eta {:?})", p.percent, p.status_text, p.eta_seconds);
//!     }
//! });
//!
//! // From anywhere else, e.g. a Ctrl+C handler:
//! progress.request_cancel();
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Fallible operations return [`domain::KeepsakeError`]. A missing or broken
//! image is never an error: the document is produced without it.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
