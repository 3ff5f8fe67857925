//! Document export
//!
//! This module turns an [`ExportRequest`](crate::domain::ExportRequest) into a
//! paginated document:
//! - [`progress`] - Observable progress, ETA and cancellation
//! - [`layout`] - Page layout of headers, questions, answers and images
//! - [`render`] - Rendering a laid-out document to PDF
//! - [`assembler`] - The export state machine tying the above together
//! - [`summary`] - Outcome and summary of a run

pub mod assembler;
pub mod layout;
pub mod progress;
pub mod render;
pub mod summary;

pub use assembler::{count_steps, AssemblerOptions, DocumentAssembler};
pub use layout::{BlockKind, Document, PageLayout};
pub use progress::{status, ExportPhase, ExportProgress, ProgressHandle, ProgressTracker};
pub use render::{DocumentRenderer, FormatInfo, TypstPdfRenderer};
pub use summary::{ExportOutcome, ExportSummary};
