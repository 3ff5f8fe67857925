//! Export summary and outcomes
//!
//! This module defines the result of one export run.

use crate::domain::KeepsakeError;
use std::path::PathBuf;
use std::time::Duration;

/// Summary of a successful export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    /// Export target as shown in logs (`book:<id>` or `response:<id>`)
    pub target: String,

    /// Deterministic artifact file name
    pub file_name: String,

    /// Where the sink stored the artifact
    pub path: PathBuf,

    /// Responses in the document
    pub responses: usize,

    /// Questions in the document
    pub questions: usize,

    /// Steps counted before the run
    pub total_steps: usize,

    /// Steps advanced during the run
    pub processed_steps: usize,

    /// Images resolved and embedded
    pub images_embedded: usize,

    /// Images referenced but missing, unreachable, or skipped
    pub images_skipped: usize,

    /// Pages in the document
    pub pages: usize,

    /// Artifact size
    pub bytes: usize,

    /// Duration of the run
    pub duration: Duration,
}

impl ExportSummary {
    /// Creates an empty summary for `target`
    pub fn new(target: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            file_name: file_name.into(),
            path: PathBuf::new(),
            responses: 0,
            questions: 0,
            total_steps: 0,
            processed_steps: 0,
            images_embedded: 0,
            images_skipped: 0,
            pages: 0,
            bytes: 0,
            duration: Duration::from_secs(0),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Whether every referenced image made it into the document
    pub fn all_images_embedded(&self) -> bool {
        self.images_skipped == 0
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            target_id = %self.target,
            file_name = %self.file_name,
            path = %self.path.display(),
            responses = self.responses,
            questions = self.questions,
            steps = format!("{}/{}", self.processed_steps, self.total_steps),
            images_embedded = self.images_embedded,
            pages = self.pages,
            bytes = self.bytes,
            duration_ms = self.duration.as_millis() as u64,
            "Export completed"
        );

        if self.images_skipped > 0 {
            tracing::warn!(
                images_skipped = self.images_skipped,
                "Some images could not be embedded"
            );
        }
    }
}

/// How an export run ended
#[derive(Debug)]
pub enum ExportOutcome {
    /// The artifact was produced and delivered
    Done(ExportSummary),

    /// Cancellation was observed; nothing was delivered
    Cancelled { processed: usize, total: usize },

    /// The request held no responses; no run was started
    NothingToExport,

    /// Layout, rendering or delivery failed; nothing was delivered
    Failed(KeepsakeError),
}

impl ExportOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, ExportOutcome::Done(_))
    }

    pub fn summary(&self) -> Option<&ExportSummary> {
        match self {
            ExportOutcome::Done(summary) => Some(summary),
            _ => None,
        }
    }

    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            ExportOutcome::Done(_) => "done",
            ExportOutcome::Cancelled { .. } => "cancelled",
            ExportOutcome::NothingToExport => "nothing_to_export",
            ExportOutcome::Failed(_) => "failed",
        }
    }
}
