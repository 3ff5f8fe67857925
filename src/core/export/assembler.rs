//! Document assembler - orchestrates one export run
//!
//! The assembler counts the steps of a request, walks its responses in
//! document order while laying out text and images, checks for cancellation
//! at every checkpoint and finally renders and delivers the artifact.
//!
//! ```text
//! Idle -> Counting -> Running -> Finalizing -> Done
//!                        |            |
//!                        +-> Cancelled <-+      (any stage) -> Failed
//! ```

use super::layout::{BlockKind, PageLayout};
use super::progress::{status, ExportPhase, ProgressHandle, ProgressTracker};
use super::render::{DocumentRenderer, TypstPdfRenderer};
use super::summary::{ExportOutcome, ExportSummary};
use crate::adapters::images::{AssetResolver, HttpAssetResolver};
use crate::adapters::output::{ArtifactSink, DirectorySink};
use crate::config::{KeepsakeConfig, LabelConfig, LayoutConfig, ProgressConfig};
use crate::domain::{ExportRequest, KeepsakeError, ResponseRecord, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Number of progress steps an export of `responses` takes
///
/// Each response counts one header step, two steps per question plus one per
/// attached image, and one trailing separator step when `with_separator` is
/// set. The author line of a single-response export is not a step.
///
/// ```
/// use keepsake::core::export::count_steps;
/// use keepsake::domain::{QuestionAnswer, ResponseRecord};
///
/// let record = ResponseRecord::new("Mother")
///     .with_question(QuestionAnswer::new("q1", "a1").with_image("https://img/1.png"))
///     .with_question(QuestionAnswer::new("q2", "a2"))
///     .with_question(QuestionAnswer::new("q3", "a3"));
///
/// assert_eq!(count_steps(&[record.clone()], false), 8);
/// assert_eq!(count_steps(&[record], true), 9);
/// ```
pub fn count_steps(responses: &[ResponseRecord], with_separator: bool) -> usize {
    responses
        .iter()
        .map(|r| {
            let questions: usize = r
                .questions()
                .iter()
                .map(|q| 2 + usize::from(q.has_image()))
                .sum();
            1 + questions + usize::from(with_separator)
        })
        .sum()
}

/// Tunables of the assembler
#[derive(Debug, Clone)]
pub struct AssemblerOptions {
    pub labels: LabelConfig,
    pub layout: LayoutConfig,
    pub progress: ProgressConfig,
    /// Pause before rendering so observers can show "Preparing file..."
    pub finalize_delay: Duration,
    /// When false, image steps are counted and advanced but nothing is fetched
    pub include_images: bool,
    pub count_separator_steps: bool,
}

impl Default for AssemblerOptions {
    fn default() -> Self {
        Self::from_config(&KeepsakeConfig::default())
    }
}

impl AssemblerOptions {
    pub fn from_config(config: &KeepsakeConfig) -> Self {
        Self {
            labels: config.export.labels.clone(),
            layout: config.layout.clone(),
            progress: config.export.progress.clone(),
            finalize_delay: Duration::from_millis(config.export.finalize_delay_ms),
            include_images: config.export.include_images,
            count_separator_steps: config.export.count_separator_steps,
        }
    }
}

/// Per-run counters that end up in the summary
#[derive(Debug, Default)]
struct RunStats {
    questions: usize,
    images_embedded: usize,
    images_skipped: usize,
}

enum Flow {
    Completed,
    Cancelled,
}

/// Produces one document per [`export`](DocumentAssembler::export) call
///
/// # Example
///
/// ```rust,no_run
/// use keepsake::config::KeepsakeConfig;
/// use keepsake::core::export::{DocumentAssembler, ExportOutcome};
/// use keepsake::domain::{BookId, ExportRequest, KeepsakeError};
///
/// # async fn example() -> keepsake::domain::Result<()> {
/// let assembler = DocumentAssembler::from_config(&KeepsakeConfig::default())?;
/// let progress = assembler.progress();
///
/// let book_id = BookId::new("42").map_err(KeepsakeError::Validation)?;
/// let request = ExportRequest::for_book(book_id, Vec::new());
/// match assembler.export(&request).await {
///     ExportOutcome::Done(summary) => println!("wrote {}", summary.path.display()),
///     other => println!("{} ({})", other.label(), progress.snapshot().status_text),
/// }
/// # Ok(())
/// # }
/// ```
pub struct DocumentAssembler {
    tracker: Arc<ProgressTracker>,
    resolver: Arc<dyn AssetResolver>,
    renderer: Arc<dyn DocumentRenderer>,
    sink: Arc<dyn ArtifactSink>,
    options: AssemblerOptions,
    running: AtomicBool,
}

impl DocumentAssembler {
    pub fn new(
        resolver: Arc<dyn AssetResolver>,
        renderer: Arc<dyn DocumentRenderer>,
        sink: Arc<dyn ArtifactSink>,
        options: AssemblerOptions,
    ) -> Self {
        Self {
            tracker: ProgressTracker::new(),
            resolver,
            renderer,
            sink,
            options,
            running: AtomicBool::new(false),
        }
    }

    /// Wires the HTTP resolver, the Typst renderer and a directory sink
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or the configured font cannot be
    /// set up
    pub fn from_config(config: &KeepsakeConfig) -> Result<Self> {
        let resolver = HttpAssetResolver::from_config(&config.export)?;
        let renderer = TypstPdfRenderer::from_config(&config.export)?;
        let sink = DirectorySink::new(&config.export.output_dir);

        Ok(Self::new(
            Arc::new(resolver),
            Arc::new(renderer),
            Arc::new(sink),
            AssemblerOptions::from_config(config),
        ))
    }

    /// Observer view of this assembler's progress
    pub fn progress(&self) -> ProgressHandle {
        self.tracker.handle()
    }

    /// Runs one export
    ///
    /// Never returns an error: every way a run can end is an
    /// [`ExportOutcome`]. Only one run may be active at a time; a concurrent
    /// call fails without touching the progress of the active run.
    pub async fn export(&self, request: &ExportRequest) -> ExportOutcome {
        if self.running.swap(true, Ordering::SeqCst) {
            return ExportOutcome::Failed(KeepsakeError::Validation(
                "An export is already running".to_string(),
            ));
        }
        let _guard = RunGuard(&self.running);

        let started = Instant::now();
        let target = request.target().label();

        self.tracker.set_phase(ExportPhase::Counting);
        self.tracker.set_status(status::COUNTING);
        if request.is_empty() {
            tracing::info!(target_id = %target, "Nothing to export");
            self.tracker.report_empty(status::NOTHING_TO_EXPORT);
            self.tracker
                .hide_after(Duration::from_millis(self.options.progress.hide_after_empty_ms));
            return ExportOutcome::NothingToExport;
        }

        let total = count_steps(request.responses(), self.options.count_separator_steps);
        self.tracker.start(total);
        crate::log_export_start!(target, request.responses().len(), total);

        let mut layout = PageLayout::new(self.options.layout.clone());
        let mut stats = RunStats::default();

        if let Flow::Cancelled = self.lay_out(request, &mut layout, &mut stats).await {
            return self.cancelled();
        }

        // Finalizing
        self.tracker.set_phase(ExportPhase::Finalizing);
        self.tracker.set_status(status::PREPARING);
        tokio::task::yield_now().await;
        tokio::time::sleep(self.options.finalize_delay).await;
        if self.tracker.is_canceled() {
            return self.cancelled();
        }

        let document = layout.finish();
        let pages = document.page_count();
        let renderer = Arc::clone(&self.renderer);
        let bytes = match tokio::task::spawn_blocking(move || renderer.render(&document)).await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => return self.failed(e),
            Err(e) => {
                return self.failed(KeepsakeError::Render(format!("Renderer task failed: {e}")))
            }
        };

        if self.tracker.is_canceled() {
            return self.cancelled();
        }

        let file_name = request
            .target()
            .file_name(self.renderer.format_info().extension);
        let path = match self.sink.deliver(&file_name, &bytes).await {
            Ok(path) => path,
            Err(e) => return self.failed(e),
        };

        self.tracker.finish(status::DONE, true);
        self.tracker
            .hide_after(Duration::from_millis(self.options.progress.hide_after_done_ms));

        let snapshot = self.tracker.snapshot();
        let mut summary = ExportSummary::new(target, file_name).with_duration(started.elapsed());
        summary.path = path;
        summary.responses = request.responses().len();
        summary.questions = stats.questions;
        summary.total_steps = snapshot.total;
        summary.processed_steps = snapshot.processed;
        summary.images_embedded = stats.images_embedded;
        summary.images_skipped = stats.images_skipped;
        summary.pages = pages;
        summary.bytes = bytes.len();

        crate::log_export_complete!(summary.file_name, pages, summary.duration);
        summary.log_summary();
        ExportOutcome::Done(summary)
    }

    /// Walks the responses in order, advancing one step per block
    async fn lay_out(
        &self,
        request: &ExportRequest,
        layout: &mut PageLayout,
        stats: &mut RunStats,
    ) -> Flow {
        let labels = &self.options.labels;
        let single = request.target().author();

        if let Some(author) = single {
            let author = if author.trim().is_empty() {
                labels.placeholder.as_str()
            } else {
                author
            };
            layout.push_text(BlockKind::Header, &format!("{}{author}", labels.author));
        }

        for response in request.responses() {
            if self.checkpoint().await {
                return Flow::Cancelled;
            }
            layout.push_text(
                BlockKind::Header,
                &format!("{}{}", labels.target, response.target),
            );
            self.tracker.advance(1, None);

            for qa in response.questions() {
                if self.checkpoint().await {
                    return Flow::Cancelled;
                }
                layout.push_text(
                    BlockKind::Question,
                    &format!("{}{}", labels.question, qa.question),
                );
                self.tracker.advance(1, None);
                stats.questions += 1;

                if self.checkpoint().await {
                    return Flow::Cancelled;
                }
                let answer = match single {
                    Some(_) if qa.answer.trim().is_empty() => labels.placeholder.as_str(),
                    _ => qa.answer.as_str(),
                };
                layout.push_text(BlockKind::Answer, &format!("{}{answer}", labels.answer));
                self.tracker.advance(1, None);

                let Some(url) = qa.image_url() else {
                    continue;
                };

                if self.checkpoint().await {
                    return Flow::Cancelled;
                }
                if !self.options.include_images {
                    stats.images_skipped += 1;
                    self.tracker.advance(1, None);
                    continue;
                }

                self.tracker.set_status(status::LOADING_IMAGE);
                let image = self.resolver.resolve(url).await;
                if self.checkpoint().await {
                    return Flow::Cancelled;
                }

                match image {
                    Some(image) => {
                        layout.push_image(image);
                        stats.images_embedded += 1;
                    }
                    None => {
                        tracing::debug!(url = %url, "Continuing without image");
                        stats.images_skipped += 1;
                    }
                }
                self.tracker.advance(1, Some(status::GENERATING));
            }

            layout.end_response();
            if self.options.count_separator_steps {
                self.tracker.advance(1, None);
            }
        }

        Flow::Completed
    }

    /// Lets other tasks run, then reports whether cancellation was requested
    async fn checkpoint(&self) -> bool {
        tokio::task::yield_now().await;
        self.tracker.is_canceled()
    }

    fn cancelled(&self) -> ExportOutcome {
        self.tracker.finish(status::CANCELED, false);
        self.tracker
            .hide_after(Duration::from_millis(self.options.progress.hide_after_cancel_ms));

        let snapshot = self.tracker.snapshot();
        tracing::info!(
            processed = snapshot.processed,
            total = snapshot.total,
            "Export cancelled"
        );
        ExportOutcome::Cancelled {
            processed: snapshot.processed,
            total: snapshot.total,
        }
    }

    fn failed(&self, error: KeepsakeError) -> ExportOutcome {
        crate::log_error_with_context!(&error, "Document generation failed");
        self.tracker.finish(status::FAILED, false);
        ExportOutcome::Failed(error)
    }
}

/// Clears the running flag when a run ends or its future is dropped
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
