//! Export progress tracking
//!
//! [`ProgressTracker`] owns the [`ExportProgress`] of one export run and
//! publishes every change through a `tokio::sync::watch` channel. Observers
//! (the CLI progress line, tests) subscribe or take snapshots; the only
//! mutations open to them are [`ProgressHandle::request_cancel`] and
//! [`ProgressHandle::hide`].

use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Status texts shown while exporting
pub mod status {
    pub const COUNTING: &str = "Counting items...";
    pub const GENERATING: &str = "Generating PDF...";
    pub const LOADING_IMAGE: &str = "Loading image...";
    pub const PREPARING: &str = "Preparing file...";
    pub const DONE: &str = "Done";
    pub const CANCELING: &str = "Canceling...";
    pub const CANCELED: &str = "Canceled";
    pub const NOTHING_TO_EXPORT: &str = "Nothing to export";
    pub const FAILED: &str = "Error during generation";
}

/// Where the export run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportPhase {
    Idle,
    Counting,
    Running,
    Finalizing,
    Done,
    Cancelled,
    Failed,
}

impl ExportPhase {
    /// Whether the run has ended
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ExportPhase::Done | ExportPhase::Cancelled | ExportPhase::Failed
        )
    }
}

/// Snapshot of an export run's progress
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportProgress {
    /// Whether a progress display should be shown
    pub visible: bool,

    /// `round(processed / total * 100)`, clamped to 0..=100
    pub percent: u8,

    /// Completed steps; may overshoot `total`, `percent` never does
    pub processed: usize,

    /// Steps of the run, fixed once the run starts
    pub total: usize,

    /// Estimated seconds left, `None` until a step completed
    pub eta_seconds: Option<f64>,

    /// Human-readable phase description
    pub status_text: String,

    /// Set once cancellation was requested; never cleared within a run
    pub canceled: bool,

    pub phase: ExportPhase,
}

impl Default for ExportProgress {
    fn default() -> Self {
        Self {
            visible: false,
            percent: 0,
            processed: 0,
            total: 0,
            eta_seconds: None,
            status_text: String::new(),
            canceled: false,
            phase: ExportPhase::Idle,
        }
    }
}

/// Percentage of `processed` over `total`, rounded and clamped
pub fn percent_of(processed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (processed as f64 / total as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Remaining time from the average duration of the steps done so far
pub fn estimate_eta(elapsed: Duration, processed: usize, total: usize) -> Option<f64> {
    if processed == 0 {
        return None;
    }
    let per_step = elapsed.as_secs_f64() / processed as f64;
    let eta = per_step * total.saturating_sub(processed) as f64;
    eta.is_finite().then_some(eta)
}

/// Mutable progress state of export runs
///
/// One tracker serves one run at a time; [`start`](Self::start) resets it for
/// the next run.
pub struct ProgressTracker {
    state: watch::Sender<ExportProgress>,
    started_at: Mutex<Option<Instant>>,
    generation: AtomicU64,
    runs_started: AtomicUsize,
}

impl ProgressTracker {
    /// Creates a hidden, idle tracker
    pub fn new() -> Arc<Self> {
        let (state, _) = watch::channel(ExportProgress::default());
        Arc::new(Self {
            state,
            started_at: Mutex::new(None),
            generation: AtomicU64::new(0),
            runs_started: AtomicUsize::new(0),
        })
    }

    /// Read-only view with the cancel and hide entry points
    pub fn handle(self: &Arc<Self>) -> ProgressHandle {
        ProgressHandle {
            tracker: Arc::clone(self),
        }
    }

    /// Resets the state for a new run of `total` steps
    pub fn start(&self, total: usize) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.runs_started.fetch_add(1, Ordering::SeqCst);
        *self.started_at.lock().unwrap_or_else(|e| e.into_inner()) = Some(Instant::now());

        self.state.send_replace(ExportProgress {
            visible: true,
            percent: 0,
            processed: 0,
            total,
            eta_seconds: None,
            status_text: status::GENERATING.to_string(),
            canceled: false,
            phase: ExportPhase::Running,
        });

        tracing::debug!(total, "Progress run started");
    }

    /// Records `increment` completed steps, optionally replacing the status
    pub fn advance(&self, increment: usize, status_text: Option<&str>) {
        let elapsed = self.elapsed();
        self.state.send_modify(|p| {
            p.processed = p.processed.saturating_add(increment);
            p.percent = percent_of(p.processed, p.total);
            p.eta_seconds = estimate_eta(elapsed, p.processed, p.total);
            p.visible = true;
            if let Some(text) = status_text {
                p.status_text = text.to_string();
            }
        });
    }

    /// Flags the run as cancelled; the assembler notices at its next checkpoint
    ///
    /// Ignored once the run has reached a terminal phase.
    pub fn request_cancel(&self) {
        let applied = self.state.send_if_modified(|p| {
            if p.phase.is_terminal() {
                return false;
            }
            p.canceled = true;
            p.status_text = status::CANCELING.to_string();
            true
        });
        if applied {
            tracing::info!("Cancellation requested");
        }
    }

    /// Moves the run to its terminal state
    ///
    /// On success the percentage is forced to 100 and the ETA to zero.
    pub fn finish(&self, status_text: &str, success: bool) {
        self.state.send_modify(|p| {
            p.status_text = status_text.to_string();
            p.visible = true;
            if success {
                p.percent = 100;
                p.eta_seconds = Some(0.0);
                p.phase = ExportPhase::Done;
            } else if p.canceled {
                p.phase = ExportPhase::Cancelled;
            } else {
                p.phase = ExportPhase::Failed;
            }
        });
    }

    /// Hides the progress display; counters are left untouched
    pub fn hide(&self) {
        self.state.send_if_modified(|p| {
            let changed = p.visible;
            p.visible = false;
            changed
        });
    }

    /// Shows the empty-input outcome without starting a run
    pub fn report_empty(&self, status_text: &str) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.started_at.lock().unwrap_or_else(|e| e.into_inner()) = None;

        self.state.send_replace(ExportProgress {
            visible: true,
            status_text: status_text.to_string(),
            ..ExportProgress::default()
        });
    }

    /// Hides the display after `delay` unless a newer run began meanwhile
    pub fn hide_after(self: &Arc<Self>, delay: Duration) -> JoinHandle<()> {
        let generation = self.generation.load(Ordering::SeqCst);
        let tracker = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tracker.generation.load(Ordering::SeqCst) == generation {
                tracker.hide();
            }
        })
    }

    pub fn set_status(&self, status_text: &str) {
        self.state.send_if_modified(|p| {
            if p.status_text == status_text {
                return false;
            }
            p.status_text = status_text.to_string();
            true
        });
    }

    pub fn set_phase(&self, phase: ExportPhase) {
        self.state.send_if_modified(|p| {
            let changed = p.phase != phase;
            p.phase = phase;
            changed
        });
    }

    pub fn snapshot(&self) -> ExportProgress {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ExportProgress> {
        self.state.subscribe()
    }

    pub fn is_canceled(&self) -> bool {
        self.state.borrow().canceled
    }

    /// Number of runs started with [`start`](Self::start)
    pub fn runs_started(&self) -> usize {
        self.runs_started.load(Ordering::SeqCst)
    }

    fn elapsed(&self) -> Duration {
        self.started_at
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .map(|t| t.elapsed())
            .unwrap_or_default()
    }
}

/// Observer view of a [`ProgressTracker`]
#[derive(Clone)]
pub struct ProgressHandle {
    tracker: Arc<ProgressTracker>,
}

impl ProgressHandle {
    pub fn snapshot(&self) -> ExportProgress {
        self.tracker.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<ExportProgress> {
        self.tracker.subscribe()
    }

    /// Asks the running export to stop at its next checkpoint
    pub fn request_cancel(&self) {
        self.tracker.request_cancel();
    }

    /// Hides the progress display without touching the run
    pub fn hide(&self) {
        self.tracker.hide();
    }

    pub fn is_canceled(&self) -> bool {
        self.tracker.is_canceled()
    }
}
