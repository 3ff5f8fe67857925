//! Export command implementation
//!
//! This module implements the `export` command, which renders the responses
//! of one book (or a single response) into a PDF file.

use crate::adapters::backend::models::ResponsesBody;
use crate::adapters::backend::BackendClient;
use crate::config::{load_config, KeepsakeConfig};
use crate::core::export::{DocumentAssembler, ExportOutcome, ExportProgress};
use crate::domain::{BookId, ExportRequest, KeepsakeError, ResponseRecord};
use clap::Args;
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::watch;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Book whose responses are exported
    #[arg(long)]
    pub book_id: String,

    /// Owner of the responses; required unless --input is given
    #[arg(long, required_unless_present = "input")]
    pub user_id: Option<String>,

    /// Read response records from a JSON file instead of the backend
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Export only this response
    #[arg(long)]
    pub response_id: Option<String>,

    /// Author name used in single-response file names
    #[arg(long)]
    pub username: Option<String>,

    /// Override the output directory
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Do not fetch or embed images
    #[arg(long)]
    pub no_images: bool,

    /// Do not print the progress line
    #[arg(short, long)]
    pub quiet: bool,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        if let Some(dir) = &self.output_dir {
            tracing::info!(output_dir = %dir, "Overriding output directory from CLI");
            config.export.output_dir = dir.clone();
        }
        if self.no_images {
            tracing::info!("Disabling images from CLI");
            config.export.include_images = false;
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2); // Configuration error exit code
        }

        let book_id = match BookId::new(self.book_id.clone()) {
            Ok(id) => id,
            Err(e) => {
                eprintln!("Invalid book id: {e}");
                return Ok(2);
            }
        };

        let records = match self.load_records(&config, &book_id).await {
            Ok(records) => records,
            Err(e) if e.is_connection_error() => {
                tracing::error!(error = %e, "Backend unreachable");
                eprintln!("Failed to reach backend: {e}");
                return Ok(4); // Connection error exit code
            }
            Err(e @ KeepsakeError::Backend(_)) => {
                tracing::error!(error = %e, "Failed to fetch responses");
                eprintln!("Failed to fetch responses: {e}");
                return Ok(5);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to read responses");
                eprintln!("Failed to read responses: {e}");
                return Ok(5);
            }
        };

        let request = match &self.response_id {
            Some(response_id) => {
                let Some(record) = records
                    .into_iter()
                    .find(|r| r.id.as_deref() == Some(response_id.as_str()))
                else {
                    eprintln!("Response {response_id} not found in book {book_id}");
                    return Ok(2);
                };
                let username = self.resolve_username(&config).await;
                ExportRequest::single_response(record, username)
            }
            None => ExportRequest::for_book(book_id, records),
        };

        let assembler = match DocumentAssembler::from_config(&config) {
            Ok(a) => a,
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize export");
                eprintln!("Failed to initialize export: {e}");
                return Ok(match e {
                    KeepsakeError::Configuration(_) => 2,
                    _ => 5,
                });
            }
        };

        if *shutdown_signal.borrow() {
            println!("Export cancelled before it started. No file was written.");
            return Ok(130);
        }

        // Ctrl+C / SIGTERM cancel the run at its next checkpoint
        let progress = assembler.progress();
        let canceller = {
            let progress = progress.clone();
            let mut shutdown = shutdown_signal;
            tokio::spawn(async move {
                while shutdown.changed().await.is_ok() {
                    if *shutdown.borrow() {
                        progress.request_cancel();
                        break;
                    }
                }
            })
        };

        let printer = (!self.quiet).then(|| {
            let mut rx = progress.subscribe();
            tokio::spawn(async move {
                while rx.changed().await.is_ok() {
                    let line = progress_line(&rx.borrow_and_update());
                    print!("\r{line:<72}");
                    let _ = std::io::stdout().flush();
                }
            })
        });

        let outcome = assembler.export(&request).await;

        canceller.abort();
        if let Some(printer) = printer {
            printer.abort();
            println!("\r{:<72}", progress_line(&progress.snapshot()));
            println!();
        }

        let exit_code = match outcome {
            ExportOutcome::Done(summary) => {
                println!("Export Summary:");
                println!("  File: {}", summary.path.display());
                println!("  Responses: {}", summary.responses);
                println!("  Questions: {}", summary.questions);
                println!(
                    "  Images: {} embedded, {} skipped",
                    summary.images_embedded, summary.images_skipped
                );
                println!("  Pages: {}", summary.pages);
                println!("  Size: {} bytes", summary.bytes);
                println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
                0
            }
            ExportOutcome::Cancelled { processed, total } => {
                println!("Export cancelled after {processed}/{total} steps. No file was written.");
                tracing::info!("Export interrupted by user signal");
                130 // SIGINT exit code (standard Unix convention)
            }
            ExportOutcome::NothingToExport => {
                println!("Nothing to export for {}", request.target().label());
                0
            }
            ExportOutcome::Failed(e) => {
                eprintln!("Export failed: {e}");
                5 // Fatal error exit code
            }
        };

        Ok(exit_code)
    }

    async fn load_records(
        &self,
        config: &KeepsakeConfig,
        book_id: &BookId,
    ) -> crate::domain::Result<Vec<ResponseRecord>> {
        if let Some(path) = &self.input {
            tracing::info!(path = %path.display(), "Reading responses from file");
            let contents = tokio::fs::read_to_string(path).await?;
            return parse_records(&contents);
        }

        let user_id = self.user_id.as_deref().ok_or_else(|| {
            KeepsakeError::Validation("--user-id is required without --input".to_string())
        })?;
        let client = BackendClient::new(config.backend.clone())?;
        client.fetch_book_responses(user_id, book_id).await
    }

    /// Name for single-response file names: flag, then backend, then user id
    async fn resolve_username(&self, config: &KeepsakeConfig) -> String {
        if let Some(name) = &self.username {
            return name.clone();
        }
        let Some(user_id) = self.user_id.as_deref() else {
            return "user".to_string();
        };
        if self.input.is_none() {
            let lookup = match BackendClient::new(config.backend.clone()) {
                Ok(client) => client.find_username(user_id).await,
                Err(e) => Err(e),
            };
            match lookup {
                Ok(Some(name)) => return name,
                Ok(None) => tracing::warn!(user_id = %user_id, "User not found"),
                Err(e) => tracing::warn!(error = %e, "Failed to look up username"),
            }
        }
        user_id.to_string()
    }
}

/// Parses a bare array of records or an object with a `responses` array
fn parse_records(contents: &str) -> crate::domain::Result<Vec<ResponseRecord>> {
    let body: ResponsesBody = serde_json::from_str(contents)?;
    Ok(body.into_records())
}

/// One-line rendering of a progress snapshot
fn progress_line(progress: &ExportProgress) -> String {
    let eta = progress
        .eta_seconds
        .map(|eta| format!(" (ETA {eta:.1}s)"))
        .unwrap_or_default();
    format!(
        "[{:>3}%] {}/{} {}{}",
        progress.percent, progress.processed, progress.total, progress.status_text, eta
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::export::ExportPhase;

    #[test]
    fn test_progress_line() {
        let progress = ExportProgress {
            visible: true,
            percent: 50,
            processed: 7,
            total: 14,
            eta_seconds: Some(1.34),
            status_text: "Generating PDF...".to_string(),
            canceled: false,
            phase: ExportPhase::Running,
        };
        assert_eq!(
            progress_line(&progress),
            "[ 50%] 7/14 Generating PDF... (ETA 1.3s)"
        );
    }

    #[test]
    fn test_progress_line_without_eta() {
        let progress = ExportProgress {
            total: 3,
            status_text: "Generating PDF...".to_string(),
            ..ExportProgress::default()
        };
        assert_eq!(progress_line(&progress), "[  0%] 0/3 Generating PDF...");
    }

    #[test]
    fn test_parse_records_accepts_both_shapes() {
        let bare = r#"[{"id": 1, "target": "Mother", "answers": {"questions": []}}]"#;
        let wrapped = r#"{"responses": [{"id": "2", "target": "Dad"}]}"#;

        let records = parse_records(bare).unwrap();
        assert_eq!(records[0].id.as_deref(), Some("1"));
        assert_eq!(parse_records(wrapped).unwrap()[0].target, "Dad");
    }

    fn write_config(dir: &tempfile::TempDir, base_url: &str) -> String {
        let path = dir.path().join("keepsake.toml");
        let contents = format!(
            r#"
[backend]
base_url = "{base_url}"
timeout_seconds = 5

[backend.retry]
max_retries = 1

[export]
output_dir = "{}"
"#,
            dir.path().join("out").display()
        );
        std::fs::write(&path, contents).unwrap();
        path.to_string_lossy().to_string()
    }

    fn backend_args() -> ExportArgs {
        ExportArgs {
            book_id: "7".to_string(),
            user_id: Some("3".to_string()),
            input: None,
            response_id: None,
            username: None,
            output_dir: None,
            no_images: false,
            quiet: true,
        }
    }

    async fn run(args: &ExportArgs, config_path: &str) -> i32 {
        let (_tx, rx) = watch::channel(false);
        args.execute(config_path, rx).await.unwrap()
    }

    #[tokio::test]
    async fn test_backend_not_found_is_generation_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/user-responses/3/7")
            .with_status(404)
            .create_async()
            .await;
        let dir = tempfile::TempDir::new().unwrap();
        let config = write_config(&dir, &server.url());

        assert_eq!(run(&backend_args(), &config).await, 5);
    }

    #[tokio::test]
    async fn test_backend_bad_body_is_generation_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/user-responses/3/7")
            .with_status(200)
            .with_body("<html>oops</html>")
            .create_async()
            .await;
        let dir = tempfile::TempDir::new().unwrap();
        let config = write_config(&dir, &server.url());

        assert_eq!(run(&backend_args(), &config).await, 5);
    }

    #[tokio::test]
    async fn test_unreachable_backend_exits_with_connection_code() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = write_config(&dir, "http://127.0.0.1:9");

        assert_eq!(run(&backend_args(), &config).await, 4);
    }

    #[tokio::test]
    async fn test_backend_records_export_done() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/user-responses/3/7")
            .with_status(200)
            .with_body(r#"[{"id": 1, "book_id": 7, "target": "Mother", "answers": {"questions": [{"question": "Q", "answer": "A"}]}}]"#)
            .create_async()
            .await;
        let dir = tempfile::TempDir::new().unwrap();
        let config = write_config(&dir, &server.url());

        assert_eq!(run(&backend_args(), &config).await, 0);
        assert!(dir.path().join("out").join("book_7_responses.pdf").exists());
    }

    #[test]
    fn test_parse_records_rejects_garbage() {
        assert!(matches!(
            parse_records("not json"),
            Err(KeepsakeError::Serialization(_))
        ));
    }
}
