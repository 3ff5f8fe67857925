//! Core business logic for Keepsake.
//!
//! # Modules
//!
//! - [`export`] - Progress tracking, layout, rendering and the export state machine
//!
//! # Export Workflow
//!
//! 1. **Count**: Derive the total number of steps from the request
//! 2. **Lay out**: Walk responses in order, fetching images as they come up
//! 3. **Finalize**: Render the document and hand it to the output sink
//! 4. **Report**: Publish the terminal status and log a summary
//!
//! # Example
//!
//! ```rust,no_run
//! use keepsake::config::load_config;
//! use keepsake::core::export::DocumentAssembler;
//! use keepsake::domain::{BookId, ExportRequest, QuestionAnswer, ResponseRecord};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("keepsake.toml")?;
//! let assembler = DocumentAssembler::from_config(&config)?;
//!
//! let record = ResponseRecord::new("Mother")
//!     .with_question(QuestionAnswer::new("First memory?", "The sea"));
//! let request = ExportRequest::for_book(BookId::new("1")?, vec![record]);
//!
//! let outcome = assembler.export(&request).await;
//! println!("{}", outcome.label());
//! # Ok(())
//! # }
//! ```

pub mod export;
