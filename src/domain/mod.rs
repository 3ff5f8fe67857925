//! Domain models and types for Keepsake.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`BookId`])
//! - **Input records** ([`ResponseRecord`], [`QuestionAnswer`]) as served by the backend
//! - **Export requests** ([`ExportRequest`], [`ExportTarget`])
//! - **Error types** ([`KeepsakeError`], [`BackendError`])
//! - **Result type alias** ([`Result`])
//!
//! # Example
//!
//! ```rust
//! use keepsake::domain::{BookId, ExportRequest, QuestionAnswer, ResponseRecord};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let record = ResponseRecord::new("Mother")
//!     .with_book_id("book-1")
//!     .with_question(QuestionAnswer::new("First memory?", "The sea"));
//!
//! let request = ExportRequest::for_book(BookId::new("book-1")?, vec![record]);
//! assert_eq!(request.responses().len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod ids;
pub mod response;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{BackendError, KeepsakeError};
pub use ids::BookId;
pub use response::{Answers, ExportRequest, ExportTarget, QuestionAnswer, ResponseRecord};
pub use result::Result;
