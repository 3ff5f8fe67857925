//! External system integrations for Keepsake.
//!
//! - [`backend`] - REST backend holding users and their book responses
//! - [`images`] - Image fetching and decoding for answer illustrations
//! - [`output`] - Delivery of finished documents
//!
//! # Design Pattern
//!
//! Each adapter sits behind a trait ([`images::AssetResolver`],
//! [`output::ArtifactSink`]) so the export engine can be driven by in-memory
//! fakes in tests.
//!
//! ```rust,no_run
//! use keepsake::adapters::images::{AssetResolver, HttpAssetResolver};
//! use keepsake::adapters::output::{ArtifactSink, DirectorySink};
//! use std::time::Duration;
//!
//! # async fn example() -> keepsake::domain::Result<()> {
//! let resolver = HttpAssetResolver::new(Duration::from_secs(8))?;
//! let sink = DirectorySink::new("./exports");
//!
//! if resolver.resolve("https://img.example.com/a.png").await.is_some() {
//!     sink.deliver("book_1_responses.pdf", b"%PDF").await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod images;
pub mod output;
