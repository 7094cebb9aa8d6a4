//! # Chatvault
//!
//! A Rust library for flattening a relational chat archive into a
//! self-contained document archive and browsing it without any live database
//! or server.
//!
//! ## Overview
//!
//! Chatvault has two halves sharing one document model:
//!
//! - **Export** — a concurrent pipeline that turns normalized relational
//!   rows (users, servers, channels, messages and their satellite relations)
//!   into a metadata document plus a stream of compact per-message records,
//!   in deterministic order.
//! - **View** — an in-memory engine that, given only the exported documents,
//!   resolves the channel hierarchy, filters and paginates messages, and
//!   renders text, embeds, attachments, reactions and replies into safe
//!   display markup.
//!
//! ## Exporting
//!
//! ```rust,no_run
//! use chatvault::export::{ExportOptions, export_archive};
//! use std::path::Path;
//!
//! fn main() -> chatvault::Result<()> {
//!     let archive = export_archive(Path::new("tracker.db"), &ExportOptions::new(4))?;
//!
//!     let metadata = archive.metadata_json()?;
//!     let messages = archive.message_stream();
//!     // hand both documents to whatever stores or serves them
//!     # let _ = (metadata, messages);
//!     Ok(())
//! }
//! ```
//!
//! The record stream is byte-identical for any worker count; see
//! [`export::pipeline`] for the ordering discipline behind that.
//!
//! ## Browsing
//!
//! ```rust
//! use chatvault::archive::{ArchiveMetadata, parse_message_stream};
//! use chatvault::viewer::{MessageFilter, QueryEngine};
//!
//! fn main() -> chatvault::Result<()> {
//!     let metadata = ArchiveMetadata::from_json(r#"{"users":{},"servers":{},"channels":{}}"#)?;
//!     let messages = parse_message_stream(
//!         "{\"id\":\"1\",\"c\":\"c1\",\"u\":\"u1\",\"t\":1000,\"m\":\"hello\"}\n",
//!     )?;
//!
//!     let mut engine = QueryEngine::new();
//!     engine.load_archive(metadata, messages)?;
//!     engine.set_filter(Some(MessageFilter::ByContents("hello".into())));
//!     engine.select_channel("c1");
//!     assert_eq!(engine.visible_messages().len(), 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Structure
//!
//! - [`archive`] — the shared document model
//!   - [`ArchiveMetadata`](archive::ArchiveMetadata), [`MessageDocument`](archive::MessageDocument)
//!   - [`snowflake`](archive::snowflake) — decimal-string id ordering
//! - [`export`] — the export pipeline (feature `export`)
//!   - [`SourceReader`](export::SourceReader) — bulk relational reads
//!   - [`MessageEnricher`](export::MessageEnricher) — satellite lookups
//!   - [`export_archive`](export::export_archive) — the worker pool front door
//! - [`viewer`] — the browsing engine
//!   - [`DocumentStore`](viewer::DocumentStore), [`QueryEngine`](viewer::QueryEngine)
//!   - [`ChannelHierarchy`](viewer::ChannelHierarchy) — tree reconciliation
//!   - [`MessageRenderer`](viewer::MessageRenderer) — safe display markup
//! - [`progress`] — push-based progress callbacks
//! - [`cli`] — CLI types (feature `cli`)
//! - [`error`] — unified error types ([`ChatvaultError`], [`Result`])

pub mod archive;
#[cfg(feature = "cli")]
pub mod cli;
pub mod error;
#[cfg(feature = "export")]
pub mod export;
pub mod progress;
pub mod viewer;

// Re-export the main types at the crate root for convenience
pub use error::{ChatvaultError, Result};

/// Convenient re-exports for common usage.
///
/// Import everything you need with a single line:
///
/// ```rust
/// use chatvault::prelude::*;
/// ```
pub mod prelude {
    // Error types
    pub use crate::error::{ChatvaultError, Result};

    // Document model
    pub use crate::archive::{
        ArchiveMetadata, Attachment, ChannelMeta, MessageDocument, Reaction, ServerMeta,
        UserMeta, parse_message_stream,
    };

    // Export pipeline
    #[cfg(feature = "export")]
    pub use crate::export::{ExportOptions, ExportedArchive, export_archive};

    // Viewer engine
    pub use crate::viewer::{
        ChannelHierarchy, DocumentStore, JumpLocation, MessageFilter, MessageRenderer,
        PageAction, QueryEngine, ViewerSettings,
    };

    // Progress reporting
    pub use crate::progress::{Progress, ProgressCallback, no_progress};
}
