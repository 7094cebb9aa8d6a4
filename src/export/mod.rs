//! The export pipeline: relational store in, document archive out.
//!
//! This module contains:
//! - [`reader`] - bulk one-shot queries against the source store
//! - [`enricher`] - per-message flattening with satellite lookups
//! - [`pipeline`] - the bounded worker pool with order-preserving gather
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use chatvault::export::{ExportOptions, export_archive};
//! use std::path::Path;
//!
//! # fn main() -> chatvault::Result<()> {
//! let archive = export_archive(Path::new("tracker.db"), &ExportOptions::new(4))?;
//! println!("{} messages exported", archive.message_count());
//! # Ok(())
//! # }
//! ```

pub mod enricher;
pub mod pipeline;
pub mod reader;

pub use enricher::MessageEnricher;
pub use pipeline::{ExportOptions, ExportedArchive, export_archive, run_pipeline};
pub use reader::{MessageRow, SourceReader, TableCounts};
