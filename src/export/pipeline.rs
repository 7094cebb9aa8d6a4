//! Concurrent flattening of the full message set.
//!
//! The pipeline fans message rows out to a bounded pool of workers, each
//! owning its own store connection, and gathers the produced records back
//! into input order through a reordering buffer. The emitted stream is
//! byte-identical for any worker count - determinism is part of the archive
//! contract, not an accident of scheduling.
//!
//! There is no cancellation, timeout or retry: a run either completes fully
//! or fails fully, and on failure no archive is produced.

use std::collections::BTreeMap;
use std::path::Path;
use std::thread;

use crate::archive::ArchiveMetadata;
use crate::error::{ChatvaultError, Result};
use crate::export::enricher::MessageEnricher;
use crate::export::reader::{MessageRow, SourceReader};
use crate::progress::{Progress, ProgressCallback, no_progress};

/// Options for an export run.
#[derive(Clone)]
pub struct ExportOptions {
    /// Number of pipeline workers; clamped to at least 1.
    pub workers: usize,

    /// Callback invoked once per flattened message.
    pub progress: ProgressCallback,
}

impl ExportOptions {
    /// Creates options with the given worker count and no progress output.
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            progress: no_progress(),
        }
    }

    /// Builder method to set the progress callback.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = progress;
        self
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::new(4)
    }
}

/// The result of a completed export run: the metadata document plus the
/// ordered message record stream.
#[derive(Debug, Clone)]
pub struct ExportedArchive {
    /// Complete metadata document.
    pub metadata: ArchiveMetadata,

    /// One compact record per message, ascending by source timestamp.
    pub records: Vec<String>,
}

impl ExportedArchive {
    /// Serializes the metadata document.
    pub fn metadata_json(&self) -> Result<String> {
        self.metadata.to_json()
    }

    /// Joins the records into the newline-delimited message stream.
    pub fn message_stream(&self) -> String {
        self.records.join("\n")
    }

    /// Number of exported messages.
    pub fn message_count(&self) -> usize {
        self.records.len()
    }
}

/// Runs the full export: metadata fetch, then the concurrent message
/// pipeline.
///
/// Fails before producing any output if the store cannot be opened or read;
/// fails without an archive if any single message cannot be enriched.
pub fn export_archive(db_path: &Path, options: &ExportOptions) -> Result<ExportedArchive> {
    let reader = SourceReader::open(db_path)?;
    let metadata = reader.fetch_metadata()?;
    let rows = reader.fetch_message_rows()?;
    drop(reader);

    let records = run_pipeline(db_path, rows, options)?;
    Ok(ExportedArchive { metadata, records })
}

/// Applies the enricher across all rows with a bounded worker pool,
/// preserving input order in the output.
pub fn run_pipeline(
    db_path: &Path,
    rows: Vec<MessageRow>,
    options: &ExportOptions,
) -> Result<Vec<String>> {
    let total = rows.len();
    if total == 0 {
        return Ok(Vec::new());
    }

    let workers = options.workers.max(1);

    // Every worker connection is acquired up front so an unopenable store
    // fails the run before any unit of work is submitted.
    let mut enrichers = Vec::with_capacity(workers);
    for _ in 0..workers {
        enrichers.push(MessageEnricher::open(db_path)?);
    }

    let (task_tx, task_rx) = crossbeam_channel::bounded::<(usize, MessageRow)>(workers * 2);
    let (done_tx, done_rx) = crossbeam_channel::unbounded::<(usize, Result<String>)>();

    let mut out: Vec<String> = Vec::with_capacity(total);
    let mut first_error: Option<(usize, ChatvaultError)> = None;

    thread::scope(|scope| {
        for enricher in enrichers {
            let task_rx = task_rx.clone();
            let done_tx = done_tx.clone();
            scope.spawn(move || {
                for (index, row) in task_rx {
                    let result = enricher.enrich(&row).and_then(|doc| doc.to_record());
                    if done_tx.send((index, result)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(task_rx);
        drop(done_tx);

        // Feed in input order from a dedicated thread; the bounded queue
        // keeps memory flat while the gather below drains results.
        scope.spawn(move || {
            for item in rows.into_iter().enumerate() {
                if task_tx.send(item).is_err() {
                    break;
                }
            }
        });

        // Gather: emit contiguously from `next_index`, holding out-of-order
        // completions in a buffer until their turn comes.
        let mut pending: BTreeMap<usize, String> = BTreeMap::new();
        let mut next_index = 0usize;
        let mut finished = 0usize;

        for (index, result) in done_rx {
            finished += 1;
            (options.progress)(Progress::new(finished, total));

            match result {
                Ok(record) => {
                    if first_error.is_some() {
                        continue;
                    }
                    if index == next_index {
                        out.push(record);
                        next_index += 1;
                        while let Some(record) = pending.remove(&next_index) {
                            out.push(record);
                            next_index += 1;
                        }
                    } else {
                        pending.insert(index, record);
                    }
                }
                Err(error) => {
                    // keep the earliest failure in input order, so the
                    // reported message does not depend on scheduling
                    let replace = first_error
                        .as_ref()
                        .is_none_or(|(first, _)| index < *first);
                    if replace {
                        first_error = Some((index, error));
                    }
                }
            }
        }
    });

    match first_error {
        Some((_, error)) => Err(error),
        None => {
            debug_assert_eq!(out.len(), total);
            Ok(out)
        }
    }
}
