//! Progress reporting for the export pipeline.
//!
//! The pipeline pushes one [`Progress`] update per finished message through a
//! callback, so callers can drive a progress display without polling.
//!
//! # Example
//!
//! ```rust
//! use chatvault::progress::{Progress, ProgressCallback};
//! use std::sync::Arc;
//!
//! let callback: ProgressCallback = Arc::new(|progress| {
//!     if let Some(pct) = progress.percentage() {
//!         eprintln!("Progress: {:.1}%", pct);
//!     }
//! });
//!
//! callback(Progress::new(50, 200));
//! ```

use std::sync::Arc;

/// Progress information for an export run.
#[derive(Debug, Clone, Copy, Default)]
pub struct Progress {
    /// Number of messages processed so far.
    pub items_processed: usize,

    /// Total messages to process, if known.
    pub total_items: Option<usize>,
}

impl Progress {
    /// Creates a progress instance with a known total.
    pub fn new(items_processed: usize, total_items: usize) -> Self {
        Self {
            items_processed,
            total_items: Some(total_items),
        }
    }

    /// Returns the progress as a percentage (0.0 - 100.0).
    ///
    /// Returns `None` if the total is not known.
    pub fn percentage(&self) -> Option<f64> {
        self.total_items.map(|total| {
            if total == 0 {
                100.0
            } else {
                (self.items_processed as f64 / total as f64) * 100.0
            }
        })
    }

    /// Returns whether the run is complete.
    pub fn is_complete(&self) -> bool {
        self.total_items
            .map(|total| self.items_processed >= total)
            .unwrap_or(false)
    }
}

/// Callback type for receiving progress updates.
///
/// Thread-safe so the pipeline may invoke it from its gather loop while
/// workers are still running.
pub type ProgressCallback = Arc<dyn Fn(Progress) + Send + Sync>;

/// Creates a no-op progress callback.
///
/// Useful when you don't need progress updates but an API requires a
/// callback.
pub fn no_progress() -> ProgressCallback {
    Arc::new(|_| {})
}

/// Creates a progress callback that prints a counter to stderr.
///
/// This is what the CLI uses: a single self-overwriting line in the style of
/// `Parsing messages 42 of 1000...`.
pub fn stderr_progress() -> ProgressCallback {
    Arc::new(|progress| {
        if let Some(total) = progress.total_items {
            eprint!(
                "\rParsing messages {} of {}...",
                progress.items_processed, total
            );
            if progress.is_complete() {
                eprintln!("Done");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percentage() {
        let progress = Progress::new(50, 100);
        assert_eq!(progress.percentage(), Some(50.0));
    }

    #[test]
    fn test_progress_percentage_unknown_total() {
        let progress = Progress {
            items_processed: 50,
            total_items: None,
        };
        assert_eq!(progress.percentage(), None);
        assert!(!progress.is_complete());
    }

    #[test]
    fn test_progress_percentage_zero_total() {
        let progress = Progress::new(0, 0);
        assert_eq!(progress.percentage(), Some(100.0));
        assert!(progress.is_complete());
    }

    #[test]
    fn test_no_progress_callback() {
        let callback = no_progress();
        callback(Progress::default()); // Should not panic
    }

    #[test]
    fn test_progress_callback_type() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let callback: ProgressCallback = Arc::new(move |progress| {
            counter_clone.store(progress.items_processed, Ordering::SeqCst);
        });

        callback(Progress::new(42, 100));
        assert_eq!(counter.load(Ordering::SeqCst), 42);
    }
}
