//! Progress-callback trait for batch conversion events.
//!
//! Pass an [`Arc<dyn BatchProgressCallback>`] to [`crate::convert_batch`] to
//! receive an event as each file starts, finishes or fails. Callers forward
//! these to a progress bar, a log, a channel, whatever they like; the library
//! does not care.
//!
//! # Example
//!
//! ```rust
//! use edgequake_fileconv::BatchProgressCallback;
//! use std::path::Path;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct Counter(AtomicUsize);
//!
//! impl BatchProgressCallback for Counter {
//!     fn on_file_complete(&self, _index: usize, _total: usize, _input: &Path, _output: &Path) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by [`crate::convert_batch`] as it works through its requests.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
///
/// # Thread safety
///
/// Files are converted concurrently, so `on_file_start`,
/// `on_file_complete` and `on_file_error` may be called from different
/// threads at once, and not in index order. Protect shared state with
/// `Mutex` or atomics.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before any file is touched.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called just before a file is read.
    ///
    /// # Arguments
    /// * `index` — 1-indexed position of the file in the batch
    /// * `total` — number of files in the batch
    fn on_file_start(&self, index: usize, total: usize, input: &Path) {
        let _ = (index, total, input);
    }

    /// Called when a file converted successfully.
    fn on_file_complete(&self, index: usize, total: usize, input: &Path, output: &Path) {
        let _ = (index, total, input, output);
    }

    /// Called when a file failed.
    ///
    /// # Arguments
    /// * `error` — human-readable error description
    fn on_file_error(&self, index: usize, total: usize, input: &Path, error: &str) {
        let _ = (index, total, input, error);
    }

    /// Called once after every file has been attempted.
    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let _ = (total_files, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Shared, type-erased callback as accepted by [`crate::convert_batch`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
