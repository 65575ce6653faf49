//! Progress-callback trait for batch processing events.
//!
//! Pass an [`Arc<dyn ProcessingProgressCallback>`] to
//! [`crate::directory::DirectoryProcessor::with_progress`] to receive events
//! as each file of a directory run is processed. The CLI forwards them to an
//! `indicatif` progress bar; a library caller might forward them to a channel
//! or a log instead.
//!
//! # Example
//!
//! ```rust
//! use textcleaner::{ProcessingProgressCallback, ProcessingResult};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     failed: AtomicUsize,
//! }
//!
//! impl ProcessingProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, result: &ProcessingResult) {
//!         if !result.success {
//!             self.failed.fetch_add(1, Ordering::SeqCst);
//!         }
//!     }
//! }
//!
//! let counter: Arc<dyn ProcessingProgressCallback> =
//!     Arc::new(CountingCallback { failed: AtomicUsize::new(0) });
//! ```

use crate::output::ProcessingResult;
use std::path::Path;
use std::sync::Arc;

/// Called by the directory processor as it works through a batch.
///
/// Files are processed concurrently, so `on_file_start` and
/// `on_file_complete` may be called from several worker threads at once.
/// All methods default to no-ops.
pub trait ProcessingProgressCallback: Send + Sync {
    /// Called once after discovery, before any file is processed.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called just before a file enters the single-file processor.
    fn on_file_start(&self, path: &Path) {
        let _ = path;
    }

    /// Called with every file's result, successful or not.
    fn on_file_complete(&self, result: &ProcessingResult) {
        let _ = result;
    }

    /// Called once after every discovered file has a result.
    fn on_batch_complete(&self, succeeded: usize, failed: usize) {
        let _ = (succeeded, failed);
    }
}

/// A no-op implementation; the default when no callback is configured.
pub struct NoopProgressCallback;

impl ProcessingProgressCallback for NoopProgressCallback {}

/// Shared callback handle as stored by the directory processor.
pub type ProgressCallback = Arc<dyn ProcessingProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        total: AtomicUsize,
        starts: AtomicUsize,
        completes: AtomicUsize,
        failures: AtomicUsize,
        final_ok: AtomicUsize,
    }

    impl ProcessingProgressCallback for TrackingCallback {
        fn on_batch_start(&self, total_files: usize) {
            self.total.store(total_files, Ordering::SeqCst);
        }

        fn on_file_start(&self, _path: &Path) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_complete(&self, result: &ProcessingResult) {
            self.completes.fetch_add(1, Ordering::SeqCst);
            if !result.success {
                self.failures.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn on_batch_complete(&self, succeeded: usize, _failed: usize) {
            self.final_ok.store(succeeded, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(2);
        cb.on_file_start(Path::new("a.txt"));
        cb.on_file_complete(&ProcessingResult::failed("a.txt", "bad"));
        cb.on_batch_complete(1, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_batch_start(2);
        tracker.on_file_start(Path::new("a.txt"));
        tracker.on_file_complete(&ProcessingResult::failed("a.txt", "corrupt"));
        tracker.on_file_start(Path::new("b.txt"));
        tracker.on_file_complete(&ProcessingResult::succeeded(
            "b.txt",
            "b.md",
            Default::default(),
            Default::default(),
        ));
        tracker.on_batch_complete(1, 1);

        assert_eq!(tracker.total.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.failures.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.final_ok.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_batch_start(10);
        cb.on_file_start(Path::new("x.md"));
    }
}
