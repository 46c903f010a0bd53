//! Progress-callback trait for per-pass extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as each record family's pass starts and finishes.
//!
//! # Why callbacks instead of channels?
//!
//! Callers can forward events to a channel, a log, or a terminal spinner
//! without the library knowing how the host application communicates. The
//! trait is `Send + Sync` because "all" mode runs passes concurrently on the
//! blocking pool.
//!
//! # Example
//!
//! ```rust
//! use curriculum_extract::{ExtractionConfig, ExtractionKind, ExtractionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     records: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for CountingCallback {
//!     fn on_pass_complete(&self, kind: ExtractionKind, records: usize) {
//!         self.records.fetch_add(records, Ordering::SeqCst);
//!         eprintln!("{kind}: {records} records");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { records: AtomicUsize::new(0) });
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::kind::ExtractionKind;
use std::sync::Arc;

/// Called by the extraction entry points around each pass.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
///
/// # Thread safety
///
/// In "all" mode `on_pass_start`, `on_pass_complete` and `on_pass_error` may
/// be called concurrently from different threads.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once before any pass starts.
    ///
    /// # Arguments
    /// * `kinds`: families that will be extracted, in assembly order
    fn on_extraction_start(&self, kinds: &[ExtractionKind]) {
        let _ = kinds;
    }

    /// Called when a pass opens its source.
    fn on_pass_start(&self, kind: ExtractionKind) {
        let _ = kind;
    }

    /// Called when a pass finishes.
    ///
    /// # Arguments
    /// * `kind`   : the record family
    /// * `records`: number of records emitted
    fn on_pass_complete(&self, kind: ExtractionKind, records: usize) {
        let _ = (kind, records);
    }

    /// Called when a pass aborts on a source failure.
    fn on_pass_error(&self, kind: ExtractionKind, error: &str) {
        let _ = (kind, error);
    }

    /// Called once after all passes have been attempted.
    ///
    /// # Arguments
    /// * `passes`       : passes attempted
    /// * `success_count`: passes that completed without error
    fn on_extraction_complete(&self, passes: usize, success_count: usize) {
        let _ = (passes, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        announced: AtomicUsize,
        starts: AtomicUsize,
        records: AtomicUsize,
        errors: Mutex<Vec<(ExtractionKind, String)>>,
        succeeded: AtomicUsize,
    }

    impl ExtractionProgressCallback for TrackingCallback {
        fn on_extraction_start(&self, kinds: &[ExtractionKind]) {
            self.announced.store(kinds.len(), Ordering::SeqCst);
        }

        fn on_pass_start(&self, _kind: ExtractionKind) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_pass_complete(&self, _kind: ExtractionKind, records: usize) {
            self.records.fetch_add(records, Ordering::SeqCst);
        }

        fn on_pass_error(&self, kind: ExtractionKind, error: &str) {
            self.errors.lock().unwrap().push((kind, error.to_string()));
        }

        fn on_extraction_complete(&self, _passes: usize, success_count: usize) {
            self.succeeded.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_extraction_start(&ExtractionKind::ALL);
        cb.on_pass_start(ExtractionKind::Program);
        cb.on_pass_complete(ExtractionKind::Program, 1);
        cb.on_pass_error(ExtractionKind::Raps, "boom");
        cb.on_extraction_complete(6, 5);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_extraction_start(&[ExtractionKind::Program, ExtractionKind::Phases]);
        tracker.on_pass_start(ExtractionKind::Program);
        tracker.on_pass_complete(ExtractionKind::Program, 1);
        tracker.on_pass_start(ExtractionKind::Phases);
        tracker.on_pass_error(ExtractionKind::Phases, "corrupt");
        tracker.on_extraction_complete(2, 1);

        assert_eq!(tracker.announced.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.records.load(Ordering::SeqCst), 1);
        assert_eq!(
            tracker.errors.lock().unwrap().as_slice(),
            &[(ExtractionKind::Phases, "corrupt".to_string())]
        );
        assert_eq!(tracker.succeeded.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_pass_start(ExtractionKind::Activities);
        cb.on_pass_complete(ExtractionKind::Activities, 12);
    }
}
