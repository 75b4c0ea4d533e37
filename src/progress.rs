//! Progress-callback trait for per-page compile events.
//!
//! Inject an [`Arc<dyn CompileProgressCallback>`] via
//! [`crate::config::CompileConfigBuilder::progress_callback`] to receive
//! events as the compiler works through the snapshot.
//!
//! Pages are processed strictly in order, so events for page *N + 1* are
//! never emitted before page *N* has been appended. After every page,
//! success or placeholder, [`CompileProgressCallback::on_progress`] reports
//! the completed count; the last call always has `completed == total`.
//!
//! # Example
//!
//! ```rust
//! use pagebind::{CompileConfig, CompileProgressCallback, Progress};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl CompileProgressCallback for Printer {
//!     fn on_progress(&self, progress: Progress) {
//!         eprintln!("{:.0}% complete", progress.percent());
//!     }
//! }
//!
//! let config = CompileConfig::builder()
//!     .progress_callback(Arc::new(Printer))
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Completed-over-total counter for one compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn new(completed: usize, total: usize) -> Self {
        Self { completed, total }
    }

    /// Completion in `[0, 1]`; exactly `1.0` once every page is done.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 || self.completed >= self.total {
            return 1.0;
        }
        self.completed as f64 / self.total as f64
    }

    /// Completion in `[0, 100]`.
    pub fn percent(&self) -> f64 {
        self.fraction() * 100.0
    }

    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }
}

/// Called by the compiler as it processes each entry.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. `page_num` is always 1-based.
pub trait CompileProgressCallback: Send + Sync {
    /// Called once before the first entry is resolved.
    fn on_compile_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called when an entry starts resolving.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when an entry's image page has been appended.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, width: u32, height: u32) {
        let _ = (page_num, total_pages, width, height);
    }

    /// Called when an entry failed and a placeholder page was appended instead.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called after every entry, success or placeholder.
    fn on_progress(&self, progress: Progress) {
        let _ = progress;
    }

    /// Called once after every entry has been processed.
    fn on_compile_complete(&self, total_pages: usize, success_count: usize) {
        let _ = (total_pages, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl CompileProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::CompileConfig`].
pub type ProgressCallback = Arc<dyn CompileProgressCallback>;
