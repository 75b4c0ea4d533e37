//! Error types for the pagebind library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`PagebindError`]: **Rejecting**: an acquisition attempt or a whole
//!   compilation cannot proceed (malformed bulk payload, inactive capture
//!   stream, a second compilation while one is in flight, output not
//!   writable). The collection is left exactly as it was.
//!
//! * [`PageError`]: **Non-fatal**: a single entry could not be fetched or
//!   decoded. The compiler substitutes a placeholder page and stores the
//!   error in [`crate::output::PageOutcome`]; it is never propagated.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned from acquisition and top-level compile operations.
///
/// Per-entry failures during compilation use [`PageError`] and are stored in
/// [`crate::output::PageOutcome`] rather than propagated here.
#[derive(Debug, Error)]
pub enum PagebindError {
    // ── Acquisition errors ────────────────────────────────────────────────
    /// Bulk-import text was not a JSON array of inline image payloads.
    #[error("Invalid bulk import payload: {reason}\nPaste the data exactly as copied from the console.")]
    BulkImportRejected { reason: String },

    /// The capture source could not be started (permission denied, missing).
    #[error("Could not start screen capture: {reason}")]
    CaptureFailed { reason: String },

    /// A frame was requested while the capture stream is paused, ended or stopped.
    #[error("Capture stream is not active.")]
    CaptureInactive,

    /// The active stream refused to hand over a frame.
    #[error("Could not capture frame: {detail}")]
    FrameGrabFailed { detail: String },

    // ── Compilation errors ────────────────────────────────────────────────
    /// Another compilation on the same compiler has not finished yet.
    #[error("A document is already being generated; wait for it to finish")]
    CompilationInProgress,

    /// The snapshot handed to the compiler contained no entries.
    #[error("Add at least one page before generating a document")]
    NothingToCompile,

    /// The PDF writer failed while assembling or serialising the document.
    #[error("PDF assembly failed: {0}")]
    PdfAssembly(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output document.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<lopdf::Error> for PagebindError {
    fn from(e: lopdf::Error) -> Self {
        PagebindError::PdfAssembly(e.to_string())
    }
}

/// A non-fatal error for a single entry.
///
/// `page` is the 1-based ordinal of the entry in the compiled snapshot and
/// `label` names the entry in logs: the URL for remote entries, a generic
/// "captured image" label for inline ones.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The remote locator could not be fetched.
    #[error("Page {page}: failed to fetch {label}: {reason}")]
    FetchFailed {
        page: usize,
        label: String,
        reason: String,
    },

    /// The inline payload is not a well-formed base64 data URL.
    #[error("Page {page}: malformed image payload: {detail}")]
    InvalidPayload { page: usize, detail: String },

    /// The bytes were resolved but are not a decodable image.
    #[error("Page {page}: could not decode {label}: {detail}")]
    DecodeFailed {
        page: usize,
        label: String,
        detail: String,
    },
}

impl PageError {
    /// 1-based ordinal of the failed page.
    pub fn page(&self) -> usize {
        match self {
            PageError::FetchFailed { page, .. }
            | PageError::InvalidPayload { page, .. }
            | PageError::DecodeFailed { page, .. } => *page,
        }
    }
}

/// Transport-level failure reported by an [`crate::pipeline::resolve::ImageFetcher`].
///
/// The `Display` output is the textual reason carried into
/// [`PageError::FetchFailed`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    /// The server answered with a non-success status.
    #[error("HTTP {status}")]
    Status { status: u16 },

    /// Connection, TLS or body read failure.
    #[error("{0}")]
    Transport(String),

    /// The request exceeded the configured fetch timeout.
    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },
}
