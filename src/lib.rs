//! # pagebind
//!
//! Assemble page images into a single multi-page PDF.
//!
//! ## Why this crate?
//!
//! Online book readers and scanned archives often expose each page as a
//! separate image, sometimes only reachable from a logged-in browser. This
//! crate collects those pages from wherever they come from (image URLs,
//! data URLs pasted from a browser console, screen captures) into an ordered,
//! de-duplicated list, then binds them into one PDF where every page keeps
//! its source image's own size and orientation.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PageCollection ── snapshot ──▶ Compiler
//!                                  │  for each entry, in order:
//!                                  ├─ 1. Resolve  fetch URL or parse data URL
//!                                  ├─ 2. Decode   image bytes → pixels (spawn_blocking)
//!                                  ├─ 3. Layout   page size = pixel size
//!                                  ├─ 4. Append   draw image edge to edge
//!                                  │     (failure → "Error loading page N" placeholder)
//!                                  └─ 5. Progress i/N, reaching exactly 1.0
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pagebind::{compile_to_file, CompileConfig, PageCollection};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut pages = PageCollection::new();
//!     pages.add_page("https://example.com/book/page-1.jpg");
//!     pages.add_page("https://example.com/book/page-2.jpg");
//!
//!     let config = CompileConfig::default();
//!     let stats = compile_to_file(&pages.snapshot(), "captured-book.pdf", &config).await?;
//!     eprintln!("{} pages, {} placeholders", stats.total_pages, stats.placeholder_pages);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pagebind` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pagebind = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod capture;
pub mod collection;
pub mod compile;
pub mod config;
pub mod error;
pub mod import;
pub mod output;
pub mod payload;
pub mod pipeline;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use capture::{CaptureSession, FrameSource, ScreenshotFileSource, StreamState};
pub use collection::{MoveDirection, PageCollection, PageEntry, PageId, PageSnapshot, PageSource};
pub use compile::{compile, compile_sync, compile_to_file, Compiler};
pub use config::{CompileConfig, CompileConfigBuilder, DEFAULT_OUTPUT_FILENAME};
pub use error::{FetchFailure, PageError, PagebindError};
pub use import::parse_bulk_payload;
pub use output::{CompileStats, CompiledDocument, PageOutcome};
pub use pipeline::layout::{Orientation, PageGeometry, A4_PORTRAIT, LETTER_PORTRAIT};
pub use pipeline::resolve::{FetchedImage, ImageFetcher, ReqwestFetcher};
pub use progress::{CompileProgressCallback, NoopProgressCallback, Progress, ProgressCallback};
pub use stream::{compile_stream, CompileEvent, CompileStream};
