//! Eager compilation: walk a snapshot and return the finished PDF.
//!
//! ## Why strictly sequential?
//!
//! Output pages must appear in collection order and every page has its own
//! size, so each entry is resolved, decoded, measured and appended before the
//! next one starts. One slow or broken entry therefore delays the rest, but
//! never reorders or aborts them: a failed entry becomes a default-sized
//! placeholder page marked "Error loading page N".
//!
//! ## One compilation at a time
//!
//! A [`Compiler`] refuses a second [`Compiler::compile`] while one is in
//! flight. The flag is shared between clones, so a clone moved into a
//! background task (see [`crate::stream::compile_stream`]) is covered too.

use crate::collection::{PageEntry, PageSnapshot};
use crate::config::CompileConfig;
use crate::error::{PageError, PagebindError};
use crate::output::{CompileStats, CompiledDocument, PageOutcome};
use crate::pipeline::decode::{decode_image, DecodedImage};
use crate::pipeline::document::PdfAssembler;
use crate::pipeline::layout::PageGeometry;
use crate::pipeline::resolve::{resolve_source, ImageFetcher, ReqwestFetcher};
use crate::progress::{Progress, ProgressCallback};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Top-left offset of the placeholder marker, in points (10 mm).
pub const PLACEHOLDER_MARGIN: f32 = 28.35;

/// Compiles page snapshots into PDF documents.
#[derive(Clone)]
pub struct Compiler {
    fetcher: Arc<dyn ImageFetcher>,
    config: CompileConfig,
    generating: Arc<AtomicBool>,
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler")
            .field("config", &self.config)
            .field("generating", &self.is_generating())
            .finish_non_exhaustive()
    }
}

/// Clears the in-flight flag however the compilation ends.
struct GeneratingGuard(Arc<AtomicBool>);

impl Drop for GeneratingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Compiler {
    /// Build a compiler that fetches remote sources over HTTP.
    pub fn new(config: CompileConfig) -> Result<Self, PagebindError> {
        let fetcher = ReqwestFetcher::new(&config)?;
        Ok(Self::with_fetcher(config, Arc::new(fetcher)))
    }

    /// Build a compiler around a caller-supplied fetcher.
    pub fn with_fetcher(config: CompileConfig, fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self {
            fetcher,
            config,
            generating: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &CompileConfig {
        &self.config
    }

    /// Whether a compilation is currently in flight.
    pub fn is_generating(&self) -> bool {
        self.generating.load(Ordering::Acquire)
    }

    /// Compile `snapshot` into a PDF, one page per entry, in order.
    ///
    /// # Errors
    /// * [`PagebindError::NothingToCompile`] for an empty snapshot.
    /// * [`PagebindError::CompilationInProgress`] while another compile runs.
    /// * [`PagebindError::PdfAssembly`] if the PDF writer itself fails.
    ///
    /// Per-entry fetch and decode failures are never returned here; they are
    /// recorded in [`PageOutcome::error`].
    pub async fn compile(&self, snapshot: &PageSnapshot) -> Result<CompiledDocument, PagebindError> {
        self.compile_with(snapshot, self.config.progress_callback.as_ref())
            .await
    }

    pub(crate) async fn compile_with(
        &self,
        snapshot: &PageSnapshot,
        callback: Option<&ProgressCallback>,
    ) -> Result<CompiledDocument, PagebindError> {
        if snapshot.is_empty() {
            return Err(PagebindError::NothingToCompile);
        }
        let _guard = self.begin()?;

        let start = Instant::now();
        let total = snapshot.len();
        info!(
            "Compiling {} pages (collection version {})",
            total,
            snapshot.version()
        );
        if let Some(cb) = callback {
            cb.on_compile_start(total);
        }

        let mut pdf = PdfAssembler::new();
        let mut pages = Vec::with_capacity(total);

        for (i, entry) in snapshot.iter().enumerate() {
            let page_num = i + 1;
            let label = entry.source.log_label(page_num);
            if let Some(cb) = callback {
                cb.on_page_start(page_num, total);
            }

            let outcome = match self.load_entry(entry, page_num, &label).await {
                Ok(decoded) => {
                    let geometry = PageGeometry::for_image(decoded.width, decoded.height);
                    debug!(
                        "Page {}: {:?} {}x{}",
                        page_num, geometry.orientation, geometry.width, geometry.height
                    );
                    pdf.add_page(geometry)?;
                    pdf.draw_image_full(&decoded.image)?;
                    if let Some(cb) = callback {
                        cb.on_page_complete(page_num, total, decoded.width, decoded.height);
                    }
                    PageOutcome {
                        page_num,
                        label,
                        geometry,
                        error: None,
                    }
                }
                Err(err) => {
                    warn!("Error loading page {} ({}): {}", page_num, label, err);
                    let geometry = self.append_placeholder(&mut pdf, page_num)?;
                    if let Some(cb) = callback {
                        cb.on_page_error(page_num, total, &err.to_string());
                    }
                    PageOutcome {
                        page_num,
                        label,
                        geometry,
                        error: Some(err),
                    }
                }
            };
            pages.push(outcome);

            if let Some(cb) = callback {
                cb.on_progress(Progress::new(page_num, total));
            }
        }

        let bytes = pdf.finish()?;
        let placeholder_pages = pages.iter().filter(|p| p.is_placeholder()).count();
        let stats = CompileStats {
            total_pages: total,
            rendered_pages: total - placeholder_pages,
            placeholder_pages,
            total_duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            "Compilation complete: {}/{} pages rendered, {} placeholders, {}ms",
            stats.rendered_pages, total, placeholder_pages, stats.total_duration_ms
        );
        if let Some(cb) = callback {
            cb.on_compile_complete(total, stats.rendered_pages);
        }

        Ok(CompiledDocument {
            bytes,
            pages,
            stats,
        })
    }

    fn begin(&self) -> Result<GeneratingGuard, PagebindError> {
        self.generating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| PagebindError::CompilationInProgress)?;
        Ok(GeneratingGuard(Arc::clone(&self.generating)))
    }

    async fn load_entry(
        &self,
        entry: &PageEntry,
        page_num: usize,
        label: &str,
    ) -> Result<DecodedImage, PageError> {
        let inline = resolve_source(self.fetcher.as_ref(), &entry.source, page_num).await?;
        decode_image(inline, page_num, label).await
    }

    fn append_placeholder(
        &self,
        pdf: &mut PdfAssembler,
        page_num: usize,
    ) -> Result<PageGeometry, PagebindError> {
        let geometry = PageGeometry::placeholder(self.config.placeholder_size);
        pdf.add_page(geometry)?;
        pdf.draw_text(
            &placeholder_text(page_num),
            PLACEHOLDER_MARGIN,
            PLACEHOLDER_MARGIN,
            self.config.placeholder_font_size,
        )?;
        Ok(geometry)
    }
}

/// Marker drawn on the page substituted for entry `page_num`.
pub fn placeholder_text(page_num: usize) -> String {
    format!("Error loading page {page_num}")
}

// ── Convenience entry points ─────────────────────────────────────────────

/// Compile `snapshot` with a fresh HTTP-backed [`Compiler`].
pub async fn compile(
    snapshot: &PageSnapshot,
    config: &CompileConfig,
) -> Result<CompiledDocument, PagebindError> {
    Compiler::new(config.clone())?.compile(snapshot).await
}

/// Compile and write the PDF to `output_path`.
///
/// Uses atomic write (temp file + rename) so a failed run never leaves a
/// truncated document behind.
pub async fn compile_to_file(
    snapshot: &PageSnapshot,
    output_path: impl AsRef<Path>,
    config: &CompileConfig,
) -> Result<CompileStats, PagebindError> {
    let doc = compile(snapshot, config).await?;
    doc.save(output_path).await?;
    Ok(doc.stats)
}

/// Synchronous wrapper around [`compile`].
///
/// Creates a temporary tokio runtime internally.
pub fn compile_sync(
    snapshot: &PageSnapshot,
    config: &CompileConfig,
) -> Result<CompiledDocument, PagebindError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| PagebindError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(compile(snapshot, config))
}
