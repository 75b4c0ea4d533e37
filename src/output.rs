//! Compile results: the finished document plus per-page outcomes and stats.

use crate::error::{PageError, PagebindError};
use crate::pipeline::layout::PageGeometry;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What happened to one entry of the compiled snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageOutcome {
    /// 1-based position in the compiled snapshot.
    pub page_num: usize,
    /// URL for remote entries, a generic label for captured ones.
    pub label: String,
    /// Size and orientation of the page actually appended.
    pub geometry: PageGeometry,
    /// Set when the entry failed and a placeholder page was appended instead.
    pub error: Option<PageError>,
}

impl PageOutcome {
    pub fn is_placeholder(&self) -> bool {
        self.error.is_some()
    }
}

/// Aggregate numbers for one compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileStats {
    pub total_pages: usize,
    pub rendered_pages: usize,
    pub placeholder_pages: usize,
    pub total_duration_ms: u64,
}

/// A compiled PDF.
///
/// Serialises to a JSON report (pages and stats); the PDF bytes are skipped.
#[derive(Debug, Clone, Serialize)]
pub struct CompiledDocument {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub pages: Vec<PageOutcome>,
    pub stats: CompileStats,
}

impl CompiledDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Errors of the entries that were replaced by placeholders, in page order.
    pub fn failures(&self) -> impl Iterator<Item = &PageError> {
        self.pages.iter().filter_map(|p| p.error.as_ref())
    }

    /// Write the document to `path` atomically (temp file + rename).
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), PagebindError> {
        let path = path.as_ref();
        let write_err = |source| PagebindError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let tmp_path = path.with_extension("pdf.tmp");
        tokio::fs::write(&tmp_path, &self.bytes)
            .await
            .map_err(write_err)?;
        tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
        Ok(())
    }
}
