//! Configuration for document compilation.
//!
//! All compile behaviour is controlled through [`CompileConfig`], built via
//! its [`CompileConfigBuilder`]. Set only what you need; everything else has
//! a documented default.

use crate::error::PagebindError;
use crate::pipeline::layout::A4_PORTRAIT;
use crate::progress::{CompileProgressCallback, ProgressCallback};
use std::fmt;
use std::sync::Arc;

/// Default file name offered for the finished document.
pub const DEFAULT_OUTPUT_FILENAME: &str = "captured-book.pdf";

/// Configuration for compiling a page snapshot into a PDF.
///
/// # Example
/// ```rust
/// use pagebind::CompileConfig;
///
/// let config = CompileConfig::builder()
///     .fetch_timeout_secs(30)
///     .placeholder_size((612.0, 792.0))
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct CompileConfig {
    /// Per-fetch transport timeout for remote sources, in seconds. Default: 120.
    ///
    /// A timed-out fetch becomes a placeholder page like any other fetch
    /// failure. There is no timeout on the compilation as a whole.
    pub fetch_timeout_secs: u64,

    /// `User-Agent` header sent with remote fetches. Default: `pagebind/<version>`.
    pub user_agent: String,

    /// Size in points of the page substituted for a failed entry. Default: A4 portrait.
    pub placeholder_size: (f32, f32),

    /// Font size of the "Error loading page N" marker. Default: 16.
    pub placeholder_font_size: f32,

    /// Receives per-page events and fractional progress.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 120,
            user_agent: concat!("pagebind/", env!("CARGO_PKG_VERSION")).to_string(),
            placeholder_size: A4_PORTRAIT,
            placeholder_font_size: 16.0,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for CompileConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompileConfig")
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("placeholder_size", &self.placeholder_size)
            .field("placeholder_font_size", &self.placeholder_font_size)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn CompileProgressCallback>"),
            )
            .finish()
    }
}

impl CompileConfig {
    /// Create a new builder for `CompileConfig`.
    pub fn builder() -> CompileConfigBuilder {
        CompileConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`CompileConfig`].
#[derive(Debug)]
pub struct CompileConfigBuilder {
    config: CompileConfig,
}

impl CompileConfigBuilder {
    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn placeholder_size(mut self, size: (f32, f32)) -> Self {
        self.config.placeholder_size = size;
        self
    }

    pub fn placeholder_font_size(mut self, size: f32) -> Self {
        self.config.placeholder_font_size = size.clamp(4.0, 72.0);
        self
    }

    pub fn progress_callback(mut self, cb: Arc<dyn CompileProgressCallback>) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<CompileConfig, PagebindError> {
        let c = &self.config;
        if c.fetch_timeout_secs == 0 {
            return Err(PagebindError::InvalidConfig(
                "Fetch timeout must be ≥ 1 second".into(),
            ));
        }
        let (w, h) = c.placeholder_size;
        if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) {
            return Err(PagebindError::InvalidConfig(format!(
                "Placeholder size must be positive, got {w}×{h}"
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = CompileConfig::default();
        assert_eq!(c.fetch_timeout_secs, 120);
        assert_eq!(c.placeholder_size, A4_PORTRAIT);
        assert!(c.user_agent.starts_with("pagebind/"));
        assert!(c.progress_callback.is_none());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = CompileConfig::builder()
            .fetch_timeout_secs(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, PagebindError::InvalidConfig(_)));
    }

    #[test]
    fn degenerate_placeholder_is_rejected() {
        assert!(CompileConfig::builder()
            .placeholder_size((0.0, 100.0))
            .build()
            .is_err());
        assert!(CompileConfig::builder()
            .placeholder_size((f32::NAN, 100.0))
            .build()
            .is_err());
    }

    #[test]
    fn font_size_is_clamped() {
        let c = CompileConfig::builder()
            .placeholder_font_size(500.0)
            .build()
            .unwrap();
        assert_eq!(c.placeholder_font_size, 72.0);
    }
}
