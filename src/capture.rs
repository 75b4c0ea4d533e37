//! Capture-frame boundary: turn a live frame source into inline page payloads.
//!
//! A [`CaptureSession`] owns a started [`FrameSource`] and is the only way to
//! take frames from it. Each [`CaptureSession::capture_frame`] call yields one
//! PNG data URL, ready for [`PageCollection::add_page`]. A frame is only
//! taken while the source is [`StreamState::Active`]; otherwise the call
//! fails with [`PagebindError::CaptureInactive`] and nothing is added.
//!
//! ## Scoped resource
//!
//! The session stops its source exactly once: on [`CaptureSession::stop`],
//! as soon as the source reports it has ended, or when the session is
//! dropped. A source is never left running after its session is gone.

use crate::collection::{PageCollection, PageId};
use crate::error::PagebindError;
use crate::payload::InlineImage;
use image::{DynamicImage, ImageFormat};
use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Playback state of a frame source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Active,
    Paused,
    Ended,
}

/// A live, video-like source of frames.
pub trait FrameSource: Send {
    fn state(&self) -> StreamState;

    /// Grab the current frame at its native resolution.
    fn grab(&mut self) -> Result<DynamicImage, PagebindError>;

    /// Release everything the source holds. Called at most once.
    fn stop(&mut self);
}

/// Owns a started [`FrameSource`] until it is stopped.
pub struct CaptureSession<S: FrameSource> {
    source: Option<S>,
}

impl<S: FrameSource> CaptureSession<S> {
    pub fn start(source: S) -> Self {
        info!("Capture started");
        Self {
            source: Some(source),
        }
    }

    /// Current state of the held source, or `None` once stopped.
    ///
    /// A source that reports [`StreamState::Ended`] is stopped here, so the
    /// first observation of the end releases it.
    pub fn poll_state(&mut self) -> Option<StreamState> {
        let state = self.source.as_ref().map(|s| s.state())?;
        if state == StreamState::Ended {
            debug!("Capture source ended");
            self.stop();
        }
        Some(state)
    }

    /// True while the session holds a source that is currently active.
    pub fn is_active(&mut self) -> bool {
        self.poll_state() == Some(StreamState::Active)
    }

    /// Grab one frame and encode it as a PNG data URL.
    pub fn capture_frame(&mut self) -> Result<String, PagebindError> {
        if self.poll_state() != Some(StreamState::Active) {
            return Err(PagebindError::CaptureInactive);
        }

        let frame = match self.source.as_mut() {
            Some(source) => source.grab()?,
            None => return Err(PagebindError::CaptureInactive),
        };
        if frame.width() == 0 || frame.height() == 0 {
            return Err(PagebindError::FrameGrabFailed {
                detail: "source produced an empty frame".into(),
            });
        }

        let mut png = Vec::new();
        frame
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| PagebindError::FrameGrabFailed {
                detail: e.to_string(),
            })?;
        debug!(
            "Captured {}x{} frame ({} bytes PNG)",
            frame.width(),
            frame.height(),
            png.len()
        );
        Ok(InlineImage::new("image/png", png).to_data_url())
    }

    /// Capture a frame straight into `collection`.
    ///
    /// Returns `Ok(None)` when the identical frame is already collected.
    pub fn capture_into(
        &mut self,
        collection: &mut PageCollection,
    ) -> Result<Option<PageId>, PagebindError> {
        let data_url = self.capture_frame()?;
        Ok(collection.add_page(data_url))
    }

    /// Stop the source. Idempotent.
    pub fn stop(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.stop();
            info!("Capture stopped");
        }
    }
}

impl<S: FrameSource> Drop for CaptureSession<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

// ── File-backed source ───────────────────────────────────────────────────

/// A [`FrameSource`] that serves a screenshot saved on disk.
///
/// Stays active, always yielding the same frame, until stopped.
#[derive(Debug)]
pub struct ScreenshotFileSource {
    path: PathBuf,
    frame: Option<DynamicImage>,
}

impl ScreenshotFileSource {
    /// Open and decode the screenshot at `path`.
    ///
    /// # Errors
    /// [`PagebindError::CaptureFailed`] if the file is missing, unreadable or
    /// not a decodable image.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PagebindError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            let reason = match e.kind() {
                ErrorKind::PermissionDenied => {
                    format!("permission denied for '{}'", path.display())
                }
                ErrorKind::NotFound => format!("'{}' does not exist", path.display()),
                _ => format!("'{}': {e}", path.display()),
            };
            warn!("Capture source unavailable: {}", reason);
            PagebindError::CaptureFailed { reason }
        })?;
        let frame = image::load_from_memory(&bytes).map_err(|e| PagebindError::CaptureFailed {
            reason: format!("'{}' is not a readable image: {e}", path.display()),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            frame: Some(frame),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSource for ScreenshotFileSource {
    fn state(&self) -> StreamState {
        if self.frame.is_some() {
            StreamState::Active
        } else {
            StreamState::Ended
        }
    }

    fn grab(&mut self) -> Result<DynamicImage, PagebindError> {
        self.frame.clone().ok_or(PagebindError::CaptureInactive)
    }

    fn stop(&mut self) {
        self.frame = None;
    }
}
