//! Bulk import of pasted page data.
//!
//! The accepted text is a JSON array of strings, each an inline image
//! payload. Remote URLs are rejected here even though
//! [`PageCollection::add_page`] accepts them: bulk import exists to carry
//! pages that could not be fetched directly. Any violation rejects the
//! whole payload and nothing is added.

use crate::collection::{PageCollection, PageId};
use crate::error::PagebindError;
use crate::payload::is_inline_payload;
use serde_json::Value;
use tracing::{debug, warn};

/// Parse bulk-import text into an ordered list of inline payloads.
///
/// Blank input yields an empty list rather than an error.
pub fn parse_bulk_payload(text: &str) -> Result<Vec<String>, PagebindError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_str(text).map_err(|e| {
        warn!("Bulk import is not valid JSON: {}", e);
        PagebindError::BulkImportRejected {
            reason: format!("not valid JSON ({e})"),
        }
    })?;

    let Value::Array(items) = value else {
        return Err(PagebindError::BulkImportRejected {
            reason: "expected a JSON array of image data URLs".into(),
        });
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::String(s) if is_inline_payload(&s) => Ok(s),
            _ => Err(PagebindError::BulkImportRejected {
                reason: format!("element {} is not an image data URL", i + 1),
            }),
        })
        .collect()
}

impl PageCollection {
    /// Validate `text` and append its payloads through the bulk-add path.
    ///
    /// Returns the ids that were actually added (duplicates are dropped).
    pub fn import_bulk(&mut self, text: &str) -> Result<Vec<PageId>, PagebindError> {
        let payloads = parse_bulk_payload(text)?;
        let received = payloads.len();
        let added = self.add_pages(payloads);
        debug!("Bulk import: {} received, {} added", received, added.len());
        Ok(added)
    }
}
