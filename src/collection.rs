//! The ordered page collection: add, bulk-add, remove, reorder.
//!
//! ## Ownership and snapshots
//!
//! The entry list lives behind an `Arc` and every mutation goes through
//! `Arc::make_mut`. Taking a [`PageSnapshot`] is therefore a reference-count
//! bump, and a later edit copies the list instead of touching the snapshot
//! an in-flight compilation is reading.
//!
//! All mutations are silent no-ops when there is nothing to do (empty or
//! duplicate source, unknown id, move past either end). A no-op leaves both
//! the entries and [`PageCollection::version`] untouched.

use crate::payload::is_inline_payload;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use uuid::Uuid;

/// Process-unique identity of an entry, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageId(Uuid);

impl PageId {
    fn fresh() -> Self {
        PageId(Uuid::new_v4())
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Where an entry's image comes from, tagged once at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PageSource {
    /// A URL that must be fetched.
    Remote(String),
    /// A `data:image...` payload carrying the bytes itself.
    Inline(String),
}

impl PageSource {
    /// Tag a raw source string by its prefix.
    pub fn classify(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if is_inline_payload(&raw) {
            PageSource::Inline(raw)
        } else {
            PageSource::Remote(raw)
        }
    }

    /// The raw source string, used as the de-duplication key.
    pub fn as_str(&self) -> &str {
        match self {
            PageSource::Remote(s) | PageSource::Inline(s) => s,
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, PageSource::Inline(_))
    }

    /// Label identifying the source in failure logs.
    pub fn log_label(&self, page_num: usize) -> String {
        match self {
            PageSource::Remote(url) => url.clone(),
            PageSource::Inline(_) => format!("captured image for Page {page_num}"),
        }
    }
}

/// One item in the collection; becomes one output page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEntry {
    pub id: PageId,
    pub source: PageSource,
}

impl PageEntry {
    fn new(source: PageSource) -> Self {
        Self {
            id: PageId::fresh(),
            source,
        }
    }

    /// Short text for list rendering: the URL, or a fixed label for captures.
    pub fn display_label(&self) -> &str {
        match &self.source {
            PageSource::Remote(url) => url,
            PageSource::Inline(_) => "Captured from screen",
        }
    }
}

/// Direction for [`PageCollection::move_page`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

impl MoveDirection {
    fn target(self, index: usize) -> Option<usize> {
        match self {
            MoveDirection::Up => index.checked_sub(1),
            MoveDirection::Down => index.checked_add(1),
        }
    }
}

/// The ordered, de-duplicated list of page entries.
#[derive(Debug, Clone, Default)]
pub struct PageCollection {
    entries: Arc<Vec<PageEntry>>,
    version: u64,
}

impl PageCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PageEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&PageEntry> {
        self.entries.get(index)
    }

    pub fn position(&self, id: PageId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    pub fn contains_source(&self, source: &str) -> bool {
        self.entries.iter().any(|e| e.source.as_str() == source)
    }

    /// Incremented on every mutation that changed the list.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Entries with their 1-based page number, in output order.
    pub fn iter_numbered(&self) -> impl Iterator<Item = (usize, &PageEntry)> {
        self.entries.iter().enumerate().map(|(i, e)| (i + 1, e))
    }

    /// Whether moving `index` in `direction` would change anything.
    pub fn can_move(&self, index: usize, direction: MoveDirection) -> bool {
        index < self.len()
            && direction
                .target(index)
                .is_some_and(|target| target < self.len())
    }

    /// Append one source. Empty or already-present sources are ignored.
    ///
    /// Returns the id of the new entry, or `None` for the no-op case.
    pub fn add_page(&mut self, source: impl Into<String>) -> Option<PageId> {
        let source = source.into();
        if source.is_empty() || self.contains_source(&source) {
            return None;
        }
        let entry = PageEntry::new(PageSource::classify(source));
        let id = entry.id;
        Arc::make_mut(&mut self.entries).push(entry);
        self.version += 1;
        Some(id)
    }

    /// Append many sources in one update.
    ///
    /// Empty values, values already in the collection and repeats within the
    /// batch (first occurrence wins) are dropped. If nothing survives the
    /// collection is untouched.
    pub fn add_pages<I, S>(&mut self, sources: I) -> Vec<PageId>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let candidates: Vec<String> = sources.into_iter().map(Into::into).collect();
        let keep: Vec<bool> = {
            let mut seen: HashSet<&str> =
                self.entries.iter().map(|e| e.source.as_str()).collect();
            candidates
                .iter()
                .map(|s| !s.is_empty() && seen.insert(s.as_str()))
                .collect()
        };

        let fresh: Vec<PageEntry> = candidates
            .into_iter()
            .zip(keep)
            .filter(|(_, keep)| *keep)
            .map(|(s, _)| PageEntry::new(PageSource::classify(s)))
            .collect();

        if fresh.is_empty() {
            return Vec::new();
        }

        let ids = fresh.iter().map(|e| e.id).collect();
        Arc::make_mut(&mut self.entries).extend(fresh);
        self.version += 1;
        ids
    }

    /// Remove the entry with `id`. Unknown ids are ignored.
    pub fn remove_page(&mut self, id: PageId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        Arc::make_mut(&mut self.entries).remove(index);
        self.version += 1;
        true
    }

    /// Swap the entry at `index` with its neighbour in `direction`.
    ///
    /// Moving the first entry up, the last entry down, or an index past the
    /// end leaves the list unchanged.
    pub fn move_page(&mut self, index: usize, direction: MoveDirection) -> bool {
        if !self.can_move(index, direction) {
            return false;
        }
        let Some(target) = direction.target(index) else {
            return false;
        };
        Arc::make_mut(&mut self.entries).swap(index, target);
        self.version += 1;
        true
    }

    /// Freeze the current list for a compilation.
    pub fn snapshot(&self) -> PageSnapshot {
        PageSnapshot {
            entries: Arc::clone(&self.entries),
            version: self.version,
        }
    }
}

/// Immutable view of the collection at one version.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    entries: Arc<Vec<PageEntry>>,
    version: u64,
}

impl PageSnapshot {
    /// Collection version this snapshot was taken at.
    pub fn version(&self) -> u64 {
        self.version
    }
}

impl Deref for PageSnapshot {
    type Target = [PageEntry];

    fn deref(&self) -> &[PageEntry] {
        &self.entries
    }
}

impl From<&PageCollection> for PageSnapshot {
    fn from(collection: &PageCollection) -> Self {
        collection.snapshot()
    }
}
