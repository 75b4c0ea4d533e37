//! Streaming compile API: observe a compilation as events.
//!
//! ## Why stream?
//!
//! Large books take a while to fetch. Instead of wiring a callback, callers
//! can drive a UI from a `Stream` of [`CompileEvent`]s: one `Started`, one
//! `PageCompleted` per entry in page order, then a final `Finished` carrying
//! the document or the rejecting error.
//!
//! The compilation runs on a spawned task against the snapshot it was given,
//! so the caller may keep editing its collection while the stream is live.

use crate::collection::PageSnapshot;
use crate::compile::Compiler;
use crate::error::PagebindError;
use crate::output::CompiledDocument;
use crate::progress::{CompileProgressCallback, Progress, ProgressCallback};
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::info;

/// One observable step of a compilation.
#[derive(Debug)]
pub enum CompileEvent {
    Started {
        total_pages: usize,
    },
    PageCompleted {
        page_num: usize,
        total_pages: usize,
        /// Completion after this page; exactly `1.0` on the last one.
        fraction: f64,
        /// Set when the page is a placeholder.
        error: Option<String>,
    },
    Finished(Result<CompiledDocument, PagebindError>),
}

/// A boxed stream of compile events.
pub type CompileStream = Pin<Box<dyn Stream<Item = CompileEvent> + Send>>;

/// Forwards compiler callbacks into the event channel, then to the
/// caller's own callback if one was configured.
struct ChannelCallback {
    tx: mpsc::UnboundedSender<CompileEvent>,
    last_error: std::sync::Mutex<Option<String>>,
    inner: Option<ProgressCallback>,
}

impl CompileProgressCallback for ChannelCallback {
    fn on_compile_start(&self, total_pages: usize) {
        let _ = self.tx.send(CompileEvent::Started { total_pages });
        if let Some(cb) = &self.inner {
            cb.on_compile_start(total_pages);
        }
    }

    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        if let Some(cb) = &self.inner {
            cb.on_page_start(page_num, total_pages);
        }
    }

    fn on_page_complete(&self, page_num: usize, total_pages: usize, width: u32, height: u32) {
        if let Some(cb) = &self.inner {
            cb.on_page_complete(page_num, total_pages, width, height);
        }
    }

    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        if let Ok(mut slot) = self.last_error.lock() {
            *slot = Some(error.to_string());
        }
        if let Some(cb) = &self.inner {
            cb.on_page_error(page_num, total_pages, error);
        }
    }

    fn on_progress(&self, progress: Progress) {
        let error = self.last_error.lock().ok().and_then(|mut slot| slot.take());
        let _ = self.tx.send(CompileEvent::PageCompleted {
            page_num: progress.completed,
            total_pages: progress.total,
            fraction: progress.fraction(),
            error,
        });
        if let Some(cb) = &self.inner {
            cb.on_progress(progress);
        }
    }

    fn on_compile_complete(&self, total_pages: usize, success_count: usize) {
        if let Some(cb) = &self.inner {
            cb.on_compile_complete(total_pages, success_count);
        }
    }
}

/// Compile `snapshot` on a background task, streaming events as it goes.
///
/// Must be called from within a tokio runtime. The stream always ends with
/// exactly one [`CompileEvent::Finished`]; a rejected compilation (empty
/// snapshot, one already in flight) yields only that event.
pub fn compile_stream(compiler: &Compiler, snapshot: PageSnapshot) -> CompileStream {
    let (tx, rx) = mpsc::unbounded_channel();
    let compiler = compiler.clone();

    info!("Starting streaming compilation: {} pages", snapshot.len());
    tokio::spawn(async move {
        let callback: ProgressCallback = Arc::new(ChannelCallback {
            tx: tx.clone(),
            last_error: std::sync::Mutex::new(None),
            inner: compiler.config().progress_callback.clone(),
        });
        let result = compiler.compile_with(&snapshot, Some(&callback)).await;
        let _ = tx.send(CompileEvent::Finished(result));
    });

    Box::pin(UnboundedReceiverStream::new(rx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::PageCollection;
    use crate::config::CompileConfig;
    use crate::error::FetchFailure;
    use crate::pipeline::resolve::{FetchedImage, ImageFetcher};
    use async_trait::async_trait;
    use futures::StreamExt;

    struct Offline;

    #[async_trait]
    impl ImageFetcher for Offline {
        async fn fetch(&self, _url: &str) -> Result<FetchedImage, FetchFailure> {
            Err(FetchFailure::Status { status: 404 })
        }
    }

    #[tokio::test]
    async fn events_arrive_in_page_order_and_finish() {
        let compiler = Compiler::with_fetcher(CompileConfig::default(), Arc::new(Offline));
        let mut c = PageCollection::new();
        c.add_pages(["https://a/1.png", "https://a/2.png", "https://a/3.png"]);

        let events: Vec<CompileEvent> = compile_stream(&compiler, c.snapshot()).collect().await;
        assert_eq!(events.len(), 5);
        assert!(matches!(events[0], CompileEvent::Started { total_pages: 3 }));

        let pages: Vec<(usize, f64)> = events
            .iter()
            .filter_map(|e| match e {
                CompileEvent::PageCompleted {
                    page_num,
                    fraction,
                    error,
                    ..
                } => {
                    assert!(error.as_deref().is_some_and(|m| m.contains("HTTP 404")));
                    Some((*page_num, *fraction))
                }
                _ => None,
            })
            .collect();
        assert_eq!(pages.iter().map(|p| p.0).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(pages[2].1, 1.0);

        match &events[4] {
            CompileEvent::Finished(Ok(doc)) => assert_eq!(doc.stats.placeholder_pages, 3),
            other => panic!("unexpected final event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_snapshot_yields_only_finished() {
        let compiler = Compiler::with_fetcher(CompileConfig::default(), Arc::new(Offline));
        let events: Vec<CompileEvent> =
            compile_stream(&compiler, PageCollection::new().snapshot())
                .collect()
                .await;
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            CompileEvent::Finished(Err(PagebindError::NothingToCompile))
        ));
    }
}
