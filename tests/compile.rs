//! Integration tests for the compiler: real HTTP fetches against a local
//! `wiremock` server, PDF output re-read with `lopdf`.

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use lopdf::{Document, Object};
use pagebind::{
    compile_stream, compile_to_file, CompileConfig, CompileEvent, CompileProgressCallback,
    Compiler, PageCollection, PageError, PagebindError, Progress, A4_PORTRAIT,
};
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Test helpers ─────────────────────────────────────────────────────────────

fn encoded(w: u32, h: u32, format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([200, 100, 50, 255])));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format)
        .expect("encode image");
    buf
}

fn png(w: u32, h: u32) -> Vec<u8> {
    encoded(w, h, ImageFormat::Png)
}

fn png_data_url(w: u32, h: u32) -> String {
    use base64::Engine;
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png(w, h))
    )
}

async fn serve_png(server: &MockServer, at: &str, w: u32, h: u32) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_raw(png(w, h), "image/png"))
        .mount(server)
        .await;
}

/// Page sizes and decompressed content streams, in page order.
fn read_pages(bytes: &[u8]) -> Vec<((f32, f32), String)> {
    let mut doc = Document::load_mem(bytes).expect("reload pdf");
    doc.decompress();
    doc.get_pages()
        .into_values()
        .map(|id| {
            let page = doc.get_dictionary(id).expect("page dict");
            let mb = page
                .get(b"MediaBox")
                .and_then(Object::as_array)
                .expect("mediabox");
            let size = (
                mb[2].as_float().expect("width"),
                mb[3].as_float().expect("height"),
            );
            let content = doc.get_page_content(id).expect("content");
            (size, String::from_utf8_lossy(&content).into_owned())
        })
        .collect()
}

#[derive(Default)]
struct Recorder {
    progress: Mutex<Vec<f64>>,
    errors: Mutex<Vec<usize>>,
}

impl CompileProgressCallback for Recorder {
    fn on_page_error(&self, page_num: usize, _total: usize, _error: &str) {
        self.errors.lock().unwrap().push(page_num);
    }

    fn on_progress(&self, progress: Progress) {
        self.progress.lock().unwrap().push(progress.fraction());
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn mixed_sources_keep_order_and_sizes() {
    let server = MockServer::start().await;
    serve_png(&server, "/wide.png", 40, 20).await;
    Mock::given(method("GET"))
        .and(path("/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let missing = format!("{}/missing.png", server.uri());
    let mut pages = PageCollection::new();
    pages.add_page(format!("{}/wide.png", server.uri()));
    pages.add_page(missing.clone());
    pages.add_page(png_data_url(10, 30));

    let recorder = Arc::new(Recorder::default());
    let config = CompileConfig::builder()
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let doc = Compiler::new(config)
        .unwrap()
        .compile(&pages.snapshot())
        .await
        .expect("compile");

    let read = read_pages(&doc.bytes);
    let sizes: Vec<(f32, f32)> = read.iter().map(|(s, _)| *s).collect();
    assert_eq!(sizes, vec![(40.0, 20.0), A4_PORTRAIT, (10.0, 30.0)]);
    assert!(read[1].1.contains("Error loading page 2"));
    assert!(!read[0].1.contains("Error loading"));

    assert_eq!(doc.stats.rendered_pages, 2);
    assert_eq!(doc.stats.placeholder_pages, 1);
    match &doc.pages[1].error {
        Some(PageError::FetchFailed {
            page,
            label,
            reason,
        }) => {
            assert_eq!(*page, 2);
            assert_eq!(label, &missing);
            assert_eq!(reason, "HTTP 404");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(doc.pages[2].label, "captured image for Page 3");

    assert_eq!(*recorder.errors.lock().unwrap(), vec![2]);
    let progress = recorder.progress.lock().unwrap().clone();
    assert_eq!(progress.len(), 3);
    assert!(progress.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(progress.last().copied(), Some(1.0));
}

#[tokio::test]
async fn webp_gif_and_bmp_pages_render_at_their_own_size() {
    use base64::Engine;
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page.webp"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(encoded(30, 10, ImageFormat::WebP), "image/webp"),
        )
        .mount(&server)
        .await;

    let gif = format!(
        "data:image/gif;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(encoded(12, 18, ImageFormat::Gif))
    );
    let bmp = format!(
        "data:image/bmp;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(encoded(7, 7, ImageFormat::Bmp))
    );

    let mut pages = PageCollection::new();
    pages.add_page(format!("{}/page.webp", server.uri()));
    pages.add_page(gif);
    pages.add_page(bmp);

    let doc = Compiler::new(CompileConfig::default())
        .unwrap()
        .compile(&pages.snapshot())
        .await
        .unwrap();
    assert!(doc.failures().next().is_none(), "{:?}", doc.pages);
    assert_eq!(doc.stats.placeholder_pages, 0);

    let sizes: Vec<(f32, f32)> = read_pages(&doc.bytes).into_iter().map(|(s, _)| s).collect();
    assert_eq!(sizes, vec![(30.0, 10.0), (12.0, 18.0), (7.0, 7.0)]);
}

#[tokio::test]
async fn undecodable_body_becomes_placeholder() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page.html"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html>login</html>", "text/html"))
        .mount(&server)
        .await;

    let mut pages = PageCollection::new();
    pages.add_page(format!("{}/page.html", server.uri()));

    let doc = Compiler::new(CompileConfig::default())
        .unwrap()
        .compile(&pages.snapshot())
        .await
        .unwrap();
    assert!(matches!(
        doc.pages[0].error,
        Some(PageError::DecodeFailed { page: 1, .. })
    ));
    assert_eq!(doc.page_count(), 1);
}

#[tokio::test]
async fn slow_fetch_times_out_into_placeholder() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(png(5, 5), "image/png")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut pages = PageCollection::new();
    pages.add_page(format!("{}/slow.png", server.uri()));

    let config = CompileConfig::builder().fetch_timeout_secs(1).build().unwrap();
    let doc = Compiler::new(config)
        .unwrap()
        .compile(&pages.snapshot())
        .await
        .unwrap();
    match &doc.pages[0].error {
        Some(PageError::FetchFailed { reason, .. }) => {
            assert!(reason.contains("timed out"), "got: {reason}")
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn snapshot_is_unaffected_by_later_edits() {
    let server = MockServer::start().await;
    serve_png(&server, "/a.png", 8, 8).await;
    serve_png(&server, "/b.png", 12, 6).await;

    let mut pages = PageCollection::new();
    pages.add_pages([
        format!("{}/a.png", server.uri()),
        format!("{}/b.png", server.uri()),
    ]);
    let snapshot = pages.snapshot();

    let first = pages.entries()[0].id;
    pages.remove_page(first);
    pages.add_page(png_data_url(3, 3));

    let doc = Compiler::new(CompileConfig::default())
        .unwrap()
        .compile(&snapshot)
        .await
        .unwrap();
    let sizes: Vec<(f32, f32)> = read_pages(&doc.bytes).into_iter().map(|(s, _)| s).collect();
    assert_eq!(sizes, vec![(8.0, 8.0), (12.0, 6.0)]);
    assert_eq!(pages.len(), 2);
}

#[tokio::test]
async fn second_compilation_is_refused_while_first_runs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/held.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(png(4, 4), "image/png")
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;

    let mut pages = PageCollection::new();
    pages.add_page(format!("{}/held.png", server.uri()));
    let snapshot = pages.snapshot();

    let compiler = Compiler::new(CompileConfig::default()).unwrap();
    let running = {
        let compiler = compiler.clone();
        let snapshot = snapshot.clone();
        tokio::spawn(async move { compiler.compile(&snapshot).await })
    };

    while !compiler.is_generating() {
        tokio::task::yield_now().await;
    }
    let err = compiler.compile(&snapshot).await.unwrap_err();
    assert!(matches!(err, PagebindError::CompilationInProgress));

    let doc = running.await.unwrap().expect("first compile");
    assert_eq!(doc.stats.rendered_pages, 1);
    assert!(!compiler.is_generating());
}

#[tokio::test]
async fn compile_to_file_writes_a_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("captured-book.pdf");

    let mut pages = PageCollection::new();
    pages
        .import_bulk(&format!(r#"["{}", "{}"]"#, png_data_url(20, 10), png_data_url(10, 20)))
        .unwrap();

    let stats = compile_to_file(&pages.snapshot(), &out, &CompileConfig::default())
        .await
        .unwrap();
    assert_eq!(stats.total_pages, 2);
    assert_eq!(stats.placeholder_pages, 0);

    let bytes = std::fs::read(&out).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
    let sizes: Vec<(f32, f32)> = read_pages(&bytes).into_iter().map(|(s, _)| s).collect();
    assert_eq!(sizes, vec![(20.0, 10.0), (10.0, 20.0)]);
}

#[tokio::test]
async fn stream_reports_every_page_then_finishes() {
    let server = MockServer::start().await;
    serve_png(&server, "/1.png", 6, 9).await;

    let mut pages = PageCollection::new();
    pages.add_page(format!("{}/1.png", server.uri()));
    pages.add_page("data:image/png;base64,not-really-an-image");

    let compiler = Compiler::new(CompileConfig::default()).unwrap();
    let mut stream = compile_stream(&compiler, pages.snapshot());

    use futures::StreamExt;
    let mut completed = Vec::new();
    let mut finished = None;
    while let Some(event) = stream.next().await {
        match event {
            CompileEvent::Started { total_pages } => assert_eq!(total_pages, 2),
            CompileEvent::PageCompleted {
                page_num,
                fraction,
                error,
                ..
            } => completed.push((page_num, fraction, error.is_some())),
            CompileEvent::Finished(result) => finished = Some(result),
        }
    }

    assert_eq!(completed, vec![(1, 0.5, false), (2, 1.0, true)]);
    let doc = finished.expect("finished event").expect("compiled");
    assert_eq!(doc.stats.placeholder_pages, 1);
}
