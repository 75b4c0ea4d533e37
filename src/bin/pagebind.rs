//! CLI binary for pagebind.
//!
//! A thin shim over the library crate: builds a `PageCollection` from the
//! command line, applies edits, then compiles it to a PDF.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pagebind::{
    CaptureSession, CompileConfig, CompileProgressCallback, Compiler, MoveDirection,
    PageCollection, Progress, ProgressCallback, ScreenshotFileSource, A4_PORTRAIT,
    DEFAULT_OUTPUT_FILENAME, LETTER_PORTRAIT,
};
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar with percentage plus one log line
/// per page.
struct CliProgressCallback {
    bar: ProgressBar,
    page_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} pages  {percent:>3}%  \
                 ⏱ {elapsed_precise}  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Generating");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_started: Mutex::new(None),
        })
    }

    fn page_elapsed(&self) -> String {
        let ms = self
            .page_started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);
        dim(&format!("{:.1}s", ms as f64 / 1000.0))
    }
}

impl CompileProgressCallback for CliProgressCallback {
    fn on_compile_start(&self, total_pages: usize) {
        self.bar.set_length(total_pages as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Generating PDF from {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut t) = self.page_started.lock() {
            *t = Some(Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, width: u32, height: u32) {
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<12}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{width}×{height}")),
            self.page_elapsed(),
        ));
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        // Truncate very long error messages to keep output tidy.
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
            self.page_elapsed(),
        ));
    }

    fn on_progress(&self, progress: Progress) {
        self.bar.set_position(progress.completed as u64);
    }

    fn on_compile_complete(&self, total_pages: usize, success_count: usize) {
        let failed = total_pages.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} pages rendered",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages rendered  ({} placeholders)",
                if failed == total_pages {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_pages,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Bind two remote page images
  pagebind https://example.com/p1.jpg https://example.com/p2.jpg

  # Import pages copied from the browser console (a JSON array of data URLs)
  pagebind --import pages.json -o book.pdf

  # Paste the array on stdin
  pbpaste | pagebind --import -

  # Add screenshots, drop page 2, move page 3 up, list before generating
  pagebind --capture shot1.png --capture shot2.png https://example.com/p3.jpg \
           --remove 2 --move 2:up --list

  # JSON report of what was generated
  pagebind --json --no-progress --import pages.json > report.json

FAILED PAGES:
  A page that cannot be fetched or decoded is not skipped: it becomes a
  blank placeholder page reading "Error loading page N", and the rest of
  the document is generated normally.

ENVIRONMENT VARIABLES:
  PAGEBIND_OUTPUT         Output PDF path
  PAGEBIND_FETCH_TIMEOUT  Per-image fetch timeout in seconds
  PAGEBIND_PLACEHOLDER    Placeholder page size (a4, letter)
  RUST_LOG                Override the log filter
"#;

/// Bind page images from URLs, pasted data and screenshots into one PDF.
#[derive(Parser, Debug)]
#[command(
    name = "pagebind",
    version,
    about = "Bind page images from URLs, pasted data and screenshots into one PDF",
    long_about = "Collect page images (image URLs, data URLs copied from a browser console, \
or screenshots) into an ordered list without duplicates, then generate a single PDF where \
every page takes the size and orientation of its own image.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Image URLs or data:image URLs, added in order.
    sources: Vec<String>,

    /// JSON array of data:image URLs to bulk import (`-` reads stdin).
    #[arg(short, long, value_name = "FILE")]
    import: Vec<PathBuf>,

    /// Screenshot file captured as a page.
    #[arg(short, long, value_name = "FILE")]
    capture: Vec<PathBuf>,

    /// Remove page N (1-based) after all pages are added.
    #[arg(long, value_name = "N")]
    remove: Vec<usize>,

    /// Move page N one step, e.g. `3:up` or `1:down`. Applied in order.
    #[arg(long = "move", value_name = "N:DIR", value_parser = parse_move)]
    moves: Vec<(usize, MoveDirection)>,

    /// Write the PDF here.
    #[arg(short, long, env = "PAGEBIND_OUTPUT", default_value = DEFAULT_OUTPUT_FILENAME)]
    output: PathBuf,

    /// Print the page list and exit without generating.
    #[arg(long)]
    list: bool,

    /// Print a JSON report (or the page list with --list) to stdout.
    #[arg(long, env = "PAGEBIND_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PAGEBIND_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PAGEBIND_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PAGEBIND_QUIET")]
    quiet: bool,

    /// Per-image HTTP fetch timeout in seconds.
    #[arg(long, env = "PAGEBIND_FETCH_TIMEOUT", default_value_t = 120)]
    fetch_timeout: u64,

    /// Size of placeholder pages for images that fail to load.
    #[arg(long, env = "PAGEBIND_PLACEHOLDER", value_enum, default_value = "a4")]
    placeholder: PlaceholderArg,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PlaceholderArg {
    A4,
    Letter,
}

impl PlaceholderArg {
    fn size(self) -> (f32, f32) {
        match self {
            PlaceholderArg::A4 => A4_PORTRAIT,
            PlaceholderArg::Letter => LETTER_PORTRAIT,
        }
    }
}

/// Parse `--move` values such as `3:up`.
fn parse_move(s: &str) -> Result<(usize, MoveDirection), String> {
    let (n, dir) = s
        .split_once(':')
        .ok_or_else(|| format!("expected N:up or N:down, got '{s}'"))?;
    let n: usize = n
        .trim()
        .parse()
        .map_err(|_| format!("invalid page number '{}'", n.trim()))?;
    if n < 1 {
        return Err("pages are 1-indexed, minimum is 1".into());
    }
    let dir = match dir.trim().to_lowercase().as_str() {
        "up" => MoveDirection::Up,
        "down" => MoveDirection::Down,
        other => return Err(format!("direction must be 'up' or 'down', got '{other}'")),
    };
    Ok((n, dir))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.list;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Collect pages ────────────────────────────────────────────────────
    let mut pages = PageCollection::new();
    collect_pages(&cli, &mut pages)?;
    apply_edits(&cli, &mut pages)?;

    if cli.list {
        print_list(&pages, cli.json)?;
        return Ok(());
    }

    if pages.is_empty() {
        anyhow::bail!("No pages to generate. Pass image URLs, --import or --capture.");
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn CompileProgressCallback>)
    } else {
        None
    };

    let mut builder = CompileConfig::builder()
        .fetch_timeout_secs(cli.fetch_timeout)
        .placeholder_size(cli.placeholder.size());
    if let Some(cb) = progress_cb {
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    // ── Generate ─────────────────────────────────────────────────────────
    let compiler = Compiler::new(config).context("Failed to set up compiler")?;
    let doc = compiler
        .compile(&pages.snapshot())
        .await
        .context("PDF generation failed")?;
    doc.save(&cli.output)
        .await
        .context("Failed to save PDF")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&doc).context("Failed to serialise report")?
        );
    }

    if !cli.quiet {
        let stats = &doc.stats;
        eprintln!(
            "{}  {}/{} pages  {}ms  →  {}",
            if stats.placeholder_pages == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            stats.rendered_pages,
            stats.total_pages,
            stats.total_duration_ms,
            bold(&cli.output.display().to_string()),
        );
    }

    Ok(())
}

/// Add sources, bulk imports and captures, in that order.
fn collect_pages(cli: &Cli, pages: &mut PageCollection) -> Result<()> {
    let added = pages.add_pages(cli.sources.iter().map(String::as_str));
    let skipped = cli.sources.len() - added.len();
    if skipped > 0 {
        warn!("Skipped {} duplicate source(s)", skipped);
    }

    for path in &cli.import {
        let text = if path.as_os_str() == "-" {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read bulk import from stdin")?;
            buf
        } else {
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read bulk import from {:?}", path))?
        };
        let ids = pages
            .import_bulk(&text)
            .with_context(|| format!("Bulk import from {:?} rejected", path))?;
        info!("Imported {} pages from {:?}", ids.len(), path);
    }

    for path in &cli.capture {
        let source = ScreenshotFileSource::open(path)
            .with_context(|| format!("Failed to capture {:?}", path))?;
        let mut session = CaptureSession::start(source);
        if session.capture_into(pages)?.is_none() {
            warn!("Capture {:?} is identical to an existing page, skipped", path);
        }
        session.stop();
    }

    Ok(())
}

/// Apply `--remove` then `--move`, both 1-based against the collected list.
fn apply_edits(cli: &Cli, pages: &mut PageCollection) -> Result<()> {
    let doomed: Vec<_> = cli
        .remove
        .iter()
        .map(|&n| {
            n.checked_sub(1)
                .and_then(|i| pages.get(i))
                .map(|e| e.id)
                .with_context(|| format!("--remove {n}: no such page (have {})", pages.len()))
        })
        .collect::<Result<_>>()?;
    for id in doomed {
        pages.remove_page(id);
    }

    for &(n, dir) in &cli.moves {
        if !pages.move_page(n - 1, dir) {
            warn!("--move {}:{:?} has no effect", n, dir);
        }
    }
    Ok(())
}

fn print_list(pages: &PageCollection, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(pages.entries()).context("Failed to serialise pages")?
        );
        return Ok(());
    }
    if pages.is_empty() {
        println!("{}", dim("No pages added yet."));
        return Ok(());
    }
    println!("{}", bold(&format!("Captured Pages ({})", pages.len())));
    for (n, entry) in pages.iter_numbered() {
        println!("  Page {:>3}  {}", n, entry.display_label());
    }
    Ok(())
}
