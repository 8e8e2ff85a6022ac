//! CLI binary for pdf2markdown.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and reports results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2markdown::{
    convert_to_file, inspect, ConversionConfig, ConversionOutput, ConversionProgressCallback,
    ConversionStats, Pdf2MdError, ProgressCallback,
};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::error;
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: one bar for page extraction, reused for OCR.
struct CliProgressCallback {
    bar: ProgressBar,
    page_errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, prefix: &'static str, unit: &str, total: usize) {
        let template = format!(
            "{{spinner:.cyan}} {{prefix:.bold}}  \
             [{{bar:42.green/238}}] {{pos:>3}}/{{len}} {unit}  \
             ⏱ {{elapsed_precise}}"
        );
        let progress_style = ProgressStyle::with_template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS);

        self.bar.set_position(0);
        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix(prefix);
        self.bar.reset_eta();
    }

    /// Stop the ticker and remove the bar so error output is not overdrawn.
    fn clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.activate_bar("Extracting", "pages", total_pages);
    }

    fn on_page_extracted(&self, _page_num: usize, _total_pages: usize) {
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        self.page_errors.fetch_add(1, Ordering::SeqCst);

        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            red("✗"),
            page_num,
            total_pages,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_ocr_start(&self, total_images: usize) {
        self.activate_bar("OCR", "images", total_images);
    }

    fn on_image_complete(&self, _index: usize, _total_images: usize, page_num: usize) {
        self.bar.set_message(format!("page {page_num}"));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, extracted_pages: usize, image_texts: usize) {
        self.clear();

        let failed = self.page_errors.load(Ordering::SeqCst);
        eprintln!(
            "{} {} pages extracted{}, {} image texts",
            if failed == 0 { green("✔") } else { cyan("⚠") },
            bold(&extracted_pages.to_string()),
            if failed == 0 {
                String::new()
            } else {
                format!(" ({} skipped)", red(&failed.to_string()))
            },
            bold(&image_texts.to_string()),
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic conversion
  pdf2markdown report.pdf report.md

  # Scanned German document at higher resolution
  pdf2markdown --dpi 300 --lang deu scan.pdf scan.md

  # Text only, no OCR of embedded images
  pdf2markdown --no-ocr paper.pdf paper.md

  # Inspect PDF metadata
  pdf2markdown --inspect-only document.pdf

  # JSON output (ConversionOutput) on stdout, Markdown still written
  pdf2markdown --json document.pdf document.md > result.json

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH   Path to libpdfium (otherwise ./ then the system library)
  RUST_LOG          Overrides the log filter chosen by -v / -q

REQUIREMENTS:
  libpdfium for parsing and rendering; the tesseract binary for OCR. When
  tesseract is missing, images are skipped with a warning.
"#;

/// Convert a PDF file to Markdown, including OCR of embedded images.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2markdown",
    version,
    about = "Convert a PDF file to Markdown, including OCR of embedded images",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input PDF file.
    input: PathBuf,

    /// Output Markdown file (overwritten if it exists).
    #[arg(required_unless_present = "inspect_only")]
    output: Option<PathBuf>,

    /// Rendering DPI for pages holding images (72–600).
    #[arg(long, env = "PDF2MD_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Tesseract language code(s), e.g. eng or eng+deu.
    #[arg(long, env = "PDF2MD_LANG", default_value = "eng")]
    lang: String,

    /// Tesseract executable.
    #[arg(long, env = "PDF2MD_TESSERACT", default_value = "tesseract")]
    tesseract: PathBuf,

    /// Skip OCR of embedded images.
    #[arg(long, env = "PDF2MD_NO_OCR")]
    no_ocr: bool,

    /// Skip table detection.
    #[arg(long, env = "PDF2MD_NO_TABLES")]
    no_tables: bool,

    /// Prepend YAML front-matter with document metadata.
    #[arg(long, env = "PDF2MD_METADATA")]
    metadata: bool,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2MD_PASSWORD")]
    password: Option<String>,

    /// Also print the structured result (ConversionOutput) as JSON on stdout.
    #[arg(long, env = "PDF2MD_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2MD_NO_PROGRESS")]
    no_progress: bool,

    /// Print PDF metadata only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2MD_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Usage errors exit 1 like every other failure; --help/--version exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    init_logging(&cli);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    // The progress bar replaces INFO-level library logs.
    let show_progress = show_progress(cli);
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
}

fn show_progress(cli: &Cli) -> bool {
    !cli.quiet && !cli.no_progress && !cli.verbose
}

async fn run(cli: Cli) -> Result<()> {
    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let config = build_config(&cli, None)?;
        let meta = inspect(&cli.input, &config)
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", cli.input.display());
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
        }
        return Ok(());
    }

    let output_path = cli.output.clone().ok_or_else(|| {
        Pdf2MdError::Usage("an output path is required unless --inspect-only is given".into())
    })?;

    // ── Run conversion ───────────────────────────────────────────────────
    let progress = show_progress(&cli).then(CliProgressCallback::new);
    let output = convert_file(&cli, &output_path, progress).await?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    }

    if !cli.quiet {
        print_summary(&output.stats, &output_path);
    }

    Ok(())
}

/// Build the config and convert. The progress bar is cleared on failure so
/// the final error line is printed on a clean terminal.
async fn convert_file(
    cli: &Cli,
    output_path: &Path,
    progress: Option<Arc<CliProgressCallback>>,
) -> Result<ConversionOutput> {
    let progress_cb = progress
        .clone()
        .map(|cb| cb as Arc<dyn ConversionProgressCallback>);
    let result = match build_config(cli, progress_cb) {
        Ok(config) => convert_to_file(&cli.input, output_path, &config)
            .await
            .with_context(|| format!("Conversion of {} failed", cli.input.display())),
        Err(e) => Err(e),
    };

    if let (Err(_), Some(cb)) = (&result, &progress) {
        cb.clear();
    }
    result
}

fn print_summary(stats: &ConversionStats, output_path: &std::path::Path) {
    eprintln!(
        "{}  {}/{} pages  {} tables  {} image texts  {}ms  →  {}",
        if stats.failed_pages == 0 {
            green("✔")
        } else {
            cyan("⚠")
        },
        stats.extracted_pages,
        stats.total_pages,
        stats.tables,
        stats.image_texts,
        stats.total_duration_ms,
        bold(&output_path.display().to_string()),
    );
    eprintln!(
        "   {}",
        dim(&format!(
            "extract {}ms  /  ocr {}ms over {} rendered pages",
            stats.extraction_duration_ms, stats.ocr_duration_ms, stats.rasterised_pages
        )),
    );
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .dpi(cli.dpi)
        .ocr(!cli.no_ocr)
        .ocr_language(cli.lang.clone())
        .tesseract_cmd(cli.tesseract.clone())
        .include_tables(!cli.no_tables)
        .include_metadata(cli.metadata);

    if let Some(ref password) = cli.password {
        builder = builder.password(password.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
