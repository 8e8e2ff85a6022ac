//! # pdf2markdown
//!
//! Convert PDF documents to Markdown: page text, detected tables, and text
//! recovered by OCR from embedded images.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     validate path, `.pdf` suffix and `%PDF` header
//!  ├─ 2. Extract   per page: text, tables, image boxes, font-size blocks
//!  ├─ 3. Images    rasterise the page span holding images (pdfium),
//!  │               crop each box, OCR it (tesseract)
//!  └─ 4. Assemble  page texts + tables, then "## Extracted Image Texts"
//! ```
//!
//! A malformed page or an unreadable image is skipped and recorded in
//! [`ConversionOutput::page_errors`]; only document-level failures return
//! `Err`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2markdown::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let output = convert("document.pdf", &config).await?;
//!     println!("{}", output.markdown);
//!     eprintln!(
//!         "{}/{} pages, {} image texts",
//!         output.stats.extracted_pages,
//!         output.stats.total_pages,
//!         output.stats.image_texts
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Runtime Requirements
//!
//! - A pdfium shared library (`PDFIUM_LIB_PATH`, the working directory, or
//!   the system library path).
//! - The `tesseract` binary for OCR. When it is missing, OCR is skipped with
//!   a warning and text extraction still runs.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2markdown` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2markdown = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod geometry;
pub mod ocr;
pub mod output;
pub mod pdfium;
pub mod pipeline;
pub mod progress;
pub mod source;

#[cfg(test)]
mod testing;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::{convert, convert_sync, convert_to_file, convert_with, inspect, inspect_with};
pub use error::{PageError, Pdf2MdError};
pub use geometry::Rect;
pub use ocr::{OcrEngine, OcrError, TesseractOcr};
pub use output::{
    ConversionOutput, ConversionStats, DocumentContent, DocumentMetadata, ImageLocation,
    ImageText, PageContent,
};
pub use pdfium::PdfiumBackend;
pub use pipeline::table::TableDetectorConfig;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use source::{
    Glyph, ImageDescriptor, PageBitmap, PageRotation, PdfSource, Rasterizer, RenderedPage,
    SourceDocument, SourcePage, TextSpan,
};
