//! Conversion entry points.
//!
//! [`convert_with`] runs the whole pipeline synchronously against any
//! [`PdfSource`] / [`Rasterizer`] / [`OcrEngine`]. [`convert`] is the async
//! front door: it validates the input, then binds pdfium and tesseract inside
//! `spawn_blocking`, since every stage is CPU-bound or blocks on a child
//! process.

use crate::config::ConversionConfig;
use crate::error::Pdf2MdError;
use crate::ocr::{OcrEngine, TesseractOcr};
use crate::output::{ConversionOutput, ConversionStats, DocumentMetadata};
use crate::pdfium::PdfiumBackend;
use crate::pipeline::assemble::assemble_markdown;
use crate::pipeline::extract::extract_content;
use crate::pipeline::images::process_images;
use crate::pipeline::input::resolve_input;
use crate::source::{PdfSource, Rasterizer};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert a PDF file to Markdown.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(ConversionOutput)` on success, even if some pages or images were
/// skipped (check `output.page_errors`).
///
/// # Errors
/// Returns `Err(Pdf2MdError)` only for fatal errors:
/// - File not found / permission denied / not a `.pdf`
/// - Not a valid or not a readable PDF
/// - pdfium could not be loaded
pub async fn convert(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2MdError> {
    let pdf_path = resolve_input(input)?;
    info!("Starting conversion: {}", pdf_path.display());

    let config = config.clone();
    tokio::task::spawn_blocking(move || {
        let backend = PdfiumBackend::new(&config)?;
        let tesseract = TesseractOcr::from_config(&config);
        let ocr: Option<&dyn OcrEngine> = if !config.ocr {
            None
        } else if tesseract.is_available() {
            Some(&tesseract)
        } else {
            warn!(
                "'{}' not found; skipping image OCR",
                config.tesseract_cmd.display()
            );
            None
        };
        run_pipeline(&backend, &backend, ocr, &pdf_path, &config)
    })
    .await
    .map_err(|e| Pdf2MdError::Internal(format!("Conversion task failed: {}", e)))?
}

/// Convert using caller-supplied collaborators.
///
/// Input validation still runs first, so a missing or non-`.pdf` path fails
/// before `source` is touched.
pub fn convert_with(
    source: &dyn PdfSource,
    rasterizer: &dyn Rasterizer,
    ocr: &dyn OcrEngine,
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2MdError> {
    let pdf_path = resolve_input(input)?;
    let ocr = config.ocr.then_some(ocr);
    run_pipeline(source, rasterizer, ocr, &pdf_path, config)
}

/// Convert a PDF and write the Markdown to `output_path`.
///
/// Uses atomic write (temp file + rename) so a failed conversion never leaves
/// a partial file; an existing file is replaced.
pub async fn convert_to_file(
    input: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2MdError> {
    let output = convert(input, config).await?;
    write_atomic(output_path.as_ref(), &output.markdown).await?;
    Ok(output)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2MdError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2MdError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input, config))
}

/// Extract PDF metadata without converting content.
///
/// Does not require tesseract.
pub async fn inspect(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<DocumentMetadata, Pdf2MdError> {
    let pdf_path = resolve_input(input)?;
    let config = config.clone();
    tokio::task::spawn_blocking(move || {
        let backend = PdfiumBackend::new(&config)?;
        inspect_with(&backend, &pdf_path)
    })
    .await
    .map_err(|e| Pdf2MdError::Internal(format!("Inspect task failed: {}", e)))?
}

/// Read metadata through any [`PdfSource`].
pub fn inspect_with(source: &dyn PdfSource, pdf_path: &Path) -> Result<DocumentMetadata, Pdf2MdError> {
    Ok(source.open(pdf_path)?.metadata())
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn run_pipeline(
    source: &dyn PdfSource,
    rasterizer: &dyn Rasterizer,
    ocr: Option<&dyn OcrEngine>,
    pdf_path: &Path,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2MdError> {
    let total_start = Instant::now();

    // ── Step 1: Extract text, tables, image locations ────────────────────
    let extract_start = Instant::now();
    let mut extraction = extract_content(source, pdf_path, config)?;
    let extraction_duration_ms = extract_start.elapsed().as_millis() as u64;

    // ── Step 2: OCR the image regions ────────────────────────────────────
    let ocr_start = Instant::now();
    let mut rasterised_pages = 0;
    match ocr {
        Some(engine) => {
            let outcome = process_images(
                pdf_path,
                &extraction.content.image_locations,
                rasterizer,
                engine,
                config.progress_callback.as_deref(),
            );
            rasterised_pages = outcome.rasterised_pages;
            extraction.content.image_texts = outcome.texts;
            extraction.page_errors.extend(outcome.errors);
        }
        None => debug!(
            "OCR disabled; {} image regions left unread",
            extraction.content.image_locations.len()
        ),
    }
    let ocr_duration_ms = ocr_start.elapsed().as_millis() as u64;

    // ── Step 3: Assemble ─────────────────────────────────────────────────
    let front_matter = config.include_metadata.then_some(&extraction.metadata);
    let markdown = assemble_markdown(&extraction.content, front_matter);

    let content = extraction.content;
    let extracted_pages = content.pages.len();
    let stats = ConversionStats {
        total_pages: extraction.total_pages,
        extracted_pages,
        failed_pages: extraction.total_pages.saturating_sub(extracted_pages),
        tables: content.pages.iter().map(|p| p.tables.len()).sum(),
        text_blocks: extraction.text_blocks,
        image_locations: content.image_locations.len(),
        image_texts: content.image_texts.len(),
        rasterised_pages,
        extraction_duration_ms,
        ocr_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {}/{} pages, {} image texts, {}ms total",
        stats.extracted_pages, stats.total_pages, stats.image_texts, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(stats.extracted_pages, stats.image_texts);
    }

    Ok(ConversionOutput {
        markdown,
        content,
        metadata: extraction.metadata,
        page_errors: extraction.page_errors,
        stats,
    })
}

async fn write_atomic(path: &Path, contents: &str) -> Result<(), Pdf2MdError> {
    let write_failed = |source: std::io::Error| Pdf2MdError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }

    let tmp_path = temp_sibling(path);
    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(write_failed)?;

    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_failed(e));
    }
    debug!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PageError;
    use crate::output::ImageText;
    use crate::testing::{inside, BlankOcr, ColourRasterizer, MockPage, MockPdf, PixelOcr};
    use std::io::Write;

    /// A real file with a PDF header so input validation passes.
    fn pdf_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        file.write_all(b"%PDF-1.7\n").unwrap();
        file
    }

    #[test]
    fn full_pipeline_with_images() {
        let file = pdf_file();
        let pdf = MockPdf::new(vec![
            MockPage::text("PageOneText").with_image(Some(inside())),
            MockPage::text("PageTwoText"),
        ]);
        let raster = ColourRasterizer::new();
        let out = convert_with(&pdf, &raster, &PixelOcr, file.path(), &ConversionConfig::default())
            .unwrap();

        assert_eq!(
            out.markdown,
            "PageOneText\n\nPageTwoText\n\n## Extracted Image Texts\n\nImage text (Page 1):\nred=1\n\n"
        );
        assert_eq!(*raster.calls.borrow(), vec![1..=1]);
        assert_eq!(out.stats.extracted_pages, 2);
        assert_eq!(out.stats.image_texts, 1);
        assert_eq!(out.stats.rasterised_pages, 1);
    }

    #[test]
    fn ocr_disabled_skips_rasterisation() {
        let file = pdf_file();
        let pdf = MockPdf::new(vec![MockPage::text("a").with_image(Some(inside()))]);
        let raster = ColourRasterizer::new();
        let config = ConversionConfig::builder().ocr(false).build().unwrap();
        let out = convert_with(&pdf, &raster, &PixelOcr, file.path(), &config).unwrap();

        assert_eq!(out.markdown, "a\n\n");
        assert!(raster.calls.borrow().is_empty());
        assert_eq!(out.stats.image_locations, 1);
    }

    #[test]
    fn rasterisation_failure_still_converts_text() {
        let file = pdf_file();
        let pdf = MockPdf::new(vec![MockPage::text("body").with_image(Some(inside()))]);
        let out = convert_with(
            &pdf,
            &ColourRasterizer::failing(),
            &PixelOcr,
            file.path(),
            &ConversionConfig::default(),
        )
        .unwrap();
        assert_eq!(out.markdown, "body\n\n");
        assert!(out.content.image_texts.is_empty());
        assert_eq!(out.stats.rasterised_pages, 0);
        assert_eq!(out.stats.failed_pages, 0);
        assert!(matches!(
            out.page_errors.as_slice(),
            [PageError::RasterisationFailed { first: 1, last: 1, .. }]
        ));
    }

    #[test]
    fn one_unrenderable_page_keeps_the_rest_of_the_range() {
        let file = pdf_file();
        let pdf = MockPdf::new(vec![
            MockPage::text("a").with_image(Some(inside())),
            MockPage::text("b").with_image(Some(inside())),
            MockPage::text("c").with_image(Some(inside())),
        ]);
        let out = convert_with(
            &pdf,
            &ColourRasterizer::with_broken_page(2),
            &PixelOcr,
            file.path(),
            &ConversionConfig::default(),
        )
        .unwrap();

        let texts: Vec<&str> = out.content.image_texts.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["red=1", "red=3"]);
        assert_eq!(out.stats.rasterised_pages, 2);
        assert!(matches!(
            out.page_errors.as_slice(),
            [PageError::RenderFailed { page: 2, .. }]
        ));
    }

    #[test]
    fn blank_ocr_adds_no_section() {
        let file = pdf_file();
        let pdf = MockPdf::new(vec![MockPage::text("a").with_image(Some(inside()))]);
        let out = convert_with(
            &pdf,
            &ColourRasterizer::new(),
            &BlankOcr,
            file.path(),
            &ConversionConfig::default(),
        )
        .unwrap();
        assert_eq!(out.markdown, "a\n\n");
    }

    #[test]
    fn skipped_pages_show_in_stats() {
        let file = pdf_file();
        let pdf = MockPdf::new(vec![
            MockPage::text("one"),
            MockPage::broken(),
            MockPage::text("three"),
        ]);
        let out = convert_with(
            &pdf,
            &ColourRasterizer::new(),
            &PixelOcr,
            file.path(),
            &ConversionConfig::default(),
        )
        .unwrap();
        assert_eq!(out.markdown, "one\n\nthree\n\n");
        assert_eq!(out.stats.failed_pages, 1);
        assert_eq!(out.page_errors.len(), 1);
    }

    #[test]
    fn metadata_front_matter_is_optional() {
        let file = pdf_file();
        let mut pdf = MockPdf::new(vec![MockPage::text("x")]);
        pdf.metadata.title = Some("Report".into());
        let config = ConversionConfig::builder().include_metadata(true).build().unwrap();
        let out = convert_with(&pdf, &ColourRasterizer::new(), &PixelOcr, file.path(), &config)
            .unwrap();
        assert!(out.markdown.starts_with("---\ntitle: \"Report\"\npages: 1\n"));
    }

    #[test]
    fn invalid_input_fails_before_opening() {
        let pdf = MockPdf {
            unreadable: true,
            ..Default::default()
        };
        let err = convert_with(
            &pdf,
            &ColourRasterizer::new(),
            &PixelOcr,
            "/no/such/file.pdf",
            &ConversionConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Pdf2MdError::FileNotFound { .. }));
    }

    #[test]
    fn inspect_reads_metadata() {
        let mut pdf = MockPdf::new(vec![MockPage::text("a"), MockPage::text("b")]);
        pdf.metadata.author = Some("Ada".into());
        let meta = inspect_with(&pdf, Path::new("doc.pdf")).unwrap();
        assert_eq!(meta.page_count, 2);
        assert_eq!(meta.author.as_deref(), Some("Ada"));
    }

    #[test]
    fn image_texts_keep_extraction_order() {
        let file = pdf_file();
        let pdf = MockPdf::new(vec![
            MockPage::text("a").with_image(Some(inside())),
            MockPage::text("b"),
            MockPage::text("c")
                .with_image(Some(inside()))
                .with_image(Some(inside())),
        ]);
        let out = convert_with(
            &pdf,
            &ColourRasterizer::new(),
            &PixelOcr,
            file.path(),
            &ConversionConfig::default(),
        )
        .unwrap();
        let pages: Vec<usize> = out.content.image_texts.iter().map(|t: &ImageText| t.page).collect();
        assert_eq!(pages, vec![1, 3, 3]);
    }

    #[tokio::test]
    async fn write_atomic_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.md");
        write_atomic(&path, "first").await.unwrap();
        write_atomic(&path, "second").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        assert!(!temp_sibling(&path).exists());
    }

    #[test]
    fn convert_rejects_missing_input_without_pdfium() {
        let err = tokio_test::block_on(convert("/no/such/file.pdf", &ConversionConfig::default()))
            .unwrap_err();
        assert!(matches!(err, Pdf2MdError::FileNotFound { .. }));
    }

    #[test]
    fn temp_sibling_keeps_directory() {
        assert_eq!(
            temp_sibling(Path::new("out/doc.md")),
            PathBuf::from("out/doc.md.tmp")
        );
    }
}
