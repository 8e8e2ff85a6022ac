//! Content extraction: walk every page and collect text, tables, image
//! locations and layout blocks.
//!
//! A page that cannot be read is logged, recorded as a [`PageError`] and
//! skipped; only failing to open the document at all aborts the conversion.

use crate::config::ConversionConfig;
use crate::error::{PageError, Pdf2MdError};
use crate::output::{DocumentContent, DocumentMetadata, ImageLocation, PageContent};
use crate::pipeline::layout::segment_glyphs;
use crate::pipeline::table::format_table;
use crate::source::{PdfSource, SourcePage};
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Result of the extraction stage.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub content: DocumentContent,
    pub metadata: DocumentMetadata,
    /// Skipped pages and dropped images, in page order.
    pub page_errors: Vec<PageError>,
    pub total_pages: usize,
    pub text_blocks: usize,
}

/// Extract all pages of the document at `pdf_path`.
///
/// # Errors
/// Returns `Err` only when the document itself cannot be opened.
pub fn extract_content(
    source: &dyn PdfSource,
    pdf_path: &Path,
    config: &ConversionConfig,
) -> Result<Extraction, Pdf2MdError> {
    let document = source.open(pdf_path).inspect_err(|e| {
        error!("Cannot open '{}': {}", pdf_path.display(), e);
    })?;

    let total_pages = document.page_count();
    info!("PDF loaded: {} pages", total_pages);
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(total_pages);
    }

    let mut extraction = Extraction {
        metadata: document.metadata(),
        total_pages,
        ..Default::default()
    };

    for page_num in 1..=total_pages {
        let result = document
            .page(page_num)
            .and_then(|page| extract_page(page.as_ref(), page_num, config, &mut extraction));

        match result {
            Ok(()) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_extracted(page_num, total_pages);
                }
            }
            Err(e) => {
                error!("Skipping page {}/{}: {}", page_num, total_pages, e);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_error(page_num, total_pages, &e.to_string());
                }
                extraction.page_errors.push(e);
            }
        }
    }

    info!(
        "Extracted {}/{} pages, {} image locations",
        extraction.content.pages.len(),
        total_pages,
        extraction.content.image_locations.len()
    );

    Ok(extraction)
}

/// Extract one page into `extraction`.
///
/// Text and image failures abort the page before anything is recorded, so a
/// skipped page leaves no partial entries. Table and glyph failures only
/// degrade the page.
fn extract_page(
    page: &dyn SourcePage,
    page_num: usize,
    config: &ConversionConfig,
    extraction: &mut Extraction,
) -> Result<(), PageError> {
    let text = page.extract_text()?;
    if text.trim().is_empty() {
        warn!("Page {}: no extractable text", page_num);
    }

    let mut locations = Vec::new();
    for (index, image) in page.images()?.into_iter().enumerate() {
        match image.bbox {
            Some(bbox) => locations.push(ImageLocation {
                page: page_num,
                bbox,
            }),
            None => {
                let e = PageError::MissingBoundingBox {
                    page: page_num,
                    index,
                };
                warn!("{}; skipping image", e);
                extraction.page_errors.push(e);
            }
        }
    }

    let tables = if config.include_tables {
        match page.extract_tables() {
            Ok(grids) => grids
                .iter()
                .map(|g| format_table(g))
                .filter(|t| !t.is_empty())
                .collect(),
            Err(e) => {
                error!("{}", e);
                extraction.page_errors.push(e);
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    match page.extract_glyphs() {
        Ok(glyphs) => {
            let blocks = segment_glyphs(&glyphs);
            debug!(
                "Page {}: {} glyphs in {} font-size blocks",
                page_num,
                glyphs.len(),
                blocks.len()
            );
            extraction.text_blocks += blocks.len();
        }
        Err(e) => {
            warn!("{}", e);
            extraction.page_errors.push(e);
        }
    }

    debug!(
        "Page {}: {} chars, {} tables, {} images",
        page_num,
        text.len(),
        tables.len(),
        locations.len()
    );

    extraction.content.image_locations.extend_from_slice(&locations);
    extraction.content.pages.push(PageContent {
        page_num,
        text,
        tables,
        images: locations,
    });
    Ok(())
}
