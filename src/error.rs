//! Error types for the pdf2markdown library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Pdf2MdError`]: **Fatal**: the conversion cannot proceed at all
//!   (missing input, wrong extension, a document pdfium cannot open).
//!   Returned as `Err(Pdf2MdError)` from the top-level `convert*` functions.
//!
//! * [`PageError`]: **Non-fatal**: a single page or a single image region
//!   failed (unreadable page, image without a bounding box, crop outside the
//!   page, OCR crash). The unit is skipped, the failure is logged and stored in
//!   [`crate::output::ConversionOutput::page_errors`], and the rest of the
//!   document is converted normally.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2markdown library.
///
/// Page-level and image-level failures use [`PageError`] and are collected
/// into [`crate::output::ConversionOutput`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Pdf2MdError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Wrong command-line usage.
    #[error("Usage: {0}")]
    Usage(String),

    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input path does not end in `.pdf`.
    #[error("Input '{path}' is not a .pdf file")]
    NotPdfExtension { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// Rasterising the requested page range failed as a whole.
    #[error("Rasterisation failed for pages {first}-{last}: {detail}")]
    RasterisationFailed {
        first: usize,
        last: usize,
        detail: String,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium, place the library next to the\n\
binary, or install it system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page or image region.
///
/// The offending unit is skipped; the conversion continues.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The page could not be loaded or its text could not be read.
    #[error("Page {page}: text extraction failed: {detail}")]
    TextExtraction { page: usize, detail: String },

    /// Table detection failed; the page keeps its text but has no tables.
    #[error("Page {page}: table extraction failed: {detail}")]
    TableExtraction { page: usize, detail: String },

    /// The page's image objects could not be enumerated.
    #[error("Page {page}: image enumeration failed: {detail}")]
    ImageEnumeration { page: usize, detail: String },

    /// Per-character records could not be read; layout segmentation skipped.
    #[error("Page {page}: glyph extraction failed: {detail}")]
    GlyphExtraction { page: usize, detail: String },

    /// An embedded image reported no usable bounding box.
    #[error("Page {page}: image #{index} has no bounding box")]
    MissingBoundingBox { page: usize, index: usize },

    /// The rasteriser returned no bitmap for a page inside the requested range.
    #[error("Page {page}: no rasterised bitmap available")]
    MissingBitmap { page: usize },

    /// One page inside the rendered range could not be rendered.
    #[error("Page {page}: rendering failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// The whole page range could not be rendered; no image on it was read.
    #[error("Pages {first}-{last}: rasterisation failed: {detail}")]
    RasterisationFailed {
        first: usize,
        last: usize,
        detail: String,
    },

    /// Cropping an image region out of the rendered page failed.
    #[error("Page {page}: crop failed: {detail}")]
    CropFailed { page: usize, detail: String },

    /// The OCR engine failed on a cropped region.
    #[error("Page {page}: OCR failed: {detail}")]
    OcrFailed { page: usize, detail: String },
}

impl PageError {
    /// 1-based page number the error belongs to; the first page of the
    /// range for a range-wide rasterisation failure.
    pub fn page(&self) -> usize {
        match self {
            PageError::TextExtraction { page, .. }
            | PageError::TableExtraction { page, .. }
            | PageError::ImageEnumeration { page, .. }
            | PageError::GlyphExtraction { page, .. }
            | PageError::MissingBoundingBox { page, .. }
            | PageError::MissingBitmap { page }
            | PageError::RenderFailed { page, .. }
            | PageError::CropFailed { page, .. }
            | PageError::OcrFailed { page, .. } => *page,
            PageError::RasterisationFailed { first, .. } => *first,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_pdf_extension_display() {
        let e = Pdf2MdError::NotPdfExtension {
            path: PathBuf::from("notes.txt"),
        };
        assert!(e.to_string().contains("notes.txt"), "got: {e}");
    }

    #[test]
    fn rasterisation_display_names_range() {
        let e = Pdf2MdError::RasterisationFailed {
            first: 5,
            last: 7,
            detail: "boom".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("5-7"), "got: {msg}");
        assert!(msg.contains("boom"));
    }

    #[test]
    fn page_error_reports_page() {
        let e = PageError::CropFailed {
            page: 4,
            detail: "outside page".into(),
        };
        assert_eq!(e.page(), 4);
        assert!(e.to_string().starts_with("Page 4"));
    }

    #[test]
    fn range_failure_reports_first_page() {
        let e = PageError::RasterisationFailed {
            first: 5,
            last: 7,
            detail: "out of memory".into(),
        };
        assert_eq!(e.page(), 5);
        assert!(e.to_string().starts_with("Pages 5-7"), "got: {e}");
    }

    #[test]
    fn page_error_serialises() {
        let e = PageError::MissingBoundingBox { page: 2, index: 1 };
        let json = serde_json::to_string(&e).expect("serialise");
        assert!(json.contains("MissingBoundingBox"));
    }
}
