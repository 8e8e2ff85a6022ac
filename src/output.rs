//! Data carried between pipeline stages and returned to callers.

use crate::error::PageError;
use crate::geometry::Rect;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Everything extracted from one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    /// 1-based page number.
    pub page_num: usize,
    /// Plain text; may be empty.
    pub text: String,
    /// Tables already rendered as Markdown pipe tables.
    pub tables: Vec<String>,
    /// Images on this page that have a bounding box.
    pub images: Vec<ImageLocation>,
}

/// Where an embedded image sits in the document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageLocation {
    /// 1-based page number.
    pub page: usize,
    pub bbox: Rect,
}

/// Text recovered by OCR from one image region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageText {
    /// Page the image was found on.
    pub page: usize,
    pub text: String,
}

impl fmt::Display for ImageText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Image text (Page {}):\n{}", self.page, self.text)
    }
}

/// The aggregate passed from extractor to image processor to assembler.
///
/// `pages` and `image_locations` are filled by extraction in page order, and
/// `image_locations` is the concatenation of every page's `images`;
/// `image_texts` is appended by the image processor, which must run before
/// the document is assembled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentContent {
    pub pages: Vec<PageContent>,
    pub image_locations: Vec<ImageLocation>,
    pub image_texts: Vec<ImageText>,
}

/// Metadata about the source PDF document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

/// Conversion statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionStats {
    pub total_pages: usize,
    pub extracted_pages: usize,
    pub failed_pages: usize,
    pub tables: usize,
    /// Font-size blocks found by layout segmentation across all pages.
    pub text_blocks: usize,
    pub image_locations: usize,
    pub image_texts: usize,
    pub rasterised_pages: usize,
    pub extraction_duration_ms: u64,
    pub ocr_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// The complete result of a conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The assembled Markdown document.
    pub markdown: String,
    pub content: DocumentContent,
    pub metadata: DocumentMetadata,
    /// Pages and image regions that were skipped, in encounter order.
    pub page_errors: Vec<PageError>,
    pub stats: ConversionStats,
}
