//! Collaborator contracts for the pipeline.
//!
//! The extractor and the image processor never talk to pdfium directly; they
//! depend on these traits. [`crate::pdfium::PdfiumBackend`] is the production
//! implementation, tests plug in in-memory fakes.

use crate::error::{PageError, Pdf2MdError};
use crate::geometry::Rect;
use crate::output::DocumentMetadata;
use crate::pipeline::table::TableGrid;
use image::DynamicImage;
use std::ops::RangeInclusive;
use std::path::Path;

/// One rendered character with its visual size.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub text: String,
    /// Font size in points as rendered on the page.
    pub size: f32,
}

impl Glyph {
    pub fn new(text: impl Into<String>, size: f32) -> Self {
        Self {
            text: text.into(),
            size,
        }
    }
}

/// An embedded image reported by the parser. The bounding box is absent when
/// the parser could not compute one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageDescriptor {
    pub bbox: Option<Rect>,
}

/// A run of text with its position on the page, input to table detection.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub rect: Rect,
}

/// Opens documents. Failing here is fatal for the conversion.
pub trait PdfSource {
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn SourceDocument + 'a>, Pdf2MdError>;
}

/// An opened document: an ordered sequence of pages.
pub trait SourceDocument {
    fn page_count(&self) -> usize;

    /// Load a page by 1-based number.
    fn page<'a>(&'a self, number: usize) -> Result<Box<dyn SourcePage + 'a>, PageError>;

    fn metadata(&self) -> DocumentMetadata;
}

/// What the extractor needs from a single page.
pub trait SourcePage {
    fn extract_text(&self) -> Result<String, PageError>;

    fn extract_tables(&self) -> Result<Vec<TableGrid>, PageError>;

    fn images(&self) -> Result<Vec<ImageDescriptor>, PageError>;

    fn extract_glyphs(&self) -> Result<Vec<Glyph>, PageError>;
}

/// Clockwise display rotation of a page, from its `/Rotate` entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PageRotation {
    #[default]
    None,
    Clockwise90,
    Clockwise180,
    Clockwise270,
}

impl PageRotation {
    /// True for 90 and 270 degrees, where display width and height swap.
    pub fn is_quarter_turn(self) -> bool {
        matches!(self, PageRotation::Clockwise90 | PageRotation::Clockwise270)
    }
}

/// A rendered page and the geometry it was rendered from.
///
/// Image bounding boxes come in unrotated user space, while the bitmap shows
/// the page as displayed: `page_box` origin removed and `rotation` applied.
#[derive(Debug, Clone)]
pub struct PageBitmap {
    pub image: DynamicImage,
    /// Visible page box in user space (points), before rotation.
    pub page_box: Rect,
    pub rotation: PageRotation,
}

impl PageBitmap {
    /// Bitmap of an unrotated `width` x `height` pt page with its box at the origin.
    pub fn new(image: DynamicImage, width: f32, height: f32) -> Self {
        Self {
            image,
            page_box: Rect::new(0.0, 0.0, width, height),
            rotation: PageRotation::None,
        }
    }

    pub fn with_page_box(mut self, page_box: Rect) -> Self {
        self.page_box = page_box;
        self
    }

    pub fn with_rotation(mut self, rotation: PageRotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Page size in points as displayed, after rotation.
    pub fn display_size(&self) -> (f32, f32) {
        let (w, h) = (self.page_box.width(), self.page_box.height());
        if self.rotation.is_quarter_turn() {
            (h, w)
        } else {
            (w, h)
        }
    }
}

/// Outcome of rendering one page of a range.
pub type RenderedPage = Result<PageBitmap, PageError>;

/// Renders an inclusive, 1-based page range, one entry per page in order.
///
/// A page that fails to render yields an `Err` entry in its slot so later
/// pages keep their index. `Err` for the whole call means nothing could be
/// rendered (document not loadable, range outside the document).
pub trait Rasterizer {
    fn rasterize(
        &self,
        path: &Path,
        pages: RangeInclusive<usize>,
    ) -> Result<Vec<RenderedPage>, Pdf2MdError>;
}
