//! In-memory collaborators shared by the unit tests.

use crate::error::{PageError, Pdf2MdError};
use crate::geometry::Rect;
use crate::ocr::{OcrEngine, OcrError};
use crate::output::DocumentMetadata;
use crate::pipeline::table::TableGrid;
use crate::source::{
    Glyph, ImageDescriptor, PageBitmap, PdfSource, Rasterizer, RenderedPage, SourceDocument,
    SourcePage,
};
use image::{DynamicImage, Rgba, RgbaImage};
use std::cell::RefCell;
use std::ops::RangeInclusive;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct MockPage {
    pub text: String,
    pub tables: Vec<TableGrid>,
    pub images: Vec<Option<Rect>>,
    pub glyphs: Vec<Glyph>,
    pub broken_text: bool,
    pub broken_tables: bool,
    pub broken_images: bool,
}

impl MockPage {
    pub fn text(text: &str) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn broken() -> Self {
        Self {
            broken_text: true,
            ..Default::default()
        }
    }

    pub fn with_image(mut self, bbox: Option<Rect>) -> Self {
        self.images.push(bbox);
        self
    }

    pub fn with_table(mut self, grid: &[&[&str]]) -> Self {
        self.tables.push(
            grid.iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        );
        self
    }
}

/// Page handles are cloned out of the document so each has no borrow.
struct PageHandle {
    page: MockPage,
    number: usize,
}

impl SourcePage for PageHandle {
    fn extract_text(&self) -> Result<String, PageError> {
        if self.page.broken_text {
            return Err(PageError::TextExtraction {
                page: self.number,
                detail: "malformed content stream".into(),
            });
        }
        Ok(self.page.text.clone())
    }

    fn extract_tables(&self) -> Result<Vec<TableGrid>, PageError> {
        if self.page.broken_tables {
            return Err(PageError::TableExtraction {
                page: self.number,
                detail: "bad segments".into(),
            });
        }
        Ok(self.page.tables.clone())
    }

    fn images(&self) -> Result<Vec<ImageDescriptor>, PageError> {
        if self.page.broken_images {
            return Err(PageError::ImageEnumeration {
                page: self.number,
                detail: "object #0: unreadable".into(),
            });
        }
        Ok(self
            .page
            .images
            .iter()
            .map(|bbox| ImageDescriptor { bbox: *bbox })
            .collect())
    }

    fn extract_glyphs(&self) -> Result<Vec<Glyph>, PageError> {
        Ok(self.page.glyphs.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockPdf {
    pub pages: Vec<MockPage>,
    pub metadata: DocumentMetadata,
    pub unreadable: bool,
}

impl MockPdf {
    pub fn new(pages: Vec<MockPage>) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }
}

struct OpenedPdf<'a>(&'a MockPdf);

impl SourceDocument for OpenedPdf<'_> {
    fn page_count(&self) -> usize {
        self.0.pages.len()
    }

    fn page<'b>(&'b self, number: usize) -> Result<Box<dyn SourcePage + 'b>, PageError> {
        let page = number
            .checked_sub(1)
            .and_then(|i| self.0.pages.get(i))
            .ok_or_else(|| PageError::TextExtraction {
                page: number,
                detail: "no such page".into(),
            })?;
        Ok(Box::new(PageHandle {
            page: page.clone(),
            number,
        }))
    }

    fn metadata(&self) -> DocumentMetadata {
        DocumentMetadata {
            page_count: self.0.pages.len(),
            ..self.0.metadata.clone()
        }
    }
}

impl PdfSource for MockPdf {
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn SourceDocument + 'a>, Pdf2MdError> {
        if self.unreadable {
            return Err(Pdf2MdError::CorruptPdf {
                path: path.to_path_buf(),
                detail: "xref table missing".into(),
            });
        }
        Ok(Box::new(OpenedPdf(self)))
    }
}

/// Renders each page of a 100x50 pt document at 2 px/pt as a solid colour
/// whose red channel is the page number.
#[derive(Default)]
pub struct ColourRasterizer {
    pub calls: RefCell<Vec<RangeInclusive<usize>>>,
    pub fail: bool,
    pub broken_page: Option<usize>,
}

impl ColourRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_broken_page(page: usize) -> Self {
        Self {
            broken_page: Some(page),
            ..Self::default()
        }
    }
}

impl Rasterizer for ColourRasterizer {
    fn rasterize(
        &self,
        _path: &Path,
        pages: RangeInclusive<usize>,
    ) -> Result<Vec<RenderedPage>, Pdf2MdError> {
        self.calls.borrow_mut().push(pages.clone());
        if self.fail {
            return Err(Pdf2MdError::RasterisationFailed {
                first: *pages.start(),
                last: *pages.end(),
                detail: "no renderer".into(),
            });
        }
        Ok(pages
            .map(|p| {
                if self.broken_page == Some(p) {
                    return Err(PageError::RenderFailed {
                        page: p,
                        detail: "bitmap allocation failed".into(),
                    });
                }
                let image = RgbaImage::from_pixel(200, 100, Rgba([p as u8, 0, 0, 255]));
                Ok(PageBitmap::new(DynamicImage::ImageRgba8(image), 100.0, 50.0))
            })
            .collect())
    }
}

/// Reports the red channel of the crop's top-left pixel.
pub struct PixelOcr;

impl OcrEngine for PixelOcr {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let px = image.to_rgba8().get_pixel(0, 0).0;
        Ok(format!("red={}", px[0]))
    }
}

/// Returns only whitespace and a form feed.
pub struct BlankOcr;

impl OcrEngine for BlankOcr {
    fn recognize(&self, _image: &DynamicImage) -> Result<String, OcrError> {
        Ok(" \n\u{000C}".into())
    }
}

/// A rectangle well inside the 100x50 pt test page.
pub fn inside() -> Rect {
    Rect::new(10.0, 10.0, 40.0, 30.0)
}
