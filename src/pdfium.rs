//! pdfium-backed document source and rasteriser.
//!
//! One [`PdfiumBackend`] serves both roles: it opens documents for the
//! extractor and renders page ranges for the image stage. Each call loads the
//! document afresh, so nothing from one stage outlives it.
//!
//! ## Binding
//!
//! The library is located in this order: `PDFIUM_LIB_PATH`, a copy next to
//! the working directory, then the system library path.

use crate::config::ConversionConfig;
use crate::error::{PageError, Pdf2MdError};
use crate::geometry::Rect;
use crate::output::DocumentMetadata;
use crate::pipeline::table::{TableDetector, TableGrid};
use crate::source::{
    Glyph, ImageDescriptor, PageBitmap, PageRotation, PdfSource, Rasterizer, RenderedPage,
    SourceDocument, SourcePage, TextSpan,
};
use pdfium_render::prelude::*;
use std::ops::RangeInclusive;
use std::path::Path;
use tracing::{debug, info, warn};

/// Bind to a pdfium shared library.
pub fn bind_pdfium() -> Result<Pdfium, Pdf2MdError> {
    let bindings = match std::env::var_os("PDFIUM_LIB_PATH") {
        Some(path) => {
            let path = path.to_string_lossy().into_owned();
            debug!("Binding pdfium from PDFIUM_LIB_PATH={}", path);
            Pdfium::bind_to_library(path)
        }
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| Pdf2MdError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Document source and rasteriser over pdfium.
pub struct PdfiumBackend {
    pdfium: Pdfium,
    password: Option<String>,
    dpi: u32,
    max_rendered_pixels: u32,
    tables: TableDetector,
}

impl PdfiumBackend {
    /// Bind pdfium and capture the rendering settings from `config`.
    pub fn new(config: &ConversionConfig) -> Result<Self, Pdf2MdError> {
        Ok(Self::with_pdfium(bind_pdfium()?, config))
    }

    pub fn with_pdfium(pdfium: Pdfium, config: &ConversionConfig) -> Self {
        Self {
            pdfium,
            password: config.password.clone(),
            dpi: config.dpi,
            max_rendered_pixels: config.max_rendered_pixels,
            tables: TableDetector::with_config(config.table_detector.clone()),
        }
    }

    fn load<'a>(&'a self, pdf_path: &Path) -> Result<PdfDocument<'a>, Pdf2MdError> {
        let password = self.password.as_deref();
        self.pdfium
            .load_pdf_from_file(pdf_path, password)
            .map_err(|e| {
                let err_str = format!("{:?}", e);
                if err_str.contains("Password") || err_str.contains("password") {
                    if password.is_some() {
                        Pdf2MdError::WrongPassword {
                            path: pdf_path.to_path_buf(),
                        }
                    } else {
                        Pdf2MdError::PasswordRequired {
                            path: pdf_path.to_path_buf(),
                        }
                    }
                } else {
                    Pdf2MdError::CorruptPdf {
                        path: pdf_path.to_path_buf(),
                        detail: err_str,
                    }
                }
            })
    }
}

impl PdfSource for PdfiumBackend {
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn SourceDocument + 'a>, Pdf2MdError> {
        let document = self.load(path)?;
        Ok(Box::new(PdfiumDocument {
            document,
            tables: &self.tables,
        }))
    }
}

impl Rasterizer for PdfiumBackend {
    fn rasterize(
        &self,
        path: &Path,
        pages: RangeInclusive<usize>,
    ) -> Result<Vec<RenderedPage>, Pdf2MdError> {
        let (first, last) = (*pages.start(), *pages.end());

        let document = self.load(path)?;
        let doc_pages = document.pages();
        let total = doc_pages.len() as usize;
        if first == 0 || first > last || last > total {
            return Err(Pdf2MdError::RasterisationFailed {
                first,
                last,
                detail: format!("range outside document of {total} pages"),
            });
        }

        let render_config = PdfRenderConfig::new()
            .scale_page_by_factor(self.dpi as f32 / 72.0)
            .set_maximum_width(self.max_rendered_pixels as i32)
            .set_maximum_height(self.max_rendered_pixels as i32);

        let rendered: Vec<RenderedPage> = pages
            .map(|number| {
                let result = doc_pages
                    .get((number - 1) as u16)
                    .map_err(|e| format!("{e:?}"))
                    .and_then(|page| render_page(&page, &render_config))
                    .map_err(|detail| PageError::RenderFailed {
                        page: number,
                        detail,
                    });
                match &result {
                    Ok(bitmap) => debug!(
                        "Rendered page {} → {}x{} px ({:?})",
                        number,
                        bitmap.image.width(),
                        bitmap.image.height(),
                        bitmap.rotation
                    ),
                    Err(e) => warn!("{}", e),
                }
                result
            })
            .collect();

        info!(
            "Rasterised {}/{} pages ({}-{})",
            rendered.iter().filter(|r| r.is_ok()).count(),
            rendered.len(),
            first,
            last
        );
        Ok(rendered)
    }
}

fn render_page(page: &PdfPage<'_>, config: &PdfRenderConfig) -> Result<PageBitmap, String> {
    let bitmap = page
        .render_with_config(config)
        .map_err(|e| format!("{e:?}"))?;

    let rotation = match page.rotation() {
        Ok(PdfPageRenderRotation::Degrees90) => PageRotation::Clockwise90,
        Ok(PdfPageRenderRotation::Degrees180) => PageRotation::Clockwise180,
        Ok(PdfPageRenderRotation::Degrees270) => PageRotation::Clockwise270,
        Ok(PdfPageRenderRotation::None) | Err(_) => PageRotation::None,
    };

    Ok(PageBitmap {
        image: bitmap.as_image(),
        page_box: visible_box(page, rotation),
        rotation,
    })
}

/// Crop box, else media box, in user space. Falls back to the display size
/// un-rotated at the origin when the page declares neither.
fn visible_box(page: &PdfPage<'_>, rotation: PageRotation) -> Rect {
    let boundaries = page.boundaries();
    match boundaries.crop().or_else(|_| boundaries.media()) {
        Ok(b) => to_rect(b.bounds.left(), b.bounds.bottom(), b.bounds.right(), b.bounds.top()),
        Err(_) => {
            let (w, h) = (page.width().value, page.height().value);
            if rotation.is_quarter_turn() {
                Rect::new(0.0, 0.0, h, w)
            } else {
                Rect::new(0.0, 0.0, w, h)
            }
        }
    }
}

fn to_rect(left: PdfPoints, bottom: PdfPoints, right: PdfPoints, top: PdfPoints) -> Rect {
    Rect::new(left.value, bottom.value, right.value, top.value)
}

struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
    tables: &'a TableDetector,
}

impl SourceDocument for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page<'b>(&'b self, number: usize) -> Result<Box<dyn SourcePage + 'b>, PageError> {
        let load_failed = |detail: String| PageError::TextExtraction {
            page: number,
            detail,
        };
        let index = number
            .checked_sub(1)
            .and_then(|i| u16::try_from(i).ok())
            .ok_or_else(|| load_failed("page number out of range".to_string()))?;
        let page = self
            .document
            .pages()
            .get(index)
            .map_err(|e| load_failed(format!("{:?}", e)))?;

        Ok(Box::new(PdfiumPage {
            page,
            number,
            tables: self.tables,
        }))
    }

    fn metadata(&self) -> DocumentMetadata {
        let metadata = self.document.metadata();

        let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
            metadata.get(tag).and_then(|t| {
                let v = t.value().to_string();
                if v.is_empty() {
                    None
                } else {
                    Some(v)
                }
            })
        };

        DocumentMetadata {
            title: get_meta(PdfDocumentMetadataTagType::Title),
            author: get_meta(PdfDocumentMetadataTagType::Author),
            subject: get_meta(PdfDocumentMetadataTagType::Subject),
            creator: get_meta(PdfDocumentMetadataTagType::Creator),
            producer: get_meta(PdfDocumentMetadataTagType::Producer),
            creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
            modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
            page_count: self.page_count(),
            pdf_version: format!("{:?}", self.document.version()),
        }
    }
}

struct PdfiumPage<'a> {
    page: PdfPage<'a>,
    number: usize,
    tables: &'a TableDetector,
}

impl PdfiumPage<'_> {
    fn text(&self) -> Result<PdfPageText<'_>, String> {
        self.page.text().map_err(|e| format!("{:?}", e))
    }
}

impl SourcePage for PdfiumPage<'_> {
    fn extract_text(&self) -> Result<String, PageError> {
        self.text()
            .map(|t| t.all())
            .map_err(|detail| PageError::TextExtraction {
                page: self.number,
                detail,
            })
    }

    fn extract_tables(&self) -> Result<Vec<TableGrid>, PageError> {
        let text = self.text().map_err(|detail| PageError::TableExtraction {
            page: self.number,
            detail,
        })?;

        let segments = text.segments();
        let spans: Vec<TextSpan> = segments
            .iter()
            .map(|segment| {
                let b = segment.bounds();
                TextSpan {
                    text: segment.text(),
                    rect: to_rect(b.left(), b.bottom(), b.right(), b.top()),
                }
            })
            .collect();

        Ok(self.tables.detect(&spans))
    }

    fn images(&self) -> Result<Vec<ImageDescriptor>, PageError> {
        let objects = self.page.objects();
        let mut images = Vec::new();
        for index in 0..objects.len() {
            let object = objects.get(index).map_err(|e| PageError::ImageEnumeration {
                page: self.number,
                detail: format!("object #{index}: {e:?}"),
            })?;
            if object.object_type() != PdfPageObjectType::Image {
                continue;
            }
            images.push(ImageDescriptor {
                bbox: object
                    .bounds()
                    .ok()
                    .map(|b| to_rect(b.left(), b.bottom(), b.right(), b.top())),
            });
        }
        Ok(images)
    }

    fn extract_glyphs(&self) -> Result<Vec<Glyph>, PageError> {
        let text = self.text().map_err(|detail| PageError::GlyphExtraction {
            page: self.number,
            detail,
        })?;

        let chars = text.chars();
        Ok(chars
            .iter()
            .filter_map(|ch| {
                ch.unicode_string()
                    .map(|s| Glyph::new(s, ch.scaled_font_size().value))
            })
            .collect())
    }
}
