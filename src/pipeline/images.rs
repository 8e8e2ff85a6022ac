//! Image OCR: rasterise only the pages that hold images, crop each image
//! region out of its page, and recognise the text inside it.
//!
//! ## Why a page range?
//!
//! Rendering is the expensive step. Only the inclusive span from the first to
//! the last page with an image is rendered, so a 300-page report with one
//! chart on page 212 renders one page instead of 300. The bitmap for page `p`
//! is therefore at index `p - first`, not `p - 1`.

use crate::error::{PageError, Pdf2MdError};
use crate::geometry::Rect;
use crate::ocr::OcrEngine;
use crate::output::{ImageLocation, ImageText};
use crate::pipeline::postprocess::clean_ocr_text;
use crate::progress::ConversionProgressCallback;
use crate::source::{PageBitmap, PageRotation, Rasterizer, RenderedPage};
use image::DynamicImage;
use std::ops::RangeInclusive;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Result of the image stage.
#[derive(Debug, Clone, Default)]
pub struct ImageOutcome {
    /// Recognised texts in extraction order, empty results omitted.
    pub texts: Vec<ImageText>,
    /// Regions that were skipped, and the range failure if nothing rendered.
    pub errors: Vec<PageError>,
    /// Number of pages rendered successfully.
    pub rasterised_pages: usize,
}

/// Inclusive page span covering every location, or `None` when empty.
pub fn page_range(locations: &[ImageLocation]) -> Option<RangeInclusive<usize>> {
    let first = locations.iter().map(|l| l.page).min()?;
    let last = locations.iter().map(|l| l.page).max()?;
    Some(first..=last)
}

/// OCR every image location.
///
/// Never fails. A failure to render the range at all is recorded as
/// [`PageError::RasterisationFailed`] and yields no texts; a page that fails
/// to render, a failed crop or a failed OCR call skips only the regions on it.
pub fn process_images(
    pdf_path: &Path,
    locations: &[ImageLocation],
    rasterizer: &dyn Rasterizer,
    ocr: &dyn OcrEngine,
    progress: Option<&dyn ConversionProgressCallback>,
) -> ImageOutcome {
    let mut outcome = ImageOutcome::default();
    let Some(range) = page_range(locations) else {
        debug!("No image locations; skipping rasterisation");
        return outcome;
    };

    if let Some(cb) = progress {
        cb.on_ocr_start(locations.len());
    }

    let (first, last) = (*range.start(), *range.end());
    info!(
        "Rasterising pages {}-{} for {} image regions",
        first,
        last,
        locations.len()
    );
    let bitmaps = match rasterizer.rasterize(pdf_path, range) {
        Ok(b) => b,
        Err(e) => {
            error!("{}", e);
            let detail = match e {
                Pdf2MdError::RasterisationFailed { detail, .. } => detail,
                other => other.to_string(),
            };
            outcome.errors.push(PageError::RasterisationFailed {
                first,
                last,
                detail,
            });
            return outcome;
        }
    };
    outcome.rasterised_pages = bitmaps.iter().filter(|b| b.is_ok()).count();

    let total = locations.len();
    for (i, loc) in locations.iter().enumerate() {
        match recognise_location(loc, first, &bitmaps, ocr) {
            Ok(Some(text)) => outcome.texts.push(ImageText {
                page: loc.page,
                text,
            }),
            Ok(None) => warn!("Page {}: image #{} yielded no text", loc.page, i + 1),
            Err(e) => {
                warn!("{}; skipping image", e);
                outcome.errors.push(e);
            }
        }
        if let Some(cb) = progress {
            cb.on_image_complete(i + 1, total, loc.page);
        }
    }

    info!(
        "OCR recovered text from {}/{} image regions",
        outcome.texts.len(),
        total
    );
    outcome
}

fn recognise_location(
    loc: &ImageLocation,
    first_page: usize,
    bitmaps: &[RenderedPage],
    ocr: &dyn OcrEngine,
) -> Result<Option<String>, PageError> {
    let bitmap = match loc.page.checked_sub(first_page).and_then(|idx| bitmaps.get(idx)) {
        Some(Ok(bitmap)) => bitmap,
        Some(Err(e)) => return Err(e.clone()),
        None => return Err(PageError::MissingBitmap { page: loc.page }),
    };

    let crop = crop_region(bitmap, &loc.bbox).map_err(|detail| PageError::CropFailed {
        page: loc.page,
        detail,
    })?;
    debug!(
        "Page {}: cropped {}x{} px for OCR",
        loc.page,
        crop.width(),
        crop.height()
    );

    let raw = ocr.recognize(&crop).map_err(|e| PageError::OcrFailed {
        page: loc.page,
        detail: e.to_string(),
    })?;

    let text = clean_ocr_text(&raw);
    Ok((!text.is_empty()).then_some(text))
}

/// Cut `rect` (PDF user space, bottom-left origin) out of a rendered page.
///
/// The rectangle is clipped to the page box first, then moved into the
/// bitmap's frame: box origin removed, page rotation applied, y flipped. A
/// rectangle entirely outside the page, or one that collapses to zero pixels,
/// is an error.
pub fn crop_region(bitmap: &PageBitmap, rect: &Rect) -> Result<DynamicImage, String> {
    let page_box = bitmap.page_box;
    let (box_w, box_h) = (page_box.width(), page_box.height());
    if !(box_w.is_finite() && box_h.is_finite() && box_w > 0.0 && box_h > 0.0) {
        return Err(format!("invalid page size {box_w}x{box_h}"));
    }
    let (img_w, img_h) = (bitmap.image.width(), bitmap.image.height());
    if img_w == 0 || img_h == 0 {
        return Err("rendered page has zero dimensions".to_string());
    }

    let clipped = page_box
        .intersection(rect)
        .filter(|r| r.width() > 0.0 && r.height() > 0.0)
        .ok_or_else(|| format!("rectangle {rect:?} lies outside the page box {page_box:?}"))?;

    let x0 = clipped.x0() - page_box.x0();
    let x1 = clipped.x1() - page_box.x0();
    let y0 = clipped.y0() - page_box.y0();
    let y1 = clipped.y1() - page_box.y0();

    // Display frame in points: top-left origin, after clockwise rotation.
    let (left, top, right, bottom) = match bitmap.rotation {
        PageRotation::None => (x0, box_h - y1, x1, box_h - y0),
        PageRotation::Clockwise90 => (y0, x0, y1, x1),
        PageRotation::Clockwise180 => (box_w - x1, y0, box_w - x0, y1),
        PageRotation::Clockwise270 => (box_h - y1, box_w - x1, box_h - y0, box_w - x0),
    };

    let (display_w, display_h) = bitmap.display_size();
    let scale_x = img_w as f32 / display_w;
    let scale_y = img_h as f32 / display_h;

    let left = (left * scale_x).floor().clamp(0.0, img_w as f32) as u32;
    let right = (right * scale_x).ceil().clamp(0.0, img_w as f32) as u32;
    let top = (top * scale_y).floor().clamp(0.0, img_h as f32) as u32;
    let bottom = (bottom * scale_y).ceil().clamp(0.0, img_h as f32) as u32;

    if right <= left || bottom <= top {
        return Err(format!("rectangle {rect:?} produced an empty pixel region"));
    }

    Ok(bitmap.image.crop_imm(left, top, right - left, bottom - top))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{inside, BlankOcr, ColourRasterizer, PixelOcr};
    use image::{Rgba, RgbaImage};

    fn loc(page: usize, rect: Rect) -> ImageLocation {
        ImageLocation { page, bbox: rect }
    }

    #[test]
    fn empty_locations_skip_rasterisation() {
        let r = ColourRasterizer::new();
        let out = process_images(Path::new("x.pdf"), &[], &r, &PixelOcr, None);
        assert!(out.texts.is_empty());
        assert!(r.calls.borrow().is_empty());
    }

    #[test]
    fn only_spanned_pages_are_rasterised() {
        let r = ColourRasterizer::new();
        let locs = [loc(5, inside()), loc(7, inside())];
        let out = process_images(Path::new("x.pdf"), &locs, &r, &PixelOcr, None);
        assert_eq!(*r.calls.borrow(), vec![5..=7]);
        assert_eq!(out.rasterised_pages, 3);
    }

    #[test]
    fn bitmap_index_is_offset_from_range_start() {
        let r = ColourRasterizer::new();
        let locs = [loc(5, inside()), loc(7, inside())];
        let out = process_images(Path::new("x.pdf"), &locs, &r, &PixelOcr, None);
        assert_eq!(
            out.texts,
            vec![
                ImageText { page: 5, text: "red=5".into() },
                ImageText { page: 7, text: "red=7".into() },
            ]
        );
    }

    #[test]
    fn out_of_bounds_crop_skips_only_that_region() {
        let r = ColourRasterizer::new();
        let locs = [
            loc(2, Rect::new(500.0, 500.0, 600.0, 600.0)),
            loc(2, inside()),
        ];
        let out = process_images(Path::new("x.pdf"), &locs, &r, &PixelOcr, None);
        assert_eq!(out.texts.len(), 1);
        assert!(matches!(out.errors[0], PageError::CropFailed { page: 2, .. }));
    }

    #[test]
    fn whitespace_ocr_results_are_dropped() {
        let r = ColourRasterizer::new();
        let out = process_images(Path::new("x.pdf"), &[loc(1, inside())], &r, &BlankOcr, None);
        assert!(out.texts.is_empty());
        assert!(out.errors.is_empty());
    }

    #[test]
    fn rasterisation_failure_degrades() {
        let r = ColourRasterizer::failing();
        let locs = [loc(3, inside()), loc(4, inside())];
        let out = process_images(Path::new("x.pdf"), &locs, &r, &PixelOcr, None);
        assert!(out.texts.is_empty());
        assert_eq!(out.rasterised_pages, 0);
        assert_eq!(
            out.errors,
            vec![PageError::RasterisationFailed {
                first: 3,
                last: 4,
                detail: "no renderer".into(),
            }]
        );
    }

    #[test]
    fn unrenderable_page_skips_only_its_images() {
        let r = ColourRasterizer::with_broken_page(6);
        let locs = [loc(5, inside()), loc(6, inside()), loc(7, inside())];
        let out = process_images(Path::new("x.pdf"), &locs, &r, &PixelOcr, None);

        assert_eq!(*r.calls.borrow(), vec![5..=7]);
        assert_eq!(out.rasterised_pages, 2);
        let pages: Vec<usize> = out.texts.iter().map(|t| t.page).collect();
        assert_eq!(pages, vec![5, 7]);
        assert!(matches!(
            out.errors.as_slice(),
            [PageError::RenderFailed { page: 6, .. }]
        ));
    }

    #[test]
    fn page_range_uses_min_and_max() {
        assert_eq!(page_range(&[]), None);
        let locs = [loc(9, inside()), loc(4, inside()), loc(6, inside())];
        assert_eq!(page_range(&locs), Some(4..=9));
    }

    #[test]
    fn crop_maps_points_to_pixels() {
        // 100x50 pt page rendered at 2 px/pt.
        let mut img = RgbaImage::from_pixel(200, 100, Rgba([0, 0, 0, 255]));
        img.put_pixel(20, 40, Rgba([255, 255, 255, 255]));
        let bitmap = PageBitmap::new(DynamicImage::ImageRgba8(img), 100.0, 50.0);
        // y1 = 30pt from the bottom → 20pt from the top → pixel row 40.
        let crop = crop_region(&bitmap, &Rect::new(10.0, 10.0, 40.0, 30.0)).unwrap();
        assert_eq!((crop.width(), crop.height()), (60, 40));
        assert_eq!(crop.to_rgba8().get_pixel(0, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn crop_clips_partially_outside_rect() {
        let bitmap = PageBitmap::new(DynamicImage::ImageRgba8(RgbaImage::new(100, 50)), 100.0, 50.0);
        let crop = crop_region(&bitmap, &Rect::new(-10.0, -10.0, 20.0, 20.0)).unwrap();
        assert_eq!((crop.width(), crop.height()), (20, 20));
    }

    #[test]
    fn crop_rejects_degenerate_rect() {
        let bitmap = PageBitmap::new(DynamicImage::ImageRgba8(RgbaImage::new(100, 50)), 100.0, 50.0);
        assert!(crop_region(&bitmap, &Rect::new(100.0, 0.0, 120.0, 10.0)).is_err());
    }

    /// Black bitmap with one white pixel at (x, y).
    fn marked(width: u32, height: u32, x: u32, y: u32) -> DynamicImage {
        let mut img = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));
        img.put_pixel(x, y, Rgba([255, 255, 255, 255]));
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn crop_honours_page_box_origin() {
        // Box (50,100)-(150,150); region (60,110)-(90,130) is (10,10)-(40,30) inside it.
        let bitmap = PageBitmap::new(marked(200, 100, 20, 40), 100.0, 50.0)
            .with_page_box(Rect::new(50.0, 100.0, 150.0, 150.0));

        let crop = crop_region(&bitmap, &Rect::new(60.0, 110.0, 90.0, 130.0)).unwrap();
        assert_eq!((crop.width(), crop.height()), (60, 40));
        assert_eq!(crop.to_rgba8().get_pixel(0, 0).0, [255, 255, 255, 255]);

        assert!(crop_region(&bitmap, &inside()).is_err());
    }

    #[test]
    fn crop_on_page_rotated_90() {
        // 100x50 pt box displayed as 50x100 pt, rendered 100x200 px.
        // User (10,10)-(40,30) lands at display x 10..30, y 10..40.
        let bitmap = PageBitmap::new(marked(100, 200, 20, 20), 100.0, 50.0)
            .with_rotation(PageRotation::Clockwise90);

        let crop = crop_region(&bitmap, &inside()).unwrap();
        assert_eq!((crop.width(), crop.height()), (40, 60));
        assert_eq!(crop.to_rgba8().get_pixel(0, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn crop_on_page_rotated_270() {
        // Same box; display x 20..40, y 60..90.
        let bitmap = PageBitmap::new(marked(100, 200, 40, 120), 100.0, 50.0)
            .with_rotation(PageRotation::Clockwise270);

        let crop = crop_region(&bitmap, &inside()).unwrap();
        assert_eq!((crop.width(), crop.height()), (40, 60));
        assert_eq!(crop.to_rgba8().get_pixel(0, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn crop_on_page_rotated_180() {
        // Display x 60..90, y 10..30.
        let bitmap = PageBitmap::new(marked(200, 100, 120, 20), 100.0, 50.0)
            .with_rotation(PageRotation::Clockwise180);

        let crop = crop_region(&bitmap, &inside()).unwrap();
        assert_eq!((crop.width(), crop.height()), (60, 40));
        assert_eq!(crop.to_rgba8().get_pixel(0, 0).0, [255, 255, 255, 255]);
    }
}
