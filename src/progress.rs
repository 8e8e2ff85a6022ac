//! Progress-callback trait for conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline extracts each page and OCRs each image region.
//!
//! # Example
//!
//! ```rust
//! use pdf2markdown::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     pages: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_page_extracted(&self, page_num: usize, total_pages: usize) {
//!         self.pages.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{} extracted", page_num, total_pages);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { pages: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the conversion pipeline as it works through the document.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The pipeline runs on a blocking worker thread, so
/// implementations must be `Send + Sync`.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after the document is opened.
    fn on_conversion_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called when a page's text, tables and images have been collected.
    fn on_page_extracted(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page is skipped.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called before rasterisation, only when at least one image was located.
    fn on_ocr_start(&self, total_images: usize) {
        let _ = total_images;
    }

    /// Called after each image region has been attempted (recognised or skipped).
    ///
    /// `index` is 1-based in extraction order.
    fn on_image_complete(&self, index: usize, total_images: usize, page_num: usize) {
        let _ = (index, total_images, page_num);
    }

    /// Called once after assembly.
    fn on_conversion_complete(&self, extracted_pages: usize, image_texts: usize) {
        let _ = (extracted_pages, image_texts);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
