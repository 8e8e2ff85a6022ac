//! Configuration types for PDF-to-Markdown conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The config is passed explicitly into
//! every stage; nothing in the library reads process-wide settings.

use crate::error::Pdf2MdError;
use crate::pipeline::table::TableDetectorConfig;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;

/// Configuration for a PDF-to-Markdown conversion.
///
/// # Example
/// ```rust
/// use pdf2markdown::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .dpi(300)
///     .ocr_language("deu")
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 300);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Rendering DPI for pages that contain images. Range: 72–600. Default: 200.
    ///
    /// Tesseract is most accurate with glyphs around 20–30 px tall; 200 DPI
    /// gets body text there without the memory cost of 300+.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 6000.
    pub max_rendered_pixels: u32,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Run OCR over embedded images. Default: true.
    pub ocr: bool,

    /// Tesseract language code(s), e.g. "eng" or "eng+deu". Default: "eng".
    pub ocr_language: String,

    /// Tesseract executable. Default: "tesseract" (looked up on `PATH`).
    pub tesseract_cmd: PathBuf,

    /// Detect tables and emit them after each page's text. Default: true.
    pub include_tables: bool,

    /// Thresholds for inferring table grids from text alignment.
    pub table_detector: TableDetectorConfig,

    /// Include YAML front-matter with document metadata. Default: false.
    pub include_metadata: bool,

    /// Optional progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            dpi: 200,
            max_rendered_pixels: 6000,
            password: None,
            ocr: true,
            ocr_language: "eng".to_string(),
            tesseract_cmd: PathBuf::from("tesseract"),
            include_tables: true,
            table_detector: TableDetectorConfig::default(),
            include_metadata: false,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("ocr", &self.ocr)
            .field("ocr_language", &self.ocr_language)
            .field("tesseract_cmd", &self.tesseract_cmd)
            .field("include_tables", &self.include_tables)
            .field("table_detector", &self.table_detector)
            .field("include_metadata", &self.include_metadata)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn ocr(mut self, enabled: bool) -> Self {
        self.config.ocr = enabled;
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn tesseract_cmd(mut self, cmd: impl Into<PathBuf>) -> Self {
        self.config.tesseract_cmd = cmd.into();
        self
    }

    pub fn include_tables(mut self, v: bool) -> Self {
        self.config.include_tables = v;
        self
    }

    pub fn table_detector(mut self, detector: TableDetectorConfig) -> Self {
        self.config.table_detector = detector;
        self
    }

    pub fn include_metadata(mut self, v: bool) -> Self {
        self.config.include_metadata = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2MdError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 600 {
            return Err(Pdf2MdError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if c.table_detector.min_rows == 0 || c.table_detector.min_columns == 0 {
            return Err(Pdf2MdError::InvalidConfig(
                "table detector needs at least one row and one column".into(),
            ));
        }
        if c.ocr_language.trim().is_empty() {
            return Err(Pdf2MdError::InvalidConfig(
                "OCR language must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
