//! OCR engines.
//!
//! [`OcrEngine`] maps a bitmap to recognised text. [`TesseractOcr`] shells
//! out to the `tesseract` binary: the crop is written to a temporary PNG and
//! the recognised text is read back from stdout.

use crate::config::ConversionConfig;
use image::{DynamicImage, ImageFormat};
use std::path::PathBuf;
use std::process::Command;
use thiserror::Error;
use tracing::debug;

/// Errors raised by an OCR engine for a single image.
#[derive(Debug, Error)]
pub enum OcrError {
    /// Temporary file handling failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The crop could not be encoded for the engine.
    #[error("Image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    /// The engine ran but reported failure.
    #[error("{engine} exited with {status}: {stderr}")]
    Engine {
        engine: String,
        status: String,
        stderr: String,
    },
}

/// Recognises text in a bitmap.
pub trait OcrEngine {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

/// OCR via the external `tesseract` command-line tool.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    cmd: PathBuf,
    language: String,
}

impl TesseractOcr {
    pub fn new(cmd: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            language: language.into(),
        }
    }

    pub fn from_config(config: &ConversionConfig) -> Self {
        Self::new(config.tesseract_cmd.clone(), config.ocr_language.clone())
    }

    /// True when the tesseract binary can be executed.
    pub fn is_available(&self) -> bool {
        Command::new(&self.cmd)
            .arg("--version")
            .output()
            .is_ok_and(|o| o.status.success())
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let input = tempfile::Builder::new()
            .prefix("pdf2markdown-ocr-")
            .suffix(".png")
            .tempfile()?;
        image.save_with_format(input.path(), ImageFormat::Png)?;

        let output = Command::new(&self.cmd)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()?;

        if !output.status.success() {
            return Err(OcrError::Engine {
                engine: self.cmd.display().to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(
            "tesseract: {}x{} px → {} chars",
            image.width(),
            image.height(),
            text.len()
        );
        Ok(text)
    }
}
