//! Input validation: reject anything that is not a readable `.pdf` file
//! before any PDF work starts.
//!
//! The magic-byte check (`%PDF`) turns a renamed text file into a meaningful
//! error instead of a pdfium failure deep inside extraction.

use crate::error::Pdf2MdError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// True when the path ends in `.pdf` (any case).
pub fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Validate a local input path and return it.
///
/// Checks, in order: existence, `.pdf` suffix, read permission, PDF magic bytes.
pub fn resolve_input(path: impl AsRef<Path>) -> Result<PathBuf, Pdf2MdError> {
    let path = path.as_ref().to_path_buf();

    if !path.exists() {
        return Err(Pdf2MdError::FileNotFound { path });
    }

    if !has_pdf_extension(&path) {
        return Err(Pdf2MdError::NotPdfExtension { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(Pdf2MdError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2MdError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(Pdf2MdError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}
