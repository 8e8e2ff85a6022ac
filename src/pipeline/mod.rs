//! Pipeline stages for PDF-to-Markdown conversion.
//!
//! Each submodule implements exactly one transformation step, so each is
//! testable on its own against fake collaborators.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ images ──▶ assemble
//! (path)    (text,      (render,    (Markdown)
//!            tables,     crop,
//!            images)     OCR)
//! ```
//!
//! 1. [`input`]: validate the input path (exists, `.pdf`, `%PDF` header)
//! 2. [`extract`]: per page: text, [`table`] grids, image locations,
//!    [`layout`] font-size blocks; bad pages are skipped
//! 3. [`images`]: render only the page span holding images, crop each
//!    region, OCR it, clean it with [`postprocess`]
//! 4. [`assemble`]: page texts and tables in page order, then the OCR section

pub mod assemble;
pub mod extract;
pub mod images;
pub mod input;
pub mod layout;
pub mod postprocess;
pub mod table;
