//! Layout segmentation: split a page's glyph stream at font-size changes.
//!
//! Each maximal run of same-size glyphs becomes one [`TextBlock`]. This is a
//! coarse heading/body signal, not a layout analyser: position, font family
//! and weight are ignored, and a size that reappears later starts a new block.

use crate::source::Glyph;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A run of text sharing one font size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
    pub font_size: f32,
}

/// Segment glyphs into blocks in reading order.
///
/// A glyph with a non-finite size stops the scan; the blocks completed before
/// it are returned and the pending buffer is dropped.
pub fn segment_glyphs(glyphs: &[Glyph]) -> Vec<TextBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<f32> = None;
    let mut buffer = String::new();

    for (i, glyph) in glyphs.iter().enumerate() {
        if !glyph.size.is_finite() {
            warn!(
                "Glyph {} has invalid size {}; keeping {} completed blocks",
                i,
                glyph.size,
                blocks.len()
            );
            return blocks;
        }

        if current != Some(glyph.size) {
            if let Some(size) = current {
                if !buffer.is_empty() {
                    blocks.push(TextBlock {
                        text: std::mem::take(&mut buffer),
                        font_size: size,
                    });
                }
            }
            current = Some(glyph.size);
        }
        buffer.push_str(&glyph.text);
    }

    if let Some(size) = current {
        if !buffer.is_empty() {
            blocks.push(TextBlock {
                text: buffer,
                font_size: size,
            });
        }
    }

    blocks
}
