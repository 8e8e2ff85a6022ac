//! Assembly: merge page text, tables and OCR text into one Markdown string.
//!
//! Layout of the output:
//!
//! ```text
//! [--- YAML front matter ---]      (optional)
//! <page 1 text>\n\n
//! <page 1 table 1>\n\n ...
//! <page 2 text>\n\n ...
//! ## Extracted Image Texts\n\n    (only when OCR recovered something)
//! Image text (Page N):\n<text>\n\n ...
//! ```

use crate::output::{DocumentContent, DocumentMetadata};

/// Heading that introduces the OCR section.
pub const IMAGE_TEXTS_HEADING: &str = "## Extracted Image Texts";

/// Assemble the final document. Pure and deterministic.
pub fn assemble_markdown(content: &DocumentContent, front_matter: Option<&DocumentMetadata>) -> String {
    let mut md = String::new();

    if let Some(meta) = front_matter {
        md.push_str(&format_yaml_front_matter(meta));
    }

    for page in &content.pages {
        md.push_str(&page.text);
        md.push_str("\n\n");
        for table in &page.tables {
            md.push_str(table);
            md.push_str("\n\n");
        }
    }

    if !content.image_texts.is_empty() {
        md.push_str(IMAGE_TEXTS_HEADING);
        md.push_str("\n\n");
        for text in &content.image_texts {
            md.push_str(&text.to_string());
            md.push_str("\n\n");
        }
    }

    md
}

/// Format document metadata as YAML front matter.
fn format_yaml_front_matter(meta: &DocumentMetadata) -> String {
    let mut yaml = String::from("---\n");

    let fields = [
        ("title", &meta.title),
        ("author", &meta.author),
        ("subject", &meta.subject),
        ("creator", &meta.creator),
        ("producer", &meta.producer),
    ];
    for (key, value) in fields {
        if let Some(v) = value {
            yaml.push_str(&format!("{}: \"{}\"\n", key, yaml_escape(v)));
        }
    }
    yaml.push_str(&format!("pages: {}\n", meta.page_count));
    if !meta.pdf_version.is_empty() {
        yaml.push_str(&format!("pdf_version: \"{}\"\n", yaml_escape(&meta.pdf_version)));
    }

    yaml.push_str("---\n\n");
    yaml
}

fn yaml_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
