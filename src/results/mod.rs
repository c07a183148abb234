//! Report generation module
//!
//! Renders run summaries as HTML and JUnit XML files.

mod html;
mod junit;

pub use html::write_html_report;
pub use junit::write_junit_report;

use anyhow::{Context, Result};
use std::path::Path;

/// Escape text for HTML and XML bodies and attributes
pub(crate) fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Escape text for XML 1.0; characters XML cannot carry become U+FFFD
pub(crate) fn escape_xml(text: &str) -> String {
    let legal: String = text
        .chars()
        .map(|ch| if is_xml_char(ch) { ch } else { '\u{FFFD}' })
        .collect();
    escape_markup(&legal)
}

fn is_xml_char(ch: char) -> bool {
    matches!(
        ch,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

fn write_report(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write report: {}", path.display()))
}
