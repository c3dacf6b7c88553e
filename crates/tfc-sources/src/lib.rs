//! Source-specific schedule parsers for the two Jerusalem club sites.
//!
//! Both parsers are deliberately brittle: each encodes the fixed layout of
//! exactly one page, and layout drift is expected to surface as an empty
//! yield rather than as wrong data.

pub mod beitar;
pub mod hapoel;

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

pub const CRATE_NAME: &str = "tfc-sources";

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{0}")]
    Message(String),
}

fn parse_selector(selector: &str) -> Result<Selector, SourceError> {
    Selector::parse(selector).map_err(|e| SourceError::Message(e.to_string()))
}

fn text_or_none(value: String) -> Option<String> {
    let trimmed = value.trim().to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn scoped_first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .next()
        .and_then(|n| text_or_none(n.text().collect::<String>()))
}

/// Flatten a document into its visible text lines, in document order. The
/// fan-club page carries no per-field markup, so line order is the only
/// structure its parser can rely on.
pub fn visible_text_lines(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .root_element()
        .text()
        .flat_map(|chunk| chunk.split('\n'))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// `HH:MM` out of a pre-validated token; tolerates trailing text.
fn parse_hm(time: &str) -> Option<(u32, u32)> {
    let hour = time.get(0..2)?.parse().ok()?;
    if time.get(2..3)? != ":" {
        return None;
    }
    let minute = time.get(3..5)?.parse().ok()?;
    Some((hour, minute))
}
