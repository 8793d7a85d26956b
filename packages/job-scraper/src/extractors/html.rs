//! Small helpers over `scraper` shared by the portal parsers.

use scraper::{ElementRef, Selector};

use crate::error::{ExtractError, ExtractResult};
use crate::normalize::clean_text;

/// Parse a CSS selector, reporting which one failed.
pub fn selector(css: &str) -> ExtractResult<Selector> {
    Selector::parse(css).map_err(|e| ExtractError::Selector(format!("{}: {}", css, e)))
}

/// All text under an element, whitespace collapsed.
pub fn element_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

/// Non-empty text nodes under an element, each cleaned.
pub fn text_segments(element: ElementRef<'_>) -> Vec<String> {
    element
        .text()
        .map(clean_text)
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Text of the first match under `root`, or empty.
pub fn first_text(root: ElementRef<'_>, selector: &Selector) -> String {
    root.select(selector)
        .next()
        .map(element_text)
        .unwrap_or_default()
}

/// The next `limit` element siblings after `element`.
pub fn next_element_siblings(element: ElementRef<'_>, limit: usize) -> Vec<ElementRef<'_>> {
    element
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .take(limit)
        .collect()
}
