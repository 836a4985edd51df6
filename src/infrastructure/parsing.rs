//! HTML parsing for marketplace listing and detail pages
//!
//! Selectors come from [`ParsingConfig`] as fallback lists and are compiled
//! once per parser.

pub mod config;
pub mod detail_parser;
pub mod error;
pub mod listing_parser;

pub use config::{DetailSelectors, ListingSelectors, ParsingConfig};
pub use detail_parser::DetailParser;
pub use error::{ParsingError, ParsingResult};
pub use listing_parser::ListingParser;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

/// Compile selector strings, skipping invalid ones.
///
/// Fails only when none of the strings compile.
pub(crate) fn compile_selectors(group: &str, selector_strings: &[String]) -> ParsingResult<Vec<Selector>> {
    let mut selectors = Vec::new();
    let mut errors = Vec::new();

    for selector_str in selector_strings {
        match Selector::parse(selector_str) {
            Ok(selector) => selectors.push(selector),
            Err(e) => {
                warn!("Failed to compile {} selector '{}': {}", group, selector_str, e);
                errors.push(format!("'{selector_str}': {e}"));
            }
        }
    }

    if selectors.is_empty() {
        return Err(ParsingError::NoSelectorsCompiled {
            group: group.to_string(),
            errors: errors.join(", "),
        });
    }

    if !errors.is_empty() {
        debug!("Some {} selectors failed to compile: {}", group, errors.join(", "));
    }

    Ok(selectors)
}

/// Elements matched by the first selector that matches anything, with its index
pub(crate) fn select_first_matching<'a>(
    html: &'a Html,
    selectors: &[Selector],
) -> Option<(usize, Vec<ElementRef<'a>>)> {
    selectors.iter().enumerate().find_map(|(i, selector)| {
        let elements: Vec<ElementRef<'a>> = html.select(selector).collect();
        (!elements.is_empty()).then_some((i, elements))
    })
}

/// Trimmed text of an element, `None` when blank
pub(crate) fn element_text(element: &ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<Vec<_>>().join(" ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}
