//! Application detail page parser
//!
//! Reads the `SoftwareApplication` JSON-LD block first, then the localized
//! genre label and the download size. Attributes that cannot be found are
//! left out of the result.

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use serde_json::Value;
use tracing::{debug, warn};

use super::config::DetailSelectors;
use super::{ParsingConfig, ParsingResult, compile_selectors, element_text, select_first_matching};
use crate::domain::AppDetails;

const SOFTWARE_APPLICATION: &str = "SoftwareApplication";
const SIZE_LABEL: &str = "size";
const NON_CONTENT_ELEMENTS: [&str; 3] = ["script", "style", "noscript"];

pub struct DetailParser {
    structured_data_selectors: Vec<Selector>,
    genre_selectors: Vec<Selector>,
    size_selectors: Vec<Selector>,
    size_pattern: Regex,
}

impl DetailParser {
    pub fn new() -> ParsingResult<Self> {
        Self::from_config(&ParsingConfig::default())
    }

    pub fn from_config(config: &ParsingConfig) -> ParsingResult<Self> {
        Self::with_selectors(&config.detail_selectors)
    }

    pub fn with_selectors(selectors: &DetailSelectors) -> ParsingResult<Self> {
        let size_pattern = Regex::new(r"(?i)\b(varies with device|[0-9]+(?:[.,][0-9]+)?\s*[kMG])B?\b")
            .map_err(|e| super::ParsingError::InvalidSelector {
                selector: "size_pattern".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            structured_data_selectors: compile_selectors("structured_data", &selectors.structured_data)?,
            genre_selectors: compile_selectors("genre", &selectors.genre)?,
            size_selectors: compile_selectors("size", &selectors.size)?,
            size_pattern,
        })
    }

    /// Extract every attribute this page exposes
    pub fn parse(&self, html: &Html) -> AppDetails {
        let mut details = AppDetails::new();

        if let Some(app) = self.software_application(html) {
            self.extract_structured(&app, &mut details);
        } else {
            debug!("No {} structured data on detail page", SOFTWARE_APPLICATION);
        }

        if let Some(genre) = self.extract_genre(html) {
            details.insert("genre".to_string(), Value::String(genre));
        }

        if let Some(size) = self.extract_size(html) {
            details.insert("size".to_string(), Value::String(size));
        }

        details
    }

    fn software_application(&self, html: &Html) -> Option<Value> {
        let (_, scripts) = select_first_matching(html, &self.structured_data_selectors)?;

        scripts.iter().find_map(|script| {
            let raw = script.text().collect::<String>();
            match serde_json::from_str::<Value>(raw.trim()) {
                Ok(value) => find_typed_object(value, SOFTWARE_APPLICATION),
                Err(e) => {
                    warn!("Skipping unreadable JSON-LD block: {}", e);
                    None
                }
            }
        })
    }

    fn extract_structured(&self, app: &Value, details: &mut AppDetails) {
        if let Some(name) = app.get("name").and_then(Value::as_str) {
            details.insert("title".to_string(), Value::String(name.trim().to_string()));
        }

        if let Some(score) = app
            .get("aggregateRating")
            .and_then(|rating| rating.get("ratingValue"))
            .and_then(as_number)
        {
            details.insert("score".to_string(), number_value(score));
        }

        let offer = match app.get("offers") {
            Some(Value::Array(offers)) => offers.first(),
            Some(offer @ Value::Object(_)) => Some(offer),
            _ => None,
        };
        if let Some(price) = offer.and_then(|o| o.get("price")).and_then(as_number) {
            details.insert("price".to_string(), number_value(price));
            details.insert("free".to_string(), Value::Bool(price == 0.0));
        }

        if let Some(rating) = app.get("contentRating").and_then(Value::as_str) {
            details.insert("contentRating".to_string(), Value::String(rating.to_string()));
        }

        if let Some(category) = app.get("applicationCategory").and_then(Value::as_str) {
            details.insert("genre".to_string(), Value::String(humanize_category(category)));
        }
    }

    fn extract_genre(&self, html: &Html) -> Option<String> {
        let (_, elements) = select_first_matching(html, &self.genre_selectors)?;
        elements.iter().find_map(element_text)
    }

    fn extract_size(&self, html: &Html) -> Option<String> {
        if let Some((_, elements)) = select_first_matching(html, &self.size_selectors) {
            if let Some(size) = elements.iter().find_map(element_text) {
                return Some(self.normalize_size_label(&size).unwrap_or(size));
            }
        }

        self.size_after_label(html)
    }

    /// Value rendered right after an element labelled "Size"
    fn size_after_label(&self, html: &Html) -> Option<String> {
        html.root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|element| !NON_CONTENT_ELEMENTS.contains(&element.value().name()))
            .filter(|element| own_text(element).trim_end_matches(':').eq_ignore_ascii_case(SIZE_LABEL))
            .find_map(|label| {
                let value = label.next_siblings().find_map(|node| match node.value() {
                    Node::Element(_) => ElementRef::wrap(node).and_then(|element| element_text(&element)),
                    Node::Text(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
                    _ => None,
                })?;
                self.normalize_size_label(&value)
            })
    }

    /// `"29 MB"` -> `"29M"`, `"512 kb"` -> `"512k"`; `"Varies with device"` is kept verbatim
    fn normalize_size_label(&self, raw: &str) -> Option<String> {
        let captures = self.size_pattern.captures(raw)?;
        let matched = captures.get(1)?.as_str();
        if matched.eq_ignore_ascii_case("varies with device") {
            return Some("Varies with device".to_string());
        }

        let compact = matched.split_whitespace().collect::<String>().replace(',', ".");
        let (number, unit) = compact.split_at(compact.len() - 1);
        let unit = if unit.eq_ignore_ascii_case("k") {
            "k".to_string()
        } else {
            unit.to_ascii_uppercase()
        };
        Some(format!("{number}{unit}"))
    }
}

/// Text of the element's direct text children, trimmed
fn own_text(element: &ElementRef<'_>) -> String {
    element
        .children()
        .filter_map(|child| child.value().as_text())
        .map(|text| text.trim())
        .collect::<String>()
}

/// Find the first JSON object whose `@type` equals `type_name`, searching arrays and `@graph`
fn find_typed_object(value: Value, type_name: &str) -> Option<Value> {
    match value {
        Value::Array(items) => items.into_iter().find_map(|item| find_typed_object(item, type_name)),
        Value::Object(map) => {
            if map.get("@type").and_then(Value::as_str) == Some(type_name) {
                return Some(Value::Object(map));
            }
            map.get("@graph")
                .cloned()
                .and_then(|graph| find_typed_object(graph, type_name))
        }
        _ => None,
    }
}

/// Numbers arrive either as JSON numbers or as strings like `"4.99"`
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Whole numbers are kept as integers so they render as `0` rather than `0.0`
#[allow(clippy::cast_possible_truncation)]
fn number_value(number: f64) -> Value {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        Value::from(number as i64)
    } else {
        Value::from(number)
    }
}

/// `GAME_ACTION` -> `Game Action`
fn humanize_category(category: &str) -> String {
    category
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            chars
                .next()
                .map(|first| first.to_uppercase().chain(chars).collect::<String>())
                .unwrap_or_default()
        })
        .collect::<Vec<_>>()
        .join(" ")
}
