//! Parsing error types for marketplace markup
//!
//! Listing and detail pages are scraped from live markup; these errors
//! describe which part of the expected page shape was missing.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    #[error("Attribute '{attribute}' missing on element matched by '{selector}'")]
    RequiredAttributeMissing { attribute: String, selector: String },

    #[error("No application identifier in link '{href}'")]
    IdentifierMissing { href: String },

    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("No valid selectors compiled for {group}: {errors}")]
    NoSelectorsCompiled { group: String, errors: String },

    #[error("URL resolution failed: {url} - {reason}")]
    UrlResolutionFailed {
        url: String,
        reason: String,
        base_url: Option<String>,
    },
}

impl ParsingError {
    pub fn required_attribute_missing(attribute: &str, selector: &str) -> Self {
        Self::RequiredAttributeMissing {
            attribute: attribute.to_string(),
            selector: selector.to_string(),
        }
    }

    pub fn identifier_missing(href: &str) -> Self {
        Self::IdentifierMissing {
            href: href.to_string(),
        }
    }

    pub fn url_resolution_failed(url: &str, reason: impl ToString, base_url: Option<&str>) -> Self {
        Self::UrlResolutionFailed {
            url: url.to_string(),
            reason: reason.to_string(),
            base_url: base_url.map(ToString::to_string),
        }
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;
