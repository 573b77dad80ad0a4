//! HTML parser for challenge markers and the title heading
//!
//! The document is parsed once and queried for:
//! - A reCAPTCHA container (`div.g-recaptcha[data-sitekey]`)
//! - The slotted title heading (`h1[slot='title']`)

use scraper::{Html, Selector};

/// Extracted information from a fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPage {
    /// Text of the title heading, empty when absent
    pub heading: String,

    /// Whether the page is blocked by a challenge
    pub challenge: ChallengeDetection,
}

/// Result of looking for a challenge marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeDetection {
    /// A challenge container exposing its site key
    Present { site_key: String },

    /// No container, or a container without a usable site key
    NotPresent,
}

impl ChallengeDetection {
    pub fn site_key(&self) -> Option<&str> {
        match self {
            Self::Present { site_key } => Some(site_key),
            Self::NotPresent => None,
        }
    }
}

/// Parses page markup and extracts the heading and challenge marker
///
/// # Example
///
/// ```
/// use threadgrab::pipeline::{parse_page, ChallengeDetection};
///
/// let html = r#"<html><body><h1 slot="title">Hello</h1></body></html>"#;
/// let parsed = parse_page(html);
/// assert_eq!(parsed.heading, "Hello");
/// assert_eq!(parsed.challenge, ChallengeDetection::NotPresent);
/// ```
pub fn parse_page(html: &str) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        heading: heading_text(&document),
        challenge: challenge_marker(&document),
    }
}

/// Returns the challenge site key if the markup contains a challenge
pub fn detect_challenge(html: &str) -> ChallengeDetection {
    challenge_marker(&Html::parse_document(html))
}

/// Returns the title heading text, or an empty string
pub fn extract_heading(html: &str) -> String {
    heading_text(&Html::parse_document(html))
}

/// Finds the site key of a challenge container
///
/// When several containers carry a key, the last one wins.
fn challenge_marker(document: &Html) -> ChallengeDetection {
    let Ok(selector) = Selector::parse("div.g-recaptcha") else {
        return ChallengeDetection::NotPresent;
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("data-sitekey"))
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .last()
        .map(|key| ChallengeDetection::Present {
            site_key: key.to_string(),
        })
        .unwrap_or(ChallengeDetection::NotPresent)
}

/// Concatenates the text of every slotted title heading
fn heading_text(document: &Html) -> String {
    let Ok(selector) = Selector::parse("h1[slot='title']") else {
        return String::new();
    };

    document
        .select(&selector)
        .flat_map(|element| element.text())
        .collect::<String>()
        .trim()
        .to_string()
}
