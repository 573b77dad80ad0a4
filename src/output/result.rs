//! Scrape result types
//!
//! These are the records returned by the API and written by the result sink.
//! Field names on the wire follow the established JSON shape (`time`, `h1`,
//! `comment_id`, `html`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One top-level discussion entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "comment_id")]
    pub id: String,

    pub body: String,

    /// Nesting depth as reported by the listing, when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
}

/// Final output of one scrape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeResult {
    /// The URL the caller asked for
    pub url: String,

    /// Wall-clock time from the page fetch to assembly, human readable
    #[serde(rename = "time")]
    pub elapsed: String,

    /// Title heading text, empty when the page has none
    #[serde(rename = "h1")]
    pub heading: String,

    /// Top-level comments in source order
    pub comments: Vec<Comment>,

    /// Page markup with newlines removed
    pub html: String,

    /// Site key of the challenge that was solved, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_site_key: Option<String>,

    pub scraped_at: DateTime<Utc>,
}

/// Formats a duration the way Go's `time.Duration` prints
///
/// Sub-second values use the largest fitting unit (`ns`, `µs`, `ms`); longer
/// values print as `[Nh][Nm]S.fffs` with trailing zeros dropped.
pub fn format_elapsed(duration: Duration) -> String {
    let nanos = duration.as_nanos();

    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < 1_000 {
        return format!("{}ns", nanos);
    }
    if nanos < 1_000_000 {
        return with_fraction(nanos, 1_000, "µs");
    }
    if nanos < 1_000_000_000 {
        return with_fraction(nanos, 1_000_000, "ms");
    }

    let total_secs = nanos / 1_000_000_000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = with_fraction(nanos % 60_000_000_000, 1_000_000_000, "s");

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    out.push_str(&seconds);
    out
}

fn with_fraction(value: u128, unit: u128, suffix: &str) -> String {
    let whole = value / unit;
    let frac = value % unit;
    if frac == 0 {
        return format!("{}{}", whole, suffix);
    }

    let width = unit.ilog10() as usize;
    let digits = format!("{:0width$}", frac, width = width);
    format!("{}.{}{}", whole, digits.trim_end_matches('0'), suffix)
}
