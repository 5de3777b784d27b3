use chrono::{DateTime, Datelike, TimeZone};
use serde::{Deserialize, Serialize};

use crate::workflows::editorial::drafts::{Draft, Slug, Timestamp};

const WORDS_PER_MINUTE: usize = 200;
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Immutable public snapshot of a draft at promotion time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedArticle {
    pub slug: Slug,
    pub title: String,
    pub summary: String,
    pub category: String,
    pub content: String,
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub published_at: Timestamp,
    pub date: String,
    pub read_time: String,
}

impl PublishedArticle {
    /// Copy the draft's editorial fields verbatim and derive the display fields.
    pub fn snapshot(draft: &Draft, published_at: Timestamp) -> Self {
        Self {
            slug: draft.slug().clone(),
            title: draft.title().to_string(),
            summary: draft.summary().to_string(),
            category: draft.category().to_string(),
            content: draft.content().to_string(),
            images: draft.images().to_vec(),
            author: draft.author().map(str::to_string),
            published_at,
            date: format_date(&published_at),
            read_time: read_time(draft.content()),
        }
    }
}

/// `"{n} min read"` at 200 words per minute, rounded up. Non-empty content is at least one
/// minute.
pub fn read_time(content: &str) -> String {
    let words = content.split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE);
    format!("{minutes} min read")
}

/// `"20 Feb 2026"`, in the timestamp's own offset.
pub fn format_date<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> String {
    format!(
        "{} {} {}",
        timestamp.day(),
        MONTHS[timestamp.month0() as usize],
        timestamp.year()
    )
}

pub fn format_iso_date(raw: &str) -> Result<String, chrono::ParseError> {
    let parsed = DateTime::parse_from_rfc3339(raw.trim())?;
    Ok(format_date(&parsed))
}
