//! # News items
//! The record the feed is made of, plus the single normalization function
//! that turns one raw generator object into a schema-valid item.
//!
//! Defaults (one per optional field):
//! - `source` → [`DEFAULT_SOURCE`]
//! - `timeAgo` → [`DEFAULT_TIME_AGO`]
//! - `summaryPoints` → `[SUMMARY_PLACEHOLDER]`
//! - `url` → generator URL, else grounding link at the same index, else a search URL
//!
//! `category` always comes from the caller and `id` is always synthesized.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::analyze::article::AnalysisData;
use crate::category::Category;
use crate::genai::decode::{text_field, text_list, JsonObject};
use crate::genai::Generation;
use crate::ingest::normalize_text;

pub const DEFAULT_SOURCE: &str = "Google Search";
pub const DEFAULT_TIME_AGO: &str = "Vừa cập nhật";
pub const SUMMARY_PLACEHOLDER: &str = "Chưa có tóm tắt cho bài viết này.";
pub const MAX_SUMMARY_POINTS: usize = 5;

const SEARCH_BASE: &str = "https://www.google.com/search";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub source: String,
    pub time_ago: String,
    pub category: Category,
    pub summary_points: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Attached lazily by the session on first detail view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisData>,
}

impl NewsItem {
    /// Deduplication key: case-insensitive exact title.
    pub fn dedup_key(&self) -> String {
        self.title.to_lowercase()
    }

    /// Case-insensitive substring search over title and summary points.
    pub fn matches_query(&self, query: &str) -> bool {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&q)
            || self
                .summary_points
                .iter()
                .any(|p| p.to_lowercase().contains(&q))
    }
}

static ITEM_SEQ: AtomicU64 = AtomicU64::new(0);

/// `gen-<slug>-<unix millis>-<process sequence>-<index>`.
///
/// The sequence is process-wide, so two cycles landing in the same
/// millisecond still get distinct ids.
pub fn next_item_id(category: Category, index: usize) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let seq = ITEM_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("gen-{}-{millis}-{seq}-{index}", category.slug())
}

fn is_absolute_http(candidate: &str) -> bool {
    url::Url::parse(candidate)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

/// Search-engine URL for a title, used when nothing better is known.
pub fn search_fallback_url(title: &str) -> String {
    url::Url::parse_with_params(SEARCH_BASE, &[("q", title)])
        .map(String::from)
        .unwrap_or_else(|_| SEARCH_BASE.to_string())
}

/// URL priority: generator-supplied absolute URL → grounding link → search URL.
pub fn resolve_url(raw_url: Option<&str>, grounding_link: Option<&str>, title: &str) -> String {
    if let Some(u) = raw_url.map(str::trim).filter(|u| is_absolute_http(u)) {
        return u.to_string();
    }
    if let Some(u) = grounding_link.map(str::trim).filter(|u| is_absolute_http(u)) {
        return u.to_string();
    }
    search_fallback_url(title)
}

/// Normalize one raw generator object fetched for `category`.
///
/// Returns `None` when the object has no usable title. Any `category`
/// value inside `raw` is ignored.
pub fn normalize_item(
    raw: &JsonObject,
    category: Category,
    index: usize,
    generation: &Generation,
) -> Option<NewsItem> {
    let title = text_field(raw, "title")
        .map(|t| normalize_text(&t))
        .filter(|t| !t.is_empty())?;

    let source = text_field(raw, "source")
        .map(|s| normalize_text(&s))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_SOURCE.to_string());

    let time_ago = text_field(raw, "timeAgo")
        .map(|s| normalize_text(&s))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_TIME_AGO.to_string());

    let mut summary_points: Vec<String> = text_list(raw, "summaryPoints")
        .iter()
        .map(|p| normalize_text(p))
        .filter(|p| !p.is_empty())
        .take(MAX_SUMMARY_POINTS)
        .collect();
    if summary_points.is_empty() {
        summary_points.push(SUMMARY_PLACEHOLDER.to_string());
    }

    let raw_url = text_field(raw, "url");
    let url = resolve_url(raw_url.as_deref(), generation.link_at(index), &title);

    Some(NewsItem {
        id: next_item_id(category, index),
        title,
        source,
        time_ago,
        category,
        summary_points,
        url: Some(url),
        analysis: None,
    })
}
