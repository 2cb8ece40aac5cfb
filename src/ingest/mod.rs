// src/ingest/mod.rs
//! Aggregator: per-category fan-out, merge, title dedup, bucket/cap, shuffle.
//!
//! Everything after the fan-out is a pure function of its inputs so each
//! step can be tested without a generator.

pub mod adapter;
pub mod config;
pub mod scheduler;
pub mod types;

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use futures::future::join_all;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::category::Category;
use crate::ingest::config::{IngestConfig, RefreshMode, MAX_PER_CATEGORY};
use crate::ingest::types::NewsSource;
use crate::news::NewsItem;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_fetched_total", "Items returned by category branches.");
        describe_counter!("ingest_dedup_total", "Items removed by title deduplication.");
        describe_counter!("ingest_capped_total", "Items dropped by the per-category cap.");
        describe_counter!(
            "ingest_branch_errors_total",
            "Category branches that failed or timed out."
        );
        describe_counter!(
            "ingest_decode_failures_total",
            "Generator responses that could not be decoded into items."
        );
        describe_histogram!("genai_request_ms", "Generator request time in milliseconds.");
        describe_gauge!(
            "ingest_pipeline_last_run_ts",
            "Unix ts when the ingest pipeline last ran."
        );
        describe_counter!("digest_refresh_runs_total", "Scheduled refresh ticks.");
        describe_counter!(
            "digest_refresh_fallback_total",
            "Cycles that came back empty and kept the current feed."
        );
        describe_counter!(
            "digest_refresh_stale_total",
            "Cycles discarded because a newer one had started."
        );
        describe_gauge!("digest_feed_items", "Items in the published feed.");
    });
}

/// Normalize text: decode entities, strip tags, fold quotes, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 5) Length cap: 1500 chars
    if out.chars().count() > 1500 {
        out = out.chars().take(1500).collect();
    }

    out
}

/// Fan out one request per category, in parallel, and concatenate results in
/// `categories` order. A branch that errors or exceeds `timeout` contributes
/// nothing. Items are re-tagged with the branch category.
pub async fn aggregate(
    source: &dyn NewsSource,
    categories: &[Category],
    timeout: Duration,
) -> Vec<NewsItem> {
    let branches = categories.iter().map(move |&category| async move {
        let items = match tokio::time::timeout(timeout, source.fetch(category)).await {
            Ok(Ok(items)) => items,
            Ok(Err(e)) => {
                tracing::warn!(target: "ingest", error = ?e, source = source.name(), %category, "branch failed");
                counter!("ingest_branch_errors_total").increment(1);
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(
                    target: "ingest",
                    source = source.name(),
                    %category,
                    timeout_secs = timeout.as_secs(),
                    "branch timed out"
                );
                counter!("ingest_branch_errors_total").increment(1);
                Vec::new()
            }
        };
        items
            .into_iter()
            .map(|mut item| {
                item.category = category;
                item
            })
            .collect::<Vec<_>>()
    });

    join_all(branches).await.into_iter().flatten().collect()
}

/// Keep the first item per case-insensitive title, preserving order.
/// Returns (kept, removed).
pub fn dedup_by_title(items: Vec<NewsItem>) -> (Vec<NewsItem>, usize) {
    let mut seen: HashSet<String> = HashSet::with_capacity(items.len());
    let mut kept = Vec::with_capacity(items.len());
    let mut removed = 0usize;
    for item in items {
        if seen.insert(item.dedup_key()) {
            kept.push(item);
        } else {
            removed += 1;
        }
    }
    (kept, removed)
}

/// Fresh items first, then previous ones; first-seen title wins, so fresh
/// items win ties.
pub fn merge_with_previous(fresh: Vec<NewsItem>, previous: Vec<NewsItem>) -> (Vec<NewsItem>, usize) {
    let mut combined = fresh;
    combined.extend(previous);
    dedup_by_title(combined)
}

/// Bucket by category, keep the first `cap` of each bucket, flatten in
/// `order`. Items whose category is not in `order` are dropped.
/// Returns (kept, dropped).
pub fn bucket_and_cap(items: Vec<NewsItem>, order: &[Category], cap: usize) -> (Vec<NewsItem>, usize) {
    let total = items.len();
    let mut buckets: HashMap<Category, Vec<NewsItem>> = HashMap::new();
    for item in items {
        buckets.entry(item.category).or_default().push(item);
    }

    let mut out = Vec::with_capacity(order.len() * cap);
    for category in order {
        if let Some(bucket) = buckets.remove(category) {
            out.extend(bucket.into_iter().take(cap));
        }
    }
    let dropped = total - out.len();
    (out, dropped)
}

/// Uniform shuffle; only ever applied after capping.
pub fn shuffle_items<R: Rng + ?Sized>(items: &mut [NewsItem], rng: &mut R) {
    items.shuffle(rng);
}

/// Result of one aggregation cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleOutcome {
    pub items: Vec<NewsItem>,
    pub fetched: usize,
    pub deduped: usize,
    pub capped: usize,
}

impl CycleOutcome {
    /// Nothing came back from any branch; the caller applies its fallback.
    pub fn is_empty(&self) -> bool {
        self.fetched == 0
    }
}

/// Run one full cycle over every category.
///
/// In merge mode `previous` is appended after the fresh items before dedup;
/// in clean mode it is ignored. An empty fan-out returns an empty outcome
/// without touching `previous`.
pub async fn run_cycle(
    source: &dyn NewsSource,
    cfg: &IngestConfig,
    previous: &[NewsItem],
) -> CycleOutcome {
    ensure_metrics_described();

    let fresh = aggregate(source, &Category::ALL, cfg.request_timeout()).await;
    let fetched = fresh.len();
    counter!("ingest_fetched_total").increment(fetched as u64);

    let now = chrono::Utc::now().timestamp().max(0) as u64;
    gauge!("ingest_pipeline_last_run_ts").set(now as f64);

    if fresh.is_empty() {
        tracing::info!(target: "ingest", source = source.name(), "cycle fetched nothing");
        return CycleOutcome::default();
    }

    let (combined, deduped) = match cfg.mode {
        RefreshMode::Merge => merge_with_previous(fresh, previous.to_vec()),
        RefreshMode::Clean => dedup_by_title(fresh),
    };
    let (mut items, capped) = bucket_and_cap(combined, &Category::ALL, cfg.bucket_cap.clamp(1, MAX_PER_CATEGORY));
    if cfg.shuffle {
        shuffle_items(&mut items, &mut rand::rng());
    }

    counter!("ingest_dedup_total").increment(deduped as u64);
    counter!("ingest_capped_total").increment(capped as u64);

    tracing::info!(
        target: "ingest",
        fetched,
        deduped,
        capped,
        kept = items.len(),
        mode = ?cfg.mode,
        "cycle aggregated"
    );

    CycleOutcome {
        items,
        fetched,
        deduped,
        capped,
    }
}
