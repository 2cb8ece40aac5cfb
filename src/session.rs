// src/session.rs
//! Session state: the published snapshot plus cycle bookkeeping.
//!
//! The snapshot is replaced wholesale on every successful cycle. The only
//! in-place mutation is attaching a computed analysis to an item (or a
//! report to the snapshot it was generated for).
//!
//! Cycle tokens are handed out by [`Session::begin_cycle`]. A cycle whose
//! token is older than the latest started one is discarded when it
//! finishes, so the last-started cycle always wins.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::analyze::{analyze_article, generate_briefing, generate_market_report};
use crate::analyze::{AnalysisData, Briefing, MarketReport};
use crate::category::Category;
use crate::genai::DynGenerator;
use crate::ingest::adapter::GenerativeNewsSource;
use crate::ingest::config::IngestConfig;
use crate::ingest::types::NewsSource;
use crate::ingest::{ensure_metrics_described, run_cycle};
use crate::news::NewsItem;
use crate::seed;

pub type CycleToken = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Seed,
    Live,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub news: Vec<NewsItem>,
    pub briefing: Briefing,
    pub report: Option<MarketReport>,
    pub last_updated: DateTime<Utc>,
    /// Token of the cycle that produced this snapshot; 0 for seed data.
    pub cycle: CycleToken,
    pub origin: Origin,
}

impl Snapshot {
    fn seed() -> Self {
        Self {
            news: seed::seed_news(),
            briefing: seed::seed_briefing(),
            report: None,
            last_updated: Utc::now(),
            cycle: 0,
            origin: Origin::Seed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New snapshot committed with `items` items.
    Published { cycle: CycleToken, items: usize },
    /// Aggregate came back empty; the current snapshot is untouched.
    FellBack { cycle: CycleToken },
    /// A newer cycle started while this one ran; its result was discarded.
    Stale { cycle: CycleToken },
}

impl RefreshOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshOutcome::Published { .. } => "published",
            RefreshOutcome::FellBack { .. } => "fell_back",
            RefreshOutcome::Stale { .. } => "stale",
        }
    }

    pub fn cycle(&self) -> CycleToken {
        match *self {
            RefreshOutcome::Published { cycle, .. }
            | RefreshOutcome::FellBack { cycle }
            | RefreshOutcome::Stale { cycle } => cycle,
        }
    }

    pub fn items(&self) -> usize {
        match *self {
            RefreshOutcome::Published { items, .. } => items,
            _ => 0,
        }
    }
}

pub struct Session {
    generator: DynGenerator,
    source: Arc<dyn NewsSource>,
    cfg: IngestConfig,
    snapshot: RwLock<Snapshot>,
    latest_started: AtomicU64,
}

impl Session {
    /// Session fed by the generative adapter over `generator`.
    pub fn new(generator: DynGenerator, cfg: IngestConfig) -> Arc<Self> {
        let source = GenerativeNewsSource::new(generator.clone())
            .with_items_per_request(cfg.items_per_request);
        Self::with_source(generator, Arc::new(source), cfg)
    }

    /// Session with an explicit news source (briefing, report and analysis
    /// still go through `generator`).
    pub fn with_source(generator: DynGenerator, source: Arc<dyn NewsSource>, cfg: IngestConfig) -> Arc<Self> {
        ensure_metrics_described();
        Arc::new(Self {
            generator,
            source,
            cfg,
            snapshot: RwLock::new(Snapshot::seed()),
            latest_started: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &IngestConfig {
        &self.cfg
    }

    /// Start a new cycle; tokens increase monotonically from 1.
    pub fn begin_cycle(&self) -> CycleToken {
        self.latest_started.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_stale(&self, token: CycleToken) -> bool {
        token < self.latest_started.load(Ordering::SeqCst)
    }

    /// Begin a cycle and run it.
    pub async fn refresh(self: &Arc<Self>) -> RefreshOutcome {
        let token = self.begin_cycle();
        self.refresh_as(token).await
    }

    /// Run a cycle under an already issued token.
    pub async fn refresh_as(self: &Arc<Self>, token: CycleToken) -> RefreshOutcome {
        let previous = {
            let snap = self.snapshot.read().await;
            match snap.origin {
                Origin::Live => snap.news.clone(),
                Origin::Seed => Vec::new(),
            }
        };

        let outcome = run_cycle(self.source.as_ref(), &self.cfg, &previous).await;

        if self.is_stale(token) {
            return self.discard(token);
        }
        if outcome.is_empty() {
            tracing::warn!(target: "session", cycle = token, "cycle returned nothing, keeping current feed");
            counter!("digest_refresh_fallback_total").increment(1);
            return RefreshOutcome::FellBack { cycle: token };
        }

        let briefing = generate_briefing(&self.generator, &outcome.items, self.cfg.briefing_sample).await;

        let items = outcome.items.len();
        {
            let mut snap = self.snapshot.write().await;
            if self.is_stale(token) || token <= snap.cycle {
                drop(snap);
                return self.discard(token);
            }
            *snap = Snapshot {
                news: outcome.items,
                briefing,
                report: None,
                last_updated: Utc::now(),
                cycle: token,
                origin: Origin::Live,
            };
        }
        gauge!("digest_feed_items").set(items as f64);
        tracing::info!(target: "session", cycle = token, items, "snapshot published");

        self.spawn_report(token);
        RefreshOutcome::Published { cycle: token, items }
    }

    fn discard(&self, token: CycleToken) -> RefreshOutcome {
        tracing::info!(
            target: "session",
            cycle = token,
            latest = self.latest_started.load(Ordering::SeqCst),
            "newer cycle started, discarding result"
        );
        counter!("digest_refresh_stale_total").increment(1);
        RefreshOutcome::Stale { cycle: token }
    }

    /// Generate the market report for the cycle just published. The result
    /// is attached only if that cycle is still the published one.
    fn spawn_report(self: &Arc<Self>, token: CycleToken) {
        let session = Arc::clone(self);
        tokio::spawn(async move {
            let items = session.snapshot.read().await.news.clone();
            let report = generate_market_report(&session.generator, &items, session.cfg.report_sample).await;
            let Some(report) = report else {
                return;
            };
            let mut snap = session.snapshot.write().await;
            if snap.cycle == token {
                snap.report = Some(report);
                tracing::info!(target: "session", cycle = token, "market report attached");
            } else {
                tracing::debug!(target: "session", cycle = token, "market report outdated, dropped");
            }
        });
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.snapshot.read().await.clone()
    }

    pub async fn briefing(&self) -> Briefing {
        self.snapshot.read().await.briefing.clone()
    }

    pub async fn report(&self) -> Option<MarketReport> {
        self.snapshot.read().await.report.clone()
    }

    pub async fn item(&self, id: &str) -> Option<NewsItem> {
        self.snapshot.read().await.news.iter().find(|n| n.id == id).cloned()
    }

    /// Feed filtered by category and a case-insensitive query over title
    /// and summary points.
    pub async fn filtered_news(&self, category: Option<Category>, query: Option<&str>) -> Vec<NewsItem> {
        let snap = self.snapshot.read().await;
        snap.news
            .iter()
            .filter(|n| category.map_or(true, |c| n.category == c))
            .filter(|n| query.map_or(true, |q| n.matches_query(q)))
            .cloned()
            .collect()
    }

    /// Lazy deep analysis. Computed at most once per item; the first stored
    /// result is returned on every later call. `None` for an unknown id or
    /// a failed analysis.
    pub async fn analysis_for(&self, id: &str) -> Option<AnalysisData> {
        let item = {
            let snap = self.snapshot.read().await;
            let item = snap.news.iter().find(|n| n.id == id)?;
            if let Some(a) = &item.analysis {
                return Some(a.clone());
            }
            item.clone()
        };

        let analysis = analyze_article(&self.generator, &item).await?;

        let mut snap = self.snapshot.write().await;
        match snap.news.iter_mut().find(|n| n.id == id) {
            Some(stored) => Some(stored.analysis.get_or_insert(analysis).clone()),
            // Item left the feed while we were computing.
            None => Some(analysis),
        }
    }
}
