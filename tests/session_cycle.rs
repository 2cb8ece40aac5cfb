// tests/session_cycle.rs
//
// Snapshot lifecycle: publish, fallback, stale cycles, lazy analysis.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use proptech_digest::category::Category;
use proptech_digest::genai::ScriptedGenerator;
use proptech_digest::ingest::config::IngestConfig;
use proptech_digest::ingest::types::NewsSource;
use proptech_digest::news::{next_item_id, NewsItem};
use proptech_digest::session::{Origin, RefreshOutcome, Session};

fn cfg() -> IngestConfig {
    IngestConfig {
        shuffle: false,
        ..IngestConfig::default()
    }
}

/// One item per category while `live` is set, nothing otherwise.
struct SwitchSource {
    live: AtomicBool,
}

#[async_trait]
impl NewsSource for SwitchSource {
    async fn fetch(&self, category: Category) -> Result<Vec<NewsItem>> {
        if !self.live.load(Ordering::SeqCst) {
            return Ok(Vec::new());
        }
        Ok(vec![NewsItem {
            id: next_item_id(category, 0),
            title: format!("{} duy nhất", category.label()),
            source: "Test".into(),
            time_ago: "vừa xong".into(),
            category,
            summary_points: vec!["ý chính".into()],
            url: None,
            analysis: None,
        }])
    }
    fn name(&self) -> &'static str {
        "switch"
    }
}

#[tokio::test]
async fn refresh_publishes_live_snapshot() {
    let session = Session::new(Arc::new(ScriptedGenerator::demo()), cfg());
    let outcome = session.refresh().await;
    assert_eq!(outcome, RefreshOutcome::Published { cycle: 1, items: 30 });

    let snap = session.snapshot().await;
    assert_eq!(snap.origin, Origin::Live);
    assert_eq!(snap.cycle, 1);
    assert_eq!(snap.news.len(), 30);
    assert!(snap.news.iter().all(|n| !n.id.starts_with("seed-")));
    assert_eq!(snap.briefing.highlights.len(), 3);
}

#[tokio::test]
async fn report_arrives_in_background() {
    let session = Session::new(Arc::new(ScriptedGenerator::demo()), cfg());
    assert!(session.report().await.is_none());
    session.refresh().await;

    let mut report = None;
    for _ in 0..100 {
        report = session.report().await;
        if report.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(report.is_some(), "report should be attached after publish");
}

#[tokio::test]
async fn empty_cycle_keeps_seed_data() {
    let session = Session::new(Arc::new(ScriptedGenerator::new()), cfg());
    let outcome = session.refresh().await;
    assert!(matches!(outcome, RefreshOutcome::FellBack { .. }));

    let snap = session.snapshot().await;
    assert_eq!(snap.origin, Origin::Seed);
    assert_eq!(snap.news.len(), 5);
}

#[tokio::test]
async fn empty_cycle_after_live_keeps_live_data() {
    let source = Arc::new(SwitchSource {
        live: AtomicBool::new(true),
    });
    let session = Session::with_source(Arc::new(ScriptedGenerator::demo()), source.clone(), cfg());

    let first = session.refresh().await;
    assert_eq!(first.items(), 6);
    source.live.store(false, Ordering::SeqCst);
    let second = session.refresh().await;
    assert!(matches!(second, RefreshOutcome::FellBack { cycle: 2 }));

    let snap = session.snapshot().await;
    assert_eq!(snap.cycle, 1);
    assert_eq!(snap.news.len(), 6);
}

#[tokio::test]
async fn older_cycle_is_discarded() {
    let session = Session::new(Arc::new(ScriptedGenerator::demo()), cfg());
    let older = session.begin_cycle();
    let newer = session.begin_cycle();
    assert!(newer > older);

    let outcome = session.refresh_as(older).await;
    assert_eq!(outcome, RefreshOutcome::Stale { cycle: older });
    assert_eq!(session.snapshot().await.origin, Origin::Seed);

    let outcome = session.refresh_as(newer).await;
    assert!(matches!(outcome, RefreshOutcome::Published { .. }));
    assert_eq!(session.snapshot().await.cycle, newer);
}

#[tokio::test]
async fn analysis_is_computed_once() {
    let gen = Arc::new(ScriptedGenerator::demo());
    let session = Session::new(gen.clone(), cfg());

    let first = session.analysis_for("seed-1").await.expect("analysis");
    let calls = gen.call_count();
    let second = session.analysis_for("seed-1").await.expect("cached analysis");
    assert_eq!(first, second);
    assert_eq!(gen.call_count(), calls);

    let item = session.item("seed-1").await.unwrap();
    assert_eq!(item.analysis, Some(first));
}

#[tokio::test]
async fn unknown_id_and_failed_analysis_are_none() {
    let gen = Arc::new(ScriptedGenerator::new().failing_on("PHÂN TÍCH ĐẦU TƯ", "quota"));
    let session = Session::new(gen.clone(), cfg());

    assert!(session.analysis_for("nope").await.is_none());
    assert_eq!(gen.call_count(), 0);

    assert!(session.analysis_for("seed-2").await.is_none());
    assert!(session.item("seed-2").await.unwrap().analysis.is_none());
}
