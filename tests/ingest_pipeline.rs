// tests/ingest_pipeline.rs
//
// End-to-end cycles over the generative adapter with a scripted generator.

use std::sync::Arc;

use proptech_digest::category::Category;
use proptech_digest::genai::ScriptedGenerator;
use proptech_digest::ingest::adapter::GenerativeNewsSource;
use proptech_digest::ingest::config::{IngestConfig, RefreshMode};
use proptech_digest::ingest::{bucket_and_cap, run_cycle};

fn titles_for(c: Category) -> Vec<String> {
    (1..=5).map(|i| format!("{} #{i}", c.slug())).collect()
}

/// Five distinct items per category, except for `skip`.
fn full_generator(skip: Option<Category>) -> ScriptedGenerator {
    let mut g = ScriptedGenerator::new();
    for c in Category::ALL {
        if Some(c) == skip {
            continue;
        }
        let titles = titles_for(c);
        let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
        g = g.on_category(c, &refs);
    }
    g
}

fn ordered_cfg() -> IngestConfig {
    IngestConfig {
        shuffle: false,
        mode: RefreshMode::Clean,
        ..IngestConfig::default()
    }
}

#[tokio::test]
async fn thirty_items_five_per_category_in_declared_order() {
    let source = GenerativeNewsSource::new(Arc::new(full_generator(None)));
    let out = run_cycle(&source, &ordered_cfg(), &[]).await;

    assert_eq!(out.fetched, 30);
    assert_eq!(out.items.len(), 30);
    for (i, c) in Category::ALL.iter().enumerate() {
        let chunk = &out.items[i * 5..(i + 1) * 5];
        assert!(chunk.iter().all(|n| n.category == *c), "bucket {c} out of order");
    }
}

#[tokio::test]
async fn unparseable_category_contributes_nothing() {
    let gen = full_generator(Some(Category::ProptechAi)).on_text(
        format!("CHỦ ĐỀ: {}", Category::ProptechAi.label()),
        "not json",
    );
    let source = GenerativeNewsSource::new(Arc::new(gen));
    let out = run_cycle(&source, &ordered_cfg(), &[]).await;

    assert_eq!(out.items.len(), 25);
    assert!(out.items.iter().all(|n| n.category != Category::ProptechAi));
}

#[tokio::test]
async fn duplicate_title_keeps_earlier_category() {
    let mut gen = ScriptedGenerator::new();
    for c in Category::ALL {
        let mut titles = titles_for(c);
        if c == Category::DataReport {
            // same title as the first market-price item, different case
            titles[0] = "MARKET-PRICE #1".to_string();
        }
        let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
        gen = gen.on_category(c, &refs);
    }
    let source = GenerativeNewsSource::new(Arc::new(gen));
    let out = run_cycle(&source, &ordered_cfg(), &[]).await;

    assert_eq!(out.items.len(), 29);
    assert_eq!(out.deduped, 1);
    let dup: Vec<_> = out
        .items
        .iter()
        .filter(|n| n.title.eq_ignore_ascii_case("market-price #1"))
        .collect();
    assert_eq!(dup.len(), 1);
    assert_eq!(dup[0].category, Category::MarketPrice);
}

#[tokio::test]
async fn merge_mode_prefers_fresh_and_respects_cap() {
    let source = GenerativeNewsSource::new(Arc::new(full_generator(None)));
    let cfg = IngestConfig {
        shuffle: false,
        ..IngestConfig::default()
    };
    let first = run_cycle(&source, &cfg, &[]).await;
    let second = run_cycle(&source, &cfg, &first.items).await;

    assert_eq!(second.items.len(), 30);
    assert_eq!(second.deduped, 30);
    // fresh ids win over the previous cycle's ids
    let first_ids: std::collections::HashSet<_> = first.items.iter().map(|n| n.id.clone()).collect();
    assert!(second.items.iter().all(|n| !first_ids.contains(&n.id)));
}

#[tokio::test]
async fn shuffle_keeps_the_same_set() {
    let source = GenerativeNewsSource::new(Arc::new(full_generator(None)));
    let cfg = IngestConfig {
        shuffle: true,
        mode: RefreshMode::Clean,
        ..IngestConfig::default()
    };
    let out = run_cycle(&source, &cfg, &[]).await;
    assert_eq!(out.items.len(), 30);
    for c in Category::ALL {
        assert_eq!(out.items.iter().filter(|n| n.category == c).count(), 5);
    }
}

#[tokio::test]
async fn bucketing_is_idempotent() {
    let source = GenerativeNewsSource::new(Arc::new(full_generator(None)));
    let out = run_cycle(&source, &ordered_cfg(), &[]).await;
    let (again, dropped) = bucket_and_cap(out.items.clone(), &Category::ALL, 5);
    assert_eq!(dropped, 0);
    assert_eq!(again, out.items);
}

#[tokio::test]
async fn oversized_cap_still_holds_five_per_category() {
    let titles: Vec<String> = (1..=8).map(|i| format!("giá nhà #{i}")).collect();
    let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
    let gen = ScriptedGenerator::new().on_category(Category::MarketPrice, &refs);
    let source = GenerativeNewsSource::new(Arc::new(gen));
    let cfg = IngestConfig {
        bucket_cap: 8,
        ..ordered_cfg()
    };
    let out = run_cycle(&source, &cfg, &[]).await;

    assert_eq!(out.fetched, 8);
    assert_eq!(out.items.len(), 5);
    assert_eq!(out.items[4].title, "giá nhà #5");
}
