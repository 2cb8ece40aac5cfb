// tests/analysis.rs
//
// Briefing, market report and article analysis degrade to defaults instead
// of failing.

use std::sync::Arc;

use proptech_digest::analyze::article::{analyze_article, Action, ImpactLevel, Trend, TEXT_PLACEHOLDER};
use proptech_digest::analyze::briefing::{generate_briefing, GENERATION_ERROR, INSUFFICIENT_DATA, MAX_HIGHLIGHTS};
use proptech_digest::analyze::report::{generate_market_report, Outlook};
use proptech_digest::genai::{DynGenerator, ScriptedGenerator};
use proptech_digest::seed::seed_news;

fn gen(g: ScriptedGenerator) -> DynGenerator {
    Arc::new(g)
}

#[tokio::test]
async fn partial_analysis_is_completed_with_defaults() {
    let g = gen(ScriptedGenerator::new().on_text(
        "PHÂN TÍCH ĐẦU TƯ",
        r#"{"impactLevel":"High","assessment":{"score":99}}"#,
    ));
    let item = &seed_news()[0];
    let a = analyze_article(&g, item).await.expect("analysis");
    assert_eq!(a.impact_level, ImpactLevel::High);
    assert_eq!(a.assessment.score, 10);
    assert_eq!(a.assessment.trend, Trend::Stable);
    assert_eq!(a.strategy.action, Action::WaitForSignal);
    assert_eq!(a.impacts.price, TEXT_PLACEHOLDER);
}

#[tokio::test]
async fn analysis_none_on_failure_or_non_object() {
    let item = &seed_news()[1];

    let failing = gen(ScriptedGenerator::new().failing_on("PHÂN TÍCH ĐẦU TƯ", "quota"));
    assert!(analyze_article(&failing, item).await.is_none());

    let array = gen(ScriptedGenerator::new().on_text("PHÂN TÍCH ĐẦU TƯ", "[1,2,3]"));
    assert!(analyze_article(&array, item).await.is_none());

    let no_key = gen(ScriptedGenerator::demo().without_credential());
    assert!(analyze_article(&no_key, item).await.is_none());
}

#[tokio::test]
async fn briefing_placeholders() {
    let items = seed_news();

    let any = gen(ScriptedGenerator::demo());
    let b = generate_briefing(&any, &[], 10).await;
    assert_eq!(b.highlights, vec![INSUFFICIENT_DATA.to_string()]);

    let no_key = gen(ScriptedGenerator::demo().without_credential());
    let b = generate_briefing(&no_key, &items, 10).await;
    assert_eq!(b.highlights, vec![INSUFFICIENT_DATA.to_string()]);

    let failing = gen(ScriptedGenerator::new().failing_on("DAILY BRIEFING", "timeout"));
    let b = generate_briefing(&failing, &items, 10).await;
    assert_eq!(b.highlights, vec![GENERATION_ERROR.to_string()]);

    let empty = gen(ScriptedGenerator::new().on_text("DAILY BRIEFING", r#"{"highlights":[]}"#));
    let b = generate_briefing(&empty, &items, 10).await;
    assert_eq!(b.highlights, vec![GENERATION_ERROR.to_string()]);
    assert!(!b.date.is_empty());
}

#[tokio::test]
async fn briefing_is_capped() {
    let g = gen(ScriptedGenerator::new().on_text(
        "DAILY BRIEFING",
        r#"{"highlights":["1","2","3","4","5","6","7"]}"#,
    ));
    let b = generate_briefing(&g, &seed_news(), 10).await;
    assert_eq!(b.highlights.len(), MAX_HIGHLIGHTS);
}

#[tokio::test]
async fn report_from_demo_generator() {
    let g = gen(ScriptedGenerator::demo());
    let r = generate_market_report(&g, &seed_news(), 20).await.expect("report");
    assert_eq!(r.sector_outlooks.len(), 2);
    assert_eq!(r.sector_outlooks[0].outlook, Outlook::Positive);
    assert_eq!(r.sector_outlooks[1].outlook, Outlook::Neutral);
    assert!(!r.key_takeaways.is_empty());
}

#[tokio::test]
async fn report_none_without_input_or_on_garbage() {
    let g = gen(ScriptedGenerator::demo());
    assert!(generate_market_report(&g, &[], 20).await.is_none());

    let garbage = gen(ScriptedGenerator::new().on_text("MARKET REPORT", "xin lỗi, không có dữ liệu"));
    assert!(generate_market_report(&garbage, &seed_news(), 20).await.is_none());
}
