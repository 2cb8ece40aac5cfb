// tests/genai_gemini.rs
use proptech_digest::category::Category;
use proptech_digest::genai::{GeminiProvider, GenerateOptions};
use proptech_digest::ingest::adapter::parse_items;
use proptech_digest::news::DEFAULT_TIME_AGO;

const FIXTURE: &str = include_str!("fixtures/gemini_news_response.json");

#[test]
fn fixture_parses_into_text_and_positional_links() {
    let g = GeminiProvider::parse_response(FIXTURE).expect("parse fixture");
    assert!(g.text.contains("```json"));
    assert_eq!(g.grounding_links.len(), 2);
    assert_eq!(g.link_at(0), Some("https://vnexpress.net/gia-can-ho-tphcm"));
    assert_eq!(g.link_at(1), None);
}

#[test]
fn fixture_yields_normalized_items() {
    let g = GeminiProvider::parse_response(FIXTURE).unwrap();
    let items = parse_items(Category::MarketPrice, &g);

    // third object has no title
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|i| i.category == Category::MarketPrice));

    assert_eq!(items[0].url.as_deref(), Some("https://vnexpress.net/gia-can-ho-tphcm"));
    assert_eq!(items[0].summary_points.len(), 3);

    assert_eq!(items[1].time_ago, DEFAULT_TIME_AGO);
    assert!(items[1]
        .url
        .as_deref()
        .unwrap()
        .starts_with("https://www.google.com/search?q="));
    assert_ne!(items[0].id, items[1].id);
}

#[test]
fn request_body_never_mixes_search_and_json_mime() {
    let mut opts = GenerateOptions::grounded();
    opts.json_response = true;
    let body = GeminiProvider::request_body("p", &opts);
    assert!(body.get("tools").is_some());
    assert!(body.get("generationConfig").is_none());
}

#[test]
fn error_body_is_rejected() {
    assert!(GeminiProvider::parse_response(r#"{"candidates": []}"#).is_err());
    assert!(GeminiProvider::parse_response("<html>").is_err());
}
