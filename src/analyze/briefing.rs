// src/analyze/briefing.rs
//! Morning digest: 3–5 highlights condensed from the current headlines.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::genai::decode::{decode_object, text_list};
use crate::genai::{DynGenerator, GenerateOptions};
use crate::ingest::normalize_text;
use crate::news::NewsItem;

pub const MAX_HIGHLIGHTS: usize = 5;
pub const INSUFFICIENT_DATA: &str = "Không có đủ dữ liệu để tạo bản tin sáng nay.";
pub const GENERATION_ERROR: &str = "Lỗi khi tạo bản tin tự động.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Briefing {
    pub date: String,
    pub highlights: Vec<String>,
}

impl Briefing {
    pub fn placeholder(date: NaiveDate, message: &str) -> Self {
        Self {
            date: vietnamese_long_date(date),
            highlights: vec![message.to_string()],
        }
    }
}

/// "Thứ Hai, 19 tháng 10, 2026"
pub fn vietnamese_long_date(date: NaiveDate) -> String {
    let weekday = match date.weekday() {
        Weekday::Mon => "Thứ Hai",
        Weekday::Tue => "Thứ Ba",
        Weekday::Wed => "Thứ Tư",
        Weekday::Thu => "Thứ Năm",
        Weekday::Fri => "Thứ Sáu",
        Weekday::Sat => "Thứ Bảy",
        Weekday::Sun => "Chủ Nhật",
    };
    format!("{weekday}, {} tháng {}, {}", date.day(), date.month(), date.year())
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn build_prompt(items: &[NewsItem]) -> String {
    let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
    format!(
        "Dựa trên danh sách các tiêu đề tin tức BĐS sau đây:\n{}\n\n\
         Hãy tạo mục DAILY BRIEFING gồm 3-5 gạch đầu dòng tổng hợp những diễn biến quan trọng nhất trong ngày.\n\
         Viết ngắn gọn, trực diện.\n\
         Trả về JSON: {{ \"highlights\": [\"Tin 1...\", \"Tin 2...\"] }}",
        titles.join("\n")
    )
}

fn response_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "highlights": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": ["highlights"]
    })
}

/// Generate the briefing from the first `sample` items. Never fails; every
/// failure mode produces a single-highlight placeholder.
pub async fn generate_briefing(generator: &DynGenerator, items: &[NewsItem], sample: usize) -> Briefing {
    let date = today();
    let sample = &items[..items.len().min(sample.max(1))];
    if sample.is_empty() || !generator.has_credential() {
        return Briefing::placeholder(date, INSUFFICIENT_DATA);
    }

    let prompt = build_prompt(sample);
    let generation = match generator
        .generate(&prompt, &GenerateOptions::json(response_schema()))
        .await
    {
        Ok(g) => g,
        Err(e) => {
            tracing::warn!(target: "genai", error = ?e, "briefing generation failed");
            return Briefing::placeholder(date, GENERATION_ERROR);
        }
    };

    let highlights: Vec<String> = decode_object(&generation.text)
        .map(|obj| text_list(&obj, "highlights"))
        .unwrap_or_default()
        .iter()
        .map(|h| normalize_text(h))
        .filter(|h| !h.is_empty())
        .take(MAX_HIGHLIGHTS)
        .collect();

    if highlights.is_empty() {
        tracing::warn!(target: "genai", "briefing response held no highlights");
        return Briefing::placeholder(date, GENERATION_ERROR);
    }

    tracing::info!(target: "genai", highlights = highlights.len(), "briefing generated");
    Briefing {
        date: vietnamese_long_date(date),
        highlights,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_date_format() {
        let d = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(vietnamese_long_date(d), "Thứ Hai, 19 tháng 10, 2026");
        let d = NaiveDate::from_ymd_opt(2026, 10, 25).unwrap();
        assert_eq!(vietnamese_long_date(d), "Chủ Nhật, 25 tháng 10, 2026");
    }

    #[test]
    fn prompt_lists_titles() {
        let p = build_prompt(&crate::seed::seed_news());
        assert!(p.contains("DAILY BRIEFING"));
        assert!(p.contains("condotel"));
        assert!(!p.contains("CHỦ ĐỀ: "));
    }
}
