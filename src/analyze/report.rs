// src/analyze/report.rs
//! Strategic market report over a sample of current headlines.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::genai::decode::{decode_object, text_field, text_list, JsonObject};
use crate::genai::{DynGenerator, GenerateOptions};
use crate::news::NewsItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Outlook {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl Outlook {
    /// English names or the Vietnamese labels; anything else is neutral.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "positive" | "tích cực" => Outlook::Positive,
            "negative" | "tiêu cực" => Outlook::Negative,
            _ => Outlook::Neutral,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorOutlook {
    pub sector: String,
    pub outlook: Outlook,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketReport {
    pub title: String,
    pub period: String,
    pub macro_sentiment: String,
    pub key_takeaways: Vec<String>,
    pub sector_outlooks: Vec<SectorOutlook>,
    pub strategic_advice: String,
}

const DEFAULT_TITLE: &str = "Báo cáo chiến lược thị trường BĐS";
const DEFAULT_PERIOD: &str = "Tuần";

/// `None` when the object carries neither takeaways nor sector outlooks.
pub fn normalize_report(raw: &JsonObject) -> Option<MarketReport> {
    let key_takeaways = text_list(raw, "keyTakeaways");
    let sector_outlooks: Vec<SectorOutlook> = raw
        .get("sectorOutlooks")
        .or_else(|| raw.get("sectorOutlook"))
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_object)
                .filter_map(|o| {
                    Some(SectorOutlook {
                        sector: text_field(o, "sector")?,
                        outlook: text_field(o, "outlook")
                            .map(|s| Outlook::parse(&s))
                            .unwrap_or_default(),
                        reason: text_field(o, "reason").unwrap_or_default(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    if key_takeaways.is_empty() && sector_outlooks.is_empty() {
        return None;
    }

    Some(MarketReport {
        title: text_field(raw, "title").unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        period: text_field(raw, "period").unwrap_or_else(|| DEFAULT_PERIOD.to_string()),
        macro_sentiment: text_field(raw, "macroSentiment").unwrap_or_default(),
        key_takeaways,
        sector_outlooks,
        strategic_advice: text_field(raw, "strategicAdvice").unwrap_or_default(),
    })
}

pub fn build_prompt(items: &[NewsItem]) -> String {
    let lines: Vec<String> = items
        .iter()
        .map(|i| format!("- [{}] {}", i.category.label(), i.title))
        .collect();
    format!(
        "Bạn là chiến lược gia thị trường Bất động sản Việt Nam.\n\
         Dựa trên các tin sau, hãy viết một MARKET REPORT ngắn cho nhà đầu tư:\n{}\n\n\
         Trả về JSON gồm: title, period, macroSentiment, keyTakeaways (mảng chuỗi), \
         sectorOutlooks (mảng {{sector, outlook: \"Tích cực\" | \"Trung lập\" | \"Tiêu cực\", reason}}), \
         strategicAdvice.",
        lines.join("\n")
    )
}

fn response_schema() -> Value {
    let strings = json!({ "type": "ARRAY", "items": { "type": "STRING" } });
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "period": { "type": "STRING" },
            "macroSentiment": { "type": "STRING" },
            "keyTakeaways": strings,
            "sectorOutlooks": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "sector": { "type": "STRING" },
                        "outlook": { "type": "STRING", "enum": ["Tích cực", "Trung lập", "Tiêu cực"] },
                        "reason": { "type": "STRING" }
                    },
                    "required": ["sector", "outlook", "reason"]
                }
            },
            "strategicAdvice": { "type": "STRING" }
        },
        "required": ["title", "period", "macroSentiment", "keyTakeaways", "sectorOutlooks", "strategicAdvice"]
    })
}

pub async fn generate_market_report(
    generator: &DynGenerator,
    items: &[NewsItem],
    sample: usize,
) -> Option<MarketReport> {
    let sample = &items[..items.len().min(sample.max(1))];
    if sample.is_empty() || !generator.has_credential() {
        return None;
    }

    let prompt = build_prompt(sample);
    let generation = match generator
        .generate(&prompt, &GenerateOptions::json(response_schema()))
        .await
    {
        Ok(g) => g,
        Err(e) => {
            tracing::warn!(target: "genai", error = ?e, "market report generation failed");
            return None;
        }
    };

    let report = decode_object(&generation.text).and_then(|o| normalize_report(&o));
    if report.is_none() {
        tracing::warn!(target: "genai", "market report response unusable");
    }
    report
}
