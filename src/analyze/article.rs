// src/analyze/article.rs
//! Per-article investor analysis (deep model, JSON output).
//!
//! `normalize_analysis` is total: any object, however incomplete, becomes a
//! fully populated [`AnalysisData`]. The only `None` paths are a failed call
//! and a response that is not a JSON object.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::genai::decode::{decode_object, int_field, object_field, text_field, text_list, JsonObject};
use crate::genai::{DynGenerator, GenerateOptions};
use crate::news::NewsItem;

pub const TEXT_PLACEHOLDER: &str = "Chưa có dữ liệu.";
pub const LIST_PLACEHOLDER: &str = "Chưa xác định";
pub const DEFAULT_SCORE: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImpactLevel {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NewsType {
    #[serde(rename = "Cơ hội")]
    Opportunity,
    #[serde(rename = "Rủi ro")]
    Risk,
    #[default]
    #[serde(rename = "Hỗn hợp")]
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "Quan sát")]
    Observe,
    #[serde(rename = "Tối ưu hóa")]
    Optimize,
    #[serde(rename = "Gom hàng")]
    Accumulate,
    #[serde(rename = "Chốt lời")]
    TakeProfit,
    #[serde(rename = "Tránh xa")]
    Avoid,
    #[default]
    #[serde(rename = "Chờ tín hiệu")]
    WaitForSignal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Trend {
    #[serde(rename = "Giảm")]
    Falling,
    #[default]
    #[serde(rename = "Ổn định")]
    Stable,
    #[serde(rename = "Tăng")]
    Rising,
}

/// Case-insensitive match against each variant's English name and label.
fn parse_variant<T: Copy + Default>(raw: Option<String>, table: &[(T, &str, &str)]) -> T {
    let Some(raw) = raw else {
        return T::default();
    };
    let needle = raw.trim().to_lowercase();
    table
        .iter()
        .find(|(_, en, vi)| en.to_lowercase() == needle || vi.to_lowercase() == needle)
        .map(|(v, _, _)| *v)
        .unwrap_or_default()
}

impl ImpactLevel {
    fn parse(raw: Option<String>) -> Self {
        parse_variant(
            raw,
            &[
                (Self::Low, "Low", "Thấp"),
                (Self::Medium, "Medium", "Trung bình"),
                (Self::High, "High", "Cao"),
            ],
        )
    }
}

impl NewsType {
    fn parse(raw: Option<String>) -> Self {
        parse_variant(
            raw,
            &[
                (Self::Opportunity, "Opportunity", "Cơ hội"),
                (Self::Risk, "Risk", "Rủi ro"),
                (Self::Mixed, "Mixed", "Hỗn hợp"),
            ],
        )
    }
}

impl Action {
    fn parse(raw: Option<String>) -> Self {
        parse_variant(
            raw,
            &[
                (Self::Observe, "Observe", "Quan sát"),
                (Self::Optimize, "Optimize", "Tối ưu hóa"),
                (Self::Accumulate, "Accumulate", "Gom hàng"),
                (Self::TakeProfit, "TakeProfit", "Chốt lời"),
                (Self::Avoid, "Avoid", "Tránh xa"),
                (Self::WaitForSignal, "WaitForSignal", "Chờ tín hiệu"),
            ],
        )
    }
}

impl Trend {
    fn parse(raw: Option<String>) -> Self {
        parse_variant(
            raw,
            &[
                (Self::Falling, "Falling", "Giảm"),
                (Self::Stable, "Stable", "Ổn định"),
                (Self::Rising, "Rising", "Tăng"),
            ],
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Impacts {
    pub price: String,
    pub psychology: String,
    pub liquidity: String,
    pub legal: String,
    pub disaster: String,
    pub finance: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecondHome {
    pub impact: String,
    /// Di Linh / Lâm Đồng / Tây Nguyên angle.
    pub lam_dong_specific: String,
    pub reaction: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub opportunities: Vec<String>,
    pub risks: Vec<String>,
    pub action: Action,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// 1..=10
    pub score: u8,
    pub trend: Trend,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisData {
    pub impact_level: ImpactLevel,
    pub segments: Vec<String>,
    pub regions: Vec<String>,
    pub news_type: NewsType,
    pub impacts: Impacts,
    pub second_home: SecondHome,
    pub strategy: Strategy,
    pub assessment: Assessment,
}

fn text_or_placeholder(obj: Option<&JsonObject>, key: &str) -> String {
    obj.and_then(|o| text_field(o, key))
        .unwrap_or_else(|| TEXT_PLACEHOLDER.to_string())
}

fn list_or_placeholder(obj: Option<&JsonObject>, key: &str) -> Vec<String> {
    let list = obj.map(|o| text_list(o, key)).unwrap_or_default();
    if list.is_empty() {
        vec![LIST_PLACEHOLDER.to_string()]
    } else {
        list
    }
}

/// Build a complete record from whatever the model returned.
pub fn normalize_analysis(raw: &JsonObject) -> AnalysisData {
    let root = Some(raw);
    let impacts = object_field(raw, "impacts");
    let second_home = object_field(raw, "secondHome");
    let strategy = object_field(raw, "strategy");
    let assessment = object_field(raw, "assessment");

    let score = assessment
        .and_then(|a| int_field(a, "score"))
        .map(|s| s.clamp(1, 10) as u8)
        .unwrap_or(DEFAULT_SCORE);

    AnalysisData {
        impact_level: ImpactLevel::parse(text_field(raw, "impactLevel")),
        segments: list_or_placeholder(root, "segments"),
        regions: list_or_placeholder(root, "regions"),
        news_type: NewsType::parse(text_field(raw, "newsType")),
        impacts: Impacts {
            price: text_or_placeholder(impacts, "price"),
            psychology: text_or_placeholder(impacts, "psychology"),
            liquidity: text_or_placeholder(impacts, "liquidity"),
            legal: text_or_placeholder(impacts, "legal"),
            disaster: text_or_placeholder(impacts, "disaster"),
            finance: text_or_placeholder(impacts, "finance"),
        },
        second_home: SecondHome {
            impact: text_or_placeholder(second_home, "impact"),
            lam_dong_specific: text_or_placeholder(second_home, "lamDongSpecific"),
            reaction: text_or_placeholder(second_home, "reaction"),
        },
        strategy: Strategy {
            opportunities: list_or_placeholder(strategy, "opportunities"),
            risks: list_or_placeholder(strategy, "risks"),
            action: Action::parse(strategy.and_then(|s| text_field(s, "action"))),
            reason: text_or_placeholder(strategy, "reason"),
        },
        assessment: Assessment {
            score,
            trend: Trend::parse(assessment.and_then(|a| text_field(a, "trend"))),
            summary: text_or_placeholder(assessment, "summary"),
        },
    }
}

pub fn build_prompt(item: &NewsItem) -> String {
    format!(
        "Bạn là chuyên gia PHÂN TÍCH ĐẦU TƯ Bất động sản chuyên nghiệp tại Việt Nam.\n\
         Hãy phân tích bài báo sau theo quy trình 7 bước dành cho nhà đầu tư.\n\n\
         BÀI BÁO:\n\
         Tiêu đề: {title}\n\
         Nguồn: {source}\n\
         Tóm tắt: {summary}\n\n\
         1. Hiểu bản chất: dữ kiện, nguyên nhân, tác động; mức độ ảnh hưởng (Low / Medium / High).\n\
         2. Bối cảnh: phân khúc, khu vực bị tác động; là Cơ hội, Rủi ro hay Hỗn hợp.\n\
         3. Tác động đa chiều: giá, tâm lý, thanh khoản, pháp lý, thiên tai, tài chính.\n\
         4. Góc nhìn second home / ven hồ / Tây Nguyên, riêng khu vực Di Linh - Lâm Đồng.\n\
         5. Chiến lược: cơ hội, rủi ro, hành động (Quan sát / Tối ưu hóa / Gom hàng / Chốt lời / Tránh xa / Chờ tín hiệu) và lý do.\n\
         6. Đánh giá: điểm ảnh hưởng 1-10, xu hướng ngắn hạn (Giảm / Ổn định / Tăng), lời khuyên ngắn.\n\
         7. Phong cách: thực chiến, ngắn gọn.\n\n\
         Trả về đúng một đối tượng JSON theo schema, không markdown.",
        title = item.title,
        source = item.source,
        summary = item.summary_points.join(". "),
    )
}

fn string_props(keys: &[&str]) -> Value {
    let props: serde_json::Map<String, Value> = keys
        .iter()
        .map(|k| (k.to_string(), json!({ "type": "STRING" })))
        .collect();
    json!({ "type": "OBJECT", "properties": props, "required": keys })
}

/// Response schema sent with the request.
pub fn response_schema() -> Value {
    let strings = json!({ "type": "ARRAY", "items": { "type": "STRING" } });
    json!({
        "type": "OBJECT",
        "properties": {
            "impactLevel": { "type": "STRING", "enum": ["Low", "Medium", "High"] },
            "segments": strings,
            "regions": strings,
            "newsType": { "type": "STRING", "enum": ["Cơ hội", "Rủi ro", "Hỗn hợp"] },
            "impacts": string_props(&["price", "psychology", "liquidity", "legal", "disaster", "finance"]),
            "secondHome": string_props(&["impact", "lamDongSpecific", "reaction"]),
            "strategy": {
                "type": "OBJECT",
                "properties": {
                    "opportunities": strings,
                    "risks": strings,
                    "action": {
                        "type": "STRING",
                        "enum": ["Quan sát", "Tối ưu hóa", "Gom hàng", "Chốt lời", "Tránh xa", "Chờ tín hiệu"]
                    },
                    "reason": { "type": "STRING" }
                },
                "required": ["opportunities", "risks", "action", "reason"]
            },
            "assessment": {
                "type": "OBJECT",
                "properties": {
                    "score": { "type": "INTEGER" },
                    "trend": { "type": "STRING", "enum": ["Giảm", "Ổn định", "Tăng"] },
                    "summary": { "type": "STRING" }
                },
                "required": ["score", "trend", "summary"]
            }
        },
        "required": ["impactLevel", "segments", "regions", "newsType", "impacts", "secondHome", "strategy", "assessment"]
    })
}

/// Run the deep analysis for one item.
pub async fn analyze_article(generator: &DynGenerator, item: &NewsItem) -> Option<AnalysisData> {
    if !generator.has_credential() {
        tracing::debug!(target: "genai", id = %item.id, "no credential, analysis skipped");
        return None;
    }

    let prompt = build_prompt(item);
    let options = GenerateOptions::json(response_schema()).deep();
    let generation = match generator.generate(&prompt, &options).await {
        Ok(g) => g,
        Err(e) => {
            tracing::warn!(target: "genai", error = ?e, id = %item.id, "article analysis failed");
            return None;
        }
    };

    match decode_object(&generation.text) {
        Some(raw) => Some(normalize_analysis(&raw)),
        None => {
            tracing::warn!(target: "genai", id = %item.id, "analysis response is not a JSON object");
            None
        }
    }
}
