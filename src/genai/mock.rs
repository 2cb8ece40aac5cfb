//! Scripted generator for tests and offline runs (`GENAI_TEST_MODE=mock`).
//!
//! Replies are chosen by the first rule whose needle occurs in the prompt.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::json;

use super::{GenerateFuture, GenerateOptions, Generation, Generator};
use crate::category::Category;

#[derive(Clone)]
enum Reply {
    Ok(Generation),
    Fail(String),
}

#[derive(Clone)]
struct Rule {
    needle: String,
    reply: Reply,
    delay: Option<Duration>,
}

pub struct ScriptedGenerator {
    rules: Vec<Rule>,
    fallback: Option<Generation>,
    credential: bool,
    calls: AtomicUsize,
}

impl Default for ScriptedGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            fallback: None,
            credential: true,
            calls: AtomicUsize::new(0),
        }
    }

    /// Reply with `generation` when the prompt contains `needle`.
    pub fn on(mut self, needle: impl Into<String>, generation: Generation) -> Self {
        self.rules.push(Rule {
            needle: needle.into(),
            reply: Reply::Ok(generation),
            delay: None,
        });
        self
    }

    pub fn on_text(self, needle: impl Into<String>, text: impl Into<String>) -> Self {
        self.on(needle, Generation::text(text))
    }

    /// Return an error (transport failure) when the prompt contains `needle`.
    pub fn failing_on(mut self, needle: impl Into<String>, message: impl Into<String>) -> Self {
        self.rules.push(Rule {
            needle: needle.into(),
            reply: Reply::Fail(message.into()),
            delay: None,
        });
        self
    }

    /// Delay the reply of the most recently added rule.
    pub fn delayed(mut self, delay: Duration) -> Self {
        if let Some(last) = self.rules.last_mut() {
            last.delay = Some(delay);
        }
        self
    }

    /// Reply used when no rule matches; without one, unmatched prompts error.
    pub fn with_fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = Some(Generation::text(text));
        self
    }

    /// Pretend no credential is configured.
    pub fn without_credential(mut self) -> Self {
        self.credential = false;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Reply for one category: one well-formed item per title.
    /// Matches on the category label, which the adapter prompt contains.
    pub fn on_category(self, category: Category, titles: &[&str]) -> Self {
        let items: Vec<_> = titles
            .iter()
            .map(|t| {
                json!({
                    "title": t,
                    "source": "VnExpress",
                    "timeAgo": "1 giờ trước",
                    "summaryPoints": ["Ý chính 1", "Ý chính 2", "Ý chính 3"],
                })
            })
            .collect();
        self.on_text(
            format!("CHỦ ĐỀ: {}", category.label()),
            serde_json::Value::Array(items).to_string(),
        )
    }

    /// Deterministic data for every request kind, used by `GENAI_TEST_MODE=mock`.
    pub fn demo() -> Self {
        let mut gen = Self::new();
        for c in Category::ALL {
            let titles: Vec<String> = (1..=5).map(|i| format!("{}: tin mẫu {i}", c.label())).collect();
            let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
            gen = gen.on_category(c, &refs);
        }
        gen.on_text(
            "DAILY BRIEFING",
            json!({ "highlights": [
                "Giá căn hộ sơ cấp tiếp tục đi ngang trong tuần.",
                "Dự thảo nghị định mới về condotel được lấy ý kiến.",
                "PropTech đẩy mạnh ứng dụng AI trong định giá."
            ]})
            .to_string(),
        )
        .on_text(
            "MARKET REPORT",
            json!({
                "title": "Báo cáo chiến lược thị trường (mẫu)",
                "period": "Tuần",
                "macroSentiment": "Thận trọng nhưng đã có tín hiệu hồi phục.",
                "keyTakeaways": ["Thanh khoản cải thiện nhẹ", "Pháp lý dần được tháo gỡ"],
                "sectorOutlooks": [
                    { "sector": "Căn hộ", "outlook": "Tích cực", "reason": "Nguồn cung mới hạn chế" },
                    { "sector": "Nghỉ dưỡng", "outlook": "Trung lập", "reason": "Chờ hướng dẫn pháp lý" }
                ],
                "strategicAdvice": "Ưu tiên tài sản pháp lý sạch, giữ tỷ lệ đòn bẩy thấp."
            })
            .to_string(),
        )
        .on_text(
            "PHÂN TÍCH ĐẦU TƯ",
            json!({
                "impactLevel": "Medium",
                "segments": ["Căn hộ"],
                "regions": ["TP.HCM"],
                "newsType": "Hỗn hợp",
                "assessment": { "score": 6, "trend": "Ổn định", "summary": "Theo dõi thêm." }
            })
            .to_string(),
        )
    }

    async fn reply(&self, prompt: &str) -> anyhow::Result<Generation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let rule = self.rules.iter().find(|r| prompt.contains(&r.needle)).cloned();
        match rule {
            Some(rule) => {
                if let Some(d) = rule.delay {
                    tokio::time::sleep(d).await;
                }
                match rule.reply {
                    Reply::Ok(g) => Ok(g),
                    Reply::Fail(msg) => Err(anyhow::anyhow!(msg)),
                }
            }
            None => self
                .fallback
                .clone()
                .ok_or_else(|| anyhow::anyhow!("scripted generator: no rule for prompt")),
        }
    }
}

impl Generator for ScriptedGenerator {
    fn generate<'a>(&'a self, prompt: &'a str, _options: &'a GenerateOptions) -> GenerateFuture<'a> {
        Box::pin(self.reply(prompt))
    }
    fn provider_name(&self) -> &'static str {
        "scripted"
    }
    fn has_credential(&self) -> bool {
        self.credential
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_matching_rule_wins() {
        let g = ScriptedGenerator::new()
            .on_text("alpha", "A")
            .on_text("alp", "B")
            .failing_on("beta", "boom");
        let opts = GenerateOptions::default();
        assert_eq!(g.generate("xx alpha", &opts).await.unwrap().text, "A");
        assert!(g.generate("beta", &opts).await.is_err());
        assert!(g.generate("gamma", &opts).await.is_err());
        assert_eq!(g.call_count(), 3);
    }
}
