// src/ingest/adapter.rs
//! News source backed by the generative client with web-search grounding.
//!
//! One request per category. The model is asked for a raw JSON array; what
//! comes back is decoded leniently (`genai::decode`) and every object goes
//! through `news::normalize_item`.

use anyhow::Result;
use metrics::counter;

use crate::category::Category;
use crate::genai::decode::{decode_array, object_items};
use crate::genai::{DynGenerator, GenerateOptions, Generation};
use crate::ingest::config::MAX_PER_CATEGORY;
use crate::ingest::types::NewsSource;
use crate::news::{normalize_item, NewsItem};

pub struct GenerativeNewsSource {
    generator: DynGenerator,
    items_per_request: usize,
}

impl GenerativeNewsSource {
    pub fn new(generator: DynGenerator) -> Self {
        Self {
            generator,
            items_per_request: MAX_PER_CATEGORY,
        }
    }

    /// Clamped to `1..=MAX_PER_CATEGORY`.
    pub fn with_items_per_request(mut self, n: usize) -> Self {
        self.items_per_request = n.clamp(1, MAX_PER_CATEGORY);
        self
    }

    pub fn generator(&self) -> &DynGenerator {
        &self.generator
    }

    /// Request text for one category. Contains the `CHỦ ĐỀ:` line with the
    /// category label and its keyword set.
    pub fn build_prompt(&self, category: Category) -> String {
        let n = self.items_per_request;
        format!(
            "Tìm kiếm các tin tức mới nhất (trong 24-48 giờ qua) về Bất động sản Việt Nam.\n\
             CHỦ ĐỀ: {label}\n\
             TỪ KHÓA: {keywords}\n\n\
             Yêu cầu đầu ra:\n\
             Trả về đúng {n} tin dưới dạng một mảng JSON (Array) các đối tượng.\n\
             KHÔNG dùng markdown (như ```json). Chỉ trả về raw JSON string.\n\n\
             Mỗi đối tượng phải có các trường:\n\
             - title: Tiêu đề bài viết (ngắn gọn).\n\
             - source: Tên nguồn báo.\n\
             - timeAgo: Thời gian đăng (ví dụ: \"2 giờ trước\").\n\
             - url: Đường dẫn bài viết gốc (nếu có).\n\
             - summaryPoints: Mảng đúng 3 chuỗi tóm tắt ý chính của bài báo.\n",
            label = category.label(),
            keywords = category.keywords().join(", "),
        )
    }

    /// Fetch one category. Never fails: missing credential, transport
    /// errors and undecodable responses all yield an empty list.
    pub async fn fetch_category(&self, category: Category) -> Vec<NewsItem> {
        match self.fetch(category).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(target: "ingest", error = ?e, %category, "category fetch failed");
                counter!("ingest_branch_errors_total").increment(1);
                Vec::new()
            }
        }
    }
}

/// Decode a generation into normalized items for `category`.
///
/// Grounding links are matched by the position of each object in the
/// decoded array, counting skipped non-object elements. Objects without a
/// title are dropped.
pub fn parse_items(category: Category, generation: &Generation) -> Vec<NewsItem> {
    let Some(objects) = decode_array(&generation.text).and_then(object_items) else {
        tracing::warn!(
            target: "ingest",
            %category,
            len = generation.text.len(),
            "generator response is not a JSON array"
        );
        counter!("ingest_decode_failures_total").increment(1);
        return Vec::new();
    };

    let raw_count = objects.len();
    let items: Vec<NewsItem> = objects
        .iter()
        .filter_map(|(i, raw)| normalize_item(raw, category, *i, generation))
        .collect();

    if items.len() < raw_count {
        tracing::debug!(
            target: "ingest",
            %category,
            dropped = raw_count - items.len(),
            "objects without a title dropped"
        );
    }
    items
}

#[async_trait::async_trait]
impl NewsSource for GenerativeNewsSource {
    async fn fetch(&self, category: Category) -> Result<Vec<NewsItem>> {
        if !self.generator.has_credential() {
            tracing::debug!(target: "ingest", %category, "no credential, skipping category");
            return Ok(Vec::new());
        }

        let prompt = self.build_prompt(category);
        let generation = self
            .generator
            .generate(&prompt, &GenerateOptions::grounded())
            .await?;

        let items = parse_items(category, &generation);
        tracing::debug!(target: "ingest", %category, items = items.len(), "category fetched");
        Ok(items)
    }

    fn name(&self) -> &'static str {
        self.generator.provider_name()
    }
}
