//! # Categories
//! The closed set of six topics that partition the feed.
//!
//! Serialized form is the Vietnamese display label (what the browser shows);
//! the ASCII slug is used in ids and query strings. Parsing accepts either.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Thị trường & Giá")]
    MarketPrice,
    #[serde(rename = "Chính sách & Pháp lý")]
    PolicyLegal,
    #[serde(rename = "BĐS Nghỉ dưỡng")]
    ResortSecondHome,
    #[serde(rename = "AI & PropTech")]
    ProptechAi,
    #[serde(rename = "Rủi ro Thiên tai")]
    DisasterRisk,
    #[serde(rename = "Dữ liệu & Báo cáo")]
    DataReport,
}

impl Category {
    /// Declared order. Output flattening follows this, never bucket size.
    pub const ALL: [Category; 6] = [
        Category::MarketPrice,
        Category::PolicyLegal,
        Category::ResortSecondHome,
        Category::ProptechAi,
        Category::DisasterRisk,
        Category::DataReport,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::MarketPrice => "Thị trường & Giá",
            Category::PolicyLegal => "Chính sách & Pháp lý",
            Category::ResortSecondHome => "BĐS Nghỉ dưỡng",
            Category::ProptechAi => "AI & PropTech",
            Category::DisasterRisk => "Rủi ro Thiên tai",
            Category::DataReport => "Dữ liệu & Báo cáo",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Category::MarketPrice => "market-price",
            Category::PolicyLegal => "policy-legal",
            Category::ResortSecondHome => "resort-second-home",
            Category::ProptechAi => "proptech-ai",
            Category::DisasterRisk => "disaster-risk",
            Category::DataReport => "data-report",
        }
    }

    /// Search keywords the adapter puts into the generation request.
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Category::MarketPrice => &[
                "giá nhà đất",
                "giá chung cư",
                "thị trường bất động sản",
                "nguồn cung căn hộ",
                "thanh khoản giao dịch",
            ],
            Category::PolicyLegal => &[
                "Luật Đất đai",
                "nghị định bất động sản",
                "pháp lý dự án",
                "quy hoạch",
                "sổ hồng",
            ],
            Category::ResortSecondHome => &[
                "bất động sản nghỉ dưỡng",
                "second home",
                "condotel",
                "homestay",
                "biệt thự ven biển",
            ],
            Category::ProptechAi => &[
                "PropTech Việt Nam",
                "AI bất động sản",
                "định giá tự động",
                "chuyển đổi số môi giới",
                "nền tảng công nghệ nhà đất",
            ],
            Category::DisasterRisk => &[
                "sạt lở",
                "mưa lũ",
                "ngập lụt đô thị",
                "biến đổi khí hậu bất động sản",
                "rủi ro thiên tai dự án",
            ],
            Category::DataReport => &[
                "báo cáo thị trường",
                "Savills",
                "CBRE",
                "kết quả kinh doanh doanh nghiệp địa ốc",
                "số liệu quý",
            ],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| {
                c.slug().eq_ignore_ascii_case(needle)
                    || c.label().to_lowercase() == needle.to_lowercase()
            })
            .ok_or_else(|| anyhow::anyhow!("unknown category: {needle}"))
    }
}
