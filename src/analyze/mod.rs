// src/analyze/mod.rs
//! Generator-backed analysis over the published feed: daily briefing,
//! market report and per-article investor analysis.

pub mod article;
pub mod briefing;
pub mod report;

pub use crate::analyze::article::{analyze_article, normalize_analysis, AnalysisData};
pub use crate::analyze::briefing::{generate_briefing, Briefing};
pub use crate::analyze::report::{generate_market_report, MarketReport};
