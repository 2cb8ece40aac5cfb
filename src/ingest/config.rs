// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_PATH: &str = "INGEST_CONFIG_PATH";

/// Upper bound for `bucket_cap` and `items_per_request`.
pub const MAX_PER_CATEGORY: usize = 5;

/// How a cycle combines fresh items with the previously published feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshMode {
    /// Fresh ++ previous, deduplicated; fresh wins ties.
    #[default]
    Merge,
    /// Fresh only.
    Clean,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Max items per category after dedup, at most [`MAX_PER_CATEGORY`].
    pub bucket_cap: usize,
    /// Shuffle the final feed (after capping).
    pub shuffle: bool,
    pub mode: RefreshMode,
    /// Background refresh period. Default: once per 24 hours.
    pub refresh_interval_secs: u64,
    /// Per-branch timeout for one category request.
    pub request_timeout_secs: u64,
    /// How many items the briefing prompt sees.
    pub briefing_sample: usize,
    /// How many items the market report prompt sees.
    pub report_sample: usize,
    /// How many items each category request asks for, at most [`MAX_PER_CATEGORY`].
    pub items_per_request: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            bucket_cap: MAX_PER_CATEGORY,
            shuffle: true,
            mode: RefreshMode::Merge,
            refresh_interval_secs: 24 * 3600,
            request_timeout_secs: 45,
            briefing_sample: 10,
            report_sample: 20,
            items_per_request: MAX_PER_CATEGORY,
        }
    }
}

impl IngestConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Replace zero values with defaults; per-category counts are clamped
    /// to `1..=MAX_PER_CATEGORY`.
    fn sanitized(mut self) -> Self {
        let d = Self::default();
        if self.bucket_cap == 0 {
            self.bucket_cap = d.bucket_cap;
        }
        self.bucket_cap = self.bucket_cap.min(MAX_PER_CATEGORY);
        if self.refresh_interval_secs == 0 {
            self.refresh_interval_secs = d.refresh_interval_secs;
        }
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = d.request_timeout_secs;
        }
        if self.items_per_request == 0 {
            self.items_per_request = d.items_per_request;
        }
        self.items_per_request = self.items_per_request.min(MAX_PER_CATEGORY);
        self
    }
}

/// Load from an explicit path. Supports TOML or JSON formats.
pub fn load_ingest_config_from(path: &Path) -> Result<IngestConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading ingest config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_ingest_config(&content, ext.as_str())
}

/// Load using env var + fallbacks:
/// 1) $INGEST_CONFIG_PATH
/// 2) config/ingest.toml
/// 3) config/ingest.json
/// 4) defaults
pub fn load_ingest_config_default() -> Result<IngestConfig> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_ingest_config_from(&pb);
        } else {
            return Err(anyhow!("INGEST_CONFIG_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/ingest.toml");
    if toml_p.exists() {
        return load_ingest_config_from(&toml_p);
    }
    let json_p = PathBuf::from("config/ingest.json");
    if json_p.exists() {
        return load_ingest_config_from(&json_p);
    }
    Ok(IngestConfig::default())
}

fn parse_ingest_config(s: &str, hint_ext: &str) -> Result<IngestConfig> {
    let looks_json = hint_ext == "json" || s.trim_start().starts_with('{');
    let cfg: IngestConfig = if looks_json {
        serde_json::from_str(s).context("parsing ingest config as JSON")?
    } else {
        toml::from_str(s).context("parsing ingest config as TOML")?
    };
    Ok(cfg.sanitized())
}
