// src/config/ai.rs
use anyhow::{anyhow, bail, Context};
use serde::{Deserialize, Serialize};
use std::{env, fmt, fs, path::Path, path::PathBuf};

pub const ENV_GENAI_CONFIG_PATH: &str = "GENAI_CONFIG_PATH";
pub const DEFAULT_GENAI_CONFIG_PATH: &str = "config/ai.json";
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";

fn default_enabled() -> bool {
    true
}
fn default_provider() -> String {
    "gemini".to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_fast_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_deep_model() -> String {
    "gemini-3-pro-preview".to_string()
}
fn default_timeout_secs() -> u64 {
    45
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GenAiConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Only "gemini" is supported (case-insensitive).
    #[serde(default = "default_provider")]
    pub provider: String,
    /// "ENV" means: read from GEMINI_API_KEY. A missing variable leaves the key
    /// empty, which turns every generator call into a "no data" result.
    #[serde(default = "default_api_key")]
    pub api_key: String,
    /// Model for feed, briefing and report requests.
    #[serde(default = "default_fast_model")]
    pub fast_model: String,
    /// Model for per-article deep analysis.
    #[serde(default = "default_deep_model")]
    pub deep_model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenAiConfig {
    fn default() -> Self {
        let mut cfg = Self {
            enabled: default_enabled(),
            provider: default_provider(),
            api_key: default_api_key(),
            fast_model: default_fast_model(),
            deep_model: default_deep_model(),
            timeout_secs: default_timeout_secs(),
        };
        cfg.resolve_api_key();
        cfg
    }
}

// Never print the key itself.
impl fmt::Debug for GenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenAiConfig")
            .field("enabled", &self.enabled)
            .field("provider", &self.provider)
            .field("key_len", &self.api_key.len())
            .field("fast_model", &self.fast_model)
            .field("deep_model", &self.deep_model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl GenAiConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading genai config from {}", path.display()))?;
        Self::from_json_str(&data)
    }

    pub fn from_json_str(data: &str) -> anyhow::Result<Self> {
        let mut cfg: GenAiConfig = serde_json::from_str(data).context("parsing genai config")?;

        cfg.provider = cfg.provider.trim().to_lowercase();
        if cfg.provider != "gemini" {
            bail!("Unsupported provider in config: {}", cfg.provider);
        }
        if cfg.timeout_secs == 0 {
            cfg.timeout_secs = default_timeout_secs();
        }
        cfg.resolve_api_key();
        Ok(cfg)
    }

    /// Resolution order:
    /// 1) $GENAI_CONFIG_PATH (must exist)
    /// 2) config/ai.json
    /// 3) built-in defaults (key from GEMINI_API_KEY)
    pub fn load_default() -> anyhow::Result<Self> {
        if let Ok(p) = env::var(ENV_GENAI_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_GENAI_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from_file(&pb);
        }
        let p = PathBuf::from(DEFAULT_GENAI_CONFIG_PATH);
        if p.exists() {
            return Self::load_from_file(&p);
        }
        Ok(Self::default())
    }

    /// True when calls can actually reach the provider.
    pub fn has_credential(&self) -> bool {
        self.enabled && !self.api_key.trim().is_empty()
    }

    fn resolve_api_key(&mut self) {
        if self.api_key.trim().eq_ignore_ascii_case("env") {
            self.api_key = env::var(ENV_GEMINI_API_KEY).unwrap_or_default();
            if self.api_key.is_empty() {
                tracing::warn!(
                    target: "genai",
                    "{ENV_GEMINI_API_KEY} not set; news will come from seed data"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_key_and_defaults() {
        let cfg = GenAiConfig::from_json_str(r#"{"provider":"Gemini","api_key":"abc"}"#).unwrap();
        assert_eq!(cfg.provider, "gemini");
        assert_eq!(cfg.api_key, "abc");
        assert_eq!(cfg.fast_model, "gemini-2.5-flash");
        assert_eq!(cfg.timeout_secs, 45);
        assert!(cfg.has_credential());
    }

    #[test]
    fn unknown_provider_is_rejected() {
        assert!(GenAiConfig::from_json_str(r#"{"provider":"openai"}"#).is_err());
    }

    #[test]
    fn disabled_has_no_credential() {
        let cfg =
            GenAiConfig::from_json_str(r#"{"enabled":false,"api_key":"abc","timeout_secs":0}"#)
                .unwrap();
        assert!(!cfg.has_credential());
        assert_eq!(cfg.timeout_secs, 45);
    }

    #[test]
    fn debug_hides_key() {
        let cfg = GenAiConfig::from_json_str(r#"{"api_key":"super-secret"}"#).unwrap();
        let s = format!("{cfg:?}");
        assert!(!s.contains("super-secret"));
        assert!(s.contains("key_len: 12"));
    }
}
