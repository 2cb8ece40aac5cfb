//! Gemini provider (generateContent REST API). Requires an API key.

use std::time::{Duration, Instant};

use anyhow::{anyhow, Context};
use metrics::histogram;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{GenerateFuture, GenerateOptions, Generation, Generator, ModelTier};
use crate::config::ai::GenAiConfig;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiProvider {
    http: reqwest::Client,
    api_key: String,
    fast_model: String,
    deep_model: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn from_config(cfg: &GenAiConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("proptech-digest/0.1")
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("building reqwest client")?;
        Ok(Self {
            http,
            api_key: cfg.api_key.clone(),
            fast_model: cfg.fast_model.clone(),
            deep_model: cfg.deep_model.clone(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point at a different endpoint (proxy, local stub).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.fast_model,
            ModelTier::Deep => &self.deep_model,
        }
    }

    /// JSON body for `models/{model}:generateContent`.
    pub fn request_body(prompt: &str, options: &GenerateOptions) -> Value {
        let mut body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        });
        if options.search_grounding {
            // Search tools reject a JSON response mime type, so the caller
            // has to parse free text in this mode.
            body["tools"] = json!([{ "google_search": {} }]);
        } else if options.json_response {
            let mut gen_cfg = json!({ "responseMimeType": "application/json" });
            if let Some(schema) = &options.response_schema {
                gen_cfg["responseSchema"] = schema.clone();
            }
            body["generationConfig"] = gen_cfg;
        }
        body
    }

    /// Extract text and positional grounding links from a response body.
    pub fn parse_response(body: &str) -> anyhow::Result<Generation> {
        #[derive(Deserialize)]
        struct Resp {
            #[serde(default)]
            candidates: Vec<Candidate>,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Candidate {
            content: Option<Content>,
            grounding_metadata: Option<GroundingMetadata>,
        }
        #[derive(Deserialize)]
        struct Content {
            #[serde(default)]
            parts: Vec<Part>,
        }
        #[derive(Deserialize)]
        struct Part {
            text: Option<String>,
            #[serde(default)]
            thought: bool,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct GroundingMetadata {
            #[serde(default)]
            grounding_chunks: Vec<Chunk>,
        }
        #[derive(Deserialize)]
        struct Chunk {
            web: Option<Web>,
        }
        #[derive(Deserialize)]
        struct Web {
            uri: Option<String>,
        }

        let resp: Resp = serde_json::from_str(body).context("decoding gemini response")?;
        let first = resp
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("gemini response has no candidates"))?;

        let text: String = first
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter(|p| !p.thought)
                    .filter_map(|p| p.text)
                    .collect()
            })
            .unwrap_or_default();

        let grounding_links = first
            .grounding_metadata
            .map(|g| {
                g.grounding_chunks
                    .into_iter()
                    .map(|c| c.web.and_then(|w| w.uri))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Generation {
            text,
            grounding_links,
        })
    }

    async fn call(&self, prompt: &str, options: &GenerateOptions) -> anyhow::Result<Generation> {
        let model = self.model_for(options.tier);
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let t0 = Instant::now();

        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(prompt, options))
            .send()
            .await
            .with_context(|| format!("gemini request to {model}"))?;

        let status = resp.status();
        let body = resp.text().await.context("reading gemini response body")?;
        histogram!("genai_request_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        if !status.is_success() {
            return Err(anyhow!(
                "gemini {model} returned HTTP {}: {}",
                status.as_u16(),
                body.chars().take(200).collect::<String>()
            ));
        }
        let out = Self::parse_response(&body)?;
        tracing::debug!(
            target: "genai",
            model,
            text_len = out.text.len(),
            links = out.grounding_links.len(),
            "gemini response"
        );
        Ok(out)
    }
}

impl Generator for GeminiProvider {
    fn generate<'a>(&'a self, prompt: &'a str, options: &'a GenerateOptions) -> GenerateFuture<'a> {
        Box::pin(self.call(prompt, options))
    }
    fn provider_name(&self) -> &'static str {
        "gemini"
    }
    fn has_credential(&self) -> bool {
        !self.api_key.is_empty()
    }
}
