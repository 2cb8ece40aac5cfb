//! Generative text client: provider abstraction used by the news adapter and
//! the briefing / report / analysis generators.
//!
//! The core only sees `generate(prompt, options) -> { text, grounding_links }`.
//! Concrete providers: Gemini (REST), disabled (no credential) and a scripted
//! mock for tests and offline runs.

pub mod decode;
pub mod gemini;
pub mod mock;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::config::ai::GenAiConfig;

pub use gemini::GeminiProvider;
pub use mock::ScriptedGenerator;

/// Which configured model a request goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelTier {
    /// Feed, briefing and report requests.
    #[default]
    Fast,
    /// Per-article deep analysis.
    Deep,
}

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub tier: ModelTier,
    /// Ask the provider to ground the answer in web search results.
    pub search_grounding: bool,
    /// Ask for `application/json` output. Providers ignore this when
    /// `search_grounding` is set (the two cannot be combined upstream).
    pub json_response: bool,
    pub response_schema: Option<serde_json::Value>,
}

impl GenerateOptions {
    pub fn grounded() -> Self {
        Self {
            search_grounding: true,
            ..Self::default()
        }
    }

    pub fn json(schema: serde_json::Value) -> Self {
        Self {
            json_response: true,
            response_schema: Some(schema),
            ..Self::default()
        }
    }

    pub fn deep(mut self) -> Self {
        self.tier = ModelTier::Deep;
        self
    }
}

/// Raw generator output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    /// One slot per grounding chunk, in provider order. A slot is `None`
    /// when that chunk carried no web URI, so indexes stay aligned.
    pub grounding_links: Vec<Option<String>>,
}

impl Generation {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            grounding_links: Vec::new(),
        }
    }

    pub fn with_links<I, S>(mut self, links: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        self.grounding_links = links.into_iter().map(|l| l.map(Into::into)).collect();
        self
    }

    /// Grounding link at `index`, if that slot exists and holds a URI.
    pub fn link_at(&self, index: usize) -> Option<&str> {
        self.grounding_links.get(index)?.as_deref()
    }
}

pub type GenerateFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<Generation>> + Send + 'a>>;

/// Trait object used by the pipeline and the session.
pub trait Generator: Send + Sync {
    fn generate<'a>(&'a self, prompt: &'a str, options: &'a GenerateOptions) -> GenerateFuture<'a>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
    /// False means every caller should short-circuit to its "no data" result.
    fn has_credential(&self) -> bool;
}

pub type DynGenerator = Arc<dyn Generator>;

/// Used when no credential is configured. Callers check `has_credential`
/// first; calling `generate` anyway yields an error.
pub struct DisabledGenerator;

impl Generator for DisabledGenerator {
    fn generate<'a>(&'a self, _prompt: &'a str, _options: &'a GenerateOptions) -> GenerateFuture<'a> {
        Box::pin(async { Err(anyhow::anyhow!("generator disabled: no credential configured")) })
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
    fn has_credential(&self) -> bool {
        false
    }
}

/// Factory: build a generator according to config and environment.
///
/// * `GENAI_TEST_MODE=mock` → deterministic scripted demo generator.
/// * no credential → [`DisabledGenerator`].
/// * otherwise → [`GeminiProvider`]; a client build failure degrades to disabled.
pub fn build_generator(config: &GenAiConfig) -> DynGenerator {
    if std::env::var("GENAI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        tracing::info!(target: "genai", "GENAI_TEST_MODE=mock, using scripted demo generator");
        return Arc::new(ScriptedGenerator::demo());
    }

    if !config.has_credential() {
        return Arc::new(DisabledGenerator);
    }

    match GeminiProvider::from_config(config) {
        Ok(p) => Arc::new(p),
        Err(e) => {
            tracing::warn!(target: "genai", error = ?e, "gemini client build failed, generator disabled");
            Arc::new(DisabledGenerator)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_at_respects_holes() {
        let g = Generation::text("x").with_links(vec![Some("https://a"), None]);
        assert_eq!(g.link_at(0), Some("https://a"));
        assert_eq!(g.link_at(1), None);
        assert_eq!(g.link_at(2), None);
    }

    #[tokio::test]
    async fn disabled_generator_errors() {
        let g = DisabledGenerator;
        assert!(!g.has_credential());
        assert!(g.generate("p", &GenerateOptions::default()).await.is_err());
    }

    #[test]
    fn options_builders() {
        let o = GenerateOptions::json(serde_json::json!({"type": "OBJECT"})).deep();
        assert!(o.json_response);
        assert_eq!(o.tier, ModelTier::Deep);
        assert!(!o.search_grounding);
        assert!(GenerateOptions::grounded().search_grounding);
    }
}
