// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod analyze;
pub mod api;
pub mod category;
pub mod config;
pub mod genai;
pub mod ingest;
pub mod metrics;
pub mod news;
pub mod seed;
pub mod session;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::category::Category;
pub use crate::news::NewsItem;
pub use crate::session::{RefreshOutcome, Session};

use std::sync::Arc;

use axum::Router;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::ai::GenAiConfig;
use crate::ingest::config::{load_ingest_config_default, IngestConfig};
use crate::metrics::Metrics;

pub const DEFAULT_LOG_FILTER: &str = "proptech_digest=info,warn";

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter; `DIGEST_LOG_FORMAT=json` switches to JSON lines. Safe to call
/// more than once (later calls are no-ops).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var("DIGEST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Everything the service needs, built from config files and environment.
pub struct Runtime {
    pub session: Arc<Session>,
    pub ingest: IngestConfig,
    pub metrics: Metrics,
}

impl Runtime {
    pub fn from_env() -> anyhow::Result<Self> {
        let metrics = Metrics::init()?;
        let ai = GenAiConfig::load_default()?;
        let ingest = load_ingest_config_default()?;

        info!(
            provider = %ai.provider,
            enabled = ai.enabled,
            key_len = ai.api_key.len(),
            mode = ?ingest.mode,
            interval_secs = ingest.refresh_interval_secs,
            "configuration loaded"
        );

        let generator = genai::build_generator(&ai);
        info!(
            provider = generator.provider_name(),
            credential = generator.has_credential(),
            "generator ready"
        );

        let session = Session::new(generator, ingest.clone());
        Ok(Self {
            session,
            ingest,
            metrics,
        })
    }

    pub fn router(&self) -> Router {
        api::router_with_metrics(api::AppState::new(self.session.clone()), &self.metrics)
    }
}

/// Full in-process app (routes plus `/metrics`) without the background
/// scheduler. Used by integration tests.
pub async fn app() -> anyhow::Result<Router> {
    let runtime = Runtime::from_env()?;
    Ok(runtime.router())
}
