//! PropTech digest service: binary entrypoint.
//! Boots the Axum HTTP server with the session, background refresh and metrics.

use shuttle_axum::ShuttleAxum;
use tracing::info;

use proptech_digest::ingest::scheduler::spawn_refresh_scheduler;
use proptech_digest::{init_tracing, Runtime};

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let runtime = Runtime::from_env().map_err(shuttle_runtime::Error::Custom)?;

    let interval = runtime.ingest.refresh_interval();
    spawn_refresh_scheduler(runtime.session.clone(), interval);
    info!(interval_secs = interval.as_secs(), "refresh scheduler started");

    Ok(runtime.router().into())
}
