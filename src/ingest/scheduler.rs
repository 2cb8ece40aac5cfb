// src/ingest/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::task::JoinHandle;

use crate::session::{RefreshOutcome, Session};

/// Spawn the periodic refresh loop. The first tick fires immediately, so a
/// freshly started service replaces its seed feed right away.
pub fn spawn_refresh_scheduler(session: Arc<Session>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            counter!("digest_refresh_runs_total").increment(1);

            match session.refresh().await {
                RefreshOutcome::Published { cycle, items } => {
                    tracing::info!(target: "ingest", cycle, items, "scheduled refresh published");
                }
                RefreshOutcome::FellBack { cycle } => {
                    tracing::warn!(target: "ingest", cycle, "scheduled refresh empty, kept previous feed");
                }
                RefreshOutcome::Stale { cycle } => {
                    tracing::info!(target: "ingest", cycle, "scheduled refresh superseded");
                }
            }
        }
    })
}
