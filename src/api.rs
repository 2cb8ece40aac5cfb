// src/api.rs
//! HTTP surface over the session: feed, briefing, report, lazy analysis and
//! a manual refresh trigger.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::category::Category;
use crate::metrics::Metrics;
use crate::session::Session;

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Session>,
}

impl AppState {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

/// Router without `/metrics`; see [`router_with_metrics`].
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/categories", get(categories))
        .route("/news", get(list_news))
        .route("/news/{id}", get(news_item))
        .route("/news/{id}/analysis", get(news_analysis))
        .route("/briefing", get(briefing))
        .route("/report", get(report))
        .route("/refresh", post(refresh))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

pub fn router_with_metrics(state: AppState, metrics: &Metrics) -> Router {
    router(state).merge(metrics.router())
}

#[derive(Serialize)]
struct CategoryView {
    slug: &'static str,
    label: &'static str,
}

async fn categories() -> Json<Vec<CategoryView>> {
    Json(
        Category::ALL
            .iter()
            .map(|c| CategoryView {
                slug: c.slug(),
                label: c.label(),
            })
            .collect(),
    )
}

#[derive(Deserialize, Default)]
struct NewsQuery {
    category: Option<String>,
    q: Option<String>,
}

async fn list_news(State(state): State<AppState>, Query(params): Query<NewsQuery>) -> Response {
    let category = match params.category.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => match raw.parse::<Category>() {
            Ok(c) => Some(c),
            Err(e) => {
                return (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))).into_response();
            }
        },
        None => None,
    };
    let items = state
        .session
        .filtered_news(category, params.q.as_deref())
        .await;
    Json(items).into_response()
}

async fn news_item(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.session.item(&id).await {
        Some(item) => Json(item).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn news_analysis(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    if state.session.item(&id).await.is_none() {
        return StatusCode::NOT_FOUND.into_response();
    }
    match state.session.analysis_for(&id).await {
        Some(analysis) => Json(analysis).into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable" })),
        )
            .into_response(),
    }
}

async fn briefing(State(state): State<AppState>) -> Response {
    Json(state.session.briefing().await).into_response()
}

async fn report(State(state): State<AppState>) -> Response {
    match state.session.report().await {
        Some(r) => Json(r).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn refresh(State(state): State<AppState>) -> Json<serde_json::Value> {
    let outcome = state.session.refresh().await;
    Json(json!({
        "outcome": outcome.as_str(),
        "cycle": outcome.cycle(),
        "items": outcome.items(),
    }))
}
