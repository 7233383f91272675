// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Search routes for the three collections.

use crate::error::Result;
use crate::routes::ApiJson;
use crate::services::search::{SearchRequest, SearchResponse};
use crate::services::{SearchKind, SearchService};
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/students/search", post(search_students))
        .route("/api/tutors/search", post(search_tutors))
        .route("/api/requests/search", post(search_requests))
}

async fn run(state: &AppState, kind: SearchKind, req: SearchRequest) -> Result<Json<SearchResponse>> {
    let response = SearchService::new(state.db.as_ref(), state.search.as_ref())
        .search(kind, &req)
        .await?;

    tracing::debug!(
        kind = ?kind,
        source = ?response.source,
        total = response.pagination.total,
        "Search completed"
    );
    Ok(Json(response))
}

async fn search_students(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    run(&state, SearchKind::Students, req).await
}

async fn search_tutors(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    run(&state, SearchKind::Tutors, req).await
}

async fn search_requests(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    run(&state, SearchKind::Requests, req).await
}
