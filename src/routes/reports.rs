// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use crate::error::Result;
use crate::routes::ApiResponse;
use crate::services::reports::{self, DashboardReport};
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/reports/dashboard", get(dashboard))
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<DashboardReport>>> {
    Ok(ApiResponse::ok(reports::dashboard(state.db.as_ref()).await?))
}
