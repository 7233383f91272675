// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Student and tutor profile routes.

use crate::error::Result;
use crate::models::{Student, Tutor};
use crate::routes::{ApiJson, ApiResponse};
use crate::services::profiles::{self, RestoreTutorInput};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/students/{id}",
            get(get_student).delete(delete_student),
        )
        .route("/api/tutors/{id}", get(get_tutor).delete(delete_tutor))
        .route("/api/tutors/restore", post(restore_tutor))
}

async fn get_student(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Student>>> {
    Ok(ApiResponse::ok(
        profiles::get_student(state.db.as_ref(), &id).await?,
    ))
}

async fn delete_student(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Student>>> {
    Ok(ApiResponse::ok(
        profiles::delete_student(state.db.as_ref(), &id).await?,
    ))
}

async fn get_tutor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Tutor>>> {
    Ok(ApiResponse::ok(
        profiles::get_tutor(state.db.as_ref(), &id).await?,
    ))
}

async fn delete_tutor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Tutor>>> {
    Ok(ApiResponse::ok(
        profiles::delete_tutor(state.db.as_ref(), &id).await?,
    ))
}

async fn restore_tutor(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<RestoreTutorInput>,
) -> Result<Json<ApiResponse<Tutor>>> {
    Ok(ApiResponse::ok(
        profiles::restore_tutor(state.db.as_ref(), &input).await?,
    ))
}
