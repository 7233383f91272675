// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Support console routes.

use crate::error::Result;
use crate::models::{SupportMessage, SupportRoom};
use crate::routes::{ApiJson, ApiResponse};
use crate::services::support::{RoomAdminInput, SendMessageInput};
use crate::services::SupportService;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/support/rooms", get(list_rooms))
        .route("/api/support/rooms/{id}/messages", get(room_messages))
        .route("/api/support/admin/join-room", post(join_room))
        .route("/api/support/admin/leave-room", post(leave_room))
        .route("/api/support/admin/send-message", post(send_message))
}

#[derive(Debug, Deserialize)]
struct RoomsQuery {
    with_agent: Option<bool>,
}

async fn list_rooms(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RoomsQuery>,
) -> Result<Json<ApiResponse<Vec<SupportRoom>>>> {
    let rooms = SupportService::new(state.db.as_ref())
        .list_rooms(query.with_agent)
        .await?;
    Ok(ApiResponse::ok(rooms))
}

async fn room_messages(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<SupportMessage>>>> {
    let messages = SupportService::new(state.db.as_ref()).messages(&id).await?;
    Ok(ApiResponse::ok(messages))
}

async fn join_room(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<RoomAdminInput>,
) -> Result<Json<ApiResponse<SupportRoom>>> {
    let room = SupportService::new(state.db.as_ref()).join(&input).await?;
    Ok(ApiResponse::ok(room))
}

async fn leave_room(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<RoomAdminInput>,
) -> Result<Json<ApiResponse<SupportRoom>>> {
    let room = SupportService::new(state.db.as_ref()).leave(&input).await?;
    Ok(ApiResponse::ok(room))
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<SendMessageInput>,
) -> Result<Json<ApiResponse<SupportMessage>>> {
    let message = SupportService::new(state.db.as_ref()).send(&input).await?;
    Ok(ApiResponse::ok(message))
}
