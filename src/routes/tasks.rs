// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Task handler routes for document-change triggers.
//!
//! These endpoints are called by the profile write trigger, not directly
//! by admins.

use crate::error::Result;
use crate::models::ProfileKind;
use crate::routes::{ApiJson, ApiResponse};
use crate::services::sync::{sync_profile, SyncOutcome};
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// Task handler routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/tasks/sync-profile", post(sync_profile_flags))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SyncProfilePayload {
    pub collection: ProfileKind,
    #[validate(length(min = 1))]
    pub document_id: String,
}

#[derive(Debug, Serialize)]
pub struct SyncProfileResult {
    pub collection: ProfileKind,
    pub document_id: String,
    pub outcome: SyncOutcome,
}

/// Recompute the flag fields of a changed profile.
async fn sync_profile_flags(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<SyncProfilePayload>,
) -> Result<Json<ApiResponse<SyncProfileResult>>> {
    payload.validate()?;

    let outcome = sync_profile(state.db.as_ref(), payload.collection, &payload.document_id).await?;

    tracing::info!(
        collection = payload.collection.collection(),
        document_id = %payload.document_id,
        outcome = ?outcome,
        "Profile sync task finished"
    );

    Ok(ApiResponse::ok(SyncProfileResult {
        collection: payload.collection,
        document_id: payload.document_id,
        outcome,
    }))
}
