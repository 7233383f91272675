// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request routes: creation, admin actions and tutor offers.

use crate::error::Result;
use crate::models::{ChatMessage, Request, TutorOffer};
use crate::routes::{ApiJson, ApiResponse};
use crate::services::offers::AssignmentOutcome;
use crate::services::requests::{self as request_service, CreateRequestInput};
use crate::services::{ActionService, AssignMode, OfferService, RequestAction};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/requests", post(create_request))
        .route("/api/requests/{id}", get(get_request))
        .route("/api/requests/{id}/actions", post(apply_action))
        .route(
            "/api/requests/{id}/tutor-offers",
            get(list_offers).post(place_offer),
        )
        .route(
            "/api/requests/{id}/tutor-offers/{offer_id}",
            put(update_offer).delete(delete_offer),
        )
        .route(
            "/api/requests/{id}/chats/{tutor_id}/messages",
            get(chat_messages),
        )
}

async fn create_request(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<CreateRequestInput>,
) -> Result<Json<ApiResponse<Request>>> {
    let request = request_service::create_request(state.db.as_ref(), input).await?;
    Ok(ApiResponse::ok(request))
}

async fn get_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Request>>> {
    let request = request_service::get_request(state.db.as_ref(), &id).await?;
    Ok(ApiResponse::ok(request))
}

async fn apply_action(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(action): ApiJson<RequestAction>,
) -> Result<Json<ApiResponse<Request>>> {
    let request = ActionService::new(state.db.as_ref(), state.config.conversation_delay)
        .apply(&id, action)
        .await?;
    Ok(ApiResponse::ok(request))
}

async fn chat_messages(
    State(state): State<Arc<AppState>>,
    Path((id, tutor_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<Vec<ChatMessage>>>> {
    let messages = request_service::chat_messages(state.db.as_ref(), &id, &tutor_id).await?;
    Ok(ApiResponse::ok(messages))
}

// ─── Tutor Offers ────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
struct PlaceOfferInput {
    #[validate(length(min = 1))]
    tutor_id: String,
    #[validate(length(min = 1))]
    tutor_price: String,
}

/// `accept` or `reject`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum OfferDecision {
    Accept,
    Reject,
}

#[derive(Debug, Deserialize)]
struct UpdateOfferInput {
    action: OfferDecision,
    #[serde(default)]
    cancel_reason: Option<String>,
}

/// Result of accepting or rejecting an offer.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum OfferUpdate {
    Accepted(AssignmentOutcome),
    Rejected(TutorOffer),
}

async fn list_offers(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<TutorOffer>>>> {
    let offers = OfferService::new(state.db.as_ref(), state.config.conversation_delay)
        .list(&id)
        .await?;
    Ok(ApiResponse::ok(offers))
}

async fn place_offer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<PlaceOfferInput>,
) -> Result<Json<ApiResponse<TutorOffer>>> {
    input.validate()?;
    let offer = OfferService::new(state.db.as_ref(), state.config.conversation_delay)
        .place_bid(&id, &input.tutor_id, &input.tutor_price)
        .await?;
    Ok(ApiResponse::ok(offer))
}

async fn update_offer(
    State(state): State<Arc<AppState>>,
    Path((id, tutor_id)): Path<(String, String)>,
    ApiJson(input): ApiJson<UpdateOfferInput>,
) -> Result<Json<ApiResponse<OfferUpdate>>> {
    let service = OfferService::new(state.db.as_ref(), state.config.conversation_delay);

    let update = match input.action {
        OfferDecision::Accept => OfferUpdate::Accepted(
            service
                .assign(&id, &tutor_id, None, None, AssignMode::AcceptOffer)
                .await?,
        ),
        OfferDecision::Reject => OfferUpdate::Rejected(
            service
                .reject(&id, &tutor_id, input.cancel_reason)
                .await?,
        ),
    };
    Ok(ApiResponse::ok(update))
}

async fn delete_offer(
    State(state): State<Arc<AppState>>,
    Path((id, tutor_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<()>>> {
    OfferService::new(state.db.as_ref(), state.config.conversation_delay)
        .delete(&id, &tutor_id)
        .await?;
    Ok(ApiResponse::ok(()))
}
