// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request action and tutor-offer API tests.

use axum::http::StatusCode;
use serde_json::json;
use tutoring_admin::db::{MemoryDb, Store};
use tutoring_admin::models::{MessageType, OfferStatus, Request, RequestStatus, Student, Tutor};

mod common;
use common::{create_test_app, send};

async fn seed(db: &MemoryDb, status: RequestStatus) {
    db.upsert_student(&Student {
        id: "stu1".to_string(),
        country: Some("France".to_string()),
        ..Default::default()
    })
    .await
    .unwrap();
    for id in ["tut1", "tut2"] {
        db.upsert_tutor(&Tutor {
            id: id.to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    }
    db.upsert_request(&Request {
        id: "req1".to_string(),
        student_id: "stu1".to_string(),
        country: Some("France".to_string()),
        request_status: status,
        ..Default::default()
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_unknown_action_is_bad_request() {
    let (app, _state, db) = create_test_app();
    seed(&db, RequestStatus::New).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/requests/req1/actions",
        Some(json!({"action": "teleport"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "bad_request");
}

#[tokio::test]
async fn test_action_on_missing_request() {
    let (app, _state, _db) = create_test_app();

    let (status, body) = send(
        &app,
        "POST",
        "/api/requests/nope/actions",
        Some(json!({"action": "complete"})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_set_min_price_rejects_non_numeric() {
    let (app, _state, db) = create_test_app();
    seed(&db, RequestStatus::New).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/requests/req1/actions",
        Some(json!({"action": "set_min_price", "min_price": "cheap"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        "/api/requests/req1/actions",
        Some(json!({"action": "set_min_price", "min_price": "40"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["min_price"], "40");
}

#[tokio::test]
async fn test_assign_tutor_rejects_pending_siblings() {
    let (app, _state, db) = create_test_app();
    seed(&db, RequestStatus::New).await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/requests/req1/tutor-offers",
        Some(json!({"tutor_id": "tut2", "tutor_price": "12"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "POST",
        "/api/requests/req1/actions",
        Some(json!({"action": "assign_tutor", "tutor_id": "tut1", "tutor_price": "10"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["request_status"], "pending_payment");
    assert_eq!(body["data"]["student_price"], "30.00");

    let sibling = db.get_offer("req1", "tut2").await.unwrap().unwrap();
    assert_eq!(sibling.status, OfferStatus::Rejected);
    let accepted = db.get_offer("req1", "tut1").await.unwrap().unwrap();
    assert_eq!(accepted.status, OfferStatus::Accepted);
}

#[tokio::test]
async fn test_accept_offer_twice_is_idempotent() {
    let (app, _state, db) = create_test_app();
    seed(&db, RequestStatus::Pending).await;

    send(
        &app,
        "POST",
        "/api/requests/req1/tutor-offers",
        Some(json!({"tutor_id": "tut1", "tutor_price": "15"})),
    )
    .await;
    send(
        &app,
        "POST",
        "/api/requests/req1/tutor-offers",
        Some(json!({"tutor_id": "tut2", "tutor_price": "20"})),
    )
    .await;

    let (status, first) = send(
        &app,
        "PUT",
        "/api/requests/req1/tutor-offers/tut1",
        Some(json!({"action": "accept"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["unchanged"], false);
    assert_eq!(first["data"]["rejected_offers"], 1);

    let writes = db.write_count();
    let (status, second) = send(
        &app,
        "PUT",
        "/api/requests/req1/tutor-offers/tut1",
        Some(json!({"action": "accept"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["data"]["unchanged"], true);
    assert_eq!(db.write_count(), writes);

    let (_, messages) = send(&app, "GET", "/api/requests/req1/chats/tut1/messages", None).await;
    let accepts = messages["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|m| m["message_type"] == "studentaccept")
        .count();
    assert_eq!(accepts, 1);
}

#[tokio::test]
async fn test_offer_on_closed_request_conflicts() {
    let (app, _state, db) = create_test_app();
    seed(&db, RequestStatus::Cancelled).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/requests/req1/tutor-offers",
        Some(json!({"tutor_id": "tut1", "tutor_price": "15"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");
}

#[tokio::test]
async fn test_delete_missing_offer() {
    let (app, _state, db) = create_test_app();
    seed(&db, RequestStatus::Pending).await;

    let (status, _) = send(&app, "DELETE", "/api/requests/req1/tutor-offers/tut1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_full_lifecycle_to_completed() {
    let (app, _state, db) = create_test_app();
    seed(&db, RequestStatus::New).await;

    let steps = [
        json!({"action": "assign_tutor", "tutor_id": "tut1", "tutor_price": "10", "student_price": "45"}),
        json!({"action": "change_status", "status": "ongoing"}),
        json!({"action": "complete"}),
    ];
    for step in steps {
        let (status, body) = send(&app, "POST", "/api/requests/req1/actions", Some(step)).await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    let request = db.get_request("req1").await.unwrap().unwrap();
    assert_eq!(request.request_status, RequestStatus::Completed);
    assert_eq!(request.invoice_amount.as_deref(), Some("45.00"));
    assert!(request.completed_at.is_some());

    let kinds: Vec<MessageType> = db
        .list_chat_messages("req1_tut1")
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.message_type)
        .collect();
    assert_eq!(
        kinds,
        vec![
            MessageType::TutorBid,
            MessageType::StudentAccept,
            MessageType::StudentPaid,
            MessageType::StudentOngoing,
        ]
    );

    let (status, _) = send(
        &app,
        "POST",
        "/api/requests/req1/actions",
        Some(json!({"action": "cancel", "cancel_reason": "changed mind"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_create_and_fetch_request() {
    let (app, _state, db) = create_test_app();
    seed(&db, RequestStatus::New).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/requests",
        Some(json!({"student_id": "stu1", "tutor_price": "10", "subject": "Calculus"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["request_status"], "new");
    assert_eq!(body["data"]["student_price"], "30.00");

    let id = body["data"]["id"].as_str().unwrap().to_string();
    let (status, fetched) = send(&app, "GET", &format!("/api/requests/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["data"]["subject"], "Calculus");
}

#[tokio::test]
async fn test_malformed_json_body() {
    let (app, _state, _db) = create_test_app();

    let response = {
        use axum::body::Body;
        use axum::http::{header, Request};
        use tower::ServiceExt;
        app.oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/requests")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap()
    };
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
