// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use tutoring_admin::config::Config;
use tutoring_admin::db::{FirestoreDb, MemoryDb};
use tutoring_admin::error::AppError;
use tutoring_admin::routes::create_router;
use tutoring_admin::services::algolia::{SearchHits, SearchParams};
use tutoring_admin::services::{SearchIndex, SearchKind};
use tutoring_admin::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Search index returning canned hits (or failing) for every query.
#[allow(dead_code)]
pub struct StubIndex {
    hits: Result<Vec<Value>, String>,
}

#[allow(dead_code)]
impl StubIndex {
    pub fn empty() -> Self {
        Self { hits: Ok(vec![]) }
    }

    pub fn with_hits(hits: Vec<Value>) -> Self {
        Self { hits: Ok(hits) }
    }

    pub fn failing() -> Self {
        Self {
            hits: Err("index unavailable".to_string()),
        }
    }
}

#[async_trait]
impl SearchIndex for StubIndex {
    async fn search(
        &self,
        _kind: SearchKind,
        params: &SearchParams,
    ) -> Result<SearchHits, AppError> {
        let hits = self.hits.clone().map_err(AppError::Search)?;
        let nb_pages = hits.len().div_ceil(params.hits_per_page.max(1) as usize) as u32;
        Ok(SearchHits {
            nb_hits: hits.len() as u64,
            nb_pages,
            page: params.page,
            hits,
        })
    }
}

/// Create a test app on an in-memory store.
/// Returns the router, the shared state and a handle on the store.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, MemoryDb) {
    create_test_app_with(StubIndex::empty())
}

#[allow(dead_code)]
pub fn create_test_app_with(index: StubIndex) -> (axum::Router, Arc<AppState>, MemoryDb) {
    let db = MemoryDb::new();
    let state = Arc::new(AppState {
        config: Config::test_default(),
        db: Arc::new(db.clone()),
        search: Arc::new(index),
    });

    (create_router(state.clone()), state, db)
}

/// Send a request with an optional JSON body; returns status and parsed body.
#[allow(dead_code)]
pub async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}
