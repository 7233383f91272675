// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tutoring Admin API Server
//!
//! Back office for the tutoring marketplace: request workflow, search,
//! profile maintenance, support console and reports.

use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tutoring_admin::{config::Config, db::FirestoreDb, services::AlgoliaClient, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        port = config.port,
        project = %config.firebase_project_id,
        algolia = config.algolia.is_some(),
        conversation_delay_ms = config.conversation_delay.as_millis() as u64,
        "Starting tutoring admin API"
    );

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.firebase_project_id)
        .await
        .context("Failed to connect to Firestore")?;

    let search = AlgoliaClient::new(config.algolia.clone());

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db: Arc::new(db),
        search: Arc::new(search),
    });

    // Build router
    let app = tutoring_admin::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tutoring_admin=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
