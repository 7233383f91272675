// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Algolia search client.
//!
//! Only the single-index query endpoint is used:
//! `POST https://{app_id}-dsn.algolia.net/1/indexes/{index}/query`.

use crate::config::AlgoliaConfig;
use crate::error::AppError;
use crate::services::search::SearchKind;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Query sent to an index. `page` is 0-based.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub query: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub filters: String,
    pub page: u32,
    pub hits_per_page: u32,
}

/// One page of raw hits.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchHits {
    #[serde(default)]
    pub hits: Vec<serde_json::Value>,
    #[serde(rename = "nbHits", default)]
    pub nb_hits: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(rename = "nbPages", default)]
    pub nb_pages: u32,
}

/// A full-text index over the three searchable collections.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    async fn search(&self, kind: SearchKind, params: &SearchParams)
        -> Result<SearchHits, AppError>;
}

/// Algolia REST client.
#[derive(Clone)]
pub struct AlgoliaClient {
    http: reqwest::Client,
    config: Option<AlgoliaConfig>,
}

impl AlgoliaClient {
    /// Create a client. With no config every search fails with
    /// [`AppError::Search`], which callers treat like an outage.
    pub fn new(config: Option<AlgoliaConfig>) -> Self {
        if config.is_none() {
            tracing::warn!("Algolia is not configured; searches will use the store fallback");
        }
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn index_name(config: &AlgoliaConfig, kind: SearchKind) -> &str {
        match kind {
            SearchKind::Students => &config.index_students,
            SearchKind::Tutors => &config.index_tutors,
            SearchKind::Requests => &config.index_requests,
        }
    }

    fn query_url(config: &AlgoliaConfig, kind: SearchKind) -> String {
        format!(
            "https://{}-dsn.algolia.net/1/indexes/{}/query",
            config.app_id,
            urlencoding::encode(Self::index_name(config, kind))
        )
    }
}

#[async_trait]
impl SearchIndex for AlgoliaClient {
    async fn search(
        &self,
        kind: SearchKind,
        params: &SearchParams,
    ) -> Result<SearchHits, AppError> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| AppError::Search("Algolia is not configured".to_string()))?;

        let response = self
            .http
            .post(Self::query_url(config, kind))
            .header("X-Algolia-Application-Id", &config.app_id)
            .header("X-Algolia-API-Key", &config.api_key)
            .json(params)
            .send()
            .await
            .map_err(|e| AppError::Search(format!("Algolia request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Search(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Search(format!("JSON parse error: {}", e)))
    }
}
