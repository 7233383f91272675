// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Search over students, tutors and requests.
//!
//! Algolia is queried first. For students and requests an empty result or
//! a failed query falls back to a store scan with in-memory text matching.
//! The fallback scan is bounded, so its `total` is approximate past the
//! requested page.

use crate::db::{DocQuery, Store};
use crate::error::{AppError, Result};
use crate::services::algolia::{SearchIndex, SearchParams};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;
/// Store scan cap when a text query has to be matched in memory.
pub const FALLBACK_TEXT_SCAN_LIMIT: u32 = 1000;

/// The searchable collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Students,
    Tutors,
    Requests,
}

impl SearchKind {
    /// Fields accepted in `filters`; anything else is dropped.
    pub fn allowed_filters(&self) -> &'static [&'static str] {
        match self {
            SearchKind::Students => &[
                "country",
                "gender",
                "is_deleted",
                "has_apple_id",
                "has_facebook_id",
                "has_google_id",
            ],
            SearchKind::Tutors => &[
                "country",
                "major",
                "is_deleted",
                "has_apple_id",
                "has_facebook_id",
                "has_google_id",
            ],
            SearchKind::Requests => &[
                "request_status",
                "assistance_type",
                "country",
                "student_id",
                "tutor_id",
            ],
        }
    }

    /// Fields matched by the fallback text search.
    pub fn text_fields(&self) -> &'static [&'static str] {
        match self {
            SearchKind::Students => &["id", "first_name", "last_name", "email", "phone"],
            SearchKind::Tutors => &["id", "full_name", "email", "phone", "major"],
            SearchKind::Requests => &["id", "subject", "description", "assistance_type"],
        }
    }

    /// Whether the store is consulted when Algolia comes back empty.
    pub fn has_fallback(&self) -> bool {
        !matches!(self, SearchKind::Tutors)
    }
}

/// Body of `POST /api/{collection}/search`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub filters: BTreeMap<String, Value>,
    /// 1-based
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

impl SearchRequest {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE)
    }

    pub fn text(&self) -> &str {
        self.query.as_deref().map(str::trim).unwrap_or("")
    }

    /// Allow-listed, non-empty filters as strings, sorted by field.
    pub fn filter_pairs(&self, kind: SearchKind) -> Vec<(String, String)> {
        let allowed = kind.allowed_filters();
        self.filters
            .iter()
            .filter(|(field, _)| allowed.contains(&field.as_str()))
            .filter_map(|(field, value)| {
                let value = match value {
                    Value::String(s) => s.trim().to_string(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                (!value.is_empty()).then(|| (field.clone(), value))
            })
            .collect()
    }
}

/// Algolia filter expression: `field:"value" AND field2:"value2"`.
pub fn build_filter(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(field, value)| {
            let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
            format!("{}:\"{}\"", field, escaped)
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// Where results came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum SearchSource {
    Algolia,
    Firestore,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u32,
    pub has_more: bool,
}

impl Pagination {
    fn new(page: u32, per_page: u32, total: u64) -> Self {
        let total_pages = total.div_ceil(per_page as u64) as u32;
        Self {
            page,
            per_page,
            total,
            total_pages,
            has_more: (page as u64) * (per_page as u64) < total,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SearchResponse {
    pub success: bool,
    #[cfg_attr(feature = "binding-generation", ts(type = "Array<any>"))]
    pub data: Vec<Value>,
    pub pagination: Pagination,
    pub source: SearchSource,
}

/// Sort documents by `created_at` descending; missing timestamps last.
pub fn sort_newest_first(docs: &mut [Value]) {
    docs.sort_by(|a, b| {
        let a = a.get("created_at").and_then(Value::as_str).unwrap_or("");
        let b = b.get("created_at").and_then(Value::as_str).unwrap_or("");
        b.cmp(a)
    });
}

/// Expose Algolia's `objectID` as `id`.
fn with_id(mut hit: Value) -> Value {
    if let Value::Object(map) = &mut hit {
        if !map.contains_key("id") {
            if let Some(object_id) = map.get("objectID").cloned() {
                map.insert("id".to_string(), object_id);
            }
        }
    }
    hit
}

/// Case-insensitive substring match over `fields`, then 1-based page slice.
///
/// Returns the page and the number of matching documents.
pub fn filter_and_page(
    docs: Vec<Value>,
    fields: &[&str],
    text: &str,
    page: u32,
    per_page: u32,
) -> (Vec<Value>, usize) {
    let needle = text.to_lowercase();
    let matched: Vec<Value> = if needle.is_empty() {
        docs
    } else {
        docs.into_iter()
            .filter(|doc| {
                fields.iter().any(|field| {
                    doc.get(*field)
                        .and_then(Value::as_str)
                        .is_some_and(|v| v.to_lowercase().contains(&needle))
                })
            })
            .collect()
    };

    let total = matched.len();
    let start = (page.saturating_sub(1) as usize).saturating_mul(per_page as usize);
    let data = matched
        .into_iter()
        .skip(start)
        .take(per_page as usize)
        .collect();
    (data, total)
}

fn to_values<T: Serialize>(docs: Vec<T>) -> Result<Vec<Value>> {
    docs.into_iter()
        .map(|d| serde_json::to_value(d).map_err(|e| AppError::Internal(e.into())))
        .collect()
}

/// Search with store fallback.
pub struct SearchService<'a> {
    store: &'a dyn Store,
    index: &'a dyn SearchIndex,
}

impl<'a> SearchService<'a> {
    pub fn new(store: &'a dyn Store, index: &'a dyn SearchIndex) -> Self {
        Self { store, index }
    }

    pub async fn search(&self, kind: SearchKind, req: &SearchRequest) -> Result<SearchResponse> {
        let page = req.page();
        let per_page = req.per_page();
        let pairs = req.filter_pairs(kind);

        let params = SearchParams {
            query: req.text().to_string(),
            filters: build_filter(&pairs),
            page: page - 1,
            hits_per_page: per_page,
        };

        match self.index.search(kind, &params).await {
            Ok(hits) if hits.nb_hits > 0 || !kind.has_fallback() => {
                let mut data: Vec<Value> = hits.hits.into_iter().map(with_id).collect();
                sort_newest_first(&mut data);
                let mut pagination = Pagination::new(page, per_page, hits.nb_hits);
                pagination.total_pages = hits.nb_pages;
                pagination.has_more = page < hits.nb_pages;

                Ok(SearchResponse {
                    success: true,
                    data,
                    pagination,
                    source: SearchSource::Algolia,
                })
            }
            Ok(_) => {
                tracing::debug!(kind = ?kind, filters = %params.filters, "No Algolia hits, using store fallback");
                self.fallback(kind, req.text(), &pairs, page, per_page)
                    .await
            }
            Err(e) if kind.has_fallback() => {
                tracing::warn!(kind = ?kind, error = %e, "Algolia search failed, using store fallback");
                self.fallback(kind, req.text(), &pairs, page, per_page)
                    .await
            }
            Err(e) => Err(e),
        }
    }

    async fn fallback(
        &self,
        kind: SearchKind,
        text: &str,
        pairs: &[(String, String)],
        page: u32,
        per_page: u32,
    ) -> Result<SearchResponse> {
        let limit = if text.is_empty() {
            page.saturating_mul(per_page).saturating_add(1)
        } else {
            FALLBACK_TEXT_SCAN_LIMIT
        };

        let query = pairs
            .iter()
            .fold(DocQuery::new(), |q, (field, value)| q.eq(field, value))
            .limit(limit);

        let docs = match kind {
            SearchKind::Students => to_values(self.store.query_students(&query).await?)?,
            SearchKind::Tutors => to_values(self.store.query_tutors(&query).await?)?,
            SearchKind::Requests => to_values(self.store.query_requests(&query).await?)?,
        };

        let (data, total) = filter_and_page(docs, kind.text_fields(), text, page, per_page);

        Ok(SearchResponse {
            success: true,
            data,
            pagination: Pagination::new(page, per_page, total as u64),
            source: SearchSource::Firestore,
        })
    }
}
