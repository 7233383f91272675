// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Tutoring marketplace admin backend.
//!
//! HTTP API behind the admin console: request actions and tutor offers,
//! search with a store fallback, profile maintenance, the support console
//! and dashboard reports. Also the profile-flag trigger handler used by
//! the document sync and the `backfill` CLI.

pub mod config;
pub mod db;
pub mod error;
pub mod ids;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Store;
use services::SearchIndex;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn Store>,
    pub search: Arc<dyn SearchIndex>,
}
