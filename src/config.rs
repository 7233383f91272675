// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Variable names follow the admin frontend's deployment, so the same
//! `.env` file can feed both. Each setting accepts a server-side name
//! first and the frontend's `NEXT_PUBLIC_*` name as a fallback.

use std::env;
use std::time::Duration;

/// Algolia connection settings.
#[derive(Debug, Clone)]
pub struct AlgoliaConfig {
    pub app_id: String,
    /// Admin (or search-only) API key
    pub api_key: String,
    pub index_students: String,
    pub index_tutors: String,
    pub index_requests: String,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// GCP/Firebase project ID
    pub firebase_project_id: String,
    /// Admin frontend URL (CORS)
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Algolia settings; `None` routes every search through the store fallback
    pub algolia: Option<AlgoliaConfig>,
    /// Pause between the two messages of a simulated conversation
    pub conversation_delay: Duration,
}

impl Config {
    /// Config for tests and offline runs.
    pub fn test_default() -> Self {
        Self {
            firebase_project_id: "test-project".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            port: 8080,
            algolia: None,
            conversation_delay: Duration::ZERO,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT", raw))?,
            Err(_) => 8080,
        };

        let conversation_delay = match env::var("CONVERSATION_DELAY_MS") {
            Ok(raw) => Duration::from_millis(
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::Invalid("CONVERSATION_DELAY_MS", raw))?,
            ),
            Err(_) => Duration::ZERO,
        };

        Ok(Self {
            firebase_project_id: env_any(&[
                "FIREBASE_PROJECT_ID",
                "NEXT_PUBLIC_FIREBASE_PROJECT_ID",
            ])
            .unwrap_or_else(|| "local-dev".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            port,
            algolia: Self::algolia_from_env()?,
            conversation_delay,
        })
    }

    fn algolia_from_env() -> Result<Option<AlgoliaConfig>, ConfigError> {
        let app_id = env_any(&["ALGOLIA_APP_ID", "NEXT_PUBLIC_ALGOLIA_APP_ID"]);
        let api_key = env_any(&["ALGOLIA_ADMIN_API_KEY", "NEXT_PUBLIC_ALGOLIA_API_KEY"]);

        match (app_id, api_key) {
            (Some(app_id), Some(api_key)) => Ok(Some(AlgoliaConfig {
                app_id,
                api_key,
                index_students: env_any(&[
                    "ALGOLIA_INDEX_STUDENTS",
                    "NEXT_PUBLIC_ALGOLIA_INDEX_STUDENTS",
                ])
                .unwrap_or_else(|| "students".to_string()),
                index_tutors: env_any(&["ALGOLIA_INDEX_TUTORS", "NEXT_PUBLIC_ALGOLIA_INDEX_TUTORS"])
                    .unwrap_or_else(|| "tutors".to_string()),
                index_requests: env_any(&[
                    "ALGOLIA_INDEX_REQUESTS",
                    "NEXT_PUBLIC_ALGOLIA_INDEX_REQUESTS",
                ])
                .unwrap_or_else(|| "requests".to_string()),
            })),
            (None, None) => Ok(None),
            (Some(_), None) => Err(ConfigError::Missing("ALGOLIA_ADMIN_API_KEY")),
            (None, Some(_)) => Err(ConfigError::Missing("ALGOLIA_APP_ID")),
        }
    }
}

/// First non-empty value among several variable names.
fn env_any(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| env::var(name).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
