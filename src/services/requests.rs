// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request creation and lookups.

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::{ChatMessage, Request, RequestChat, RequestStatus};
use crate::services::pricing::{calculate_student_price, validate_price, PriceInputs};
use crate::time_utils::now_rfc3339;
use serde::Deserialize;
use validator::Validate;

/// Body of `POST /api/requests`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateRequestInput {
    #[validate(length(min = 1))]
    pub student_id: String,
    #[serde(default)]
    #[validate(custom(function = "validate_price"))]
    pub tutor_price: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_price"))]
    pub student_price: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_price"))]
    pub min_price: Option<String>,
    #[serde(default)]
    pub assistance_type: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Defaults to the student's country
    #[serde(default)]
    pub country: Option<String>,
}

pub async fn get_request(store: &dyn Store, id: &str) -> Result<Request> {
    store
        .get_request(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Request {} not found", id)))
}

/// Create a request in status `new`.
pub async fn create_request(store: &dyn Store, input: CreateRequestInput) -> Result<Request> {
    input.validate()?;
    let student = store
        .get_student(&input.student_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Student {} not found", input.student_id)))?;

    let country = input.country.or(student.country);
    let student_price = match input.tutor_price.as_deref() {
        Some(tutor_price) => Some(calculate_student_price(PriceInputs {
            student_price: input.student_price.as_deref(),
            tutor_price: Some(tutor_price),
            country: country.as_deref(),
            min_price: input.min_price.as_deref(),
        })),
        None => input.student_price,
    };

    let now = now_rfc3339();
    let request = Request {
        id: crate::ids::document_id()?,
        student_id: student.id,
        tutor_price: input.tutor_price,
        student_price,
        min_price: input.min_price,
        request_status: RequestStatus::New,
        assistance_type: input.assistance_type,
        subject: input.subject,
        description: input.description,
        country,
        created_at: now.clone(),
        updated_at: now,
        ..Default::default()
    };
    store.upsert_request(&request).await?;

    tracing::info!(request_id = %request.id, student_id = %request.student_id, "Request created");
    Ok(request)
}

/// Messages between the student and one tutor on a request, oldest first.
pub async fn chat_messages(
    store: &dyn Store,
    request_id: &str,
    tutor_id: &str,
) -> Result<Vec<ChatMessage>> {
    get_request(store, request_id).await?;
    store
        .list_chat_messages(&RequestChat::chat_id(request_id, tutor_id))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;
    use crate::models::Student;

    #[tokio::test]
    async fn test_create_computes_price_from_student_country() {
        let db = MemoryDb::new();
        db.upsert_student(&Student {
            id: "stu1".to_string(),
            country: Some("Lebanon".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

        let request = create_request(
            &db,
            CreateRequestInput {
                student_id: "stu1".to_string(),
                tutor_price: Some("10".to_string()),
                min_price: Some("25".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(request.request_status, RequestStatus::New);
        assert_eq!(request.country.as_deref(), Some("Lebanon"));
        assert_eq!(request.student_price.as_deref(), Some("25.00"));
        assert!(db.get_request(&request.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_requires_student() {
        let db = MemoryDb::new();
        let err = create_request(
            &db,
            CreateRequestInput {
                student_id: "nobody".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = create_request(&db, CreateRequestInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
