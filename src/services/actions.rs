// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin actions on a tutoring request.
//!
//! `POST /api/requests/{id}/actions` bodies decode into [`RequestAction`],
//! tagged by the `action` field. Each variant carries its own validated
//! input.

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::{OfferStatus, Request, RequestStatus};
use crate::services::conversation::{Conversation, Draft};
use crate::services::offers::{AssignMode, OfferService};
use crate::services::pricing::{format_price, parse_price, validate_price};
use crate::time_utils::{format_utc_rfc3339, now_rfc3339};
use serde::Deserialize;
use std::time::Duration;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangeStatusInput {
    pub status: RequestStatus,
    #[serde(default)]
    pub cancel_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AssignTutorInput {
    #[validate(length(min = 1))]
    pub tutor_id: String,
    #[serde(default)]
    #[validate(custom(function = "validate_price"))]
    pub tutor_price: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_price"))]
    pub student_price: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AssignStudentInput {
    #[validate(length(min = 1))]
    pub student_id: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SetTutorPriceInput {
    #[validate(custom(function = "validate_price"))]
    pub tutor_price: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SetStudentPriceInput {
    #[validate(custom(function = "validate_price"))]
    pub student_price: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SetMinPriceInput {
    #[validate(custom(function = "validate_price"))]
    pub min_price: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CancelInput {
    #[validate(length(min = 1))]
    pub cancel_reason: String,
}

/// One admin action.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RequestAction {
    ChangeStatus(ChangeStatusInput),
    AssignTutor(AssignTutorInput),
    AssignStudent(AssignStudentInput),
    SetTutorPrice(SetTutorPriceInput),
    SetStudentPrice(SetStudentPriceInput),
    SetMinPrice(SetMinPriceInput),
    Cancel(CancelInput),
    Complete,
}

impl RequestAction {
    /// Name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            RequestAction::ChangeStatus(_) => "change_status",
            RequestAction::AssignTutor(_) => "assign_tutor",
            RequestAction::AssignStudent(_) => "assign_student",
            RequestAction::SetTutorPrice(_) => "set_tutor_price",
            RequestAction::SetStudentPrice(_) => "set_student_price",
            RequestAction::SetMinPrice(_) => "set_min_price",
            RequestAction::Cancel(_) => "cancel",
            RequestAction::Complete => "complete",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            RequestAction::ChangeStatus(input) => input.validate()?,
            RequestAction::AssignTutor(input) => input.validate()?,
            RequestAction::AssignStudent(input) => input.validate()?,
            RequestAction::SetTutorPrice(input) => input.validate()?,
            RequestAction::SetStudentPrice(input) => input.validate()?,
            RequestAction::SetMinPrice(input) => input.validate()?,
            RequestAction::Cancel(input) => input.validate()?,
            RequestAction::Complete => {}
        }
        Ok(())
    }
}

/// Applies [`RequestAction`]s to stored requests.
pub struct ActionService<'a> {
    store: &'a dyn Store,
    conversation_delay: Duration,
}

impl<'a> ActionService<'a> {
    pub fn new(store: &'a dyn Store, conversation_delay: Duration) -> Self {
        Self {
            store,
            conversation_delay,
        }
    }

    async fn load(&self, request_id: &str) -> Result<Request> {
        self.store
            .get_request(request_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Request {} not found", request_id)))
    }

    async fn save(&self, mut request: Request) -> Result<Request> {
        request.updated_at = now_rfc3339();
        self.store.upsert_request(&request).await?;
        Ok(request)
    }

    /// Validate and apply an action, returning the updated request.
    pub async fn apply(&self, request_id: &str, action: RequestAction) -> Result<Request> {
        action.validate()?;
        tracing::info!(request_id, action = action.name(), "Applying request action");

        match action {
            RequestAction::ChangeStatus(input) => {
                self.change_status(request_id, input.status, input.cancel_reason)
                    .await
            }
            RequestAction::AssignTutor(input) => {
                let outcome = OfferService::new(self.store, self.conversation_delay)
                    .assign(
                        request_id,
                        &input.tutor_id,
                        input.tutor_price.as_deref(),
                        input.student_price.as_deref(),
                        AssignMode::AdminAssign,
                    )
                    .await?;
                Ok(outcome.request)
            }
            RequestAction::AssignStudent(input) => {
                let request = self.load(request_id).await?;
                if self.store.get_student(&input.student_id).await?.is_none() {
                    return Err(AppError::NotFound(format!(
                        "Student {} not found",
                        input.student_id
                    )));
                }
                self.save(Request {
                    student_id: input.student_id,
                    ..request
                })
                .await
            }
            RequestAction::SetTutorPrice(input) => {
                let request = self.load(request_id).await?;
                self.save(Request {
                    tutor_price: Some(input.tutor_price.trim().to_string()),
                    ..request
                })
                .await
            }
            RequestAction::SetStudentPrice(input) => {
                let request = self.load(request_id).await?;
                self.save(Request {
                    student_price: Some(input.student_price.trim().to_string()),
                    ..request
                })
                .await
            }
            RequestAction::SetMinPrice(input) => {
                let request = self.load(request_id).await?;
                self.save(Request {
                    min_price: Some(input.min_price.trim().to_string()),
                    ..request
                })
                .await
            }
            RequestAction::Cancel(input) => self.cancel(request_id, Some(input.cancel_reason)).await,
            RequestAction::Complete => self.complete(request_id).await,
        }
    }

    async fn change_status(
        &self,
        request_id: &str,
        status: RequestStatus,
        cancel_reason: Option<String>,
    ) -> Result<Request> {
        match status {
            RequestStatus::Cancelled => return self.cancel(request_id, cancel_reason).await,
            RequestStatus::Completed => return self.complete(request_id).await,
            RequestStatus::Ongoing => return self.start_session(request_id).await,
            _ => {}
        }

        let request = self.load(request_id).await?;
        if request.request_status == status {
            return Ok(request);
        }
        if request.request_status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "A {} request cannot move back to {}",
                request.request_status, status
            )));
        }
        self.save(Request {
            request_status: status,
            ..request
        })
        .await
    }

    async fn cancel(&self, request_id: &str, reason: Option<String>) -> Result<Request> {
        let request = self.load(request_id).await?;
        match request.request_status {
            RequestStatus::Cancelled => return Ok(request),
            RequestStatus::Completed => {
                return Err(AppError::Conflict(
                    "A completed request cannot be cancelled".to_string(),
                ));
            }
            _ => {}
        }

        self.save(Request {
            request_status: RequestStatus::Cancelled,
            cancel_reason: reason.or(request.cancel_reason.clone()),
            cancelled_at: Some(now_rfc3339()),
            ..request
        })
        .await
    }

    async fn complete(&self, request_id: &str) -> Result<Request> {
        let request = self.load(request_id).await?;
        match request.request_status {
            RequestStatus::Completed => return Ok(request),
            RequestStatus::Cancelled => {
                return Err(AppError::Conflict(
                    "A cancelled request cannot be completed".to_string(),
                ));
            }
            _ => {}
        }

        self.save(Request {
            request_status: RequestStatus::Completed,
            completed_at: Some(now_rfc3339()),
            ..request
        })
        .await
    }

    /// Mark the request paid and ongoing: issue the invoice from the
    /// accepted offer and write the payment cards into the chat.
    async fn start_session(&self, request_id: &str) -> Result<Request> {
        let request = self.load(request_id).await?;
        if request.request_status == RequestStatus::Ongoing {
            return Ok(request);
        }
        if request.request_status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "Request {} is {}",
                request_id, request.request_status
            )));
        }

        let tutor_id = request.tutor_id.clone().ok_or_else(|| {
            AppError::Conflict("Request has no assigned tutor".to_string())
        })?;
        let offer = self
            .store
            .get_offer(request_id, &tutor_id)
            .await?
            .filter(|o| o.status == OfferStatus::Accepted)
            .ok_or_else(|| {
                AppError::Conflict(format!("No accepted offer from tutor {}", tutor_id))
            })?;

        let now = chrono::Utc::now();
        let amount = parse_price(&offer.price).map_or(offer.price.clone(), format_price);
        let tutor_amount =
            parse_price(&offer.tutor_price).map_or(offer.tutor_price.clone(), format_price);

        let request = self
            .save(Request {
                request_status: RequestStatus::Ongoing,
                invoice_id: Some(crate::ids::invoice_id(now)?),
                invoice_amount: Some(amount.clone()),
                invoice_tutor_amount: Some(tutor_amount),
                invoice_created_at: Some(format_utc_rfc3339(now)),
                ..request
            })
            .await?;

        tracing::info!(
            request_id,
            tutor_id = %tutor_id,
            invoice_id = ?request.invoice_id,
            amount = %amount,
            "Invoice issued"
        );

        Conversation::new(self.store, self.conversation_delay)
            .play(
                &request,
                &tutor_id,
                vec![Draft::student_paid(&amount), Draft::student_ongoing()],
            )
            .await?;

        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;
    use crate::models::{MessageType, Student, Tutor};

    fn action(json: serde_json::Value) -> RequestAction {
        serde_json::from_value(json).unwrap()
    }

    async fn seeded(status: RequestStatus) -> MemoryDb {
        let db = MemoryDb::new();
        db.upsert_request(&Request {
            id: "req1".to_string(),
            student_id: "stu1".to_string(),
            country: Some("Lebanon".to_string()),
            request_status: status,
            ..Default::default()
        })
        .await
        .unwrap();
        db.upsert_tutor(&Tutor {
            id: "tut1".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
        db
    }

    #[test]
    fn test_decode_tagged_actions() {
        assert!(matches!(
            action(serde_json::json!({"action": "complete"})),
            RequestAction::Complete
        ));
        assert!(matches!(
            action(serde_json::json!({"action": "set_min_price", "min_price": "40"})),
            RequestAction::SetMinPrice(_)
        ));
        assert!(matches!(
            action(serde_json::json!({"action": "change_status", "status": "pending_payment"})),
            RequestAction::ChangeStatus(ChangeStatusInput {
                status: RequestStatus::PendingPayment,
                ..
            })
        ));

        let unknown: std::result::Result<RequestAction, _> =
            serde_json::from_value(serde_json::json!({"action": "explode"}));
        assert!(unknown.is_err());
    }

    #[test]
    fn test_price_validation() {
        let bad = action(serde_json::json!({"action": "set_tutor_price", "tutor_price": "ten"}));
        assert!(matches!(bad.validate(), Err(AppError::BadRequest(_))));

        let negative =
            action(serde_json::json!({"action": "set_student_price", "student_price": "-1"}));
        assert!(negative.validate().is_err());

        let ok = action(serde_json::json!({"action": "set_tutor_price", "tutor_price": "12.5"}));
        assert!(ok.validate().is_ok());

        let empty_reason = action(serde_json::json!({"action": "cancel", "cancel_reason": ""}));
        assert!(empty_reason.validate().is_err());
    }

    #[tokio::test]
    async fn test_cancel_and_complete_conflicts() {
        let db = seeded(RequestStatus::Completed).await;
        let service = ActionService::new(&db, Duration::ZERO);
        let err = service
            .apply(
                "req1",
                action(serde_json::json!({"action": "cancel", "cancel_reason": "no show"})),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let db = seeded(RequestStatus::Cancelled).await;
        let service = ActionService::new(&db, Duration::ZERO);
        let err = service
            .apply("req1", RequestAction::Complete)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_closed_request_cannot_reopen() {
        for closed in [RequestStatus::Completed, RequestStatus::Cancelled] {
            let db = seeded(closed).await;
            let service = ActionService::new(&db, Duration::ZERO);

            for target in ["new", "pending", "pending_payment", "tutor_completed"] {
                let err = service
                    .apply(
                        "req1",
                        action(serde_json::json!({"action": "change_status", "status": target})),
                    )
                    .await
                    .unwrap_err();
                assert!(matches!(err, AppError::Conflict(_)), "{closed} -> {target}");
            }

            let stored = db.get_request("req1").await.unwrap().unwrap();
            assert_eq!(stored.request_status, closed);
        }
    }

    #[tokio::test]
    async fn test_cancel_records_reason_and_time() {
        let db = seeded(RequestStatus::Pending).await;
        let request = ActionService::new(&db, Duration::ZERO)
            .apply(
                "req1",
                action(serde_json::json!({"action": "cancel", "cancel_reason": "no show"})),
            )
            .await
            .unwrap();
        assert_eq!(request.request_status, RequestStatus::Cancelled);
        assert_eq!(request.cancel_reason.as_deref(), Some("no show"));
        assert!(request.cancelled_at.is_some());
    }

    #[tokio::test]
    async fn test_assign_student_requires_existing_student() {
        let db = seeded(RequestStatus::New).await;
        let service = ActionService::new(&db, Duration::ZERO);
        let assign = || action(serde_json::json!({"action": "assign_student", "student_id": "stu2"}));

        let err = service.apply("req1", assign()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        db.upsert_student(&Student {
            id: "stu2".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
        let request = service.apply("req1", assign()).await.unwrap();
        assert_eq!(request.student_id, "stu2");
    }

    #[tokio::test]
    async fn test_ongoing_issues_invoice_and_writes_cards() {
        let db = seeded(RequestStatus::Pending).await;
        let service = ActionService::new(&db, Duration::ZERO);

        service
            .apply(
                "req1",
                action(serde_json::json!({
                    "action": "assign_tutor",
                    "tutor_id": "tut1",
                    "tutor_price": "10"
                })),
            )
            .await
            .unwrap();

        let request = service
            .apply(
                "req1",
                action(serde_json::json!({"action": "change_status", "status": "ongoing"})),
            )
            .await
            .unwrap();

        assert_eq!(request.request_status, RequestStatus::Ongoing);
        assert_eq!(request.invoice_amount.as_deref(), Some("20.00"));
        assert_eq!(request.invoice_tutor_amount.as_deref(), Some("10.00"));
        assert!(request
            .invoice_id
            .as_deref()
            .is_some_and(|id| id.starts_with("INV-")));

        let kinds: Vec<MessageType> = db
            .list_chat_messages("req1_tut1")
            .await
            .unwrap()
            .iter()
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
    }

    #[tokio::test]
    async fn test_ongoing_without_tutor_conflicts() {
        let db = seeded(RequestStatus::Pending).await;
        let err = ActionService::new(&db, Duration::ZERO)
            .apply(
                "req1",
                action(serde_json::json!({"action": "change_status", "status": "ongoing"})),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
