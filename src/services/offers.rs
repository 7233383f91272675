// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tutor offer lifecycle: bidding, acceptance, rejection.
//!
//! Assigning a tutor from the admin console and accepting a tutor's offer
//! are the same operation with different price inputs, so both go through
//! [`OfferService::assign`].

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::{OfferStatus, Request, RequestStatus, TutorOffer};
use crate::services::conversation::{Conversation, Draft};
use crate::services::pricing::{
    calculate_tutor_offer_price, effective_student_price, is_student_price_override, parse_price,
    EffectivePrice, PriceInputs,
};
use crate::time_utils::now_rfc3339;
use serde::Serialize;
use std::time::Duration;

/// Reason recorded on offers rejected because another tutor was chosen.
pub const SIBLING_REJECTION_REASON: &str = "Another tutor was selected";

/// How an assignment was initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignMode {
    /// Admin picks a tutor (and maybe prices) for the student
    AdminAssign,
    /// Admin accepts an existing tutor offer on the student's behalf
    AcceptOffer,
}

/// Result of an assignment.
#[derive(Debug, Clone, Serialize)]
pub struct AssignmentOutcome {
    pub request: Request,
    pub offer: TutorOffer,
    pub rejected_offers: usize,
    /// The tutor was already assigned at this price; nothing was written
    pub unchanged: bool,
}

/// Resolve the student price for an assignment.
///
/// An explicit admin override wins, then an override already stored on
/// the request, then the calculated price floored by `min_price`.
pub fn resolve_effective_price(
    request: &Request,
    preferred: Option<&str>,
    tutor_price: &str,
) -> EffectivePrice {
    let student_price = preferred
        .filter(|p| is_student_price_override(p))
        .or_else(|| {
            request
                .student_price
                .as_deref()
                .filter(|p| is_student_price_override(p))
        });

    effective_student_price(PriceInputs {
        student_price,
        tutor_price: Some(tutor_price),
        country: request.country.as_deref(),
        min_price: request.min_price.as_deref(),
    })
}

/// Offers that must be rejected when `keep_tutor_id` is assigned.
///
/// Pending offers are rejected, and so is any offer previously accepted
/// for a different tutor, so a request has at most one accepted offer.
/// Offers that are already rejected are left alone.
pub fn sibling_offers_to_reject(
    offers: &[TutorOffer],
    keep_tutor_id: &str,
    now: &str,
) -> Vec<TutorOffer> {
    offers
        .iter()
        .filter(|o| o.tutor_id != keep_tutor_id && o.status != OfferStatus::Rejected)
        .map(|o| TutorOffer {
            status: OfferStatus::Rejected,
            cancel_reason: Some(SIBLING_REJECTION_REASON.to_string()),
            updated_at: now.to_string(),
            ..o.clone()
        })
        .collect()
}

/// Validate a caller-supplied price string.
pub fn require_price(field: &str, value: &str) -> Result<f64> {
    match parse_price(value) {
        Some(v) if v >= 0.0 => Ok(v),
        _ => Err(AppError::BadRequest(format!(
            "{field} must be a non-negative number"
        ))),
    }
}

/// Service for tutor offers on a request.
pub struct OfferService<'a> {
    store: &'a dyn Store,
    conversation_delay: Duration,
}

impl<'a> OfferService<'a> {
    pub fn new(store: &'a dyn Store, conversation_delay: Duration) -> Self {
        Self {
            store,
            conversation_delay,
        }
    }

    async fn load_request(&self, request_id: &str) -> Result<Request> {
        self.store
            .get_request(request_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Request {} not found", request_id)))
    }

    async fn load_offer(&self, request_id: &str, tutor_id: &str) -> Result<TutorOffer> {
        self.store
            .get_offer(request_id, tutor_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Offer from tutor {} on request {} not found",
                    tutor_id, request_id
                ))
            })
    }

    /// List offers on a request, newest first.
    pub async fn list(&self, request_id: &str) -> Result<Vec<TutorOffer>> {
        self.load_request(request_id).await?;
        self.store.list_offers(request_id).await
    }

    /// Create or replace a tutor's bid. The offer is keyed by tutor, so a
    /// second bid from the same tutor overwrites the first.
    pub async fn place_bid(
        &self,
        request_id: &str,
        tutor_id: &str,
        tutor_price: &str,
    ) -> Result<TutorOffer> {
        let mut request = self.load_request(request_id).await?;
        if request.request_status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "Request {} is {}",
                request_id, request.request_status
            )));
        }

        if self.store.get_tutor(tutor_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Tutor {} not found", tutor_id)));
        }

        if require_price("tutor_price", tutor_price)? == 0.0 {
            return Err(AppError::BadRequest(
                "tutor_price must be greater than zero".to_string(),
            ));
        }

        let existing = self.store.get_offer(request_id, tutor_id).await?;
        if existing
            .as_ref()
            .is_some_and(|o| o.status == OfferStatus::Accepted)
        {
            return Err(AppError::Conflict(format!(
                "Offer from tutor {} was already accepted",
                tutor_id
            )));
        }

        let now = now_rfc3339();
        let offer = TutorOffer {
            tutor_id: tutor_id.to_string(),
            request_id: request_id.to_string(),
            tutor_price: tutor_price.trim().to_string(),
            price: calculate_tutor_offer_price(tutor_price, request.country.as_deref()),
            status: OfferStatus::Pending,
            cancel_reason: None,
            created_at: existing.map_or_else(|| now.clone(), |o| o.created_at),
            updated_at: now.clone(),
        };
        self.store.upsert_offer(&offer).await?;

        // First bid moves a new request into the pending pool
        if request.request_status == RequestStatus::New {
            request.request_status = RequestStatus::Pending;
            request.updated_at = now;
            self.store.upsert_request(&request).await?;
        }

        tracing::info!(
            request_id,
            tutor_id,
            price = %offer.price,
            "Tutor offer placed"
        );

        Ok(offer)
    }

    /// Assign a tutor to a request.
    ///
    /// Writes the request, the accepted offer and the rejected siblings
    /// together, then appends the chat cards. Re-running an assignment
    /// that is already in place writes nothing.
    pub async fn assign(
        &self,
        request_id: &str,
        tutor_id: &str,
        tutor_price: Option<&str>,
        student_price: Option<&str>,
        mode: AssignMode,
    ) -> Result<AssignmentOutcome> {
        let request = self.load_request(request_id).await?;

        match request.request_status {
            RequestStatus::New | RequestStatus::Pending | RequestStatus::PendingPayment => {}
            status => {
                return Err(AppError::Conflict(format!(
                    "Cannot assign a tutor to a request that is {}",
                    status
                )));
            }
        }

        let existing = match mode {
            AssignMode::AcceptOffer => Some(self.load_offer(request_id, tutor_id).await?),
            AssignMode::AdminAssign => {
                if self.store.get_tutor(tutor_id).await?.is_none() {
                    return Err(AppError::NotFound(format!("Tutor {} not found", tutor_id)));
                }
                self.store.get_offer(request_id, tutor_id).await?
            }
        };

        let tutor_price = tutor_price
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .or_else(|| existing.as_ref().map(|o| o.tutor_price.as_str()))
            .or(request.tutor_price.as_deref())
            .ok_or_else(|| AppError::BadRequest("tutor_price is required".to_string()))?
            .to_string();
        require_price("tutor_price", &tutor_price)?;

        // An accepted bid is priced by the request's rules, not by the bid's display price
        let preferred = match mode {
            AssignMode::AdminAssign => student_price,
            AssignMode::AcceptOffer => None,
        };
        let effective = resolve_effective_price(&request, preferred, &tutor_price);

        if let Some(offer) = existing.as_ref().filter(|o| {
            o.status == OfferStatus::Accepted
                && o.tutor_price == tutor_price
                && request.tutor_id.as_deref() == Some(tutor_id)
                && request.student_price.as_deref() == Some(effective.price.as_str())
        }) {
            tracing::debug!(request_id, tutor_id, "Tutor already assigned (idempotent skip)");
            return Ok(AssignmentOutcome {
                offer: offer.clone(),
                request,
                rejected_offers: 0,
                unchanged: true,
            });
        }

        let now = now_rfc3339();
        let offers = self.store.list_offers(request_id).await?;
        let rejected = sibling_offers_to_reject(&offers, tutor_id, &now);

        let edited_bid = existing.is_some();
        let accepted = TutorOffer {
            tutor_id: tutor_id.to_string(),
            request_id: request_id.to_string(),
            tutor_price: tutor_price.clone(),
            price: effective.price.clone(),
            status: OfferStatus::Accepted,
            cancel_reason: None,
            created_at: existing.map_or_else(|| now.clone(), |o| o.created_at),
            updated_at: now.clone(),
        };

        let request = Request {
            tutor_id: Some(tutor_id.to_string()),
            tutor_price: Some(tutor_price),
            student_price: Some(effective.price.clone()),
            request_status: RequestStatus::PendingPayment,
            updated_at: now,
            ..request
        };

        self.store
            .commit_assignment(&request, &accepted, &rejected)
            .await?;

        tracing::info!(
            request_id,
            tutor_id,
            student_price = %effective.price,
            price_source = ?effective.source,
            rejected = rejected.len(),
            mode = ?mode,
            "Tutor assigned"
        );

        let drafts = match mode {
            AssignMode::AdminAssign => vec![
                Draft::tutor_bid(&effective.price, edited_bid),
                Draft::student_accept(&effective.price),
            ],
            AssignMode::AcceptOffer => vec![Draft::student_accept(&effective.price)],
        };
        Conversation::new(self.store, self.conversation_delay)
            .play(&request, tutor_id, drafts)
            .await?;

        Ok(AssignmentOutcome {
            request,
            offer: accepted,
            rejected_offers: rejected.len(),
            unchanged: false,
        })
    }

    /// Reject a single offer.
    pub async fn reject(
        &self,
        request_id: &str,
        tutor_id: &str,
        reason: Option<String>,
    ) -> Result<TutorOffer> {
        let request = self.load_request(request_id).await?;
        let offer = self.load_offer(request_id, tutor_id).await?;

        match offer.status {
            OfferStatus::Rejected => return Ok(offer),
            OfferStatus::Accepted if request.tutor_id.as_deref() == Some(tutor_id) => {
                return Err(AppError::Conflict(
                    "Cannot reject the offer of the assigned tutor".to_string(),
                ));
            }
            _ => {}
        }

        let offer = TutorOffer {
            status: OfferStatus::Rejected,
            cancel_reason: reason,
            updated_at: now_rfc3339(),
            ..offer
        };
        self.store.upsert_offer(&offer).await?;

        tracing::info!(request_id, tutor_id, "Tutor offer rejected");
        Ok(offer)
    }

    /// Delete an offer.
    pub async fn delete(&self, request_id: &str, tutor_id: &str) -> Result<()> {
        self.load_offer(request_id, tutor_id).await?;
        self.store.delete_offer(request_id, tutor_id).await?;

        tracing::info!(request_id, tutor_id, "Tutor offer deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;
    use crate::models::{MessageType, Tutor};
    use crate::services::pricing::PriceSource;

    fn offer(tutor_id: &str, status: OfferStatus) -> TutorOffer {
        TutorOffer {
            tutor_id: tutor_id.to_string(),
            request_id: "req1".to_string(),
            tutor_price: "10".to_string(),
            price: "30.00".to_string(),
            status,
            ..Default::default()
        }
    }

    async fn seeded() -> MemoryDb {
        let db = MemoryDb::new();
        db.upsert_request(&Request {
            id: "req1".to_string(),
            student_id: "stu1".to_string(),
            country: Some("France".to_string()),
            request_status: RequestStatus::Pending,
            ..Default::default()
        })
        .await
        .unwrap();
        for id in ["tut1", "tut2", "tut3"] {
            db.upsert_tutor(&Tutor {
                id: id.to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        }
        db
    }

    #[test]
    fn test_resolve_effective_price_priority() {
        let mut request = Request {
            country: Some("Lebanon".to_string()),
            ..Default::default()
        };

        let calculated = resolve_effective_price(&request, None, "10");
        assert_eq!(calculated.price, "20.00");
        assert_eq!(calculated.source, PriceSource::Calculated);

        request.student_price = Some("35".to_string());
        assert_eq!(resolve_effective_price(&request, None, "10").price, "35.00");
        assert_eq!(
            resolve_effective_price(&request, Some("50"), "10").price,
            "50.00"
        );
        // A zero preference is not an override
        assert_eq!(
            resolve_effective_price(&request, Some("0"), "10").price,
            "35.00"
        );
    }

    #[test]
    fn test_sibling_offers_to_reject() {
        let offers = vec![
            offer("keep", OfferStatus::Pending),
            offer("pending", OfferStatus::Pending),
            offer("old", OfferStatus::Accepted),
            offer("gone", OfferStatus::Rejected),
        ];

        let rejected = sibling_offers_to_reject(&offers, "keep", "now");
        let ids: Vec<&str> = rejected.iter().map(|o| o.tutor_id.as_str()).collect();
        assert_eq!(ids, vec!["pending", "old"]);
        assert!(rejected.iter().all(|o| o.status == OfferStatus::Rejected
            && o.cancel_reason.as_deref() == Some(SIBLING_REJECTION_REASON)));
    }

    #[tokio::test]
    async fn test_place_bid_prices_and_overwrites() {
        let db = seeded().await;
        let service = OfferService::new(&db, Duration::ZERO);

        let first = service.place_bid("req1", "tut1", "15").await.unwrap();
        assert_eq!(first.price, "45.00");

        let second = service.place_bid("req1", "tut1", "20").await.unwrap();
        assert_eq!(second.price, "60.00");
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(db.list_offers("req1").await.unwrap().len(), 1);

        let err = service.place_bid("req1", "tut1", "-3").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_accept_offer_rejects_siblings_and_is_idempotent() {
        let db = seeded().await;
        let service = OfferService::new(&db, Duration::ZERO);
        service.place_bid("req1", "tut1", "10").await.unwrap();
        service.place_bid("req1", "tut2", "12").await.unwrap();

        let outcome = service
            .assign("req1", "tut1", None, None, AssignMode::AcceptOffer)
            .await
            .unwrap();
        assert!(!outcome.unchanged);
        assert_eq!(outcome.rejected_offers, 1);
        assert_eq!(outcome.request.student_price.as_deref(), Some("30.00"));
        assert_eq!(
            outcome.request.request_status,
            RequestStatus::PendingPayment
        );

        let writes = db.write_count();
        let again = service
            .assign("req1", "tut1", None, None, AssignMode::AcceptOffer)
            .await
            .unwrap();
        assert!(again.unchanged);
        assert_eq!(db.write_count(), writes);

        let messages = db.list_chat_messages("req1_tut1").await.unwrap();
        let accepts = messages
            .iter()
            .filter(|m| m.message_type == MessageType::StudentAccept)
            .count();
        assert_eq!(accepts, 1);

        let tut2 = db.get_offer("req1", "tut2").await.unwrap().unwrap();
        assert_eq!(tut2.status, OfferStatus::Rejected);
    }

    #[tokio::test]
    async fn test_accept_offer_applies_min_price() {
        let db = seeded().await;
        let mut request = db.get_request("req1").await.unwrap().unwrap();
        request.min_price = Some("40".to_string());
        db.upsert_request(&request).await.unwrap();

        let service = OfferService::new(&db, Duration::ZERO);
        let bid = service.place_bid("req1", "tut1", "10").await.unwrap();
        assert_eq!(bid.price, "30.00");

        let outcome = service
            .assign("req1", "tut1", None, None, AssignMode::AcceptOffer)
            .await
            .unwrap();
        assert_eq!(outcome.request.student_price.as_deref(), Some("40.00"));
        assert_eq!(outcome.offer.price, "40.00");

        let messages = db.list_chat_messages("req1_tut1").await.unwrap();
        assert_eq!(messages[0].price.as_deref(), Some("40.00"));
    }

    #[tokio::test]
    async fn test_accept_offer_keeps_admin_price_override() {
        let db = seeded().await;
        let mut request = db.get_request("req1").await.unwrap().unwrap();
        request.student_price = Some("55".to_string());
        db.upsert_request(&request).await.unwrap();

        let service = OfferService::new(&db, Duration::ZERO);
        service.place_bid("req1", "tut1", "10").await.unwrap();

        let outcome = service
            .assign("req1", "tut1", None, None, AssignMode::AcceptOffer)
            .await
            .unwrap();
        assert_eq!(outcome.request.student_price.as_deref(), Some("55.00"));
    }

    #[tokio::test]
    async fn test_admin_assign_writes_bid_then_accept() {
        let db = seeded().await;
        let service = OfferService::new(&db, Duration::ZERO);

        service
            .assign("req1", "tut3", Some("10"), Some("55"), AssignMode::AdminAssign)
            .await
            .unwrap();

        let offer = db.get_offer("req1", "tut3").await.unwrap().unwrap();
        assert_eq!(offer.status, OfferStatus::Accepted);
        assert_eq!(offer.price, "55.00");

        let kinds: Vec<MessageType> = db
            .list_chat_messages("req1_tut3")
            .await
            .unwrap()
            .iter()
            .map(|m| m.message_type)
            .collect();
        assert_eq!(kinds, vec![MessageType::TutorBid, MessageType::StudentAccept]);
    }

    #[tokio::test]
    async fn test_admin_assign_over_existing_bid_is_an_edit() {
        let db = seeded().await;
        let service = OfferService::new(&db, Duration::ZERO);
        service.place_bid("req1", "tut2", "12").await.unwrap();

        service
            .assign("req1", "tut2", None, None, AssignMode::AdminAssign)
            .await
            .unwrap();

        let messages = db.list_chat_messages("req1_tut2").await.unwrap();
        assert_eq!(messages[0].message_type, MessageType::TutorEditBid);
        let request = db.get_request("req1").await.unwrap().unwrap();
        assert_eq!(request.tutor_price.as_deref(), Some("12"));
        assert_eq!(request.student_price.as_deref(), Some("36.00"));
    }

    #[tokio::test]
    async fn test_assign_requires_known_tutor_and_price() {
        let db = seeded().await;
        let service = OfferService::new(&db, Duration::ZERO);

        let missing = service
            .assign("req1", "nobody", Some("10"), None, AssignMode::AdminAssign)
            .await
            .unwrap_err();
        assert!(matches!(missing, AppError::NotFound(_)));

        let no_price = service
            .assign("req1", "tut1", None, None, AssignMode::AdminAssign)
            .await
            .unwrap_err();
        assert!(matches!(no_price, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_reject_assigned_offer_conflicts() {
        let db = seeded().await;
        let service = OfferService::new(&db, Duration::ZERO);
        service.place_bid("req1", "tut1", "10").await.unwrap();
        service
            .assign("req1", "tut1", None, None, AssignMode::AcceptOffer)
            .await
            .unwrap();

        let err = service.reject("req1", "tut1", None).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let err = service.place_bid("req1", "tut1", "11").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
