// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Tutoring request and tutor offer models.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Lifecycle status of a tutoring request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    New,
    Pending,
    PendingPayment,
    Ongoing,
    TutorCompleted,
    Completed,
    Cancelled,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 7] = [
        RequestStatus::New,
        RequestStatus::Pending,
        RequestStatus::PendingPayment,
        RequestStatus::Ongoing,
        RequestStatus::TutorCompleted,
        RequestStatus::Completed,
        RequestStatus::Cancelled,
    ];

    /// Stored string form (also used in search filters).
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::New => "new",
            RequestStatus::Pending => "pending",
            RequestStatus::PendingPayment => "pending_payment",
            RequestStatus::Ongoing => "ongoing",
            RequestStatus::TutorCompleted => "tutor_completed",
            RequestStatus::Completed => "completed",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    /// No further offers or assignments once a request is closed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Cancelled)
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tutoring job ticket stored in `requests/{id}`.
///
/// Prices are decimal strings, as written by the admin frontend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Request {
    /// Document ID
    #[serde(default)]
    pub id: String,
    pub student_id: String,
    #[serde(default)]
    pub tutor_id: Option<String>,
    #[serde(default)]
    pub student_price: Option<String>,
    #[serde(default)]
    pub tutor_price: Option<String>,
    #[serde(default)]
    pub min_price: Option<String>,
    #[serde(default)]
    pub request_status: RequestStatus,
    #[serde(default)]
    pub assistance_type: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub cancel_reason: Option<String>,
    #[serde(default)]
    pub issue_reported: Option<String>,

    // ─── Invoice ────────────────────────────────────────────────
    #[serde(default)]
    pub invoice_id: Option<String>,
    /// Amount charged to the student
    #[serde(default)]
    pub invoice_amount: Option<String>,
    /// Amount paid to the tutor
    #[serde(default)]
    pub invoice_tutor_amount: Option<String>,
    #[serde(default)]
    pub invoice_created_at: Option<String>,

    // ─── Timestamps (RFC3339) ───────────────────────────────────
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub cancelled_at: Option<String>,
}

/// Status of a tutor's bid on a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

/// A tutor's bid, stored at `requests/{request_id}/tutor_offers/{tutor_id}`.
///
/// Keyed by tutor, so a tutor has at most one offer per request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TutorOffer {
    #[serde(default)]
    pub tutor_id: String,
    pub request_id: String,
    /// What the tutor asked for
    pub tutor_price: String,
    /// Student-facing price
    pub price: String,
    #[serde(default)]
    pub status: OfferStatus,
    #[serde(default)]
    pub cancel_reason: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}
