// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard figures.

use crate::db::{DocQuery, Store};
use crate::error::Result;
use crate::models::{Request, RequestStatus};
use crate::services::pricing::{format_price, parse_price};
use serde::Serialize;
use std::collections::BTreeMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Revenue over completed requests. Amounts are 2-decimal strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Revenue {
    pub student_total: String,
    pub tutor_total: String,
    pub margin: String,
}

impl Revenue {
    /// Sum prices over completed requests. Unparseable prices count as zero.
    pub fn from_requests<'r>(requests: impl IntoIterator<Item = &'r Request>) -> Self {
        let price = |p: &Option<String>| p.as_deref().and_then(parse_price).unwrap_or(0.0);
        let (student, tutor) = requests
            .into_iter()
            .filter(|r| r.request_status == RequestStatus::Completed)
            .fold((0.0, 0.0), |(s, t), r| {
                (s + price(&r.student_price), t + price(&r.tutor_price))
            });

        Self {
            student_total: format_price(student),
            tutor_total: format_price(tutor),
            margin: format_price(student - tutor),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DashboardReport {
    pub active_students: usize,
    pub active_tutors: usize,
    /// Every status is present, zero if unused
    pub requests_by_status: BTreeMap<String, usize>,
    pub total_requests: usize,
    pub revenue: Revenue,
    pub rooms_with_agent: usize,
}

pub async fn dashboard(store: &dyn Store) -> Result<DashboardReport> {
    let all = DocQuery::new().unordered();
    let with_agent = DocQuery::new().eq_bool("with_agent", true).unordered();
    let (students, tutors, requests, rooms) = futures_util::try_join!(
        store.query_students(&all),
        store.query_tutors(&all),
        store.query_requests(&all),
        store.query_support_rooms(&with_agent),
    )?;

    let mut requests_by_status: BTreeMap<String, usize> = RequestStatus::ALL
        .iter()
        .map(|s| (s.as_str().to_string(), 0))
        .collect();
    for request in &requests {
        *requests_by_status
            .entry(request.request_status.as_str().to_string())
            .or_default() += 1;
    }

    let report = DashboardReport {
        active_students: students.iter().filter(|s| s.is_active()).count(),
        active_tutors: tutors.iter().filter(|t| t.is_active()).count(),
        requests_by_status,
        total_requests: requests.len(),
        revenue: Revenue::from_requests(&requests),
        rooms_with_agent: rooms.len(),
    };

    tracing::debug!(
        total_requests = report.total_requests,
        margin = %report.revenue.margin,
        "Dashboard computed"
    );
    Ok(report)
}
