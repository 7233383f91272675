// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory [`Store`] for tests and benchmarks.
//!
//! Mirrors the Firestore semantics the handlers rely on: equality filters,
//! newest-first ordering on `created_at`, and keyed upserts.

use crate::db::{DocQuery, FilterValue, Store};
use crate::error::AppError;
use crate::models::{
    ChatMessage, LinkedAccounts, ProfileFlags, ProfileKind, Request, RequestChat, Student,
    SupportMessage, SupportRoom, Tutor, TutorOffer,
};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// In-memory document store. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryDb {
    students: Arc<DashMap<String, Student>>,
    tutors: Arc<DashMap<String, Tutor>>,
    requests: Arc<DashMap<String, Request>>,
    /// Keyed by `(request_id, tutor_id)`
    offers: Arc<DashMap<(String, String), TutorOffer>>,
    chats: Arc<DashMap<String, RequestChat>>,
    chat_messages: Arc<DashMap<String, Vec<ChatMessage>>>,
    rooms: Arc<DashMap<String, SupportRoom>>,
    room_messages: Arc<DashMap<String, Vec<SupportMessage>>>,
    writes: Arc<AtomicUsize>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of document writes performed so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    fn record_writes(&self, count: usize) {
        self.writes.fetch_add(count, Ordering::Relaxed);
    }
}

fn matches_filters(doc: &Value, filters: &[(String, FilterValue)]) -> bool {
    filters
        .iter()
        .all(|(field, expected)| match (doc.get(field), expected) {
            (Some(Value::String(actual)), FilterValue::Str(expected)) => actual == expected,
            (Some(Value::Bool(actual)), FilterValue::Bool(expected)) => actual == expected,
            _ => false,
        })
}

/// Apply a [`DocQuery`] to a set of documents.
fn run_query<T, I>(docs: I, query: &DocQuery) -> Vec<T>
where
    T: Serialize + Clone,
    I: IntoIterator<Item = T>,
{
    let mut rows: Vec<(String, T)> = docs
        .into_iter()
        .filter_map(|doc| {
            let value = serde_json::to_value(&doc).ok()?;
            if !matches_filters(&value, &query.filters) {
                return None;
            }
            let created_at = value
                .get("created_at")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Some((created_at, doc))
        })
        .collect();

    if !query.unordered {
        rows.sort_by(|a, b| b.0.cmp(&a.0));
    }

    let limit = query.limit.map_or(rows.len(), |l| l as usize);
    rows.into_iter().take(limit).map(|(_, doc)| doc).collect()
}

fn values<T: Clone>(map: &DashMap<String, T>) -> Vec<T> {
    map.iter().map(|entry| entry.value().clone()).collect()
}

#[async_trait]
impl Store for MemoryDb {
    async fn get_student(&self, id: &str) -> Result<Option<Student>, AppError> {
        Ok(self.students.get(id).map(|s| s.clone()))
    }

    async fn upsert_student(&self, student: &Student) -> Result<(), AppError> {
        self.students.insert(student.id.clone(), student.clone());
        self.record_writes(1);
        Ok(())
    }

    async fn query_students(&self, query: &DocQuery) -> Result<Vec<Student>, AppError> {
        Ok(run_query(values(&self.students), query))
    }

    async fn get_tutor(&self, id: &str) -> Result<Option<Tutor>, AppError> {
        Ok(self.tutors.get(id).map(|t| t.clone()))
    }

    async fn upsert_tutor(&self, tutor: &Tutor) -> Result<(), AppError> {
        self.tutors.insert(tutor.id.clone(), tutor.clone());
        self.record_writes(1);
        Ok(())
    }

    async fn query_tutors(&self, query: &DocQuery) -> Result<Vec<Tutor>, AppError> {
        Ok(run_query(values(&self.tutors), query))
    }

    async fn write_profile_flags(
        &self,
        kind: ProfileKind,
        updates: &[(String, ProfileFlags)],
    ) -> Result<(), AppError> {
        for (id, flags) in updates {
            let written = match kind {
                ProfileKind::Students => self.students.get_mut(id).map(|mut s| s.set_flags(*flags)),
                ProfileKind::Tutors => self.tutors.get_mut(id).map(|mut t| t.set_flags(*flags)),
            };
            if written.is_none() {
                tracing::warn!(collection = kind.collection(), id = %id, "Flag update for missing profile");
            }
        }
        self.record_writes(updates.len());
        Ok(())
    }

    async fn get_request(&self, id: &str) -> Result<Option<Request>, AppError> {
        Ok(self.requests.get(id).map(|r| r.clone()))
    }

    async fn upsert_request(&self, request: &Request) -> Result<(), AppError> {
        self.requests.insert(request.id.clone(), request.clone());
        self.record_writes(1);
        Ok(())
    }

    async fn query_requests(&self, query: &DocQuery) -> Result<Vec<Request>, AppError> {
        Ok(run_query(values(&self.requests), query))
    }

    async fn list_offers(&self, request_id: &str) -> Result<Vec<TutorOffer>, AppError> {
        let offers: Vec<TutorOffer> = self
            .offers
            .iter()
            .filter(|entry| entry.key().0 == request_id)
            .map(|entry| entry.value().clone())
            .collect();
        Ok(run_query(offers, &DocQuery::new()))
    }

    async fn get_offer(
        &self,
        request_id: &str,
        tutor_id: &str,
    ) -> Result<Option<TutorOffer>, AppError> {
        Ok(self
            .offers
            .get(&(request_id.to_string(), tutor_id.to_string()))
            .map(|o| o.clone()))
    }

    async fn upsert_offer(&self, offer: &TutorOffer) -> Result<(), AppError> {
        self.offers.insert(
            (offer.request_id.clone(), offer.tutor_id.clone()),
            offer.clone(),
        );
        self.record_writes(1);
        Ok(())
    }

    async fn delete_offer(&self, request_id: &str, tutor_id: &str) -> Result<(), AppError> {
        self.offers
            .remove(&(request_id.to_string(), tutor_id.to_string()));
        self.record_writes(1);
        Ok(())
    }

    async fn commit_assignment(
        &self,
        request: &Request,
        accepted: &TutorOffer,
        rejected: &[TutorOffer],
    ) -> Result<(), AppError> {
        self.requests.insert(request.id.clone(), request.clone());
        for offer in std::iter::once(accepted).chain(rejected) {
            self.offers.insert(
                (offer.request_id.clone(), offer.tutor_id.clone()),
                offer.clone(),
            );
        }
        self.record_writes(2 + rejected.len());
        Ok(())
    }

    async fn get_request_chat(&self, chat_id: &str) -> Result<Option<RequestChat>, AppError> {
        Ok(self.chats.get(chat_id).map(|c| c.clone()))
    }

    async fn append_chat_message(
        &self,
        chat: &RequestChat,
        message: &ChatMessage,
    ) -> Result<(), AppError> {
        self.chat_messages
            .entry(chat.id.clone())
            .or_default()
            .push(message.clone());
        self.chats.insert(chat.id.clone(), chat.clone());
        self.record_writes(2);
        Ok(())
    }

    async fn list_chat_messages(&self, chat_id: &str) -> Result<Vec<ChatMessage>, AppError> {
        Ok(self
            .chat_messages
            .get(chat_id)
            .map(|m| m.clone())
            .unwrap_or_default())
    }

    async fn get_support_room(&self, id: &str) -> Result<Option<SupportRoom>, AppError> {
        Ok(self.rooms.get(id).map(|r| r.clone()))
    }

    async fn upsert_support_room(&self, room: &SupportRoom) -> Result<(), AppError> {
        self.rooms.insert(room.id.clone(), room.clone());
        self.record_writes(1);
        Ok(())
    }

    async fn query_support_rooms(&self, query: &DocQuery) -> Result<Vec<SupportRoom>, AppError> {
        Ok(run_query(values(&self.rooms), query))
    }

    async fn append_support_message(
        &self,
        room: &SupportRoom,
        message: &SupportMessage,
    ) -> Result<(), AppError> {
        self.room_messages
            .entry(room.id.clone())
            .or_default()
            .push(message.clone());
        self.rooms.insert(room.id.clone(), room.clone());
        self.record_writes(2);
        Ok(())
    }

    async fn list_support_messages(
        &self,
        room_id: &str,
    ) -> Result<Vec<SupportMessage>, AppError> {
        Ok(self
            .room_messages
            .get(room_id)
            .map(|m| m.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RequestStatus;

    fn request(id: &str, status: RequestStatus, created_at: &str) -> Request {
        Request {
            id: id.to_string(),
            student_id: "s1".to_string(),
            request_status: status,
            created_at: created_at.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_query_filters_and_orders_newest_first() {
        let db = MemoryDb::new();
        db.upsert_request(&request("a", RequestStatus::Pending, "2024-01-01T00:00:00.000Z"))
            .await
            .unwrap();
        db.upsert_request(&request("b", RequestStatus::Pending, "2024-03-01T00:00:00.000Z"))
            .await
            .unwrap();
        db.upsert_request(&request("c", RequestStatus::Ongoing, "2024-02-01T00:00:00.000Z"))
            .await
            .unwrap();

        let pending = db
            .query_requests(&DocQuery::new().eq("request_status", "pending"))
            .await
            .unwrap();
        let ids: Vec<&str> = pending.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);

        let newest = db.query_requests(&DocQuery::new().limit(1)).await.unwrap();
        assert_eq!(newest[0].id, "b");
    }

    #[tokio::test]
    async fn test_unordered_query_keeps_undated_docs() {
        let db = MemoryDb::new();
        db.upsert_request(&request("dated", RequestStatus::Pending, "2024-01-01T00:00:00.000Z"))
            .await
            .unwrap();
        db.upsert_request(&request("legacy", RequestStatus::Pending, ""))
            .await
            .unwrap();
        db.upsert_request(&request("other", RequestStatus::Ongoing, ""))
            .await
            .unwrap();

        let query = DocQuery::new().eq("request_status", "pending").unordered();
        assert!(query.unordered);
        let mut ids: Vec<String> = db
            .query_requests(&query)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["dated", "legacy"]);
    }

    #[tokio::test]
    async fn test_bool_filters_on_rooms() {
        let db = MemoryDb::new();
        for (id, with_agent) in [("r1", true), ("r2", false)] {
            db.upsert_support_room(&SupportRoom {
                id: id.to_string(),
                user_id: "u".to_string(),
                with_agent,
                ..Default::default()
            })
            .await
            .unwrap();
        }

        let rooms = db
            .query_support_rooms(&DocQuery::new().eq_bool("with_agent", true))
            .await
            .unwrap();
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].id, "r1");
        assert_eq!(db.write_count(), 2);
    }
}
