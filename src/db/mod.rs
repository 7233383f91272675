// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! Handlers talk to a [`Store`]; [`FirestoreDb`] is the production
//! implementation and [`MemoryDb`] backs tests and benchmarks.

pub mod firestore;
pub mod memory;

pub use self::firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{
    ChatMessage, ProfileFlags, ProfileKind, Request, RequestChat, Student, SupportMessage,
    SupportRoom, Tutor, TutorOffer,
};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const STUDENTS: &str = "students";
    pub const TUTORS: &str = "tutors";
    pub const REQUESTS: &str = "requests";
    /// Sub-collection of `requests/{id}`, keyed by tutor ID
    pub const TUTOR_OFFERS: &str = "tutor_offers";
    pub const REQUEST_CHATS: &str = "request_chats";
    pub const SUPPORT_ROOMS: &str = "support_rooms";
    /// Sub-collection of chats and support rooms
    pub const MESSAGES: &str = "messages";
}

/// Firestore limits batch/transaction writes to 500 operations.
pub const MAX_BATCH_WRITES: usize = 500;

/// Equality filter value.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Str(String),
    Bool(bool),
}

/// Equality-filtered listing, ordered by `created_at` descending unless
/// [`DocQuery::unordered`] is set.
///
/// Firestore leaves documents without the order field out of an ordered
/// query, so full scans must be unordered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocQuery {
    pub filters: Vec<(String, FilterValue)>,
    pub limit: Option<u32>,
    pub unordered: bool,
}

impl DocQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters
            .push((field.into(), FilterValue::Str(value.into())));
        self
    }

    pub fn eq_bool(mut self, field: impl Into<String>, value: bool) -> Self {
        self.filters.push((field.into(), FilterValue::Bool(value)));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Include every matching document, in no particular order.
    pub fn unordered(mut self) -> Self {
        self.unordered = true;
        self
    }
}

/// A stored document whose ID is its document name.
///
/// Documents written by the apps may not carry the ID as a field; the
/// store fills it in from the name when loading.
pub trait Document {
    fn fill_id(&mut self, id: &str);
}

macro_rules! impl_document {
    ($($ty:ty => $field:ident),* $(,)?) => {
        $(impl Document for $ty {
            fn fill_id(&mut self, id: &str) {
                if self.$field.is_empty() {
                    self.$field = id.to_string();
                }
            }
        })*
    };
}

impl_document!(
    Student => id,
    Tutor => id,
    Request => id,
    TutorOffer => tutor_id,
    RequestChat => id,
    SupportRoom => id,
    ChatMessage => id,
    SupportMessage => id,
);

/// Document storage used by the handlers.
#[async_trait]
pub trait Store: Send + Sync {
    // ─── Profiles ───────────────────────────────────────────────
    async fn get_student(&self, id: &str) -> Result<Option<Student>, AppError>;
    async fn upsert_student(&self, student: &Student) -> Result<(), AppError>;
    async fn query_students(&self, query: &DocQuery) -> Result<Vec<Student>, AppError>;

    async fn get_tutor(&self, id: &str) -> Result<Option<Tutor>, AppError>;
    async fn upsert_tutor(&self, tutor: &Tutor) -> Result<(), AppError>;
    async fn query_tutors(&self, query: &DocQuery) -> Result<Vec<Tutor>, AppError>;

    /// Overwrite only the four flag fields of the given documents.
    ///
    /// All updates in one call commit together; callers keep a call at or
    /// below [`MAX_BATCH_WRITES`].
    async fn write_profile_flags(
        &self,
        kind: ProfileKind,
        updates: &[(String, ProfileFlags)],
    ) -> Result<(), AppError>;

    // ─── Requests ───────────────────────────────────────────────
    async fn get_request(&self, id: &str) -> Result<Option<Request>, AppError>;
    async fn upsert_request(&self, request: &Request) -> Result<(), AppError>;
    async fn query_requests(&self, query: &DocQuery) -> Result<Vec<Request>, AppError>;

    // ─── Tutor offers ───────────────────────────────────────────
    async fn list_offers(&self, request_id: &str) -> Result<Vec<TutorOffer>, AppError>;
    async fn get_offer(
        &self,
        request_id: &str,
        tutor_id: &str,
    ) -> Result<Option<TutorOffer>, AppError>;
    async fn upsert_offer(&self, offer: &TutorOffer) -> Result<(), AppError>;
    async fn delete_offer(&self, request_id: &str, tutor_id: &str) -> Result<(), AppError>;

    /// Write the request, its accepted offer and the rejected siblings together.
    async fn commit_assignment(
        &self,
        request: &Request,
        accepted: &TutorOffer,
        rejected: &[TutorOffer],
    ) -> Result<(), AppError>;

    // ─── Request chats ──────────────────────────────────────────
    async fn get_request_chat(&self, chat_id: &str) -> Result<Option<RequestChat>, AppError>;
    /// Store the message and the chat document (with its projection).
    async fn append_chat_message(
        &self,
        chat: &RequestChat,
        message: &ChatMessage,
    ) -> Result<(), AppError>;
    /// Messages oldest first.
    async fn list_chat_messages(&self, chat_id: &str) -> Result<Vec<ChatMessage>, AppError>;

    // ─── Support rooms ──────────────────────────────────────────
    async fn get_support_room(&self, id: &str) -> Result<Option<SupportRoom>, AppError>;
    async fn upsert_support_room(&self, room: &SupportRoom) -> Result<(), AppError>;
    async fn query_support_rooms(&self, query: &DocQuery) -> Result<Vec<SupportRoom>, AppError>;
    /// Store the message and the room document (with its projection).
    async fn append_support_message(
        &self,
        room: &SupportRoom,
        message: &SupportMessage,
    ) -> Result<(), AppError>;
    /// Messages oldest first.
    async fn list_support_messages(&self, room_id: &str)
        -> Result<Vec<SupportMessage>, AppError>;
}
