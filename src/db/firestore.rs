// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides the [`Store`] operations over:
//! - Profiles (`students`, `tutors`)
//! - Requests and their `tutor_offers` sub-collection
//! - Request chats and support rooms with their `messages` sub-collections

use crate::db::{collections, DocQuery, Document, FilterValue, Store, MAX_BATCH_WRITES};
use crate::error::AppError;
use crate::models::{
    ChatMessage, ProfileFlags, ProfileKind, Request, RequestChat, Student, SupportMessage,
    SupportRoom, Tutor, TutorOffer,
};
use async_trait::async_trait;
use firestore::{FirestoreQueryDirection, ParentPathBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A loaded document with the name the client reports for it.
#[derive(Deserialize)]
struct Named<T> {
    #[serde(rename = "_firestore_id", default)]
    doc_id: Option<String>,
    #[serde(flatten)]
    doc: T,
}

impl<T: Document> Named<T> {
    fn into_doc(self) -> T {
        let mut doc = self.doc;
        if let Some(id) = &self.doc_id {
            doc.fill_id(id);
        }
        doc
    }
}

fn named_docs<T: Document>(docs: Vec<Named<T>>) -> Vec<T> {
    docs.into_iter().map(Named::into_doc).collect()
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator accepts any token, so skip credential discovery entirely.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJhZG1pbiJ9."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client. All database operations return an error.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// The underlying client, or an error if offline.
    pub fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    fn parent_path(&self, collection: &str, id: &str) -> Result<ParentPathBuilder, AppError> {
        self.get_client()?
            .parent_path(collection, id)
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Generic Document Operations ─────────────────────────────

    async fn get_doc<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Document + Send,
    {
        let doc: Option<T> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(doc.map(|mut doc| {
            doc.fill_id(id);
            doc
        }))
    }

    async fn set_doc<T>(&self, collection: &str, id: &str, doc: &T) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Equality-filtered listing, newest first unless the query is unordered.
    async fn query_docs<T>(&self, collection: &str, query: &DocQuery) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Document + Send,
    {
        let filters = query.filters.clone();

        let select = self
            .get_client()?
            .fluent()
            .select()
            .from(collection)
            .filter(move |q| {
                q.for_all(filters.iter().map(|(field, value)| match value {
                    FilterValue::Str(s) => q.field(field.as_str()).eq(s.clone()),
                    FilterValue::Bool(b) => q.field(field.as_str()).eq(*b),
                }))
            });

        // An ordered query skips documents that lack the order field
        let select = if query.unordered {
            select
        } else {
            select.order_by([("created_at", FirestoreQueryDirection::Descending)])
        };

        let select = match query.limit {
            Some(limit) => select.limit(limit),
            None => select,
        };

        let docs: Vec<Named<T>> = select
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(named_docs(docs))
    }

    /// List a `messages` sub-collection, oldest first.
    async fn list_messages<T>(&self, collection: &str, id: &str) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Document + Send,
    {
        let parent = self.parent_path(collection, id)?;

        let docs: Vec<Named<T>> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::MESSAGES)
            .parent(&parent)
            .order_by([("created_at", FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(named_docs(docs))
    }

    /// Write a parent document and one new message atomically.
    async fn append_message<P, M>(
        &self,
        collection: &str,
        parent_id: &str,
        parent_doc: &P,
        message_id: &str,
        message: &M,
    ) -> Result<(), AppError>
    where
        P: Serialize + DeserializeOwned + Send + Sync,
        M: Serialize + DeserializeOwned + Send + Sync,
    {
        let client = self.get_client()?;
        let parent = self.parent_path(collection, parent_id)?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::MESSAGES)
            .document_id(message_id)
            .parent(&parent)
            .object(message)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add message to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .in_col(collection)
            .document_id(parent_id)
            .object(parent_doc)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add {} to transaction: {}", collection, e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl Store for FirestoreDb {
    // ─── Profile Operations ──────────────────────────────────────

    async fn get_student(&self, id: &str) -> Result<Option<Student>, AppError> {
        self.get_doc(collections::STUDENTS, id).await
    }

    async fn upsert_student(&self, student: &Student) -> Result<(), AppError> {
        self.set_doc(collections::STUDENTS, &student.id, student)
            .await
    }

    async fn query_students(&self, query: &DocQuery) -> Result<Vec<Student>, AppError> {
        self.query_docs(collections::STUDENTS, query).await
    }

    async fn get_tutor(&self, id: &str) -> Result<Option<Tutor>, AppError> {
        self.get_doc(collections::TUTORS, id).await
    }

    async fn upsert_tutor(&self, tutor: &Tutor) -> Result<(), AppError> {
        self.set_doc(collections::TUTORS, &tutor.id, tutor).await
    }

    async fn query_tutors(&self, query: &DocQuery) -> Result<Vec<Tutor>, AppError> {
        self.query_docs(collections::TUTORS, query).await
    }

    async fn write_profile_flags(
        &self,
        kind: ProfileKind,
        updates: &[(String, ProfileFlags)],
    ) -> Result<(), AppError> {
        if updates.is_empty() {
            return Ok(());
        }
        if updates.len() > MAX_BATCH_WRITES {
            return Err(AppError::BadRequest(format!(
                "Flag batch of {} exceeds the {} write limit",
                updates.len(),
                MAX_BATCH_WRITES
            )));
        }

        let client = self.get_client()?;
        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        for (id, flags) in updates {
            // Field mask: only the four flags are touched
            client
                .fluent()
                .update()
                .fields(ProfileFlags::FIELDS)
                .in_col(kind.collection())
                .document_id(id)
                .object(flags)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add flags for {} to batch: {}", id, e))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit flag batch: {}", e)))?;

        Ok(())
    }

    // ─── Request Operations ──────────────────────────────────────

    async fn get_request(&self, id: &str) -> Result<Option<Request>, AppError> {
        self.get_doc(collections::REQUESTS, id).await
    }

    async fn upsert_request(&self, request: &Request) -> Result<(), AppError> {
        self.set_doc(collections::REQUESTS, &request.id, request)
            .await
    }

    async fn query_requests(&self, query: &DocQuery) -> Result<Vec<Request>, AppError> {
        self.query_docs(collections::REQUESTS, query).await
    }

    // ─── Tutor Offer Operations ──────────────────────────────────

    async fn list_offers(&self, request_id: &str) -> Result<Vec<TutorOffer>, AppError> {
        let parent = self.parent_path(collections::REQUESTS, request_id)?;

        let docs: Vec<Named<TutorOffer>> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::TUTOR_OFFERS)
            .parent(&parent)
            .order_by([("created_at", FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(named_docs(docs))
    }

    async fn get_offer(
        &self,
        request_id: &str,
        tutor_id: &str,
    ) -> Result<Option<TutorOffer>, AppError> {
        let parent = self.parent_path(collections::REQUESTS, request_id)?;

        let offer: Option<TutorOffer> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::TUTOR_OFFERS)
            .parent(&parent)
            .obj()
            .one(tutor_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(offer.map(|mut offer| {
            offer.fill_id(tutor_id);
            offer
        }))
    }

    async fn upsert_offer(&self, offer: &TutorOffer) -> Result<(), AppError> {
        let parent = self.parent_path(collections::REQUESTS, &offer.request_id)?;

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::TUTOR_OFFERS)
            .document_id(&offer.tutor_id)
            .parent(&parent)
            .object(offer)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_offer(&self, request_id: &str, tutor_id: &str) -> Result<(), AppError> {
        let parent = self.parent_path(collections::REQUESTS, request_id)?;

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::TUTOR_OFFERS)
            .document_id(tutor_id)
            .parent(&parent)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Request, accepted offer and rejected siblings in one transaction.
    async fn commit_assignment(
        &self,
        request: &Request,
        accepted: &TutorOffer,
        rejected: &[TutorOffer],
    ) -> Result<(), AppError> {
        let client = self.get_client()?;
        let parent = self.parent_path(collections::REQUESTS, &request.id)?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::REQUESTS)
            .document_id(&request.id)
            .object(request)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add request to transaction: {}", e))
            })?;

        for offer in std::iter::once(accepted).chain(rejected) {
            client
                .fluent()
                .update()
                .in_col(collections::TUTOR_OFFERS)
                .document_id(&offer.tutor_id)
                .parent(&parent)
                .object(offer)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add offer to transaction: {}", e))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            request_id = %request.id,
            tutor_id = %accepted.tutor_id,
            rejected = rejected.len(),
            "Assignment committed atomically"
        );

        Ok(())
    }

    // ─── Request Chat Operations ─────────────────────────────────

    async fn get_request_chat(&self, chat_id: &str) -> Result<Option<RequestChat>, AppError> {
        self.get_doc(collections::REQUEST_CHATS, chat_id).await
    }

    async fn append_chat_message(
        &self,
        chat: &RequestChat,
        message: &ChatMessage,
    ) -> Result<(), AppError> {
        self.append_message(
            collections::REQUEST_CHATS,
            &chat.id,
            chat,
            &message.id,
            message,
        )
        .await
    }

    async fn list_chat_messages(&self, chat_id: &str) -> Result<Vec<ChatMessage>, AppError> {
        self.list_messages(collections::REQUEST_CHATS, chat_id)
            .await
    }

    // ─── Support Room Operations ─────────────────────────────────

    async fn get_support_room(&self, id: &str) -> Result<Option<SupportRoom>, AppError> {
        self.get_doc(collections::SUPPORT_ROOMS, id).await
    }

    async fn upsert_support_room(&self, room: &SupportRoom) -> Result<(), AppError> {
        self.set_doc(collections::SUPPORT_ROOMS, &room.id, room)
            .await
    }

    async fn query_support_rooms(&self, query: &DocQuery) -> Result<Vec<SupportRoom>, AppError> {
        self.query_docs(collections::SUPPORT_ROOMS, query).await
    }

    async fn append_support_message(
        &self,
        room: &SupportRoom,
        message: &SupportMessage,
    ) -> Result<(), AppError> {
        self.append_message(
            collections::SUPPORT_ROOMS,
            &room.id,
            room,
            &message.id,
            message,
        )
        .await
    }

    async fn list_support_messages(
        &self,
        room_id: &str,
    ) -> Result<Vec<SupportMessage>, AppError> {
        self.list_messages(collections::SUPPORT_ROOMS, room_id)
            .await
    }
}
