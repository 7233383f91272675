// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request chat writer.
//!
//! Admin actions that stand in for a student or tutor (assigning a tutor,
//! marking a request paid) leave the same cards in the request chat that
//! the mobile apps would have written.

use crate::db::Store;
use crate::error::Result;
use crate::models::{ChatMessage, MessageType, Request, RequestChat, SenderType};
use crate::time_utils::{next_message_timestamp, now_rfc3339};
use std::time::Duration;

/// A message to be written on behalf of a participant.
#[derive(Debug, Clone)]
pub struct Draft {
    pub sender: SenderType,
    pub message_type: MessageType,
    pub content: String,
    pub price: Option<String>,
}

impl Draft {
    pub fn tutor_bid(price: &str, edited: bool) -> Self {
        let (message_type, content) = if edited {
            (
                MessageType::TutorEditBid,
                format!("I updated my offer to {price}"),
            )
        } else {
            (MessageType::TutorBid, format!("I can help with this for {price}"))
        };
        Self {
            sender: SenderType::Tutor,
            message_type,
            content,
            price: Some(price.to_string()),
        }
    }

    pub fn student_accept(price: &str) -> Self {
        Self {
            sender: SenderType::Student,
            message_type: MessageType::StudentAccept,
            content: format!("Offer accepted for {price}"),
            price: Some(price.to_string()),
        }
    }

    pub fn student_paid(amount: &str) -> Self {
        Self {
            sender: SenderType::Student,
            message_type: MessageType::StudentPaid,
            content: format!("Payment of {amount} completed"),
            price: Some(amount.to_string()),
        }
    }

    pub fn student_ongoing() -> Self {
        Self {
            sender: SenderType::Student,
            message_type: MessageType::StudentOngoing,
            content: "The session is now ongoing".to_string(),
            price: None,
        }
    }
}

/// Writes scripted exchanges into request chats.
pub struct Conversation<'a> {
    store: &'a dyn Store,
    /// Pause between consecutive messages of one exchange
    delay: Duration,
}

impl<'a> Conversation<'a> {
    pub fn new(store: &'a dyn Store, delay: Duration) -> Self {
        Self { store, delay }
    }

    /// Load the chat for `(request, tutor)`, or start a new one.
    async fn open_chat(&self, request: &Request, tutor_id: &str) -> Result<RequestChat> {
        let chat_id = RequestChat::chat_id(&request.id, tutor_id);
        let chat = self.store.get_request_chat(&chat_id).await?;

        Ok(chat.unwrap_or_else(|| RequestChat {
            id: chat_id,
            request_id: request.id.clone(),
            student_id: request.student_id.clone(),
            tutor_id: tutor_id.to_string(),
            created_at: now_rfc3339(),
            ..Default::default()
        }))
    }

    /// Append the drafts in order, pausing between them.
    ///
    /// Each message is stamped strictly after the chat's newest one.
    pub async fn play(
        &self,
        request: &Request,
        tutor_id: &str,
        drafts: Vec<Draft>,
    ) -> Result<Vec<ChatMessage>> {
        let mut chat = self.open_chat(request, tutor_id).await?;
        let mut written = Vec::with_capacity(drafts.len());

        for (i, draft) in drafts.into_iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let sender_id = match draft.sender {
                SenderType::Tutor => tutor_id.to_string(),
                SenderType::Student => request.student_id.clone(),
                SenderType::Admin | SenderType::System => "system".to_string(),
            };

            let message = ChatMessage {
                id: crate::ids::document_id()?,
                sender_id,
                sender_type: draft.sender,
                message_type: draft.message_type,
                content: draft.content,
                price: draft.price,
                created_at: next_message_timestamp(chat.last_message_at.as_deref()),
            };

            chat.project(&message);
            self.store.append_chat_message(&chat, &message).await?;

            tracing::debug!(
                chat_id = %chat.id,
                message_type = ?message.message_type,
                "Chat message written"
            );
            written.push(message);
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;

    fn request() -> Request {
        Request {
            id: "req1".to_string(),
            student_id: "stu1".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_play_writes_in_order_and_projects_last_message() {
        let db = MemoryDb::new();
        let conversation = Conversation::new(&db, Duration::ZERO);

        conversation
            .play(
                &request(),
                "tut1",
                vec![Draft::tutor_bid("30.00", false), Draft::student_accept("30.00")],
            )
            .await
            .unwrap();

        let messages = db.list_chat_messages("req1_tut1").await.unwrap();
        let kinds: Vec<MessageType> = messages.iter().map(|m| m.message_type).collect();
        assert_eq!(kinds, vec![MessageType::TutorBid, MessageType::StudentAccept]);
        assert_eq!(messages[0].sender_id, "tut1");
        assert_eq!(messages[1].sender_id, "stu1");

        let chat = db.get_request_chat("req1_tut1").await.unwrap().unwrap();
        assert_eq!(chat.last_message_type, Some(MessageType::StudentAccept));
        assert_eq!(chat.last_sender_id.as_deref(), Some("stu1"));
    }

    #[tokio::test]
    async fn test_back_to_back_exchanges_sort_in_write_order() {
        let db = MemoryDb::new();
        let conversation = Conversation::new(&db, Duration::ZERO);

        for drafts in [
            vec![Draft::tutor_bid("30.00", false), Draft::student_accept("30.00")],
            vec![Draft::student_paid("30.00"), Draft::student_ongoing()],
        ] {
            conversation.play(&request(), "tut1", drafts).await.unwrap();
        }

        let messages = db.list_chat_messages("req1_tut1").await.unwrap();
        assert!(messages
            .windows(2)
            .all(|pair| pair[0].created_at < pair[1].created_at));

        let mut by_time = messages.clone();
        by_time.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        let kinds: Vec<MessageType> = by_time.iter().map(|m| m.message_type).collect();
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

    #[tokio::test(start_paused = true)]
    async fn test_delay_between_messages() {
        let db = MemoryDb::new();
        let conversation = Conversation::new(&db, Duration::from_secs(2));

        let started = tokio::time::Instant::now();
        conversation
            .play(
                &request(),
                "tut1",
                vec![Draft::student_paid("30.00"), Draft::student_ongoing()],
            )
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_secs(2));
    }
}
