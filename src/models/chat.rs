// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Chat models: request conversations and support rooms.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum SenderType {
    Student,
    Tutor,
    Admin,
    System,
}

/// Kind of a request chat message. The app renders the non-text kinds as cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    TutorBid,
    TutorEditBid,
    StudentAccept,
    StudentPaid,
    StudentOngoing,
}

/// Conversation between a student and one tutor about one request.
///
/// Stored at `request_chats/{request_id}_{tutor_id}`; the `last_message*`
/// fields mirror the newest message for list views.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RequestChat {
    #[serde(default)]
    pub id: String,
    pub request_id: String,
    pub student_id: String,
    pub tutor_id: String,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub last_message_type: Option<MessageType>,
    #[serde(default)]
    pub last_sender_id: Option<String>,
    #[serde(default)]
    pub last_message_at: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

impl RequestChat {
    pub fn chat_id(request_id: &str, tutor_id: &str) -> String {
        format!("{request_id}_{tutor_id}")
    }

    /// Apply the list-view projection of a newly appended message.
    pub fn project(&mut self, message: &ChatMessage) {
        self.last_message = Some(message.content.clone());
        self.last_message_type = Some(message.message_type);
        self.last_sender_id = Some(message.sender_id.clone());
        self.last_message_at = Some(message.created_at.clone());
    }
}

/// Message in `request_chats/{chat_id}/messages/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ChatMessage {
    #[serde(default)]
    pub id: String,
    pub sender_id: String,
    pub sender_type: SenderType,
    pub message_type: MessageType,
    pub content: String,
    /// Price shown on bid/accept cards
    #[serde(default)]
    pub price: Option<String>,
    pub created_at: String,
}

/// Live support session between an end user and an admin agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SupportRoom {
    #[serde(default)]
    pub id: String,
    pub user_id: String,
    /// `student` or `tutor`
    #[serde(default)]
    pub user_type: String,
    #[serde(default)]
    pub with_agent: bool,
    #[serde(default)]
    pub admin_id: Option<String>,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub last_message_at: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

impl SupportRoom {
    pub fn project(&mut self, message: &SupportMessage) {
        self.last_message = Some(message.content.clone());
        self.last_message_at = Some(message.created_at.clone());
    }
}

/// Message in `support_rooms/{room_id}/messages/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SupportMessage {
    #[serde(default)]
    pub id: String,
    pub sender_id: String,
    pub sender_type: SenderType,
    pub content: String,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&MessageType::TutorEditBid).unwrap(),
            "\"tutoreditbid\""
        );
        assert_eq!(
            serde_json::to_string(&MessageType::StudentOngoing).unwrap(),
            "\"studentongoing\""
        );
    }
}
