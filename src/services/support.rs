// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Support console: admins joining, leaving and replying in support rooms.

use crate::db::{DocQuery, Store};
use crate::error::{AppError, Result};
use crate::models::{SenderType, SupportMessage, SupportRoom};
use crate::time_utils::next_message_timestamp;
use serde::Deserialize;
use validator::Validate;

/// Body of the join and leave endpoints.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RoomAdminInput {
    #[validate(length(min = 1))]
    pub room_id: String,
    #[validate(length(min = 1))]
    pub admin_id: String,
}

/// Body of `POST /api/support/admin/send-message`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SendMessageInput {
    #[validate(length(min = 1))]
    pub room_id: String,
    #[validate(length(min = 1))]
    pub admin_id: String,
    #[validate(length(min = 1, max = 4000))]
    pub content: String,
}

pub struct SupportService<'a> {
    store: &'a dyn Store,
}

impl<'a> SupportService<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    async fn load(&self, room_id: &str) -> Result<SupportRoom> {
        self.store
            .get_support_room(room_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Support room {} not found", room_id)))
    }

    async fn post(
        &self,
        mut room: SupportRoom,
        sender_id: &str,
        sender_type: SenderType,
        content: String,
    ) -> Result<(SupportRoom, SupportMessage)> {
        let message = SupportMessage {
            id: crate::ids::document_id()?,
            sender_id: sender_id.to_string(),
            sender_type,
            content,
            created_at: next_message_timestamp(room.last_message_at.as_deref()),
        };
        room.project(&message);
        self.store.append_support_message(&room, &message).await?;
        Ok((room, message))
    }

    /// Rooms newest first, optionally only those with (or without) an agent.
    pub async fn list_rooms(&self, with_agent: Option<bool>) -> Result<Vec<SupportRoom>> {
        let query = match with_agent {
            Some(v) => DocQuery::new().eq_bool("with_agent", v),
            None => DocQuery::new(),
        };
        self.store.query_support_rooms(&query).await
    }

    pub async fn messages(&self, room_id: &str) -> Result<Vec<SupportMessage>> {
        self.load(room_id).await?;
        self.store.list_support_messages(room_id).await
    }

    /// Take over a room. Joining a room one already holds changes nothing.
    pub async fn join(&self, input: &RoomAdminInput) -> Result<SupportRoom> {
        input.validate()?;
        let room = self.load(&input.room_id).await?;

        match room.admin_id.as_deref() {
            Some(holder) if room.with_agent && holder == input.admin_id => return Ok(room),
            Some(holder) if room.with_agent => {
                return Err(AppError::Conflict(format!(
                    "Room {} is already handled by admin {}",
                    input.room_id, holder
                )));
            }
            _ => {}
        }

        let room = SupportRoom {
            with_agent: true,
            admin_id: Some(input.admin_id.clone()),
            ..room
        };
        let (room, _) = self
            .post(
                room,
                &input.admin_id,
                SenderType::System,
                "An agent has joined the chat".to_string(),
            )
            .await?;

        tracing::info!(room_id = %input.room_id, admin_id = %input.admin_id, "Admin joined support room");
        Ok(room)
    }

    /// Hand a room back. Only the holding admin may leave it.
    pub async fn leave(&self, input: &RoomAdminInput) -> Result<SupportRoom> {
        input.validate()?;
        let room = self.load(&input.room_id).await?;

        if !room.with_agent {
            return Ok(room);
        }
        if let Some(holder) = room.admin_id.as_deref().filter(|h| *h != input.admin_id) {
            return Err(AppError::Conflict(format!(
                "Room {} is handled by admin {}",
                input.room_id, holder
            )));
        }

        let room = SupportRoom {
            with_agent: false,
            admin_id: None,
            ..room
        };
        let (room, _) = self
            .post(
                room,
                &input.admin_id,
                SenderType::System,
                "The agent has left the chat".to_string(),
            )
            .await?;

        tracing::info!(room_id = %input.room_id, admin_id = %input.admin_id, "Admin left support room");
        Ok(room)
    }

    pub async fn send(&self, input: &SendMessageInput) -> Result<SupportMessage> {
        input.validate()?;
        let room = self.load(&input.room_id).await?;

        if !room.with_agent || room.admin_id.as_deref() != Some(input.admin_id.as_str()) {
            return Err(AppError::Conflict(format!(
                "Admin {} does not hold room {}",
                input.admin_id, input.room_id
            )));
        }

        let (_, message) = self
            .post(
                room,
                &input.admin_id,
                SenderType::Admin,
                input.content.clone(),
            )
            .await?;
        Ok(message)
    }
}
