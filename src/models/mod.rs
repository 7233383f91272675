// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod chat;
pub mod profile;
pub mod request;

pub use chat::{ChatMessage, MessageType, RequestChat, SenderType, SupportMessage, SupportRoom};
pub use profile::{Flag, LinkedAccounts, ProfileFlags, ProfileKind, Student, Tutor};
pub use request::{OfferStatus, Request, RequestStatus, TutorOffer};
