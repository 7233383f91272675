// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod actions;
pub mod algolia;
pub mod conversation;
pub mod offers;
pub mod pricing;
pub mod profiles;
pub mod reports;
pub mod requests;
pub mod search;
pub mod support;
pub mod sync;

pub use actions::{ActionService, RequestAction};
pub use algolia::{AlgoliaClient, SearchIndex};
pub use offers::{AssignMode, OfferService};
pub use search::{SearchKind, SearchService};
pub use support::SupportService;
