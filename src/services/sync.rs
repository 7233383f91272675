// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile flag maintenance.
//!
//! The four flag fields are derived from the linked-account IDs and
//! `deleted_at`. The trigger handler recomputes them for one document;
//! the backfill walks a whole collection. Both write only when the stored
//! flags differ, so the write-back does not fire the trigger again.

use crate::db::{DocQuery, Store, MAX_BATCH_WRITES};
use crate::error::{AppError, Result};
use crate::models::{Flag, LinkedAccounts, ProfileFlags, ProfileKind};
use serde::Serialize;

fn present(value: Option<&str>) -> Flag {
    Flag::from_bool(value.is_some_and(|v| !v.trim().is_empty()))
}

/// Flags implied by a profile's source fields.
pub fn compute_flags<P: LinkedAccounts + ?Sized>(profile: &P) -> ProfileFlags {
    ProfileFlags {
        has_apple_id: present(profile.apple_id()),
        has_facebook_id: present(profile.facebook_id()),
        has_google_id: present(profile.google_id()),
        is_deleted: present(profile.deleted_at()),
    }
}

/// The flags to write, or `None` when the stored ones are already right.
pub fn flags_to_write<P: LinkedAccounts + ?Sized>(profile: &P) -> Option<ProfileFlags> {
    let flags = compute_flags(profile);
    (profile.stored_flags() != Some(flags)).then_some(flags)
}

/// Result of syncing one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    Updated,
    Unchanged,
    Missing,
}

/// Recompute and (if needed) write the flags of one profile.
pub async fn sync_profile(store: &dyn Store, kind: ProfileKind, id: &str) -> Result<SyncOutcome> {
    let flags = match kind {
        ProfileKind::Students => match store.get_student(id).await? {
            Some(student) => flags_to_write(&student),
            None => return Ok(SyncOutcome::Missing),
        },
        ProfileKind::Tutors => match store.get_tutor(id).await? {
            Some(tutor) => flags_to_write(&tutor),
            None => return Ok(SyncOutcome::Missing),
        },
    };

    let Some(flags) = flags else {
        tracing::debug!(collection = kind.collection(), id, "Profile flags unchanged");
        return Ok(SyncOutcome::Unchanged);
    };

    store
        .write_profile_flags(kind, &[(id.to_string(), flags)])
        .await?;
    tracing::info!(
        collection = kind.collection(),
        id,
        is_deleted = flags.is_deleted.as_str(),
        "Profile flags updated"
    );
    Ok(SyncOutcome::Updated)
}

/// Summary of a backfill run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    pub scanned: usize,
    pub changed: usize,
    pub written: usize,
    pub batches: usize,
}

/// Recompute flags across a whole collection.
///
/// Changed documents are written in atomic batches of at most
/// `batch_size` (capped at [`MAX_BATCH_WRITES`]). A failed batch stops the
/// run; earlier batches stay committed.
pub async fn backfill(
    store: &dyn Store,
    kind: ProfileKind,
    batch_size: usize,
    dry_run: bool,
) -> Result<BackfillReport> {
    if batch_size == 0 || batch_size > MAX_BATCH_WRITES {
        return Err(AppError::BadRequest(format!(
            "batch size must be between 1 and {}",
            MAX_BATCH_WRITES
        )));
    }

    let all = DocQuery::new().unordered();
    let (scanned, pending): (usize, Vec<(String, ProfileFlags)>) = match kind {
        ProfileKind::Students => {
            let docs = store.query_students(&all).await?;
            let pending = docs
                .iter()
                .filter_map(|p| flags_to_write(p).map(|f| (p.id.clone(), f)))
                .collect();
            (docs.len(), pending)
        }
        ProfileKind::Tutors => {
            let docs = store.query_tutors(&all).await?;
            let pending = docs
                .iter()
                .filter_map(|p| flags_to_write(p).map(|f| (p.id.clone(), f)))
                .collect();
            (docs.len(), pending)
        }
    };

    let mut report = BackfillReport {
        scanned,
        changed: pending.len(),
        ..Default::default()
    };

    if dry_run {
        tracing::info!(collection = kind.collection(), ?report, "Dry run, nothing written");
        return Ok(report);
    }

    for chunk in pending.chunks(batch_size) {
        store.write_profile_flags(kind, chunk).await?;
        report.batches += 1;
        report.written += chunk.len();
        tracing::info!(
            collection = kind.collection(),
            batch = report.batches,
            written = report.written,
            "Committed flag batch"
        );
    }

    Ok(report)
}
