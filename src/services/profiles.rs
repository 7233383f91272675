// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Student and tutor soft delete and restore.
//!
//! Profiles are never removed. Deleting sets `deleted_at` and the flags
//! are recomputed in the same write.

use crate::db::{DocQuery, Store};
use crate::error::{AppError, Result};
use crate::models::{LinkedAccounts, Student, Tutor};
use crate::services::sync::compute_flags;
use crate::time_utils::now_rfc3339;
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RestoreTutorInput {
    #[validate(length(min = 1))]
    pub tutor_id: String,
}

fn refresh_flags<P: LinkedAccounts>(profile: &mut P) {
    let flags = compute_flags(profile);
    profile.set_flags(flags);
}

pub async fn get_student(store: &dyn Store, id: &str) -> Result<Student> {
    store
        .get_student(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Student {} not found", id)))
}

pub async fn get_tutor(store: &dyn Store, id: &str) -> Result<Tutor> {
    store
        .get_tutor(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tutor {} not found", id)))
}

pub async fn delete_student(store: &dyn Store, id: &str) -> Result<Student> {
    let mut student = get_student(store, id).await?;
    if !student.is_active() {
        return Ok(student);
    }

    student.deleted_at = Some(now_rfc3339());
    refresh_flags(&mut student);
    store.upsert_student(&student).await?;

    tracing::info!(student_id = id, "Student soft-deleted");
    Ok(student)
}

pub async fn delete_tutor(store: &dyn Store, id: &str) -> Result<Tutor> {
    let mut tutor = get_tutor(store, id).await?;
    if !tutor.is_active() {
        return Ok(tutor);
    }

    tutor.deleted_at = Some(now_rfc3339());
    refresh_flags(&mut tutor);
    store.upsert_tutor(&tutor).await?;

    tracing::info!(tutor_id = id, "Tutor soft-deleted");
    Ok(tutor)
}

/// Active tutors other than `tutor_id` sharing `field = value`.
async fn active_tutors_with(
    store: &dyn Store,
    tutor_id: &str,
    field: &str,
    value: Option<&str>,
) -> Result<Vec<Tutor>> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(Vec::new());
    };
    let found = store
        .query_tutors(&DocQuery::new().eq(field, value).unordered())
        .await?;
    Ok(found
        .into_iter()
        .filter(|t| t.id != tutor_id && t.is_active())
        .collect())
}

/// Undo a tutor's soft delete, unless an active account has since taken
/// the same email or phone.
pub async fn restore_tutor(store: &dyn Store, input: &RestoreTutorInput) -> Result<Tutor> {
    input.validate()?;
    let mut tutor = get_tutor(store, &input.tutor_id).await?;
    if tutor.is_active() {
        return Err(AppError::BadRequest(format!(
            "Tutor {} is not deleted",
            input.tutor_id
        )));
    }

    for (field, value) in [("email", tutor.email.as_deref()), ("phone", tutor.phone.as_deref())] {
        let clashes = active_tutors_with(store, &tutor.id, field, value).await?;
        if let Some(other) = clashes.first() {
            return Err(AppError::Conflict(format!(
                "Another active tutor ({}) uses the same {}",
                other.id, field
            )));
        }
    }

    tutor.deleted_at = None;
    refresh_flags(&mut tutor);
    store.upsert_tutor(&tutor).await?;

    tracing::info!(tutor_id = %tutor.id, "Tutor restored");
    Ok(tutor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;
    use crate::models::Flag;

    fn tutor(id: &str, email: &str, deleted: bool) -> Tutor {
        Tutor {
            id: id.to_string(),
            email: Some(email.to_string()),
            deleted_at: deleted.then(|| "2024-01-01T00:00:00.000Z".to_string()),
            ..Default::default()
        }
    }

    fn restore(id: &str) -> RestoreTutorInput {
        RestoreTutorInput {
            tutor_id: id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_soft_delete_sets_flag() {
        let db = MemoryDb::new();
        db.upsert_tutor(&tutor("t1", "a@example.com", false))
            .await
            .unwrap();

        let deleted = delete_tutor(&db, "t1").await.unwrap();
        assert!(deleted.deleted_at.is_some());
        assert_eq!(deleted.is_deleted, Some(Flag::Yes));
    }

    #[tokio::test]
    async fn test_restore_rules() {
        let db = MemoryDb::new();
        db.upsert_tutor(&tutor("t1", "a@example.com", true))
            .await
            .unwrap();
        db.upsert_tutor(&tutor("t2", "a@example.com", false))
            .await
            .unwrap();
        db.upsert_tutor(&tutor("t3", "c@example.com", true))
            .await
            .unwrap();

        let clash = restore_tutor(&db, &restore("t1")).await.unwrap_err();
        assert!(matches!(clash, AppError::Conflict(_)));

        let active = restore_tutor(&db, &restore("t2")).await.unwrap_err();
        assert!(matches!(active, AppError::BadRequest(_)));

        let missing = restore_tutor(&db, &restore("t9")).await.unwrap_err();
        assert!(matches!(missing, AppError::NotFound(_)));

        let restored = restore_tutor(&db, &restore("t3")).await.unwrap();
        assert!(restored.deleted_at.is_none());
        assert_eq!(restored.is_deleted, Some(Flag::No));
    }
}
