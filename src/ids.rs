// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Random identifiers for messages and invoices.

use crate::error::AppError;
use ring::rand::{SecureRandom, SystemRandom};

fn random_hex(bytes: usize) -> Result<String, AppError> {
    let mut buf = vec![0u8; bytes];
    SystemRandom::new()
        .fill(&mut buf)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG unavailable")))?;
    Ok(hex::encode(buf))
}

/// ID for a new document (20 hex chars, the length of a Firestore auto ID).
pub fn document_id() -> Result<String, AppError> {
    random_hex(10)
}

/// Invoice number, e.g. `INV-20240115-9f3a1c2b`.
pub fn invoice_id(now: chrono::DateTime<chrono::Utc>) -> Result<String, AppError> {
    Ok(format!(
        "INV-{}-{}",
        now.format("%Y%m%d"),
        random_hex(4)?.to_uppercase()
    ))
}
