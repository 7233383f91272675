// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! One-off flag backfill.
//!
//! Recomputes `has_apple_id`, `has_facebook_id`, `has_google_id` and
//! `is_deleted` for every document of a profile collection and writes the
//! changed ones in atomic batches.
//!
//! ```text
//! backfill students --dry-run
//! backfill tutors --batch-size 200
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tutoring_admin::db::{FirestoreDb, MAX_BATCH_WRITES};
use tutoring_admin::models::ProfileKind;
use tutoring_admin::services::sync::backfill;

#[derive(Parser)]
#[command(name = "backfill", about = "Recompute profile flag fields")]
struct Cli {
    /// GCP/Firebase project
    #[arg(long, env = "FIREBASE_PROJECT_ID", default_value = "local-dev")]
    project: String,

    /// Report what would change without writing
    #[arg(long, global = true)]
    dry_run: bool,

    /// Documents per committed batch (at most 500)
    #[arg(
        long,
        global = true,
        default_value_t = MAX_BATCH_WRITES as u16,
        value_parser = clap::value_parser!(u16).range(1..=MAX_BATCH_WRITES as i64)
    )]
    batch_size: u16,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Backfill the `students` collection
    Students,
    /// Backfill the `tutors` collection
    Tutors,
}

impl Command {
    fn kind(&self) -> ProfileKind {
        match self {
            Command::Students => ProfileKind::Students,
            Command::Tutors => ProfileKind::Tutors,
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let kind = cli.command.kind();
    let db = FirestoreDb::new(&cli.project)
        .await
        .context("Failed to connect to Firestore")?;

    let report = backfill(&db, kind, cli.batch_size as usize, cli.dry_run)
        .await
        .with_context(|| format!("Backfill of {} failed", kind.collection()))?;

    tracing::info!(
        collection = kind.collection(),
        dry_run = cli.dry_run,
        scanned = report.scanned,
        changed = report.changed,
        written = report.written,
        batches = report.batches,
        "Backfill complete"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = ?e, "Backfill failed");
            ExitCode::FAILURE
        }
    }
}
