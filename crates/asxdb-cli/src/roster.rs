//! Roster command handlers.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::Subcommand;

use asxdb_core::NEVER_REFRESHED;

/// Sub-commands available under `roster`.
#[derive(Debug, Subcommand)]
pub enum RosterCommands {
    /// Load the roster file and make the `companies` table match it
    Sync {
        /// Roster file to load (defaults to `ASXDB_ROSTER_PATH`)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// List companies on the roster
    List {
        /// Include soft-deleted companies
        #[arg(long)]
        all: bool,
    },
}

/// Render a refresh timestamp, showing `never` for the epoch sentinel.
pub(crate) fn fmt_refreshed(ts: DateTime<Utc>) -> String {
    if ts == NEVER_REFRESHED {
        "never".to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Sync the `companies` table with the roster file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded or the sync transaction fails.
pub(crate) async fn run_roster_sync(pool: &sqlx::PgPool, path: &Path) -> anyhow::Result<()> {
    let roster = asxdb_core::load_roster(path)?;
    tracing::info!(path = %path.display(), companies = roster.companies.len(), "syncing roster");

    let summary = asxdb_db::sync_roster(pool, &roster.companies).await?;
    println!(
        "roster synced: {} inserted, {} updated, {} deactivated",
        summary.inserted, summary.updated, summary.deactivated
    );
    Ok(())
}

/// Print the roster as a table ordered by code.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_roster_list(pool: &sqlx::PgPool, all: bool) -> anyhow::Result<()> {
    let companies = asxdb_db::list_companies(pool, all).await?;

    if companies.is_empty() {
        println!("no companies found; run `roster sync` first");
        return Ok(());
    }

    println!(
        "{:<8}{:<8}{:<22}{:<24}NAME",
        "CODE", "ACTIVE", "LAST REFRESHED", "INDUSTRY"
    );
    for company in &companies {
        println!(
            "{:<8}{:<8}{:<22}{:<24}{}",
            company.code,
            if company.is_active { "yes" } else { "no" },
            fmt_refreshed(company.last_refreshed),
            company.industry,
            company.name
        );
    }

    Ok(())
}
