//! Scrape and status command handlers.
//!
//! Each invocation runs at most one cycle in the foreground. The cycle lock is
//! process-local, so a CLI cycle does not exclude one running in the server.

use std::time::Duration;

use chrono::TimeDelta;
use clap::Subcommand;

use asxdb_core::AppConfig;
use asxdb_provider::AlphaVantageClient;
use asxdb_scheduler::{CycleLock, CycleOutcome, CycleResult, PgScheduler, SkipReason};

/// Sub-commands available under `scrape`.
#[derive(Debug, Subcommand)]
pub enum ScrapeCommands {
    /// Refresh the company with the oldest `last_refreshed`
    Next,
    /// Move a company to the front of the queue, then run one cycle
    Company {
        /// ASX company code (e.g., CBA)
        code: String,
    },
}

pub(crate) fn build_scheduler(
    pool: &sqlx::PgPool,
    config: &AppConfig,
) -> anyhow::Result<PgScheduler> {
    let provider = AlphaVantageClient::from_app_config(config)?;
    let lock = CycleLock::new(Duration::from_millis(config.scrape_lock_wait_ms));
    Ok(PgScheduler::postgres(pool.clone(), provider, lock))
}

/// Run a single cycle and print its outcome.
///
/// # Errors
///
/// Returns an error when the roster could not be read, the cycle panicked, or
/// the cycle ran but persisted nothing. Lock contention and an empty roster
/// are not errors.
pub(crate) async fn run_scrape_next(scheduler: &PgScheduler) -> anyhow::Result<()> {
    let result = scheduler.run_cycle().await;
    print_cycle(&result);
    ensure_persisted(&result)
}

/// Prioritize `code` and run a single cycle.
///
/// # Errors
///
/// Returns an error if the code is invalid or unknown, or the cycle fails.
pub(crate) async fn run_scrape_company(
    scheduler: &PgScheduler,
    code: &str,
    rewind_days: u32,
) -> anyhow::Result<()> {
    let company = scheduler
        .prioritize(code, TimeDelta::days(i64::from(rewind_days)))
        .await?;
    println!("{} moved to the front of the queue", company.code);

    let result = scheduler.run_cycle().await;
    print_cycle(&result);

    if let Some(report) = result.report() {
        if report.company_code != company.code {
            println!(
                "note: {} was refreshed instead of {}",
                report.company_code, company.code
            );
        }
    }
    ensure_persisted(&result)
}

/// Print the queue length and the next company due.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_status(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let companies = asxdb_db::list_active_companies(pool).await?;
    println!("queue length: {}", companies.len());

    match companies.first() {
        Some(next) => println!(
            "next up: {} ({}), last refreshed {}",
            next.code,
            next.name,
            crate::roster::fmt_refreshed(next.last_refreshed)
        ),
        None => println!("next up: none; run `roster sync` first"),
    }
    Ok(())
}

fn print_cycle(result: &CycleResult) {
    match &result.outcome {
        CycleOutcome::Skipped(reason) => println!("cycle skipped: {reason}"),
        CycleOutcome::Panicked => println!("cycle aborted: panic in cycle body"),
        CycleOutcome::Completed(report) => {
            let persisted: Vec<&str> = report.persisted.iter().map(|t| t.as_str()).collect();
            println!(
                "{}: persisted [{}], timestamp {}",
                report.company_code,
                persisted.join(", "),
                if report.timestamp_advanced {
                    "advanced"
                } else {
                    "not advanced"
                }
            );
            for failure in &report.failures {
                println!("  failure: {failure}");
            }
        }
    }
}

fn ensure_persisted(result: &CycleResult) -> anyhow::Result<()> {
    match &result.outcome {
        CycleOutcome::Skipped(SkipReason::RosterUnavailable) => {
            anyhow::bail!("scrape cycle skipped: roster could not be read")
        }
        CycleOutcome::Skipped(_) => Ok(()),
        CycleOutcome::Panicked => anyhow::bail!("scrape cycle panicked"),
        CycleOutcome::Completed(report) => {
            anyhow::ensure!(
                result.success,
                "no statements persisted for {}",
                report.company_code
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use asxdb_core::StatementType;
    use asxdb_scheduler::CycleReport;
    use chrono::Utc;

    use super::*;

    fn skipped(reason: SkipReason) -> CycleResult {
        CycleResult {
            success: false,
            outcome: CycleOutcome::Skipped(reason),
        }
    }

    fn completed(persisted: Vec<StatementType>) -> CycleResult {
        CycleResult {
            success: !persisted.is_empty(),
            outcome: CycleOutcome::Completed(CycleReport {
                company_code: "BHP".to_string(),
                persisted,
                failures: Vec::new(),
                refreshed_at: Utc::now(),
                timestamp_advanced: true,
            }),
        }
    }

    #[test]
    fn unreadable_roster_is_an_error() {
        assert!(ensure_persisted(&skipped(SkipReason::RosterUnavailable)).is_err());
    }

    #[test]
    fn contention_and_empty_roster_are_not_errors() {
        assert!(ensure_persisted(&skipped(SkipReason::LockContention)).is_ok());
        assert!(ensure_persisted(&skipped(SkipReason::EmptyRoster)).is_ok());
    }

    #[test]
    fn completed_cycle_needs_a_persisted_statement() {
        assert!(ensure_persisted(&completed(vec![StatementType::CashFlow])).is_ok());
        assert!(ensure_persisted(&completed(Vec::new())).is_err());
    }

    #[test]
    fn panicked_cycle_is_an_error() {
        let result = CycleResult {
            success: false,
            outcome: CycleOutcome::Panicked,
        };
        assert!(ensure_persisted(&result).is_err());
    }
}
