use std::panic::AssertUnwindSafe;

use asxdb_core::{normalize_code, Company, Statement, StatementType};
use chrono::{DateTime, TimeDelta, Utc};
use futures::FutureExt;

use crate::error::{CycleFailure, FetchError, PrioritizeError, SkipReason};
use crate::lock::CycleLock;
use crate::ports::{RosterStore, StatementProvider, StatementStore};
use crate::selection::select_stalest;

// ---------------------------------------------------------------------------
// Cycle types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    Locking,
    Selecting,
    Fetching,
    Persisting,
    Advancing,
    Skipped,
    Degraded,
}

impl std::fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            CyclePhase::Idle => "idle",
            CyclePhase::Locking => "locking",
            CyclePhase::Selecting => "selecting",
            CyclePhase::Fetching => "fetching",
            CyclePhase::Persisting => "persisting",
            CyclePhase::Advancing => "advancing",
            CyclePhase::Skipped => "skipped",
            CyclePhase::Degraded => "degraded",
        };
        f.write_str(label)
    }
}

/// What a cycle that reached the advancing phase did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub company_code: String,
    /// Statement types whose upsert succeeded.
    pub persisted: Vec<StatementType>,
    pub failures: Vec<CycleFailure>,
    /// The timestamp written (or attempted) as the company's `last_refreshed`.
    pub refreshed_at: DateTime<Utc>,
    pub timestamp_advanced: bool,
}

impl CycleReport {
    #[must_use]
    pub fn persisted_count(&self) -> usize {
        self.persisted.len()
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Skipped(SkipReason),
    Completed(CycleReport),
    /// The cycle body panicked; the lock was still released.
    Panicked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleResult {
    /// `true` when at least one statement was persisted.
    pub success: bool,
    pub outcome: CycleOutcome,
}

impl CycleResult {
    fn skipped(reason: SkipReason) -> Self {
        Self {
            success: false,
            outcome: CycleOutcome::Skipped(reason),
        }
    }

    #[must_use]
    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self.outcome {
            CycleOutcome::Skipped(reason) => Some(reason),
            _ => None,
        }
    }

    #[must_use]
    pub fn report(&self) -> Option<&CycleReport> {
        match &self.outcome {
            CycleOutcome::Completed(report) => Some(report),
            _ => None,
        }
    }
}

enum StepOutcome {
    Persisted(StatementType),
    Failed(CycleFailure),
}

fn enter(phase: CyclePhase, company: Option<&str>) {
    tracing::debug!(phase = %phase, company = company.unwrap_or("-"), "scheduler: phase");
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Runs scrape cycles against a roster, a provider and a statement store.
///
/// Schedulers built over clones of one [`CycleLock`] never run cycles at the
/// same time.
pub struct Scheduler<R, P, S> {
    roster: R,
    provider: P,
    statements: S,
    lock: CycleLock,
}

impl<R, P, S> Scheduler<R, P, S>
where
    R: RosterStore,
    P: StatementProvider,
    S: StatementStore,
{
    pub fn new(roster: R, provider: P, statements: S, lock: CycleLock) -> Self {
        Self {
            roster,
            provider,
            statements,
            lock,
        }
    }

    pub fn lock(&self) -> &CycleLock {
        &self.lock
    }

    /// Run one scrape cycle.
    ///
    /// Never fails: lock contention, an empty or unreadable roster, fetch and
    /// persist errors, a failed timestamp write and a panic in the cycle body
    /// are all reported through the returned [`CycleResult`].
    pub async fn run_cycle(&self) -> CycleResult {
        enter(CyclePhase::Locking, None);
        let Some(guard) = self.lock.acquire().await else {
            enter(CyclePhase::Skipped, None);
            tracing::info!(
                wait_ms = u64::try_from(self.lock.wait().as_millis()).unwrap_or(u64::MAX),
                "scheduler: another cycle holds the lock; skipping"
            );
            return CycleResult::skipped(SkipReason::LockContention);
        };

        let result = match AssertUnwindSafe(self.run_locked()).catch_unwind().await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!("scheduler: cycle panicked; releasing lock");
                CycleResult {
                    success: false,
                    outcome: CycleOutcome::Panicked,
                }
            }
        };

        drop(guard);
        enter(CyclePhase::Idle, None);
        result
    }

    async fn run_locked(&self) -> CycleResult {
        enter(CyclePhase::Selecting, None);
        let companies = match self.roster.list_active().await {
            Ok(companies) => companies,
            Err(e) => {
                tracing::error!(error = %e, "scheduler: roster read failed; skipping cycle");
                return CycleResult::skipped(SkipReason::RosterUnavailable);
            }
        };

        let Some(company) = select_stalest(&companies).cloned() else {
            enter(CyclePhase::Skipped, None);
            tracing::info!("scheduler: roster is empty; nothing to scrape");
            return CycleResult::skipped(SkipReason::EmptyRoster);
        };
        let code = company.code.clone();
        tracing::info!(
            company = %code,
            last_refreshed = %company.last_refreshed,
            "scheduler: selected stalest company"
        );

        enter(CyclePhase::Fetching, Some(&code));
        let (balance_sheet, income_statement, cash_flow) = futures::join!(
            self.provider.fetch_balance_sheet(&code),
            self.provider.fetch_income_statement(&code),
            self.provider.fetch_cash_flow(&code),
        );

        enter(CyclePhase::Persisting, Some(&code));
        let mut steps = Vec::with_capacity(StatementType::ALL.len());
        for (statement_type, fetched) in [
            (StatementType::BalanceSheet, balance_sheet),
            (StatementType::IncomeStatement, income_statement),
            (StatementType::CashFlow, cash_flow),
        ] {
            steps.push(self.persist_step(&code, statement_type, fetched).await);
        }

        let mut persisted = Vec::new();
        let mut failures = Vec::new();
        for step in steps {
            match step {
                StepOutcome::Persisted(statement_type) => persisted.push(statement_type),
                StepOutcome::Failed(failure) => failures.push(failure),
            }
        }
        if !failures.is_empty() {
            enter(CyclePhase::Degraded, Some(&code));
        }

        enter(CyclePhase::Advancing, Some(&code));
        let refreshed_at = Utc::now();
        let timestamp_advanced = match self.advance(company, refreshed_at).await {
            Ok(()) => true,
            Err(failure) => {
                failures.push(failure);
                false
            }
        };

        let report = CycleReport {
            company_code: code,
            persisted,
            failures,
            refreshed_at,
            timestamp_advanced,
        };
        tracing::info!(
            company = %report.company_code,
            persisted = report.persisted_count(),
            failures = report.failures.len(),
            "scheduler: cycle complete"
        );

        CycleResult {
            success: report.persisted_count() > 0,
            outcome: CycleOutcome::Completed(report),
        }
    }

    async fn persist_step(
        &self,
        code: &str,
        statement_type: StatementType,
        fetched: Result<Statement, FetchError>,
    ) -> StepOutcome {
        let statement = match fetched {
            Ok(statement) => statement,
            Err(e) => {
                tracing::warn!(
                    company = %code,
                    statement_type = %statement_type,
                    kind = %e.kind,
                    error = %e.message,
                    "scheduler: fetch failed"
                );
                return StepOutcome::Failed(CycleFailure::Fetch {
                    statement_type,
                    company_code: code.to_owned(),
                    kind: e.kind,
                    message: e.message,
                });
            }
        };

        match self.statements.upsert(&statement).await {
            Ok(()) => {
                tracing::debug!(
                    company = %code,
                    statement_type = %statement_type,
                    statement_date = %statement.statement_date,
                    "scheduler: statement persisted"
                );
                StepOutcome::Persisted(statement_type)
            }
            Err(e) => {
                tracing::warn!(
                    company = %code,
                    statement_type = %statement_type,
                    error = %e,
                    "scheduler: persist failed"
                );
                StepOutcome::Failed(CycleFailure::Persist {
                    statement_type,
                    company_code: code.to_owned(),
                    message: e.to_string(),
                })
            }
        }
    }

    async fn advance(
        &self,
        mut company: Company,
        refreshed_at: DateTime<Utc>,
    ) -> Result<(), CycleFailure> {
        company.last_refreshed = refreshed_at;
        self.roster.save(&company).await.map_err(|e| {
            tracing::error!(
                company = %company.code,
                error = %e,
                "scheduler: failed to advance last_refreshed"
            );
            CycleFailure::TimestampWrite {
                company_code: company.code.clone(),
                message: e.to_string(),
            }
        })
    }

    /// Number of active companies, or `-1` if the roster cannot be read.
    pub async fn queue_length(&self) -> i64 {
        match self.roster.count_active().await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(error = %e, "scheduler: queue length unavailable");
                -1
            }
        }
    }

    /// Move an active company to the front of the queue.
    ///
    /// Its `last_refreshed` becomes `min(now - rewind, oldest_other - 1s)`,
    /// and is never moved later than its current value. The write is durable
    /// before this returns, so the next cycle to run selects the company even
    /// if the caller's own cycle is skipped.
    ///
    /// # Errors
    ///
    /// Returns [`PrioritizeError::InvalidCode`] for a malformed code,
    /// [`PrioritizeError::UnknownCompany`] if no active company matches, or
    /// [`PrioritizeError::Store`] if the roster cannot be read or written.
    pub async fn prioritize(
        &self,
        code: &str,
        rewind: TimeDelta,
    ) -> Result<Company, PrioritizeError> {
        let code =
            normalize_code(code).map_err(|_| PrioritizeError::InvalidCode(code.to_owned()))?;
        let companies = self.roster.list_active().await?;

        let Some(mut company) = companies.iter().find(|c| c.code == code).cloned() else {
            return Err(PrioritizeError::UnknownCompany(code));
        };

        let now = Utc::now();
        let mut target = now
            .checked_sub_signed(rewind)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let oldest_other = companies
            .iter()
            .filter(|c| c.code != code)
            .map(|c| c.last_refreshed)
            .min();
        if let Some(oldest_other) = oldest_other {
            let just_before = oldest_other
                .checked_sub_signed(TimeDelta::seconds(1))
                .unwrap_or(DateTime::<Utc>::MIN_UTC);
            target = target.min(just_before);
        }
        company.last_refreshed = company.last_refreshed.min(target);

        self.roster.save(&company).await?;
        tracing::info!(
            company = %company.code,
            last_refreshed = %company.last_refreshed,
            "scheduler: company prioritized"
        );

        Ok(company)
    }
}

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod tests;
