use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use asxdb_core::{
    BalanceSheet, CashFlowStatement, IncomeStatement, StatementKind, NEVER_REFRESHED,
};
use chrono::{NaiveDate, TimeZone};
use rust_decimal::Decimal;

use super::*;
use crate::error::{FetchErrorKind, StoreError};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeRoster {
    companies: Mutex<Vec<Company>>,
    fail_list: AtomicBool,
    fail_save: AtomicBool,
    list_calls: AtomicUsize,
    saves: AtomicUsize,
}

impl FakeRoster {
    fn with(companies: Vec<Company>) -> Arc<Self> {
        Arc::new(Self {
            companies: Mutex::new(companies),
            ..Self::default()
        })
    }

    fn last_refreshed(&self, code: &str) -> DateTime<Utc> {
        self.companies
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.code == code)
            .map(|c| c.last_refreshed)
            .expect("company present")
    }

    fn touched(&self) -> bool {
        self.list_calls.load(Ordering::SeqCst) > 0 || self.saves.load(Ordering::SeqCst) > 0
    }
}

#[async_trait]
impl RosterStore for FakeRoster {
    async fn list_active(&self) -> Result<Vec<Company>, StoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("roster offline".to_string()));
        }
        let companies = self.companies.lock().unwrap();
        Ok(companies.iter().filter(|c| c.is_active).cloned().collect())
    }

    async fn save(&self, company: &Company) -> Result<(), StoreError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("write rejected".to_string()));
        }
        let mut companies = self.companies.lock().unwrap();
        let existing = companies
            .iter_mut()
            .find(|c| c.code == company.code)
            .ok_or_else(|| StoreError::UnknownCompany(company.code.clone()))?;
        existing.last_refreshed = company.last_refreshed;
        Ok(())
    }
}

#[derive(Default)]
struct FakeProvider {
    failing: HashMap<StatementType, FetchErrorKind>,
    delay: Option<Duration>,
    panic_on_fetch: bool,
    calls: AtomicUsize,
}

impl FakeProvider {
    fn ok() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn failing(types: &[StatementType]) -> Arc<Self> {
        Arc::new(Self {
            failing: types
                .iter()
                .map(|t| (*t, FetchErrorKind::RateLimited))
                .collect(),
            ..Self::default()
        })
    }

    fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Self::default()
        })
    }

    async fn fetch(&self, code: &str, statement_type: StatementType) -> Result<Statement, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        assert!(!self.panic_on_fetch, "provider exploded");
        if let Some(kind) = self.failing.get(&statement_type) {
            return Err(FetchError::new(*kind, format!("{statement_type} unavailable")));
        }

        let kind = match statement_type {
            StatementType::BalanceSheet => StatementKind::BalanceSheet(BalanceSheet {
                total_assets: Some(Decimal::new(100, 0)),
                ..BalanceSheet::default()
            }),
            StatementType::IncomeStatement => StatementKind::IncomeStatement(IncomeStatement {
                net_income: Some(Decimal::new(10, 0)),
                ..IncomeStatement::default()
            }),
            StatementType::CashFlow => StatementKind::CashFlow(CashFlowStatement::default()),
        };
        Ok(Statement {
            company_code: code.to_string(),
            statement_date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            source_url: format!("fake://{statement_type}/{code}"),
            created_at: Utc::now(),
            kind,
        })
    }
}

#[async_trait]
impl StatementProvider for FakeProvider {
    async fn fetch_balance_sheet(&self, company_code: &str) -> Result<Statement, FetchError> {
        self.fetch(company_code, StatementType::BalanceSheet).await
    }

    async fn fetch_income_statement(&self, company_code: &str) -> Result<Statement, FetchError> {
        self.fetch(company_code, StatementType::IncomeStatement).await
    }

    async fn fetch_cash_flow(&self, company_code: &str) -> Result<Statement, FetchError> {
        self.fetch(company_code, StatementType::CashFlow).await
    }
}

type StatementKey = (StatementType, String, NaiveDate);

#[derive(Default)]
struct FakeStatements {
    rows: Mutex<HashMap<StatementKey, Statement>>,
    failing: HashSet<StatementType>,
    upserts: AtomicUsize,
}

impl FakeStatements {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn failing(types: &[StatementType]) -> Arc<Self> {
        Arc::new(Self {
            failing: types.iter().copied().collect(),
            ..Self::default()
        })
    }

    fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl StatementStore for FakeStatements {
    async fn upsert(&self, statement: &Statement) -> Result<(), StoreError> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&statement.statement_type()) {
            return Err(StoreError::Unavailable("disk full".to_string()));
        }
        let key = (
            statement.statement_type(),
            statement.company_code.clone(),
            statement.statement_date,
        );
        self.rows.lock().unwrap().insert(key, statement.clone());
        Ok(())
    }
}

type FakeScheduler = Scheduler<Arc<FakeRoster>, Arc<FakeProvider>, Arc<FakeStatements>>;

fn company(code: &str, secs: i64) -> Company {
    Company {
        code: code.to_string(),
        name: format!("{code} Limited"),
        industry: "Materials".to_string(),
        last_refreshed: Utc.timestamp_opt(secs, 0).unwrap(),
        is_active: true,
    }
}

fn scheduler(
    roster: &Arc<FakeRoster>,
    provider: &Arc<FakeProvider>,
    statements: &Arc<FakeStatements>,
) -> FakeScheduler {
    Scheduler::new(
        Arc::clone(roster),
        Arc::clone(provider),
        Arc::clone(statements),
        CycleLock::new(Duration::from_millis(50)),
    )
}

// ---------------------------------------------------------------------------
// Single flight
// ---------------------------------------------------------------------------

#[tokio::test]
async fn concurrent_cycles_sharing_a_lock_run_one_at_a_time() {
    let lock = CycleLock::new(Duration::from_millis(20));

    let roster_a = FakeRoster::with(vec![company("BHP", 1)]);
    let statements_a = FakeStatements::new();
    let a = Scheduler::new(
        Arc::clone(&roster_a),
        FakeProvider::slow(Duration::from_millis(250)),
        Arc::clone(&statements_a),
        lock.clone(),
    );

    let roster_b = FakeRoster::with(vec![company("CSL", 1)]);
    let statements_b = FakeStatements::new();
    let b = Scheduler::new(
        Arc::clone(&roster_b),
        FakeProvider::ok(),
        Arc::clone(&statements_b),
        lock.clone(),
    );

    let (first, second) = tokio::join!(a.run_cycle(), b.run_cycle());

    assert!(first.success);
    assert!(!second.success);
    assert_eq!(second.skip_reason(), Some(SkipReason::LockContention));
    assert!(!roster_b.touched(), "skipped cycle must not read the roster");
    assert_eq!(statements_b.upserts.load(Ordering::SeqCst), 0);
    assert_eq!(statements_a.row_count(), 3);
}

#[tokio::test]
async fn lock_is_released_after_a_cycle() {
    let roster = FakeRoster::with(vec![company("BHP", 1)]);
    let statements = FakeStatements::new();
    let s = scheduler(&roster, &FakeProvider::ok(), &statements);

    assert!(s.run_cycle().await.success);
    assert!(!s.lock().is_busy());
    assert!(s.run_cycle().await.success);
}

#[tokio::test]
async fn panic_in_cycle_body_reports_failure_and_releases_lock() {
    let roster = FakeRoster::with(vec![company("BHP", 1)]);
    let provider = Arc::new(FakeProvider {
        panic_on_fetch: true,
        ..FakeProvider::default()
    });
    let s = scheduler(&roster, &provider, &FakeStatements::new());

    let result = s.run_cycle().await;
    assert!(!result.success);
    assert_eq!(result.outcome, CycleOutcome::Panicked);
    assert!(!s.lock().is_busy());
}

// ---------------------------------------------------------------------------
// Selection and advancing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn selects_oldest_with_code_tiebreak() {
    let roster = FakeRoster::with(vec![company("A", 5), company("C", 3), company("B", 3)]);
    let s = scheduler(&roster, &FakeProvider::ok(), &FakeStatements::new());

    let result = s.run_cycle().await;
    assert_eq!(result.report().unwrap().company_code, "B");
}

#[tokio::test]
async fn never_refreshed_company_is_picked_first() {
    let roster = FakeRoster::with(vec![company("OLD", 1_000), company("NEW", 0)]);
    assert_eq!(roster.last_refreshed("NEW"), NEVER_REFRESHED);
    let s = scheduler(&roster, &FakeProvider::ok(), &FakeStatements::new());

    let result = s.run_cycle().await;
    assert_eq!(result.report().unwrap().company_code, "NEW");
}

#[tokio::test]
async fn total_fetch_failure_still_advances_timestamp() {
    let roster = FakeRoster::with(vec![company("A", 1), company("B", 2)]);
    let statements = FakeStatements::new();
    let provider = FakeProvider::failing(&StatementType::ALL);
    let s = scheduler(&roster, &provider, &statements);

    let result = s.run_cycle().await;
    assert!(!result.success);
    let report = result.report().expect("cycle should complete");
    assert_eq!(report.company_code, "A");
    assert_eq!(report.failures.len(), 3);
    assert!(report.timestamp_advanced);
    assert!(roster.last_refreshed("A") > Utc.timestamp_opt(2, 0).unwrap());
    assert_eq!(statements.upserts.load(Ordering::SeqCst), 0);

    let next = s.run_cycle().await;
    assert_eq!(next.report().unwrap().company_code, "B");
}

#[tokio::test]
async fn partial_fetch_failure_persists_the_rest() {
    let roster = FakeRoster::with(vec![company("WES", 1)]);
    let statements = FakeStatements::new();
    let provider = FakeProvider::failing(&[StatementType::IncomeStatement]);
    let s = scheduler(&roster, &provider, &statements);

    let result = s.run_cycle().await;
    assert!(result.success);
    let report = result.report().unwrap();
    assert_eq!(
        report.persisted,
        vec![StatementType::BalanceSheet, StatementType::CashFlow]
    );
    assert!(report.is_degraded());
    assert!(matches!(
        report.failures.as_slice(),
        [CycleFailure::Fetch {
            statement_type: StatementType::IncomeStatement,
            kind: FetchErrorKind::RateLimited,
            ..
        }]
    ));
    assert_eq!(statements.upserts.load(Ordering::SeqCst), 2);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn persist_failure_does_not_block_other_statements() {
    let roster = FakeRoster::with(vec![company("CBA", 1)]);
    let statements = FakeStatements::failing(&[StatementType::BalanceSheet]);
    let s = scheduler(&roster, &FakeProvider::ok(), &statements);

    let result = s.run_cycle().await;
    assert!(result.success);
    let report = result.report().unwrap();
    assert_eq!(report.persisted_count(), 2);
    assert!(matches!(
        report.failures.as_slice(),
        [CycleFailure::Persist {
            statement_type: StatementType::BalanceSheet,
            ..
        }]
    ));
    assert_eq!(statements.row_count(), 2);
}

#[tokio::test]
async fn timestamp_write_failure_is_reported_but_cycle_completes() {
    let roster = FakeRoster::with(vec![company("NAB", 1)]);
    roster.fail_save.store(true, Ordering::SeqCst);
    let s = scheduler(&roster, &FakeProvider::ok(), &FakeStatements::new());

    let result = s.run_cycle().await;
    assert!(result.success);
    let report = result.report().unwrap();
    assert!(!report.timestamp_advanced);
    assert!(matches!(
        report.failures.last(),
        Some(CycleFailure::TimestampWrite { company_code, .. }) if company_code == "NAB"
    ));
}

#[tokio::test]
async fn repeated_cycles_upsert_instead_of_duplicating() {
    let roster = FakeRoster::with(vec![company("BHP", 1)]);
    let statements = FakeStatements::new();
    let s = scheduler(&roster, &FakeProvider::ok(), &statements);

    s.run_cycle().await;
    s.run_cycle().await;

    assert_eq!(statements.upserts.load(Ordering::SeqCst), 6);
    assert_eq!(statements.row_count(), 3);
}

// ---------------------------------------------------------------------------
// Skips and queue length
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_roster_is_skipped_without_mutation() {
    let roster = FakeRoster::with(Vec::new());
    let statements = FakeStatements::new();
    let provider = FakeProvider::ok();
    let s = scheduler(&roster, &provider, &statements);

    let result = s.run_cycle().await;
    assert!(!result.success);
    assert_eq!(result.skip_reason(), Some(SkipReason::EmptyRoster));
    assert_eq!(roster.saves.load(Ordering::SeqCst), 0);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    assert_eq!(statements.upserts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unreadable_roster_is_skipped() {
    let roster = FakeRoster::with(vec![company("BHP", 1)]);
    roster.fail_list.store(true, Ordering::SeqCst);
    let s = scheduler(&roster, &FakeProvider::ok(), &FakeStatements::new());

    let result = s.run_cycle().await;
    assert!(!result.success);
    assert_eq!(result.skip_reason(), Some(SkipReason::RosterUnavailable));
    assert_eq!(roster.saves.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn queue_length_counts_active_companies() {
    let mut inactive = company("OLD", 1);
    inactive.is_active = false;
    let roster = FakeRoster::with(vec![company("A", 1), company("B", 2), inactive]);
    let s = scheduler(&roster, &FakeProvider::ok(), &FakeStatements::new());

    assert_eq!(s.queue_length().await, 2);
}

#[tokio::test]
async fn queue_length_is_negative_one_on_roster_fault() {
    let roster = FakeRoster::with(vec![company("A", 1)]);
    roster.fail_list.store(true, Ordering::SeqCst);
    let s = scheduler(&roster, &FakeProvider::ok(), &FakeStatements::new());

    assert_eq!(s.queue_length().await, -1);
}

// ---------------------------------------------------------------------------
// Prioritize
// ---------------------------------------------------------------------------

#[tokio::test]
async fn prioritize_moves_company_ahead_of_everyone_else() {
    let roster = FakeRoster::with(vec![company("A", 100), company("B", 200), company("C", 300)]);
    let s = scheduler(&roster, &FakeProvider::ok(), &FakeStatements::new());

    let prioritized = s
        .prioritize("c", TimeDelta::days(365))
        .await
        .expect("prioritize");
    assert_eq!(prioritized.code, "C");
    assert_eq!(prioritized.last_refreshed, Utc.timestamp_opt(99, 0).unwrap());
    assert_eq!(roster.last_refreshed("C"), Utc.timestamp_opt(99, 0).unwrap());

    let result = s.run_cycle().await;
    assert_eq!(result.report().unwrap().company_code, "C");
}

#[tokio::test]
async fn prioritize_survives_a_skipped_cycle() {
    let roster = FakeRoster::with(vec![company("A", 100), company("B", 200)]);
    let s = scheduler(&roster, &FakeProvider::ok(), &FakeStatements::new());

    s.prioritize("B", TimeDelta::days(365)).await.unwrap();

    let held = s.lock().acquire().await.expect("hold the lock");
    assert_eq!(
        s.run_cycle().await.skip_reason(),
        Some(SkipReason::LockContention)
    );
    drop(held);

    assert_eq!(s.run_cycle().await.report().unwrap().company_code, "B");
}

#[tokio::test]
async fn prioritize_never_moves_timestamp_forward() {
    let roster = FakeRoster::with(vec![company("A", 0), company("B", 10)]);
    let s = scheduler(&roster, &FakeProvider::ok(), &FakeStatements::new());

    let prioritized = s.prioritize("A", TimeDelta::days(1)).await.unwrap();
    assert_eq!(prioritized.last_refreshed, NEVER_REFRESHED);
}

#[tokio::test]
async fn prioritize_rejects_unknown_and_invalid_codes() {
    let roster = FakeRoster::with(vec![company("A", 1)]);
    let s = scheduler(&roster, &FakeProvider::ok(), &FakeStatements::new());

    assert!(matches!(
        s.prioritize("ZZZ", TimeDelta::days(1)).await,
        Err(PrioritizeError::UnknownCompany(code)) if code == "ZZZ"
    ));
    assert!(matches!(
        s.prioritize("not a code", TimeDelta::days(1)).await,
        Err(PrioritizeError::InvalidCode(_))
    ));
    assert_eq!(roster.saves.load(Ordering::SeqCst), 0);
}
