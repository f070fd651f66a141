//! Live integration tests for asxdb-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/asxdb-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use asxdb_core::{
    BalanceSheet, CompanyConfig, IncomeStatement, Statement, StatementKind, StatementType,
    NEVER_REFRESHED,
};
use asxdb_db::{
    count_active_companies, get_company_by_code, list_active_companies, list_companies,
    list_statements, sync_roster, update_company_last_refreshed, upsert_statement, DbError,
    RosterSyncSummary, StatementWrite,
};
use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn company(code: &str, name: &str) -> CompanyConfig {
    CompanyConfig {
        code: code.to_string(),
        name: name.to_string(),
        industry: "Materials".to_string(),
    }
}

fn balance_sheet(code: &str, date: NaiveDate, total_assets: i64) -> Statement {
    Statement {
        company_code: code.to_string(),
        statement_date: date,
        source_url: format!(
            "https://www.alphavantage.co/query?function=BALANCE_SHEET&symbol={code}.AX"
        ),
        created_at: Utc::now(),
        kind: StatementKind::BalanceSheet(BalanceSheet {
            total_assets: Some(Decimal::new(total_assets, 0)),
            ..BalanceSheet::default()
        }),
    }
}

fn june_30(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 6, 30).unwrap()
}

// ---------------------------------------------------------------------------
// Section 1: Roster sync
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn sync_roster_inserts_new_companies_as_never_refreshed(pool: sqlx::PgPool) {
    let summary = sync_roster(&pool, &[company("BHP", "BHP Group"), company("CSL", "CSL")])
        .await
        .expect("sync_roster failed");

    assert_eq!(
        summary,
        RosterSyncSummary {
            inserted: 2,
            updated: 0,
            deactivated: 0
        }
    );

    let rows = list_active_companies(&pool).await.expect("list failed");
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.last_refreshed == NEVER_REFRESHED));
}

#[sqlx::test(migrations = "../../migrations")]
async fn sync_roster_soft_deletes_unobserved_and_reactivates(pool: sqlx::PgPool) {
    sync_roster(&pool, &[company("BHP", "BHP Group"), company("CSL", "CSL")])
        .await
        .unwrap();

    let summary = sync_roster(&pool, &[company("BHP", "BHP Group Limited")])
        .await
        .unwrap();
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.deactivated, 1);
    assert_eq!(count_active_companies(&pool).await.unwrap(), 1);

    let all = list_companies(&pool, true).await.unwrap();
    assert_eq!(all.len(), 2, "inactive rows are retained");
    let csl = all.iter().find(|r| r.code == "CSL").unwrap();
    assert!(!csl.is_active);

    let summary = sync_roster(&pool, &[company("BHP", "BHP"), company("CSL", "CSL")])
        .await
        .unwrap();
    assert_eq!(summary.inserted, 0);
    assert_eq!(summary.updated, 2);
    assert_eq!(count_active_companies(&pool).await.unwrap(), 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn sync_roster_keeps_last_refreshed_of_existing_rows(pool: sqlx::PgPool) {
    sync_roster(&pool, &[company("WES", "Wesfarmers")]).await.unwrap();
    let refreshed = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
    update_company_last_refreshed(&pool, "WES", refreshed)
        .await
        .unwrap();

    sync_roster(&pool, &[company("WES", "Wesfarmers Limited")])
        .await
        .unwrap();

    let row = get_company_by_code(&pool, "wes").await.unwrap().unwrap();
    assert_eq!(row.name, "Wesfarmers Limited");
    assert_eq!(row.last_refreshed, refreshed);
}

#[sqlx::test(migrations = "../../migrations")]
async fn sync_roster_with_empty_input_changes_nothing(pool: sqlx::PgPool) {
    sync_roster(&pool, &[company("BHP", "BHP Group")]).await.unwrap();

    let summary = sync_roster(&pool, &[]).await.unwrap();
    assert_eq!(summary, RosterSyncSummary::default());
    assert_eq!(count_active_companies(&pool).await.unwrap(), 1);
}

// ---------------------------------------------------------------------------
// Section 2: Staleness ordering
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn list_active_orders_by_last_refreshed_then_code(pool: sqlx::PgPool) {
    sync_roster(
        &pool,
        &[company("AAA", "A"), company("BBB", "B"), company("CCC", "C")],
    )
    .await
    .unwrap();

    let t3 = Utc.with_ymd_and_hms(2025, 1, 3, 0, 0, 0).unwrap();
    let t5 = Utc.with_ymd_and_hms(2025, 1, 5, 0, 0, 0).unwrap();
    update_company_last_refreshed(&pool, "AAA", t5).await.unwrap();
    update_company_last_refreshed(&pool, "BBB", t3).await.unwrap();
    update_company_last_refreshed(&pool, "CCC", t3).await.unwrap();

    let codes: Vec<String> = list_active_companies(&pool)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.code)
        .collect();
    assert_eq!(codes, vec!["BBB", "CCC", "AAA"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_last_refreshed_unknown_code_is_not_found(pool: sqlx::PgPool) {
    let result = update_company_last_refreshed(&pool, "NOPE", Utc::now()).await;
    assert!(matches!(result, Err(DbError::NotFound)));
}

// ---------------------------------------------------------------------------
// Section 3: Statement upserts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_statement_replaces_same_company_and_date(pool: sqlx::PgPool) {
    let first = upsert_statement(&pool, &balance_sheet("BHP", june_30(2024), 100))
        .await
        .expect("first upsert failed");
    assert_eq!(first, StatementWrite::Inserted);

    let second = upsert_statement(&pool, &balance_sheet("BHP", june_30(2024), 250))
        .await
        .expect("second upsert failed");
    assert_eq!(second, StatementWrite::Updated);

    let stored = list_statements(&pool, "BHP", StatementType::BalanceSheet, 10)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1, "same (code, date) must not duplicate");
    let StatementKind::BalanceSheet(items) = &stored[0].kind else {
        panic!("expected balance sheet");
    };
    assert_eq!(items.total_assets, Some(Decimal::new(250, 0)));
    assert!(items.total_equity.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_statements_returns_newest_first_and_respects_limit(pool: sqlx::PgPool) {
    for year in [2022, 2023, 2024] {
        upsert_statement(&pool, &balance_sheet("CSL", june_30(year), 1))
            .await
            .unwrap();
    }

    let stored = list_statements(&pool, "CSL", StatementType::BalanceSheet, 2)
        .await
        .unwrap();
    let dates: Vec<NaiveDate> = stored.iter().map(|s| s.statement_date).collect();
    assert_eq!(dates, vec![june_30(2024), june_30(2023)]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_statement_keeps_every_fractional_digit(pool: sqlx::PgPool) {
    let mut statement = balance_sheet("CSL", june_30(2024), 0);
    let precise = Decimal::new(-1_234_567_890_123, 6);
    if let StatementKind::BalanceSheet(items) = &mut statement.kind {
        items.total_assets = Some(precise);
    }
    upsert_statement(&pool, &statement)
        .await
        .expect("upsert failed");

    let stored = list_statements(&pool, "CSL", StatementType::BalanceSheet, 1)
        .await
        .unwrap();
    let StatementKind::BalanceSheet(items) = &stored[0].kind else {
        panic!("expected balance sheet");
    };
    assert_eq!(items.total_assets, Some(precise));
}

#[sqlx::test(migrations = "../../migrations")]
async fn statement_types_are_stored_in_separate_tables(pool: sqlx::PgPool) {
    let income = Statement {
        company_code: "WES".to_string(),
        statement_date: june_30(2024),
        source_url: "https://www.alphavantage.co/query?function=INCOME_STATEMENT&symbol=WES.AX"
            .to_string(),
        created_at: Utc::now(),
        kind: StatementKind::IncomeStatement(IncomeStatement {
            net_income: Some(Decimal::new(2_557, 0)),
            ..IncomeStatement::default()
        }),
    };
    upsert_statement(&pool, &income).await.unwrap();
    upsert_statement(&pool, &balance_sheet("WES", june_30(2024), 5))
        .await
        .unwrap();

    let incomes = list_statements(&pool, "WES", StatementType::IncomeStatement, 10)
        .await
        .unwrap();
    let cash_flows = list_statements(&pool, "WES", StatementType::CashFlow, 10)
        .await
        .unwrap();
    assert_eq!(incomes.len(), 1);
    assert_eq!(incomes[0].statement_type(), StatementType::IncomeStatement);
    assert!(cash_flows.is_empty());
}
