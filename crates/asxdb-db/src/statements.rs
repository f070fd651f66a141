//! Upserts and reads for the three statement tables.
//!
//! Each [`StatementKind`] variant owns one table keyed by
//! `(company_code, statement_date)`. Writes never duplicate a key: a second
//! write for the same fiscal date overwrites the line items and provenance.

use asxdb_core::{
    BalanceSheet, CashFlowStatement, IncomeStatement, Statement, StatementKind, StatementType,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// Whether an upsert created a new row or overwrote an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementWrite {
    Inserted,
    Updated,
}

impl StatementWrite {
    fn from_inserted(inserted: bool) -> Self {
        if inserted {
            Self::Inserted
        } else {
            Self::Updated
        }
    }
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BalanceSheetRow {
    pub company_code: String,
    pub statement_date: NaiveDate,
    pub total_assets: Option<Decimal>,
    pub current_assets: Option<Decimal>,
    pub non_current_assets: Option<Decimal>,
    pub total_liabilities: Option<Decimal>,
    pub current_liabilities: Option<Decimal>,
    pub non_current_liabilities: Option<Decimal>,
    pub total_equity: Option<Decimal>,
    pub source_url: String,
    pub created_at: DateTime<Utc>,
}

impl From<BalanceSheetRow> for Statement {
    fn from(row: BalanceSheetRow) -> Self {
        Self {
            company_code: row.company_code,
            statement_date: row.statement_date,
            source_url: row.source_url,
            created_at: row.created_at,
            kind: StatementKind::BalanceSheet(BalanceSheet {
                total_assets: row.total_assets,
                current_assets: row.current_assets,
                non_current_assets: row.non_current_assets,
                total_liabilities: row.total_liabilities,
                current_liabilities: row.current_liabilities,
                non_current_liabilities: row.non_current_liabilities,
                total_equity: row.total_equity,
            }),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IncomeStatementRow {
    pub company_code: String,
    pub statement_date: NaiveDate,
    pub revenue: Option<Decimal>,
    pub cost_of_revenue: Option<Decimal>,
    pub gross_profit: Option<Decimal>,
    pub operating_expenses: Option<Decimal>,
    pub operating_income: Option<Decimal>,
    pub net_income: Option<Decimal>,
    pub earnings_per_share: Option<Decimal>,
    pub source_url: String,
    pub created_at: DateTime<Utc>,
}

impl From<IncomeStatementRow> for Statement {
    fn from(row: IncomeStatementRow) -> Self {
        Self {
            company_code: row.company_code,
            statement_date: row.statement_date,
            source_url: row.source_url,
            created_at: row.created_at,
            kind: StatementKind::IncomeStatement(IncomeStatement {
                revenue: row.revenue,
                cost_of_revenue: row.cost_of_revenue,
                gross_profit: row.gross_profit,
                operating_expenses: row.operating_expenses,
                operating_income: row.operating_income,
                net_income: row.net_income,
                earnings_per_share: row.earnings_per_share,
            }),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CashFlowRow {
    pub company_code: String,
    pub statement_date: NaiveDate,
    pub operating_cash_flow: Option<Decimal>,
    pub investing_cash_flow: Option<Decimal>,
    pub financing_cash_flow: Option<Decimal>,
    pub net_change_in_cash: Option<Decimal>,
    pub capital_expenditures: Option<Decimal>,
    pub dividend_payout: Option<Decimal>,
    pub source_url: String,
    pub created_at: DateTime<Utc>,
}

impl From<CashFlowRow> for Statement {
    fn from(row: CashFlowRow) -> Self {
        Self {
            company_code: row.company_code,
            statement_date: row.statement_date,
            source_url: row.source_url,
            created_at: row.created_at,
            kind: StatementKind::CashFlow(CashFlowStatement {
                operating_cash_flow: row.operating_cash_flow,
                investing_cash_flow: row.investing_cash_flow,
                financing_cash_flow: row.financing_cash_flow,
                net_change_in_cash: row.net_change_in_cash,
                capital_expenditures: row.capital_expenditures,
                dividend_payout: row.dividend_payout,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Insert or overwrite a statement keyed by `(company_code, statement_date)`.
///
/// The variant tag of `statement.kind` selects the table. `created_at` is
/// kept from the first write; `updated_at` moves on every write.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn upsert_statement(
    pool: &PgPool,
    statement: &Statement,
) -> Result<StatementWrite, DbError> {
    let inserted = match &statement.kind {
        StatementKind::BalanceSheet(items) => {
            upsert_balance_sheet(pool, statement, items).await?
        }
        StatementKind::IncomeStatement(items) => {
            upsert_income_statement(pool, statement, items).await?
        }
        StatementKind::CashFlow(items) => upsert_cash_flow(pool, statement, items).await?,
    };

    Ok(StatementWrite::from_inserted(inserted))
}

// `xmax = 0` holds only for a freshly inserted tuple, so the RETURNING clause
// distinguishes insert from conflict-update in one round trip.

async fn upsert_balance_sheet(
    pool: &PgPool,
    statement: &Statement,
    items: &BalanceSheet,
) -> Result<bool, DbError> {
    let inserted = sqlx::query_scalar::<_, bool>(
        "INSERT INTO balance_sheets \
             (company_code, statement_date, total_assets, current_assets, non_current_assets, \
              total_liabilities, current_liabilities, non_current_liabilities, total_equity, \
              source_url, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         ON CONFLICT (company_code, statement_date) DO UPDATE SET \
             total_assets = EXCLUDED.total_assets, \
             current_assets = EXCLUDED.current_assets, \
             non_current_assets = EXCLUDED.non_current_assets, \
             total_liabilities = EXCLUDED.total_liabilities, \
             current_liabilities = EXCLUDED.current_liabilities, \
             non_current_liabilities = EXCLUDED.non_current_liabilities, \
             total_equity = EXCLUDED.total_equity, \
             source_url = EXCLUDED.source_url, \
             updated_at = NOW() \
         RETURNING (xmax = 0)",
    )
    .bind(&statement.company_code)
    .bind(statement.statement_date)
    .bind(items.total_assets)
    .bind(items.current_assets)
    .bind(items.non_current_assets)
    .bind(items.total_liabilities)
    .bind(items.current_liabilities)
    .bind(items.non_current_liabilities)
    .bind(items.total_equity)
    .bind(&statement.source_url)
    .bind(statement.created_at)
    .fetch_one(pool)
    .await?;

    Ok(inserted)
}

async fn upsert_income_statement(
    pool: &PgPool,
    statement: &Statement,
    items: &IncomeStatement,
) -> Result<bool, DbError> {
    let inserted = sqlx::query_scalar::<_, bool>(
        "INSERT INTO income_statements \
             (company_code, statement_date, revenue, cost_of_revenue, gross_profit, \
              operating_expenses, operating_income, net_income, earnings_per_share, \
              source_url, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         ON CONFLICT (company_code, statement_date) DO UPDATE SET \
             revenue = EXCLUDED.revenue, \
             cost_of_revenue = EXCLUDED.cost_of_revenue, \
             gross_profit = EXCLUDED.gross_profit, \
             operating_expenses = EXCLUDED.operating_expenses, \
             operating_income = EXCLUDED.operating_income, \
             net_income = EXCLUDED.net_income, \
             earnings_per_share = EXCLUDED.earnings_per_share, \
             source_url = EXCLUDED.source_url, \
             updated_at = NOW() \
         RETURNING (xmax = 0)",
    )
    .bind(&statement.company_code)
    .bind(statement.statement_date)
    .bind(items.revenue)
    .bind(items.cost_of_revenue)
    .bind(items.gross_profit)
    .bind(items.operating_expenses)
    .bind(items.operating_income)
    .bind(items.net_income)
    .bind(items.earnings_per_share)
    .bind(&statement.source_url)
    .bind(statement.created_at)
    .fetch_one(pool)
    .await?;

    Ok(inserted)
}

async fn upsert_cash_flow(
    pool: &PgPool,
    statement: &Statement,
    items: &CashFlowStatement,
) -> Result<bool, DbError> {
    let inserted = sqlx::query_scalar::<_, bool>(
        "INSERT INTO cash_flow_statements \
             (company_code, statement_date, operating_cash_flow, investing_cash_flow, \
              financing_cash_flow, net_change_in_cash, capital_expenditures, dividend_payout, \
              source_url, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         ON CONFLICT (company_code, statement_date) DO UPDATE SET \
             operating_cash_flow = EXCLUDED.operating_cash_flow, \
             investing_cash_flow = EXCLUDED.investing_cash_flow, \
             financing_cash_flow = EXCLUDED.financing_cash_flow, \
             net_change_in_cash = EXCLUDED.net_change_in_cash, \
             capital_expenditures = EXCLUDED.capital_expenditures, \
             dividend_payout = EXCLUDED.dividend_payout, \
             source_url = EXCLUDED.source_url, \
             updated_at = NOW() \
         RETURNING (xmax = 0)",
    )
    .bind(&statement.company_code)
    .bind(statement.statement_date)
    .bind(items.operating_cash_flow)
    .bind(items.investing_cash_flow)
    .bind(items.financing_cash_flow)
    .bind(items.net_change_in_cash)
    .bind(items.capital_expenditures)
    .bind(items.dividend_payout)
    .bind(&statement.source_url)
    .bind(statement.created_at)
    .fetch_one(pool)
    .await?;

    Ok(inserted)
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Returns up to `limit` statements of one type for a company, newest fiscal
/// date first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_statements(
    pool: &PgPool,
    company_code: &str,
    statement_type: StatementType,
    limit: i64,
) -> Result<Vec<Statement>, DbError> {
    let statements = match statement_type {
        StatementType::BalanceSheet => sqlx::query_as::<_, BalanceSheetRow>(
            "SELECT company_code, statement_date, total_assets, current_assets, \
                    non_current_assets, total_liabilities, current_liabilities, \
                    non_current_liabilities, total_equity, source_url, created_at \
             FROM balance_sheets \
             WHERE company_code = $1 \
             ORDER BY statement_date DESC \
             LIMIT $2",
        )
        .bind(company_code)
        .bind(limit)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(Statement::from)
        .collect(),
        StatementType::IncomeStatement => sqlx::query_as::<_, IncomeStatementRow>(
            "SELECT company_code, statement_date, revenue, cost_of_revenue, gross_profit, \
                    operating_expenses, operating_income, net_income, earnings_per_share, \
                    source_url, created_at \
             FROM income_statements \
             WHERE company_code = $1 \
             ORDER BY statement_date DESC \
             LIMIT $2",
        )
        .bind(company_code)
        .bind(limit)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(Statement::from)
        .collect(),
        StatementType::CashFlow => sqlx::query_as::<_, CashFlowRow>(
            "SELECT company_code, statement_date, operating_cash_flow, investing_cash_flow, \
                    financing_cash_flow, net_change_in_cash, capital_expenditures, \
                    dividend_payout, source_url, created_at \
             FROM cash_flow_statements \
             WHERE company_code = $1 \
             ORDER BY statement_date DESC \
             LIMIT $2",
        )
        .bind(company_code)
        .bind(limit)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(Statement::from)
        .collect(),
    };

    Ok(statements)
}
