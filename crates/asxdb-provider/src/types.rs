//! Alpha Vantage fundamentals response types.
//!
//! The three fundamentals endpoints share one envelope: a `symbol` plus
//! `annualReports` and `quarterlyReports` arrays. Every numeric field arrives
//! as a string, and a missing value is the literal string `"None"`, so report
//! fields are kept as `Option<String>` and converted in [`crate::parse`].

use serde::Deserialize;

/// Envelope shared by `BALANCE_SHEET`, `INCOME_STATEMENT` and `CASH_FLOW`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "T: Deserialize<'de>"))]
pub struct FundamentalsResponse<T> {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub annual_reports: Vec<T>,
}

// ---------------------------------------------------------------------------
// BALANCE_SHEET
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSheetReport {
    #[serde(default)]
    pub fiscal_date_ending: String,
    #[serde(default)]
    pub total_assets: Option<String>,
    #[serde(default)]
    pub total_current_assets: Option<String>,
    #[serde(default)]
    pub total_non_current_assets: Option<String>,
    #[serde(default)]
    pub total_liabilities: Option<String>,
    #[serde(default)]
    pub total_current_liabilities: Option<String>,
    #[serde(default)]
    pub total_non_current_liabilities: Option<String>,
    #[serde(default)]
    pub total_shareholder_equity: Option<String>,
}

// ---------------------------------------------------------------------------
// INCOME_STATEMENT
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeStatementReport {
    #[serde(default)]
    pub fiscal_date_ending: String,
    #[serde(default)]
    pub total_revenue: Option<String>,
    #[serde(default)]
    pub cost_of_revenue: Option<String>,
    #[serde(default)]
    pub gross_profit: Option<String>,
    #[serde(default)]
    pub operating_expenses: Option<String>,
    #[serde(default)]
    pub operating_income: Option<String>,
    #[serde(default)]
    pub net_income: Option<String>,
    #[serde(default, alias = "reportedEPS")]
    pub earnings_per_share: Option<String>,
}

// ---------------------------------------------------------------------------
// CASH_FLOW
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowReport {
    #[serde(default)]
    pub fiscal_date_ending: String,
    #[serde(default)]
    pub operating_cashflow: Option<String>,
    #[serde(default)]
    pub cashflow_from_investment: Option<String>,
    #[serde(default)]
    pub cashflow_from_financing: Option<String>,
    #[serde(default)]
    pub change_in_cash_and_cash_equivalents: Option<String>,
    #[serde(default)]
    pub capital_expenditures: Option<String>,
    #[serde(default)]
    pub dividend_payout: Option<String>,
}
