//! Financial statement records.
//!
//! Every statement shares an envelope (company code, fiscal date, provenance,
//! creation time) and carries one of three line-item variants in
//! [`StatementKind`]. Monetary amounts are [`Decimal`]; a `None` amount means
//! the provider reported no value for that line.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Tag identifying which of the three statements a record is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementType {
    BalanceSheet,
    IncomeStatement,
    CashFlow,
}

impl StatementType {
    pub const ALL: [StatementType; 3] = [
        StatementType::BalanceSheet,
        StatementType::IncomeStatement,
        StatementType::CashFlow,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StatementType::BalanceSheet => "balance_sheet",
            StatementType::IncomeStatement => "income_statement",
            StatementType::CashFlow => "cash_flow",
        }
    }
}

impl std::fmt::Display for StatementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatementType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "balance_sheet" => Ok(StatementType::BalanceSheet),
            "income_statement" | "income" => Ok(StatementType::IncomeStatement),
            "cash_flow" | "cashflow" => Ok(StatementType::CashFlow),
            _ => Err(CoreError::UnknownStatementType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub total_assets: Option<Decimal>,
    pub current_assets: Option<Decimal>,
    pub non_current_assets: Option<Decimal>,
    pub total_liabilities: Option<Decimal>,
    pub current_liabilities: Option<Decimal>,
    pub non_current_liabilities: Option<Decimal>,
    pub total_equity: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeStatement {
    pub revenue: Option<Decimal>,
    pub cost_of_revenue: Option<Decimal>,
    pub gross_profit: Option<Decimal>,
    pub operating_expenses: Option<Decimal>,
    pub operating_income: Option<Decimal>,
    pub net_income: Option<Decimal>,
    pub earnings_per_share: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowStatement {
    pub operating_cash_flow: Option<Decimal>,
    pub investing_cash_flow: Option<Decimal>,
    pub financing_cash_flow: Option<Decimal>,
    pub net_change_in_cash: Option<Decimal>,
    pub capital_expenditures: Option<Decimal>,
    pub dividend_payout: Option<Decimal>,
}

/// Line items of one statement, tagged by variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "statement_type", content = "line_items", rename_all = "snake_case")]
pub enum StatementKind {
    BalanceSheet(BalanceSheet),
    IncomeStatement(IncomeStatement),
    CashFlow(CashFlowStatement),
}

impl StatementKind {
    #[must_use]
    pub fn statement_type(&self) -> StatementType {
        match self {
            StatementKind::BalanceSheet(_) => StatementType::BalanceSheet,
            StatementKind::IncomeStatement(_) => StatementType::IncomeStatement,
            StatementKind::CashFlow(_) => StatementType::CashFlow,
        }
    }
}

/// A fetched statement. Identity is `(company_code, statement_date)` within
/// its statement type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub company_code: String,
    pub statement_date: NaiveDate,
    /// Request that produced this record, without credentials.
    pub source_url: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: StatementKind,
}

impl Statement {
    #[must_use]
    pub fn statement_type(&self) -> StatementType {
        self.kind.statement_type()
    }
}
