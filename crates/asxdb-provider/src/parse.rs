//! Conversion of Alpha Vantage report strings into domain line items.

use std::str::FromStr;

use asxdb_core::{BalanceSheet, CashFlowStatement, IncomeStatement, StatementKind};
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::ProviderError;
use crate::types::{BalanceSheetReport, CashFlowReport, IncomeStatementReport};

/// One annual report of any of the three endpoints.
pub trait AnnualReport {
    fn fiscal_date_ending(&self) -> &str;

    /// Convert the report's amount strings into typed line items.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::MalformedResponse`] if any amount is not a number.
    fn line_items(&self) -> Result<StatementKind, ProviderError>;
}

/// Parse an Alpha Vantage amount. Missing fields and the placeholders `"None"`,
/// `""` and `"-"` become `None`.
///
/// # Errors
///
/// Returns [`ProviderError::MalformedResponse`] naming `field` when the value
/// is neither a placeholder nor a decimal number.
pub fn parse_amount(field: &str, raw: Option<&str>) -> Result<Option<Decimal>, ProviderError> {
    let Some(raw) = raw.map(str::trim) else {
        return Ok(None);
    };
    if raw.is_empty() || raw == "-" || raw.eq_ignore_ascii_case("none") {
        return Ok(None);
    }

    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map(Some)
        .map_err(|e| ProviderError::malformed(field, format!("'{raw}' is not a number: {e}")))
}

/// Parse a `"YYYY-MM-DD"` fiscal date.
///
/// # Errors
///
/// Returns [`ProviderError::MalformedResponse`] if the date is missing or invalid.
pub fn parse_fiscal_date(raw: &str) -> Result<NaiveDate, ProviderError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
        ProviderError::malformed("fiscalDateEnding", format!("'{raw}' is not a date: {e}"))
    })
}

/// Pick the report with the latest fiscal date.
///
/// Reports whose fiscal date does not parse are skipped. Returns `Ok(None)`
/// for an empty slice.
///
/// # Errors
///
/// Returns [`ProviderError::MalformedResponse`] if reports exist but none of
/// them carries a parsable fiscal date.
pub fn latest_report<R: AnnualReport>(reports: &[R]) -> Result<Option<(NaiveDate, &R)>, ProviderError> {
    let mut latest: Option<(NaiveDate, &R)> = None;
    let mut first_error = None;
    for report in reports {
        let date = match parse_fiscal_date(report.fiscal_date_ending()) {
            Ok(date) => date,
            Err(e) => {
                tracing::debug!(error = %e, "provider: skipping undated annual report");
                first_error.get_or_insert(e);
                continue;
            }
        };
        if latest.is_none_or(|(best, _)| date > best) {
            latest = Some((date, report));
        }
    }

    match (latest, first_error) {
        (None, Some(e)) => Err(e),
        (latest, _) => Ok(latest),
    }
}

impl AnnualReport for BalanceSheetReport {
    fn fiscal_date_ending(&self) -> &str {
        &self.fiscal_date_ending
    }

    fn line_items(&self) -> Result<StatementKind, ProviderError> {
        Ok(StatementKind::BalanceSheet(BalanceSheet {
            total_assets: parse_amount("totalAssets", self.total_assets.as_deref())?,
            current_assets: parse_amount(
                "totalCurrentAssets",
                self.total_current_assets.as_deref(),
            )?,
            non_current_assets: parse_amount(
                "totalNonCurrentAssets",
                self.total_non_current_assets.as_deref(),
            )?,
            total_liabilities: parse_amount(
                "totalLiabilities",
                self.total_liabilities.as_deref(),
            )?,
            current_liabilities: parse_amount(
                "totalCurrentLiabilities",
                self.total_current_liabilities.as_deref(),
            )?,
            non_current_liabilities: parse_amount(
                "totalNonCurrentLiabilities",
                self.total_non_current_liabilities.as_deref(),
            )?,
            total_equity: parse_amount(
                "totalShareholderEquity",
                self.total_shareholder_equity.as_deref(),
            )?,
        }))
    }
}

impl AnnualReport for IncomeStatementReport {
    fn fiscal_date_ending(&self) -> &str {
        &self.fiscal_date_ending
    }

    fn line_items(&self) -> Result<StatementKind, ProviderError> {
        Ok(StatementKind::IncomeStatement(IncomeStatement {
            revenue: parse_amount("totalRevenue", self.total_revenue.as_deref())?,
            cost_of_revenue: parse_amount("costOfRevenue", self.cost_of_revenue.as_deref())?,
            gross_profit: parse_amount("grossProfit", self.gross_profit.as_deref())?,
            operating_expenses: parse_amount(
                "operatingExpenses",
                self.operating_expenses.as_deref(),
            )?,
            operating_income: parse_amount("operatingIncome", self.operating_income.as_deref())?,
            net_income: parse_amount("netIncome", self.net_income.as_deref())?,
            earnings_per_share: parse_amount(
                "earningsPerShare",
                self.earnings_per_share.as_deref(),
            )?,
        }))
    }
}

impl AnnualReport for CashFlowReport {
    fn fiscal_date_ending(&self) -> &str {
        &self.fiscal_date_ending
    }

    fn line_items(&self) -> Result<StatementKind, ProviderError> {
        Ok(StatementKind::CashFlow(CashFlowStatement {
            operating_cash_flow: parse_amount(
                "operatingCashflow",
                self.operating_cashflow.as_deref(),
            )?,
            investing_cash_flow: parse_amount(
                "cashflowFromInvestment",
                self.cashflow_from_investment.as_deref(),
            )?,
            financing_cash_flow: parse_amount(
                "cashflowFromFinancing",
                self.cashflow_from_financing.as_deref(),
            )?,
            net_change_in_cash: parse_amount(
                "changeInCashAndCashEquivalents",
                self.change_in_cash_and_cash_equivalents.as_deref(),
            )?,
            capital_expenditures: parse_amount(
                "capitalExpenditures",
                self.capital_expenditures.as_deref(),
            )?,
            dividend_payout: parse_amount("dividendPayout", self.dividend_payout.as_deref())?,
        }))
    }
}
