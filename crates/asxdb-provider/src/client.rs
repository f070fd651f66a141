//! HTTP client for the Alpha Vantage fundamentals endpoints.
//!
//! Wraps `reqwest` with provider-specific response classification. Every
//! fetch returns the latest annual report for one company as a
//! [`Statement`]; quota notices, unknown symbols and undecodable bodies are
//! surfaced as distinct [`ProviderError`] variants.

use std::time::Duration;

use asxdb_core::{Statement, StatementType};
use chrono::Utc;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::ProviderError;
use crate::parse::{latest_report, AnnualReport};
use crate::types::{
    BalanceSheetReport, CashFlowReport, FundamentalsResponse, IncomeStatementReport,
};

const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

/// Client for the Alpha Vantage REST API.
///
/// Use [`AlphaVantageClient::new`] for production or
/// [`AlphaVantageClient::with_base_url`] to point at a mock server in tests.
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
    base_url: Url,
    symbol_suffix: String,
}

impl AlphaVantageClient {
    /// Creates a new client pointed at the production Alpha Vantage API.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Transport`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        api_key: &str,
        timeout_secs: u64,
        user_agent: &str,
        symbol_suffix: &str,
    ) -> Result<Self, ProviderError> {
        Self::with_base_url(
            api_key,
            timeout_secs,
            user_agent,
            symbol_suffix,
            DEFAULT_BASE_URL,
        )
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Transport`] if the `reqwest::Client` cannot be
    /// constructed, or [`ProviderError::InvalidBaseUrl`] if `base_url` does not
    /// parse.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        user_agent: &str,
        symbol_suffix: &str,
        base_url: &str,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // The production endpoint lives at a path (`/query`); only a trailing
        // slash is stripped so the path survives.
        let trimmed = base_url.trim_end_matches('/');
        let parsed = Url::parse(trimmed)
            .map_err(|e| ProviderError::InvalidBaseUrl(format!("'{base_url}': {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url: parsed,
            symbol_suffix: symbol_suffix.to_owned(),
        })
    }

    /// Builds a client from application config.
    ///
    /// # Errors
    ///
    /// See [`AlphaVantageClient::with_base_url`].
    pub fn from_app_config(config: &asxdb_core::AppConfig) -> Result<Self, ProviderError> {
        Self::with_base_url(
            &config.alpha_vantage_api_key,
            config.provider_request_timeout_secs,
            &config.provider_user_agent,
            &config.symbol_suffix,
            &config.alpha_vantage_base_url,
        )
    }

    /// Fetches the latest annual balance sheet for a company.
    ///
    /// # Errors
    ///
    /// See [`AlphaVantageClient::fetch_statement`].
    pub async fn fetch_balance_sheet(&self, company_code: &str) -> Result<Statement, ProviderError> {
        self.fetch_latest::<BalanceSheetReport>(company_code, StatementType::BalanceSheet)
            .await
    }

    /// Fetches the latest annual income statement for a company.
    ///
    /// # Errors
    ///
    /// See [`AlphaVantageClient::fetch_statement`].
    pub async fn fetch_income_statement(
        &self,
        company_code: &str,
    ) -> Result<Statement, ProviderError> {
        self.fetch_latest::<IncomeStatementReport>(company_code, StatementType::IncomeStatement)
            .await
    }

    /// Fetches the latest annual cash-flow statement for a company.
    ///
    /// # Errors
    ///
    /// See [`AlphaVantageClient::fetch_statement`].
    pub async fn fetch_cash_flow(&self, company_code: &str) -> Result<Statement, ProviderError> {
        self.fetch_latest::<CashFlowReport>(company_code, StatementType::CashFlow)
            .await
    }

    /// Fetches the latest annual report of the given type for a company.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::RateLimited`] on HTTP 429 or a quota notice body.
    /// - [`ProviderError::NotFound`] on HTTP 404, an `"Error Message"` body or
    ///   no annual reports.
    /// - [`ProviderError::MalformedResponse`] if the body, a fiscal date or an
    ///   amount cannot be parsed.
    /// - [`ProviderError::Transport`] on network failure or another non-2xx status.
    pub async fn fetch_statement(
        &self,
        company_code: &str,
        statement_type: StatementType,
    ) -> Result<Statement, ProviderError> {
        match statement_type {
            StatementType::BalanceSheet => self.fetch_balance_sheet(company_code).await,
            StatementType::IncomeStatement => self.fetch_income_statement(company_code).await,
            StatementType::CashFlow => self.fetch_cash_flow(company_code).await,
        }
    }

    async fn fetch_latest<R>(
        &self,
        company_code: &str,
        statement_type: StatementType,
    ) -> Result<Statement, ProviderError>
    where
        R: AnnualReport + DeserializeOwned,
    {
        let symbol = self.symbol(company_code);
        let function = function_name(statement_type);
        let source_url = self.build_url(function, &symbol, false);
        let request_url = self.build_url(function, &symbol, true);

        tracing::debug!(
            company = %company_code,
            statement_type = %statement_type,
            "provider: requesting {function}"
        );

        let body = self.request_json(&request_url, &symbol).await?;
        check_provider_notice(&body, &symbol)?;

        let envelope: FundamentalsResponse<R> = serde_json::from_value(body)
            .map_err(|e| ProviderError::malformed(format!("{function}({symbol})"), e))?;

        let Some((statement_date, report)) = latest_report(&envelope.annual_reports)? else {
            return Err(ProviderError::NotFound { symbol });
        };
        let kind = report.line_items()?;

        tracing::info!(
            company = %company_code,
            statement_type = %statement_type,
            %statement_date,
            "provider: fetched latest annual report"
        );

        Ok(Statement {
            company_code: company_code.to_owned(),
            statement_date,
            source_url: source_url.to_string(),
            created_at: Utc::now(),
            kind,
        })
    }

    fn symbol(&self, company_code: &str) -> String {
        format!("{company_code}{}", self.symbol_suffix)
    }

    /// Builds the request URL with percent-encoded query parameters.
    ///
    /// The API key is appended only when `with_key` is set, so the keyless form
    /// can be stored as provenance.
    fn build_url(&self, function: &str, symbol: &str, with_key: bool) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("function", function);
            pairs.append_pair("symbol", symbol);
            if with_key {
                pairs.append_pair("apikey", &self.api_key);
            }
        }
        url
    }

    /// Sends a GET request, classifies the HTTP status, and parses the body as
    /// JSON.
    async fn request_json(&self, url: &Url, symbol: &str) -> Result<serde_json::Value, ProviderError> {
        let response = self.client.get(url.clone()).send().await?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(ProviderError::RateLimited {
                    message: "HTTP 429 Too Many Requests".to_string(),
                });
            }
            StatusCode::NOT_FOUND => {
                return Err(ProviderError::NotFound {
                    symbol: symbol.to_owned(),
                });
            }
            _ => {}
        }

        let response = response.error_for_status()?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ProviderError::malformed(symbol, e))
    }
}

fn function_name(statement_type: StatementType) -> &'static str {
    match statement_type {
        StatementType::BalanceSheet => "BALANCE_SHEET",
        StatementType::IncomeStatement => "INCOME_STATEMENT",
        StatementType::CashFlow => "CASH_FLOW",
    }
}

/// Alpha Vantage answers quota and lookup failures with HTTP 200 and a
/// single-key body; map those to typed errors.
fn check_provider_notice(body: &serde_json::Value, symbol: &str) -> Result<(), ProviderError> {
    if !body.is_object() {
        return Err(ProviderError::malformed(symbol, "expected a JSON object"));
    }

    for key in ["Note", "Information"] {
        if let Some(message) = body.get(key).and_then(serde_json::Value::as_str) {
            return Err(ProviderError::RateLimited {
                message: message.to_string(),
            });
        }
    }

    if body.get("Error Message").is_some() {
        return Err(ProviderError::NotFound {
            symbol: symbol.to_owned(),
        });
    }

    Ok(())
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
