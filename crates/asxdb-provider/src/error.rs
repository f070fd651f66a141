use thiserror::Error;

/// Errors returned by the Alpha Vantage client.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider has no annual reports for the symbol (HTTP 404, an
    /// `"Error Message"` body, or an empty `annualReports` list).
    #[error("no data for symbol {symbol}")]
    NotFound { symbol: String },

    /// HTTP 429, or a `"Note"`/`"Information"` body signalling the call quota.
    #[error("rate limited: {message}")]
    RateLimited { message: String },

    /// The body arrived but could not be turned into a statement.
    #[error("malformed response for {context}: {reason}")]
    MalformedResponse { context: String, reason: String },

    /// Network, TLS, timeout or an unexpected non-2xx status.
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

impl ProviderError {
    pub(crate) fn malformed(context: impl Into<String>, reason: impl ToString) -> Self {
        Self::MalformedResponse {
            context: context.into(),
            reason: reason.to_string(),
        }
    }
}
