use asxdb_core::StatementType;
use asxdb_db::DbError;
use thiserror::Error;

/// Why a provider fetch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    NotFound,
    RateLimited,
    MalformedResponse,
    TransportError,
}

impl std::fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FetchErrorKind::NotFound => "not_found",
            FetchErrorKind::RateLimited => "rate_limited",
            FetchErrorKind::MalformedResponse => "malformed_response",
            FetchErrorKind::TransportError => "transport_error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("unknown company: {0}")]
    UnknownCompany(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Why a cycle ended without doing any work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another cycle held the lock for the whole bounded wait.
    LockContention,
    EmptyRoster,
    RosterUnavailable,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SkipReason::LockContention => "lock_contention",
            SkipReason::EmptyRoster => "empty_roster",
            SkipReason::RosterUnavailable => "roster_unavailable",
        };
        f.write_str(label)
    }
}

/// A step that failed inside a cycle that otherwise ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleFailure {
    Fetch {
        statement_type: StatementType,
        company_code: String,
        kind: FetchErrorKind,
        message: String,
    },
    Persist {
        statement_type: StatementType,
        company_code: String,
        message: String,
    },
    TimestampWrite {
        company_code: String,
        message: String,
    },
}

impl std::fmt::Display for CycleFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleFailure::Fetch {
                statement_type,
                company_code,
                kind,
                message,
            } => write!(
                f,
                "fetch {statement_type} for {company_code} failed ({kind}): {message}"
            ),
            CycleFailure::Persist {
                statement_type,
                company_code,
                message,
            } => write!(f, "persist {statement_type} for {company_code} failed: {message}"),
            CycleFailure::TimestampWrite {
                company_code,
                message,
            } => write!(f, "timestamp write for {company_code} failed: {message}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PrioritizeError {
    #[error("invalid company code: {0}")]
    InvalidCode(String),

    #[error("no active company with code {0}")]
    UnknownCompany(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
