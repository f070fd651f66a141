//! Postgres and Alpha Vantage implementations of the scheduler ports.

use async_trait::async_trait;
use sqlx::PgPool;

use asxdb_core::{Company, Statement};
use asxdb_db::DbError;
use asxdb_provider::{AlphaVantageClient, ProviderError};

use crate::error::{FetchError, FetchErrorKind, StoreError};
use crate::lock::CycleLock;
use crate::ports::{RosterStore, StatementProvider, StatementStore};
use crate::scheduler::Scheduler;

/// The production scheduler: Postgres roster and statements, Alpha Vantage
/// fetches.
pub type PgScheduler = Scheduler<PgRosterStore, AlphaVantageClient, PgStatementStore>;

impl PgScheduler {
    #[must_use]
    pub fn postgres(pool: PgPool, provider: AlphaVantageClient, lock: CycleLock) -> Self {
        Scheduler::new(
            PgRosterStore::new(pool.clone()),
            provider,
            PgStatementStore::new(pool),
            lock,
        )
    }
}

#[derive(Debug, Clone)]
pub struct PgRosterStore {
    pool: PgPool,
}

impl PgRosterStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RosterStore for PgRosterStore {
    async fn list_active(&self) -> Result<Vec<Company>, StoreError> {
        let rows = asxdb_db::list_active_companies(&self.pool).await?;
        Ok(rows.into_iter().map(Company::from).collect())
    }

    async fn save(&self, company: &Company) -> Result<(), StoreError> {
        asxdb_db::update_company_last_refreshed(&self.pool, &company.code, company.last_refreshed)
            .await
            .map_err(|e| match e {
                DbError::NotFound => StoreError::UnknownCompany(company.code.clone()),
                other => StoreError::Db(other),
            })
    }

    async fn count_active(&self) -> Result<i64, StoreError> {
        Ok(asxdb_db::count_active_companies(&self.pool).await?)
    }
}

#[derive(Debug, Clone)]
pub struct PgStatementStore {
    pool: PgPool,
}

impl PgStatementStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatementStore for PgStatementStore {
    async fn upsert(&self, statement: &Statement) -> Result<(), StoreError> {
        asxdb_db::upsert_statement(&self.pool, statement).await?;
        Ok(())
    }
}

impl From<ProviderError> for FetchError {
    fn from(err: ProviderError) -> Self {
        let kind = match &err {
            ProviderError::NotFound { .. } => FetchErrorKind::NotFound,
            ProviderError::RateLimited { .. } => FetchErrorKind::RateLimited,
            ProviderError::MalformedResponse { .. } => FetchErrorKind::MalformedResponse,
            ProviderError::Transport(_) | ProviderError::InvalidBaseUrl(_) => {
                FetchErrorKind::TransportError
            }
        };
        FetchError::new(kind, err.to_string())
    }
}

#[async_trait]
impl StatementProvider for AlphaVantageClient {
    async fn fetch_balance_sheet(&self, company_code: &str) -> Result<Statement, FetchError> {
        Ok(AlphaVantageClient::fetch_balance_sheet(self, company_code).await?)
    }

    async fn fetch_income_statement(&self, company_code: &str) -> Result<Statement, FetchError> {
        Ok(AlphaVantageClient::fetch_income_statement(self, company_code).await?)
    }

    async fn fetch_cash_flow(&self, company_code: &str) -> Result<Statement, FetchError> {
        Ok(AlphaVantageClient::fetch_cash_flow(self, company_code).await?)
    }
}
