//! Seams between the scheduler and its collaborators.

use async_trait::async_trait;

use asxdb_core::{Company, Statement};

use crate::error::{FetchError, StoreError};

#[async_trait]
pub trait RosterStore: Send + Sync {
    /// All active companies, in no particular order.
    async fn list_active(&self) -> Result<Vec<Company>, StoreError>;

    /// Persist the company's `last_refreshed`.
    async fn save(&self, company: &Company) -> Result<(), StoreError>;

    async fn count_active(&self) -> Result<i64, StoreError> {
        let companies = self.list_active().await?;
        Ok(i64::try_from(companies.len()).unwrap_or(i64::MAX))
    }
}

#[async_trait]
pub trait StatementProvider: Send + Sync {
    async fn fetch_balance_sheet(&self, company_code: &str) -> Result<Statement, FetchError>;

    async fn fetch_income_statement(&self, company_code: &str) -> Result<Statement, FetchError>;

    async fn fetch_cash_flow(&self, company_code: &str) -> Result<Statement, FetchError>;
}

#[async_trait]
pub trait StatementStore: Send + Sync {
    /// Insert or replace the statement keyed by `(company_code, statement_date)`
    /// in the table selected by its variant.
    async fn upsert(&self, statement: &Statement) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: RosterStore + ?Sized> RosterStore for std::sync::Arc<T> {
    async fn list_active(&self) -> Result<Vec<Company>, StoreError> {
        (**self).list_active().await
    }

    async fn save(&self, company: &Company) -> Result<(), StoreError> {
        (**self).save(company).await
    }

    async fn count_active(&self) -> Result<i64, StoreError> {
        (**self).count_active().await
    }
}

#[async_trait]
impl<T: StatementProvider + ?Sized> StatementProvider for std::sync::Arc<T> {
    async fn fetch_balance_sheet(&self, company_code: &str) -> Result<Statement, FetchError> {
        (**self).fetch_balance_sheet(company_code).await
    }

    async fn fetch_income_statement(&self, company_code: &str) -> Result<Statement, FetchError> {
        (**self).fetch_income_statement(company_code).await
    }

    async fn fetch_cash_flow(&self, company_code: &str) -> Result<Statement, FetchError> {
        (**self).fetch_cash_flow(company_code).await
    }
}

#[async_trait]
impl<T: StatementStore + ?Sized> StatementStore for std::sync::Arc<T> {
    async fn upsert(&self, statement: &Statement) -> Result<(), StoreError> {
        (**self).upsert(statement).await
    }
}
