//! Database operations for the `companies` table.

use asxdb_core::Company;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `companies` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CompanyRow {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub industry: String,
    pub last_refreshed: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CompanyRow> for Company {
    fn from(row: CompanyRow) -> Self {
        Self {
            code: row.code,
            name: row.name,
            industry: row.industry,
            last_refreshed: row.last_refreshed,
            is_active: row.is_active,
        }
    }
}

const COMPANY_COLUMNS: &str =
    "id, code, name, industry, last_refreshed, is_active, created_at, updated_at";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns all active companies, stalest first (`last_refreshed`, then `code`).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_companies(pool: &PgPool) -> Result<Vec<CompanyRow>, DbError> {
    let rows = sqlx::query_as::<_, CompanyRow>(&format!(
        "SELECT {COMPANY_COLUMNS} \
         FROM companies \
         WHERE is_active = true \
         ORDER BY last_refreshed, code"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns companies ordered by code, optionally including soft-deleted ones.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_companies(
    pool: &PgPool,
    include_inactive: bool,
) -> Result<Vec<CompanyRow>, DbError> {
    let rows = sqlx::query_as::<_, CompanyRow>(&format!(
        "SELECT {COMPANY_COLUMNS} \
         FROM companies \
         WHERE is_active = true OR $1 \
         ORDER BY code"
    ))
    .bind(include_inactive)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single active company by code, or `None` if not found.
///
/// The code is matched case-insensitively by uppercasing it first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_company_by_code(pool: &PgPool, code: &str) -> Result<Option<CompanyRow>, DbError> {
    let row = sqlx::query_as::<_, CompanyRow>(&format!(
        "SELECT {COMPANY_COLUMNS} \
         FROM companies \
         WHERE code = $1 AND is_active = true"
    ))
    .bind(code.trim().to_ascii_uppercase())
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns the number of active companies.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_active_companies(pool: &PgPool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM companies WHERE is_active = true")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Sets `last_refreshed` for the company with the given code.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no company has that code, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_company_last_refreshed(
    pool: &PgPool,
    code: &str,
    last_refreshed: DateTime<Utc>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE companies \
         SET last_refreshed = $1, updated_at = NOW() \
         WHERE code = $2",
    )
    .bind(last_refreshed)
    .bind(code)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}
