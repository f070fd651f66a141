use asxdb_core::CompanyConfig;
use sqlx::PgPool;

use crate::DbError;

/// Counts reported by [`sync_roster`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RosterSyncSummary {
    pub inserted: usize,
    pub updated: usize,
    pub deactivated: usize,
}

/// Make the `companies` table match an observed roster.
///
/// Observed codes are inserted (with the never-refreshed timestamp) or have
/// their name, industry and `is_active` flag refreshed; `last_refreshed` of an
/// existing row is left alone. Active codes missing from `companies` are
/// soft-deleted. An empty input leaves every row as it is.
///
/// Runs in a single transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; nothing is committed.
pub async fn sync_roster(
    pool: &PgPool,
    companies: &[CompanyConfig],
) -> Result<RosterSyncSummary, DbError> {
    let mut summary = RosterSyncSummary::default();
    if companies.is_empty() {
        return Ok(summary);
    }

    let mut tx = pool.begin().await?;

    for company in companies {
        let inserted: bool = sqlx::query_scalar(
            "INSERT INTO companies (code, name, industry, is_active) \
             VALUES ($1, $2, $3, true) \
             ON CONFLICT (code) DO UPDATE SET \
                 name = EXCLUDED.name, \
                 industry = EXCLUDED.industry, \
                 is_active = true, \
                 updated_at = NOW() \
             RETURNING (xmax = 0)",
        )
        .bind(&company.code)
        .bind(&company.name)
        .bind(&company.industry)
        .fetch_one(&mut *tx)
        .await?;

        if inserted {
            summary.inserted += 1;
        } else {
            summary.updated += 1;
        }
    }

    let observed: Vec<String> = companies.iter().map(|c| c.code.clone()).collect();
    let deactivated = sqlx::query(
        "UPDATE companies \
         SET is_active = false, updated_at = NOW() \
         WHERE is_active = true AND code != ALL($1::text[])",
    )
    .bind(&observed)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    tx.commit().await?;

    summary.deactivated = usize::try_from(deactivated).unwrap_or(usize::MAX);
    Ok(summary)
}
