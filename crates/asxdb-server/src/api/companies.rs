//! Roster and statement read endpoints, plus roster sync.

use asxdb_core::{normalize_code, Company, Statement, StatementType};
use asxdb_db::RosterSyncSummary;
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize, Default)]
pub(super) struct CompanyListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Deserialize, Default)]
pub(super) struct StatementListQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct RosterSyncData {
    pub inserted: usize,
    pub updated: usize,
    pub deactivated: usize,
}

impl From<RosterSyncSummary> for RosterSyncData {
    fn from(summary: RosterSyncSummary) -> Self {
        Self {
            inserted: summary.inserted,
            updated: summary.updated,
            deactivated: summary.deactivated,
        }
    }
}

fn parse_code(req_id: &RequestId, raw: &str) -> Result<String, ApiError> {
    normalize_code(raw).map_err(|e| ApiError::new(req_id.0.clone(), "bad_request", e.to_string()))
}

pub(super) async fn list_companies(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<CompanyListQuery>,
) -> Result<Json<ApiResponse<Vec<Company>>>, ApiError> {
    let rows = asxdb_db::list_companies(&state.pool, query.include_inactive)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(Company::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_company(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<Company>>, ApiError> {
    let code = parse_code(&req_id, &code)?;
    let row = asxdb_db::get_company_by_code(&state.pool, &code)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "not_found",
                format!("company {code} not found"),
            )
        })?;

    Ok(Json(ApiResponse {
        data: Company::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_company_statements(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((code, statement_type)): Path<(String, String)>,
    Query(query): Query<StatementListQuery>,
) -> Result<Json<ApiResponse<Vec<Statement>>>, ApiError> {
    let code = parse_code(&req_id, &code)?;
    let statement_type: StatementType = statement_type
        .parse()
        .map_err(|e: asxdb_core::CoreError| {
            ApiError::new(req_id.0.clone(), "bad_request", e.to_string())
        })?;

    let exists = asxdb_db::get_company_by_code(&state.pool, &code)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .is_some();
    if !exists {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("company {code} not found"),
        ));
    }

    let statements = asxdb_db::list_statements(
        &state.pool,
        &code,
        statement_type,
        normalize_limit(query.limit),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: statements,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Re-read the roster file and reconcile the `companies` table with it.
pub(super) async fn sync_companies(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<RosterSyncData>>, ApiError> {
    let roster = asxdb_core::load_roster(&state.config.roster_path).map_err(|e| {
        tracing::error!(error = %e, path = %state.config.roster_path.display(), "roster load failed");
        ApiError::new(req_id.0.clone(), "validation_error", e.to_string())
    })?;

    let summary = asxdb_db::sync_roster(&state.pool, &roster.companies)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    tracing::info!(
        inserted = summary.inserted,
        updated = summary.updated,
        deactivated = summary.deactivated,
        "roster sync complete"
    );

    Ok(Json(ApiResponse {
        data: summary.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}
