//! On-demand scrape trigger and scheduler status.

use asxdb_scheduler::{CycleOutcome, CycleResult, PrioritizeError};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize, Default)]
pub(super) struct ScrapeQuery {
    pub company_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct ScrapeData {
    pub company_code: String,
    pub success: bool,
    pub skipped: bool,
    pub skip_reason: Option<String>,
    /// Company the cycle actually scraped; differs from `company_code` only
    /// when another company was rewound at the same time.
    pub scraped_company: Option<String>,
    pub persisted: Vec<String>,
    pub failures: Vec<String>,
}

impl ScrapeData {
    pub(super) fn from_cycle(company_code: String, result: &CycleResult) -> Self {
        let report = result.report();
        Self {
            company_code,
            success: result.success,
            skipped: result.skip_reason().is_some(),
            skip_reason: result.skip_reason().map(|r| r.to_string()),
            scraped_company: report.map(|r| r.company_code.clone()),
            persisted: report
                .map(|r| r.persisted.iter().map(ToString::to_string).collect())
                .unwrap_or_default(),
            failures: match &result.outcome {
                CycleOutcome::Completed(r) => r.failures.iter().map(ToString::to_string).collect(),
                CycleOutcome::Panicked => vec!["cycle panicked".to_string()],
                CycleOutcome::Skipped(_) => Vec::new(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ScrapeStatusData {
    pub status: &'static str,
    pub queue_length: i64,
    pub schedule: String,
    pub timestamp: DateTime<Utc>,
}

/// Rewind the requested company to the front of the queue, then run a cycle.
///
/// The rewind is written before the cycle starts, so a cycle skipped for lock
/// contention still leaves the company next in line.
pub(super) async fn trigger_scrape(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ScrapeQuery>,
) -> Result<Json<ApiResponse<ScrapeData>>, ApiError> {
    let Some(raw_code) = query.company_code.filter(|c| !c.trim().is_empty()) else {
        return Err(ApiError::new(
            req_id.0,
            "bad_request",
            "company_code query parameter is required",
        ));
    };

    let rewind = TimeDelta::days(i64::from(state.config.force_rewind_days));
    let company = state
        .scheduler
        .prioritize(&raw_code, rewind)
        .await
        .map_err(|e| match e {
            PrioritizeError::InvalidCode(_) => {
                ApiError::new(req_id.0.clone(), "bad_request", e.to_string())
            }
            PrioritizeError::UnknownCompany(_) => {
                ApiError::new(req_id.0.clone(), "not_found", e.to_string())
            }
            PrioritizeError::Store(store) => {
                tracing::error!(error = %store, "scrape: failed to prioritize company");
                ApiError::new(req_id.0.clone(), "internal_error", "roster store unavailable")
            }
        })?;

    tracing::info!(company = %company.code, "scrape: on-demand cycle requested");
    let result = state.scheduler.run_cycle().await;

    Ok(Json(ApiResponse {
        data: ScrapeData::from_cycle(company.code, &result),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn scrape_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<ScrapeStatusData>> {
    let status = if state.scheduler.lock().is_busy() {
        "running"
    } else {
        "idle"
    };

    Json(ApiResponse {
        data: ScrapeStatusData {
            status,
            queue_length: state.scheduler.queue_length().await,
            schedule: state.config.scrape_cron.clone(),
            timestamp: Utc::now(),
        },
        meta: ResponseMeta::new(req_id.0),
    })
}
