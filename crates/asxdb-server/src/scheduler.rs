//! Background job scheduler.
//!
//! Registers the recurring scrape job on a [`JobScheduler`] at server startup.

use std::sync::Arc;

use asxdb_scheduler::{
    CycleOutcome, CycleResult, RosterStore, Scheduler, StatementProvider, StatementStore,
};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive for
/// the lifetime of the process; dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised, the
/// cron expression is rejected, or the scheduler fails to start.
pub async fn build_scheduler<R, P, S>(
    scrape: Arc<Scheduler<R, P, S>>,
    cron: &str,
) -> Result<JobScheduler, JobSchedulerError>
where
    R: RosterStore + 'static,
    P: StatementProvider + 'static,
    S: StatementStore + 'static,
{
    let scheduler = JobScheduler::new().await?;
    register_scrape_job(&scheduler, scrape, cron).await?;
    scheduler.start().await?;
    tracing::info!(schedule = %cron, "scheduler: scrape job registered");
    Ok(scheduler)
}

/// Register the staleness-ordered scrape job on `cron` (six-field, with seconds).
async fn register_scrape_job<R, P, S>(
    scheduler: &JobScheduler,
    scrape: Arc<Scheduler<R, P, S>>,
    cron: &str,
) -> Result<(), JobSchedulerError>
where
    R: RosterStore + 'static,
    P: StatementProvider + 'static,
    S: StatementStore + 'static,
{
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let scrape = Arc::clone(&scrape);

        Box::pin(async move {
            tracing::info!("scheduler: scrape timer fired");
            run_scheduled_cycle(&scrape).await;
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// Run one cycle and log its outcome and the remaining queue length.
pub async fn run_scheduled_cycle<R, P, S>(scrape: &Scheduler<R, P, S>) -> CycleResult
where
    R: RosterStore,
    P: StatementProvider,
    S: StatementStore,
{
    let result = scrape.run_cycle().await;
    log_cycle_result(&result);

    let queue_length = scrape.queue_length().await;
    tracing::info!(queue_length, "scheduler: companies in rotation");

    result
}

fn log_cycle_result(result: &CycleResult) {
    match &result.outcome {
        CycleOutcome::Completed(report) if result.success => tracing::info!(
            company = %report.company_code,
            persisted = report.persisted_count(),
            failures = report.failures.len(),
            "scheduler: scrape cycle updated statements"
        ),
        CycleOutcome::Completed(report) => tracing::warn!(
            company = %report.company_code,
            failures = report.failures.len(),
            "scheduler: scrape cycle produced no updates"
        ),
        CycleOutcome::Skipped(reason) => {
            tracing::warn!(reason = %reason, "scheduler: scrape cycle skipped");
        }
        CycleOutcome::Panicked => tracing::error!("scheduler: scrape cycle panicked"),
    }
}
