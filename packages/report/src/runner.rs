//! Concurrent execution of the whole report catalog.
//!
//! Reports are pure scans over an immutable snapshot, so each one runs on
//! the `tokio` blocking pool against a shared `Arc<[AccidentRecord]>`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crash_reports_accident_models::AccidentRecord;
use crash_reports_report_models::{ReportName, ReportOutput};

use crate::ReportError;

/// Runs a single report on the blocking pool, optionally bounded by
/// `timeout`.
///
/// A timed-out report keeps running to completion in the background; only
/// its result is discarded.
///
/// # Errors
///
/// Returns [`ReportError::Timeout`] if the report exceeds `timeout`,
/// [`ReportError::Join`] if the task panicked, or any error from
/// [`crate::run`].
pub async fn run_blocking(
    report: ReportName,
    records: Arc<[AccidentRecord]>,
    timeout: Option<Duration>,
) -> Result<ReportOutput, ReportError> {
    let task = tokio::task::spawn_blocking(move || crate::run(report, records.iter()));

    match timeout {
        Some(limit) => match tokio::time::timeout(limit, task).await {
            Ok(joined) => joined?,
            Err(_) => Err(ReportError::Timeout {
                report,
                timeout: limit,
            }),
        },
        None => task.await?,
    }
}

/// Runs every report in the catalog concurrently.
///
/// Results are returned in catalog order, one per report, each carrying its
/// own success or failure.
pub async fn run_catalog(
    records: Arc<[AccidentRecord]>,
    timeout: Option<Duration>,
) -> Vec<(ReportName, Result<ReportOutput, ReportError>)> {
    let start = Instant::now();
    log::info!(
        "Running {} reports over {} records",
        ReportName::all().len(),
        records.len()
    );

    let tasks = ReportName::all().iter().map(|&report| {
        let records = Arc::clone(&records);
        async move { (report, run_blocking(report, records, timeout).await) }
    });
    let results = futures::future::join_all(tasks).await;

    let failed = results.iter().filter(|(_, r)| r.is_err()).count();
    if failed > 0 {
        log::warn!("{failed} reports failed");
    }
    log::info!("Catalog finished in {:.2?}", start.elapsed());

    results
}
