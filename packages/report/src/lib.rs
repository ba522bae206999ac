#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Report engine for the aviation accident dataset.
//!
//! Every report in the catalog is a declarative filter → derive → group →
//! aggregate → sort → limit pipeline described by an embedded TOML
//! definition. [`run_report`] looks a report up by name and executes it
//! over a slice of records; [`runner::run_catalog`] runs the whole catalog
//! concurrently.

pub mod definition;
pub mod pipeline;
pub mod registry;
pub mod runner;

use std::time::Duration;

use crash_reports_accident_models::AccidentRecord;
use crash_reports_report_models::{ReportName, ReportOutput};
use thiserror::Error;

use crate::pipeline::Pipeline;

/// Errors that can occur while running a report.
///
/// Per-record parse failures are not errors at this level: the record is
/// skipped and counted in [`ReportOutput::skipped`].
#[derive(Debug, Error)]
pub enum ReportError {
    /// The requested report is not in the catalog.
    #[error("Unknown report '{name}'")]
    UnknownReport {
        /// Name as given by the caller.
        name: String,
    },

    /// A catalog definition cannot be executed.
    #[error("Invalid definition for {report}: {message}")]
    Definition {
        /// Affected report.
        report: ReportName,
        /// Description of what went wrong.
        message: String,
    },

    /// The report did not finish within the allotted time.
    #[error("Report {report} timed out after {timeout:?}")]
    Timeout {
        /// Affected report.
        report: ReportName,
        /// Limit that was exceeded.
        timeout: Duration,
    },

    /// The blocking task running the report failed.
    #[error("Report task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Runs the report called `name` over `records`.
///
/// The name is resolved before any record is read, so an unknown name never
/// touches the data.
///
/// # Errors
///
/// Returns [`ReportError::UnknownReport`] if `name` is not a catalog id, or
/// [`ReportError::Definition`] if its definition cannot be executed.
pub fn run_report<'r, I>(name: &str, records: I) -> Result<ReportOutput, ReportError>
where
    I: IntoIterator<Item = &'r AccidentRecord>,
{
    let report: ReportName = name.parse().map_err(|_| ReportError::UnknownReport {
        name: name.to_string(),
    })?;
    run(report, records)
}

/// Runs `report` over `records`.
///
/// # Errors
///
/// Returns [`ReportError`] if the report has no usable definition.
pub fn run<'r, I>(report: ReportName, records: I) -> Result<ReportOutput, ReportError>
where
    I: IntoIterator<Item = &'r AccidentRecord>,
{
    let definition = registry::definition(report).ok_or_else(|| ReportError::UnknownReport {
        name: report.to_string(),
    })?;
    Ok(Pipeline::new(definition)?.run(records))
}
