// src/lib.rs
//! Timesheet analysis: parse a scraped attendance grid, join it with tracked
//! time entries and report daily/weekly hours against a daily target.
//!
//! ```text
//! markup ─ parse_timesheet ─┐
//!                           ├─ analyze ─ ResultBundle ─ export / detail_by_date
//! raw entries ─ normalize ──┘
//! ```

pub mod analysis;
pub mod config;
pub mod detail;
pub mod duration;
pub mod error;
pub mod export;
pub mod external;
pub mod markup;
pub mod timesheet;

mod analysis_tests;

pub use analysis::{analyze, DailyAggregate, ResultBundle, Summary, WeekKey, WeeklyAggregate};
pub use config::AnalysisConfig;
pub use detail::{format_detail, DetailEntry, NO_DETAILS};
pub use duration::{format_hours, format_hours_minutes, format_signed_hours, parse_duration};
pub use error::{Result, TimesheetError};
pub use external::{normalize_entries, ExternalTimeRecord, RawTimeEntry};
pub use timesheet::{parse_timesheet, parse_timesheet_lenient, AttendanceRecord, ParsedTimesheet};

/// Runs the whole pipeline on already-fetched inputs.
///
/// Malformed attendance rows either abort the run or are skipped, depending on
/// `config.skip_malformed_rows`. A bad tracked-time duration always aborts.
pub fn run_analysis(
    markup: &str,
    entries: Option<&[RawTimeEntry]>,
    config: &AnalysisConfig,
) -> Result<(ResultBundle, Vec<TimesheetError>)> {
    let (attendance, skipped) = if config.skip_malformed_rows {
        let parsed = parse_timesheet_lenient(markup);
        (parsed.records, parsed.skipped)
    } else {
        (parse_timesheet(markup)?, Vec::new())
    };

    let external = entries.map(normalize_entries).transpose()?;
    let bundle = analyze(&attendance, config.daily_target_hours, external.as_deref())?;
    Ok((bundle, skipped))
}
