// src/timesheet.rs
use chrono::{NaiveDate, NaiveTime, Timelike};
use rust_decimal::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Result, TimesheetError};
use crate::markup;

// --- Column Layout ---

// The attendance grid is positional; header text is never consulted.
const COL_DATE: usize = 0;
const COL_FIRST_IN: usize = 1;
const COL_LAST_OUT: usize = 2;
const COL_CLOCK_IN: usize = 3;
const COL_CLOCK_OUT: usize = 4;
const COL_TOTAL_HOURS: usize = 5;
const COLUMN_COUNT: usize = 6;

const COLUMN_NAMES: [&str; COLUMN_COUNT] = [
    "date",
    "first_in",
    "last_out",
    "clock_in",
    "clock_out",
    "total_hours",
];

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y", "%d-%b-%Y", "%b %d, %Y"];
const TIME_FORMATS: [&str; 2] = ["%H:%M", "%H:%M:%S"];

// --- Core Data Structures ---

/// One body row of the attendance grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceRecord {
    pub date: NaiveDate,
    pub first_in: Option<NaiveTime>,
    pub last_out: Option<NaiveTime>,
    /// `00:00` on the punch columns means "no punch", so it is stored as `None`.
    pub clock_in: Option<NaiveTime>,
    pub clock_out: Option<NaiveTime>,
    pub hours_worked: Decimal,
}

/// Result of a lenient parse: the rows that parsed plus the ones that were skipped.
#[derive(Debug, Default)]
pub struct ParsedTimesheet {
    pub records: Vec<AttendanceRecord>,
    pub skipped: Vec<TimesheetError>,
}

// --- Parsing ---

/// Parses the attendance table, aborting on the first malformed row.
///
/// The first `<tr>` is the header and is discarded. Records come back sorted
/// by date, most recent first; rows sharing a date keep their source order.
pub fn parse_timesheet(markup: &str) -> Result<Vec<AttendanceRecord>> {
    let mut records = markup::table_rows(markup)
        .into_iter()
        .skip(1)
        .enumerate()
        .map(|(idx, row)| parse_row(idx + 1, &markup::row_cells(row)))
        .collect::<Result<Vec<_>>>()?;

    debug!("Parsed {} attendance rows", records.len());
    sort_most_recent_first(&mut records);
    Ok(records)
}

/// Parses the attendance table, skipping malformed rows instead of failing.
pub fn parse_timesheet_lenient(markup: &str) -> ParsedTimesheet {
    let mut parsed = ParsedTimesheet::default();

    for (idx, row) in markup::table_rows(markup).into_iter().skip(1).enumerate() {
        match parse_row(idx + 1, &markup::row_cells(row)) {
            Ok(record) => parsed.records.push(record),
            Err(e) => {
                warn!("Skipping attendance row: {}", e);
                parsed.skipped.push(e);
            }
        }
    }

    debug!(
        "Parsed {} attendance rows, skipped {}",
        parsed.records.len(),
        parsed.skipped.len()
    );
    sort_most_recent_first(&mut parsed.records);
    parsed
}

fn sort_most_recent_first(records: &mut [AttendanceRecord]) {
    records.sort_by(|a, b| b.date.cmp(&a.date));
}

fn parse_row(row: usize, cells: &[String]) -> Result<AttendanceRecord> {
    if cells.len() < COLUMN_COUNT {
        return Err(TimesheetError::malformed_record(
            row,
            COLUMN_NAMES[cells.len()],
            format!("expected {} cells, found {}", COLUMN_COUNT, cells.len()),
        ));
    }

    Ok(AttendanceRecord {
        date: parse_date(row, &cells[COL_DATE])?,
        first_in: parse_presence_time(row, COL_FIRST_IN, &cells[COL_FIRST_IN])?,
        last_out: parse_presence_time(row, COL_LAST_OUT, &cells[COL_LAST_OUT])?,
        clock_in: parse_punch_time(row, COL_CLOCK_IN, &cells[COL_CLOCK_IN])?,
        clock_out: parse_punch_time(row, COL_CLOCK_OUT, &cells[COL_CLOCK_OUT])?,
        hours_worked: parse_total_hours(row, &cells[COL_TOTAL_HOURS])?,
    })
}

fn parse_date(row: usize, raw: &str) -> Result<NaiveDate> {
    let text = raw.trim();
    try_date_formats(text)
        .or_else(|| strip_weekday_prefix(text).and_then(try_date_formats))
        .ok_or_else(|| {
            TimesheetError::malformed_record(
                row,
                COLUMN_NAMES[COL_DATE],
                format!("unrecognised date '{}'", text),
            )
        })
}

fn try_date_formats(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

// "Tue 01/14/2025" -> "01/14/2025"
fn strip_weekday_prefix(text: &str) -> Option<&str> {
    let (head, rest) = text.split_once(char::is_whitespace)?;
    let head = head.trim_end_matches([',', '.']);
    if head.len() >= 2 && head.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(rest.trim_start())
    } else {
        None
    }
}

// Blank or whitespace-padded cells mean the presence column is empty.
fn parse_presence_time(row: usize, col: usize, raw: &str) -> Result<Option<NaiveTime>> {
    let text = raw.trim();
    if text.is_empty() {
        return Ok(None);
    }
    parse_time(text)
        .map(Some)
        .ok_or_else(|| malformed_time(row, col, text))
}

fn parse_punch_time(row: usize, col: usize, raw: &str) -> Result<Option<NaiveTime>> {
    let time = parse_presence_time(row, col, raw)?;
    Ok(time.filter(|t| t.num_seconds_from_midnight() != 0))
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(text, fmt).ok())
}

fn malformed_time(row: usize, col: usize, text: &str) -> TimesheetError {
    TimesheetError::malformed_record(row, COLUMN_NAMES[col], format!("unrecognised time '{}'", text))
}

fn parse_total_hours(row: usize, raw: &str) -> Result<Decimal> {
    let text = raw.trim();
    if text.is_empty() {
        return Ok(Decimal::ZERO);
    }
    let hours = Decimal::from_str(text).map_err(|_| {
        TimesheetError::malformed_record(
            row,
            COLUMN_NAMES[COL_TOTAL_HOURS],
            format!("'{}' is not a number", text),
        )
    })?;
    if hours.is_sign_negative() && !hours.is_zero() {
        return Err(TimesheetError::malformed_record(
            row,
            COLUMN_NAMES[COL_TOTAL_HOURS],
            format!("negative hours {}", hours),
        ));
    }
    Ok(hours)
}
