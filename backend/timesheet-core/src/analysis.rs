// src/analysis.rs
use chrono::{Datelike, NaiveDate, NaiveTime};
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::detail::{format_detail, DetailEntry};
use crate::duration::{format_hours, format_signed_hours};
use crate::error::{Result, TimesheetError};
use crate::external::ExternalTimeRecord;
use crate::timesheet::AttendanceRecord;

const SECONDS_PER_HOUR: Decimal = dec!(3600);

// --- Result Structures ---

/// One retained workday: attendance summed per date, joined with tracked time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub day_of_week: String,
    pub first_in: Option<NaiveTime>,
    pub last_out: Option<NaiveTime>,
    pub hours: Decimal,
    pub external_hours: Decimal,
    pub on_target: bool,
    /// `hours - daily_target`, signed.
    pub difference: Decimal,
    /// Presence span `last_out - first_in` in hours, 0 when either is missing.
    pub span_hours: Decimal,
    pub hours_formatted: String,
    pub difference_formatted: String,
    pub external_hours_formatted: String,
    pub detail_entries: Vec<DetailEntry>,
}

impl DailyAggregate {
    pub fn detail_text(&self) -> String {
        format_detail(Some(self.detail_entries.as_slice()))
    }

    pub fn week_key(&self) -> WeekKey {
        WeekKey::of(self.date)
    }
}

/// ISO week identity. The week number alone repeats every year, so the ISO
/// year is part of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct WeekKey {
    pub iso_year: i32,
    pub week: u32,
}

impl WeekKey {
    pub fn of(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            iso_year: iso.year(),
            week: iso.week(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyAggregate {
    pub iso_year: i32,
    pub week: u32,
    pub work_days: usize,
    pub on_target_days: usize,
    pub hours: Decimal,
    pub external_hours: Decimal,
    pub target_hours: Decimal,
    pub weekly_difference: Decimal,
    pub avg_daily_hours: Decimal,
    pub on_target_percentage: Decimal,
    pub hours_formatted: String,
    pub external_hours_formatted: String,
    pub target_hours_formatted: String,
    pub weekly_difference_formatted: String,
    pub avg_daily_hours_formatted: String,
    pub on_target_percentage_formatted: String,
}

/// Totals across every retained day of a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub work_days: usize,
    pub on_target_days: usize,
    pub hours: Decimal,
    pub target_hours: Decimal,
    pub difference: Decimal,
}

/// Output of one analysis run. Built only by [`analyze`]; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultBundle {
    daily_target: Decimal,
    daily: Vec<DailyAggregate>,
    weekly: Option<Vec<WeeklyAggregate>>,
    summary: Summary,
}

impl ResultBundle {
    pub fn daily_target(&self) -> Decimal {
        self.daily_target
    }

    /// Daily rows, most recent date first.
    pub fn daily(&self) -> &[DailyAggregate] {
        &self.daily
    }

    /// Weekly rows, most recent week first. `None` when no day survived the
    /// workday filter, which is a different state from an empty week list.
    pub fn weekly(&self) -> Option<&[WeeklyAggregate]> {
        self.weekly.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.daily.is_empty()
    }

    /// Tooltip text per `YYYY-MM-DD` date, derived from each day's entries.
    pub fn detail_by_date(&self) -> BTreeMap<String, String> {
        self.daily
            .iter()
            .map(|d| (d.date.format("%Y-%m-%d").to_string(), d.detail_text()))
            .collect()
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }
}

// --- Analysis ---

pub fn is_workday(date: NaiveDate) -> bool {
    date.weekday().num_days_from_monday() < 5
}

#[derive(Default)]
struct DayAccumulator {
    first_in: Option<NaiveTime>,
    last_out: Option<NaiveTime>,
    hours: Decimal,
}

#[derive(Default)]
struct TrackedDay {
    hours: Decimal,
    entries: Vec<DetailEntry>,
}

/// Reconciles attendance with tracked time and rolls it up per day and week.
///
/// Weekend records and records with zero hours are dropped before anything
/// else happens, so they never reach the daily or weekly rows, even when
/// tracked time exists for that date. Tracked time is left-joined by date:
/// dates that only appear in `external` are ignored.
///
/// Fails with [`TimesheetError::HoursOverflow`] when a sum leaves the
/// `Decimal` range.
pub fn analyze(
    attendance: &[AttendanceRecord],
    daily_target: Decimal,
    external: Option<&[ExternalTimeRecord]>,
) -> Result<ResultBundle> {
    let retained: Vec<&AttendanceRecord> = attendance
        .iter()
        .filter(|r| is_workday(r.date) && r.hours_worked > Decimal::ZERO)
        .collect();
    debug!(
        "Workday filter kept {} of {} attendance records",
        retained.len(),
        attendance.len()
    );

    let tracked = group_external(external.unwrap_or_default())?;

    let mut days: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();
    for record in retained {
        let day = days.entry(record.date).or_default();
        day.first_in = earliest(day.first_in, record.first_in);
        day.last_out = latest(day.last_out, record.last_out);
        day.hours = add_hours(day.hours, record.hours_worked, || {
            format!("attendance on {}", record.date)
        })?;
    }

    let daily = days
        .into_iter()
        .rev()
        .map(|(date, day)| build_daily(date, day, tracked.get(&date), daily_target))
        .collect::<Result<Vec<_>>>()?;

    let weekly = if daily.is_empty() {
        None
    } else {
        Some(build_weekly(&daily, daily_target)?)
    };
    let summary = build_summary(&daily, daily_target)?;

    info!(
        "Analysis produced {} daily rows and {} weekly rows (target {}h)",
        daily.len(),
        weekly.as_ref().map_or(0, Vec::len),
        daily_target
    );

    Ok(ResultBundle {
        daily_target,
        daily,
        weekly,
        summary,
    })
}

fn add_hours(total: Decimal, hours: Decimal, what: impl FnOnce() -> String) -> Result<Decimal> {
    total
        .checked_add(hours)
        .ok_or_else(|| TimesheetError::HoursOverflow(what()))
}

fn sum_hours<I>(hours: I, what: impl Fn() -> String) -> Result<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    hours
        .into_iter()
        .try_fold(Decimal::ZERO, |total, h| add_hours(total, h, &what))
}

fn target_for(
    work_days: usize,
    daily_target: Decimal,
    what: impl FnOnce() -> String,
) -> Result<Decimal> {
    Decimal::from(work_days)
        .checked_mul(daily_target)
        .ok_or_else(|| TimesheetError::HoursOverflow(what()))
}

fn checked_difference(
    hours: Decimal,
    target: Decimal,
    what: impl FnOnce() -> String,
) -> Result<Decimal> {
    hours
        .checked_sub(target)
        .ok_or_else(|| TimesheetError::HoursOverflow(what()))
}

fn group_external(external: &[ExternalTimeRecord]) -> Result<BTreeMap<NaiveDate, TrackedDay>> {
    let mut tracked: BTreeMap<NaiveDate, TrackedDay> = BTreeMap::new();
    for record in external {
        let day = tracked.entry(record.date).or_default();
        day.hours = add_hours(day.hours, record.hours, || {
            format!("tracked time on {}", record.date)
        })?;
        day.entries.push(DetailEntry {
            description: record.description.clone(),
            project: record.project.clone(),
            task: record.task.clone(),
        });
    }
    Ok(tracked)
}

fn earliest(current: Option<NaiveTime>, candidate: Option<NaiveTime>) -> Option<NaiveTime> {
    match (current, candidate) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn latest(current: Option<NaiveTime>, candidate: Option<NaiveTime>) -> Option<NaiveTime> {
    match (current, candidate) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

fn span_hours(first_in: Option<NaiveTime>, last_out: Option<NaiveTime>) -> Decimal {
    match (first_in, last_out) {
        (Some(start), Some(end)) => {
            Decimal::from((end - start).num_seconds()) / SECONDS_PER_HOUR
        }
        _ => Decimal::ZERO,
    }
}

fn build_daily(
    date: NaiveDate,
    day: DayAccumulator,
    tracked: Option<&TrackedDay>,
    daily_target: Decimal,
) -> Result<DailyAggregate> {
    let external_hours = tracked.map_or(Decimal::ZERO, |t| t.hours);
    let detail_entries = tracked.map(|t| t.entries.clone()).unwrap_or_default();
    let difference =
        checked_difference(day.hours, daily_target, || format!("the difference on {}", date))?;

    Ok(DailyAggregate {
        date,
        day_of_week: date.format("%A").to_string(),
        first_in: day.first_in,
        last_out: day.last_out,
        hours: day.hours,
        external_hours,
        on_target: day.hours >= daily_target,
        difference,
        span_hours: span_hours(day.first_in, day.last_out),
        hours_formatted: format_hours(day.hours),
        difference_formatted: format_signed_hours(difference),
        external_hours_formatted: format_hours(external_hours),
        detail_entries,
    })
}

// `daily` is already sorted most recent first, so walking weeks in reverse
// key order keeps the same orientation.
fn build_weekly(daily: &[DailyAggregate], daily_target: Decimal) -> Result<Vec<WeeklyAggregate>> {
    let mut weeks: BTreeMap<WeekKey, Vec<&DailyAggregate>> = BTreeMap::new();
    for day in daily {
        weeks.entry(day.week_key()).or_default().push(day);
    }

    weeks
        .into_iter()
        .rev()
        .map(|(key, days)| {
            let label = || format!("week {}-W{:02}", key.iso_year, key.week);
            let work_days = days.len();
            let on_target_days = days.iter().filter(|d| d.on_target).count();
            let hours = sum_hours(days.iter().map(|d| d.hours), label)?;
            let external_hours = sum_hours(days.iter().map(|d| d.external_hours), label)?;
            let day_count = Decimal::from(work_days);
            let target_hours = target_for(work_days, daily_target, label)?;
            let weekly_difference = checked_difference(hours, target_hours, label)?;
            let avg_daily_hours = hours / day_count;
            let on_target_percentage = Decimal::from(on_target_days) * dec!(100) / day_count;

            Ok(WeeklyAggregate {
                iso_year: key.iso_year,
                week: key.week,
                work_days,
                on_target_days,
                hours,
                external_hours,
                target_hours,
                weekly_difference,
                avg_daily_hours,
                on_target_percentage,
                hours_formatted: format_hours(hours),
                external_hours_formatted: format_hours(external_hours),
                target_hours_formatted: format_hours(target_hours),
                weekly_difference_formatted: format_signed_hours(weekly_difference),
                avg_daily_hours_formatted: format_hours(avg_daily_hours),
                on_target_percentage_formatted: format_percentage(on_target_percentage),
            })
        })
        .collect()
}

fn build_summary(daily: &[DailyAggregate], daily_target: Decimal) -> Result<Summary> {
    let label = || "all retained days".to_string();
    let hours = sum_hours(daily.iter().map(|d| d.hours), label)?;
    let target_hours = target_for(daily.len(), daily_target, label)?;
    Ok(Summary {
        work_days: daily.len(),
        on_target_days: daily.iter().filter(|d| d.on_target).count(),
        hours,
        target_hours,
        difference: checked_difference(hours, target_hours, label)?,
    })
}

fn format_percentage(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.1}%", rounded)
}
