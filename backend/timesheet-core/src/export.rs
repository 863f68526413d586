// src/export.rs
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

use crate::analysis::{DailyAggregate, WeeklyAggregate};

// Flat row shapes for CSV; nested detail entries are rendered to text.

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DailyCsvRow<'a> {
    date: NaiveDate,
    day_of_week: &'a str,
    first_in: Option<NaiveTime>,
    last_out: Option<NaiveTime>,
    hours: Decimal,
    hours_formatted: &'a str,
    on_target: bool,
    difference: Decimal,
    difference_formatted: &'a str,
    span_hours: Decimal,
    external_hours: Decimal,
    details: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct WeeklyCsvRow<'a> {
    iso_year: i32,
    week: u32,
    work_days: usize,
    on_target_days: usize,
    on_target_percentage: &'a str,
    hours: Decimal,
    target_hours: Decimal,
    weekly_difference: Decimal,
    weekly_difference_formatted: &'a str,
    avg_daily_hours_formatted: &'a str,
    external_hours: Decimal,
}

pub fn write_daily_csv<W: Write>(writer: W, daily: &[DailyAggregate]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for day in daily {
        wtr.serialize(DailyCsvRow {
            date: day.date,
            day_of_week: &day.day_of_week,
            first_in: day.first_in,
            last_out: day.last_out,
            hours: day.hours,
            hours_formatted: &day.hours_formatted,
            on_target: day.on_target,
            difference: day.difference,
            difference_formatted: &day.difference_formatted,
            span_hours: day.span_hours,
            external_hours: day.external_hours,
            details: day.detail_text(),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_weekly_csv<W: Write>(writer: W, weekly: &[WeeklyAggregate]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for week in weekly {
        wtr.serialize(WeeklyCsvRow {
            iso_year: week.iso_year,
            week: week.week,
            work_days: week.work_days,
            on_target_days: week.on_target_days,
            on_target_percentage: &week.on_target_percentage_formatted,
            hours: week.hours,
            target_hours: week.target_hours,
            weekly_difference: week.weekly_difference,
            weekly_difference_formatted: &week.weekly_difference_formatted,
            avg_daily_hours_formatted: &week.avg_daily_hours_formatted,
            external_hours: week.external_hours,
        })?;
    }
    wtr.flush()?;
    Ok(())
}
