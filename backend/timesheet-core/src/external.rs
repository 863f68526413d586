// src/external.rs
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::duration::parse_duration;
use crate::error::{Result, TimesheetError};

pub const DEFAULT_PROJECT: &str = "No project";
pub const DEFAULT_TASK: &str = "No task";

/// A time entry as handed over by the time-tracking client, before any
/// normalization. Project and task names are already resolved.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTimeEntry {
    pub date: NaiveDate,
    #[serde(alias = "durationText")]
    pub duration: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub task_name: Option<String>,
}

/// One tracked work interval, with its duration converted to hours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalTimeRecord {
    pub date: NaiveDate,
    pub hours: Decimal,
    pub description: String,
    pub project: String,
    pub task: String,
}

impl ExternalTimeRecord {
    pub fn new(date: NaiveDate, hours: Decimal) -> Self {
        Self {
            date,
            hours,
            description: String::new(),
            project: DEFAULT_PROJECT.to_string(),
            task: DEFAULT_TASK.to_string(),
        }
    }

    pub fn description(mut self, d: &str) -> Self {
        self.description = d.to_string();
        self
    }

    pub fn project(mut self, p: &str) -> Self {
        self.project = name_or(Some(p), DEFAULT_PROJECT);
        self
    }

    pub fn task(mut self, t: &str) -> Self {
        self.task = name_or(Some(t), DEFAULT_TASK);
        self
    }

    pub fn from_raw(raw: &RawTimeEntry) -> Result<Self> {
        Ok(Self {
            date: raw.date,
            hours: parse_duration(&raw.duration)?,
            description: raw.description.clone().unwrap_or_default(),
            project: name_or(raw.project_name.as_deref(), DEFAULT_PROJECT),
            task: name_or(raw.task_name.as_deref(), DEFAULT_TASK),
        })
    }
}

fn name_or(name: Option<&str>, fallback: &str) -> String {
    match name.map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => fallback.to_string(),
    }
}

/// Normalizes a batch of raw entries. The first bad duration fails the whole
/// batch, with the entry's position attached.
pub fn normalize_entries(raw: &[RawTimeEntry]) -> Result<Vec<ExternalTimeRecord>> {
    let records = raw
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            ExternalTimeRecord::from_raw(entry).map_err(|e| TimesheetError::MalformedEntry {
                index,
                source: Box::new(e),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    debug!("Normalized {} external time entries", records.len());
    Ok(records)
}
