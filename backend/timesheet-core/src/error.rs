// src/error.rs
use rust_decimal::Decimal;
use thiserror::Error;

// --- Error Types ---

#[derive(Error, Debug)]
pub enum TimesheetError {
    /// A body row of the attendance table could not be turned into a record.
    /// `row` is 1-based and does not count the header row.
    #[error("Malformed attendance row {row} (column '{column}'): {reason}")]
    MalformedRecord {
        row: usize,
        column: &'static str,
        reason: String,
    },
    #[error("Malformed duration '{input}': expected PT<h>H<m>M with at least one component")]
    MalformedDuration { input: String },
    #[error("Time entry #{index} could not be normalized")]
    MalformedEntry {
        index: usize,
        #[source]
        source: Box<TimesheetError>,
    },
    #[error("Hour total overflowed while summing {0}")]
    HoursOverflow(String),
    #[error("Daily target must be a positive number of hours, got {0}")]
    InvalidTarget(Decimal),
    #[error("Configuration error: {0}")]
    Config(#[from] envy::Error),
}

impl TimesheetError {
    pub(crate) fn malformed_record(row: usize, column: &'static str, reason: impl Into<String>) -> Self {
        TimesheetError::MalformedRecord {
            row,
            column,
            reason: reason.into(),
        }
    }

    /// Row index for record-level failures, useful when reporting skipped rows.
    pub fn row(&self) -> Option<usize> {
        match self {
            TimesheetError::MalformedRecord { row, .. } => Some(*row),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TimesheetError>;
