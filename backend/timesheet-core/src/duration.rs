// src/duration.rs
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

use crate::error::{Result, TimesheetError};

const MINUTES_PER_HOUR: Decimal = dec!(60);
const SECONDS_PER_HOUR: Decimal = dec!(3600);

// PT<h>H<m>M, either part optional. A trailing seconds part is tolerated
// when hours or minutes are present (the tracker emits it for rounded entries).
static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^PT(?:(\d+(?:\.\d+)?)H)?(?:(\d+(?:\.\d+)?)M)?(?:(\d+(?:\.\d+)?)S)?$")
        .expect("valid duration regex")
});

/// Converts a compact ISO-8601 duration (`PT8H30M`, `PT45M`, `PT2H`) into hours.
///
/// An unrecognised duration is an error; it never counts as zero hours.
pub fn parse_duration(text: &str) -> Result<Decimal> {
    let malformed = || TimesheetError::MalformedDuration {
        input: text.to_string(),
    };
    let caps = DURATION_RE.captures(text.trim()).ok_or_else(malformed)?;

    let component = |idx: usize| -> Result<Option<Decimal>> {
        caps.get(idx)
            .map(|m| Decimal::from_str(m.as_str()).map_err(|_| malformed()))
            .transpose()
    };
    let hours = component(1)?;
    let minutes = component(2)?;
    let seconds = component(3)?;

    if hours.is_none() && minutes.is_none() {
        return Err(malformed());
    }

    let from_minutes = minutes.map_or(Decimal::ZERO, |m| m / MINUTES_PER_HOUR);
    let from_seconds = seconds.map_or(Decimal::ZERO, |s| s / SECONDS_PER_HOUR);
    hours
        .unwrap_or(Decimal::ZERO)
        .checked_add(from_minutes)
        .and_then(|total| total.checked_add(from_seconds))
        .ok_or_else(malformed)
}

/// Renders hours as `"Xh YYmin"`.
///
/// - `None` renders as an empty string.
/// - Minutes are rounded half-to-even (`Decimal::round`), so 0.5 of a minute
///   goes to the even neighbour.
/// - Zero renders as `"0min"`; whole hours drop the minutes (`"2h"`), and
///   sub-hour values drop the hours (`"15min"`).
/// - With `signed`, pass the signed value: the magnitude is taken here and
///   prefixed with `+` (>= 0) or `-` (< 0). Without `signed`, negative values
///   still get a `-` prefix.
pub fn format_hours_minutes(hours: Option<Decimal>, signed: bool) -> String {
    let Some(value) = hours else {
        return String::new();
    };
    let Some(total_minutes) = whole_minutes(value) else {
        return String::new();
    };
    let (h, m) = (total_minutes / 60, total_minutes % 60);

    let prefix = match (signed, value.is_sign_negative() && total_minutes != 0) {
        (_, true) => "-",
        (true, false) => "+",
        (false, false) => "",
    };

    if h == 0 {
        format!("{prefix}{m}min")
    } else if m == 0 {
        format!("{prefix}{h}h")
    } else {
        format!("{prefix}{h}h {m:02}min")
    }
}

pub fn format_hours(hours: Decimal) -> String {
    format_hours_minutes(Some(hours), false)
}

pub fn format_signed_hours(hours: Decimal) -> String {
    format_hours_minutes(Some(hours), true)
}

fn whole_minutes(hours: Decimal) -> Option<i64> {
    hours.abs().checked_mul(MINUTES_PER_HOUR)?.round().to_i64()
}
