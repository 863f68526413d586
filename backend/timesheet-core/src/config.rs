// src/config.rs
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use tracing::info;

use crate::error::{Result, TimesheetError};

pub const DEFAULT_DAILY_TARGET_HOURS: Decimal = dec!(9);
pub const ENV_PREFIX: &str = "TIMESHEET_";

fn default_daily_target_hours() -> Decimal {
    DEFAULT_DAILY_TARGET_HOURS
}

/// Settings for one analysis run. Passed explicitly into the pipeline; nothing
/// here is written back to disk.
///
/// Environment (optionally via `.env`):
/// - `TIMESHEET_DAILY_TARGET_HOURS` (default 9)
/// - `TIMESHEET_SKIP_MALFORMED_ROWS` (default false)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_daily_target_hours")]
    pub daily_target_hours: Decimal,
    #[serde(default)]
    pub skip_malformed_rows: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            daily_target_hours: DEFAULT_DAILY_TARGET_HOURS,
            skip_malformed_rows: false,
        }
    }
}

impl AnalysisConfig {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenv::dotenv().ok();
        let config: AnalysisConfig = envy::prefixed(ENV_PREFIX).from_env()?;
        config.validated()
    }

    /// Builds a config from explicit key/value pairs, as `from_env` would read them.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: AnalysisConfig = envy::prefixed(ENV_PREFIX).from_iter(pairs)?;
        config.validated()
    }

    pub fn with_daily_target(mut self, hours: Decimal) -> Result<Self> {
        self.daily_target_hours = hours;
        self.validated()
    }

    fn validated(self) -> Result<Self> {
        if self.daily_target_hours <= Decimal::ZERO {
            return Err(TimesheetError::InvalidTarget(self.daily_target_hours));
        }
        info!(
            "Analysis config: daily target {}h, skip malformed rows: {}",
            self.daily_target_hours, self.skip_malformed_rows
        );
        Ok(self)
    }
}
