use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::calendar::CalendarRules;
use crate::parser::dates::{DateFormat, DEFAULT_PATTERN};
use crate::parser::table::DEFAULT_ROW_SELECTOR;

pub const DEFAULT_SOURCE_URL: &str = "https://www.sp.edu.sg/sp/student-services/academic-calendar";
const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_USER_AGENT: &str = concat!("academic_calendar/", env!("CARGO_PKG_VERSION"));

/// What to do with a vacation row whose date cell does not parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedRowPolicy {
    /// Log a warning and leave the row out.
    #[default]
    Skip,
    /// Abort the query with the row's error.
    Fail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub source_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub date_format: String,
    pub vacation_label: String,
    pub row_policy: MalformedRowPolicy,
    pub row_selector: String,
}

impl Settings {
    /// Defaults, then an optional `calendar.toml`, then `CALENDAR_*` environment variables.
    pub fn load() -> Result<Self> {
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name("calendar").required(false))
                .add_source(Environment::with_prefix("CALENDAR").try_parsing(true)),
        )
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        let settings: Settings = Config::builder()
            .set_default("source_url", DEFAULT_SOURCE_URL)?
            .set_default("timeout_secs", DEFAULT_TIMEOUT_SECS)?
            .set_default("user_agent", DEFAULT_USER_AGENT)?
            .set_default("date_format", DEFAULT_PATTERN)?
            .set_default("vacation_label", "vacation")?
            .set_default("row_policy", "skip")?
            .set_default("row_selector", DEFAULT_ROW_SELECTOR)?
            .add_source(builder.build().context("Failed to read calendar settings")?)
            .build()?
            .try_deserialize()
            .context("Invalid calendar settings")?;
        Ok(settings)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validated per-request rules derived from these settings.
    pub fn rules(&self) -> Result<CalendarRules> {
        let format = DateFormat::new(&self.date_format)
            .ok_or_else(|| anyhow!("Invalid date format {:?}", self.date_format))?;
        let vacation_label = self.vacation_label.trim();
        if vacation_label.is_empty() {
            return Err(anyhow!("Vacation label must not be empty"));
        }
        Ok(CalendarRules {
            format,
            vacation_label: vacation_label.to_string(),
            row_policy: self.row_policy,
        })
    }
}

// ── Tests ──
