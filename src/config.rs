use std::fmt::Write;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, Utc};

use crate::error::{Result, SummaryError};

// ---------------------------------------------------------------------------
// Timestamp conversion
// ---------------------------------------------------------------------------

/// Time zone the instrument's `DATE` register is interpreted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampZone {
    #[default]
    Local,
    Utc,
    Fixed(FixedOffset),
}

impl FromStr for TimestampZone {
    type Err = String;

    /// `local`, `utc`, or an offset such as `+02:00` / `-0500`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(TimestampZone::Local),
            "utc" | "z" => Ok(TimestampZone::Utc),
            other => parse_offset(other)
                .map(TimestampZone::Fixed)
                .ok_or_else(|| format!("'{s}' is not local, utc or an offset like +02:00")),
        }
    }
}

fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// How acquisition timestamps become calendar dates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateConfig {
    pub zone: TimestampZone,
    /// `chrono` strftime pattern used for the report label.
    pub format: String,
}

impl Default for DateConfig {
    fn default() -> Self {
        Self {
            zone: TimestampZone::Local,
            format: "%Y-%m-%d".to_string(),
        }
    }
}

impl DateConfig {
    /// Reject strftime patterns chrono cannot render.
    pub fn new(zone: TimestampZone, format: &str) -> Result<Self> {
        if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
            return Err(SummaryError::InvalidDateFormat(format.to_string()));
        }
        Ok(Self {
            zone,
            format: format.to_string(),
        })
    }

    /// Calendar date of a Unix timestamp in the configured zone.
    pub fn date_of(&self, timestamp: i64) -> Option<NaiveDate> {
        let utc: DateTime<Utc> = DateTime::from_timestamp(timestamp, 0)?;
        Some(match self.zone {
            TimestampZone::Local => utc.with_timezone(&Local).date_naive(),
            TimestampZone::Utc => utc.date_naive(),
            TimestampZone::Fixed(offset) => utc.with_timezone(&offset).date_naive(),
        })
    }

    /// Falls back to ISO-8601 when the pattern does not render.
    pub fn label(&self, date: NaiveDate) -> String {
        let mut out = String::new();
        if write!(out, "{}", date.format(&self.format)).is_err() {
            return date.to_string();
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Display window
// ---------------------------------------------------------------------------

/// Closed chemical-shift interval kept for plotting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShiftWindow {
    pub x_min: f64,
    pub x_max: f64,
}

impl Default for ShiftWindow {
    fn default() -> Self {
        Self {
            x_min: -5.0,
            x_max: 24.0,
        }
    }
}

impl ShiftWindow {
    pub fn new(x_min: f64, x_max: f64) -> Result<Self> {
        if !(x_min < x_max) {
            return Err(SummaryError::InvalidWindow { x_min, x_max });
        }
        Ok(Self { x_min, x_max })
    }

    /// Inclusive at both ends.
    pub fn contains(&self, shift: f64) -> bool {
        shift >= self.x_min && shift <= self.x_max
    }
}

// ---------------------------------------------------------------------------
// Run settings
// ---------------------------------------------------------------------------

/// Order of experiments in the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExperimentOrder {
    /// Ascending experiment number.
    #[default]
    Numeric,
    /// Whatever order the filesystem lists the subdirectories in.
    Traversal,
}

/// Everything a run needs, collected once at start-up.
#[derive(Debug, Clone)]
pub struct Settings {
    pub window: ShiftWindow,
    pub dates: DateConfig,
    pub order: ExperimentOrder,
    /// Where plots, trace tables and the report are written.
    pub output_dir: PathBuf,
    /// Also write each windowed trace as CSV.
    pub export_traces: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            window: ShiftWindow::default(),
            dates: DateConfig::default(),
            order: ExperimentOrder::default(),
            output_dir: PathBuf::from("."),
            export_traces: false,
        }
    }
}
