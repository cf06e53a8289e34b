//! Derived values the dashboard renders: air-quality levels, alert severity,
//! day and time labels, and the date ranges accepted by the history and
//! future endpoints.
//!
//! Everything here is a pure function of a store value (and "today" where
//! relevant), so callers recompute on read.

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::fmt;

use crate::model::HourForecast;

/// Earliest date the provider keeps history for.
pub fn history_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2010, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Future weather covers days 14..=300 from today.
pub const FUTURE_MIN_DAYS: u64 = 14;
pub const FUTURE_MAX_DAYS: u64 = 300;

const API_DATE: &str = "%Y-%m-%d";
const API_DATETIME: &str = "%Y-%m-%d %H:%M";

/// US-EPA air quality band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AqiLevel {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiLevel {
    pub fn from_epa_index(index: i32) -> Self {
        match index {
            i32::MIN..=1 => Self::Good,
            2 => Self::Moderate,
            3 => Self::UnhealthyForSensitiveGroups,
            4 => Self::Unhealthy,
            5 => Self::VeryUnhealthy,
            _ => Self::Hazardous,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            Self::Unhealthy => "Unhealthy",
            Self::VeryUnhealthy => "Very Unhealthy",
            Self::Hazardous => "Hazardous",
        }
    }
}

impl fmt::Display for AqiLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pollutant {
    Co,
    No2,
    O3,
    So2,
    Pm2_5,
    Pm10,
}

impl Pollutant {
    pub const ALL: [Pollutant; 6] = [
        Pollutant::Co,
        Pollutant::No2,
        Pollutant::O3,
        Pollutant::So2,
        Pollutant::Pm2_5,
        Pollutant::Pm10,
    ];

    /// Simplified reference threshold per pollutant.
    pub fn threshold(&self) -> f64 {
        match self {
            Self::Co => 9.0,
            Self::No2 => 100.0,
            Self::O3 => 100.0,
            Self::So2 => 75.0,
            Self::Pm2_5 => 35.0,
            Self::Pm10 => 55.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Co => "CO",
            Self::No2 => "NO2",
            Self::O3 => "O3",
            Self::So2 => "SO2",
            Self::Pm2_5 => "PM2.5",
            Self::Pm10 => "PM10",
        }
    }

    pub fn value_in(&self, aq: &crate::model::AirQuality) -> f64 {
        match self {
            Self::Co => aq.co,
            Self::No2 => aq.no2,
            Self::O3 => aq.o3,
            Self::So2 => aq.so2,
            Self::Pm2_5 => aq.pm2_5,
            Self::Pm10 => aq.pm10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollutantLevel {
    Good,
    Moderate,
    Unhealthy,
    VeryUnhealthy,
}

impl PollutantLevel {
    pub fn classify(value: f64, threshold: f64) -> Self {
        if value <= threshold * 0.5 {
            Self::Good
        } else if value <= threshold {
            Self::Moderate
        } else if value <= threshold * 1.5 {
            Self::Unhealthy
        } else {
            Self::VeryUnhealthy
        }
    }

    pub fn of(pollutant: Pollutant, value: f64) -> Self {
        Self::classify(value, pollutant.threshold())
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::Unhealthy => "Unhealthy",
            Self::VeryUnhealthy => "Very Unhealthy",
        }
    }
}

/// Alert severity, ordered from most to least urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AlertSeverity {
    Extreme,
    Severe,
    Moderate,
    Minor,
    Other,
}

impl AlertSeverity {
    pub fn parse(severity: &str) -> Self {
        match severity.trim().to_lowercase().as_str() {
            "extreme" => Self::Extreme,
            "severe" => Self::Severe,
            "moderate" => Self::Moderate,
            "minor" => Self::Minor,
            _ => Self::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Extreme => "EXTREME",
            Self::Severe => "SEVERE",
            Self::Moderate => "MODERATE",
            Self::Minor => "MINOR",
            Self::Other => "ADVISORY",
        }
    }
}

fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), API_DATE).ok()
}

fn parse_datetime(time: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(time.trim(), API_DATETIME).ok()
}

/// "Today" / "Tomorrow" for the first entry of a list, a short weekday
/// otherwise. Unparseable input is returned unchanged.
pub fn day_label(date: &str, index: usize, today: NaiveDate) -> String {
    let Some(parsed) = parse_date(date) else {
        return date.to_string();
    };

    if index == 0 {
        if parsed == today {
            return "Today".to_string();
        }
        if today.checked_add_days(Days::new(1)) == Some(parsed) {
            return "Tomorrow".to_string();
        }
    }

    parsed.format("%a").to_string()
}

/// Like [`day_label`] but for a standalone day: any entry may be today or
/// tomorrow.
pub fn relative_day_label(date: &str, today: NaiveDate) -> String {
    match parse_date(date) {
        Some(parsed) if parsed == today => "Today".to_string(),
        Some(parsed) if today.checked_add_days(Days::new(1)) == Some(parsed) => {
            "Tomorrow".to_string()
        }
        Some(parsed) => parsed.format("%a").to_string(),
        None => date.to_string(),
    }
}

/// `"Mar 5"`.
pub fn short_date(date: &str) -> String {
    parse_date(date).map(|d| d.format("%b %-d").to_string()).unwrap_or_else(|| date.to_string())
}

/// `"Tuesday, March 5, 2024"`.
pub fn long_date(date: &str) -> String {
    parse_date(date)
        .map(|d| d.format("%A, %B %-d, %Y").to_string())
        .unwrap_or_else(|| date.to_string())
}

/// `"2:00 PM"` from a provider hour stamp like `"2024-03-05 14:00"`.
pub fn hour_label(time: &str) -> String {
    parse_datetime(time)
        .map(|t| t.format("%-I:%M %p").to_string())
        .unwrap_or_else(|| time.to_string())
}

/// Index of the hour entry matching `now`'s day and hour.
pub fn current_hour_index(hours: &[HourForecast], now: NaiveDateTime) -> Option<usize> {
    hours.iter().position(|h| {
        parse_datetime(&h.time)
            .is_some_and(|t| t.date() == now.date() && t.hour() == now.hour())
    })
}

/// Sun/moon times come as `"06:12 AM"` and are kept as-is; full timestamps
/// are reduced to a clock time; blanks render as a dash.
pub fn format_astro_time(time: &str) -> String {
    let trimmed = time.trim();
    if trimmed.is_empty() {
        return "—".to_string();
    }

    let compact = trimmed.replace(' ', "");
    if NaiveTime::parse_from_str(&compact, "%I:%M%p").is_ok() {
        return trimmed.to_string();
    }

    if let Some(t) = parse_datetime(trimmed) {
        return t.format("%-I:%M %p").to_string();
    }

    time.to_string()
}

/// `"Mar 5, 2024, 02:00 PM"` from an RFC 3339 alert timestamp.
pub fn format_alert_time(time: &str) -> String {
    if time.trim().is_empty() {
        return String::new();
    }

    DateTime::parse_from_rfc3339(time.trim())
        .map(|t| t.format("%b %-d, %Y, %I:%M %p").to_string())
        .unwrap_or_else(|_| time.to_string())
}

/// Inclusive range of dates an endpoint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub min: NaiveDate,
    pub max: NaiveDate,
}

impl DateWindow {
    pub fn history(today: NaiveDate) -> Self {
        Self { min: history_start(), max: today }
    }

    pub fn future(today: NaiveDate) -> Self {
        Self {
            min: today.checked_add_days(Days::new(FUTURE_MIN_DAYS)).unwrap_or(today),
            max: today.checked_add_days(Days::new(FUTURE_MAX_DAYS)).unwrap_or(today),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.min <= date && date <= self.max
    }
}
