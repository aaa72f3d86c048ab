use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;

/// A named point on the globe, in decimal degrees (north and east positive).
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    /// Creates a location after checking the coordinate ranges of the data model.
    ///
    /// Poles are accepted here; the event calculator rejects them.
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::InvalidLocation(format!(
                "latitude must be between -90 and 90 degrees, got {}",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::InvalidLocation(format!(
                "longitude must be between -180 and 180 degrees, got {}",
                longitude
            )));
        }
        Ok(Self {
            name: name.into(),
            latitude,
            longitude,
        })
    }

    /// Unnamed location, labelled by its coordinates.
    pub fn from_coordinates(latitude: f64, longitude: f64) -> Result<Self> {
        Self::new(format!("{:.5}, {:.5}", latitude, longitude), latitude, longitude)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:.5}°, {:.5}°)",
            self.name, self.latitude, self.longitude
        )
    }
}

/// Builds a calendar date, rejecting triples that do not exist.
pub fn calendar_date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        Error::InvalidDate(format!(
            "{:04}-{:02}-{:02} is not a valid Gregorian date",
            year, month, day
        ))
    })
}

/// The named outcome of a single date at a single place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayKind {
    Normal,
    /// The sun stays above the horizon for the whole day.
    PolarDay,
    /// The sun stays below the horizon for the whole day.
    PolarNight,
}

impl DayKind {
    pub fn label(&self) -> &'static str {
        match self {
            DayKind::Normal => "NORMAL",
            DayKind::PolarDay => "ALL_DAY",
            DayKind::PolarNight => "ALL_NIGHT",
        }
    }
}

impl fmt::Display for DayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DayKind::Normal => "normal",
            DayKind::PolarDay => "all day",
            DayKind::PolarNight => "all night",
        })
    }
}

/// UTC sunrise, transit and sunset for one date.
///
/// `sunrise_utc` and `sunset_utc` are both `None` when the sun does not cross
/// the horizon on that date.
#[derive(Debug, Clone, PartialEq)]
pub struct SolarEvent {
    pub date: NaiveDate,
    pub sunrise_utc: Option<DateTime<Utc>>,
    pub sunset_utc: Option<DateTime<Utc>>,
    pub transit_utc: DateTime<Utc>,
}

impl SolarEvent {
    pub fn is_polar(&self) -> bool {
        self.sunrise_utc.is_none() && self.sunset_utc.is_none()
    }
}

/// One row of an annual series, in local civil time.
#[derive(Debug, Clone, PartialEq)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub kind: DayKind,
    pub sunrise_local_hour: Option<f64>,
    pub sunset_local_hour: Option<f64>,
    pub day_length_hours: f64,
}

/// Formats a fractional hour of day as `HH:MM`, rounding to the nearest minute.
pub fn format_hour(hour: f64) -> String {
    let total_minutes = (hour * 60.0).round() as i64;
    let total_minutes = total_minutes.rem_euclid(24 * 60);
    format!("{:02}:{:02}", total_minutes / 60, total_minutes % 60)
}

/// Formats a duration in hours as `HHh MMm`.
pub fn format_duration(hours: f64) -> String {
    let total_minutes = (hours * 60.0).round() as i64;
    format!("{:02}h {:02}m", total_minutes / 60, total_minutes % 60)
}
