//! Solar position math: declination, equation of time and the horizon hour angle.
//!
//! Uses the low-order series from Meeus (Astronomical Algorithms, ch. 25) as
//! popularised by the NOAA solar calculator. Accuracy is well within a minute of
//! sunrise/sunset time outside the polar circles for years 1900-2100.

use crate::error::{Error, Result};
use crate::math::{cos_deg, normalize_degrees, polynomial, sin_deg};
use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// Julian day of 2000-01-01 12:00 TT.
pub const J2000: f64 = 2_451_545.0;
const DAYS_PER_JULIAN_CENTURY: f64 = 36_525.0;
pub const MINUTES_PER_DAY: f64 = 1_440.0;

/// Solar altitude used for standard sunrise and sunset: refraction plus solar radius.
pub const SUNRISE_SUNSET_ALTITUDE: f64 = -0.833;

/// Solar altitude that defines a horizon event.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Horizon {
    /// Upper limb touching the horizon, with standard refraction (−0.833°).
    #[default]
    SunriseSunset,
    /// Civil twilight (−6°).
    CivilTwilight,
    /// Nautical twilight (−12°).
    NauticalTwilight,
    /// Astronomical twilight (−18°).
    AstronomicalTwilight,
    /// Any altitude in degrees.
    Custom(f64),
}

impl Horizon {
    pub fn custom(elevation_degrees: f64) -> Result<Self> {
        Self::Custom(elevation_degrees).validated()
    }

    pub fn elevation_angle(&self) -> f64 {
        match self {
            Horizon::SunriseSunset => SUNRISE_SUNSET_ALTITUDE,
            Horizon::CivilTwilight => -6.0,
            Horizon::NauticalTwilight => -12.0,
            Horizon::AstronomicalTwilight => -18.0,
            Horizon::Custom(value) => *value,
        }
    }

    pub fn validated(self) -> Result<Self> {
        let angle = self.elevation_angle();
        if angle.is_finite() && (-90.0..=90.0).contains(&angle) {
            Ok(self)
        } else {
            Err(Error::InvalidHorizon(format!(
                "elevation angle must be between -90 and 90 degrees, got {}",
                angle
            )))
        }
    }
}

impl FromStr for Horizon {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sunrise" | "sunset" | "standard" => Ok(Horizon::SunriseSunset),
            "civil" => Ok(Horizon::CivilTwilight),
            "nautical" => Ok(Horizon::NauticalTwilight),
            "astronomical" => Ok(Horizon::AstronomicalTwilight),
            other => {
                let value = other.parse::<f64>().map_err(|_| {
                    Error::InvalidHorizon(format!(
                        "expected degrees or one of standard, civil, nautical, astronomical; got {}",
                        s
                    ))
                })?;
                Horizon::custom(value)
            }
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Horizon::SunriseSunset => write!(f, "sunrise/sunset ({}°)", SUNRISE_SUNSET_ALTITUDE),
            Horizon::CivilTwilight => write!(f, "civil twilight (-6°)"),
            Horizon::NauticalTwilight => write!(f, "nautical twilight (-12°)"),
            Horizon::AstronomicalTwilight => write!(f, "astronomical twilight (-18°)"),
            Horizon::Custom(value) => write!(f, "custom ({}°)", value),
        }
    }
}

/// 1-based ordinal day within the year.
pub fn day_of_year(date: NaiveDate) -> u32 {
    date.ordinal()
}

/// Julian day of January 0 (i.e. December 31 of the previous year), 00:00 UTC.
pub fn julian_day_of_january_zero(year: i32) -> f64 {
    let y = i64::from(year) - 1;
    let days = 365 * y + y.div_euclid(4) - y.div_euclid(100) + y.div_euclid(400);
    1_721_424.5 + days as f64
}

/// Fractional Julian day for `minutes_utc` minutes after 00:00 UTC on `date`.
///
/// `minutes_utc` may be negative or exceed a day.
pub fn julian_day(date: NaiveDate, minutes_utc: f64) -> f64 {
    julian_day_of_january_zero(date.year()) + f64::from(day_of_year(date)) + minutes_utc / MINUTES_PER_DAY
}

/// Declination and equation of time at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarCoordinates {
    /// Apparent declination in degrees.
    pub declination: f64,
    /// Apparent minus mean solar time, in minutes.
    pub equation_of_time: f64,
}

impl SolarCoordinates {
    pub fn at(julian_day: f64) -> Self {
        let t = (julian_day - J2000) / DAYS_PER_JULIAN_CENTURY;

        let mean_longitude = normalize_degrees(polynomial(&[280.46646, 36_000.76983, 0.0003032], t));
        let mean_anomaly = polynomial(&[357.52911, 35_999.05029, -0.0001537], t);
        let eccentricity = polynomial(&[0.016708634, -0.000042037, -0.0000001267], t);

        let equation_of_center = sin_deg(mean_anomaly) * polynomial(&[1.914602, -0.004817, -0.000014], t)
            + sin_deg(2.0 * mean_anomaly) * polynomial(&[0.019993, -0.000101], t)
            + sin_deg(3.0 * mean_anomaly) * 0.000289;

        // Longitude of the Moon's ascending node, for nutation and aberration.
        let omega = 125.04 - 1_934.136 * t;
        let apparent_longitude =
            mean_longitude + equation_of_center - 0.00569 - 0.00478 * sin_deg(omega);

        let mean_obliquity =
            23.0 + (26.0 + polynomial(&[21.448, -46.815, -0.00059, 0.001813], t) / 60.0) / 60.0;
        let obliquity = mean_obliquity + 0.00256 * cos_deg(omega);

        let declination = (sin_deg(obliquity) * sin_deg(apparent_longitude))
            .asin()
            .to_degrees();

        let y = (obliquity / 2.0).to_radians().tan().powi(2);
        let l0 = mean_longitude.to_radians();
        let m = mean_anomaly.to_radians();
        let e = eccentricity;
        let equation_of_time = 4.0
            * (y * (2.0 * l0).sin() - 2.0 * e * m.sin()
                + 4.0 * e * y * m.sin() * (2.0 * l0).cos()
                - 0.5 * y * y * (4.0 * l0).sin()
                - 1.25 * e * e * (2.0 * m).sin())
            .to_degrees();

        Self {
            declination,
            equation_of_time,
        }
    }

    pub fn on(date: NaiveDate, minutes_utc: f64) -> Self {
        Self::at(julian_day(date, minutes_utc))
    }
}

/// Outcome of solving for the hour angle at which the sun reaches a given altitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HourAngle {
    /// The sun crosses the altitude; hour angle in degrees, in [0, 180].
    Crossing(f64),
    /// The sun stays above the altitude all day (polar day).
    AlwaysAbove,
    /// The sun stays below the altitude all day (polar night).
    AlwaysBelow,
}

/// Solves `cos(H) = (sin(h0) - sin(lat)·sin(δ)) / (cos(lat)·cos(δ))`.
///
/// `latitude` must not be a pole.
pub fn hour_angle(latitude: f64, declination: f64, altitude: f64) -> HourAngle {
    let cos_h = (sin_deg(altitude) - sin_deg(latitude) * sin_deg(declination))
        / (cos_deg(latitude) * cos_deg(declination));

    if cos_h < -1.0 {
        HourAngle::AlwaysAbove
    } else if cos_h > 1.0 {
        HourAngle::AlwaysBelow
    } else {
        HourAngle::Crossing(cos_h.acos().to_degrees())
    }
}

/// Geometric altitude of the sun at transit, in degrees.
pub fn noon_elevation(latitude: f64, declination: f64) -> f64 {
    90.0 - (latitude - declination).abs()
}

/// Minutes after 00:00 UTC at which the sun transits `longitude`, before
/// applying the equation of time.
pub fn mean_noon_minutes(longitude: f64) -> f64 {
    MINUTES_PER_DAY / 2.0 - 4.0 * longitude
}
