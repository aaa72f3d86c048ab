//! Sunrise, transit and sunset instants for a single date.

use crate::error::{Error, Result};
use crate::solar::{self, HourAngle, Horizon, SolarCoordinates};
use crate::types::{DayKind, Location, SolarEvent};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};

/// Checks that a location is usable for event calculations.
///
/// Poles are rejected: the hour angle is undefined there.
pub fn validate_location(location: &Location) -> Result<()> {
    let latitude = location.latitude;
    if !latitude.is_finite() || latitude <= -90.0 || latitude >= 90.0 {
        return Err(Error::InvalidLocation(format!(
            "latitude must be strictly between -90 and 90 degrees, got {}",
            latitude
        )));
    }
    let longitude = location.longitude;
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(Error::InvalidLocation(format!(
            "longitude must be between -180 and 180 degrees, got {}",
            longitude
        )));
    }
    Ok(())
}

/// Standard sunrise and sunset (−0.833°) for `date` at `location`.
pub fn compute_events(date: NaiveDate, location: &Location) -> Result<SolarEvent> {
    compute_events_for_horizon(date, location, Horizon::SunriseSunset)
}

/// Sunrise and sunset for a custom horizon altitude.
///
/// The computation window is the UTC day of `date` shifted by the longitude, so
/// sunrise may fall on the previous UTC date for far-eastern locations and
/// sunset on the next UTC date for far-western ones. Sunrise always precedes
/// transit, which always precedes sunset.
pub fn compute_events_for_horizon(
    date: NaiveDate,
    location: &Location,
    horizon: Horizon,
) -> Result<SolarEvent> {
    validate_location(location)?;
    let altitude = horizon.validated()?.elevation_angle();

    let transit = transit_minutes(date, location.longitude);
    let coords = SolarCoordinates::on(date, transit);
    let transit_utc = instant_at(date, transit)?;

    match solar::hour_angle(location.latitude, coords.declination, altitude) {
        HourAngle::Crossing(hour_angle) => {
            let sunrise = refine_crossing(date, location, altitude, transit - 4.0 * hour_angle, -1.0);
            let sunset = refine_crossing(date, location, altitude, transit + 4.0 * hour_angle, 1.0);
            Ok(SolarEvent {
                date,
                sunrise_utc: Some(instant_at(date, sunrise)?),
                sunset_utc: Some(instant_at(date, sunset)?),
                transit_utc,
            })
        }
        HourAngle::AlwaysAbove | HourAngle::AlwaysBelow => Ok(SolarEvent {
            date,
            sunrise_utc: None,
            sunset_utc: None,
            transit_utc,
        }),
    }
}

/// Altitude of the sun at solar noon on `date`, in degrees.
pub fn noon_elevation(date: NaiveDate, location: &Location) -> Result<f64> {
    validate_location(location)?;
    let transit = transit_minutes(date, location.longitude);
    let coords = SolarCoordinates::on(date, transit);
    Ok(solar::noon_elevation(location.latitude, coords.declination))
}

/// Decides which polar condition holds on a date without a horizon crossing.
pub fn classify_polar(date: NaiveDate, location: &Location, horizon: Horizon) -> Result<DayKind> {
    let elevation = noon_elevation(date, location)?;
    if elevation > horizon.elevation_angle() {
        Ok(DayKind::PolarDay)
    } else {
        Ok(DayKind::PolarNight)
    }
}

/// Names the outcome of an event: normal, or which polar condition applies.
pub fn day_kind(event: &SolarEvent, location: &Location, horizon: Horizon) -> Result<DayKind> {
    if event.is_polar() {
        classify_polar(event.date, location, horizon)
    } else {
        Ok(DayKind::Normal)
    }
}

/// Minutes after 00:00 UTC of solar noon, with one refinement of the equation of time.
fn transit_minutes(date: NaiveDate, longitude: f64) -> f64 {
    let mean_noon = solar::mean_noon_minutes(longitude);
    let first = mean_noon - SolarCoordinates::on(date, mean_noon).equation_of_time;
    mean_noon - SolarCoordinates::on(date, first).equation_of_time
}

/// Recomputes a crossing with the sun's coordinates at the estimated event time.
/// Keeps the estimate if the sun no longer reaches the altitude at that time.
fn refine_crossing(
    date: NaiveDate,
    location: &Location,
    altitude: f64,
    estimate: f64,
    direction: f64,
) -> f64 {
    let coords = SolarCoordinates::on(date, estimate);
    match solar::hour_angle(location.latitude, coords.declination, altitude) {
        HourAngle::Crossing(hour_angle) => {
            solar::mean_noon_minutes(location.longitude) - coords.equation_of_time
                + direction * 4.0 * hour_angle
        }
        HourAngle::AlwaysAbove | HourAngle::AlwaysBelow => estimate,
    }
}

fn instant_at(date: NaiveDate, minutes_utc: f64) -> Result<DateTime<Utc>> {
    let millis = (minutes_utc * 60_000.0).round() as i64;
    date.and_time(NaiveTime::MIN)
        .and_utc()
        .checked_add_signed(TimeDelta::milliseconds(millis))
        .ok_or_else(|| Error::InvalidDate(format!("{} is outside the supported range", date)))
}
