//! Annual series of day records, computed in parallel.

use crate::civil::CivilRule;
use crate::error::{Error, Result};
use crate::events::{classify_polar, compute_events_for_horizon, validate_location};
use crate::solar::Horizon;
use crate::types::{DayKind, DayRecord, Location, calendar_date};
use chrono::{Datelike, NaiveDate};
use std::num::NonZeroUsize;
use std::thread;

/// Tuning for [`build_with`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesOptions {
    pub horizon: Horizon,
    /// Number of worker threads; 1 computes inline.
    pub workers: usize,
}

impl Default for SeriesOptions {
    fn default() -> Self {
        Self {
            horizon: Horizon::SunriseSunset,
            workers: thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
        }
    }
}

/// One year of day records for one location, ordered by date.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnualSeries {
    location: Location,
    year: i32,
    rule_name: String,
    horizon: Horizon,
    records: Vec<DayRecord>,
}

impl AnnualSeries {
    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Name of the civil rule the local hours are expressed in.
    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    pub fn horizon(&self) -> Horizon {
        self.horizon
    }

    pub fn records(&self) -> &[DayRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DayRecord> {
        self.records.iter()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DayRecord> {
        if date.year() != self.year {
            return None;
        }
        self.records.get(date.ordinal0() as usize)
    }

    /// First date with the longest day length.
    pub fn longest_day(&self) -> Option<&DayRecord> {
        self.records
            .iter()
            .reduce(|best, r| if r.day_length_hours > best.day_length_hours { r } else { best })
    }

    /// First date with the shortest day length.
    pub fn shortest_day(&self) -> Option<&DayRecord> {
        self.records
            .iter()
            .reduce(|best, r| if r.day_length_hours < best.day_length_hours { r } else { best })
    }

    pub fn earliest_sunrise(&self) -> Option<&DayRecord> {
        self.records
            .iter()
            .filter(|r| r.sunrise_local_hour.is_some())
            .reduce(|best, r| if r.sunrise_local_hour < best.sunrise_local_hour { r } else { best })
    }

    pub fn latest_sunset(&self) -> Option<&DayRecord> {
        self.records
            .iter()
            .filter(|r| r.sunset_local_hour.is_some())
            .reduce(|best, r| if r.sunset_local_hour > best.sunset_local_hour { r } else { best })
    }

    pub fn polar_day_count(&self) -> usize {
        self.count_kind(DayKind::PolarDay)
    }

    pub fn polar_night_count(&self) -> usize {
        self.count_kind(DayKind::PolarNight)
    }

    fn count_kind(&self, kind: DayKind) -> usize {
        self.records.iter().filter(|r| r.kind == kind).count()
    }
}

impl<'a> IntoIterator for &'a AnnualSeries {
    type Item = &'a DayRecord;
    type IntoIter = std::slice::Iter<'a, DayRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Every date of `year` in ascending order.
pub fn dates_of_year(year: i32) -> Result<Vec<NaiveDate>> {
    let first = calendar_date(year, 1, 1)?;
    let last = calendar_date(year, 12, 31)?;
    Ok(first.iter_days().take_while(|d| *d <= last).collect())
}

/// Computes the record for a single date.
pub fn day_record(
    date: NaiveDate,
    location: &Location,
    rule: &CivilRule,
    horizon: Horizon,
) -> Result<DayRecord> {
    let event = compute_events_for_horizon(date, location, horizon)?;

    let (Some(sunrise), Some(sunset)) = (event.sunrise_utc, event.sunset_utc) else {
        let kind = classify_polar(date, location, horizon)?;
        return Ok(DayRecord {
            date,
            kind,
            sunrise_local_hour: None,
            sunset_local_hour: None,
            day_length_hours: if kind == DayKind::PolarDay { 24.0 } else { 0.0 },
        });
    };

    let local_sunrise = rule.to_local(sunrise)?;
    let local_sunset = rule.to_local(sunset)?;
    let sunrise_hour = crate::civil::hour_of_day(&local_sunrise);
    let sunset_hour = crate::civil::hour_of_day(&local_sunset);

    let day_length_hours = if local_sunrise.date_naive() == local_sunset.date_naive() {
        sunset_hour - sunrise_hour
    } else {
        // Local clock wraps past midnight.
        (sunset - sunrise).num_milliseconds() as f64 / 3_600_000.0
    };

    Ok(DayRecord {
        date,
        kind: DayKind::Normal,
        sunrise_local_hour: Some(sunrise_hour),
        sunset_local_hour: Some(sunset_hour),
        day_length_hours,
    })
}

/// Builds the annual series for standard sunrise and sunset.
pub fn build(location: &Location, year: i32, rule: &CivilRule) -> Result<AnnualSeries> {
    build_with(location, year, rule, &SeriesOptions::default())
}

/// Builds the annual series. The first failing date, in date order, aborts the call.
pub fn build_with(
    location: &Location,
    year: i32,
    rule: &CivilRule,
    options: &SeriesOptions,
) -> Result<AnnualSeries> {
    validate_location(location)?;
    let horizon = options.horizon.validated()?;
    let dates = dates_of_year(year)?;

    let workers = options.workers.clamp(1, dates.len());
    log::debug!(
        "building {} series for {} with {} worker(s), rule {}, horizon {}",
        year,
        location,
        workers,
        rule.name,
        horizon
    );

    let records = if workers == 1 {
        dates
            .iter()
            .map(|date| day_record(*date, location, rule, horizon))
            .collect::<Result<Vec<_>>>()?
    } else {
        let chunk_size = dates.len().div_ceil(workers);
        let mut slots: Vec<Option<Result<DayRecord>>> = vec![None; dates.len()];

        thread::scope(|scope| {
            for (date_chunk, slot_chunk) in dates.chunks(chunk_size).zip(slots.chunks_mut(chunk_size)) {
                scope.spawn(move || {
                    for (date, slot) in date_chunk.iter().zip(slot_chunk.iter_mut()) {
                        let record = day_record(*date, location, rule, horizon);
                        let failed = record.is_err();
                        *slot = Some(record);
                        if failed {
                            break;
                        }
                    }
                });
            }
        });

        // A chunk stops at its first error; every slot before it is filled.
        slots
            .into_iter()
            .map_while(|slot| slot)
            .collect::<Result<Vec<_>>>()?
    };

    if records.len() != dates.len() {
        return Err(Error::InvalidDate(format!(
            "computed {} of {} dates of {}",
            records.len(),
            dates.len(),
            year
        )));
    }

    Ok(AnnualSeries {
        location: location.clone(),
        year,
        rule_name: rule.name.clone(),
        horizon,
        records,
    })
}
