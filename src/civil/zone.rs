//! Builds civil rules from user-facing timezone specifications.

use super::{CivilRule, TransitionRule};
use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use std::env;

const SECONDS_PER_DAY: i64 = 86_400;

/// Resolves a timezone specification into a civil rule for `year`.
///
/// Accepts `None` (the built-in Warsaw rule), `UTC`/`GMT`, `system`, a fixed
/// offset such as `+05:30` or `-03`, or an IANA zone name.
pub fn resolve_civil_rule(spec: Option<&str>, year: i32) -> Result<CivilRule> {
    let Some(spec) = spec.map(str::trim) else {
        log::debug!("no timezone given, using the built-in Warsaw rule");
        return Ok(CivilRule::warsaw());
    };

    if spec.eq_ignore_ascii_case("system") {
        let name = system_zone();
        log::debug!("system timezone resolved to {}", name);
        return resolve_named(&name, year).or_else(|e| {
            log::warn!("cannot use system timezone {}: {}; falling back to UTC", name, e);
            Ok(CivilRule::utc())
        });
    }

    resolve_named(spec, year)
}

fn resolve_named(spec: &str, year: i32) -> Result<CivilRule> {
    if spec.is_empty() {
        return Err(Error::CivilRuleGap("empty timezone specification".to_string()));
    }
    if ["UTC", "GMT", "Z"].iter().any(|n| spec.eq_ignore_ascii_case(n)) {
        return Ok(CivilRule::utc());
    }
    if let Some(offset) = parse_offset(spec) {
        return Ok(CivilRule::fixed(
            spec,
            f64::from(offset.local_minus_utc()) / 3600.0,
        ));
    }
    let tz = spec.parse::<Tz>().map_err(|_| {
        Error::CivilRuleGap(format!(
            "unknown timezone '{}': expected an IANA name, UTC, system or an offset like +01:00",
            spec
        ))
    })?;
    rule_for_zone(tz, year)
}

/// Derives a single-year rule from the tz database.
///
/// The zone must either keep one offset all year or switch exactly twice.
pub fn rule_for_zone(tz: Tz, year: i32) -> Result<CivilRule> {
    let start = year_start(year)?;
    let end = year_start(year + 1)?;

    let mut changes: Vec<(i64, i32, i32)> = Vec::new();
    let mut previous = offset_seconds_at(tz, start)?;
    let mut day = start;
    while day < end {
        let next = (day + SECONDS_PER_DAY).min(end);
        let offset = offset_seconds_at(tz, next)?;
        if offset != previous {
            let instant = find_change(tz, day, next, previous)?;
            changes.push((instant, previous, offset));
            previous = offset;
        }
        day = next;
    }

    log::debug!(
        "{} has {} offset change(s) in {}",
        tz.name(),
        changes.len(),
        year
    );

    match changes.as_slice() {
        [] => {
            let mut rule = CivilRule::fixed(tz.name(), hours(previous));
            rule.valid_year = Some(year);
            Ok(rule)
        }
        [first, second] if first.1 == second.2 && first.2 == second.1 => {
            let (dst_start, dst_end) = if first.2 > first.1 {
                (first, second)
            } else {
                (second, first)
            };
            Ok(CivilRule {
                name: tz.name().to_string(),
                standard_offset_hours: hours(dst_start.1),
                dst_offset_hours: hours(dst_start.2),
                dst_start: Some(TransitionRule::Fixed(instant(tz, dst_start.0)?)),
                dst_end: Some(TransitionRule::Fixed(instant(tz, dst_end.0)?)),
                valid_year: Some(year),
            })
        }
        _ => Err(Error::CivilRuleGap(format!(
            "{} changes its UTC offset {} times in {}; only zones with a fixed offset or one daylight saving period are supported",
            tz.name(),
            changes.len(),
            year
        ))),
    }
}

/// Name of the system timezone: `TZ`, then the platform setting, then UTC.
pub fn system_zone() -> String {
    env::var("TZ")
        .ok()
        .map(|value| value.trim().trim_start_matches(':').to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| iana_time_zone::get_timezone().ok())
        .unwrap_or_else(|| "UTC".to_string())
}

/// Parses `+HH`, `-HH`, `+HH:MM` or `-HH:MM`.
pub fn parse_offset(spec: &str) -> Option<FixedOffset> {
    let (sign, rest) = match spec.as_bytes().first()? {
        b'+' => (1, &spec[1..]),
        b'-' => (-1, &spec[1..]),
        _ => return None,
    };

    let (hours, minutes) = if let Some((h, m)) = rest.split_once(':') {
        (h.parse::<i32>().ok()?, m.parse::<i32>().ok()?)
    } else {
        (rest.parse::<i32>().ok()?, 0)
    };
    if !(0..=18).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn hours(seconds: i32) -> f64 {
    f64::from(seconds) / 3600.0
}

fn year_start(year: i32) -> Result<i64> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .map(|date| date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp())
        .ok_or_else(|| Error::InvalidDate(format!("year {} is not supported", year)))
}

fn instant(tz: Tz, timestamp: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp, 0).ok_or_else(|| {
        Error::CivilRuleGap(format!(
            "{}: transition at {} is out of range",
            tz.name(),
            timestamp
        ))
    })
}

fn offset_seconds_at(tz: Tz, timestamp: i64) -> Result<i32> {
    let at = instant(tz, timestamp)?;
    Ok(tz.offset_from_utc_datetime(&at.naive_utc()).fix().local_minus_utc())
}

/// First second in `(low, high]` at which the offset differs from `before`.
fn find_change(tz: Tz, mut low: i64, mut high: i64, before: i32) -> Result<i64> {
    while high - low > 1 {
        let mid = low + (high - low) / 2;
        if offset_seconds_at(tz, mid)? == before {
            low = mid;
        } else {
            high = mid;
        }
    }
    Ok(high)
}
