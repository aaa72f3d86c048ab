//! Civil time: mapping UTC instants to local wall-clock time under a single
//! standard/daylight-saving rule.

pub mod zone;

use crate::error::{Error, Result};
use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, TimeDelta, Timelike, Utc, Weekday,
};

/// Largest UTC offset accepted, in hours.
const MAX_OFFSET_HOURS: f64 = 18.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekOfMonth {
    First,
    Second,
    Third,
    Fourth,
    Last,
}

/// Clock a transition time is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBasis {
    Utc,
    /// Local standard time.
    Standard,
    /// Local time as shown on the clock just before the transition.
    Wall,
}

/// When daylight saving starts or ends.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionRule {
    /// A weekday of a month, e.g. the last Sunday of March at 01:00 UTC.
    Recurring {
        month: u32,
        week: WeekOfMonth,
        weekday: Weekday,
        time: NaiveTime,
        basis: TimeBasis,
    },
    /// A single instant, for rules that only describe one year.
    Fixed(DateTime<Utc>),
}

impl TransitionRule {
    /// The UTC instant of this transition in `year`.
    ///
    /// `into_daylight` tells which offset a wall-clock time refers to.
    pub fn resolve(&self, year: i32, rule: &CivilRule, into_daylight: bool) -> Result<DateTime<Utc>> {
        match self {
            TransitionRule::Fixed(instant) => Ok(*instant),
            TransitionRule::Recurring {
                month,
                week,
                weekday,
                time,
                basis,
            } => {
                let date = weekday_of_month(year, *month, *week, *weekday).ok_or_else(|| {
                    Error::CivilRuleGap(format!(
                        "{}: no {:?} {:?} in month {} of {}",
                        rule.name, week, weekday, month, year
                    ))
                })?;
                let offset_hours = match basis {
                    TimeBasis::Utc => 0.0,
                    TimeBasis::Standard => rule.standard_offset_hours,
                    TimeBasis::Wall if into_daylight => rule.standard_offset_hours,
                    TimeBasis::Wall => rule.dst_offset_hours,
                };
                let offset = offset_seconds(offset_hours, &rule.name)?;
                date.and_time(*time)
                    .and_utc()
                    .checked_sub_signed(TimeDelta::seconds(i64::from(offset)))
                    .ok_or_else(|| {
                        Error::CivilRuleGap(format!(
                            "{}: transition in {} is out of range",
                            rule.name, year
                        ))
                    })
            }
        }
    }
}

/// The UTC offset policy of a region.
///
/// With equal offsets the region has no daylight saving and the transition
/// rules are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct CivilRule {
    pub name: String,
    pub standard_offset_hours: f64,
    pub dst_offset_hours: f64,
    pub dst_start: Option<TransitionRule>,
    pub dst_end: Option<TransitionRule>,
    /// Year the rule was derived for, when it only describes one year.
    pub valid_year: Option<i32>,
}

impl CivilRule {
    pub fn fixed(name: impl Into<String>, offset_hours: f64) -> Self {
        Self {
            name: name.into(),
            standard_offset_hours: offset_hours,
            dst_offset_hours: offset_hours,
            dst_start: None,
            dst_end: None,
            valid_year: None,
        }
    }

    pub fn utc() -> Self {
        Self::fixed("UTC", 0.0)
    }

    /// European Union rule: summer time from the last Sunday of March to the
    /// last Sunday of October, switching at 01:00 UTC.
    pub fn european(name: impl Into<String>, standard_offset_hours: f64) -> Self {
        let at_one_utc = NaiveTime::from_hms_opt(1, 0, 0).unwrap_or(NaiveTime::MIN);
        Self {
            name: name.into(),
            standard_offset_hours,
            dst_offset_hours: standard_offset_hours + 1.0,
            dst_start: Some(TransitionRule::Recurring {
                month: 3,
                week: WeekOfMonth::Last,
                weekday: Weekday::Sun,
                time: at_one_utc,
                basis: TimeBasis::Utc,
            }),
            dst_end: Some(TransitionRule::Recurring {
                month: 10,
                week: WeekOfMonth::Last,
                weekday: Weekday::Sun,
                time: at_one_utc,
                basis: TimeBasis::Utc,
            }),
            valid_year: None,
        }
    }

    /// Poland: CET (UTC+1) with CEST (UTC+2) in summer.
    pub fn warsaw() -> Self {
        Self::european("Europe/Warsaw", 1.0)
    }

    /// United States and Canada rule since 2007: second Sunday of March to the
    /// first Sunday of November, switching at 02:00 local time.
    pub fn north_american(name: impl Into<String>, standard_offset_hours: f64) -> Self {
        let at_two = NaiveTime::from_hms_opt(2, 0, 0).unwrap_or(NaiveTime::MIN);
        Self {
            name: name.into(),
            standard_offset_hours,
            dst_offset_hours: standard_offset_hours + 1.0,
            dst_start: Some(TransitionRule::Recurring {
                month: 3,
                week: WeekOfMonth::Second,
                weekday: Weekday::Sun,
                time: at_two,
                basis: TimeBasis::Wall,
            }),
            dst_end: Some(TransitionRule::Recurring {
                month: 11,
                week: WeekOfMonth::First,
                weekday: Weekday::Sun,
                time: at_two,
                basis: TimeBasis::Wall,
            }),
            valid_year: None,
        }
    }

    pub fn has_daylight_saving(&self) -> bool {
        self.standard_offset_hours != self.dst_offset_hours
    }

    /// Start and end of daylight saving in `year`, if the rule has any.
    pub fn transitions(&self, year: i32) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>> {
        if !self.has_daylight_saving() {
            return Ok(None);
        }
        let start = self
            .dst_start
            .as_ref()
            .ok_or_else(|| self.gap("daylight offset differs but no start rule is set"))?
            .resolve(year, self, true)?;
        let end = self
            .dst_end
            .as_ref()
            .ok_or_else(|| self.gap("daylight offset differs but no end rule is set"))?
            .resolve(year, self, false)?;
        Ok(Some((start, end)))
    }

    pub fn is_daylight_saving(&self, instant: DateTime<Utc>) -> Result<bool> {
        if let Some(year) = self.valid_year
            && !covers(year, instant)
        {
            return Err(self.gap(&format!(
                "rule describes {} only, cannot convert {}",
                year,
                instant.to_rfc3339()
            )));
        }

        let Some((start, end)) = self.transitions(instant.year())? else {
            return Ok(false);
        };

        // Southern hemisphere rules start late in the year and end early.
        Ok(if start <= end {
            instant >= start && instant < end
        } else {
            instant >= start || instant < end
        })
    }

    /// UTC offset in hours in effect at `instant`.
    pub fn offset_at(&self, instant: DateTime<Utc>) -> Result<f64> {
        let hours = if self.is_daylight_saving(instant)? {
            self.dst_offset_hours
        } else {
            self.standard_offset_hours
        };
        offset_seconds(hours, &self.name)?;
        Ok(hours)
    }

    /// `instant` on the local wall clock.
    pub fn to_local(&self, instant: DateTime<Utc>) -> Result<DateTime<FixedOffset>> {
        let seconds = offset_seconds(self.offset_at(instant)?, &self.name)?;
        let offset = FixedOffset::east_opt(seconds)
            .ok_or_else(|| self.gap(&format!("offset of {} seconds is not representable", seconds)))?;
        Ok(instant.with_timezone(&offset))
    }

    fn gap(&self, message: &str) -> Error {
        Error::CivilRuleGap(format!("{}: {}", self.name, message))
    }
}

/// Whether a rule derived for `year` may be applied to `instant`: the year
/// itself plus one day on either side, for local dates that straddle the
/// turn of the year.
fn covers(year: i32, instant: DateTime<Utc>) -> bool {
    let bound = |year: i32, days: i64| {
        NaiveDate::from_ymd_opt(year, 1, 1)
            .and_then(|date| date.checked_add_signed(TimeDelta::days(days)))
            .map(|date| date.and_time(NaiveTime::MIN).and_utc())
    };
    match (bound(year, -1), bound(year + 1, 1)) {
        (Some(from), Some(until)) => instant >= from && instant < until,
        _ => false,
    }
}

/// Local hour of day in [0, 24) of `instant` under `rule`.
pub fn to_local_hour(instant: DateTime<Utc>, rule: &CivilRule) -> Result<f64> {
    Ok(hour_of_day(&rule.to_local(instant)?))
}

/// Fractional hour of day of a local time.
pub fn hour_of_day(local: &DateTime<FixedOffset>) -> f64 {
    f64::from(local.hour())
        + f64::from(local.minute()) / 60.0
        + (f64::from(local.second()) + f64::from(local.nanosecond()) / 1e9) / 3600.0
}

fn offset_seconds(hours: f64, name: &str) -> Result<i32> {
    if !hours.is_finite() || hours.abs() > MAX_OFFSET_HOURS {
        return Err(Error::CivilRuleGap(format!(
            "{}: offset of {} hours is outside ±{} hours",
            name, hours, MAX_OFFSET_HOURS
        )));
    }
    Ok((hours * 3600.0).round() as i32)
}

fn weekday_of_month(year: i32, month: u32, week: WeekOfMonth, weekday: Weekday) -> Option<NaiveDate> {
    let n = match week {
        WeekOfMonth::First => 1,
        WeekOfMonth::Second => 2,
        WeekOfMonth::Third => 3,
        WeekOfMonth::Fourth => 4,
        WeekOfMonth::Last => {
            let first_of_next = if month == 12 {
                NaiveDate::from_ymd_opt(year + 1, 1, 1)?
            } else {
                NaiveDate::from_ymd_opt(year, month + 1, 1)?
            };
            let last = first_of_next.pred_opt()?;
            let back = (last.weekday().num_days_from_monday() + 7
                - weekday.num_days_from_monday())
                % 7;
            return last.checked_sub_signed(TimeDelta::days(i64::from(back)));
        }
    };
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
}
