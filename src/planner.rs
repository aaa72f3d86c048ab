//! Execution planning: resolve the place, the year and the civil rule before any computation.

use crate::civil::CivilRule;
use crate::civil::zone::resolve_civil_rule;
use crate::cli::Invocation;
use crate::config::{Command, Parameters, Period, PlaceSource};
use crate::error::PlannerError;
use crate::gazetteer::Gazetteer;
use crate::series::SeriesOptions;
use crate::types::Location;
use chrono::{Datelike, Local, NaiveDate};

pub struct ComputePlan {
    pub location: Location,
    pub year: i32,
    /// Restricts output to one date of `year`.
    pub date: Option<NaiveDate>,
    pub rule: CivilRule,
    pub command: Command,
    pub options: SeriesOptions,
}

pub fn build_job(invocation: Invocation) -> Result<(ComputePlan, Parameters), PlannerError> {
    let Invocation {
        place,
        period,
        command,
        params,
    } = invocation;

    let location = resolve_place(&place, &params)?;

    let (year, date) = match period {
        Period::CurrentYear => (Local::now().year(), None),
        Period::Year(year) => (year, None),
        Period::Date(date) => (date.year(), Some(date)),
    };

    let rule = resolve_civil_rule(params.timezone.as_deref(), year)?;
    log::debug!("using civil rule {} for {}", rule.name, year);

    let mut options = SeriesOptions {
        horizon: params.horizon,
        ..SeriesOptions::default()
    };
    if let Some(workers) = params.workers {
        options.workers = workers;
    }
    if date.is_some() {
        options.workers = 1;
    }

    let plan = ComputePlan {
        location,
        year,
        date,
        rule,
        command,
        options,
    };
    Ok((plan, params))
}

fn resolve_place(place: &PlaceSource, params: &Parameters) -> Result<Location, PlannerError> {
    match place {
        PlaceSource::Coordinates(latitude, longitude) => {
            Ok(Location::from_coordinates(*latitude, *longitude)?)
        }
        PlaceSource::Name(name) => {
            let gazetteer = match &params.gazetteer {
                Some(path) => Gazetteer::from_path(path, params.country.as_deref())?,
                None => Gazetteer::builtin(),
            };
            let location = gazetteer.resolve(name)?;
            log::debug!("resolved '{}' to {}", name, location);
            Ok(location)
        }
    }
}
