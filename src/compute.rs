//! Runs a plan and collects the rows to print.

use crate::config::Command;
use crate::error::Result;
use crate::events::{compute_events_for_horizon, day_kind};
use crate::planner::ComputePlan;
use crate::series::{AnnualSeries, build_with, dates_of_year, day_record};
use crate::solar::Horizon;
use crate::types::{DayKind, DayRecord, Location, SolarEvent};

#[derive(Debug, Clone, PartialEq)]
pub struct EventRow {
    pub event: SolarEvent,
    pub kind: DayKind,
}

#[derive(Debug, Clone)]
pub enum Report {
    Series(AnnualSeries),
    /// A single date, computed without building the rest of its year.
    Day {
        location: Location,
        rule_name: String,
        horizon: Horizon,
        record: DayRecord,
    },
    Events {
        location: Location,
        rows: Vec<EventRow>,
    },
}

impl Report {
    pub fn location(&self) -> &Location {
        match self {
            Report::Series(series) => series.location(),
            Report::Day { location, .. } | Report::Events { location, .. } => location,
        }
    }

    /// Day records to print; empty for event reports.
    pub fn day_records(&self) -> &[DayRecord] {
        match self {
            Report::Series(series) => series.records(),
            Report::Day { record, .. } => std::slice::from_ref(record),
            Report::Events { .. } => &[],
        }
    }

    pub fn event_rows(&self) -> &[EventRow] {
        match self {
            Report::Events { rows, .. } => rows,
            Report::Series(_) | Report::Day { .. } => &[],
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Report::Events { rows, .. } => rows.len(),
            Report::Series(_) | Report::Day { .. } => self.day_records().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn run(plan: &ComputePlan) -> Result<Report> {
    match plan.command {
        Command::Series => match plan.date {
            Some(date) => {
                let horizon = plan.options.horizon.validated()?;
                let record = day_record(date, &plan.location, &plan.rule, horizon)?;
                Ok(Report::Day {
                    location: plan.location.clone(),
                    rule_name: plan.rule.name.clone(),
                    horizon,
                    record,
                })
            }
            None => Ok(Report::Series(build_with(
                &plan.location,
                plan.year,
                &plan.rule,
                &plan.options,
            )?)),
        },
        Command::Events => {
            let dates = match plan.date {
                Some(date) => vec![date],
                None => dates_of_year(plan.year)?,
            };
            let rows = dates
                .into_iter()
                .map(|date| {
                    let event =
                        compute_events_for_horizon(date, &plan.location, plan.options.horizon)?;
                    let kind = day_kind(&event, &plan.location, plan.options.horizon)?;
                    Ok(EventRow { event, kind })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Report::Events {
                location: plan.location.clone(),
                rows,
            })
        }
    }
}
