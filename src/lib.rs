//! Sunrise, sunset and day length for every day of a year.
//!
//! The library computes solar events from a low-order solar position series,
//! converts them to local civil time and assembles an [`AnnualSeries`].
//!
//! ```
//! use sunspan::{CivilRule, Location, build};
//!
//! let warsaw = Location::new("Warsaw", 52.23, 21.01)?;
//! let series = build(&warsaw, 2024, &CivilRule::warsaw())?;
//! assert_eq!(series.len(), 366);
//! # Ok::<(), sunspan::Error>(())
//! ```

pub mod civil;
pub mod cli;
pub mod compute;
pub mod config;
pub mod error;
pub mod events;
pub mod gazetteer;
mod math;
pub mod output;
#[cfg(feature = "parquet")]
pub mod parquet;
pub mod planner;
pub mod series;
pub mod solar;
pub mod types;

pub use civil::zone::resolve_civil_rule;
pub use civil::{CivilRule, TimeBasis, TransitionRule, WeekOfMonth, to_local_hour};
pub use error::{CliError, Error, Result};
pub use events::{classify_polar, compute_events, compute_events_for_horizon};
pub use gazetteer::Gazetteer;
pub use series::{AnnualSeries, SeriesOptions, build, build_with};
pub use solar::Horizon;
pub use types::{DayKind, DayRecord, Location, SolarEvent};
