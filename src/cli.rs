//! Command-line parsing and validation.

use crate::config::{Command, OutputFormat, Parameters, Period, PlaceSource};
use crate::error::CliError;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::path::PathBuf;

type CliResult<T> = Result<T, CliError>;

type ApplyFn = fn(&str, &mut Parameters) -> CliResult<()>;

enum OptKind {
    Value(ApplyFn),
    Flag(ApplyFn),
}

struct OptionSpec {
    name: &'static str,
    kind: OptKind,
}

const OPTION_SPECS: &[OptionSpec] = &[
    OptionSpec {
        name: "format",
        kind: OptKind::Value(|value, params| {
            params.output.format = value.parse::<OutputFormat>().map_err(CliError::from)?;
            Ok(())
        }),
    },
    OptionSpec {
        name: "timezone",
        kind: OptKind::Value(|value, params| {
            if value.trim().is_empty() {
                return Err("Option --timezone requires a value".into());
            }
            params.timezone = Some(value.trim().to_string());
            Ok(())
        }),
    },
    OptionSpec {
        name: "horizon",
        kind: OptKind::Value(|value, params| {
            params.horizon = value.parse().map_err(CliError::from)?;
            Ok(())
        }),
    },
    OptionSpec {
        name: "gazetteer",
        kind: OptKind::Value(|value, params| {
            params.gazetteer = Some(PathBuf::from(value));
            Ok(())
        }),
    },
    OptionSpec {
        name: "country",
        kind: OptKind::Value(|value, params| {
            params.country = Some(value.to_string());
            Ok(())
        }),
    },
    OptionSpec {
        name: "workers",
        kind: OptKind::Value(|value, params| {
            let workers = value
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    CliError::from(format!(
                        "Invalid workers value: {} (expected a positive integer)",
                        value
                    ))
                })?;
            params.workers = Some(workers);
            Ok(())
        }),
    },
    OptionSpec {
        name: "headers",
        kind: OptKind::Flag(|_, params| {
            params.output.headers = true;
            Ok(())
        }),
    },
    OptionSpec {
        name: "no-headers",
        kind: OptKind::Flag(|_, params| {
            params.output.headers = false;
            Ok(())
        }),
    },
    OptionSpec {
        name: "show-inputs",
        kind: OptKind::Flag(|_, params| {
            params.output.show_inputs = true;
            Ok(())
        }),
    },
    OptionSpec {
        name: "no-show-inputs",
        kind: OptKind::Flag(|_, params| {
            params.output.show_inputs = false;
            Ok(())
        }),
    },
    OptionSpec {
        name: "perf",
        kind: OptKind::Flag(|_, params| {
            params.perf = true;
            Ok(())
        }),
    },
    OptionSpec {
        name: "help",
        kind: OptKind::Flag(|_, _| Err(CliError::Exit(get_help_text()))),
    },
    OptionSpec {
        name: "version",
        kind: OptKind::Flag(|_, _| Err(CliError::Exit(get_version_text()))),
    },
];

/// Parsed invocation: where, when, what, and how to print it.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub place: PlaceSource,
    pub period: Period,
    pub command: Command,
    pub params: Parameters,
}

pub fn parse_cli(args: Vec<String>) -> CliResult<Invocation> {
    if args.len() < 2 {
        return Err(CliError::Exit(usage_line().to_string()));
    }

    let mut params = Parameters::default();
    let mut positional = Vec::new();
    let mut applied_options: HashSet<&'static str> = HashSet::new();

    for arg in args.into_iter().skip(1) {
        if let Some(stripped) = arg.strip_prefix("--") {
            let (name, value) = stripped
                .split_once('=')
                .map(|(n, v)| (n, Some(v)))
                .unwrap_or((stripped, None));
            apply_option(name, value, &mut params, &mut applied_options)?;
        } else {
            positional.push(arg);
        }
    }

    if let Some(first) = positional.first()
        && first == "help"
    {
        return Err(CliError::Exit(get_help_text()));
    }

    if applied_options.contains("country") && params.gazetteer.is_none() {
        return Err("Option --country requires --gazetteer".into());
    }

    let (place, period, command) = parse_positional_args(&positional)?;

    Ok(Invocation {
        place,
        period,
        command,
        params,
    })
}

fn apply_option(
    name: &str,
    value: Option<&str>,
    params: &mut Parameters,
    applied: &mut HashSet<&'static str>,
) -> CliResult<()> {
    let Some(spec) = OPTION_SPECS.iter().find(|s| s.name == name) else {
        return Err(format!("Unknown option: --{}", name).into());
    };

    match spec.kind {
        OptKind::Value(handler) => {
            let val = required_value(spec.name, value)?;
            handler(val, params)?;
        }
        OptKind::Flag(handler) => {
            if value.is_some() {
                return Err(format!("Option --{} does not take a value", spec.name).into());
            }
            handler("", params)?;
        }
    }

    applied.insert(spec.name);
    Ok(())
}

fn required_value<'a>(flag: &'static str, value: Option<&'a str>) -> CliResult<&'a str> {
    value.ok_or_else(|| CliError::from(format!("Option --{} requires a value", flag)))
}

fn parse_positional_args(args: &[String]) -> CliResult<(PlaceSource, Period, Command)> {
    let (command, data_args) = match args.split_last() {
        Some((last, rest)) if last == "series" => (Command::Series, rest),
        Some((last, rest)) if last == "events" => (Command::Events, rest),
        _ => (Command::Series, args),
    };

    if let Some(misplaced) = data_args.iter().find(|a| *a == "series" || *a == "events") {
        return Err(format!("Command '{}' must be the last argument", misplaced).into());
    }

    let (place, rest) = match data_args {
        [] => return Err("Need a place name or a latitude and longitude".into()),
        [lat, lon, rest @ ..] if is_number(lat) && is_number(lon) => {
            let latitude = parse_coordinate("latitude", lat)?;
            let longitude = parse_coordinate("longitude", lon)?;
            (PlaceSource::Coordinates(latitude, longitude), rest)
        }
        [lat, ..] if is_number(lat) => {
            return Err("A latitude must be followed by a longitude".into());
        }
        [name, rest @ ..] => (PlaceSource::Name(name.clone()), rest),
    };

    let period = match rest {
        [] => Period::CurrentYear,
        [period] => parse_period(period)?,
        _ => return Err("Too many arguments".into()),
    };

    Ok((place, period, command))
}

fn is_number(s: &str) -> bool {
    s.parse::<f64>().is_ok()
}

fn parse_coordinate(label: &str, value: &str) -> CliResult<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| CliError::from(format!("Invalid {}: {}", label, value)))
}

fn parse_period(s: &str) -> CliResult<Period> {
    if s.len() == 4 && s.chars().all(|c| c.is_ascii_digit()) {
        let year = s
            .parse::<i32>()
            .map_err(|_| CliError::from(format!("Invalid year: {}", s)))?;
        return Ok(Period::Year(year));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(Period::Date)
        .map_err(|_| CliError::from(format!("Invalid year or date: {} (expected YYYY or YYYY-MM-DD)", s)))
}

fn usage_line() -> &'static str {
    "Usage: sunspan [OPTIONS] <place>|<latitude> <longitude> [<year|date>] [series|events]"
}

fn get_version_text() -> String {
    format!(
        "sunspan {}\n Build: {} ({})\n Built: {}\n Features: {}",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_PROFILE"),
        env!("BUILD_TARGET"),
        env!("BUILD_DATE"),
        env!("BUILD_FEATURES")
    )
}

fn get_help_text() -> String {
    let defaults = Parameters::default();
    let formats = OutputFormat::all().join(", ");
    format!(
        r#"sunspan {}
Calculates sunrise, sunset and day length for every day of a year.

Usage:
  sunspan [OPTIONS] <place> [<year|date>] [series|events]
  sunspan [OPTIONS] <latitude> <longitude> [<year|date>] [series|events]

Examples:
  sunspan Warszawa
  sunspan Kraków 2024 --format=csv
  sunspan 78.22 15.65 2024-06-21 events --timezone=Arctic/Longyearbyen
  sunspan Tokyo --gazetteer=worldcities.csv --country=Japan --timezone=Asia/Tokyo

Arguments:
  <place>            City name, matched case-insensitively. Built-in table
                       holds major Polish cities; see --gazetteer.
  <latitude>         Decimal degrees, -90 to +90 (poles excluded).
  <longitude>        Decimal degrees, -180 to +180.
  <year|date>        2024 for a whole year, 2024-03-20 for one date.
                       Default: current year.

Options:
  --format=<format>     Output format: {}. Default: {}
  --timezone=<tz>       Civil time for local hours: IANA name (Europe/Berlin),
                        offset (+01:00), UTC or system. Default: Polish time
                        (CET/CEST).
  --horizon=<horizon>   Sun altitude defining sunrise and sunset: degrees,
                        standard, civil, nautical or astronomical.
                        Default: {}
  --gazetteer=<file>    CSV file with city, lat and lng columns
                        (worldcities.csv layout).
  --country=<name>      Only use gazetteer rows of this country.
  --workers=<n>         Worker threads. Default: all cores.
  --[no-]headers        Include headers in CSV output. Default: {}
  --[no-]show-inputs    Include the location in every output row.
  --perf                Print performance statistics to stderr.
  --help                Show this help message and exit.
  --version             Print version information and exit.

Commands:
  series                Local sunrise, sunset and day length (default).
  events                UTC sunrise, solar noon and sunset.
"#,
        env!("CARGO_PKG_VERSION"),
        formats,
        defaults.output.format,
        defaults.horizon,
        defaults.output.headers
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solar::Horizon;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("sunspan")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_place_only() {
        let invocation = parse_cli(args(&["Warszawa"])).unwrap();
        assert_eq!(invocation.place, PlaceSource::Name("Warszawa".to_string()));
        assert_eq!(invocation.period, Period::CurrentYear);
        assert_eq!(invocation.command, Command::Series);
    }

    #[test]
    fn test_coordinates_year_and_command() {
        let invocation = parse_cli(args(&["-33.87", "151.21", "2024", "events"])).unwrap();
        assert_eq!(invocation.place, PlaceSource::Coordinates(-33.87, 151.21));
        assert_eq!(invocation.period, Period::Year(2024));
        assert_eq!(invocation.command, Command::Events);
    }

    #[test]
    fn test_single_date() {
        let invocation = parse_cli(args(&["Warsaw", "2024-03-20"])).unwrap();
        assert_eq!(
            invocation.period,
            Period::Date(NaiveDate::from_ymd_opt(2024, 3, 20).unwrap())
        );
    }

    #[test]
    fn test_options() {
        let invocation = parse_cli(args(&[
            "--format=CSV",
            "--timezone=Europe/Berlin",
            "--horizon=civil",
            "--workers=3",
            "--no-headers",
            "--show-inputs",
            "Warsaw",
        ]))
        .unwrap();
        let params = invocation.params;
        assert_eq!(params.output.format, OutputFormat::Csv);
        assert_eq!(params.timezone.as_deref(), Some("Europe/Berlin"));
        assert_eq!(params.horizon, Horizon::CivilTwilight);
        assert_eq!(params.workers, Some(3));
        assert!(!params.output.headers);
        assert!(params.output.show_inputs);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse_cli(args(&["--bogus", "Warsaw"])), Err(CliError::Message(_))));
        assert!(matches!(parse_cli(args(&["--format", "Warsaw"])), Err(CliError::Message(_))));
        assert!(matches!(parse_cli(args(&["--perf=yes", "Warsaw"])), Err(CliError::Message(_))));
        assert!(matches!(parse_cli(args(&["--workers=0", "Warsaw"])), Err(CliError::Message(_))));
        assert!(matches!(parse_cli(args(&["52.0"])), Err(CliError::Message(_))));
        assert!(matches!(parse_cli(args(&["Warsaw", "2024-02-30"])), Err(CliError::Message(_))));
        assert!(matches!(parse_cli(args(&["Warsaw", "2024", "x"])), Err(CliError::Message(_))));
        assert!(matches!(parse_cli(args(&["events", "Warsaw"])), Err(CliError::Message(_))));
        assert!(matches!(
            parse_cli(args(&["--country=Poland", "Warsaw"])),
            Err(CliError::Message(_))
        ));
    }

    #[test]
    fn test_help_and_version_exit() {
        assert!(matches!(parse_cli(args(&["--help"])), Err(CliError::Exit(_))));
        assert!(matches!(parse_cli(args(&["help"])), Err(CliError::Exit(_))));
        assert!(matches!(parse_cli(args(&["--version"])), Err(CliError::Exit(_))));
        assert!(matches!(parse_cli(vec!["sunspan".to_string()]), Err(CliError::Exit(_))));
    }
}
