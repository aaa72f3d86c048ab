//! Run configuration assembled by the command line.

use std::fmt;
use std::str::FromStr;

use crate::solar::Horizon;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Csv,
    Json,
    #[cfg(feature = "parquet")]
    Parquet,
}

impl OutputFormat {
    pub fn all() -> &'static [&'static str] {
        #[cfg(feature = "parquet")]
        {
            &["text", "csv", "json", "parquet"]
        }
        #[cfg(not(feature = "parquet"))]
        {
            &["text", "csv", "json"]
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            #[cfg(feature = "parquet")]
            OutputFormat::Parquet => "parquet",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            #[cfg(feature = "parquet")]
            "parquet" => Ok(OutputFormat::Parquet),
            #[cfg(not(feature = "parquet"))]
            "parquet" => Err("PARQUET format not available in this build".to_string()),
            _ => Err(format!(
                "Unknown format: {}. Supported formats: {}",
                s,
                Self::all().join(", ")
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format: OutputFormat,
    pub headers: bool,
    pub show_inputs: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            headers: true,
            show_inputs: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Parameters {
    pub output: OutputOptions,
    pub horizon: Horizon,
    /// Timezone specification; `None` selects the Warsaw rule.
    pub timezone: Option<String>,
    pub gazetteer: Option<std::path::PathBuf>,
    pub country: Option<String>,
    /// Worker threads; `None` uses all available cores.
    pub workers: Option<usize>,
    pub perf: bool,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            output: OutputOptions::default(),
            horizon: Horizon::SunriseSunset,
            timezone: None,
            gazetteer: None,
            country: None,
            workers: None,
            perf: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Local sunrise, sunset and day length per date.
    Series,
    /// UTC sunrise, transit and sunset instants per date.
    Events,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Series => "series",
            Command::Events => "events",
        }
    }
}

/// Where the location comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaceSource {
    Name(String),
    Coordinates(f64, f64),
}

/// Which dates to report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Period {
    /// The current year.
    CurrentYear,
    Year(i32),
    Date(chrono::NaiveDate),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing_is_case_insensitive() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("Text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_defaults() {
        let params = Parameters::default();
        assert_eq!(params.output.format, OutputFormat::Text);
        assert!(params.output.headers);
        assert!(!params.output.show_inputs);
        assert_eq!(params.horizon, Horizon::SunriseSunset);
        assert!(params.timezone.is_none());
    }
}
