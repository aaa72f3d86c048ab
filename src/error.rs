use std::fmt;
use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the solar, civil time, series and gazetteer modules.
///
/// Polar day and polar night are not errors; see [`crate::types::DayKind`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid location: {0}")]
    InvalidLocation(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("No civil time offset applies: {0}")]
    CivilRuleGap(String),
    #[error("Invalid horizon: {0}")]
    InvalidHorizon(String),
    #[error("Unknown location: {0}")]
    UnknownLocation(String),
    #[error("Invalid gazetteer data: {0}")]
    Gazetteer(String),
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

macro_rules! simple_error {
    ($name:ident) => {
        #[derive(Debug)]
        pub struct $name(pub String);

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<std::io::Error> for $name {
            fn from(value: std::io::Error) -> Self {
                Self(value.to_string())
            }
        }

        impl From<Error> for $name {
            fn from(value: Error) -> Self {
                Self(value.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

#[derive(Debug)]
pub enum CliError {
    /// Print message to stdout and exit with code 0 (help/version/usage).
    Exit(String),
    /// Print message to stderr and exit with code 1.
    Message(String),
}

impl From<String> for CliError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

impl From<&str> for CliError {
    fn from(value: &str) -> Self {
        Self::Message(value.to_string())
    }
}

impl From<Error> for CliError {
    fn from(value: Error) -> Self {
        Self::Message(value.to_string())
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Exit(msg) | CliError::Message(msg) => write!(f, "{}", msg),
        }
    }
}

simple_error!(PlannerError);
simple_error!(OutputError);
