#![allow(dead_code)]

use assert_cmd::Command;
use predicates::prelude::*;

/// Test helper for running sunspan commands with less boilerplate
pub struct SunspanTest {
    cmd: Command,
}

pub fn sunspan_command() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("sunspan"));
    cmd.env_remove("RUST_LOG");
    cmd
}

impl SunspanTest {
    pub fn new() -> Self {
        Self {
            cmd: sunspan_command(),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        self.cmd.args(args);
        self
    }

    pub fn arg<S: AsRef<std::ffi::OsStr>>(mut self, arg: S) -> Self {
        self.cmd.arg(arg);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.cmd.env(key, value);
        self
    }

    pub fn assert_success(mut self) -> assert_cmd::assert::Assert {
        self.cmd.assert().success()
    }

    /// Assert the command succeeds and contains text in stdout
    pub fn assert_success_contains(mut self, text: &str) -> assert_cmd::assert::Assert {
        self.cmd
            .assert()
            .success()
            .stdout(predicate::str::contains(text))
    }

    /// Assert the command succeeds and contains all texts in stdout
    pub fn assert_success_contains_all(mut self, texts: &[&str]) -> assert_cmd::assert::Assert {
        let mut assertion = self.cmd.assert().success();
        for text in texts {
            assertion = assertion.stdout(predicate::str::contains(*text));
        }
        assertion
    }

    /// Assert the command exits with status 1 and an error message on stderr
    pub fn assert_error_contains(mut self, text: &str) -> assert_cmd::assert::Assert {
        self.cmd
            .assert()
            .code(1)
            .stderr(predicate::str::starts_with("Error:"))
            .stderr(predicate::str::contains(text))
    }

    pub fn assert_failure(mut self) -> assert_cmd::assert::Assert {
        self.cmd.assert().failure()
    }

    pub fn command(self) -> Command {
        self.cmd
    }

    pub fn get_output(mut self) -> std::process::Output {
        self.cmd.output().unwrap()
    }

    /// Run and return stdout as a string, asserting success
    pub fn stdout(self) -> String {
        let output = self.get_output();
        assert!(
            output.status.success(),
            "command failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).unwrap()
    }
}

/// Whole-year Warsaw series in the given format
pub fn warsaw_year(format: &str) -> SunspanTest {
    SunspanTest::new().args(["Warsaw", "2024", &format!("--format={}", format)])
}

/// Splits a CSV line into fields
pub fn fields(line: &str) -> Vec<&str> {
    line.split(',').collect()
}

/// Parses an `HH:MM` clock value into fractional hours
pub fn clock_hours(text: &str) -> f64 {
    let (h, m) = text.trim().split_once(':').unwrap();
    h.parse::<f64>().unwrap() + m.parse::<f64>().unwrap() / 60.0
}
