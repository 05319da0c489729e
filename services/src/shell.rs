// DLC Core Library: lifecycle management & settlement of discreet log contracts
// Written in 2020 by
//     DLC Core Library contributors
//
// To the extent possible under law, the author(s) have dedicated all
// copyright and related and neighboring rights to this software to
// the public domain worldwide. This software is distributed without
// any warranty.
//
// You should have received a copy of the MIT License
// along with this software.
// If not, see <https://opensource.org/licenses/MIT>.

//! Logging setup for binaries and test harnesses embedding a party

use std::str::FromStr;

use log::{LevelFilter, SetLoggerError};

/// Represents desired logging verbosity level
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Display, Default)]
#[derive(Serialize, Deserialize)]
#[serde(crate = "serde_crate", rename_all = "lowercase")]
pub enum LogLevel {
    /// Report only errors: rejected attestations and failed transitions
    /// are not reported.
    #[display("error")]
    Error = 0,

    /// Report warnings and errors, including rejected oracle attestations.
    #[display("warn")]
    #[default]
    Warn,

    /// Report contract status changes, warnings and errors.
    #[display("info")]
    Info,

    /// Report draft creation, offers sent and polling progress.
    #[display("debug")]
    Debug,

    /// Print all possible messages including tracing information.
    #[display("trace")]
    Trace,
}

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Display, Error)]
#[display(
    "unrecognized value `{0}` for log level type; allowed values are `error`, `warn`, `info`, \
     `debug`, `trace`"
)]
pub struct LogLevelParseError(String);

impl FromStr for LogLevel {
    type Err = LogLevelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "error" | "errors" => LogLevel::Error,
            "warn" | "warning" | "warnings" => LogLevel::Warn,
            "info" => LogLevel::Info,
            "debug" => LogLevel::Debug,
            "trace" | "tracing" => LogLevel::Trace,
            other => return Err(LogLevelParseError(other.to_owned())),
        })
    }
}

impl From<u8> for LogLevel {
    fn from(val: u8) -> Self {
        Self::from_verbosity_flag_count(val)
    }
}

impl From<LogLevel> for u8 {
    fn from(log_level: LogLevel) -> Self {
        log_level.verbosity_flag_count()
    }
}

impl LogLevel {
    /// Indicates number of required verbosity flags
    pub fn verbosity_flag_count(&self) -> u8 {
        match self {
            LogLevel::Error => 0,
            LogLevel::Warn => 1,
            LogLevel::Info => 2,
            LogLevel::Debug => 3,
            LogLevel::Trace => 4,
        }
    }

    /// Constructs enum value from a given number of verbosity flags
    pub fn from_verbosity_flag_count(level: u8) -> Self {
        match level {
            0 => LogLevel::Error,
            1 => LogLevel::Warn,
            2 => LogLevel::Info,
            3 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    pub fn filter(&self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }

    /// Installs `env_logger` with this level. `RUST_LOG`, if set, takes
    /// precedence. Fails if a logger is already installed.
    pub fn apply(&self) -> Result<(), SetLoggerError> {
        env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(self.to_string()),
        )
        .try_init()
    }
}
