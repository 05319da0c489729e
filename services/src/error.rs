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

use std::io;

use dlc_core::{ContractIdx, ContractStatus};

/// Error happening during config loading or initialization
#[derive(Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum ConfigError {
    /// I/O error during config file processing:
    /// {0}
    Io(String),

    /// Unable to read configuration:
    /// {0}
    #[from]
    Settings(settings::ConfigError),

    /// Unable to produce TOML for the config file:
    /// {0}
    #[from]
    Toml(toml::ser::Error),
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Errors which may happen while waiting for a contract to reach some status
#[derive(Clone, PartialEq, Eq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum WaitError {
    /// Contract operation has failed:
    /// {0}
    #[from]
    Core(dlc_core::Error),

    /// contract {0} has reached final status {1} instead of the awaited one
    UnexpectedStatus(ContractIdx, ContractStatus),

    /// waiting for contract {0} was cancelled
    Cancelled(ContractIdx),

    /// contract {0} is still in {1} status after {2} checks
    AttemptsExhausted(ContractIdx, ContractStatus, u32),
}
