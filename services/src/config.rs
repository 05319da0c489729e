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

//! Application configuration. Values are read from a TOML file and may be
//! overridden with environment variables: `DLC_LOG_LEVEL=debug`,
//! `DLC_POLL__MAX_DELAY_MS=5000` or `DLC_PARTY__SUPPORTED_COIN_TYPES=0,257`
//! (double underscore separates nested keys, comma separates list items).

use std::fs;
use std::path::Path;
use std::sync::Arc;

use dlc_core::{Clock, Party, PartyConfig};

use crate::{ConfigError, LogLevel, PollPolicy};

/// Prefix of environment variables overriding config file values
pub const ENV_PREFIX: &str = "DLC";

/// Config keys holding lists, given in environment as comma-separated items
const ENV_LIST_KEYS: [&str; 1] = ["party.supported_coin_types"];

#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(crate = "serde_crate", default)]
pub struct Config {
    pub log_level: LogLevel,
    pub party: PartyConfig,
    pub poll: PollPolicy,
}

impl Config {
    /// Reads config file at `path` applying `DLC_`-prefixed environment
    /// overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    pub fn load_with_prefix(path: impl AsRef<Path>, env_prefix: &str) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        debug!("Loading config from {}", path.display());
        let env = ENV_LIST_KEYS.iter().fold(
            settings::Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
            |env, key| env.with_list_parse_key(key),
        );
        let config = settings::Config::builder()
            .add_source(settings::File::from(path).format(settings::FileFormat::Toml))
            .add_source(env)
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Writes config file with default values, unless there is one already
    pub fn write_default(path: impl AsRef<Path>) -> Result<bool, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            return Ok(false);
        }
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, Config::default().to_toml()?)?;
        info!("Default config written to {}", path.display());
        Ok(true)
    }

    /// Constructs party context with the configured policy
    pub fn party(&self, clock: Arc<dyn Clock>) -> Party {
        Party::new(self.party.clone(), clock)
    }
}
