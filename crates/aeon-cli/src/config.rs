//! Configuration loading and management.

use std::path::{Path, PathBuf};

use aeon_core::WorkingHoursPolicy;
use aeon_holidays::PublicHolidaysConfig;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the ledger file.
    pub data_dir: PathBuf,
    #[serde(default)]
    pub working_hours: WorkingHoursPolicy,
    #[serde(default)]
    pub public_holidays: PublicHolidaysConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: dirs_data_path().unwrap_or_else(|| PathBuf::from(".")),
            working_hours: WorkingHoursPolicy::default(),
            public_holidays: PublicHolidaysConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    ///
    /// Later sources win: defaults, `~/.config/aeon/config.toml`, the given
    /// file, then `AEON_*` environment variables with `__` between nested keys
    /// (e.g. `AEON_WORKING_HOURS__WORK_DAY=7h30m`).
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("AEON_").split("__"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for aeon.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("aeon"))
}

/// Returns the platform-specific data directory for aeon.
///
/// On Linux: `~/.local/share/aeon`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("aeon"))
}
