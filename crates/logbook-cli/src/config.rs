//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono_tz::Tz;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use logbook_core::UnknownPolicy;
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// IANA name of the drivers' home-terminal timezone.
    pub timezone: String,

    /// Days covered by `logbook window` when `--days` is not given.
    pub window_days: u32,

    /// How unrecorded hours appear in totals.
    pub unknown_policy: UnknownPolicy,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("timezone", &self.timezone)
            .field("window_days", &self.window_days)
            .field("unknown_policy", &self.unknown_policy)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string()),
            window_days: 7,
            unknown_policy: UnknownPolicy::Distinct,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (LOGBOOK_*)
        figment = figment.merge(Env::prefixed("LOGBOOK_"));

        figment.extract()
    }

    /// Resolves the reference timezone, preferring `override_tz` when given.
    pub fn reference_tz(&self, override_tz: Option<&str>) -> anyhow::Result<Tz> {
        let name = override_tz.unwrap_or(&self.timezone);
        name.parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("invalid timezone: {name}"))
    }
}

/// Returns the platform-specific config directory for logbook.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("logbook"))
}
