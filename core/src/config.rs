use std::path::{Path, PathBuf};
use std::result::Result as StdResult;
use std::time::Duration;

use anyhow::Context as _;
use serde::Deserialize;

use crate::errors::Result;
use crate::testing::Schedule;

pub const APP_NAME: &str = "casegrade";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(skip)]
    pub source_config_file: Option<PathBuf>,
    #[serde(default)]
    pub grade: GradeConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GradeConfig {
    #[serde(default = "GradeConfig::default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub concurrent: bool,
}

impl Default for GradeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: Self::default_timeout_ms(),
            concurrent: false,
        }
    }
}

impl GradeConfig {
    fn default_timeout_ms() -> u64 {
        5000
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn schedule(&self) -> Schedule {
        if self.concurrent {
            Schedule::Concurrent
        } else {
            Schedule::Sequential
        }
    }
}

impl Config {
    pub const FILENAME: &str = "casegrade.toml";

    pub fn from_toml(s: &str) -> StdResult<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn from_toml_file(filepath: impl Into<PathBuf>) -> Result<Self> {
        let filepath = filepath.into();
        let toml = fsutil::read_to_string(&filepath).context("Cannot read config file")?;
        let mut cfg = Self::from_toml(&toml)
            .with_context(|| format!("Invalid config TOML: {:?}", filepath))?;
        cfg.source_config_file = Some(filepath);
        Ok(cfg)
    }

    /// `<user config dir>/casegrade/casegrade.toml`
    pub fn user_config_filepath() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join(Self::FILENAME))
    }

    /// Nearest config file in `cur_dir` or its ancestors, then the user-wide
    /// one. Defaults if neither exists.
    pub fn discover(cur_dir: impl AsRef<Path>) -> Result<Self> {
        let found = fsutil::find_file_in_ancestors(cur_dir, Self::FILENAME)
            .or_else(|| Self::user_config_filepath().filter(|path| path.is_file()));
        match found {
            Some(path) => {
                log::debug!("Using config {:?}", path);
                Self::from_toml_file(path)
            }
            None => Ok(Self::default()),
        }
    }
}
