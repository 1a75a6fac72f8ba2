use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::theme::ColorName;

const CONFIG_FILE_NAME: &str = "config.json";
const MIN_REFRESH_RATE: f64 = 0.1;
const MAX_REFRESH_RATE: f64 = 3600.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Runtime configuration. Built once at startup and then only read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// Seconds between frames; also the CPU measurement window.
    #[serde(default = "default_refresh_rate")]
    pub refresh_rate: f64,
    #[serde(default = "default_ping_target")]
    pub ping_target: String,
    #[serde(default = "default_ping_port")]
    pub ping_port: u16,
    #[serde(default = "default_true")]
    pub show_cpu_per_core: bool,
    #[serde(default)]
    pub logging_enabled: bool,
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub colors: ColorScheme,
}

/// Tier boundaries in percent. `mid < high` after sanitizing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub mid: f64,
    pub high: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorScheme {
    pub label: ColorName,
    pub value_low: ColorName,
    pub value_mid: ColorName,
    pub value_high: ColorName,
    pub alert: ColorName,
}

fn default_refresh_rate() -> f64 { 0.5 }
fn default_ping_target() -> String { "8.8.8.8".into() }
fn default_ping_port() -> u16 { 53 }
fn default_true() -> bool { true }
fn default_log_file() -> PathBuf { PathBuf::from("system_metrics.csv") }

impl Default for Thresholds {
    fn default() -> Self {
        Self { mid: 50.0, high: 80.0 }
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            label: ColorName::Red,
            value_low: ColorName::Green,
            value_mid: ColorName::Yellow,
            value_high: ColorName::Red,
            alert: ColorName::Red,
        }
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            refresh_rate: default_refresh_rate(),
            ping_target: default_ping_target(),
            ping_port: default_ping_port(),
            show_cpu_per_core: true,
            logging_enabled: false,
            log_file: default_log_file(),
            thresholds: Thresholds::default(),
            colors: ColorScheme::default(),
        }
    }
}

impl Preferences {
    /// Per-user config location: Windows → AppData/Local/vitals/
    /// Linux → ~/.config/vitals/
    fn user_config_path() -> PathBuf {
        dirs::config_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vitals")
            .join(CONFIG_FILE_NAME)
    }

    /// The file to read: an explicit path wins, then `./config.json`, then
    /// the per-user location. `None` when nothing exists.
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        [PathBuf::from(CONFIG_FILE_NAME), Self::user_config_path()]
            .into_iter()
            .find(|p| p.is_file())
    }

    /// Load the effective configuration. Never fails: a missing file is
    /// silent, a broken one is logged and replaced by defaults.
    pub fn load(explicit: Option<&Path>) -> Self {
        let Some(path) = Self::locate(explicit) else {
            debug!("no configuration file found, using defaults");
            return Self::default();
        };
        match Self::read(&path) {
            Ok(prefs) => prefs,
            Err(ConfigError::Read { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Self::default()
            }
            Err(e) => {
                info!("{e}; using default configuration");
                Self::default()
            }
        }
    }

    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Layer a (possibly partial) JSON document over the defaults.
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let mut prefs: Self = serde_json::from_str(contents)?;
        prefs.sanitize();
        Ok(prefs)
    }

    /// Clamp numeric fields to usable ranges.
    fn sanitize(&mut self) {
        if !self.refresh_rate.is_finite() {
            self.refresh_rate = default_refresh_rate();
        }
        self.refresh_rate = self.refresh_rate.clamp(MIN_REFRESH_RATE, MAX_REFRESH_RATE);

        if self.ping_port == 0 {
            self.ping_port = default_ping_port();
        }

        let t = &mut self.thresholds;
        if !(t.mid.is_finite() && t.high.is_finite()) {
            *t = Thresholds::default();
        }
        t.mid = t.mid.clamp(0.0, 100.0);
        t.high = t.high.clamp(0.0, 100.0);
        if t.mid >= t.high {
            *t = Thresholds::default();
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| ConfigError::Write {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, json).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
