//! Configuration (`nao-showgame.toml`)
//!
//! Every section is optional; anything left out falls back to the values the
//! show was built around.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::Playfield;
use crate::robot::{Backend, Endpoint};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub robot: RobotConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub assets: AssetConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub backend: Backend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_width")]
    pub width: i32,
    #[serde(default = "default_height")]
    pub height: i32,
    #[serde(default = "default_fps")]
    pub fps: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Directory holding the `.wav` cues.
    #[serde(default = "default_sounds")]
    pub sounds: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Per-voice volume (0.0-1.0).
    #[serde(default = "default_volume")]
    pub volume: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// The terminal belongs to the renderer, so logs go to a file.
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
    /// `EnvFilter` directives; `RUST_LOG` overrides them per target.
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_host() -> String {
    "192.168.13.188".to_string()
}
fn default_port() -> u16 {
    9559
}
fn default_width() -> i32 {
    800
}
fn default_height() -> i32 {
    600
}
fn default_fps() -> u32 {
    60
}
fn default_sounds() -> PathBuf {
    PathBuf::from("sounds")
}
fn default_true() -> bool {
    true
}
fn default_volume() -> f32 {
    0.15
}
fn default_log_file() -> PathBuf {
    PathBuf::from("nao-showgame.log")
}
fn default_filter() -> String {
    "info".to_string()
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            backend: Backend::default(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            sounds: default_sounds(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            volume: default_volume(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            filter: default_filter(),
        }
    }
}

impl RobotConfig {
    pub fn endpoint(&self) -> Endpoint {
        Endpoint {
            host: self.host.clone(),
            port: self.port,
        }
    }
}

impl DisplayConfig {
    pub fn playfield(&self) -> Playfield {
        Playfield {
            width: self.width,
            height: self.height,
        }
    }
}

impl Config {
    /// Parses a TOML document and checks value ranges.
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.display.width < 200 || self.display.height < 200 {
            return Err(ConfigError::Invalid {
                field: "display",
                reason: format!(
                    "{}x{} is smaller than 200x200",
                    self.display.width, self.display.height
                ),
            });
        }
        if self.display.fps == 0 {
            return Err(ConfigError::Invalid {
                field: "display.fps",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.audio.volume) {
            return Err(ConfigError::Invalid {
                field: "audio.volume",
                reason: format!("{} is outside 0.0-1.0", self.audio.volume),
            });
        }
        Ok(())
    }
}

/// Where the loaded configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// No path given.
    Defaults,
    File(PathBuf),
    /// The given path does not exist; defaults were used.
    Missing(PathBuf),
}

/// Loads `path`, or the defaults when no path is given.
///
/// A given path that does not exist falls back to defaults and says so in
/// the returned [`Source`], since logging is not set up yet at this point.
/// A file that exists but does not parse is an error.
pub fn load(path: Option<&Path>) -> Result<(Config, Source), ConfigError> {
    let Some(path) = path else {
        return Ok((Config::default(), Source::Defaults));
    };
    match std::fs::read_to_string(path) {
        Ok(content) => Ok((
            Config::from_toml(&content, path)?,
            Source::File(path.to_path_buf()),
        )),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Ok((Config::default(), Source::Missing(path.to_path_buf())))
        }
        Err(source) => Err(ConfigError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}
