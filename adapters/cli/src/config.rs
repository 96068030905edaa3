//! Optional TOML configuration file merged with command-line flags.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;
use traffic_manager_core::WINDOW_TITLE;
use traffic_manager_rendering_macroquad::AssetPaths;
use traffic_manager_system_spawning::{ParseSpawnModeError, SpawnMode};

/// Configuration file consulted when `--config` is not given.
pub(crate) const DEFAULT_CONFIG_PATH: &str = "traffic.toml";

/// Errors raised while reading the configuration file.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {path}")]
    Read {
        /// Location of the file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The file is not valid TOML or contains unknown keys.
    #[error("failed to parse config file {path}")]
    Parse {
        /// Location of the file.
        path: PathBuf,
        /// Underlying parse failure.
        #[source]
        source: toml::de::Error,
    },
    /// The simulation mode is not recognised.
    #[error(transparent)]
    Mode(#[from] ParseSpawnModeError),
    /// The window has no area.
    #[error("window size must be positive (received {width}x{height})")]
    WindowSize {
        /// Configured width.
        width: u32,
        /// Configured height.
        height: u32,
    },
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    window: WindowSection,
    assets: AssetsSection,
    simulation: SimulationSection,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct WindowSection {
    title: String,
    width: u32,
    height: u32,
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            title: WINDOW_TITLE.to_owned(),
            width: 800,
            height: 800,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct AssetsSection {
    sprite_sheet: PathBuf,
    city_texture: PathBuf,
}

impl Default for AssetsSection {
    fn default() -> Self {
        let defaults = AssetPaths::default();
        Self {
            sprite_sheet: defaults.sprite_sheet,
            city_texture: defaults.city_texture,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SimulationSection {
    mode: Option<String>,
    seed: Option<u64>,
}

/// Window parameters used by the rendering backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct WindowSettings {
    pub(crate) title: String,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

/// Settings resolved from the configuration file before flags are applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Settings {
    pub(crate) window: WindowSettings,
    pub(crate) assets: AssetPaths,
    pub(crate) mode: SpawnMode,
    pub(crate) seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            window: WindowSettings {
                title: WINDOW_TITLE.to_owned(),
                width: 800,
                height: 800,
            },
            assets: AssetPaths::default(),
            mode: SpawnMode::default(),
            seed: None,
        }
    }
}

impl Settings {
    /// Loads settings from `path`, or from [`DEFAULT_CONFIG_PATH`] when it exists.
    ///
    /// An explicitly requested file must exist; the default file is optional.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        if !required && !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), "loaded configuration file");
        Self::parse(&contents).map_err(|error| match error {
            ConfigError::Parse { source, .. } => ConfigError::Parse { path, source },
            other => other,
        })
    }

    /// Parses settings from TOML text.
    pub(crate) fn parse(contents: &str) -> Result<Self, ConfigError> {
        let file: FileConfig = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;

        if file.window.width == 0 || file.window.height == 0 {
            return Err(ConfigError::WindowSize {
                width: file.window.width,
                height: file.window.height,
            });
        }

        let mode = match file.simulation.mode {
            Some(mode) => mode.parse()?,
            None => SpawnMode::default(),
        };

        Ok(Self {
            window: WindowSettings {
                title: file.window.title,
                width: file.window.width,
                height: file.window.height,
            },
            assets: AssetPaths {
                sprite_sheet: file.assets.sprite_sheet,
                city_texture: file.assets.city_texture,
            },
            mode,
            seed: file.simulation.seed,
        })
    }
}
