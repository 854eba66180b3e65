// Editor configuration, stored as TOML under the platform config directory

use std::{
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::catalog::DEFAULT_SAMPLE_TEXT;
use crate::dragdrop::{InsertionMode, SnapPolicy};
use crate::format::{DEFAULT_PLACEHOLDER, ScanConfig};

const QUALIFIER: &str = "dev";
const ORGANIZATION: &str = "MdLive";
const APPLICATION: &str = "mdlive";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DropConfig {
    pub snap: SnapPolicy,
    pub mode: InsertionMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub sample_text: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            sample_text: DEFAULT_SAMPLE_TEXT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub scan: ScanConfig,
    /// Word inserted between markers when toggling on an empty selection
    pub placeholder: String,
    pub drop: DropConfig,
    pub catalog: CatalogConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            scan: ScanConfig::default(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            drop: DropConfig::default(),
            catalog: CatalogConfig::default(),
        }
    }
}

pub fn config_file_path() -> Option<PathBuf> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

impl EditorConfig {
    pub fn from_toml(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `path`; a missing file gives the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(path, &contents),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Load from `path`, logging any problem and falling back to the defaults
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|err| {
            warn!("{err}; using default configuration");
            Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let toml = toml::to_string_pretty(self)?;
        fs::write(path, toml).map_err(write_err)
    }
}
