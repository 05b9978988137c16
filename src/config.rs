/// Configuration for hourglass
///
/// Works out where the project and session stores live. Nothing here reads
/// the current working directory; every path is explicit.

use crate::error::{Result, TrackerError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the data directory
pub const DATA_DIR_ENV: &str = "HOURGLASS_DATA_DIR";

const APP_DIR: &str = "hourglass";
const CONFIG_FILE: &str = "config.toml";
const PROJECTS_FILE: &str = "projects.json";
const SESSIONS_FILE: &str = "sessions.json";

/// Resolved store locations
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub projects_path: PathBuf,
    pub sessions_path: PathBuf,
}

/// On-disk config file, every key optional
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    data_dir: Option<PathBuf>,
}

impl Config {
    /// Build a config that keeps both stores in `data_dir`
    pub fn for_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        Self {
            projects_path: data_dir.join(PROJECTS_FILE),
            sessions_path: data_dir.join(SESSIONS_FILE),
            data_dir,
        }
    }

    /// Resolve the config for this invocation
    ///
    /// Order: explicit override (the `--data-dir` flag), then
    /// `HOURGLASS_DATA_DIR`, then `data_dir` in `config.toml`, then the
    /// platform data directory.
    pub fn resolve(override_dir: Option<PathBuf>) -> Result<Self> {
        if let Some(dir) = override_dir {
            return Ok(Self::for_dir(dir));
        }

        if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::for_dir(PathBuf::from(dir)));
        }

        if let Some(config_dir) = dirs::config_dir() {
            let file = config_dir.join(APP_DIR).join(CONFIG_FILE);
            if let Some(dir) = Self::read_file(&file)?.data_dir {
                return Ok(Self::for_dir(dir));
            }
        }

        let data_dir = dirs::data_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))
            .ok_or_else(|| TrackerError::Config("could not find a data directory".to_string()))?;

        Ok(Self::for_dir(data_dir.join(APP_DIR)))
    }

    fn read_file(path: &Path) -> Result<FileConfig> {
        if !path.exists() {
            return Ok(FileConfig::default());
        }

        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| TrackerError::Config(format!("{}: {}", path.display(), e)))
    }
}
