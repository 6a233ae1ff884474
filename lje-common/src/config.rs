//! Configuration loading and root folder resolution
//!
//! Bootstrap settings come from an optional TOML file. Every field has a
//! built-in default; a missing or unreadable file never stops startup.
//!
//! Root folder priority:
//! 1. Command-line argument
//! 2. `LJE_ROOT_FOLDER` environment variable
//! 3. `root_folder` in the TOML file
//! 4. OS-dependent default

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::model::Field;
use crate::{Error, Result};

/// Environment variable overriding the data root folder
pub const ROOT_FOLDER_ENV: &str = "LJE_ROOT_FOLDER";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    /// Folder holding the data files (optional, see resolution order)
    pub root_folder: Option<PathBuf>,

    /// Discs table, relative to the root folder unless absolute
    pub discs_file: PathBuf,

    /// Titles table, relative to the root folder unless absolute
    pub titles_file: PathBuf,

    /// Directory of custom list CSV files
    pub lists_dir: PathBuf,

    /// HTTP server port
    pub port: u16,

    /// Cascading filter fields, in chain order
    pub filters: Vec<String>,

    /// Field whose options rotate around the last pick (empty disables)
    pub rotate_field: Option<String>,

    /// Sessions idle longer than this are dropped
    pub session_idle_minutes: u64,

    /// Length of the ranked statistics tables
    pub top_n: usize,

    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            discs_file: PathBuf::from("discs.csv"),
            titles_file: PathBuf::from("titles.csv"),
            lists_dir: PathBuf::from("lists"),
            port: 5790,
            filters: ["country", "year", "artist", "title", "reference"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rotate_field: Some("artist".to_string()),
            session_idle_minutes: 120,
            top_n: crate::report::DEFAULT_TOP_N,
            logging: LoggingConfig::default(),
        }
    }
}

impl TomlConfig {
    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load `path`, or the platform config file when `path` is `None`
    ///
    /// Falls back to defaults (with a warning) when the file is absent or invalid.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = match path.map(Path::to_path_buf).or_else(|| default_config_file().ok()) {
            Some(p) => p,
            None => {
                info!("No config file found, using built-in defaults");
                return Self::default();
            }
        };

        match std::fs::read_to_string(&path) {
            Ok(content) => match Self::from_toml_str(&content) {
                Ok(config) => {
                    info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("{} in {}, using built-in defaults", e, path.display());
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Config file {} not readable ({}), using built-in defaults", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parsed filter chain fields; unknown names are a configuration error
    pub fn filter_fields(&self) -> Result<Vec<Field>> {
        let fields: Vec<Field> = self
            .filters
            .iter()
            .map(|name| name.parse::<Field>())
            .collect::<Result<_>>()
            .map_err(|e| Error::Config(e.to_string()))?;
        if fields.is_empty() {
            return Err(Error::Config("At least one filter field is required".to_string()));
        }
        Ok(fields)
    }

    pub fn rotation_field(&self) -> Result<Option<Field>> {
        match self.rotate_field.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(name) => name
                .parse::<Field>()
                .map(Some)
                .map_err(|e| Error::Config(e.to_string())),
        }
    }

    /// Resolve the data file locations under `root`
    pub fn data_sources(&self, root: &Path) -> DataSources {
        DataSources {
            discs: under(root, &self.discs_file),
            titles: under(root, &self.titles_file),
            lists_dir: under(root, &self.lists_dir),
        }
    }
}

fn under(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Absolute locations of the explorer's input files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSources {
    pub discs: PathBuf,
    pub titles: PathBuf,
    pub lists_dir: PathBuf,
}

impl DataSources {
    /// Standard layout inside one folder
    pub fn in_folder(root: &Path) -> Self {
        TomlConfig::default().data_sources(root)
    }
}

/// Root folder resolution: CLI argument, environment, TOML, OS default
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// Platform config file location (`<config_dir>/laserjuke/config.toml`)
fn default_config_file() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("laserjuke").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Ok(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/laserjuke/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("laserjuke"))
        .unwrap_or_else(|| PathBuf::from("./laserjuke_data"))
}
