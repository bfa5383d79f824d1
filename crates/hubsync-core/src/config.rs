//! Operator settings.
//!
//! Settings live in `config.toml` under the state directory. A missing file
//! means defaults. The hub endpoint is deliberately re-read on every hub call
//! through [`EndpointSource`], since operators may change it between passes.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use hubsync_schema::{CoreApiVersion, DEFAULT_ENDPOINT_BASE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Unknown update schedule '{0}' (expected never, daily or weekly)")]
    Schedule(String),
}

/// How often the scheduled "update libraries" tick fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateSchedule {
    #[default]
    Never,
    Daily,
    Weekly,
}

impl UpdateSchedule {
    /// Time between ticks, or `None` when scheduled passes are disabled.
    pub fn interval(self) -> Option<Duration> {
        match self {
            Self::Never => None,
            Self::Daily => Some(Duration::from_secs(24 * 60 * 60)),
            Self::Weekly => Some(Duration::from_secs(7 * 24 * 60 * 60)),
        }
    }
}

impl fmt::Display for UpdateSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Never => "never",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        })
    }
}

impl FromStr for UpdateSchedule {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "never" => Ok(Self::Never),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            other => Err(ConfigError::Schedule(other.to_string())),
        }
    }
}

/// Contents of `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Hub base URL without trailing slash, e.g. `hub-api.h5p.org/v1`.
    pub endpoint_url_base: String,
    pub update_schedule: UpdateSchedule,
    /// Core API version of the local host framework.
    pub core_api_version: CoreApiVersion,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint_url_base: DEFAULT_ENDPOINT_BASE.to_string(),
            update_schedule: UpdateSchedule::Never,
            core_api_version: CoreApiVersion::new(1, 24),
        }
    }
}

impl Settings {
    /// Load settings, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let mut settings: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.endpoint_url_base = normalize_endpoint(&settings.endpoint_url_base);
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Strip whitespace and trailing slashes from an endpoint base.
pub fn normalize_endpoint(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}

/// Turn an endpoint base into an absolute URL prefix.
///
/// Bases without a scheme get `https://`; a base that already names
/// `http://` or `https://` is used as-is.
pub fn endpoint_url(base: &str) -> String {
    let base = normalize_endpoint(base);
    if base.starts_with("https://") || base.starts_with("http://") {
        base
    } else {
        format!("https://{base}")
    }
}

/// Where the hub client reads its base URL from on each call.
pub trait EndpointSource: Send + Sync {
    fn endpoint_base(&self) -> Result<String, ConfigError>;
}

/// A fixed endpoint, e.g. from `--endpoint` or a test server.
#[derive(Debug, Clone)]
pub struct FixedEndpoint(pub String);

impl EndpointSource for FixedEndpoint {
    fn endpoint_base(&self) -> Result<String, ConfigError> {
        Ok(normalize_endpoint(&self.0))
    }
}

/// Reads `endpoint_url_base` from the settings file every time it is asked.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EndpointSource for SettingsFile {
    fn endpoint_base(&self) -> Result<String, ConfigError> {
        Settings::load(&self.path).map(|s| s.endpoint_url_base)
    }
}
