//! Configuration management for SlideshowFX.
//!
//! Parses `slideshowfx.toml` with serde. The file is looked up in the
//! application directory (`~/.SlideshowFX` by default) unless an explicit
//! path is given. Values can be overridden at load time via [`Overrides`].
//!
//! ```toml
//! [application]
//! directory = "${SLIDESHOWFX_HOME:-~/.SlideshowFX}"
//!
//! [recent_presentations]
//! max = 10
//! ```
//!
//! ## Environment Variable Expansion
//!
//! `application.directory` supports `~`, `${VAR}` (error if unset) and
//! `${VAR:-default}`. A relative directory is resolved against the directory
//! containing the config file.

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "slideshowfx.toml";

/// Name of the recent presentations registry inside the application directory.
const CONTEXT_FILENAME: &str = ".slideshowfx.context.xml";

/// Application directory used when none is configured.
const DEFAULT_APPLICATION_DIRECTORY: &str = "~/.SlideshowFX";

/// Number of recent presentations kept when not configured.
pub const DEFAULT_MAX_RECENT_PRESENTATIONS: usize = 10;

/// Largest accepted `recent_presentations.max`.
const MAX_RECENT_PRESENTATIONS_LIMIT: usize = 1000;

/// Values that take precedence over the configuration file.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct Overrides {
    /// Override the application directory.
    pub directory: Option<PathBuf>,
    /// Override the number of recent presentations to keep.
    pub max_recent_presentations: Option<usize>,
}

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application section as written in TOML.
    application: ApplicationConfigRaw,
    /// Recent presentations configuration.
    pub recent_presentations: RecentPresentationsConfig,

    /// Resolved application configuration (set after loading).
    #[serde(skip)]
    pub application_resolved: ApplicationConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_directory(PathBuf::from(".SlideshowFX"))
    }
}

/// Raw application configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ApplicationConfigRaw {
    directory: Option<String>,
}

/// Resolved application configuration with absolute paths.
#[derive(Debug, Default)]
pub struct ApplicationConfig {
    /// Directory holding the configuration and context files.
    pub directory: PathBuf,
}

impl ApplicationConfig {
    /// Recent presentations registry path.
    #[must_use]
    pub fn context_file(&self) -> PathBuf {
        self.directory.join(CONTEXT_FILENAME)
    }

    /// Configuration file path inside the application directory.
    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.directory.join(CONFIG_FILENAME)
    }
}

/// Recent presentations configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RecentPresentationsConfig {
    /// How many recent presentations are stored and shown in "Open recent".
    pub max: usize,
}

impl Default for RecentPresentationsConfig {
    fn default() -> Self {
        Self {
            max: DEFAULT_MAX_RECENT_PRESENTATIONS,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`application.directory`").
        field: String,
        /// Error message from the expansion.
        message: String,
    },
}

impl Config {
    /// Load configuration with optional overrides.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise loads
    /// `slideshowfx.toml` from the default application directory when it
    /// exists, and falls back to defaults.
    ///
    /// Overrides are applied after loading and path resolution.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the resulting configuration is invalid.
    pub fn load(config_path: Option<&Path>, overrides: Option<&Overrides>) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else {
            let directory = Self::default_application_directory()?;
            let candidate = directory.join(CONFIG_FILENAME);
            if candidate.exists() {
                Self::load_from_file(&candidate)?
            } else {
                tracing::debug!(path = %candidate.display(), "no configuration file, using defaults");
                Self::default_with_directory(directory)
            }
        };

        if let Some(overrides) = overrides {
            config.apply_overrides(overrides);
        }

        config.validate()?;
        Ok(config)
    }

    /// Recent presentations registry path.
    #[must_use]
    pub fn context_file(&self) -> PathBuf {
        self.application_resolved.context_file()
    }

    /// Apply overrides to the configuration.
    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(directory) = &overrides.directory {
            self.application_resolved.directory.clone_from(directory);
        }
        if let Some(max) = overrides.max_recent_presentations {
            self.recent_presentations.max = max;
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.application_resolved.directory.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "application.directory cannot be empty".to_owned(),
            ));
        }

        if self.recent_presentations.max > MAX_RECENT_PRESENTATIONS_LIMIT {
            return Err(ConfigError::Validation(format!(
                "recent_presentations.max cannot exceed {MAX_RECENT_PRESENTATIONS_LIMIT}"
            )));
        }

        Ok(())
    }

    fn default_application_directory() -> Result<PathBuf, ConfigError> {
        expand::expand_env(DEFAULT_APPLICATION_DIRECTORY, "application.directory").map(PathBuf::from)
    }

    /// Create default config rooted at `directory`.
    fn default_with_directory(directory: PathBuf) -> Self {
        Self {
            application: ApplicationConfigRaw::default(),
            recent_presentations: RecentPresentationsConfig::default(),
            application_resolved: ApplicationConfig { directory },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir)?;
        config.config_path = Some(path.to_path_buf());

        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Expand and resolve the application directory.
    ///
    /// Without a configured directory, the directory containing the config
    /// file is used.
    fn resolve_paths(&mut self, config_dir: &Path) -> Result<(), ConfigError> {
        let directory = match self.application.directory.as_deref() {
            Some(raw) => {
                let expanded = expand::expand_env(raw, "application.directory")?;
                config_dir.join(expanded)
            }
            None => config_dir.to_path_buf(),
        };

        self.application_resolved = ApplicationConfig { directory };
        Ok(())
    }
}
