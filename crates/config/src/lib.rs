#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for natstage
//!
//! natstage owns no configuration file. Configuration is assembled from:
//! - Default values (hard-coded)
//! - A TOML fragment the host embeds in its own configuration, if any
//! - Environment variables

pub mod constants;

use constants::{
    DEFAULT_TEMP_PREFIX, ENV_EPHEMERAL, ENV_EXPORT_ENV, ENV_REGISTER_SEARCH_PATH,
    ENV_SEARCH_PATH_KEY, ENV_TEMP_PREFIX, ENV_TEMP_ROOT, ENV_WORKING_DIR,
};
use natstage_errors::{ConfigError, Error};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub staging: StagingConfig,

    #[serde(default)]
    pub loader: LoaderConfig,
}

/// Where extracted resources are placed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingConfig {
    /// Stage into a fresh temp directory (`true`) or the working directory
    #[serde(default = "default_ephemeral")]
    pub ephemeral: bool,
    /// Parent of ephemeral staging directories; system temp dir when unset
    #[serde(default)]
    pub temp_root: Option<PathBuf>,
    #[serde(default = "default_temp_prefix")]
    pub temp_prefix: String,
    /// Directory that receives visibility links; process cwd when unset
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

/// Loader search-path registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Build a loader search path containing the staging directory
    #[serde(default)]
    pub register: bool,
    /// Variable to extend; the platform's loader variable when unset
    #[serde(default)]
    pub property_key: Option<String>,
    #[serde(default = "default_prepend_current_dir")]
    pub prepend_current_dir: bool,
    /// Write the rebuilt value back into the process environment
    #[serde(default)]
    pub export_env: bool,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            ephemeral: default_ephemeral(),
            temp_root: None,
            temp_prefix: default_temp_prefix(),
            working_dir: None,
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            register: false,
            property_key: None,
            prepend_current_dir: default_prepend_current_dir(),
            export_env: false,
        }
    }
}

// Default value functions for serde
fn default_ephemeral() -> bool {
    true
}

fn default_temp_prefix() -> String {
    DEFAULT_TEMP_PREFIX.to_string()
}

fn default_prepend_current_dir() -> bool {
    natstage_platform::wants_current_dir_in_search_path()
}

impl Config {
    /// Parse configuration from a TOML fragment
    ///
    /// # Errors
    ///
    /// Returns an error if the fragment is not valid TOML, does not match
    /// the configuration schema, or holds an invalid value.
    pub fn from_toml_str(contents: &str) -> Result<Self, Error> {
        let config: Self = toml::from_str(contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check values the type system does not constrain
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the temp prefix contains a path
    /// separator or the search-path key is empty or contains `=`.
    pub fn validate(&self) -> Result<(), Error> {
        check_temp_prefix("staging.temp_prefix", &self.staging.temp_prefix)?;
        if let Some(key) = &self.loader.property_key {
            check_search_path_key("loader.property_key", key)?;
        }
        Ok(())
    }

    /// Defaults merged with environment overrides
    ///
    /// # Errors
    ///
    /// Returns an error if an environment override holds an invalid value.
    pub fn from_env() -> Result<Self, Error> {
        let mut config = Self::default();
        config.merge_env()?;
        Ok(config)
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        if let Ok(value) = std::env::var(ENV_EPHEMERAL) {
            self.staging.ephemeral = parse_bool(ENV_EPHEMERAL, value)?;
        }

        if let Ok(root) = std::env::var(ENV_TEMP_ROOT) {
            self.staging.temp_root = Some(PathBuf::from(root));
        }

        if let Ok(prefix) = std::env::var(ENV_TEMP_PREFIX) {
            check_temp_prefix(ENV_TEMP_PREFIX, &prefix)?;
            self.staging.temp_prefix = prefix;
        }

        if let Ok(dir) = std::env::var(ENV_WORKING_DIR) {
            self.staging.working_dir = Some(PathBuf::from(dir));
        }

        if let Ok(value) = std::env::var(ENV_REGISTER_SEARCH_PATH) {
            self.loader.register = parse_bool(ENV_REGISTER_SEARCH_PATH, value)?;
        }

        if let Ok(key) = std::env::var(ENV_SEARCH_PATH_KEY) {
            check_search_path_key(ENV_SEARCH_PATH_KEY, &key)?;
            self.loader.property_key = Some(key);
        }

        if let Ok(value) = std::env::var(ENV_EXPORT_ENV) {
            self.loader.export_env = parse_bool(ENV_EXPORT_ENV, value)?;
        }

        tracing::debug!(config = ?self, "natstage configuration after environment merge");
        Ok(())
    }

    /// Directory that receives visibility links (absolute)
    ///
    /// # Errors
    ///
    /// Returns an error if no directory is configured and the process working
    /// directory cannot be determined.
    pub fn working_dir(&self) -> Result<PathBuf, Error> {
        match &self.staging.working_dir {
            Some(dir) if dir.is_absolute() => Ok(dir.clone()),
            Some(dir) => Ok(natstage_platform::fs::current_dir()?.join(dir)),
            None => natstage_platform::fs::current_dir(),
        }
    }

    /// Parent directory for ephemeral staging areas
    #[must_use]
    pub fn temp_root(&self) -> PathBuf {
        self.staging
            .temp_root
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Variable the loader search path is registered under
    #[must_use]
    pub fn search_path_key(&self) -> String {
        self.loader
            .property_key
            .clone()
            .unwrap_or_else(|| natstage_platform::native_search_path_key().to_string())
    }
}

// The prefix becomes part of a single path component
fn check_temp_prefix(field: &str, prefix: &str) -> Result<(), Error> {
    if prefix.contains(std::path::is_separator) {
        return Err(invalid_value(field, prefix));
    }
    Ok(())
}

fn check_search_path_key(field: &str, key: &str) -> Result<(), Error> {
    if key.is_empty() || key.contains('=') {
        return Err(invalid_value(field, key));
    }
    Ok(())
}

fn invalid_value(field: &str, value: &str) -> Error {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
    .into()
}

fn parse_bool(field: &str, value: String) -> Result<bool, Error> {
    match value.as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value,
        }
        .into()),
    }
}
