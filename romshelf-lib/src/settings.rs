//! Run configuration and the optional settings file.
//!
//! The settings file lives at `~/.config/romshelf/settings.toml` and only
//! supplies defaults; values given on the command line always win.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Canonical path to the settings file: `~/.config/romshelf/settings.toml`.
pub fn settings_path() -> PathBuf {
    let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config.join("romshelf").join("settings.toml")
}

/// Defaults read from `settings.toml`. Missing keys keep their default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// DAT file or directory of DAT files
    pub catalog: Option<PathBuf>,
    pub delete_duplicates: bool,
    pub recursive: bool,
    pub scan_compressed: bool,
    pub strip_write_permission: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog: None,
            delete_duplicates: false,
            recursive: true,
            scan_compressed: false,
            strip_write_permission: false,
        }
    }
}

impl Settings {
    /// Load the settings file at its default location. A missing file gives
    /// the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&settings_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }
}

/// Everything one run needs, after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// DAT file or directory of DAT files
    pub catalog: PathBuf,
    /// Root of the canonical layout
    pub destination: PathBuf,
    /// Files to relocate. Without a source the destination is only diagnosed.
    pub source: Option<PathBuf>,
    pub delete_duplicates: bool,
    pub recursive: bool,
    pub scan_compressed: bool,
    pub strip_write_permission: bool,
    /// Add the diagnostic report to a relocation run
    pub diagnose: bool,
    pub no_missing: bool,
    pub no_having: bool,
}

impl RunConfig {
    /// A configuration with the given paths and default flags.
    pub fn new(catalog: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        let defaults = Settings::default();
        Self {
            catalog: catalog.into(),
            destination: destination.into(),
            source: None,
            delete_duplicates: defaults.delete_duplicates,
            recursive: defaults.recursive,
            scan_compressed: defaults.scan_compressed,
            strip_write_permission: defaults.strip_write_permission,
            diagnose: false,
            no_missing: false,
            no_having: false,
        }
    }

    /// Check that all paths exist and make them absolute.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        if !self.catalog.exists() {
            return Err(ConfigError::CatalogNotFound(self.catalog));
        }
        if !self.destination.is_dir() {
            return Err(ConfigError::DestinationNotDirectory(self.destination));
        }
        self.catalog = self.catalog.canonicalize()?;
        self.destination = self.destination.canonicalize()?;
        if let Some(source) = self.source.take() {
            if !source.exists() {
                return Err(ConfigError::SourceNotFound(source));
            }
            self.source = Some(source.canonicalize()?);
        }
        Ok(self)
    }
}
