use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by file handle operations.
#[derive(Debug, Error)]
pub enum HandleError {
    /// I/O error on the file or the archive holding it
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The ZIP archive could not be read
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Operation not available for this kind of handle
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl HandleError {
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }
}

/// Errors in the run configuration or the settings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Catalog not found: {}", .0.display())]
    CatalogNotFound(PathBuf),

    #[error("No catalog given and none configured in {}", .0.display())]
    MissingCatalog(PathBuf),

    #[error("Destination is not a directory: {}", .0.display())]
    DestinationNotDirectory(PathBuf),

    #[error("Source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings file: {0}")]
    SettingsParse(#[from] toml::de::Error),
}
