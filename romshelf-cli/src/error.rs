use thiserror::Error;

use romshelf_dat::DatError;
use romshelf_lib::ConfigError;

/// Errors that end a CLI run.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// I/O error while writing the report
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Invalid arguments or settings file
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// The catalog could not be loaded
    #[error("Catalog error: {0}")]
    Catalog(#[from] DatError),
}
