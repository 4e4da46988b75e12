//! CLI type definitions: arguments and log level.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "romshelf")]
#[command(
    about = "Identify ROM files by content and shelve them in a canonical layout",
    long_about = None
)]
pub(crate) struct Cli {
    /// DAT file or directory of DAT files, followed by the destination root.
    /// The catalog may be left out when settings.toml names one.
    #[arg(value_name = "[CATALOG] DEST", num_args = 1..=2, required = true)]
    pub paths: Vec<PathBuf>,

    /// Relocate files from this directory into the destination
    #[arg(short, long)]
    pub source: Option<PathBuf>,

    /// Delete source files whose content is already in place
    #[arg(long = "del-dupes")]
    pub del_dupes: bool,

    /// Also print the diagnostic report after relocating
    #[arg(long)]
    pub diag: bool,

    /// Leave the list of present ROMs out of the report
    #[arg(long)]
    pub no_having: bool,

    /// Leave the list of missing ROMs out of the report
    #[arg(long)]
    pub no_missing: bool,

    /// Only look at the top level of the scanned directory
    #[arg(long)]
    pub no_recursive: bool,

    /// Look inside ZIP archives
    #[arg(long)]
    pub scan_compressed: bool,

    /// Remove write permission from relocated files
    #[arg(long)]
    pub read_only: bool,

    /// Log verbosity
    #[arg(long, value_enum, default_value_t = LogLevel::Warning)]
    pub loglevel: LogLevel,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LogLevel {
    Error,
    Warning,
    Info,
    Debug,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warning => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
        }
    }
}
