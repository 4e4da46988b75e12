//! romshelf CLI
//!
//! Identifies ROM files by content against DAT catalogs, moves them into a
//! canonical layout and reports what is missing.

mod cli_types;
mod display;
mod error;

use std::io;
use std::path::PathBuf;

use clap::Parser;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stderr;

use romshelf_lib::{ConfigError, RunConfig, Settings, run_session, settings_path};

use crate::cli_types::Cli;
use crate::error::CliError;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.loglevel.into());

    if let Err(e) = run(cli) {
        eprintln!("{} {e}", "error:".if_supports_color(Stderr, |t| t.red()));
        std::process::exit(1);
    }
}

fn init_logging(level: log::LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let settings = Settings::load()?;
    let config = build_config(cli, &settings)?.validate()?;

    log::info!("Catalog: {}", config.catalog.display());
    log::info!("Destination: {}", config.destination.display());
    if let Some(source) = &config.source {
        log::info!("Source: {}", source.display());
    }

    let report = run_session(&config)?;
    display::print_session(&mut io::stdout().lock(), &report)?;
    Ok(())
}

/// Merge command-line values over the settings file. Flags can only switch
/// a setting on (or `recursive` off); they never restore a default.
fn build_config(cli: Cli, settings: &Settings) -> Result<RunConfig, ConfigError> {
    let mut paths = cli.paths.into_iter();
    let (catalog, destination) = match (paths.next(), paths.next()) {
        (Some(catalog), Some(destination)) => (catalog, destination),
        (Some(destination), None) => match &settings.catalog {
            Some(catalog) => (catalog.clone(), destination),
            None => return Err(ConfigError::MissingCatalog(settings_path())),
        },
        // clap requires at least one path
        (None, _) => return Err(ConfigError::MissingCatalog(settings_path())),
    };

    let mut config = RunConfig::new(catalog, destination);
    config.source = cli.source;
    config.delete_duplicates = cli.del_dupes || settings.delete_duplicates;
    config.recursive = settings.recursive && !cli.no_recursive;
    config.scan_compressed = cli.scan_compressed || settings.scan_compressed;
    config.strip_write_permission = cli.read_only || settings.strip_write_permission;
    config.diagnose = cli.diag;
    config.no_missing = cli.no_missing;
    config.no_having = cli.no_having;
    Ok(config)
}
