//! Identification and relocation engine.
//!
//! A run is a [`Pipeline`] of [`Stage`]s: a scan stage walks the input and
//! fingerprints every file, later stages react to the match and no-match
//! events it produces.

pub mod diag;
pub mod error;
pub mod handle;
pub mod hasher;
pub mod pipeline;
pub mod relocate;
pub mod scan;
pub mod session;
pub mod settings;

pub use diag::{DiagReport, DiagnosticStage, DuplicateEntry, ReportOptions, SystemReport, UnknownEntry};
pub use error::{ConfigError, HandleError};
pub use handle::{ArchiveMember, FileHandle, Transfer};
pub use hasher::{fingerprint, fingerprint_reader};
pub use pipeline::{Chain, Pipeline, ScanItem, Stage};
pub use relocate::{RelocationOptions, RelocationStage, RelocationSummary};
pub use scan::ScanStage;
pub use session::{SessionReport, run_session, run_with_index};
pub use settings::{RunConfig, Settings, settings_path};

#[cfg(test)]
#[path = "tests/fixtures.rs"]
pub(crate) mod fixtures;
