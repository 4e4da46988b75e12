use romshelf_dat::{DatError, DatIndex};

use crate::diag::{DiagReport, DiagnosticStage, ReportOptions};
use crate::pipeline::Pipeline;
use crate::relocate::{RelocationOptions, RelocationStage, RelocationSummary};
use crate::scan::ScanStage;
use crate::settings::RunConfig;

/// Everything a run hands back once its pipeline is finalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    pub diagnostics: Option<DiagReport>,
    pub relocation: Option<RelocationSummary>,
}

/// Load the catalog of `config` and run it.
pub fn run_session(config: &RunConfig) -> Result<SessionReport, DatError> {
    let index = romshelf_dat::load_index(&config.catalog)?;
    Ok(run_with_index(&index, config))
}

/// Build the pipeline for `config` and drive it over the scan root.
///
/// With a source the pipeline is scan, then diagnostics when asked for, then
/// relocation into the destination. Without one, the destination itself is
/// scanned and diagnosed.
pub fn run_with_index(index: &DatIndex, config: &RunConfig) -> SessionReport {
    let mut diagnostics = None;
    let mut relocation = None;
    let report_options = ReportOptions {
        missing: !config.no_missing,
        having: !config.no_having,
    };

    {
        let mut pipeline = Pipeline::new();
        let root = match config.source {
            Some(ref source) => {
                pipeline.chain(RelocationStage::new(
                    index,
                    RelocationOptions {
                        destination: config.destination.clone(),
                        delete_duplicates: config.delete_duplicates,
                        strip_write_permission: config.strip_write_permission,
                    },
                    |summary| relocation = Some(summary),
                ));
                if config.diagnose {
                    pipeline.chain(DiagnosticStage::new(index, report_options, |report| {
                        diagnostics = Some(report)
                    }));
                }
                source.clone()
            }
            None => {
                pipeline.chain(DiagnosticStage::new(index, report_options, |report| {
                    diagnostics = Some(report)
                }));
                config.destination.clone()
            }
        };

        if config.scan_compressed {
            pipeline.chain(ScanStage::with_archives(index));
        } else {
            pipeline.chain(ScanStage::new(index));
        }

        log::info!("scanning {}", root.display());
        pipeline.run(vec![root], config.recursive);
    }

    SessionReport {
        diagnostics,
        relocation,
    }
}
