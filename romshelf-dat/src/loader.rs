use std::fs;
use std::path::{Path, PathBuf};

use crate::dat::{self, DatFile};
use crate::error::DatError;
use crate::index::DatIndex;

/// List the DAT files of a catalog path.
///
/// A file is returned as is. A directory yields its regular files (not
/// recursively), sorted by name so loading order is stable.
pub fn catalog_files(path: &Path) -> Result<Vec<PathBuf>, DatError> {
    if !path.is_dir() {
        if !path.exists() {
            return Err(DatError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("catalog not found: {}", path.display()),
            )));
        }
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Parse every DAT file of a catalog path.
///
/// Files that fail to parse are logged and skipped. Entries rejected while
/// parsing are logged and dropped from the returned files.
pub fn load_dats(path: &Path) -> Result<Vec<DatFile>, DatError> {
    let mut dats = Vec::new();
    for file in catalog_files(path)? {
        match dat::parse_dat_file(&file) {
            Ok(mut parsed) => {
                for rejected in parsed.rejected.drain(..) {
                    log::warn!("{}: entry skipped: {rejected}", file.display());
                }
                log::info!(
                    "Loaded {} games from {} ({})",
                    parsed.games.len(),
                    parsed.header.name,
                    file.display()
                );
                dats.push(parsed);
            }
            Err(e) => {
                log::warn!("DAT file {} skipped: {e}", file.display());
            }
        }
    }
    Ok(dats)
}

/// Load a catalog path into a merged index.
pub fn load_index(path: &Path) -> Result<DatIndex, DatError> {
    let dats = load_dats(path)?;
    let index = DatIndex::from_dats(dats);
    log::info!(
        "Catalog ready: {} DAT files, {} games, {} ROMs",
        index.header_count(),
        index.game_count(),
        index.rom_count()
    );
    Ok(index)
}
