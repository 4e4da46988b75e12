use std::cell::RefCell;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use romshelf_dat::DatIndex;

use crate::handle::{ArchiveMember, FileHandle};
use crate::hasher;
use crate::pipeline::{Chain, ScanItem, Stage};

/// Local file header and end of central directory (empty archive) magic.
const ZIP_MAGIC: [[u8; 4]; 2] = [*b"PK\x03\x04", *b"PK\x05\x06"];

/// Walks the given paths, fingerprints every file and reports a match or
/// no-match event for it to the rest of the chain.
///
/// With `scan_archives` on, a file that does not match by itself but is a
/// ZIP archive is opened and each member is reported as its own item.
pub struct ScanStage<'a> {
    index: &'a DatIndex,
    scan_archives: bool,
}

impl<'a> ScanStage<'a> {
    pub fn new(index: &'a DatIndex) -> Self {
        Self {
            index,
            scan_archives: false,
        }
    }

    pub fn with_archives(index: &'a DatIndex) -> Self {
        Self {
            index,
            scan_archives: true,
        }
    }

    fn dispatch(&self, item: &ScanItem<'_>, next: &mut Chain<'_, '_>) {
        match self.index.find_match(&item.fingerprint) {
            Some(records) => {
                next.on_match(item, records);
            }
            None => next.on_no_match(item),
        }
    }

    fn scan_file(&self, path: &Path, next: &mut Chain<'_, '_>) {
        let handle = FileHandle::plain(path);
        let fingerprint = hasher::fingerprint(&handle);
        let item = ScanItem {
            handle,
            fingerprint,
        };

        if let Some(records) = self.index.find_match(&item.fingerprint) {
            next.on_match(&item, records);
        } else if self.scan_archives && is_zip(path) {
            self.scan_archive(&item, next);
        } else {
            next.on_no_match(&item);
        }
    }

    /// Report every non-directory member of a ZIP archive. An archive that
    /// can not be read or has no members is reported once as no-match.
    fn scan_archive(&self, container: &ScanItem<'_>, next: &mut Chain<'_, '_>) {
        let path = container.location();
        log::debug!("scanning archive {}", path.display());

        let archive = match File::open(&path)
            .map_err(zip::result::ZipError::Io)
            .and_then(ZipArchive::new)
        {
            Ok(archive) => RefCell::new(archive),
            Err(e) => {
                log::warn!("could not read archive {}: {e}", path.display());
                next.on_no_match(container);
                return;
            }
        };

        let len = archive.borrow().len();
        let mut members = 0;
        for index in 0..len {
            let entry = {
                let mut zip = archive.borrow_mut();
                match zip.by_index(index) {
                    Ok(entry) => (entry.is_dir(), entry.name().to_string(), entry.size()),
                    Err(e) => {
                        log::warn!(
                            "skipping entry {index} of archive {}: {e}",
                            path.display()
                        );
                        continue;
                    }
                }
            };
            let (is_dir, name, size) = entry;
            if is_dir {
                continue;
            }

            log::debug!("scanning archive entry {name}");
            members += 1;
            let handle = FileHandle::Member(ArchiveMember {
                archive: &archive,
                archive_path: path.clone(),
                index,
                name,
                size,
            });
            let fingerprint = hasher::fingerprint(&handle);
            self.dispatch(
                &ScanItem {
                    handle,
                    fingerprint,
                },
                next,
            );
        }

        if members == 0 {
            log::debug!("archive {} has no readable members", path.display());
            next.on_no_match(container);
        }
    }
}

impl Stage for ScanStage<'_> {
    /// Files are dispatched right away; subdirectories are returned for the
    /// next round. Symbolic links to directories are not followed.
    fn scan(&mut self, paths: Vec<PathBuf>, mut next: Chain<'_, '_>) -> Vec<PathBuf> {
        let paths = next.scan(paths);
        let mut directories = Vec::new();

        for path in paths {
            if is_real_dir(&path) {
                log::debug!("scanning directory {}", path.display());
                let entries = match sorted_entries(&path) {
                    Ok(entries) => entries,
                    Err(e) => {
                        log::error!("could not list directory {}: {e}", path.display());
                        continue;
                    }
                };
                for entry in entries {
                    if entry.is_file() {
                        self.scan_file(&entry, &mut next);
                    } else if is_real_dir(&entry) {
                        log::debug!("adding directory {} to the next round", entry.display());
                        directories.push(entry);
                    }
                }
            } else if path.is_file() {
                self.scan_file(&path, &mut next);
            }
        }

        directories
    }
}

fn is_real_dir(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_dir())
        .unwrap_or(false)
}

fn sorted_entries(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<Vec<_>>>()?;
    entries.sort();
    Ok(entries)
}

/// Check the first bytes of a file for a ZIP signature.
pub fn is_zip(path: &Path) -> bool {
    let mut magic = [0u8; 4];
    File::open(path)
        .and_then(|mut f| f.read_exact(&mut magic))
        .map(|()| ZIP_MAGIC.contains(&magic))
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "tests/scan_tests.rs"]
mod tests;
