use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use romshelf_dat::{DatIndex, RomId};

use crate::handle::{FileHandle, Transfer};
use crate::hasher;
use crate::pipeline::{Chain, ScanItem, Stage};

#[derive(Debug, Clone)]
pub struct RelocationOptions {
    /// Root of the canonical layout
    pub destination: PathBuf,
    /// Remove a source file whose content already sits at its destination
    pub delete_duplicates: bool,
    /// Make moved and extracted files read-only
    pub strip_write_permission: bool,
}

/// Counters of one relocation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelocationSummary {
    pub moved: usize,
    pub extracted: usize,
    pub linked: usize,
    /// Sources whose content was already at the destination
    pub duplicates: Vec<PathBuf>,
    pub deleted: usize,
    pub aborted: usize,
}

/// Outcome of placing a file at a destination that may already be taken.
enum Placement {
    /// Destination holds the right content now.
    Done,
    /// Destination holds something else; nothing was changed.
    Conflict,
}

/// Moves matched files to their canonical path below the destination root
/// and links every alias of the same content to it.
pub struct RelocationStage<'a> {
    index: &'a DatIndex,
    options: RelocationOptions,
    summary: RelocationSummary,
    report: Box<dyn FnMut(RelocationSummary) + 'a>,
}

impl<'a> RelocationStage<'a> {
    pub fn new(
        index: &'a DatIndex,
        options: RelocationOptions,
        report: impl FnMut(RelocationSummary) + 'a,
    ) -> Self {
        Self {
            index,
            options,
            summary: RelocationSummary::default(),
            report: Box::new(report),
        }
    }

    /// Put the item at the canonical path of `primary`. Returns the path on
    /// success, also when an identical copy was already there.
    fn place_primary(&mut self, item: &ScanItem<'_>, primary: RomId) -> Option<PathBuf> {
        let dest = self.index.canonical_path(&self.options.destination, primary);
        let source = item.location();

        if source == dest {
            log::debug!("{} is already in place", dest.display());
            return Some(dest);
        }

        if let Err(e) = prepare_destination(&dest) {
            log::error!(
                "could not prepare {} for {}: {e}",
                dest.display(),
                source.display()
            );
            self.summary.aborted += 1;
            return None;
        }

        if links_to(&dest, &source) {
            // The source is the only copy; the link makes way for it.
            log::info!(
                "replacing link {} with the file it points to",
                dest.display()
            );
            if let Err(e) = fs::remove_file(&dest) {
                log::error!("could not remove link {}: {e}", dest.display());
                self.summary.aborted += 1;
                return None;
            }
        }

        if !dest.exists() {
            log::info!("moving {} to {}", source.display(), dest.display());
            return match item.handle.rename(&dest) {
                Ok(transfer) => {
                    match transfer {
                        Transfer::Moved => self.summary.moved += 1,
                        Transfer::Extracted => self.summary.extracted += 1,
                    }
                    if self.options.strip_write_permission {
                        if let Err(e) = make_read_only(&dest) {
                            log::warn!("could not make {} read-only: {e}", dest.display());
                        }
                    }
                    Some(dest)
                }
                Err(e) => {
                    log::error!(
                        "moving {} to {} failed: {e}",
                        source.display(),
                        dest.display()
                    );
                    self.summary.aborted += 1;
                    None
                }
            };
        }

        match self.check_existing(&dest, primary, &source) {
            Placement::Conflict => {
                self.summary.aborted += 1;
                None
            }
            Placement::Done => {
                self.summary.duplicates.push(source.clone());
                if self.options.delete_duplicates {
                    log::warn!(
                        "deleting duplicate {} of {}",
                        source.display(),
                        dest.display()
                    );
                    match item.handle.delete() {
                        Ok(()) => self.summary.deleted += 1,
                        Err(e) => log::warn!("{} not deleted: {e}", source.display()),
                    }
                } else {
                    log::warn!(
                        "duplicate {} found, {} left in place",
                        dest.display(),
                        source.display()
                    );
                }
                Some(dest)
            }
        }
    }

    /// Link the canonical path of an alias to the primary copy.
    fn place_alias(&mut self, item: &ScanItem<'_>, alias: RomId, target: &Path) {
        let dest = self.index.canonical_path(&self.options.destination, alias);
        if dest == target {
            return;
        }

        if let Err(e) = prepare_destination(&dest) {
            log::error!("could not prepare {}: {e}", dest.display());
            return;
        }

        if dest.exists() {
            // Existing copies of an alias are never deleted.
            if let Placement::Done = self.check_existing(&dest, alias, &item.location()) {
                log::debug!("{} already holds {}", dest.display(), self.index.describe(alias));
            }
            return;
        }

        log::info!("linking {} to {}", dest.display(), target.display());
        match symlink(target, &dest) {
            Ok(()) => self.summary.linked += 1,
            Err(e) => log::error!(
                "could not link {} to {}: {e}",
                dest.display(),
                target.display()
            ),
        }
    }

    /// Decide whether an occupied destination already holds the content of
    /// `rom`.
    fn check_existing(&self, dest: &Path, rom: RomId, source: &Path) -> Placement {
        let fingerprint = hasher::fingerprint(&FileHandle::plain(dest));
        let expected = &self.index.rom(rom).sha1;
        match self.index.find_match(&fingerprint) {
            Some(_) if fingerprint.sha1 == *expected => Placement::Done,
            _ => {
                log::error!(
                    "{} exists but does not hold {}, {} left untouched",
                    dest.display(),
                    self.index.describe(rom),
                    source.display()
                );
                Placement::Conflict
            }
        }
    }
}

impl Stage for RelocationStage<'_> {
    fn on_match(
        &mut self,
        item: &ScanItem<'_>,
        records: &[RomId],
        mut next: Chain<'_, '_>,
    ) -> Option<PathBuf> {
        next.on_match(item, records);

        let (&primary, aliases) = records.split_first()?;
        match self.place_primary(item, primary) {
            Some(dest) => {
                for &alias in aliases {
                    self.place_alias(item, alias, &dest);
                }
                Some(dest)
            }
            None => {
                if !aliases.is_empty() {
                    log::warn!(
                        "{} other entries of {} skipped after the previous error",
                        aliases.len(),
                        self.index.describe(primary)
                    );
                }
                None
            }
        }
    }

    fn finalize(&mut self, mut next: Chain<'_, '_>) {
        next.finalize();
        log::info!(
            "relocation done: {} moved, {} extracted, {} linked, {} duplicates, {} deleted, {} aborted",
            self.summary.moved,
            self.summary.extracted,
            self.summary.linked,
            self.summary.duplicates.len(),
            self.summary.deleted,
            self.summary.aborted
        );
        (self.report)(std::mem::take(&mut self.summary));
    }
}

/// Create missing parent directories and remove a dangling symbolic link
/// at `dest`.
fn prepare_destination(dest: &Path) -> io::Result<()> {
    if let Some(parent) = dest.parent() {
        if !parent.is_dir() {
            log::debug!("creating directory {}", parent.display());
            fs::create_dir_all(parent)?;
        }
    }
    let is_link = fs::symlink_metadata(dest)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false);
    if is_link && !dest.exists() {
        log::debug!("removing dangling link {}", dest.display());
        fs::remove_file(dest)?;
    }
    Ok(())
}

/// True if `link` is a symbolic link resolving to the same file as `target`.
fn links_to(link: &Path, target: &Path) -> bool {
    let is_link = fs::symlink_metadata(link)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false);
    if !is_link {
        return false;
    }
    match (fs::canonicalize(link), fs::canonicalize(target)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn make_read_only(path: &Path) -> io::Result<()> {
    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_readonly(true);
    fs::set_permissions(path, permissions)
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

#[cfg(test)]
#[path = "tests/relocate_tests.rs"]
mod tests;
