use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use romshelf_dat::{DatIndex, HeaderId, RomId};

use crate::pipeline::{Chain, ScanItem, Stage};

/// Which optional lists a [`DiagReport`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    pub missing: bool,
    pub having: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            missing: true,
            having: true,
        }
    }
}

/// Result of a diagnostic run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagReport {
    /// One entry per DAT file with at least one ROM found, sorted by name
    pub systems: Vec<SystemReport>,
    /// Sorted by ROM name
    pub duplicates: Vec<DuplicateEntry>,
    /// Sorted by path
    pub unknown: Vec<UnknownEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemReport {
    pub name: String,
    pub found: usize,
    pub total: usize,
    /// `"name - sha1"` of every ROM not found, sorted
    pub missing: Option<Vec<String>>,
    /// `"name - sha1"` of every ROM found, sorted
    pub having: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateEntry {
    pub rom: String,
    /// Every location after the first one
    pub locations: Vec<PathBuf>,
    /// Where the ROM was found first
    pub primary: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEntry {
    pub path: PathBuf,
    /// File name the catalog expects for this content, if it is known
    pub expected: Option<String>,
}

/// Collects match and no-match events into a [`DiagReport`] handed to the
/// callback on finalize.
pub struct DiagnosticStage<'a> {
    index: &'a DatIndex,
    options: ReportOptions,
    found: HashMap<HeaderId, HashMap<RomId, PathBuf>>,
    duplicates: HashMap<RomId, Vec<PathBuf>>,
    unknown: Vec<(PathBuf, Option<RomId>)>,
    report: Box<dyn FnMut(DiagReport) + 'a>,
}

impl<'a> DiagnosticStage<'a> {
    pub fn new(
        index: &'a DatIndex,
        options: ReportOptions,
        report: impl FnMut(DiagReport) + 'a,
    ) -> Self {
        Self {
            index,
            options,
            found: HashMap::new(),
            duplicates: HashMap::new(),
            unknown: Vec::new(),
            report: Box::new(report),
        }
    }

    fn location_of(&self, rom: RomId) -> Option<&PathBuf> {
        self.found
            .get(&self.index.header_of(rom))
            .and_then(|roms| roms.get(&rom))
    }

    fn rom_line(&self, rom: RomId) -> String {
        let record = self.index.rom(rom);
        format!("{} - {}", record.name, record.sha1)
    }

    fn build_report(&mut self) -> DiagReport {
        // Misnamed copies of a ROM that was found under its right name
        for (path, expected) in std::mem::take(&mut self.unknown) {
            match expected {
                Some(rom) if self.location_of(rom).is_some() => {
                    self.duplicates.entry(rom).or_default().push(path);
                }
                _ => self.unknown.push((path, expected)),
            }
        }

        let mut systems: BTreeMap<String, SystemReport> = BTreeMap::new();
        for (header_id, roms) in &self.found {
            let header = self.index.header(*header_id);

            let mut having: Vec<String> = roms.keys().map(|rom| self.rom_line(*rom)).collect();
            having.sort();
            let mut missing: Vec<String> = header
                .roms
                .iter()
                .filter(|rom| !roms.contains_key(*rom))
                .map(|rom| self.rom_line(*rom))
                .collect();
            missing.sort();

            systems.insert(
                header.name.clone(),
                SystemReport {
                    name: header.name.clone(),
                    found: roms.len(),
                    total: header.roms.len(),
                    missing: self.options.missing.then_some(missing),
                    having: self.options.having.then_some(having),
                },
            );
        }

        let mut duplicates: Vec<DuplicateEntry> = self
            .duplicates
            .iter()
            .filter_map(|(rom, locations)| {
                Some(DuplicateEntry {
                    rom: self.index.rom(*rom).name.clone(),
                    locations: locations.clone(),
                    primary: self.location_of(*rom)?.clone(),
                })
            })
            .collect();
        duplicates.sort_by(|a, b| a.rom.cmp(&b.rom).then_with(|| a.primary.cmp(&b.primary)));

        let mut unknown: Vec<UnknownEntry> = self
            .unknown
            .iter()
            .map(|(path, expected)| UnknownEntry {
                path: path.clone(),
                expected: expected.map(|rom| self.index.rom(rom).name.clone()),
            })
            .collect();
        unknown.sort_by(|a, b| a.path.cmp(&b.path));

        DiagReport {
            systems: systems.into_values().collect(),
            duplicates,
            unknown,
        }
    }
}

impl Stage for DiagnosticStage<'_> {
    fn on_match(
        &mut self,
        item: &ScanItem<'_>,
        records: &[RomId],
        mut next: Chain<'_, '_>,
    ) -> Option<PathBuf> {
        let (found, name) = match next.on_match(item, records) {
            Some(moved) => {
                let name = moved
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                (moved, name)
            }
            None => (item.location(), item.handle.file_name()),
        };
        log::debug!("diagnosing {}", found.display());

        let named: Vec<RomId> = records
            .iter()
            .copied()
            .filter(|rom| leaf_name(&self.index.rom(*rom).name) == name)
            .collect();
        if named.is_empty() {
            log::debug!(
                "{} does not carry any catalog name for sha1 {}",
                found.display(),
                item.fingerprint.sha1
            );
            self.unknown.push((found, records.first().copied()));
            return None;
        }

        for rom in named {
            let header = self.index.header_of(rom);
            let roms = self.found.entry(header).or_default();
            if roms.contains_key(&rom) {
                self.duplicates.entry(rom).or_default().push(found.clone());
            } else {
                roms.insert(rom, found.clone());
            }
        }
        Some(found)
    }

    fn on_no_match(&mut self, item: &ScanItem<'_>, mut next: Chain<'_, '_>) {
        next.on_no_match(item);
        self.unknown.push((item.location(), None));
    }

    fn finalize(&mut self, mut next: Chain<'_, '_>) {
        next.finalize();
        let report = self.build_report();
        (self.report)(report);
    }
}

/// Last component of a ROM name, which may carry a subdirectory.
fn leaf_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

#[cfg(test)]
#[path = "tests/diag_tests.rs"]
mod tests;
