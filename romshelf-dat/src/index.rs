use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};

use crate::dat::{DatFile, DatGame, DatRom};
use crate::error::CatalogConflict;

/// Index of a [`CatalogHeader`] inside a [`DatIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeaderId(usize);

/// Index of a [`GameEntry`] inside a [`DatIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GameId(usize);

/// Index of a [`RomRecord`] inside a [`DatIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RomId(usize);

/// One merged DAT file.
#[derive(Debug, Clone)]
pub struct CatalogHeader {
    pub name: String,
    pub system: String,
    pub category: Option<String>,
    pub games: Vec<GameId>,
    /// Every ROM record accepted from this DAT file
    pub roms: Vec<RomId>,
}

/// A game with at least one accepted ROM record.
#[derive(Debug, Clone)]
pub struct GameEntry {
    pub name: String,
    pub header: HeaderId,
    pub roms: Vec<RomId>,
    /// Number of ROMs the DAT file lists for this game. Can be larger than
    /// `roms.len()` when some records were rejected while merging.
    pub listed_roms: usize,
}

#[derive(Debug, Clone)]
pub struct RomRecord {
    pub name: String,
    pub size: u64,
    pub crc: String,
    pub md5: String,
    pub sha1: String,
    pub game: GameId,
}

impl RomRecord {
    /// Same MD5, size and CRC32. SHA1 equality is implied by the index key.
    fn same_content(&self, rom: &DatRom) -> bool {
        self.md5 == rom.md5 && self.size == rom.size && self.crc == rom.crc
    }
}

/// All loaded DAT files, indexed by SHA1.
///
/// Every SHA1 key maps to a non-empty list of records. The first record is
/// the primary one; the rest are aliases of the same content listed under
/// other games or systems.
#[derive(Debug, Clone, Default)]
pub struct DatIndex {
    headers: Vec<CatalogHeader>,
    games: Vec<GameEntry>,
    roms: Vec<RomRecord>,
    by_sha1: HashMap<String, Vec<RomId>>,
}

impl DatIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from parsed DAT files, merging them in order and
    /// logging every rejected record or game.
    pub fn from_dats(dats: impl IntoIterator<Item = DatFile>) -> Self {
        let mut index = Self::new();
        for dat in dats {
            let header_name = dat.header.name.clone();
            let (merged, conflicts) = index.merge(dat);
            index = merged;
            for conflict in conflicts {
                match conflict {
                    CatalogConflict::HashMismatch { .. } => {
                        log::error!("DAT file {header_name}: {conflict}, ROM skipped");
                    }
                    CatalogConflict::DuplicateGame { .. } => {
                        log::warn!("DAT file {header_name}: {conflict}, game skipped");
                    }
                }
            }
        }
        index
    }

    /// Merge one DAT file into the index.
    ///
    /// Records with a new SHA1 are inserted, records whose MD5/size/CRC32
    /// equal the indexed ROM of the same SHA1 become aliases, everything else
    /// is rejected and returned as a conflict. A game describing exactly the
    /// ROMs of an earlier game with the same name is rejected as a whole.
    pub fn merge(mut self, dat: DatFile) -> (DatIndex, Vec<CatalogConflict>) {
        let mut conflicts = Vec::new();
        let header_id = HeaderId(self.headers.len());
        self.headers.push(CatalogHeader {
            name: dat.header.name,
            system: dat.header.system,
            category: dat.header.category,
            games: Vec::new(),
            roms: Vec::new(),
        });

        for game in dat.games {
            if let Some(existing) = self.duplicate_game_of(&game) {
                let existing_header = self.games[existing.0].header;
                conflicts.push(CatalogConflict::DuplicateGame {
                    game: game.name,
                    existing_header: self.headers[existing_header.0].name.clone(),
                    incoming_header: self.headers[header_id.0].name.clone(),
                });
                continue;
            }

            let game_id = GameId(self.games.len());
            let listed_roms = game.roms.len();
            let mut accepted = Vec::with_capacity(listed_roms);

            for rom in game.roms {
                if let Some(ids) = self.by_sha1.get(&rom.sha1) {
                    let primary = &self.roms[ids[0].0];
                    if !primary.same_content(&rom) {
                        conflicts.push(CatalogConflict::HashMismatch {
                            sha1: rom.sha1.clone(),
                            existing: self.describe(ids[0]),
                            incoming: format!(
                                "{}/{}/{}",
                                self.headers[header_id.0].name, game.name, rom.name
                            ),
                        });
                        continue;
                    }
                }

                let rom_id = RomId(self.roms.len());
                self.by_sha1.entry(rom.sha1.clone()).or_default().push(rom_id);
                self.roms.push(RomRecord {
                    name: rom.name,
                    size: rom.size,
                    crc: rom.crc,
                    md5: rom.md5,
                    sha1: rom.sha1,
                    game: game_id,
                });
                accepted.push(rom_id);
            }

            if accepted.is_empty() {
                continue;
            }

            let header = &mut self.headers[header_id.0];
            header.games.push(game_id);
            header.roms.extend_from_slice(&accepted);
            self.games.push(GameEntry {
                name: game.name,
                header: header_id,
                roms: accepted,
                listed_roms,
            });
        }

        (self, conflicts)
    }

    /// Find an earlier game with the same name and ROM count that already
    /// owns every ROM of `game` with identical content.
    fn duplicate_game_of(&self, game: &DatGame) -> Option<GameId> {
        let mut candidates: Option<HashSet<GameId>> = None;
        for rom in &game.roms {
            let ids = self.by_sha1.get(&rom.sha1)?;
            if !self.roms[ids[0].0].same_content(rom) {
                return None;
            }
            let owners: HashSet<GameId> = ids.iter().map(|id| self.roms[id.0].game).collect();
            candidates = Some(match candidates {
                None => owners,
                Some(previous) => previous.intersection(&owners).copied().collect(),
            });
        }

        candidates?
            .into_iter()
            .filter(|id| {
                let existing = &self.games[id.0];
                existing.name == game.name && existing.listed_roms == game.roms.len()
            })
            .min()
    }

    /// All records sharing a SHA1, primary first.
    pub fn get(&self, sha1: &str) -> Option<&[RomId]> {
        self.by_sha1.get(sha1).map(|v| v.as_slice())
    }

    pub fn header(&self, id: HeaderId) -> &CatalogHeader {
        &self.headers[id.0]
    }

    pub fn game(&self, id: GameId) -> &GameEntry {
        &self.games[id.0]
    }

    pub fn rom(&self, id: RomId) -> &RomRecord {
        &self.roms[id.0]
    }

    /// The header a ROM record was loaded from.
    pub fn header_of(&self, id: RomId) -> HeaderId {
        self.games[self.roms[id.0].game.0].header
    }

    pub fn headers(&self) -> impl Iterator<Item = (HeaderId, &CatalogHeader)> {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, header)| (HeaderId(i), header))
    }

    pub fn header_count(&self) -> usize {
        self.headers.len()
    }

    pub fn game_count(&self) -> usize {
        self.games.len()
    }

    pub fn rom_count(&self) -> usize {
        self.roms.len()
    }

    /// `header/game/rom` label for log messages.
    pub fn describe(&self, id: RomId) -> String {
        let rom = &self.roms[id.0];
        let game = &self.games[rom.game.0];
        format!(
            "{}/{}/{}",
            self.headers[game.header.0].name, game.name, rom.name
        )
    }

    /// Destination of a ROM below `root`:
    /// `root/system[/category][/game if it has several ROMs]/rom`.
    ///
    /// Names are pushed component by component; empty, `.` and `..`
    /// components are dropped so a DAT entry can never point outside `root`.
    pub fn canonical_path(&self, root: &Path, id: RomId) -> PathBuf {
        let rom = &self.roms[id.0];
        let game = &self.games[rom.game.0];
        let header = &self.headers[game.header.0];

        let mut path = root.to_path_buf();
        push_relative(&mut path, &header.system);
        if let Some(ref category) = header.category {
            push_relative(&mut path, category);
        }
        if game.listed_roms > 1 {
            push_relative(&mut path, &game.name);
        }
        push_relative(&mut path, &rom.name);
        path
    }
}

fn push_relative(path: &mut PathBuf, name: &str) {
    let name = name.replace('\\', "/");
    for component in Path::new(&name).components() {
        if let Component::Normal(part) = component {
            path.push(part);
        }
    }
}

#[cfg(test)]
#[path = "tests/index_tests.rs"]
mod tests;
