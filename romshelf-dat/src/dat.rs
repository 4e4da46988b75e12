use std::collections::HashSet;
use std::io::BufRead;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::DatError;

/// Separator between system and category in a DAT header name,
/// e.g. `Commodore Amiga - Games - [ADF]`.
const CATEGORY_SEPARATOR: &str = " - ";

/// A parsed TOSEC-style XML DAT file.
///
/// Only structurally valid games end up in `games`. Games that were dropped
/// while parsing are kept in `rejected` so the caller can report them.
#[derive(Debug)]
pub struct DatFile {
    pub header: DatHeader,
    pub games: Vec<DatGame>,
    pub rejected: Vec<DatError>,
}

/// The `<header>` block of a DAT file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatHeader {
    /// Full display name, e.g. `Commodore Amiga - Games`
    pub name: String,
    /// Part of the name before the first `" - "`
    pub system: String,
    /// Part of the name after the first `" - "`, if any
    pub category: Option<String>,
}

impl DatHeader {
    pub fn from_name(name: impl Into<String>) -> Self {
        let name = name.into();
        let (system, category) = match name.split_once(CATEGORY_SEPARATOR) {
            Some((system, category)) => (system.to_string(), Some(category.to_string())),
            None => (name.clone(), None),
        };
        Self {
            name,
            system,
            category,
        }
    }
}

/// A single game entry from a DAT file. Always has at least one ROM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatGame {
    pub name: String,
    pub roms: Vec<DatRom>,
}

/// A single ROM entry within a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatRom {
    pub name: String,
    pub size: u64,
    /// CRC32 checksum (lowercase hex)
    pub crc: String,
    /// MD5 checksum (lowercase hex)
    pub md5: String,
    /// SHA1 checksum (lowercase hex)
    pub sha1: String,
}

/// Parse a DAT file from a file path.
pub fn parse_dat_file(path: &Path) -> Result<DatFile, DatError> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    parse_dat(reader)
}

/// Game element as read from the XML, before validation.
#[derive(Default)]
struct RawGame {
    name: Option<String>,
    roms: Vec<RawRom>,
}

#[derive(Default)]
struct RawRom {
    name: Option<String>,
    size: Option<String>,
    crc: Option<String>,
    md5: Option<String>,
    sha1: Option<String>,
}

/// Parse an XML DAT file.
///
/// Fails when the document is not well-formed or has no `header/name`.
/// Invalid games (missing name, no ROMs, incomplete ROM attributes, SHA1
/// already used earlier in the same file) are moved to [`DatFile::rejected`].
pub fn parse_dat<R: BufRead>(reader: R) -> Result<DatFile, DatError> {
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text(true);

    let mut buf = Vec::new();
    // Element names from the document root down to the current element
    let mut stack: Vec<String> = Vec::new();

    let mut header_seen = false;
    let mut in_header = false;
    let mut header_name: Option<String> = None;

    let mut current_game: Option<RawGame> = None;
    let mut games = Vec::new();
    let mut rejected = Vec::new();
    let mut seen_sha1: HashSet<String> = HashSet::new();

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let tag = tag_name(e);
                let depth = stack.len() + 1;
                match (depth, tag.as_str()) {
                    (2, "header") => {
                        if header_seen {
                            log::warn!("DAT file has more than one header, extra header ignored");
                        } else {
                            header_seen = true;
                            in_header = true;
                        }
                    }
                    (2, "game") => current_game = Some(start_game(e)?),
                    (3, "rom") => {
                        if let Some(ref mut game) = current_game {
                            game.roms.push(parse_rom_attributes(e)?);
                        }
                    }
                    _ => {}
                }
                stack.push(tag);
            }
            Event::Empty(ref e) => {
                let tag = tag_name(e);
                let depth = stack.len() + 1;
                match (depth, tag.as_str()) {
                    (2, "header") if !header_seen => header_seen = true,
                    (2, "game") => {
                        let game = start_game(e)?;
                        finish_game(game, &mut seen_sha1, &mut games, &mut rejected);
                    }
                    (3, "rom") => {
                        if let Some(ref mut game) = current_game {
                            game.roms.push(parse_rom_attributes(e)?);
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(ref e) => {
                if in_header && stack.len() == 3 && stack[2] == "name" {
                    let text = e.unescape()?;
                    header_name.get_or_insert_with(String::new).push_str(&text);
                }
            }
            Event::End(_) => {
                let tag = stack.pop().unwrap_or_default();
                match (stack.len() + 1, tag.as_str()) {
                    (2, "header") => in_header = false,
                    (2, "game") => {
                        if let Some(game) = current_game.take() {
                            finish_game(game, &mut seen_sha1, &mut games, &mut rejected);
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !header_seen {
        return Err(DatError::malformed("no datafile/header found"));
    }
    let name = match header_name {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => return Err(DatError::malformed("no datafile/header/name found")),
    };

    Ok(DatFile {
        header: DatHeader::from_name(name),
        games,
        rejected,
    })
}

fn tag_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_string()
}

fn start_game(e: &BytesStart<'_>) -> Result<RawGame, DatError> {
    let mut game = RawGame::default();
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == b"name" {
            game.name = Some(attr.unescape_value()?.into_owned());
        }
    }
    Ok(game)
}

fn parse_rom_attributes(e: &BytesStart<'_>) -> Result<RawRom, DatError> {
    let mut rom = RawRom::default();
    for attr in e.attributes() {
        let attr = attr?;
        let value = attr.unescape_value()?.into_owned();
        match attr.key.as_ref() {
            b"name" => rom.name = Some(value),
            b"size" => rom.size = Some(value),
            b"crc" => rom.crc = Some(value.to_lowercase()),
            b"md5" => rom.md5 = Some(value.to_lowercase()),
            b"sha1" => rom.sha1 = Some(value.to_lowercase()),
            _ => {}
        }
    }
    Ok(rom)
}

/// Validate a finished game element and file it as accepted or rejected.
fn finish_game(
    raw: RawGame,
    seen_sha1: &mut HashSet<String>,
    games: &mut Vec<DatGame>,
    rejected: &mut Vec<DatError>,
) {
    match validate_game(raw, seen_sha1) {
        Ok(game) => {
            seen_sha1.extend(game.roms.iter().map(|r| r.sha1.clone()));
            games.push(game);
        }
        Err(e) => rejected.push(e),
    }
}

fn validate_game(raw: RawGame, seen_sha1: &HashSet<String>) -> Result<DatGame, DatError> {
    let name = match raw.name {
        Some(name) if !name.is_empty() => name,
        _ => return Err(DatError::invalid_entry("no datafile/game{name} found")),
    };
    if raw.roms.is_empty() {
        return Err(DatError::invalid_entry(format!(
            "no datafile/game/rom found for game {name}"
        )));
    }

    let mut roms = Vec::with_capacity(raw.roms.len());
    let mut game_sha1: HashSet<String> = HashSet::new();
    for raw_rom in &raw.roms {
        let rom = validate_rom(raw_rom, &name)?;
        if seen_sha1.contains(&rom.sha1) || !game_sha1.insert(rom.sha1.clone()) {
            return Err(DatError::invalid_entry(format!(
                "sha1 {} of game {name} is already used in this DAT file",
                rom.sha1
            )));
        }
        roms.push(rom);
    }

    Ok(DatGame { name, roms })
}

fn validate_rom(raw: &RawRom, game: &str) -> Result<DatRom, DatError> {
    fn required(value: &Option<String>, field: &str, game: &str) -> Result<String, DatError> {
        match value {
            Some(v) if !v.is_empty() => Ok(v.clone()),
            _ => Err(DatError::invalid_entry(format!(
                "no datafile/game/rom{{{field}}} found for game {game}"
            ))),
        }
    }

    let name = required(&raw.name, "name", game)?;
    let size_text = required(&raw.size, "size", game)?;
    let size = size_text.trim().parse().map_err(|_| {
        DatError::invalid_entry(format!("invalid ROM size {size_text} for game {game}"))
    })?;

    Ok(DatRom {
        name,
        size,
        crc: required(&raw.crc, "crc", game)?,
        md5: required(&raw.md5, "md5", game)?,
        sha1: required(&raw.sha1, "sha1", game)?,
    })
}
