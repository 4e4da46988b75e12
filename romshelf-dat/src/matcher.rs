use crate::index::{DatIndex, RomId};

/// Size and content hashes of a scanned file or archive member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    /// Size reported by the file system or archive directory
    pub size: u64,
    /// CRC32 checksum (8 lowercase hex digits)
    pub crc32: String,
    /// MD5 checksum (lowercase hex)
    pub md5: String,
    /// SHA1 checksum (lowercase hex)
    pub sha1: String,
    /// True only if exactly `size` bytes were read
    pub loaded: bool,
}

/// Outcome of looking up a fingerprint in the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<'a> {
    /// The file could not be read completely.
    NotLoaded,
    /// No ROM with this SHA1.
    Unknown,
    /// SHA1 is known but MD5, CRC32 or size differ from the indexed ROM.
    IntegrityMismatch { rom: RomId },
    /// All records sharing the SHA1, primary first.
    Found(&'a [RomId]),
}

impl DatIndex {
    /// Classify a fingerprint against the index without logging.
    pub fn lookup(&self, fingerprint: &Fingerprint) -> Lookup<'_> {
        if !fingerprint.loaded {
            return Lookup::NotLoaded;
        }
        let Some(ids) = self.get(&fingerprint.sha1) else {
            return Lookup::Unknown;
        };
        let primary = self.rom(ids[0]);
        if primary.md5 != fingerprint.md5
            || primary.crc != fingerprint.crc32
            || primary.size != fingerprint.size
        {
            return Lookup::IntegrityMismatch { rom: ids[0] };
        }
        Lookup::Found(ids)
    }

    /// Find the ROM records matching a fingerprint.
    ///
    /// Only fingerprints with equal SHA1, MD5, CRC32 and size match. A SHA1
    /// hit with differing secondary values points at a corrupt file or DAT
    /// entry and is logged as an error.
    pub fn find_match(&self, fingerprint: &Fingerprint) -> Option<&[RomId]> {
        match self.lookup(fingerprint) {
            Lookup::Found(ids) => {
                log::debug!(
                    "sha1 {} found as ROM {}",
                    fingerprint.sha1,
                    self.describe(ids[0])
                );
                Some(ids)
            }
            Lookup::IntegrityMismatch { rom } => {
                let record = self.rom(rom);
                log::error!(
                    "sha1 {} matches ROM {} but not its other values \
                     (md5 {} vs {}, crc {} vs {}, size {} vs {})",
                    fingerprint.sha1,
                    self.describe(rom),
                    fingerprint.md5,
                    record.md5,
                    fingerprint.crc32,
                    record.crc,
                    fingerprint.size,
                    record.size,
                );
                None
            }
            Lookup::NotLoaded | Lookup::Unknown => None,
        }
    }
}

#[cfg(test)]
#[path = "tests/matcher_tests.rs"]
mod tests;
