/// Errors that can occur while loading DAT files into the catalog.
#[derive(Debug, thiserror::Error)]
pub enum DatError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    /// The DAT file as a whole is unusable (no header, no header name).
    #[error("Malformed DAT file: {0}")]
    Malformed(String),

    /// A single game entry is unusable; the rest of the file still loads.
    #[error("Invalid game entry: {0}")]
    InvalidEntry(String),

    #[error(transparent)]
    Conflict(#[from] CatalogConflict),
}

impl DatError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    pub fn invalid_entry(msg: impl Into<String>) -> Self {
        Self::InvalidEntry(msg.into())
    }
}

/// A record or game rejected while merging a DAT file into the index.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogConflict {
    /// Same SHA1 as an indexed ROM but different MD5, CRC32 or size.
    /// The ROM already in the index wins.
    #[error("ROM {incoming} has sha1 {sha1} of {existing} but differs in md5/crc/size")]
    HashMismatch {
        sha1: String,
        existing: String,
        incoming: String,
    },

    /// Every ROM of the game is already indexed under an earlier game of the
    /// same name and ROM count.
    #[error("game {game} from {incoming_header} already described by {existing_header}")]
    DuplicateGame {
        game: String,
        existing_header: String,
        incoming_header: String,
    },
}
