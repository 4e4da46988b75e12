pub mod dat;
pub mod error;
pub mod index;
pub mod loader;
pub mod matcher;

pub use dat::{DatFile, DatGame, DatHeader, DatRom, parse_dat, parse_dat_file};
pub use error::{CatalogConflict, DatError};
pub use index::{CatalogHeader, DatIndex, GameEntry, GameId, HeaderId, RomId, RomRecord};
pub use loader::{catalog_files, load_dats, load_index};
pub use matcher::{Fingerprint, Lookup};
