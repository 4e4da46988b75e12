//! Catalog and file fixtures shared by the unit tests.

use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::path::Path;

use romshelf_dat::{DatIndex, parse_dat};
use zip::write::SimpleFileOptions;

pub(crate) const ALPHA: &str = "alpha content";
pub(crate) const BETA: &str = "beta content";
pub(crate) const GAMMA: &str = "gamma content";

pub(crate) const ALPHA_SHA1: &str = "3b0e2d5f38ea7dae4f6281e5db61294296d559ca";
pub(crate) const BETA_SHA1: &str = "4b03391be84a81994836f670f8f499b5db9e83c3";

pub(crate) fn alpha_rom(name: &str) -> String {
    format!(
        r#"<rom name="{name}" size="13" crc="1c9c6ac1" md5="eb4d7780082d0362fdefdcef0d81343b" sha1="{ALPHA_SHA1}"/>"#
    )
}

pub(crate) fn beta_rom(name: &str) -> String {
    format!(
        r#"<rom name="{name}" size="12" crc="b05a3306" md5="371ffd6c4570223d2688c8cec142c44f" sha1="{BETA_SHA1}"/>"#
    )
}

/// A DAT document with one `<game>` per entry of `games`.
pub(crate) fn dat_xml(header: &str, games: &[(&str, Vec<String>)]) -> String {
    let mut xml = format!(
        "<?xml version=\"1.0\"?>\n<datafile>\n<header><name>{header}</name></header>\n"
    );
    for (name, roms) in games {
        xml.push_str(&format!("<game name=\"{name}\">\n"));
        for rom in roms {
            xml.push_str(rom);
            xml.push('\n');
        }
        xml.push_str("</game>\n");
    }
    xml.push_str("</datafile>\n");
    xml
}

/// `Sys - Games` with the single-ROM games `Alpha` and `Beta`.
pub(crate) fn games_dat() -> String {
    dat_xml(
        "Sys - Games",
        &[
            ("Alpha", vec![alpha_rom("alpha.bin")]),
            ("Beta", vec![beta_rom("beta.bin")]),
        ],
    )
}

pub(crate) fn index_of(dats: &[String]) -> DatIndex {
    DatIndex::from_dats(
        dats.iter()
            .map(|xml| parse_dat(Cursor::new(xml.as_bytes())).unwrap()),
    )
}

pub(crate) fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

pub(crate) fn write_zip(path: &Path, entries: &[(&str, &str)]) {
    let mut zipw = zip::ZipWriter::new(File::create(path).unwrap());
    for (name, data) in entries {
        zipw.start_file(*name, SimpleFileOptions::default()).unwrap();
        zipw.write_all(data.as_bytes()).unwrap();
    }
    zipw.finish().unwrap();
}
