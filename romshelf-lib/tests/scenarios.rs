use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use romshelf_lib::*;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

const HELLO: &str = "HelloWorld";
const ALPHA: &str = "alpha content";
const BETA: &str = "beta content";
const GAMMA: &str = "gamma content";

const HELLO_ROM: &str = r#"size="10" crc="77770c79" md5="68e109f0f40ca72a15e05cc22786f8e6" sha1="db8ac1c259eb89d4a131b253bacfca5f319d54f2""#;
const ALPHA_ROM: &str = r#"size="13" crc="1c9c6ac1" md5="eb4d7780082d0362fdefdcef0d81343b" sha1="3b0e2d5f38ea7dae4f6281e5db61294296d559ca""#;
const BETA_ROM: &str = r#"size="12" crc="b05a3306" md5="371ffd6c4570223d2688c8cec142c44f" sha1="4b03391be84a81994836f670f8f499b5db9e83c3""#;

/// One DAT file with single-ROM games given as (game, rom name, rom attributes).
fn write_dat(path: &Path, header: &str, games: &[(&str, &str, &str)]) {
    let mut xml = format!("<?xml version=\"1.0\"?>\n<datafile>\n<header><name>{header}</name></header>\n");
    for (game, rom, attrs) in games {
        xml.push_str(&format!(
            "<game name=\"{game}\"><rom name=\"{rom}\" {attrs}/></game>\n"
        ));
    }
    xml.push_str("</datafile>\n");
    fs::write(path, xml).unwrap();
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

struct Workspace {
    _dir: tempfile::TempDir,
    catalog: std::path::PathBuf,
    source: std::path::PathBuf,
    dest: std::path::PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let catalog = dir.path().join("dats");
        let source = dir.path().join("incoming");
        let dest = dir.path().join("library");
        for path in [&catalog, &source, &dest] {
            fs::create_dir(path).unwrap();
        }
        Self {
            _dir: dir,
            catalog,
            source,
            dest,
        }
    }

    fn relocation(&self) -> RunConfig {
        let mut config = RunConfig::new(&self.catalog, &self.dest);
        config.source = Some(self.source.clone());
        config.validate().unwrap()
    }

    fn diagnosis(&self) -> RunConfig {
        RunConfig::new(&self.catalog, &self.dest).validate().unwrap()
    }
}

#[test]
fn single_rom_is_relocated_by_content() {
    let ws = Workspace::new();
    write_dat(&ws.catalog.join("amiga.dat"), "Amiga", &[("X", "X", HELLO_ROM)]);
    write(&ws.source.join("some/dir/renamed.bin"), HELLO);

    let config = ws.relocation();
    let report = run_session(&config).unwrap();

    let target = config.destination.join("Amiga/X");
    assert_eq!(fs::read_to_string(&target).unwrap(), HELLO);
    assert!(!ws.source.join("some/dir/renamed.bin").exists());

    let summary = report.relocation.unwrap();
    assert_eq!(summary.moved, 1);
    assert!(report.diagnostics.is_none());
}

#[cfg(unix)]
#[test]
fn shared_content_is_moved_once_and_linked() {
    let ws = Workspace::new();
    write_dat(&ws.catalog.join("a.dat"), "Sys - Games", &[("Game", "game.bin", ALPHA_ROM)]);
    write_dat(&ws.catalog.join("b.dat"), "Sys - Compilations", &[("Pack", "pack.bin", ALPHA_ROM)]);
    write(&ws.source.join("dump.bin"), ALPHA);

    let config = ws.relocation();
    let summary = run_session(&config).unwrap().relocation.unwrap();

    let primary = config.destination.join("Sys/Games/game.bin");
    let alias = config.destination.join("Sys/Compilations/pack.bin");
    assert_eq!(summary.moved, 1);
    assert_eq!(summary.linked, 1);
    assert!(primary.is_file());
    assert_eq!(fs::read_link(&alias).unwrap(), primary);
}

#[test]
fn identical_copy_in_destination_deletes_source() {
    let ws = Workspace::new();
    write_dat(&ws.catalog.join("a.dat"), "Sys", &[("Beta", "beta.bin", BETA_ROM)]);
    write(&ws.dest.join("Sys/beta.bin"), BETA);
    write(&ws.source.join("beta (copy).bin"), BETA);

    let mut config = ws.relocation();
    config.delete_duplicates = true;
    let summary = run_session(&config).unwrap().relocation.unwrap();

    assert!(!ws.source.join("beta (copy).bin").exists());
    assert_eq!(fs::read_to_string(ws.dest.join("Sys/beta.bin")).unwrap(), BETA);
    assert_eq!(summary.moved, 0);
    assert_eq!(summary.deleted, 1);
    assert_eq!(summary.duplicates.len(), 1);
}

#[test]
fn invalid_file_in_destination_aborts() {
    let ws = Workspace::new();
    write_dat(&ws.catalog.join("a.dat"), "Sys", &[("Beta", "beta.bin", BETA_ROM)]);
    write(&ws.dest.join("Sys/beta.bin"), "corrupted");
    write(&ws.source.join("beta.bin"), BETA);

    let mut config = ws.relocation();
    config.delete_duplicates = true;
    let summary = run_session(&config).unwrap().relocation.unwrap();

    assert_eq!(fs::read_to_string(ws.source.join("beta.bin")).unwrap(), BETA);
    assert_eq!(fs::read_to_string(ws.dest.join("Sys/beta.bin")).unwrap(), "corrupted");
    assert_eq!(summary.aborted, 1);
    assert_eq!(summary.moved, 0);
}

#[test]
fn archive_members_are_reported_individually() {
    let ws = Workspace::new();
    write_dat(
        &ws.catalog.join("a.dat"),
        "Sys - Games",
        &[("Alpha", "alpha.bin", ALPHA_ROM), ("Beta", "beta.bin", BETA_ROM)],
    );
    let zip_path = ws.dest.join("bundle.zip");
    {
        let mut zipw = zip::ZipWriter::new(File::create(&zip_path).unwrap());
        for (name, data) in [("alpha.bin", ALPHA), ("beta.bin", BETA), ("readme.txt", GAMMA)] {
            let options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
            zipw.start_file(name, options).unwrap();
            zipw.write_all(data.as_bytes()).unwrap();
        }
        zipw.finish().unwrap();
    }

    let mut config = ws.diagnosis();
    config.scan_compressed = true;
    let report = run_session(&config).unwrap().diagnostics.unwrap();

    let zip_path = config.destination.join("bundle.zip");
    assert_eq!(report.systems.len(), 1);
    assert_eq!(report.systems[0].found, 2);
    assert_eq!(report.systems[0].total, 2);
    assert_eq!(
        report.systems[0].having.as_deref().map(|h| h.len()),
        Some(2)
    );
    assert_eq!(
        report.unknown,
        vec![UnknownEntry {
            path: zip_path.join("readme.txt"),
            expected: None,
        }]
    );
}

#[test]
fn diagnosis_reports_missing_and_misnamed_files() {
    let ws = Workspace::new();
    write_dat(
        &ws.catalog.join("a.dat"),
        "Sys - Games",
        &[("Alpha", "alpha.bin", ALPHA_ROM), ("Beta", "beta.bin", BETA_ROM)],
    );
    write(&ws.dest.join("Sys/Games/alpha.bin"), ALPHA);
    write(&ws.dest.join("Sys/Games/wrong name.bin"), BETA);

    let config = ws.diagnosis();
    let report = run_session(&config).unwrap().diagnostics.unwrap();

    assert_eq!(report.systems[0].found, 1);
    assert_eq!(
        report.systems[0].missing,
        Some(vec![
            "beta.bin - 4b03391be84a81994836f670f8f499b5db9e83c3".to_string()
        ])
    );
    assert_eq!(report.unknown.len(), 1);
    assert_eq!(report.unknown[0].expected.as_deref(), Some("beta.bin"));
}

#[test]
fn relocation_with_diagnostics_reports_destinations() {
    let ws = Workspace::new();
    write_dat(&ws.catalog.join("a.dat"), "Sys", &[("Alpha", "alpha.bin", ALPHA_ROM)]);
    write(&ws.source.join("whatever.rom"), ALPHA);

    let mut config = ws.relocation();
    config.diagnose = true;
    config.no_having = true;
    let report = run_session(&config).unwrap();

    let diagnostics = report.diagnostics.unwrap();
    assert_eq!(diagnostics.systems[0].found, 1);
    assert_eq!(diagnostics.systems[0].having, None);
    assert!(diagnostics.unknown.is_empty());
    assert_eq!(report.relocation.unwrap().moved, 1);
}

#[test]
fn catalog_order_does_not_change_what_matches() {
    let forward = Workspace::new();
    write_dat(&forward.catalog.join("1.dat"), "Sys - Games", &[("Alpha", "alpha.bin", ALPHA_ROM)]);
    write_dat(&forward.catalog.join("2.dat"), "Sys - Demos", &[("Demo", "demo.bin", ALPHA_ROM)]);

    let backward = Workspace::new();
    write_dat(&backward.catalog.join("1.dat"), "Sys - Demos", &[("Demo", "demo.bin", ALPHA_ROM)]);
    write_dat(&backward.catalog.join("2.dat"), "Sys - Games", &[("Alpha", "alpha.bin", ALPHA_ROM)]);

    for ws in [&forward, &backward] {
        write(&ws.dest.join("alpha.bin"), ALPHA);
        let report = run_session(&ws.diagnosis()).unwrap().diagnostics.unwrap();
        let names: Vec<&str> = report.systems.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Sys - Games"]);
        assert!(report.unknown.is_empty());
    }
}
