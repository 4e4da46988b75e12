//! Terminal rendering of session reports.

use std::io::{self, Write};
use std::path::Path;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use romshelf_lib::{DiagReport, RelocationSummary, SessionReport, SystemReport};

pub(crate) fn print_session(out: &mut impl Write, report: &SessionReport) -> io::Result<()> {
    if let Some(summary) = &report.relocation {
        print_relocation(out, summary)?;
    }
    if let Some(diagnostics) = &report.diagnostics {
        if report.relocation.is_some() {
            writeln!(out)?;
        }
        print_diagnostics(out, diagnostics)?;
    }
    Ok(())
}

pub(crate) fn print_relocation(out: &mut impl Write, summary: &RelocationSummary) -> io::Result<()> {
    writeln!(
        out,
        "{} moved, {} extracted, {} linked, {} duplicates ({} deleted), {} aborted",
        summary.moved.if_supports_color(Stdout, |t| t.green()),
        summary.extracted,
        summary.linked,
        summary.duplicates.len().if_supports_color(Stdout, |t| t.yellow()),
        summary.deleted,
        summary.aborted.if_supports_color(Stdout, |t| t.red()),
    )?;
    for path in &summary.duplicates {
        writeln!(out, "  {}", dimmed_path(path))?;
    }
    Ok(())
}

pub(crate) fn print_diagnostics(out: &mut impl Write, report: &DiagReport) -> io::Result<()> {
    for system in &report.systems {
        print_system(out, system)?;
    }

    if !report.duplicates.is_empty() {
        writeln!(out, "{}", "Duplicates:".if_supports_color(Stdout, |t| t.yellow()))?;
        for dup in &report.duplicates {
            writeln!(out, "  {} (kept {})", dup.rom, dimmed_path(&dup.primary))?;
            for location in &dup.locations {
                writeln!(out, "    {}", dimmed_path(location))?;
            }
        }
    }

    if !report.unknown.is_empty() {
        writeln!(out, "{}", "Unknown:".if_supports_color(Stdout, |t| t.yellow()))?;
        for entry in &report.unknown {
            match &entry.expected {
                Some(name) => writeln!(
                    out,
                    "  {} should be named {}",
                    dimmed_path(&entry.path),
                    name.if_supports_color(Stdout, |t| t.bold()),
                )?,
                None => writeln!(out, "  {}", dimmed_path(&entry.path))?,
            }
        }
    }
    Ok(())
}

fn print_system(out: &mut impl Write, system: &SystemReport) -> io::Result<()> {
    writeln!(
        out,
        "found {}/{} of {}",
        system.found,
        system.total,
        system.name.if_supports_color(Stdout, |t| t.bold()),
    )?;
    if let Some(missing) = system.missing.as_ref().filter(|m| !m.is_empty()) {
        writeln!(out, "  {}", "Missing:".if_supports_color(Stdout, |t| t.red()))?;
        for line in missing {
            writeln!(out, "    {line}")?;
        }
    }
    if let Some(having) = system.having.as_ref().filter(|h| !h.is_empty()) {
        writeln!(out, "  {}", "Having:".if_supports_color(Stdout, |t| t.green()))?;
        for line in having {
            writeln!(out, "    {line}")?;
        }
    }
    Ok(())
}

fn dimmed_path(path: &Path) -> String {
    path.display()
        .if_supports_color(Stdout, |t| t.dimmed())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use romshelf_lib::{DuplicateEntry, UnknownEntry};

    fn render(report: &SessionReport) -> String {
        let mut out = Vec::new();
        print_session(&mut out, report).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn diagnostics_sections() {
        let report = SessionReport {
            diagnostics: Some(DiagReport {
                systems: vec![SystemReport {
                    name: "Sys - Games".into(),
                    found: 1,
                    total: 2,
                    missing: Some(vec!["beta.bin - 4b03".into()]),
                    having: Some(vec!["alpha.bin - 3b0e".into()]),
                }],
                duplicates: vec![DuplicateEntry {
                    rom: "alpha.bin".into(),
                    locations: vec![PathBuf::from("/b/alpha.bin")],
                    primary: PathBuf::from("/a/alpha.bin"),
                }],
                unknown: vec![
                    UnknownEntry {
                        path: PathBuf::from("/x/readme.txt"),
                        expected: None,
                    },
                    UnknownEntry {
                        path: PathBuf::from("/x/renamed.bin"),
                        expected: Some("beta.bin".into()),
                    },
                ],
            }),
            relocation: None,
        };

        let text = render(&report);
        assert!(text.contains("Sys - Games"));
        assert!(text.contains("Missing:"));
        assert!(text.contains("beta.bin - 4b03"));
        assert!(text.contains("Having:"));
        assert!(text.contains("Duplicates:"));
        assert!(text.contains("/b/alpha.bin"));
        assert!(text.contains("Unknown:"));
        assert!(text.contains("/x/readme.txt"));
        assert!(text.contains("should be named"));
        assert!(!text.contains("moved"));
    }

    #[test]
    fn switched_off_lists_are_not_printed() {
        let report = SessionReport {
            diagnostics: Some(DiagReport {
                systems: vec![SystemReport {
                    name: "Sys".into(),
                    found: 2,
                    total: 2,
                    missing: None,
                    having: None,
                }],
                duplicates: Vec::new(),
                unknown: Vec::new(),
            }),
            relocation: None,
        };

        let text = render(&report);
        assert_eq!(text.lines().count(), 1);
        assert!(!text.contains("Missing:"));
        assert!(!text.contains("Having:"));
    }

    #[test]
    fn relocation_summary_lists_duplicates() {
        let report = SessionReport {
            diagnostics: None,
            relocation: Some(RelocationSummary {
                moved: 3,
                duplicates: vec![PathBuf::from("/src/copy.bin")],
                deleted: 1,
                ..Default::default()
            }),
        };

        let text = render(&report);
        assert!(text.contains("moved"));
        assert!(text.contains("(1 deleted)"));
        assert!(text.contains("/src/copy.bin"));
        assert!(!text.contains("Unknown:"));
    }
}
