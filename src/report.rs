use colored::*;
use std::io::Write;
use std::path::Path;

use crate::dupes::DuplicateReport;
use crate::engine::RunOutcome;
use crate::error::Error;
use crate::extract::StageKind;

/// Write the run summary and every duplicate group.
pub fn write_summary<W: Write>(out: &mut W, outcome: &RunOutcome) -> std::io::Result<()> {
    let scan = &outcome.scan_stats;
    writeln!(
        out,
        "Scanned {} files: {} new, {} changed, {} unchanged ({} excluded, {} directories pruned)",
        format!("{}", scan.files).green(),
        scan.new,
        scan.changed,
        scan.unchanged,
        scan.excluded_files,
        scan.pruned_directories,
    )?;
    if scan.symlinks + scan.special_files > 0 {
        writeln!(
            out,
            "Skipped {} symlinks and {} special files",
            scan.symlinks, scan.special_files
        )?;
    }
    writeln!(
        out,
        "{} stale records removed",
        format!("{}", outcome.stale.len()).yellow()
    )?;

    for kind in [StageKind::Hash, StageKind::AudioTags, StageKind::ImageMetadata] {
        let stats = outcome.extraction_stats.get(kind);
        let failed = if stats.failed > 0 {
            format!("{} failed", stats.failed).red()
        } else {
            "0 failed".normal()
        };
        writeln!(
            out,
            "{:>15}: {} extracted, {}",
            kind.to_string(),
            stats.succeeded,
            failed
        )?;
    }
    writeln!(
        out,
        "Scan: {}, Extract: {}",
        format!("{:.2}s", outcome.scan_duration.as_secs_f64()).green(),
        format!("{:.2}s", outcome.extract_duration.as_secs_f64()).green(),
    )?;

    write_duplicates(out, &outcome.duplicates)
}

pub fn write_duplicates<W: Write>(out: &mut W, report: &DuplicateReport) -> std::io::Result<()> {
    writeln!(
        out,
        "{} duplicate groups, {} files with duplicates, {} bytes wasted",
        format!("{}", report.groups.len()).red(),
        format!("{}", report.duplicate_files()).red(),
        format!("{}", report.wasted_bytes()).red(),
    )?;
    for group in &report.groups {
        writeln!(
            out,
            "{} ({} bytes)",
            group.content_hash.cyan(),
            group.size
        )?;
        for path in &group.paths {
            writeln!(out, "    {}", path.display())?;
        }
    }
    Ok(())
}

/// One row per duplicate member: `hash,size,path`.
pub fn write_duplicates_csv(path: &Path, report: &DuplicateReport) -> Result<(), Error> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["hash", "size", "path"])?;
    for group in &report.groups {
        let size = group.size.to_string();
        for member in &group.paths {
            let member = member.to_string_lossy();
            writer.write_record([group.content_hash.as_str(), size.as_str(), &*member])?;
        }
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dupes::DuplicateGroup;
    use std::path::PathBuf;

    fn report() -> DuplicateReport {
        DuplicateReport {
            groups: vec![DuplicateGroup {
                content_hash: "abc123".to_string(),
                size: 5,
                paths: vec![PathBuf::from("/data/a.txt"), PathBuf::from("/data/b.txt")],
            }],
        }
    }

    #[test]
    fn test_write_duplicates_lists_every_member() {
        colored::control::set_override(false);
        let mut out = Vec::new();
        write_duplicates(&mut out, &report()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("1 duplicate groups, 2 files with duplicates, 5 bytes wasted"));
        assert!(text.contains("abc123 (5 bytes)"));
        assert!(text.contains("    /data/a.txt"));
        assert!(text.contains("    /data/b.txt"));
    }

    #[test]
    fn test_csv_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dupes.csv");
        write_duplicates_csv(&path, &report()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "hash,size,path\nabc123,5,/data/a.txt\nabc123,5,/data/b.txt\n"
        );
    }
}
