//! Writing the downloadable snapshot and the summary table to disk.

use crate::table::{DownloadSnapshot, SummaryRow, SUMMARY_HEADER};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Snapshot file as written to disk: the filtered records plus provenance.
#[derive(Serialize)]
struct SnapshotFile<'a> {
    generated_utc: String,
    date: &'a str,
    data: &'a serde_json::Value,
}

fn now_utc() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}

/// Directory snapshots go to by default: the user's download directory, else the cwd.
pub fn default_download_dir() -> Result<PathBuf> {
    match dirs::download_dir() {
        Some(d) => Ok(d),
        None => std::env::current_dir().context("get current directory"),
    }
}

/// Log file used while the TUI owns the terminal.
pub fn log_file_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("kem-mem-view")
        .join("kem-mem-view.log")
}

pub fn export_json(path: &Path, snapshot: &DownloadSnapshot) -> Result<()> {
    let file = SnapshotFile {
        generated_utc: now_utc(),
        date: &snapshot.date,
        data: &snapshot.content,
    };
    let body = serde_json::to_string_pretty(&file)?;
    std::fs::write(path, body).with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), "snapshot exported");
    Ok(())
}

/// Write the snapshot under its fixed file name into `dir`.
pub fn save_snapshot(dir: &Path, snapshot: &DownloadSnapshot) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let path = dir.join(snapshot.file_name);
    export_json(&path, snapshot)?;
    Ok(path)
}

fn csv_field(s: &str) -> String {
    if s.contains(',') || s.contains('"') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

pub fn export_csv(path: &Path, rows: &[SummaryRow]) -> Result<()> {
    let mut out = String::new();
    out.push_str(&SUMMARY_HEADER.join(","));
    out.push('\n');
    for row in rows {
        let mut fields = vec![csv_field(&row.algorithm)];
        fields.extend(
            row.cells
                .iter()
                .map(|c| c.map(|v| v.to_string()).unwrap_or_default()),
        );
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    std::fs::write(path, out).with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), rows = rows.len(), "summary table exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Dataset, Snapshot};
    use serde_json::json;

    #[test]
    fn csv_leaves_absent_cells_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.csv");
        let rows = vec![SummaryRow {
            algorithm: "Kyber512".into(),
            cells: [Some(1.0), Some(2.5), None, None, Some(5.0), Some(6.0)],
        }];
        export_csv(&path, &rows).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Algorithm,keygen(maxHeap),keygen(maxStack),encaps(maxHeap),encap(maxStack),decaps(maxHeap),decaps(maxStack)");
        assert_eq!(lines[1], "Kyber512,1,2.5,,,5,6");
    }

    #[test]
    fn snapshot_uses_fixed_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let record = json!({"keygen": {"maxHeap": 1}});
        let mut m = serde_json::Map::new();
        m.insert("Kyber512".into(), record.clone());
        let ds = Dataset::new(vec![("D1".into(), Snapshot(m))]);
        let rows = vec![SummaryRow::from_snapshot("Kyber512", ds.get("D1"))];
        let snap = DownloadSnapshot::build(&ds, "D1", &rows);

        let path = save_snapshot(&dir.path().join("out"), &snap).unwrap();
        assert_eq!(path.file_name().unwrap(), "mem_kem.json");
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["date"], "D1");
        assert_eq!(written["data"]["D1"]["Kyber512"], record);
        assert!(written["generated_utc"].as_str().is_some());
    }
}
