use crate::families::{Family, FamilySelection, KeyFilter, NistLevel};
use crate::loader::{self, DataLocation};
use crate::model::MemMetric;
use crate::view::{parse_threshold, DateChoice, FormState, Preloaded, RenderResult, ViewController};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "kem-mem-view",
    version,
    about = "Charts and tables for KEM memory benchmarks (heap/stack of keygen, encaps, decaps)"
)]
pub struct Cli {
    /// Benchmark dataset: a JSON file path or an http(s) URL
    #[arg(long)]
    pub data: String,

    /// Date to display, or "All" for the time series (default: latest date)
    #[arg(long)]
    pub date: Option<String>,

    /// Memory metric to chart
    #[arg(long, value_enum, default_value = "heap")]
    pub mem: MemMetric,

    /// Only show algorithms whose reference keygen value exceeds this
    #[arg(long, default_value = "")]
    pub keygen_min: String,

    /// Only show algorithms whose reference encaps value exceeds this
    #[arg(long, default_value = "")]
    pub encap_min: String,

    /// Only show algorithms whose reference decaps value exceeds this
    #[arg(long, default_value = "")]
    pub decap_min: String,

    /// NIST security level to show: all, or 1-5
    #[arg(long, default_value = "all")]
    pub nist_level: NistLevel,

    /// Algorithm family to show (repeatable; default: all families)
    #[arg(long = "family", value_enum)]
    pub families: Vec<Family>,

    /// Only chart algorithms whose name contains this text
    #[arg(long)]
    pub name_filter: Option<String>,

    /// Leave reference ("-ref") implementations out of the charts
    #[arg(long)]
    pub hide_ref: bool,

    /// Date whose records decide filter pass/fail (default: most complete date)
    #[arg(long)]
    pub reference_date: Option<String>,

    /// Timeout for fetching the dataset over HTTP
    #[arg(long, default_value = "30s")]
    pub fetch_timeout: humantime::Duration,

    /// Print JSON render result and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Print text summary and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Write the filtered snapshot (visible algorithms at the displayed date) as JSON
    #[arg(long)]
    pub export_json: Option<std::path::PathBuf>,

    /// Write the summary table as CSV
    #[arg(long)]
    pub export_csv: Option<std::path::PathBuf>,

    /// Log filter, e.g. "debug" or "kem_mem_view=trace" (default: warn; off in the TUI).
    /// In the TUI, logs go to kem-mem-view/kem-mem-view.log under the user cache directory
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    pub fn is_interactive(&self) -> bool {
        !self.json && !self.text
    }
}

/// Build the initial filter form from CLI arguments.
pub fn build_form(args: &Cli) -> FormState {
    FormState {
        date: args.date.as_deref().map(DateChoice::parse),
        metric: args.mem,
        keygen_min: parse_threshold(&args.keygen_min),
        encap_min: parse_threshold(&args.encap_min),
        decap_min: parse_threshold(&args.decap_min),
        nist_level: args.nist_level,
        families: FamilySelection::only(&args.families),
        key_filter: KeyFilter {
            name_contains: args.name_filter.clone(),
            hide_reference: args.hide_ref,
        },
    }
}

pub async fn run(args: Cli) -> Result<()> {
    if args.json && args.text {
        return Err(anyhow::anyhow!("--json and --text are mutually exclusive"));
    }

    if args.is_interactive() {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_oneshot(args).await;
        }
    }

    run_oneshot(args).await
}

/// Load the dataset, render once, print and export.
async fn run_oneshot(args: Cli) -> Result<()> {
    let location = DataLocation::parse(&args.data);
    let loaded = loader::load(
        &location,
        Duration::from(args.fetch_timeout),
        args.reference_date.as_deref(),
    )
    .await
    .with_context(|| format!("failed to load dataset from {location}"))?;
    if loaded.is_none() {
        warn!(source = %location, "dataset is empty");
    }

    let form = build_form(&args);
    let mut controller = ViewController::new(Preloaded(loaded));
    let result = controller.render(&form, true, false);

    let (out_tx, out_handle) = spawn_output_writer();
    for msg in handle_exports(&args, &result)? {
        let _ = out_tx.send(OutputLine::Stderr(msg));
    }

    if args.json {
        let out = serde_json::to_string_pretty(&result)?;
        let _ = out_tx.send(OutputLine::Stdout(out));
    } else {
        let summary = crate::text_summary::build_text_summary(&result)?;
        for line in summary.lines {
            let _ = out_tx.send(OutputLine::Stdout(line));
        }
    }

    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}

/// Handle export operations (JSON snapshot and CSV table) for one-shot modes.
fn handle_exports(args: &Cli, result: &RenderResult) -> Result<Vec<String>> {
    let mut messages = Vec::new();
    if let Some(p) = args.export_json.as_deref() {
        let snapshot = result
            .download
            .as_ref()
            .context("no snapshot to export: select a specific date with visible algorithms")?;
        crate::storage::export_json(p, snapshot)?;
        messages.push(format!("Exported JSON: {}", p.display()));
    }
    if let Some(p) = args.export_csv.as_deref() {
        crate::storage::export_csv(p, &result.table)?;
        messages.push(format!("Exported CSV: {}", p.display()));
    }
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    #[test]
    fn form_from_args() {
        let args = Cli::parse_from([
            "kem-mem-view",
            "--data",
            "mem_kem.json",
            "--date",
            "All",
            "--mem",
            "stack",
            "--keygen-min",
            "1000",
            "--encap-min",
            "abc",
            "--nist-level",
            "3",
            "--family",
            "kyber",
            "--family",
            "classic-mceliece",
            "--hide-ref",
        ]);
        let form = build_form(&args);
        assert_eq!(form.date, Some(DateChoice::All));
        assert_eq!(form.metric, MemMetric::MaxStack);
        assert_eq!(form.keygen_min, Some(1000));
        assert_eq!(form.encap_min, None);
        assert_eq!(form.decap_min, None);
        assert_eq!(form.nist_level, NistLevel::Level(3));
        assert!(form.families.is_selected("Kyber768"));
        assert!(form.families.is_selected("Classic-McEliece-348864"));
        assert!(!form.families.is_selected("HQC-128"));
        assert!(form.key_filter.hide_reference);
        assert!(args.is_interactive());
    }

    #[test]
    fn defaults() {
        let args = Cli::parse_from(["kem-mem-view", "--data", "x.json", "--text"]);
        let form = build_form(&args);
        assert_eq!(form.date, None);
        assert_eq!(form.metric, MemMetric::MaxHeap);
        assert_eq!(form.nist_level, NistLevel::All);
        assert!(form.families.is_all());
        assert!(!args.is_interactive());
        assert_eq!(Duration::from(args.fetch_timeout), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn text_mode_on_empty_dataset_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("empty.json");
        std::fs::write(&data, "{}").unwrap();
        let args = Cli::parse_from([
            OsString::from("kem-mem-view"),
            OsString::from("--data"),
            data.into_os_string(),
            OsString::from("--text"),
        ]);
        assert!(run(args).await.is_ok());
    }

    #[tokio::test]
    async fn oneshot_exports_snapshot_and_table() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("mem_kem.json");
        std::fs::write(
            &data,
            r#"{"2021-06-01": {"Kyber512": {"keygen": {"maxHeap": 1, "maxStack": 2}}}}"#,
        )
        .unwrap();
        let json_out = dir.path().join("snap.json");
        let csv_out = dir.path().join("table.csv");
        let args = Cli::parse_from([
            OsString::from("kem-mem-view"),
            OsString::from("--data"),
            data.clone().into_os_string(),
            OsString::from("--json"),
            OsString::from("--export-json"),
            json_out.clone().into_os_string(),
            OsString::from("--export-csv"),
            csv_out.clone().into_os_string(),
        ]);
        run(args).await.unwrap();
        assert!(json_out.exists());
        let csv = std::fs::read_to_string(&csv_out).unwrap();
        assert!(csv.contains("Kyber512,1,2,,,,"));
    }
}
