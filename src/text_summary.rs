//! Text summary builder for CLI output.
//!
//! Formats a render pass as human-readable lines for text mode.

use crate::table::SUMMARY_HEADER;
use crate::view::{ChartHandle, RenderResult};
use anyhow::Result;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

fn chart_lines(chart: &ChartHandle, lines: &mut Vec<String>) {
    let visible = chart.visible().count();
    lines.push(format!(
        "== {} ({:?}, {} of {} series shown, y: {}) ==",
        chart.operation.title(),
        chart.chart_type,
        visible,
        chart.series.len(),
        chart.y_label
    ));
    lines.push(format!("   x: {}", chart.labels.join(" ")));
    for s in chart.visible() {
        let values: Vec<String> = s
            .data
            .iter()
            .map(|v| v.map_or_else(|| "-".to_string(), |v| format!("{v}")))
            .collect();
        lines.push(format!(
            "   {:<32} {}{}",
            s.label,
            values.join(" "),
            if s.dashed { "  (ref)" } else { "" }
        ));
    }
}

/// Render table columns right-aligned to their widest cell.
fn aligned(rows: &[Vec<String>]) -> Vec<String> {
    let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..cols)
        .map(|c| {
            rows.iter()
                .filter_map(|r| r.get(c))
                .map(|s| s.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();
    rows.iter()
        .map(|r| {
            r.iter()
                .enumerate()
                .map(|(c, s)| format!("{:>w$}", s, w = widths[c]))
                .collect::<Vec<_>>()
                .join("  ")
        })
        .collect()
}

/// Build a text summary from a render pass.
/// Printed instead of the charts when the dataset is empty or not loaded.
const NO_DATA_LINE: &str = "No data available";

pub(crate) fn build_text_summary(result: &RenderResult) -> Result<TextSummary> {
    let mut lines = Vec::new();
    let Some(charts) = result.charts.as_ref() else {
        lines.push(NO_DATA_LINE.to_string());
        return Ok(TextSummary { lines });
    };

    if let (Some(date), Some(metric)) = (result.date.as_ref(), result.metric) {
        lines.push(format!(
            "Date: {date}  Metric: {}  Reference: {}",
            metric.key(),
            result.reference_date.as_deref().unwrap_or("-")
        ));
    }

    if !result.config_rows.is_empty() {
        lines.push("== Configuration ==".into());
        let rows: Vec<Vec<String>> = result
            .config_rows
            .iter()
            .map(|r| vec![r.key.clone(), r.value.clone()])
            .collect();
        lines.extend(aligned(&rows).into_iter().map(|l| format!("   {l}")));
    }

    for chart in charts.iter() {
        chart_lines(chart, &mut lines);
    }

    if !result.table.is_empty() {
        lines.push("== Summary ==".into());
        let mut rows: Vec<Vec<String>> = vec![SUMMARY_HEADER.iter().map(|s| s.to_string()).collect()];
        rows.extend(result.table.iter().map(|r| r.formatted()));
        lines.extend(aligned(&rows));
    }

    Ok(TextSummary { lines })
}
