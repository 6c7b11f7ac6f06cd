//! Summary table, configuration table and downloadable snapshot.

use crate::model::{Dataset, MemMetric, Operation, Snapshot};
use serde::Serialize;
use serde_json::{Map, Value};

pub const SUMMARY_HEADER: [&str; 7] = [
    "Algorithm",
    "keygen(maxHeap)",
    "keygen(maxStack)",
    "encaps(maxHeap)",
    "encap(maxStack)",
    "decaps(maxHeap)",
    "decaps(maxStack)",
];

/// Cell text for values missing from the dataset.
pub const ABSENT: &str = "-";

/// Fixed file name of the downloadable snapshot.
pub const SNAPSHOT_FILE_NAME: &str = "mem_kem.json";

/// Column order of the numeric summary cells.
const CELL_ORDER: [(Operation, MemMetric); 6] = [
    (Operation::Keygen, MemMetric::MaxHeap),
    (Operation::Keygen, MemMetric::MaxStack),
    (Operation::Encaps, MemMetric::MaxHeap),
    (Operation::Encaps, MemMetric::MaxStack),
    (Operation::Decaps, MemMetric::MaxHeap),
    (Operation::Decaps, MemMetric::MaxStack),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub algorithm: String,
    pub cells: [Option<f64>; 6],
}

impl SummaryRow {
    /// Read every cell from `snapshot`; each missing path is absent on its own.
    pub fn from_snapshot(algorithm: &str, snapshot: Option<&Snapshot>) -> Self {
        let mut cells = [None; 6];
        if let Some(s) = snapshot {
            for (cell, (op, metric)) in cells.iter_mut().zip(CELL_ORDER) {
                *cell = s.value(algorithm, op, metric);
            }
        }
        Self {
            algorithm: algorithm.to_string(),
            cells,
        }
    }

    /// Display strings: algorithm, then heap columns with two decimals and stack columns as-is.
    pub fn formatted(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(7);
        out.push(self.algorithm.clone());
        for (i, cell) in self.cells.iter().enumerate() {
            out.push(format_cell(*cell, i % 2 == 0));
        }
        out
    }
}

pub fn format_cell(v: Option<f64>, two_decimals: bool) -> String {
    match v {
        None => ABSENT.to_string(),
        Some(v) if two_decimals => format!("{v:.2}"),
        Some(v) => format!("{v}"),
    }
}

/// One line of the static configuration display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigRow {
    pub key: String,
    pub value: String,
}

/// Rows for a metadata record: fields sorted, values stringified with quotes stripped.
pub fn config_rows(record: &Value) -> Vec<ConfigRow> {
    let Value::Object(fields) = record else {
        return vec![ConfigRow {
            key: String::new(),
            value: strip_quotes(record),
        }];
    };
    let mut keys: Vec<&String> = fields.keys().collect();
    keys.sort_unstable();
    keys.into_iter()
        .map(|k| ConfigRow {
            key: k.clone(),
            value: strip_quotes(&fields[k.as_str()]),
        })
        .collect()
}

fn strip_quotes(v: &Value) -> String {
    v.to_string().replace('"', "")
}

/// The currently filtered view of one date, offered for download.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadSnapshot {
    pub file_name: &'static str,
    pub date: String,
    pub content: Value,
}

impl DownloadSnapshot {
    /// `{date: {algorithm: record}}` restricted to the visible algorithms.
    pub fn build(dataset: &Dataset, date: &str, rows: &[SummaryRow]) -> Self {
        let mut records = Map::new();
        if let Some(snap) = dataset.get(date) {
            for row in rows {
                if let Some(rec) = snap.record(&row.algorithm) {
                    records.insert(row.algorithm.clone(), rec.clone());
                }
            }
        }
        let mut content = Map::new();
        content.insert(date.to_string(), Value::Object(records));
        Self {
            file_name: SNAPSHOT_FILE_NAME,
            date: date.to_string(),
            content: Value::Object(content),
        }
    }
}
