//! The view controller.
//!
//! Owns the three chart handles and the loaded dataset, and turns each filter
//! submission into a [`RenderResult`]. Nothing here touches a terminal, so hosts
//! (TUI, text, JSON) only apply the result.

use super::chart::{ChartHandle, ChartSet, ChartType, Series};
use super::form::{DateChoice, FormState};
use crate::families::{color_for, is_reference_impl};
use crate::loader::LoadedData;
use crate::model::{is_metadata_key, MemMetric, Operation};
use crate::table::{config_rows, ConfigRow, DownloadSnapshot, SummaryRow};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

/// Supplies the dataset. Polled on each render until it yields data; `None` means
/// "not available yet" and is not an error.
pub trait DataSource {
    fn try_load(&mut self) -> Option<LoadedData>;
}

/// Dataset that was loaded before the controller was created.
pub struct Preloaded(pub Option<LoadedData>);

impl DataSource for Preloaded {
    fn try_load(&mut self) -> Option<LoadedData> {
        self.0.take()
    }
}

/// Dataset delivered later by a background fetch.
impl DataSource for UnboundedReceiver<LoadedData> {
    fn try_load(&mut self) -> Option<LoadedData> {
        self.try_recv().ok()
    }
}

/// Everything a host needs to draw one render pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderResult {
    /// False when the dataset is not available yet; nothing else is populated then.
    pub rendered: bool,
    /// True when this pass started from freshly constructed charts.
    pub torn_down: bool,
    pub date: Option<DateChoice>,
    pub metric: Option<MemMetric>,
    pub reference_date: Option<String>,
    pub charts: Option<ChartSet>,
    pub table: Vec<SummaryRow>,
    pub config_rows: Vec<ConfigRow>,
    pub download: Option<DownloadSnapshot>,
}

pub struct ViewController<S> {
    source: S,
    data: Option<LoadedData>,
    charts: Option<ChartSet>,
    metric: Option<MemMetric>,
    current_labels: Vec<String>,
    config_rows: Vec<ConfigRow>,
}

impl<S: DataSource> ViewController<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            data: None,
            charts: None,
            metric: None,
            current_labels: Vec::new(),
            config_rows: Vec::new(),
        }
    }

    pub fn data(&self) -> Option<&LoadedData> {
        self.data.as_ref()
    }

    pub fn charts(&self) -> Option<&ChartSet> {
        self.charts.as_ref()
    }

    /// Drop all chart handles and forget the metric so the next render rebuilds.
    pub fn teardown(&mut self) {
        if self.charts.take().is_some() {
            debug!("charts torn down");
        }
        self.metric = None;
    }

    fn all_labels_len(&self) -> usize {
        self.data.as_ref().map_or(0, |d| d.dates.len())
    }

    /// Handle a filter submission.
    pub fn on_filter_submit(&mut self, form: &FormState) -> RenderResult {
        // Charts are only reused while staying on the full time series with the same metric.
        let must_rebuild = !matches!(form.date, Some(DateChoice::All))
            || self.current_labels.len() != self.all_labels_len()
            || self.metric != Some(form.metric);
        if must_rebuild {
            self.teardown();
        }
        let mut result = self.render(form, false, false);
        result.torn_down |= must_rebuild;
        result
    }

    /// Run one render pass. `full_init` also collects the configuration rows.
    pub fn render(&mut self, form: &FormState, full_init: bool, force_teardown: bool) -> RenderResult {
        let mut torn_down = self.charts.is_none();
        if force_teardown {
            self.teardown();
            torn_down = true;
        }
        let metric = *self.metric.get_or_insert(form.metric);

        if self.data.is_none() {
            self.data = self.source.try_load();
            if let Some(d) = &self.data {
                info!(
                    dates = d.dates.len(),
                    reference = %d.reference_date,
                    "dataset available"
                );
            }
        }
        let Some(data) = self.data.as_ref() else {
            debug!("dataset not available yet, skipping render");
            return RenderResult {
                metric: Some(metric),
                ..Default::default()
            };
        };

        // Resolved only now: the loader provides the default date.
        let date = form
            .date
            .clone()
            .or_else(|| data.default_date().map(|d| DateChoice::Date(d.to_string())))
            .unwrap_or(DateChoice::All);
        let sample_dates: Vec<&str> = match &date {
            DateChoice::All => data.dates.iter().map(String::as_str).collect(),
            DateChoice::Date(d) => vec![d.as_str()],
        };

        if full_init {
            self.config_rows.clear();
        }
        let mut chart_type = ChartType::Bar;
        let mut keygen = Vec::new();
        let mut encaps = Vec::new();
        let mut decaps = Vec::new();

        for key in data.reference.sorted_keys() {
            if is_metadata_key(key) {
                if full_init {
                    if let Some(record) = data.reference.record(key) {
                        self.config_rows.extend(config_rows(record));
                    }
                }
                continue;
            }
            if !form.key_filter.accepts(key) {
                continue;
            }
            self.current_labels = sample_dates.iter().map(|d| d.to_string()).collect();

            let sample = |op: Operation| -> Vec<Option<f64>> {
                sample_dates
                    .iter()
                    .map(|d| data.dataset.value(d, key, op, metric))
                    .collect()
            };
            let line = sample_dates.len() > 1;
            if line {
                chart_type = ChartType::Line;
            }
            let make = |points: Vec<Option<f64>>| Series {
                label: key.to_string(),
                color: color_for(key),
                dashed: line && is_reference_impl(key),
                hidden: false,
                data: points,
            };
            keygen.push(make(sample(Operation::Keygen)));
            encaps.push(make(sample(Operation::Encaps)));
            decaps.push(make(sample(Operation::Decaps)));
        }

        let labels = &self.current_labels;
        let charts = self.charts.get_or_insert_with(|| {
            debug!(?chart_type, series = keygen.len(), "constructing charts");
            ChartSet {
                keygen: ChartHandle::new(Operation::Keygen, chart_type, labels.clone(), keygen),
                encaps: ChartHandle::new(Operation::Encaps, chart_type, labels.clone(), encaps),
                decaps: ChartHandle::new(Operation::Decaps, chart_type, labels.clone(), decaps),
            }
        });

        // Visibility is decided on the reference snapshot, the table on the displayed date.
        let mut table = Vec::new();
        for i in 0..charts.keygen.series.len() {
            let label = charts.keygen.series[i].label.clone();
            let below_min = Operation::ALL.iter().any(|&op| {
                !exceeds_min(data.reference.value(&label, op, metric), form.min_for(op))
            });
            let hidden = below_min
                || form.nist_level.rejects(&label)
                || !form.families.is_selected(&label);
            for chart in charts.iter_mut() {
                chart.set_hidden(i, hidden);
            }
            if !hidden {
                if let DateChoice::Date(d) = &date {
                    table.push(SummaryRow::from_snapshot(&label, data.dataset.get(d)));
                }
            }
        }
        for chart in charts.iter_mut() {
            chart.update();
        }

        let download = match &date {
            DateChoice::Date(d) if !table.is_empty() => {
                Some(DownloadSnapshot::build(&data.dataset, d, &table))
            }
            _ => None,
        };
        debug!(date = %date, rows = table.len(), "render complete");

        RenderResult {
            rendered: true,
            torn_down,
            date: Some(date),
            metric: Some(metric),
            reference_date: Some(data.reference_date.clone()),
            charts: Some(charts.clone()),
            table,
            config_rows: self.config_rows.clone(),
            download,
        }
    }
}

/// A series passes a threshold only when its value is strictly above it.
/// No threshold always passes; a missing value never passes a set threshold.
fn exceeds_min(value: Option<f64>, min: Option<i64>) -> bool {
    match min {
        None => true,
        Some(m) => value.map_or(false, |v| v > m as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::families::{Family, FamilySelection, NistLevel};
    use crate::loader::parse_dataset;

    const DATA: &str = r#"{
        "D1": {
            "config": {"compiler": "gcc", "version": "0.4.0"},
            "kyber512": {
                "keygen": {"maxHeap": 500, "maxStack": 6000},
                "encaps": {"maxHeap": 600, "maxStack": 8000},
                "decaps": {"maxHeap": 700, "maxStack": 9000}
            },
            "HQC-128": {
                "keygen": {"maxHeap": 2000, "maxStack": 30000},
                "encaps": {"maxHeap": 3000, "maxStack": 40000},
                "decaps": {"maxHeap": 4000, "maxStack": 50000}
            },
            "Kyber768-ref": {
                "keygen": {"maxHeap": 1500, "maxStack": 7000},
                "encaps": {"maxHeap": 1600, "maxStack": 9000},
                "decaps": {"maxHeap": 1700, "maxStack": 10000}
            }
        },
        "D2": {
            "kyber512": {
                "keygen": {"maxHeap": 510, "maxStack": 6100},
                "decaps": {"maxHeap": 710, "maxStack": 9100}
            },
            "HQC-128": {
                "keygen": {"maxHeap": 2010, "maxStack": 30100},
                "encaps": {"maxHeap": 3010, "maxStack": 40100},
                "decaps": {"maxHeap": 4010, "maxStack": 50100}
            }
        }
    }"#;

    fn loaded() -> LoadedData {
        let ds = parse_dataset(DATA.as_bytes()).unwrap();
        LoadedData::prepare(ds, None).unwrap().unwrap()
    }

    fn controller() -> ViewController<Preloaded> {
        ViewController::new(Preloaded(Some(loaded())))
    }

    fn form(date: &str) -> FormState {
        FormState {
            date: Some(DateChoice::parse(date)),
            ..Default::default()
        }
    }

    fn hidden_labels(r: &RenderResult) -> Vec<String> {
        r.charts
            .as_ref()
            .unwrap()
            .keygen
            .series
            .iter()
            .filter(|s| s.hidden)
            .map(|s| s.label.clone())
            .collect()
    }

    #[test]
    fn unavailable_dataset_renders_nothing() {
        let mut c = ViewController::new(Preloaded(None));
        let r = c.render(&FormState::default(), true, false);
        assert!(!r.rendered);
        assert!(r.charts.is_none());
        assert!(c.charts().is_none());
    }

    #[test]
    fn late_dataset_is_picked_up_on_next_submit() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<LoadedData>();
        let mut c = ViewController::new(rx);
        assert!(!c.on_filter_submit(&form("D1")).rendered);
        tx.send(loaded()).unwrap();
        let r = c.on_filter_submit(&form("D1"));
        assert!(r.rendered);
        assert_eq!(r.table.len(), 3);
    }

    #[test]
    fn reference_is_most_complete_date_and_series_are_sorted() {
        let mut c = controller();
        let r = c.render(&form("D1"), true, false);
        assert_eq!(r.reference_date.as_deref(), Some("D1"));
        let labels: Vec<_> = r
            .charts
            .as_ref()
            .unwrap()
            .keygen
            .series
            .iter()
            .map(|s| s.label.as_str())
            .collect();
        assert_eq!(labels, vec!["HQC-128", "Kyber768-ref", "kyber512"]);
    }

    #[test]
    fn specific_date_gives_one_point_bar_chart() {
        let mut c = controller();
        let r = c.render(&form("D2"), true, false);
        let charts = r.charts.unwrap();
        for chart in charts.iter() {
            assert_eq!(chart.chart_type, ChartType::Bar);
            assert_eq!(chart.labels, vec!["D2"]);
            assert!(chart.series.iter().all(|s| s.data.len() == 1));
            assert!(chart.series.iter().all(|s| !s.dashed));
        }
        // algorithm missing entirely at D2
        let ref_series = &charts.keygen.series[1];
        assert_eq!(ref_series.label, "Kyber768-ref");
        assert_eq!(ref_series.data, vec![None]);
    }

    #[test]
    fn unknown_date_still_gives_one_absent_point() {
        let mut c = controller();
        let r = c.render(&form("D9"), true, false);
        let charts = r.charts.unwrap();
        assert!(charts.keygen.series.iter().all(|s| s.data == vec![None]));
        assert!(r.download.is_some());
        assert!(r.table.iter().all(|row| row.cells == [None; 6]));
    }

    #[test]
    fn all_dates_give_line_chart_with_one_point_per_date() {
        let mut c = controller();
        let r = c.render(&form("All"), true, false);
        let charts = r.charts.unwrap();
        for chart in charts.iter() {
            assert_eq!(chart.chart_type, ChartType::Line);
            assert_eq!(chart.labels, vec!["D1", "D2"]);
            assert!(chart.series.iter().all(|s| s.data.len() == 2));
        }
        assert_eq!(charts.encaps.series[2].data, vec![Some(600.0), None]);
        assert!(charts.keygen.series[1].dashed);
        assert!(!charts.keygen.series[0].dashed);
        assert!(r.table.is_empty());
        assert!(r.download.is_none());
    }

    #[test]
    fn single_date_dataset_with_all_is_a_bar_chart() {
        let ds = parse_dataset(br#"{"D1": {"Kyber512": {"keygen": {"maxHeap": 1}}}}"#).unwrap();
        let data = LoadedData::prepare(ds, None).unwrap();
        let mut c = ViewController::new(Preloaded(data));
        let r = c.render(&form("All"), true, false);
        assert_eq!(r.charts.unwrap().keygen.chart_type, ChartType::Bar);
    }

    #[test]
    fn missing_operation_leaves_absent_table_cells() {
        let mut c = controller();
        let r = c.render(&form("D2"), true, false);
        let row = r.table.iter().find(|r| r.algorithm == "kyber512").unwrap();
        assert_eq!(
            row.cells,
            [Some(510.0), Some(6100.0), None, None, Some(710.0), Some(9100.0)]
        );
    }

    #[test]
    fn table_values_match_dataset_at_displayed_date() {
        let data = loaded();
        let mut c = controller();
        let r = c.render(&form("D2"), true, false);
        let hqc = r.table.iter().find(|r| r.algorithm == "HQC-128").unwrap();
        let expected: Vec<Option<f64>> = [
            (Operation::Keygen, MemMetric::MaxHeap),
            (Operation::Keygen, MemMetric::MaxStack),
            (Operation::Encaps, MemMetric::MaxHeap),
            (Operation::Encaps, MemMetric::MaxStack),
            (Operation::Decaps, MemMetric::MaxHeap),
            (Operation::Decaps, MemMetric::MaxStack),
        ]
        .iter()
        .map(|(op, m)| data.dataset.value("D2", "HQC-128", *op, *m))
        .collect();
        assert_eq!(hqc.cells.to_vec(), expected);
    }

    #[test]
    fn keygen_min_hides_series_in_all_charts() {
        let mut c = controller();
        let f = FormState {
            keygen_min: Some(1000),
            ..form("D1")
        };
        let r = c.on_filter_submit(&f);
        let charts = r.charts.as_ref().unwrap();
        for chart in charts.iter() {
            let s = chart.series.iter().find(|s| s.label == "kyber512").unwrap();
            assert!(s.hidden);
        }
        assert_eq!(hidden_labels(&r), vec!["kyber512"]);
        assert!(r.table.iter().all(|row| row.algorithm != "kyber512"));
    }

    #[test]
    fn value_equal_to_min_is_hidden() {
        let mut c = controller();
        let f = FormState {
            encap_min: Some(600),
            ..form("D1")
        };
        assert_eq!(hidden_labels(&c.on_filter_submit(&f)), vec!["kyber512"]);
    }

    #[test]
    fn raising_minimums_never_unhides() {
        let mut c = controller();
        let mut previous: Vec<String> = Vec::new();
        for min in [0, 550, 1000, 1600, 2500, 5000] {
            let f = FormState {
                keygen_min: Some(min),
                decap_min: Some(min / 2),
                ..form("All")
            };
            let hidden = hidden_labels(&c.on_filter_submit(&f));
            assert!(previous.iter().all(|p| hidden.contains(p)));
            previous = hidden;
        }
        assert_eq!(previous.len(), 3);
    }

    #[test]
    fn stack_metric_uses_stack_reference_values() {
        let mut c = controller();
        let f = FormState {
            metric: MemMetric::MaxStack,
            keygen_min: Some(6500),
            ..form("D1")
        };
        let r = c.on_filter_submit(&f);
        assert_eq!(r.metric, Some(MemMetric::MaxStack));
        assert_eq!(hidden_labels(&r), vec!["kyber512"]);
        assert_eq!(
            r.charts.unwrap().keygen.series[0].data,
            vec![Some(30000.0)]
        );
    }

    #[test]
    fn level_and_family_filters() {
        let mut c = controller();
        let f = FormState {
            nist_level: NistLevel::Level(1),
            ..form("D1")
        };
        assert_eq!(hidden_labels(&c.on_filter_submit(&f)), vec!["Kyber768-ref"]);

        let f = FormState {
            families: FamilySelection::only(&[Family::Hqc]),
            ..form("D1")
        };
        assert_eq!(
            hidden_labels(&c.on_filter_submit(&f)),
            vec!["Kyber768-ref", "kyber512"]
        );

        // relaxing the family filter alone restores the series
        let r = c.on_filter_submit(&form("D1"));
        assert!(hidden_labels(&r).is_empty());
    }

    #[test]
    fn key_filter_drops_series_entirely() {
        let mut c = controller();
        let mut f = form("D1");
        f.key_filter.hide_reference = true;
        let r = c.render(&f, true, false);
        assert_eq!(r.charts.unwrap().keygen.series.len(), 2);
    }

    #[test]
    fn config_rows_only_on_full_init() {
        let mut c = controller();
        let r = c.on_filter_submit(&form("D1"));
        assert!(r.config_rows.is_empty());
        let r = c.render(&form("D1"), true, true);
        let keys: Vec<_> = r.config_rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["compiler", "version"]);
        assert_eq!(r.config_rows[1].value, "0.4.0");
        // rendering again with full init does not duplicate rows
        let r = c.render(&form("D1"), true, true);
        assert_eq!(r.config_rows.len(), 2);
    }

    #[test]
    fn charts_are_reused_only_for_unchanged_time_series() {
        let mut c = controller();
        let first = c.on_filter_submit(&form("All"));
        assert!(first.torn_down);

        let again = c.on_filter_submit(&form("All"));
        assert!(!again.torn_down);
        assert_eq!(again.charts.as_ref().unwrap().keygen.revision, 2);

        let specific = c.on_filter_submit(&form("D1"));
        assert!(specific.torn_down);
        assert_eq!(specific.charts.as_ref().unwrap().keygen.revision, 1);

        let back = c.on_filter_submit(&form("All"));
        assert!(back.torn_down);
        assert_eq!(back.charts.unwrap().keygen.chart_type, ChartType::Line);
    }

    #[test]
    fn metric_change_tears_down() {
        let mut c = controller();
        c.on_filter_submit(&form("All"));
        let f = FormState {
            metric: MemMetric::MaxStack,
            ..form("All")
        };
        let r = c.on_filter_submit(&f);
        assert!(r.torn_down);
        assert_eq!(
            r.charts.unwrap().keygen.series[2].data,
            vec![Some(6000.0), Some(6100.0)]
        );
    }

    #[test]
    fn unset_date_defaults_to_latest() {
        let mut c = controller();
        let r = c.render(&FormState::default(), true, false);
        assert_eq!(r.date, Some(DateChoice::Date("D2".into())));
    }

    #[test]
    fn download_snapshot_contains_visible_records() {
        let mut c = controller();
        let f = FormState {
            keygen_min: Some(1000),
            ..form("D2")
        };
        let r = c.on_filter_submit(&f);
        let dl = r.download.unwrap();
        assert_eq!(dl.file_name, "mem_kem.json");
        let records = dl.content["D2"].as_object().unwrap();
        assert!(records.contains_key("HQC-128"));
        assert!(!records.contains_key("kyber512"));
    }

    #[test]
    fn empty_table_clears_download() {
        let mut c = controller();
        let f = FormState {
            keygen_min: Some(1_000_000),
            ..form("D1")
        };
        let r = c.on_filter_submit(&f);
        assert!(r.table.is_empty());
        assert!(r.download.is_none());
    }
}
