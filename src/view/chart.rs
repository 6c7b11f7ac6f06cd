use crate::families::SeriesColor;
use crate::model::Operation;
use serde::Serialize;

pub const Y_AXIS_LABEL: &str = "Bytes";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
}

/// One algorithm's values along the label axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub label: String,
    pub color: SeriesColor,
    pub dashed: bool,
    pub hidden: bool,
    pub data: Vec<Option<f64>>,
}

/// A constructed chart. Lives until the controller tears it down.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartHandle {
    pub operation: Operation,
    pub chart_type: ChartType,
    pub labels: Vec<String>,
    pub y_label: &'static str,
    pub series: Vec<Series>,
    /// Bumped by every `update`; hosts redraw when it changes.
    pub revision: u64,
}

impl ChartHandle {
    pub fn new(
        operation: Operation,
        chart_type: ChartType,
        labels: Vec<String>,
        series: Vec<Series>,
    ) -> Self {
        Self {
            operation,
            chart_type,
            labels,
            y_label: Y_AXIS_LABEL,
            series,
            revision: 0,
        }
    }

    pub fn set_hidden(&mut self, index: usize, hidden: bool) {
        if let Some(s) = self.series.get_mut(index) {
            s.hidden = hidden;
        }
    }

    pub fn update(&mut self) {
        self.revision += 1;
    }

    pub fn visible(&self) -> impl Iterator<Item = &Series> {
        self.series.iter().filter(|s| !s.hidden)
    }

    /// Largest visible value, for axis scaling.
    pub fn max_visible(&self) -> Option<f64> {
        self.visible()
            .flat_map(|s| s.data.iter().flatten().copied())
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
    }
}

/// The three charts, always built together so they share type and labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSet {
    pub keygen: ChartHandle,
    pub encaps: ChartHandle,
    pub decaps: ChartHandle,
}

impl ChartSet {
    pub fn iter(&self) -> impl Iterator<Item = &ChartHandle> {
        [&self.keygen, &self.encaps, &self.decaps].into_iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ChartHandle> {
        [&mut self.keygen, &mut self.encaps, &mut self.decaps].into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::families::color_for;

    fn series(label: &str, data: Vec<Option<f64>>) -> Series {
        Series {
            label: label.into(),
            color: color_for(label),
            dashed: false,
            hidden: false,
            data,
        }
    }

    #[test]
    fn max_visible_skips_hidden_and_absent() {
        let mut h = ChartHandle::new(
            Operation::Keygen,
            ChartType::Line,
            vec!["D1".into(), "D2".into()],
            vec![
                series("A", vec![Some(5.0), None]),
                series("B", vec![Some(50.0), Some(7.0)]),
            ],
        );
        assert_eq!(h.max_visible(), Some(50.0));
        h.set_hidden(1, true);
        assert_eq!(h.max_visible(), Some(5.0));
        h.set_hidden(0, true);
        assert_eq!(h.max_visible(), None);
        assert_eq!(h.y_label, "Bytes");
        h.update();
        assert_eq!(h.revision, 1);
    }
}
