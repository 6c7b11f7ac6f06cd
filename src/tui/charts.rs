use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph,
        Row, Table,
    },
    Frame,
};

use super::state::UiState;
use crate::families::SeriesColor;
use crate::table::SUMMARY_HEADER;
use crate::view::{ChartHandle, ChartType};

fn to_color(c: SeriesColor) -> Color {
    Color::Rgb(c.0, c.1, c.2)
}

fn y_max(chart: &ChartHandle) -> f64 {
    chart.max_visible().unwrap_or(0.0).max(1.0) * 1.1
}

/// Compact byte count for axis labels.
fn short_bytes(v: f64) -> String {
    if v >= 1_000_000.0 {
        format!("{:.1}M", v / 1_000_000.0)
    } else if v >= 10_000.0 {
        format!("{:.0}k", v / 1_000.0)
    } else {
        format!("{:.0}", v)
    }
}

/// Charts tab: filter form on the left, the three charts stacked on the right.
pub fn draw_charts_tab(area: Rect, f: &mut Frame, state: &UiState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(34), Constraint::Min(0)].as_ref())
        .split(area);

    let form = Paragraph::new(state.form_lines())
        .block(Block::default().borders(Borders::ALL).title("Filters"));
    f.render_widget(form, cols[0]);

    let Some(charts) = state.result.charts.as_ref() else {
        let waiting = Paragraph::new("No data loaded yet.")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Charts"));
        f.render_widget(waiting, cols[1]);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ]
            .as_ref(),
        )
        .split(cols[1]);

    for (chart, area) in charts.iter().zip(rows.iter()) {
        match chart.chart_type {
            ChartType::Line => draw_line_chart(*area, f, chart),
            ChartType::Bar => draw_bar_chart(*area, f, chart),
        }
    }
}

fn chart_title(chart: &ChartHandle) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            chart.operation.title().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            " ({} of {} shown, {})",
            chart.visible().count(),
            chart.series.len(),
            chart.y_label
        )),
    ])
}

fn draw_line_chart(area: Rect, f: &mut Frame, chart: &ChartHandle) {
    // Points are built first so the datasets can borrow them.
    let points: Vec<(&crate::view::Series, Vec<(f64, f64)>)> = chart
        .visible()
        .map(|s| {
            let pts = s
                .data
                .iter()
                .enumerate()
                .filter_map(|(i, v)| v.map(|v| (i as f64, v)))
                .collect();
            (s, pts)
        })
        .collect();

    let datasets: Vec<Dataset> = points
        .iter()
        .map(|(s, pts)| {
            let (marker, graph_type) = if s.dashed {
                (Marker::Dot, GraphType::Scatter)
            } else {
                (Marker::Braille, GraphType::Line)
            };
            Dataset::default()
                .name(s.label.clone())
                .marker(marker)
                .graph_type(graph_type)
                .style(Style::default().fg(to_color(s.color)))
                .data(pts)
        })
        .collect();

    let x_max = chart.labels.len().saturating_sub(1).max(1) as f64;
    let x_labels: Vec<Span> = match (chart.labels.first(), chart.labels.last()) {
        (Some(first), Some(last)) if chart.labels.len() > 1 => {
            vec![Span::raw(first.clone()), Span::raw(last.clone())]
        }
        (Some(only), _) => vec![Span::raw(only.clone())],
        _ => Vec::new(),
    };
    let y_top = y_max(chart);

    let widget = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(chart_title(chart)))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title(chart.y_label)
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, y_top])
                .labels(vec![
                    Span::raw("0"),
                    Span::raw(short_bytes(y_top / 2.0)),
                    Span::raw(short_bytes(y_top)),
                ]),
        );
    f.render_widget(widget, area);
}

fn draw_bar_chart(area: Rect, f: &mut Frame, chart: &ChartHandle) {
    let visible: Vec<_> = chart.visible().collect();
    if visible.is_empty() {
        let empty = Paragraph::new("No algorithm passes the current filters.")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(chart_title(chart)));
        f.render_widget(empty, area);
        return;
    }

    let bars: Vec<Bar> = visible
        .iter()
        .map(|s| {
            let value = s.data.first().copied().flatten();
            Bar::default()
                .value(value.map_or(0, |v| v.max(0.0) as u64))
                .text_value(value.map_or_else(|| "-".to_string(), short_bytes))
                .label(Line::from(s.label.clone()))
                .style(Style::default().fg(to_color(s.color)))
        })
        .collect();

    // Width left for bars once the borders are gone.
    let inner_width = area.width.saturating_sub(2) as usize;
    let bar_width = (inner_width / bars.len().max(1)).saturating_sub(1).clamp(1, 12) as u16;
    let group_label = chart.labels.first().cloned().unwrap_or_default();

    let widget = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title(chart_title(chart)))
        .data(BarGroup::default().label(Line::from(group_label)).bars(&bars))
        .bar_width(bar_width)
        .bar_gap(1)
        .max(y_max(chart) as u64);
    f.render_widget(widget, area);
}

/// Table tab: the per-algorithm summary for the displayed date.
pub fn draw_table_tab(area: Rect, f: &mut Frame, state: &UiState) {
    let title = match state.result.date.as_ref() {
        Some(d) => format!("Summary ({d})"),
        None => "Summary".to_string(),
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    if state.result.table.is_empty() {
        let msg = match state.result.date.as_ref() {
            Some(d) if d.is_all() => "Select a specific date to see the summary table.",
            _ => "No algorithm passes the current filters.",
        };
        f.render_widget(Paragraph::new(msg).block(block), area);
        return;
    }

    let header = Row::new(
        SUMMARY_HEADER
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow))),
    );
    let rows = state.result.table.iter().map(|r| {
        Row::new(
            r.formatted()
                .into_iter()
                .enumerate()
                .map(|(i, s)| {
                    if i == 0 {
                        Cell::from(s)
                    } else {
                        Cell::from(Line::from(s).alignment(Alignment::Right))
                    }
                })
                .collect::<Vec<_>>(),
        )
    });
    let widths = [
        Constraint::Percentage(22),
        Constraint::Percentage(13),
        Constraint::Percentage(13),
        Constraint::Percentage(13),
        Constraint::Percentage(13),
        Constraint::Percentage(13),
        Constraint::Percentage(13),
    ];
    let table = Table::new(rows, widths).header(header).block(block);
    f.render_widget(table, area);
}

/// Config tab: metadata records of the reference date.
pub fn draw_config_tab(area: Rect, f: &mut Frame, state: &UiState) {
    let title = match state.result.reference_date.as_deref() {
        Some(d) => format!("Configuration (reference {d})"),
        None => "Configuration".to_string(),
    };
    let lines: Vec<Line> = if state.result.config_rows.is_empty() {
        vec![Line::from("No configuration records in the dataset.")]
    } else {
        let key_width = state
            .result
            .config_rows
            .iter()
            .map(|r| r.key.chars().count())
            .max()
            .unwrap_or(0);
        state
            .result
            .config_rows
            .iter()
            .map(|r| {
                Line::from(vec![
                    Span::styled(
                        format!("{:>w$}  ", r.key, w = key_width),
                        Style::default().fg(Color::Gray),
                    ),
                    Span::raw(r.value.clone()),
                ])
            })
            .collect()
    };
    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(p, area);
}
