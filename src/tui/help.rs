use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn key_line(key: &'static str, pad: usize, what: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(format!("{:pad$}{what}", "")),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("q", Style::default().fg(Color::Magenta)),
            Span::raw(" / "),
            Span::styled("Ctrl-C", Style::default().fg(Color::Magenta)),
            Span::raw("  Quit"),
        ]),
        key_line("tab", 9, "Switch tabs"),
        key_line("?", 11, "Show this help"),
        key_line("s", 11, "Save snapshot (mem_kem.json) to the download directory"),
        key_line("c", 11, "Export summary table as CSV"),
        key_line("y", 11, "Copy saved path to clipboard"),
        Line::from(""),
        Line::from("Filters:"),
        key_line("↑/↓", 9, "Select field"),
        key_line("←/→", 9, "Change date, memory metric, NIST level, family"),
        key_line("0-9", 9, "Type a minimum (keygen/encaps/decaps fields)"),
        key_line("Backspace", 3, "Delete last digit"),
        key_line("Enter", 7, "Apply filters"),
        Line::from(""),
        Line::from("An algorithm is shown when its value on the reference date exceeds every"),
        Line::from("minimum, it matches the NIST level and its family is selected."),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
