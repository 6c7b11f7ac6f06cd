mod charts;
mod export;
mod help;
mod state;

use crate::cli::{build_form, Cli};
use crate::loader::{self, DataLocation, LoadedData};
use crate::view::{DataSource, ViewController};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::Color,
    style::Style,
    text::Line,
    widgets::{Block, Borders, Paragraph, Tabs},
    Terminal,
};
use state::UiState;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{info, warn};

const TABS: [&str; 4] = ["Charts", "Table", "Config", "Help"];

pub async fn run(args: Cli) -> Result<()> {
    let (data_tx, data_rx) = mpsc::unbounded_channel::<LoadedData>();
    let (status_tx, status_rx) = mpsc::unbounded_channel::<String>();

    // The fetch runs on the runtime; the UI picks the dataset up whenever it arrives.
    let location = DataLocation::parse(&args.data);
    let timeout = Duration::from(args.fetch_timeout);
    let reference_date = args.reference_date.clone();
    let loader_handle = tokio::spawn(async move {
        match loader::load(&location, timeout, reference_date.as_deref()).await {
            Ok(Some(data)) => {
                let _ = status_tx.send(format!("Loaded {} date(s) from {location}", data.dates.len()));
                let _ = data_tx.send(data);
            }
            Ok(None) => {
                let _ = status_tx.send(format!("Dataset at {location} is empty"));
            }
            Err(e) => {
                warn!(error = %e, "dataset load failed");
                let _ = status_tx.send(format!("Load failed: {:#}", anyhow::Error::new(e)));
            }
        }
    });

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_args = args.clone();
    let ui_handle = std::thread::spawn(move || run_threaded(ui_args, data_rx, status_rx));

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    loader_handle.abort();
    match join_res {
        Ok(Ok(res)) => res,
        Ok(Err(_)) => Err(anyhow::anyhow!("TUI thread panicked")),
        Err(e) => Err(anyhow::anyhow!("TUI join failed: {e}")),
    }
}

/// Run the TUI loop on a dedicated thread.
pub fn run_threaded(
    args: Cli,
    data_rx: UnboundedReceiver<LoadedData>,
    mut status_rx: UnboundedReceiver<String>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // Controller and UiState are owned by the UI thread only.
    let mut controller = ViewController::new(data_rx);
    let mut state = UiState::new(
        build_form(&args),
        [
            args.keygen_min.clone(),
            args.encap_min.clone(),
            args.decap_min.clone(),
        ],
    );
    state.sync_thresholds();

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();
    let mut needs_redraw = true;

    let res = loop {
        // Keep trying the initial full render until the dataset shows up.
        if !state.result.rendered {
            let result = controller.render(&state.form, true, false);
            if result.rendered {
                if let Some(data) = controller.data() {
                    state.dates = data.dates.clone();
                }
                info!(dates = state.dates.len(), "initial render");
                state.apply_result(result);
                needs_redraw = true;
            }
        }
        while let Ok(msg) = status_rx.try_recv() {
            state.info = msg;
            needs_redraw = true;
        }

        if needs_redraw || last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
            needs_redraw = false;
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if !event::poll(Duration::from_millis(20)).unwrap_or(false) {
            continue;
        }
        let Ok(Event::Key(k)) = event::read() else {
            continue;
        };
        if k.kind != KeyEventKind::Press {
            continue;
        }
        needs_redraw = true;
        match (k.modifiers, k.code) {
            (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                break Ok(());
            }
            (_, KeyCode::Tab) => state.tab = (state.tab + 1) % TABS.len(),
            (_, KeyCode::BackTab) => state.tab = (state.tab + TABS.len() - 1) % TABS.len(),
            (_, KeyCode::Char('?')) => state.tab = 3,
            (_, KeyCode::Up) => state.focus = state.focus.prev(),
            (_, KeyCode::Down) => state.focus = state.focus.next(),
            (_, KeyCode::Left) => state.adjust(false),
            (_, KeyCode::Right) => state.adjust(true),
            (_, KeyCode::Backspace) => state.backspace(),
            (_, KeyCode::Enter) => submit(&mut controller, &mut state),
            (_, KeyCode::Char('s')) => export::save_and_show_path(&mut state),
            (_, KeyCode::Char('c')) => {
                if state.result.table.is_empty() {
                    state.info = "Summary table is empty; nothing to export.".into();
                } else {
                    export::export_table_csv(&mut state);
                }
            }
            (_, KeyCode::Char('y')) => match state.last_saved_path.clone() {
                Some(path) => match export::copy_to_clipboard(&path) {
                    Ok(_) => state.info = format!("✓ Copied to clipboard: {path}"),
                    Err(e) => state.info = format!("Clipboard copy failed: {e:#}"),
                },
                None => state.info = "No saved file path to copy. Save first (s/c)".into(),
            },
            (_, KeyCode::Char(c)) => state.push_char(c),
            _ => {}
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

/// Apply the filter form: the TUI counterpart of submitting the filter form.
fn submit<S: DataSource>(controller: &mut ViewController<S>, state: &mut UiState) {
    state.sync_thresholds();
    let result = controller.on_filter_submit(&state.form);
    if !result.rendered {
        state.info = "Dataset not loaded yet.".into();
        return;
    }
    let shown = result
        .charts
        .as_ref()
        .map_or(0, |c| c.keygen.visible().count());
    state.info = format!(
        "Filters applied: {shown} algorithm(s) shown{}",
        if result.torn_down { " (charts rebuilt)" } else { "" }
    );
    state.apply_result(result);
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(area);

    let tabs = Tabs::new(TABS.iter().map(|t| Line::from(*t)).collect::<Vec<_>>())
        .select(state.tab)
        .block(Block::default().borders(Borders::ALL).title("kem-mem-view"))
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        0 => charts::draw_charts_tab(chunks[1], f, state),
        1 => charts::draw_table_tab(chunks[1], f, state),
        2 => charts::draw_config_tab(chunks[1], f, state),
        _ => help::draw_help(chunks[1], f),
    }

    let status = Paragraph::new(state.info.as_str()).style(Style::default().fg(Color::Gray));
    f.render_widget(status, chunks[2]);
}
