use anyhow::{Context, Result};
use std::sync::mpsc as std_mpsc;
use std::sync::OnceLock;
use std::time::Duration;

use super::state::UiState;

// Global clipboard manager channel - initialized once on first use
static CLIPBOARD_SENDER: OnceLock<std_mpsc::Sender<String>> = OnceLock::new();

/// Save the current snapshot under its fixed name in the download directory.
pub fn save_snapshot(state: &UiState) -> Result<std::path::PathBuf> {
    let snapshot = state
        .result
        .download
        .as_ref()
        .context("nothing to save: pick a specific date with visible algorithms")?;
    let dir = crate::storage::default_download_dir()?;
    crate::storage::save_snapshot(&dir, snapshot)
}

/// Save the snapshot and update state.info with the saved path message.
pub fn save_and_show_path(state: &mut UiState) {
    match save_snapshot(state) {
        Ok(path) => {
            state.last_saved_path = Some(path.to_string_lossy().to_string());
            state.info = format!("Saved: {} (press 'y' to copy path)", path.display());
        }
        Err(e) => {
            state.info = format!("Save failed: {e:#}");
        }
    }
}

/// Export the summary table as CSV into the current directory.
pub fn export_table_csv(state: &mut UiState) {
    let res = std::env::current_dir()
        .context("get current directory")
        .and_then(|dir| {
            let path = dir.join("mem_kem.csv");
            crate::storage::export_csv(&path, &state.result.table)?;
            Ok(path)
        });
    match res {
        Ok(p) => {
            state.last_saved_path = Some(p.to_string_lossy().to_string());
            state.info = format!("Exported CSV: {} (press 'y' to copy path)", p.display());
        }
        Err(e) => state.info = format!("CSV export failed: {e:#}"),
    }
}

/// Initialize the clipboard manager thread if not already initialized.
/// Each clipboard instance is kept alive for a while so clipboard managers
/// on Linux get a chance to read the contents.
fn init_clipboard_manager() -> Result<&'static std_mpsc::Sender<String>> {
    CLIPBOARD_SENDER.get_or_init(|| {
        let (tx, rx) = std_mpsc::channel::<String>();

        std::thread::spawn(move || {
            use arboard::Clipboard;

            for text in rx {
                if let Ok(mut clipboard) = Clipboard::new() {
                    if clipboard.set_text(&text).is_ok() {
                        std::thread::sleep(Duration::from_secs(2));
                    }
                }
            }
        });

        tx
    });

    CLIPBOARD_SENDER
        .get()
        .ok_or_else(|| anyhow::anyhow!("Failed to initialize clipboard manager"))
}

/// Copy text to clipboard without blocking the UI thread.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let sender = init_clipboard_manager()?;
    sender
        .send(text.to_string())
        .map_err(|_| anyhow::anyhow!("Clipboard manager channel closed"))?;
    Ok(())
}
