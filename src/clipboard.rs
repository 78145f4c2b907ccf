//! Clipboard capability.
//!
//! The conversion logic only sees the trait; the arboard-backed writer is
//! injected at wiring time so tests can substitute a recorder.

use anyhow::{Context, Result};
use tracing::debug;

pub trait ClipboardWriter: Send + Sync {
    fn write_text(&self, text: &str) -> Result<()>;
}

/// System clipboard backed by arboard.
pub struct SystemClipboard;

impl ClipboardWriter for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<()> {
        debug!("Copying {} bytes to clipboard", text.len());
        arboard::Clipboard::new()
            .context("Could not open system clipboard")?
            .set_text(text.to_string())
            .context("Could not write to system clipboard")?;
        Ok(())
    }
}
