use anyhow::{Context, Result};
use arboard::Clipboard;
use tracing::{debug, info};

/// Destination for the copy action.
pub trait ClipboardSink {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// System clipboard via arboard. Opened on first use so a session without a
/// display can still generate captions.
#[derive(Default)]
pub struct SystemClipboard {
    clipboard: Option<Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        if self.clipboard.is_none() {
            self.clipboard = Some(Clipboard::new().context("Failed to initialize clipboard")?);
        }

        self.clipboard
            .as_mut()
            .context("Clipboard unavailable")?
            .set_text(text)
            .context("Failed to copy caption to clipboard")?;
        debug!("Caption copied to clipboard ({} characters)", text.chars().count());
        Ok(())
    }
}

/// Used when `clipboard_enabled` is off: the caption goes to the log instead.
pub struct LogClipboard;

impl ClipboardSink for LogClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        info!("📋 Clipboard disabled, caption follows:\n{}", text);
        Ok(())
    }
}

pub fn from_config(enabled: bool) -> Box<dyn ClipboardSink> {
    if enabled {
        Box::new(SystemClipboard::new())
    } else {
        Box::new(LogClipboard)
    }
}
