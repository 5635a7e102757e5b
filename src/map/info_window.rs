use std::cell::Cell;

use super::widget::{MapError, MapWidget, OverlayHandle};

/// Keeps at most one info window open across every marker category.
#[derive(Debug, Default)]
pub struct InfoWindowManager {
    current: Cell<Option<OverlayHandle>>,
}

impl InfoWindowManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Closes whatever is open, then opens `window` on `marker`.
    pub fn open(&self, widget: &dyn MapWidget, window: OverlayHandle, marker: OverlayHandle) -> Result<(), MapError> {
        if let Some(previous) = self.current.take() {
            widget.close_info_window(previous);
        }
        widget.open_info_window(window, marker)?;
        self.current.set(Some(window));
        Ok(())
    }

    pub fn close(&self, widget: &dyn MapWidget) {
        if let Some(window) = self.current.take() {
            widget.close_info_window(window);
        }
    }

    pub fn current(&self) -> Option<OverlayHandle> {
        self.current.get()
    }
}
