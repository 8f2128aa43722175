//! A source that never emits events.
//!
//! This lets the tracker run on hosts without any capture backend; windows
//! are still produced on schedule, just always empty.

use crate::source::{Handler, InputSource, RawClick, RawKeystroke, RawMove, RawScroll, SourceError};

#[derive(Debug, Default)]
pub struct NoopSource {
    running: bool,
    unloaded: bool,
    subscriptions: usize,
}

impl NoopSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the source is currently "delivering".
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of handlers registered since construction.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions
    }
}

impl InputSource for NoopSource {
    fn on_keystroke(&mut self, _handler: Handler<RawKeystroke>) {
        self.subscriptions += 1;
    }

    fn on_click(&mut self, _handler: Handler<RawClick>) {
        self.subscriptions += 1;
    }

    fn on_move(&mut self, _handler: Handler<RawMove>) {
        self.subscriptions += 1;
    }

    fn on_scroll(&mut self, _handler: Handler<RawScroll>) {
        self.subscriptions += 1;
    }

    fn start(&mut self) -> Result<(), SourceError> {
        if self.unloaded {
            return Err(SourceError::Unloaded);
        }
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn unload(&mut self) {
        self.running = false;
        self.unloaded = true;
    }
}
