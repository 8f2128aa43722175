//! Channel-fed input source.
//!
//! Producers (a capture backend, a replay reader, a test) push [`RawEvent`]s
//! through a [`SourceFeed`]. While the source is started, a background thread
//! drains the channel and hands each payload to the handler subscribed for its
//! kind. Events sent while stopped stay queued until the next `start`.

use crate::source::{
    Handler, InputSource, RawClick, RawEvent, RawKeystroke, RawMove, RawScroll, SourceError,
};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Default capacity of the feed channel.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// How long the dispatch thread waits before re-checking its running flag.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Default)]
struct Handlers {
    keystroke: Option<Handler<RawKeystroke>>,
    click: Option<Handler<RawClick>>,
    movement: Option<Handler<RawMove>>,
    scroll: Option<Handler<RawScroll>>,
}

impl Handlers {
    fn dispatch(&self, event: RawEvent) {
        match event {
            RawEvent::Keystroke(e) => {
                if let Some(ref h) = self.keystroke {
                    h(e)
                }
            }
            RawEvent::Click(e) => {
                if let Some(ref h) = self.click {
                    h(e)
                }
            }
            RawEvent::Move(e) => {
                if let Some(ref h) = self.movement {
                    h(e)
                }
            }
            RawEvent::Scroll(e) => {
                if let Some(ref h) = self.scroll {
                    h(e)
                }
            }
        }
    }
}

/// Producer half of a [`ChannelSource`].
#[derive(Clone)]
pub struct SourceFeed {
    sender: Sender<RawEvent>,
}

impl SourceFeed {
    /// Queue an event without blocking.
    ///
    /// Returns `false` if the channel is full or the source is gone; the
    /// event is dropped in that case.
    pub fn send(&self, event: RawEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!("input feed is full, dropping event");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// An [`InputSource`] driven by a crossbeam channel.
pub struct ChannelSource {
    sender: Sender<RawEvent>,
    receiver: Receiver<RawEvent>,
    handlers: Arc<RwLock<Handlers>>,
    running: Arc<AtomicBool>,
    unloaded: bool,
    thread_handle: Option<JoinHandle<()>>,
}

impl ChannelSource {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a source whose feed holds at most `capacity` undelivered events.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            handlers: Arc::new(RwLock::new(Handlers::default())),
            running: Arc::new(AtomicBool::new(false)),
            unloaded: false,
            thread_handle: None,
        }
    }

    /// Get a producer handle for this source.
    pub fn feed(&self) -> SourceFeed {
        SourceFeed {
            sender: self.sender.clone(),
        }
    }

    /// Check if the dispatch thread is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Number of events queued but not yet dispatched.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    fn with_handlers(&self, f: impl FnOnce(&mut Handlers)) {
        match self.handlers.write() {
            Ok(mut handlers) => f(&mut handlers),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}

impl Default for ChannelSource {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for ChannelSource {
    fn on_keystroke(&mut self, handler: Handler<RawKeystroke>) {
        self.with_handlers(|h| h.keystroke = Some(handler));
    }

    fn on_click(&mut self, handler: Handler<RawClick>) {
        self.with_handlers(|h| h.click = Some(handler));
    }

    fn on_move(&mut self, handler: Handler<RawMove>) {
        self.with_handlers(|h| h.movement = Some(handler));
    }

    fn on_scroll(&mut self, handler: Handler<RawScroll>) {
        self.with_handlers(|h| h.scroll = Some(handler));
    }

    fn start(&mut self) -> Result<(), SourceError> {
        if self.unloaded {
            return Err(SourceError::Unloaded);
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let receiver = self.receiver.clone();
        let handlers = self.handlers.clone();
        let running = self.running.clone();

        let handle = thread::Builder::new()
            .name("input-source".into())
            .spawn(move || dispatch_loop(receiver, handlers, running))
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                SourceError::StartFailed(e.to_string())
            })?;

        self.thread_handle = Some(handle);
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            // The thread exits at its next poll
            let _ = handle.join();
        }
    }

    fn unload(&mut self) {
        self.stop();
        self.unloaded = true;
        self.with_handlers(|h| *h = Handlers::default());
    }
}

impl Drop for ChannelSource {
    fn drop(&mut self) {
        self.stop();
    }
}

fn dispatch_loop(
    receiver: Receiver<RawEvent>,
    handlers: Arc<RwLock<Handlers>>,
    running: Arc<AtomicBool>,
) {
    while running.load(Ordering::SeqCst) {
        match receiver.recv_timeout(POLL_INTERVAL) {
            Ok(event) => match handlers.read() {
                Ok(h) => h.dispatch(event),
                Err(poisoned) => poisoned.into_inner().dispatch(event),
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}
