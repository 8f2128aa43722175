//! Upstream input sources for the user input tracker.
//!
//! Capturing OS-level input is left to the host. A source only has to let the
//! tracker subscribe one handler per stream and switch delivery on and off.

pub mod channel;
pub mod noop;
pub mod types;

pub use channel::{ChannelSource, SourceFeed};
pub use noop::NoopSource;
pub use types::{
    ClickRecord, EventKind, EventRecord, KeyCategory, KeystrokeRecord, MoveRecord, RawClick,
    RawEvent, RawKeystroke, RawMove, RawScroll, ScrollRecord, Timestamped,
};

/// Callback a source invokes with each raw payload of one kind.
pub type Handler<T> = Box<dyn Fn(T) + Send + Sync + 'static>;

/// Errors reported by an input source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("input source has been unloaded")]
    Unloaded,
    #[error("failed to start input source: {0}")]
    StartFailed(String),
}

/// A feed of raw input events.
///
/// Handlers may be invoked from any thread. `unload` releases every handler
/// for good; a source is not expected to deliver anything afterwards.
pub trait InputSource: Send {
    fn on_keystroke(&mut self, handler: Handler<RawKeystroke>);
    fn on_click(&mut self, handler: Handler<RawClick>);
    fn on_move(&mut self, handler: Handler<RawMove>);
    fn on_scroll(&mut self, handler: Handler<RawScroll>);

    /// Begin delivering events to subscribed handlers.
    fn start(&mut self) -> Result<(), SourceError>;

    /// Pause delivery. Handlers stay registered.
    fn stop(&mut self);

    /// Stop and drop every handler.
    fn unload(&mut self);
}
