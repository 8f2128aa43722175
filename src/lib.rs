//! User Input Tracker - windowed aggregation of keyboard and pointer activity.
//!
//! The tracker buffers timestamped keystrokes, clicks, pointer moves and
//! scroll ticks as they arrive, and on a fixed cadence summarizes the most
//! recently closed window before discarding its events.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      User Input Tracker                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐         │
//! │  │ InputSource │──▶│   Buffer    │──▶│  Reduction  │──▶ Sink │
//! │  │ (injected)  │   │   Store     │   │ (per tick)  │         │
//! │  └─────────────┘   └─────────────┘   └─────────────┘         │
//! │                           ▲                 │                │
//! │                     ┌─────┴─────┐           ▼                │
//! │                     │   Timer   │──▶ window cursor           │
//! │                     └───────────┘                            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use user_input_tracker::{
//!     ChannelSource, RawEvent, RawKeystroke, Tracker, TrackerOptions, UserInputAggregate,
//!     UserInputTracker,
//! };
//!
//! let source = ChannelSource::new();
//! let feed = source.feed();
//!
//! let mut tracker = UserInputTracker::new(
//!     source,
//!     |aggregate: &UserInputAggregate| println!("{} keys", aggregate.key_total),
//!     Duration::from_secs(20),
//!     TrackerOptions::default(),
//! )
//! .expect("valid interval");
//!
//! tracker.start().expect("Failed to start tracker");
//! feed.send(RawEvent::Keystroke(RawKeystroke::with_char('a')));
//! ```

pub mod clock;
pub mod config;
pub mod core;
pub mod logging;
pub mod sink;
pub mod source;
pub mod stats;
pub mod tracker;

// Re-export key types at crate root for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, ConfigError};
pub use crate::core::{
    DefaultKeyClassifier, EventBufferStore, KeyClassifier, KeyDetails, UserInputAggregate, Window,
    WindowCursor,
};
pub use sink::{AggregateSink, ChannelSink, SinkError};
pub use source::{
    ChannelSource, EventKind, InputSource, KeyCategory, NoopSource, RawClick, RawEvent,
    RawKeystroke, RawMove, RawScroll, SourceError, SourceFeed,
};
pub use stats::{StatsSnapshot, TrackerStats};
pub use tracker::{Tracker, TrackerError, TrackerOptions, UserInputTracker};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
