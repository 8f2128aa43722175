//! The windowed user input tracker.
//!
//! A tracker subscribes to an [`InputSource`], stamps and buffers every event
//! it receives, and on a fixed interval drains the most recently closed window,
//! reduces it to a [`UserInputAggregate`] and hands that to the sink.
//!
//! Ticks run on a single dedicated timer thread, so two ticks never overlap
//! and the window cursor advances exactly once per tick. Calling
//! [`UserInputTracker::aggregate`] by hand takes the same lock as a tick.

use crate::clock::{Clock, SystemClock};
use crate::core::buffer::EventBufferStore;
use crate::core::classify::{classify_isolated, DefaultKeyClassifier, KeyClassifier};
use crate::core::reduce::reduce_window;
use crate::core::windowing::WindowCursor;
use crate::core::UserInputAggregate;
use crate::sink::AggregateSink;
use crate::source::types::{
    ClickRecord, EventKind, EventRecord, KeystrokeRecord, MoveRecord, RawClick, RawKeystroke,
    RawMove, RawScroll, ScrollRecord,
};
use crate::source::{InputSource, SourceError};
use crate::stats::TrackerStats;
use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, select, Sender};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Name label used when none is configured.
pub const DEFAULT_NAME: &str = "UserInputTracker";

/// Default aggregating interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(20_000);

/// Lifecycle shared by all trackers.
pub trait Tracker {
    fn name(&self) -> &str;
    fn is_running(&self) -> bool;

    /// Begin periodic aggregation. A no-op if already running.
    fn start(&mut self) -> Result<(), TrackerError>;

    /// Cancel the timer. Buffered events and the window cursor are kept.
    fn stop(&mut self);

    /// Stop and release the input source for good.
    fn terminate(&mut self);
}

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("aggregating interval must be a positive duration, got {0:?}")]
    InvalidInterval(Duration),
    #[error("tracker has been terminated")]
    Terminated,
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("failed to spawn timer thread: {0}")]
    Timer(#[from] std::io::Error),
}

/// Construction options for a [`UserInputTracker`].
#[derive(Clone)]
pub struct TrackerOptions {
    pub name: String,
    /// Tally keystrokes per category in every aggregate
    pub collect_key_details: bool,
    pub classifier: Arc<dyn KeyClassifier>,
    pub clock: Arc<dyn Clock>,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            collect_key_details: false,
            classifier: Arc::new(DefaultKeyClassifier),
            clock: Arc::new(SystemClock),
        }
    }
}

impl TrackerOptions {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn collect_key_details(mut self, enabled: bool) -> Self {
        self.collect_key_details = enabled;
        self
    }

    pub fn with_classifier(mut self, classifier: impl KeyClassifier + 'static) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }
}

struct TickState {
    cursor: WindowCursor,
    sink: Box<dyn AggregateSink>,
}

/// State shared between the tracker, its source handlers and its timer.
struct Engine {
    name: String,
    buffers: EventBufferStore,
    tick_state: Mutex<TickState>,
    clock: Arc<dyn Clock>,
    classifier: Arc<dyn KeyClassifier>,
    collect_key_details: bool,
    accepting: AtomicBool,
    stats: TrackerStats,
}

impl Engine {
    fn accept(&self) -> bool {
        if self.accepting.load(Ordering::SeqCst) {
            true
        } else {
            self.stats.record_rejected();
            false
        }
    }

    fn ingest(&self, record: EventRecord) {
        let kind = record.kind();
        self.buffers.push(record);
        self.stats.record_ingested(kind);
    }

    fn ingest_keystroke(&self, raw: RawKeystroke) {
        if !self.accept() {
            return;
        }
        let timestamp = self.clock.now();
        let category = if self.collect_key_details {
            let (category, ok) = classify_isolated(self.classifier.as_ref(), &raw);
            if !ok {
                self.stats.record_classifier_failure();
            }
            Some(category)
        } else {
            None
        };
        self.ingest(EventRecord::Keystroke(KeystrokeRecord {
            timestamp,
            category,
        }));
    }

    fn ingest_click(&self, raw: RawClick) {
        if !self.accept() {
            return;
        }
        self.ingest(EventRecord::Click(ClickRecord {
            timestamp: self.clock.now(),
            clicks: raw.clicks,
        }));
    }

    fn ingest_move(&self, raw: RawMove) {
        if !self.accept() {
            return;
        }
        self.ingest(EventRecord::Move(MoveRecord {
            timestamp: self.clock.now(),
            x: raw.x,
            y: raw.y,
        }));
    }

    fn ingest_scroll(&self, raw: RawScroll) {
        if !self.accept() {
            return;
        }
        self.ingest(EventRecord::Scroll(ScrollRecord {
            timestamp: self.clock.now(),
            amount: raw.amount,
            rotation: raw.rotation,
        }));
    }

    fn lock_state(&self) -> MutexGuard<'_, TickState> {
        self.tick_state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn compute(&self, cursor: &mut WindowCursor) -> UserInputAggregate {
        let window = cursor.advance(self.clock.now());
        let drained = self.buffers.drain_window(window.start, window.end);
        if drained.stale > 0 {
            debug!(
                tracker = %self.name,
                stale = drained.stale,
                "dropped events older than window start"
            );
            self.stats.record_stale_dropped(drained.stale as u64);
        }
        reduce_window(window, &drained, self.collect_key_details)
    }

    fn aggregate(&self) -> UserInputAggregate {
        let mut state = self.lock_state();
        self.compute(&mut state.cursor)
    }

    /// One timer tick: compute, then deliver.
    ///
    /// The cursor and buffers are already updated when the sink runs, so a
    /// failing sink only loses its own record.
    fn tick(&self) {
        let mut state = self.lock_state();
        let TickState { cursor, sink } = &mut *state;

        let aggregate = self.compute(cursor);
        self.stats.record_window_emitted();

        match panic::catch_unwind(AssertUnwindSafe(|| sink.on_aggregate(&aggregate))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(tracker = %self.name, error = %e, "sink rejected aggregate");
                self.stats.record_sink_failure();
            }
            Err(_) => {
                warn!(tracker = %self.name, "sink panicked");
                self.stats.record_sink_failure();
            }
        }

        debug!(
            tracker = %self.name,
            start = %aggregate.ts_start,
            end = %aggregate.ts_end,
            keystrokes = self.buffers.len(EventKind::Keystroke),
            clicks = self.buffers.len(EventKind::Click),
            moves = self.buffers.len(EventKind::Move),
            scrolls = self.buffers.len(EventKind::Scroll),
            "tick complete, events still buffered"
        );
    }
}

/// Handle to the timer thread.
struct Timer {
    running: Arc<AtomicBool>,
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

impl Timer {
    fn spawn(engine: Arc<Engine>, interval: Duration) -> std::io::Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let (stop_tx, stop_rx) = bounded::<()>(1);

        // Capacity-1 channel: ticks missed while busy coalesce
        let ticker = crossbeam_channel::tick(interval);
        let flag = running.clone();
        let handle = thread::Builder::new()
            .name(format!("{}-timer", engine.name))
            .spawn(move || {
                loop {
                    select! {
                        recv(stop_rx) -> _ => break,
                        recv(ticker) -> _ => {
                            if !flag.load(Ordering::SeqCst) {
                                break;
                            }
                            engine.tick();
                        }
                    }
                }
            })?;

        Ok(Self {
            running,
            stop_tx,
            handle,
        })
    }

    /// Signal the thread and wait for an in-flight tick to finish.
    fn cancel(self) {
        self.running.store(false, Ordering::SeqCst);
        let _ = self.stop_tx.try_send(());
        // Joining from inside a tick (a sink stopping its own tracker) would deadlock
        if self.handle.thread().id() != thread::current().id() {
            let _ = self.handle.join();
        }
    }
}

/// Periodic aggregator over keystroke, click, move and scroll streams.
pub struct UserInputTracker {
    engine: Arc<Engine>,
    source: Box<dyn InputSource>,
    interval: Duration,
    timer: Option<Timer>,
    subscribed: bool,
    terminated: bool,
}

impl UserInputTracker {
    /// Create an idle tracker.
    ///
    /// `interval` must be strictly positive.
    pub fn new(
        source: impl InputSource + 'static,
        sink: impl AggregateSink + 'static,
        interval: Duration,
        options: TrackerOptions,
    ) -> Result<Self, TrackerError> {
        if interval.is_zero() {
            return Err(TrackerError::InvalidInterval(interval));
        }
        let window_interval = chrono::Duration::from_std(interval)
            .map_err(|_| TrackerError::InvalidInterval(interval))?;
        let now = options.clock.now();
        if now.checked_sub_signed(window_interval).is_none()
            || now.checked_add_signed(window_interval).is_none()
        {
            return Err(TrackerError::InvalidInterval(interval));
        }

        let engine = Engine {
            name: options.name,
            buffers: EventBufferStore::new(),
            tick_state: Mutex::new(TickState {
                cursor: WindowCursor::new(window_interval),
                sink: Box::new(sink),
            }),
            clock: options.clock,
            classifier: options.classifier,
            collect_key_details: options.collect_key_details,
            accepting: AtomicBool::new(true),
            stats: TrackerStats::new(),
        };

        Ok(Self {
            engine: Arc::new(engine),
            source: Box::new(source),
            interval,
            timer: None,
            subscribed: false,
            terminated: false,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn collects_key_details(&self) -> bool {
        self.engine.collect_key_details
    }

    pub fn stats(&self) -> &TrackerStats {
        &self.engine.stats
    }

    /// Number of events of `kind` waiting for their window to close.
    pub fn buffered(&self, kind: EventKind) -> usize {
        self.engine.buffers.len(kind)
    }

    /// End of the last computed window, if any.
    pub fn previous_end(&self) -> Option<DateTime<Utc>> {
        self.engine.lock_state().cursor.previous_end()
    }

    /// Compute the next window's aggregate without delivering it.
    ///
    /// This advances the cursor and evicts the window's events exactly as a
    /// timer tick would, so the window will not be reported again.
    pub fn aggregate(&self) -> UserInputAggregate {
        self.engine.aggregate()
    }

    /// Run one tick on the calling thread: compute and deliver to the sink.
    pub fn tick(&self) {
        self.engine.tick();
    }

    fn subscribe(&mut self) {
        let engine = self.engine.clone();
        self.source
            .on_keystroke(Box::new(move |e| engine.ingest_keystroke(e)));
        let engine = self.engine.clone();
        self.source.on_click(Box::new(move |e| engine.ingest_click(e)));
        let engine = self.engine.clone();
        self.source.on_move(Box::new(move |e| engine.ingest_move(e)));
        let engine = self.engine.clone();
        self.source
            .on_scroll(Box::new(move |e| engine.ingest_scroll(e)));
        self.subscribed = true;
    }
}

impl Tracker for UserInputTracker {
    fn name(&self) -> &str {
        &self.engine.name
    }

    fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    fn start(&mut self) -> Result<(), TrackerError> {
        if self.terminated {
            return Err(TrackerError::Terminated);
        }
        if self.is_running() {
            info!("{} is already running!", self.engine.name);
            return Ok(());
        }

        info!(
            interval_ms = self.interval.as_millis() as u64,
            "starting {}",
            self.engine.name
        );

        if !self.subscribed {
            self.subscribe();
        }
        // The first window must cover everything the source delivers from here on
        self.engine.lock_state().cursor.anchor(self.engine.clock.now());
        self.source.start()?;

        match Timer::spawn(self.engine.clone(), self.interval) {
            Ok(timer) => {
                self.timer = Some(timer);
                Ok(())
            }
            Err(e) => {
                self.source.stop();
                Err(TrackerError::Timer(e))
            }
        }
    }

    fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
            info!("stopped {}", self.engine.name);
        }
        self.source.stop();
    }

    fn terminate(&mut self) {
        self.stop();
        if !self.terminated {
            self.engine.accepting.store(false, Ordering::SeqCst);
            self.source.unload();
            self.terminated = true;
            info!("terminated {}", self.engine.name);
        }
    }
}

impl Drop for UserInputTracker {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }
}
