//! Event buffer store.
//!
//! One append-only buffer per stream kind, each behind its own mutex so a
//! producer pushing keystrokes never contends with one pushing mouse moves.
//! A drain takes the lock once: every push lands either fully before or fully
//! after it.

use crate::source::types::{
    ClickRecord, EventKind, EventRecord, KeystrokeRecord, MoveRecord, ScrollRecord, Timestamped,
};
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};

/// Result of draining one stream for a window.
#[derive(Debug, Clone, PartialEq)]
pub struct Drained<T> {
    /// Records with `start <= timestamp < end`, in arrival order
    pub events: Vec<T>,
    /// Records with `timestamp < start`, evicted without being returned
    pub stale: usize,
}

impl<T> Default for Drained<T> {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            stale: 0,
        }
    }
}

/// A single stream's pending records.
#[derive(Debug)]
pub struct StreamBuffer<T> {
    events: Mutex<Vec<T>>,
}

impl<T: Timestamped> StreamBuffer<T> {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Append a record. Timestamps need not be ordered.
    pub fn push(&self, record: T) {
        self.lock().push(record);
    }

    /// Remove every record older than `end`; return those at or after `start`.
    pub fn drain(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Drained<T> {
        let mut events = self.lock();
        let pending = std::mem::take(&mut *events);

        let mut drained = Drained::default();
        for record in pending {
            let ts = record.timestamp();
            if ts >= end {
                events.push(record);
            } else if ts >= start {
                drained.events.push(record);
            } else {
                drained.stale += 1;
            }
        }
        drained
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Vec<T>> {
        // A panic while holding the lock cannot leave a Vec half-pushed
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T: Timestamped> Default for StreamBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Every stream drained for one window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrainedWindow {
    pub keystrokes: Vec<KeystrokeRecord>,
    pub clicks: Vec<ClickRecord>,
    pub moves: Vec<MoveRecord>,
    pub scrolls: Vec<ScrollRecord>,
    /// Stale records evicted across all streams
    pub stale: usize,
}

/// Buffers for all four streams.
#[derive(Debug, Default)]
pub struct EventBufferStore {
    keystrokes: StreamBuffer<KeystrokeRecord>,
    clicks: StreamBuffer<ClickRecord>,
    moves: StreamBuffer<MoveRecord>,
    scrolls: StreamBuffer<ScrollRecord>,
}

impl EventBufferStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to the buffer for its kind.
    pub fn push(&self, record: EventRecord) {
        match record {
            EventRecord::Keystroke(e) => self.keystrokes.push(e),
            EventRecord::Click(e) => self.clicks.push(e),
            EventRecord::Move(e) => self.moves.push(e),
            EventRecord::Scroll(e) => self.scrolls.push(e),
        }
    }

    /// Drain one stream, returning its in-window records as [`EventRecord`]s.
    pub fn drain(
        &self,
        kind: EventKind,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<EventRecord> {
        match kind {
            EventKind::Keystroke => wrap(self.keystrokes.drain(start, end), EventRecord::Keystroke),
            EventKind::Click => wrap(self.clicks.drain(start, end), EventRecord::Click),
            EventKind::Move => wrap(self.moves.drain(start, end), EventRecord::Move),
            EventKind::Scroll => wrap(self.scrolls.drain(start, end), EventRecord::Scroll),
        }
    }

    /// Drain all four streams for `[start, end)`.
    pub fn drain_window(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> DrainedWindow {
        let keystrokes = self.keystrokes.drain(start, end);
        let clicks = self.clicks.drain(start, end);
        let moves = self.moves.drain(start, end);
        let scrolls = self.scrolls.drain(start, end);

        DrainedWindow {
            stale: keystrokes.stale + clicks.stale + moves.stale + scrolls.stale,
            keystrokes: keystrokes.events,
            clicks: clicks.events,
            moves: moves.events,
            scrolls: scrolls.events,
        }
    }

    /// Number of records currently buffered for `kind`.
    pub fn len(&self, kind: EventKind) -> usize {
        match kind {
            EventKind::Keystroke => self.keystrokes.len(),
            EventKind::Click => self.clicks.len(),
            EventKind::Move => self.moves.len(),
            EventKind::Scroll => self.scrolls.len(),
        }
    }

    pub fn total_len(&self) -> usize {
        EventKind::ALL.iter().map(|&kind| self.len(kind)).sum()
    }
}

fn wrap<T>(drained: Drained<T>, f: fn(T) -> EventRecord) -> Vec<EventRecord> {
    drained.events.into_iter().map(f).collect()
}
