//! Running statistics for a tracker.
//!
//! Counters are lock-free so the capture path can bump them without touching
//! the buffer locks.

use crate::source::types::EventKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug)]
pub struct TrackerStats {
    keystrokes: AtomicU64,
    clicks: AtomicU64,
    moves: AtomicU64,
    scrolls: AtomicU64,
    windows_emitted: AtomicU64,
    stale_events_dropped: AtomicU64,
    classifier_failures: AtomicU64,
    sink_failures: AtomicU64,
    rejected_after_terminate: AtomicU64,
    created_at: DateTime<Utc>,
}

impl TrackerStats {
    pub fn new() -> Self {
        Self {
            keystrokes: AtomicU64::new(0),
            clicks: AtomicU64::new(0),
            moves: AtomicU64::new(0),
            scrolls: AtomicU64::new(0),
            windows_emitted: AtomicU64::new(0),
            stale_events_dropped: AtomicU64::new(0),
            classifier_failures: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
            rejected_after_terminate: AtomicU64::new(0),
            created_at: Utc::now(),
        }
    }

    /// Record an event accepted into the buffer.
    pub fn record_ingested(&self, kind: EventKind) {
        let counter = match kind {
            EventKind::Keystroke => &self.keystrokes,
            EventKind::Click => &self.clicks,
            EventKind::Move => &self.moves,
            EventKind::Scroll => &self.scrolls,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_window_emitted(&self) {
        self.windows_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_dropped(&self, count: u64) {
        self.stale_events_dropped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_classifier_failure(&self) {
        self.classifier_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sink_failure(&self) {
        self.sink_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected_after_terminate.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            keystrokes: self.keystrokes.load(Ordering::Relaxed),
            clicks: self.clicks.load(Ordering::Relaxed),
            moves: self.moves.load(Ordering::Relaxed),
            scrolls: self.scrolls.load(Ordering::Relaxed),
            windows_emitted: self.windows_emitted.load(Ordering::Relaxed),
            stale_events_dropped: self.stale_events_dropped.load(Ordering::Relaxed),
            classifier_failures: self.classifier_failures.load(Ordering::Relaxed),
            sink_failures: self.sink_failures.load(Ordering::Relaxed),
            rejected_after_terminate: self.rejected_after_terminate.load(Ordering::Relaxed),
            created_at: self.created_at,
            uptime_secs: (Utc::now() - self.created_at).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.snapshot();
        format!(
            "Tracker Statistics:\n\
             - Keystrokes ingested: {}\n\
             - Clicks ingested: {}\n\
             - Moves ingested: {}\n\
             - Scrolls ingested: {}\n\
             - Windows emitted: {}\n\
             - Stale events dropped: {}\n\
             - Classifier failures: {}\n\
             - Sink failures: {}\n\
             - Uptime: {} seconds",
            stats.keystrokes,
            stats.clicks,
            stats.moves,
            stats.scrolls,
            stats.windows_emitted,
            stats.stale_events_dropped,
            stats.classifier_failures,
            stats.sink_failures,
            stats.uptime_secs
        )
    }
}

impl Default for TrackerStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`TrackerStats`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub keystrokes: u64,
    pub clicks: u64,
    pub moves: u64,
    pub scrolls: u64,
    pub windows_emitted: u64,
    pub stale_events_dropped: u64,
    pub classifier_failures: u64,
    pub sink_failures: u64,
    pub rejected_after_terminate: u64,
    pub created_at: DateTime<Utc>,
    pub uptime_secs: u64,
}

impl StatsSnapshot {
    pub fn total_ingested(&self) -> u64 {
        self.keystrokes + self.clicks + self.moves + self.scrolls
    }
}
