//! Window boundary computation.
//!
//! The first window ends at the moment of the first tick. Every later window
//! starts where the previous one ended and spans exactly one interval, so
//! boundaries advance in fixed steps and never resynchronize to wall-clock
//! time, even if a tick fires late.
//!
//! A cursor can be anchored at the instant capture began. The first window
//! then never starts after that anchor, so a first tick that fires late still
//! covers everything captured since.
//!
//! Boundary arithmetic saturates at the representable range instead of
//! panicking.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A half-open time interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn new(start: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            start,
            end: saturating_add(start, duration),
        }
    }

    /// Check if a timestamp falls within this window.
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start && timestamp < self.end
    }
}

/// Carries the end of the last computed window forward to the next tick.
#[derive(Debug, Clone)]
pub struct WindowCursor {
    interval: Duration,
    anchor: Option<DateTime<Utc>>,
    previous_end: Option<DateTime<Utc>>,
}

impl WindowCursor {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            anchor: None,
            previous_end: None,
        }
    }

    /// Pin the earliest start of the first window.
    ///
    /// Only the first anchor before the first window counts.
    pub fn anchor(&mut self, at: DateTime<Utc>) {
        if self.previous_end.is_none() && self.anchor.is_none() {
            self.anchor = Some(at);
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn previous_end(&self) -> Option<DateTime<Utc>> {
        self.previous_end
    }

    /// The window the next call to [`advance`](Self::advance) would return.
    pub fn peek(&self, now: DateTime<Utc>) -> Window {
        match self.previous_end {
            None => {
                let start = saturating_sub(now, self.interval);
                Window {
                    start: self.anchor.map_or(start, |anchor| anchor.min(start)),
                    end: now,
                }
            }
            Some(previous_end) => Window::new(previous_end, self.interval),
        }
    }

    /// Compute the next window and move the cursor to its end.
    ///
    /// `now` is only consulted for the very first window.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Window {
        let window = self.peek(now);
        self.previous_end = Some(window.end);
        window
    }
}

fn saturating_add(at: DateTime<Utc>, delta: Duration) -> DateTime<Utc> {
    at.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn saturating_sub(at: DateTime<Utc>, delta: Duration) -> DateTime<Utc> {
    at.checked_sub_signed(delta).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_contains() {
        let start = Utc::now();
        let window = Window::new(start, Duration::seconds(10));

        assert!(window.contains(start));
        assert!(window.contains(start + Duration::seconds(5)));
        assert!(!window.contains(start + Duration::seconds(10)));
        assert!(!window.contains(start - Duration::seconds(1)));
    }

    #[test]
    fn test_first_window_ends_now() {
        let now = Utc::now();
        let mut cursor = WindowCursor::new(Duration::milliseconds(1000));
        assert!(cursor.previous_end().is_none());

        let window = cursor.advance(now);
        assert_eq!(window.end, now);
        assert_eq!(window.start, now - Duration::milliseconds(1000));
        assert_eq!(cursor.previous_end(), Some(now));
    }

    #[test]
    fn test_windows_are_contiguous() {
        let now = Utc::now();
        let mut cursor = WindowCursor::new(Duration::milliseconds(250));

        let mut previous = cursor.advance(now);
        for _ in 0..10 {
            let next = cursor.advance(now);
            assert_eq!(next.start, previous.end);
            assert_eq!(next.end - next.start, Duration::milliseconds(250));
            previous = next;
        }
    }

    #[test]
    fn test_late_tick_does_not_resync() {
        let t0 = Utc::now();
        let mut cursor = WindowCursor::new(Duration::seconds(1));
        cursor.advance(t0);

        // Tick arrives five intervals late
        let window = cursor.advance(t0 + Duration::seconds(6));
        assert_eq!(window.start, t0);
        assert_eq!(window.end, t0 + Duration::seconds(1));
    }

    #[test]
    fn test_anchor_extends_late_first_window() {
        let t0 = Utc::now();
        let mut cursor = WindowCursor::new(Duration::milliseconds(100));
        cursor.anchor(t0);
        cursor.anchor(t0 + Duration::milliseconds(50));
        assert!(cursor.previous_end().is_none());

        // First tick fires 40ms late
        let first = cursor.advance(t0 + Duration::milliseconds(140));
        assert_eq!(first.start, t0);
        assert_eq!(first.end, t0 + Duration::milliseconds(140));

        let second = cursor.advance(t0 + Duration::milliseconds(240));
        assert_eq!(second.start, first.end);
        assert_eq!(second.end, t0 + Duration::milliseconds(240));
    }

    #[test]
    fn test_anchor_after_first_window_is_ignored() {
        let t0 = Utc::now();
        let mut cursor = WindowCursor::new(Duration::seconds(1));
        cursor.advance(t0);
        cursor.anchor(t0 - Duration::seconds(30));

        let window = cursor.advance(t0 + Duration::seconds(1));
        assert_eq!(window.start, t0);
    }

    #[test]
    fn test_early_first_tick_keeps_full_interval() {
        let t0 = Utc::now();
        let mut cursor = WindowCursor::new(Duration::seconds(1));
        cursor.anchor(t0);

        let window = cursor.advance(t0 + Duration::milliseconds(300));
        assert_eq!(window.start, t0 - Duration::milliseconds(700));
        assert_eq!(window.end, t0 + Duration::milliseconds(300));
    }

    #[test]
    fn test_boundaries_saturate_instead_of_overflowing() {
        let mut cursor = WindowCursor::new(Duration::days(365 * 1_000_000));
        let now = Utc::now();

        let first = cursor.advance(now);
        assert_eq!(first.start, DateTime::<Utc>::MIN_UTC);
        assert_eq!(first.end, now);

        let second = cursor.advance(now);
        assert_eq!(second.start, now);
        assert_eq!(second.end, DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_peek_does_not_move_cursor() {
        let now = Utc::now();
        let cursor = WindowCursor::new(Duration::seconds(1));
        let peeked = cursor.peek(now);
        assert_eq!(peeked.end, now);
        assert!(cursor.previous_end().is_none());
    }
}
