//! Reduction of drained event slices into aggregate fields.
//!
//! Everything here is pure and total: any slice, including an empty one,
//! yields a value.

use crate::core::aggregate::{KeyDetails, UserInputAggregate};
use crate::core::buffer::DrainedWindow;
use crate::core::windowing::Window;
use crate::source::types::{KeyCategory, KeystrokeRecord, MoveRecord, ScrollRecord};

/// Build the aggregate record for a drained window.
pub fn reduce_window(
    window: Window,
    drained: &DrainedWindow,
    collect_key_details: bool,
) -> UserInputAggregate {
    UserInputAggregate {
        ts_start: window.start,
        ts_end: window.end,
        key_total: drained.keystrokes.len() as u64,
        click_total: drained.clicks.len() as u64,
        moved_distance: moved_distance(&drained.moves),
        scroll_delta: scroll_delta(&drained.scrolls),
        key_details: collect_key_details.then(|| tally_categories(&drained.keystrokes)),
    }
}

/// Path length through consecutive positions, in arrival order.
///
/// The slice is deliberately not sorted by timestamp.
pub fn moved_distance(moves: &[MoveRecord]) -> f64 {
    moves
        .windows(2)
        .map(|pair| pair[0].distance_to(&pair[1]))
        .sum()
}

/// Sum of `|amount * rotation|` over all scroll ticks.
pub fn scroll_delta(scrolls: &[ScrollRecord]) -> f64 {
    scrolls.iter().map(ScrollRecord::magnitude).sum()
}

/// Count keystrokes per category; unclassified keys count as `Other`.
pub fn tally_categories(keystrokes: &[KeystrokeRecord]) -> KeyDetails {
    let mut details = KeyDetails::default();
    for key in keystrokes {
        details.record(key.category.unwrap_or(KeyCategory::Other));
    }
    details
}
