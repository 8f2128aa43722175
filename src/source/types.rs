//! Event types for the user input tracker.
//!
//! Raw payloads arrive from an [`InputSource`](crate::source::InputSource)
//! without timestamps. The tracker stamps each one at the moment its handler
//! runs, producing an immutable record that the buffer store holds until its
//! window closes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The four input streams the tracker buffers independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Keystroke,
    Click,
    Move,
    Scroll,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::Keystroke,
        EventKind::Click,
        EventKind::Move,
        EventKind::Scroll,
    ];
}

/// Semantic category of a keystroke, assigned when detail collection is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyCategory {
    Letter,
    Number,
    Navigate,
    Delete,
    Modifier,
    Space,
    Tab,
    Enter,
    Other,
}

/// A key release as reported by the input source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawKeystroke {
    /// Platform key code
    #[serde(default)]
    pub keycode: u32,
    /// Printable character produced by the key, if any
    #[serde(default)]
    pub keychar: Option<char>,
}

impl RawKeystroke {
    pub fn with_char(c: char) -> Self {
        Self {
            keycode: 0,
            keychar: Some(c),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawClick {
    /// Consecutive click count reported by the source (not aggregated)
    #[serde(default)]
    pub clicks: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMove {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawScroll {
    pub amount: f64,
    pub rotation: f64,
}

/// A raw payload tagged with the source's event name.
///
/// The JSON form is `{"type": "mousemove", "x": 10.0, "y": 20.0}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RawEvent {
    #[serde(rename = "keyup")]
    Keystroke(RawKeystroke),
    #[serde(rename = "mouseclick")]
    Click(RawClick),
    #[serde(rename = "mousemove")]
    Move(RawMove),
    #[serde(rename = "mousewheel")]
    Scroll(RawScroll),
}

impl RawEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            RawEvent::Keystroke(_) => EventKind::Keystroke,
            RawEvent::Click(_) => EventKind::Click,
            RawEvent::Move(_) => EventKind::Move,
            RawEvent::Scroll(_) => EventKind::Scroll,
        }
    }
}

/// Anything carrying a capture timestamp.
pub trait Timestamped {
    fn timestamp(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeystrokeRecord {
    pub timestamp: DateTime<Utc>,
    /// Only set when detail collection is enabled
    pub category: Option<KeyCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickRecord {
    pub timestamp: DateTime<Utc>,
    pub clicks: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub timestamp: DateTime<Utc>,
    pub x: f64,
    pub y: f64,
}

impl MoveRecord {
    /// Euclidean distance to another position.
    pub fn distance_to(&self, other: &MoveRecord) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollRecord {
    pub timestamp: DateTime<Utc>,
    pub amount: f64,
    pub rotation: f64,
}

impl ScrollRecord {
    /// Contribution of this tick to the window's scroll delta.
    pub fn magnitude(&self) -> f64 {
        (self.amount * self.rotation).abs()
    }
}

macro_rules! impl_timestamped {
    ($($ty:ty),*) => {
        $(impl Timestamped for $ty {
            fn timestamp(&self) -> DateTime<Utc> {
                self.timestamp
            }
        })*
    };
}

impl_timestamped!(KeystrokeRecord, ClickRecord, MoveRecord, ScrollRecord);

/// A timestamped record of any stream kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventRecord {
    Keystroke(KeystrokeRecord),
    Click(ClickRecord),
    Move(MoveRecord),
    Scroll(ScrollRecord),
}

impl EventRecord {
    pub fn kind(&self) -> EventKind {
        match self {
            EventRecord::Keystroke(_) => EventKind::Keystroke,
            EventRecord::Click(_) => EventKind::Click,
            EventRecord::Move(_) => EventKind::Move,
            EventRecord::Scroll(_) => EventKind::Scroll,
        }
    }
}

impl Timestamped for EventRecord {
    fn timestamp(&self) -> DateTime<Utc> {
        match self {
            EventRecord::Keystroke(e) => e.timestamp,
            EventRecord::Click(e) => e.timestamp,
            EventRecord::Move(e) => e.timestamp,
            EventRecord::Scroll(e) => e.timestamp,
        }
    }
}
