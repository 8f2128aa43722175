//! The per-window aggregate record handed to the sink.

use crate::core::windowing::Window;
use crate::source::types::KeyCategory;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Keystroke counts per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyDetails {
    pub keys_letter: u64,
    pub keys_number: u64,
    pub keys_navigate: u64,
    pub keys_delete: u64,
    pub keys_modifier: u64,
    pub keys_space: u64,
    pub keys_tab: u64,
    #[serde(rename = "keyEnter")]
    pub keys_enter: u64,
    pub keys_other: u64,
}

impl KeyDetails {
    pub fn record(&mut self, category: KeyCategory) {
        let slot = match category {
            KeyCategory::Letter => &mut self.keys_letter,
            KeyCategory::Number => &mut self.keys_number,
            KeyCategory::Navigate => &mut self.keys_navigate,
            KeyCategory::Delete => &mut self.keys_delete,
            KeyCategory::Modifier => &mut self.keys_modifier,
            KeyCategory::Space => &mut self.keys_space,
            KeyCategory::Tab => &mut self.keys_tab,
            KeyCategory::Enter => &mut self.keys_enter,
            KeyCategory::Other => &mut self.keys_other,
        };
        *slot += 1;
    }

    pub fn get(&self, category: KeyCategory) -> u64 {
        match category {
            KeyCategory::Letter => self.keys_letter,
            KeyCategory::Number => self.keys_number,
            KeyCategory::Navigate => self.keys_navigate,
            KeyCategory::Delete => self.keys_delete,
            KeyCategory::Modifier => self.keys_modifier,
            KeyCategory::Space => self.keys_space,
            KeyCategory::Tab => self.keys_tab,
            KeyCategory::Enter => self.keys_enter,
            KeyCategory::Other => self.keys_other,
        }
    }

    /// Sum over all categories.
    pub fn total(&self) -> u64 {
        self.keys_letter
            + self.keys_number
            + self.keys_navigate
            + self.keys_delete
            + self.keys_modifier
            + self.keys_space
            + self.keys_tab
            + self.keys_enter
            + self.keys_other
    }
}

/// Summary of all input streams over one window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInputAggregate {
    /// Inclusive window start
    pub ts_start: DateTime<Utc>,
    /// Exclusive window end
    pub ts_end: DateTime<Utc>,
    pub key_total: u64,
    pub click_total: u64,
    /// Cumulative pointer travel, in source coordinate units
    pub moved_distance: f64,
    /// Summed `|amount * rotation|` over scroll ticks
    pub scroll_delta: f64,
    /// Present only when detail collection is enabled
    #[serde(flatten)]
    pub key_details: Option<KeyDetails>,
}

impl UserInputAggregate {
    /// An aggregate with every counter at zero.
    pub fn empty(window: Window) -> Self {
        Self {
            ts_start: window.start,
            ts_end: window.end,
            key_total: 0,
            click_total: 0,
            moved_distance: 0.0,
            scroll_delta: 0.0,
            key_details: None,
        }
    }

    pub fn window(&self) -> Window {
        Window {
            start: self.ts_start,
            end: self.ts_end,
        }
    }

    /// Check if no activity was recorded.
    pub fn is_idle(&self) -> bool {
        self.key_total == 0
            && self.click_total == 0
            && self.moved_distance == 0.0
            && self.scroll_delta == 0.0
    }
}
