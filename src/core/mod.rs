//! Core functionality for the user input tracker.
//!
//! This module contains:
//! - The event buffer store holding records until their window closes
//! - Window boundary computation
//! - Reduction of drained windows into aggregate records
//! - Keystroke classification

pub mod aggregate;
pub mod buffer;
pub mod classify;
pub mod reduce;
pub mod windowing;

// Re-export commonly used types
pub use aggregate::{KeyDetails, UserInputAggregate};
pub use buffer::{Drained, DrainedWindow, EventBufferStore, StreamBuffer};
pub use classify::{classify_isolated, ClassifyError, DefaultKeyClassifier, KeyClassifier};
pub use reduce::{moved_distance, reduce_window, scroll_delta, tally_categories};
pub use windowing::{Window, WindowCursor};
