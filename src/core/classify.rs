//! Keystroke classification.
//!
//! Classifiers are supplied by the caller. Whatever they do, a failure only
//! ever costs one keystroke its category: [`classify_isolated`] turns errors
//! and panics into [`KeyCategory::Other`].

use crate::source::types::{KeyCategory, RawKeystroke};
use std::panic::{self, AssertUnwindSafe};

#[derive(Debug, thiserror::Error)]
#[error("failed to classify keystroke: {0}")]
pub struct ClassifyError(pub String);

/// Maps a raw keystroke to a category.
pub trait KeyClassifier: Send + Sync {
    fn classify(&self, key: &RawKeystroke) -> Result<KeyCategory, ClassifyError>;
}

impl<F> KeyClassifier for F
where
    F: Fn(&RawKeystroke) -> Result<KeyCategory, ClassifyError> + Send + Sync,
{
    fn classify(&self, key: &RawKeystroke) -> Result<KeyCategory, ClassifyError> {
        self(key)
    }
}

/// Printable-character heuristics.
///
/// Space, tab and line breaks map to their own categories; otherwise
/// alphabetic characters are letters and numeric ones numbers. Keys without
/// a character fall through to `Other`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultKeyClassifier;

impl KeyClassifier for DefaultKeyClassifier {
    fn classify(&self, key: &RawKeystroke) -> Result<KeyCategory, ClassifyError> {
        let category = match key.keychar {
            Some(' ') => KeyCategory::Space,
            Some('\t') => KeyCategory::Tab,
            Some('\r') | Some('\n') => KeyCategory::Enter,
            Some(c) if c.is_alphabetic() => KeyCategory::Letter,
            Some(c) if c.is_numeric() => KeyCategory::Number,
            _ => KeyCategory::Other,
        };
        Ok(category)
    }
}

/// Run a classifier, mapping any failure to `Other`.
///
/// The second element is `false` when the classifier failed.
pub fn classify_isolated(
    classifier: &dyn KeyClassifier,
    key: &RawKeystroke,
) -> (KeyCategory, bool) {
    match panic::catch_unwind(AssertUnwindSafe(|| classifier.classify(key))) {
        Ok(Ok(category)) => (category, true),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "key classifier failed");
            (KeyCategory::Other, false)
        }
        Err(_) => {
            tracing::warn!("key classifier panicked");
            (KeyCategory::Other, false)
        }
    }
}
