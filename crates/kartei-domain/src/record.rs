//! Card records - the outcome of extracting one index card

use crate::state::CardState;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Identity of a card: the batch it belongs to and its image filename
///
/// The key is passed explicitly through every stage instead of being
/// re-derived from the directory layout.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CardKey {
    /// Batch name (e.g. `batch_003`)
    pub batch_id: String,

    /// Image filename within the batch (e.g. `card_042.jpg`)
    pub filename: String,
}

impl CardKey {
    /// Create a new card key
    pub fn new(batch_id: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            batch_id: batch_id.into(),
            filename: filename.into(),
        }
    }

    /// Filename without its extension, used to name per-card artifacts
    ///
    /// # Examples
    ///
    /// ```
    /// use kartei_domain::CardKey;
    ///
    /// let key = CardKey::new("batch_003", "card_042.jpg");
    /// assert_eq!(key.stem(), "card_042");
    /// ```
    pub fn stem(&self) -> &str {
        Path::new(&self.filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.filename)
    }
}

impl fmt::Display for CardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.batch_id, self.filename)
    }
}

/// Extracted field values in schema order
///
/// Built through [`crate::FieldSchema::field_map`], so it always carries every
/// configured field; unfilled fields hold an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldMap {
    entries: Vec<(String, String)>,
}

impl FieldMap {
    pub(crate) fn from_entries(entries: Vec<(String, String)>) -> Self {
        Self { entries }
    }

    /// Value of a field, `None` if the field is not part of the map
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate `(field, value)` pairs in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map holds no fields
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of fields holding a non-blank value
    pub fn filled(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, v)| !v.trim().is_empty())
            .count()
    }
}

/// What one extraction produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardOutcome {
    /// All configured fields were extracted
    Succeeded(FieldMap),

    /// No record could be produced; carries the last attempt's error
    Failed {
        /// Human-readable error from the final attempt
        message: String,
    },
}

/// Result of extracting one card, immutable once created
///
/// A record is either fully present (every configured field, possibly empty)
/// or a failure without any field values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRecord {
    /// Card identity
    pub key: CardKey,

    /// Extracted fields or failure message
    pub outcome: CardOutcome,

    /// API attempts made for this card
    pub attempts: u32,

    /// Wall-clock time spent on this card, including backoff
    pub duration: Duration,
}

impl CardRecord {
    /// Create a successful record
    pub fn succeeded(key: CardKey, fields: FieldMap, attempts: u32, duration: Duration) -> Self {
        Self {
            key,
            outcome: CardOutcome::Succeeded(fields),
            attempts,
            duration,
        }
    }

    /// Create a failed record
    pub fn failed(
        key: CardKey,
        message: impl Into<String>,
        attempts: u32,
        duration: Duration,
    ) -> Self {
        Self {
            key,
            outcome: CardOutcome::Failed {
                message: message.into(),
            },
            attempts,
            duration,
        }
    }

    /// Whether extraction succeeded
    pub fn success(&self) -> bool {
        matches!(self.outcome, CardOutcome::Succeeded(_))
    }

    /// Error message, present only on failure
    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            CardOutcome::Failed { message } => Some(message),
            CardOutcome::Succeeded(_) => None,
        }
    }

    /// Extracted fields, present only on success
    pub fn fields(&self) -> Option<&FieldMap> {
        match &self.outcome {
            CardOutcome::Succeeded(fields) => Some(fields),
            CardOutcome::Failed { .. } => None,
        }
    }

    /// Final lifecycle state given the attempt budget
    pub fn state(&self, max_attempts: u32) -> CardState {
        match self.outcome {
            CardOutcome::Succeeded(_) => CardState::Succeeded,
            CardOutcome::Failed { .. } => CardState::Failed {
                attempts: self.attempts,
                terminal: self.attempts >= max_attempts,
            },
        }
    }
}
