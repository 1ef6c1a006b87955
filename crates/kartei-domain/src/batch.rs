//! Batch - the records produced for one named group of cards

use crate::record::CardRecord;

/// Records produced for one batch during a single run
///
/// Counters are always derived from the records themselves and never
/// stored separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    id: String,
    records: Vec<CardRecord>,
}

impl Batch {
    /// Create an empty batch
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            records: Vec::new(),
        }
    }

    /// Batch name
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Append a record in completion order
    pub fn push(&mut self, record: CardRecord) {
        self.records.push(record);
    }

    /// All records, successes and failures
    pub fn records(&self) -> &[CardRecord] {
        &self.records
    }

    /// Successful records only, in completion order
    pub fn successful(&self) -> impl Iterator<Item = &CardRecord> {
        self.records.iter().filter(|r| r.success())
    }

    /// Failed records only
    pub fn failed_records(&self) -> impl Iterator<Item = &CardRecord> {
        self.records.iter().filter(|r| !r.success())
    }

    /// Number of cards submitted
    pub fn submitted(&self) -> usize {
        self.records.len()
    }

    /// Number of cards extracted successfully
    pub fn succeeded(&self) -> usize {
        self.successful().count()
    }

    /// Number of cards that failed terminally
    pub fn failed(&self) -> usize {
        self.submitted() - self.succeeded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CardKey, FieldSchema};
    use std::time::Duration;

    #[test]
    fn test_counters_follow_records() {
        let schema = FieldSchema::default();
        let mut batch = Batch::new("batch_001");
        assert_eq!(batch.submitted(), 0);

        batch.push(CardRecord::succeeded(
            CardKey::new("batch_001", "a.jpg"),
            schema.empty_map(),
            1,
            Duration::ZERO,
        ));
        batch.push(CardRecord::failed(
            CardKey::new("batch_001", "b.jpg"),
            "timeout",
            3,
            Duration::ZERO,
        ));

        assert_eq!(batch.id(), "batch_001");
        assert_eq!(batch.submitted(), 2);
        assert_eq!(batch.succeeded(), 1);
        assert_eq!(batch.failed(), 1);
        assert_eq!(batch.failed_records().next().unwrap().key.filename, "b.jpg");
    }
}
