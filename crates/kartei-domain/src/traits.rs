//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::record::CardRecord;

/// Destination for finished card records
///
/// Implemented by the infrastructure layer (kartei-store). The pipeline calls
/// the sink from its single collecting point only, after a card's task has
/// fully completed.
///
/// # Examples
///
/// ```
/// use kartei_domain::{CardKey, CardRecord, ResultSink};
/// use std::time::Duration;
///
/// struct Counter(usize);
///
/// impl ResultSink for Counter {
///     type Error = std::convert::Infallible;
///
///     fn accept(&mut self, record: &CardRecord) -> Result<(), Self::Error> {
///         if record.success() {
///             self.0 += 1;
///         }
///         Ok(())
///     }
/// }
///
/// let mut sink = Counter(0);
/// let record = CardRecord::failed(CardKey::new("batch_001", "a.jpg"), "timeout", 3, Duration::ZERO);
/// sink.accept(&record).unwrap();
/// assert_eq!(sink.0, 0);
/// ```
pub trait ResultSink {
    /// Error type for sink operations
    type Error;

    /// Persist one record; failed records produce no artifact
    fn accept(&mut self, record: &CardRecord) -> Result<(), Self::Error>;
}
