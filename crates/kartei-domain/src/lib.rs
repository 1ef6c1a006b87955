//! Kartei Domain Layer
//!
//! Core value types for digitizing scanned archive index cards.
//! This crate has ZERO external dependencies and defines the record schema,
//! card identity, work items and the trait seams that the infrastructure
//! crates implement.
//!
//! ## Key Concepts
//!
//! - **Card**: one scanned index card, identified by `(batch_id, filename)`
//! - **FieldSchema**: the fixed, ordered list of text fields extracted per card
//! - **CardRecord**: the outcome of one extraction (all fields, or none)
//! - **Batch**: the cards processed together in one worker-pool run
//! - **CardState**: `Pending → InProgress → Succeeded | Failed`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batch;
pub mod record;
pub mod schema;
pub mod state;
pub mod traits;
pub mod work;

// Re-exports for convenience
pub use batch::Batch;
pub use record::{CardKey, CardOutcome, CardRecord, FieldMap};
pub use schema::{FieldSchema, FieldSpec, SchemaError, BATCH_COLUMN, FILENAME_COLUMN};
pub use state::{CardState, StateError};
pub use traits::ResultSink;
pub use work::{FailureLogEntry, WorkItem};
