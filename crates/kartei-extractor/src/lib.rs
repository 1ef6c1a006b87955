//! Kartei Extractor
//!
//! Turns one scanned catalogue card into a complete, schema-shaped record
//! using a vision-language model.
//!
//! # Overview
//!
//! For every card the extractor encodes the image once, sends it together
//! with a fixed German instruction prompt, and parses the model's reply into
//! a [`FieldMap`](kartei_domain::FieldMap) holding exactly the configured
//! fields. Transport, API and parse failures are retried with linear backoff;
//! the outcome of a card is always a [`CardRecord`](kartei_domain::CardRecord),
//! never an error.
//!
//! # Architecture
//!
//! ```text
//! Image → ImageInput → VisionProvider → parse_fields → CardRecord
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use kartei_domain::{CardKey, FieldSchema, WorkItem};
//! use kartei_extractor::{CardExtractor, ExtractorConfig};
//! use kartei_vlm::MockProvider;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = MockProvider::new(r#"{"Komponist": "Bach, Johann Sebastian"}"#);
//! let schema = Arc::new(FieldSchema::default());
//! let extractor = CardExtractor::new(provider, schema, &ExtractorConfig::default())?;
//!
//! let item = WorkItem::new(
//!     CardKey::new("batch_001", "card_0001.jpg"),
//!     "input/batch_001/card_0001.jpg",
//! );
//! let record = extractor.extract(&item).await;
//!
//! println!("{}: success={} after {} attempt(s)", record.key, record.success(), record.attempts);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod extractor;
mod parser;
mod prompt;


pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use extractor::CardExtractor;
pub use parser::{parse_fields, strip_code_fence};
pub use prompt::PromptBuilder;
