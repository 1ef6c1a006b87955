//! Core CardExtractor implementation

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::parser::parse_fields;
use crate::prompt::PromptBuilder;
use kartei_domain::{CardRecord, CardState, FieldMap, FieldSchema, StateError, WorkItem};
use kartei_vlm::{ImageInput, RetryPolicy, VisionProvider};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Extracts the configured fields from one card image
///
/// Each call encodes the image once, then asks the provider up to
/// `max_retries` times, waiting between attempts per the retry policy.
/// Transport, API and parse failures are all retried. The result is always
/// a [`CardRecord`]; exhausting the budget yields a failed record carrying
/// the last error message.
pub struct CardExtractor<P>
where
    P: VisionProvider,
{
    provider: P,
    schema: Arc<FieldSchema>,
    prompt: String,
    policy: RetryPolicy,
}

impl<P> CardExtractor<P>
where
    P: VisionProvider,
{
    /// Create a new CardExtractor
    pub fn new(
        provider: P,
        schema: Arc<FieldSchema>,
        config: &ExtractorConfig,
    ) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;

        let mut builder = PromptBuilder::new(&schema);
        if let Some(name) = &config.collection_name {
            builder = builder.with_collection(name.clone());
        }
        let prompt = builder.build();

        Ok(Self {
            provider,
            schema,
            prompt,
            policy: config.retry_policy(),
        })
    }

    /// Replace the retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Schema every record is built against
    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Attempt budget per card
    pub fn max_attempts(&self) -> u32 {
        self.policy.max_attempts()
    }

    /// Prompt text sent with every image
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Extract one card; never fails, failures are returned as records
    pub async fn extract(&self, item: &WorkItem) -> CardRecord {
        let start = Instant::now();
        let key = item.key.clone();

        let image = match ImageInput::from_path(&item.path).await {
            Ok(image) => image,
            Err(e) => {
                warn!(batch = %key.batch_id, file = %key.filename, "Image unreadable: {}", e);
                return CardRecord::failed(key, e.to_string(), 0, start.elapsed());
            }
        };

        let max_attempts = self.policy.max_attempts();
        let image = &image;
        let mut state = CardState::Pending;

        let outcome = self
            .policy
            .run(|attempt| {
                let next = if attempt == 1 {
                    state.start()
                } else {
                    state
                        .fail(attempt - 1, max_attempts)
                        .and_then(CardState::retry)
                };
                advance(&mut state, next);
                debug!(file = %item.key.filename, attempt, "Sending card to {}", self.provider.model_name());
                self.attempt(image)
            })
            .await;

        let duration = start.elapsed();
        match outcome.result {
            Ok(fields) => {
                let next = state.succeed();
                advance(&mut state, next);
                info!(
                    batch = %key.batch_id,
                    file = %key.filename,
                    attempts = outcome.attempts,
                    filled = fields.filled(),
                    "Card extracted"
                );
                CardRecord::succeeded(key, fields, outcome.attempts, duration)
            }
            Err(e) => {
                let next = state.fail(outcome.attempts, max_attempts);
                advance(&mut state, next);
                warn!(
                    batch = %key.batch_id,
                    file = %key.filename,
                    attempts = outcome.attempts,
                    ?state,
                    "Card failed: {}",
                    e
                );
                CardRecord::failed(key, e.to_string(), outcome.attempts, duration)
            }
        }
    }

    /// One request plus response parsing
    async fn attempt(&self, image: &ImageInput) -> Result<FieldMap, ExtractorError> {
        let content = self.provider.complete(&self.prompt, image).await?;
        debug!("VLM content length: {} chars", content.len());
        parse_fields(&content, &self.schema)
    }
}

fn advance(state: &mut CardState, next: Result<CardState, StateError>) {
    match next {
        Ok(next) => *state = next,
        Err(e) => debug!("Ignoring card state change: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kartei_domain::CardKey;
    use kartei_vlm::MockProvider;
    use std::path::PathBuf;

    fn create_test_extractor(provider: MockProvider) -> CardExtractor<MockProvider> {
        let config = ExtractorConfig {
            retry_delay_secs: 0,
            ..Default::default()
        };
        CardExtractor::new(provider, Arc::new(FieldSchema::default()), &config).unwrap()
    }

    #[test]
    fn test_prompt_built_from_schema() {
        let extractor = create_test_extractor(MockProvider::default());
        assert!(extractor.prompt().contains("\"Bemerkungen\": \"...\""));
        assert!(extractor.prompt().contains("Lippmann-Rau"));
        assert_eq!(extractor.max_attempts(), 3);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ExtractorConfig {
            max_retries: 0,
            ..Default::default()
        };
        let result = CardExtractor::new(MockProvider::default(), Arc::new(FieldSchema::default()), &config);
        assert!(matches!(result, Err(ExtractorError::Config(_))));
    }

    #[tokio::test]
    async fn test_missing_image_makes_no_attempt() {
        let provider = MockProvider::default();
        let extractor = create_test_extractor(provider.clone());
        let item = WorkItem::new(
            CardKey::new("batch_001", "gone.jpg"),
            PathBuf::from("/nonexistent/batch_001/gone.jpg"),
        );

        let record = extractor.extract(&item).await;
        assert!(!record.success());
        assert_eq!(record.attempts, 0);
        assert_eq!(provider.call_count(), 0);
    }
}
