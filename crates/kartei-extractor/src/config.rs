//! Configuration for the Extractor

use kartei_vlm::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Attempts per card, including the first one
    pub max_retries: u32,

    /// Base backoff between attempts (seconds); attempt `n` waits `n` times this
    pub retry_delay_secs: u64,

    /// Cap on a single backoff wait (seconds)
    pub max_retry_delay_secs: u64,

    /// Archive name inserted in the prompt's opening sentence
    pub collection_name: Option<String>,
}

impl ExtractorConfig {
    /// Get the base retry delay as a Duration
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// Retry policy applied to every card
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_delay())
            .with_max_delay(Duration::from_secs(self.max_retry_delay_secs))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_retries == 0 {
            return Err("max_retries must be greater than 0".to_string());
        }
        if self.max_retry_delay_secs < self.retry_delay_secs {
            return Err("max_retry_delay_secs cannot be below retry_delay_secs".to_string());
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    /// Default configuration: 3 attempts, 2s linear backoff
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_secs: 2,
            max_retry_delay_secs: 60,
            collection_name: Some("Lippmann-Rau Musikarchiv Eisenach".to_string()),
        }
    }
}

impl ExtractorConfig {
    /// Fast preset: fewer attempts for quick test runs
    pub fn fast() -> Self {
        Self {
            max_retries: 2,
            ..Self::default()
        }
    }

    /// Patient preset: more attempts and longer waits for unstable connections
    pub fn patient() -> Self {
        Self {
            max_retries: 5,
            retry_delay_secs: 5,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(ExtractorConfig::default().validate().is_ok());
        assert!(ExtractorConfig::fast().validate().is_ok());
        assert!(ExtractorConfig::patient().validate().is_ok());
        assert!(ExtractorConfig::patient().max_retries > ExtractorConfig::default().max_retries);
    }

    #[test]
    fn test_invalid_max_retries() {
        let config = ExtractorConfig {
            max_retries: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_policy_from_config() {
        let policy = ExtractorConfig::default().retry_policy();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay_after(1), Duration::from_secs(2));
        assert_eq!(policy.delay_after(2), Duration::from_secs(4));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ExtractorConfig::from_toml("max_retries = 4").unwrap();
        assert_eq!(config.max_retries, 4);
        assert_eq!(config.retry_delay_secs, 2);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ExtractorConfig::patient();
        let toml_str = config.to_toml().unwrap();
        let parsed = ExtractorConfig::from_toml(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }
}
