//! Integration tests for kartei-pipeline
//!
//! A complete retry run against a temporary directory tree and a scripted
//! provider: failure log in, JSON artifacts and fragments out.

use async_trait::async_trait;
use kartei_domain::FieldSchema;
use kartei_extractor::{CardExtractor, ExtractorConfig};
use kartei_pipeline::{PipelineConfig, PipelineError, RetryRunner};
use kartei_store::Table;
use kartei_vlm::{ImageInput, MockProvider, VisionProvider, VlmError};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::watch;

const REPLY: &str = r#"```json
{"Komponist": "Reger, Max", "Signatur": "TOB 1728", "Titel": "Choralvorspiel"}
```"#;

fn setup(root: &Path, cards: &[(&str, &str)], log: &str) -> PipelineConfig {
    for (batch, file) in cards {
        let dir = root.join("images").join(batch);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(file), b"\xff\xd8jpeg").unwrap();
    }
    let output_root = root.join("output_batches");
    fs::create_dir_all(&output_root).unwrap();
    fs::write(output_root.join("vlm_errors.log"), log).unwrap();

    PipelineConfig {
        input_dir: root.join("images"),
        output_root,
        max_workers: 3,
        ..Default::default()
    }
}

/// Replies like the real endpoint, only slowly
struct SlowProvider(Duration);

#[async_trait]
impl VisionProvider for SlowProvider {
    async fn complete(&self, _prompt: &str, _image: &ImageInput) -> Result<String, VlmError> {
        tokio::time::sleep(self.0).await;
        Ok(REPLY.to_string())
    }
}

fn runner<P: VisionProvider + 'static>(provider: P, config: PipelineConfig) -> RetryRunner<P> {
    let extractor_config = ExtractorConfig {
        retry_delay_secs: 0,
        ..Default::default()
    };
    let extractor =
        CardExtractor::new(provider, Arc::new(FieldSchema::default()), &extractor_config).unwrap();
    RetryRunner::new(extractor, config).unwrap()
}

#[tokio::test]
async fn test_full_retry_run() {
    let dir = TempDir::new().unwrap();
    let log = "\
[2024-01-01 10:00:00] Batch: batch_003 | Datei: card_042.jpg
[2024-01-01 10:00:01] Batch: batch_003 | Datei: card_043.jpg
[2024-01-01 10:00:02] Batch: batch_001 | Datei: card_001.jpg
[2024-01-01 10:00:03] Batch: batch_001 | Datei: card_404.jpg
";
    let config = setup(
        dir.path(),
        &[("batch_003", "card_042.jpg"), ("batch_003", "card_043.jpg"), ("batch_001", "card_001.jpg")],
        log,
    );
    let output_root = config.output_root.clone();
    let provider = MockProvider::new(REPLY);
    let runner = runner(provider.clone(), config);
    let (_tx, rx) = watch::channel(false);

    let summary = runner.run(rx).await.unwrap();

    assert!(!summary.interrupted);
    assert_eq!(summary.batches.len(), 2);
    assert_eq!(summary.batches[0].batch_id(), "batch_001");
    assert_eq!(summary.submitted(), 3);
    assert_eq!(summary.succeeded(), 3);
    assert_eq!(summary.missing.len(), 1);
    assert_eq!(provider.call_count(), 3);

    assert!(output_root.join("json/batch_003/card_042.json").exists());
    let fragment = output_root.join("csv/retry/batch_003_RETRY.csv");
    assert_eq!(summary.batches[1].fragment.as_deref(), Some(fragment.as_path()));

    let table = Table::read_csv(&fragment).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.headers()[2], "Signatur");
    assert_eq!(table.value(0, "Signatur"), Some("TOB 1728"));
}

#[tokio::test]
async fn test_failed_cards_produce_no_fragment() {
    let dir = TempDir::new().unwrap();
    let config = setup(
        dir.path(),
        &[("batch_005", "card_1.jpg")],
        "[t] Batch: batch_005 | Datei: card_1.jpg\n",
    );
    let output_root = config.output_root.clone();
    let provider = MockProvider::failing(VlmError::Api {
        status: 429,
        message: "Rate limit exceeded".to_string(),
    });
    let runner = runner(provider.clone(), config);
    let (_tx, rx) = watch::channel(false);

    let summary = runner.run(rx).await.unwrap();

    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.batches[0].fragment, None);
    assert_eq!(provider.call_count(), 3);
    assert!(!output_root.join("csv/retry/batch_005_RETRY.csv").exists());
    assert!(!output_root.join("json/batch_005").exists());
}

#[tokio::test]
async fn test_missing_log_aborts_run() {
    let dir = TempDir::new().unwrap();
    let config = PipelineConfig {
        input_dir: dir.path().join("images"),
        output_root: dir.path().join("nothing_here"),
        ..Default::default()
    };
    let provider = MockProvider::default();
    let runner = runner(provider.clone(), config);
    let (_tx, rx) = watch::channel(false);

    let result = runner.run(rx).await;

    assert!(matches!(result, Err(PipelineError::FailureLog { .. })));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_shutdown_stops_before_next_batch() {
    let dir = TempDir::new().unwrap();
    let config = setup(
        dir.path(),
        &[("batch_001", "a.jpg"), ("batch_002", "b.jpg")],
        "[t] Batch: batch_001 | Datei: a.jpg\n[t] Batch: batch_002 | Datei: b.jpg\n",
    );
    let provider = MockProvider::new(REPLY);
    let runner = runner(provider.clone(), config);
    let (tx, rx) = watch::channel(false);
    tx.send(true).unwrap();

    let summary = runner.run(rx).await.unwrap();

    assert!(summary.interrupted);
    assert!(summary.batches.is_empty());
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_empty_log_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    let config = setup(dir.path(), &[], "nothing failed\n");
    let runner = runner(MockProvider::default(), config);
    let (_tx, rx) = watch::channel(false);

    let summary = runner.run(rx).await.unwrap();

    assert!(summary.batches.is_empty());
    assert_eq!(summary.submitted(), 0);
}

#[tokio::test]
async fn test_shutdown_mid_batch_writes_partial_fragment() {
    let dir = TempDir::new().unwrap();
    let names: Vec<String> = (0..60).map(|i| format!("card_{:03}.jpg", i)).collect();
    let mut cards: Vec<(&str, &str)> = names.iter().map(|n| ("batch_001", n.as_str())).collect();
    cards.push(("batch_002", "late.jpg"));
    let mut log: String = names
        .iter()
        .map(|n| format!("[t] Batch: batch_001 | Datei: {}\n", n))
        .collect();
    log.push_str("[t] Batch: batch_002 | Datei: late.jpg\n");
    let config = setup(dir.path(), &cards, &log);
    let output_root = config.output_root.clone();
    let runner = runner(SlowProvider(Duration::from_millis(20)), config);
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let _ = tx.send(true);
    });

    let summary = runner.run(rx).await.unwrap();

    assert!(summary.interrupted);
    assert_eq!(summary.batches.len(), 1);
    let succeeded = summary.succeeded();
    assert!(succeeded > 0 && succeeded < 60, "succeeded {} of 60", succeeded);
    assert_eq!(summary.submitted(), succeeded);

    let fragment = output_root.join("csv/retry/batch_001_RETRY.csv");
    assert_eq!(Table::read_csv(&fragment).unwrap().len(), succeeded);
    let artifacts = fs::read_dir(output_root.join("json/batch_001")).unwrap().count();
    assert_eq!(artifacts, succeeded);
    assert!(!output_root.join("csv/retry/batch_002_RETRY.csv").exists());
    assert!(!output_root.join("json/batch_002").exists());
}
