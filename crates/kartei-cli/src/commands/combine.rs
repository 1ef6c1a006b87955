//! Combine command implementation.

use crate::cli::CombineArgs;
use crate::config::AppConfig;
use crate::error::Result;
use crate::output::Formatter;
use kartei_reconciler::combine_batches;
use std::path::PathBuf;

/// Default file name of the combined dataset.
pub const COMBINED_FILE: &str = "metadata_combined.csv";

/// Execute the combine command.
pub fn execute_combine(args: CombineArgs, config: &AppConfig, formatter: &Formatter) -> Result<()> {
    let (csv_dir, output) = resolve_paths(&args, config);
    let report = combine_batches(&csv_dir, &output)?;
    println!("{}", formatter.combine_report(&report));
    Ok(())
}

fn resolve_paths(args: &CombineArgs, config: &AppConfig) -> (PathBuf, PathBuf) {
    let csv_dir = args
        .csv_dir
        .clone()
        .unwrap_or_else(|| config.pipeline.csv_dir());
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| config.pipeline.output_root.join(COMBINED_FILE));
    (csv_dir, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_paths() {
        let args = CombineArgs {
            csv_dir: None,
            output: None,
        };
        let (csv_dir, output) = resolve_paths(&args, &AppConfig::default());
        assert_eq!(csv_dir, PathBuf::from("output_batches/csv"));
        assert_eq!(output, PathBuf::from("output_batches/metadata_combined.csv"));
    }

    #[test]
    fn test_combine_writes_output() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("batch_002.csv"), "Datei,Batch\nb.jpg,batch_002\n").unwrap();
        fs::write(dir.path().join("batch_001.csv"), "Datei,Batch\na.jpg,batch_001\n").unwrap();
        let output = dir.path().join("all").join("combined.csv");

        let args = CombineArgs {
            csv_dir: Some(dir.path().to_path_buf()),
            output: Some(output.clone()),
        };
        execute_combine(args, &AppConfig::default(), &Formatter::new(false)).unwrap();

        let combined = fs::read_to_string(output).unwrap();
        let a = combined.find("a.jpg").unwrap();
        let b = combined.find("b.jpg").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_combine_after_merge_skips_merge_files() {
        use crate::cli::MergeArgs;
        use crate::commands::merge::execute_merge;

        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.pipeline.output_root = dir.path().join("output_batches");
        config.reconcile.csv_dir = config.pipeline.fragment_dir();

        let csv_dir = config.pipeline.csv_dir();
        let retry_dir = config.pipeline.fragment_dir();
        fs::create_dir_all(&retry_dir).unwrap();
        fs::write(csv_dir.join("batch_001.csv"), "Datei,Batch,Signatur\na.jpg,batch_001,\n").unwrap();
        fs::write(csv_dir.join("batch_002.csv"), "Datei,Batch,Signatur\nb.jpg,batch_002,TOB 2\n").unwrap();
        fs::write(
            retry_dir.join("metadata_vlm_complete.csv"),
            "Datei,Batch,Signatur\na.jpg,batch_001,\nb.jpg,batch_002,TOB 2\n",
        )
        .unwrap();
        fs::write(
            retry_dir.join("batch_001_RETRY.csv"),
            "Datei,Batch,Signatur\na.jpg,batch_001,TOB 1\n",
        )
        .unwrap();

        let merge = MergeArgs {
            csv_dir: None,
            master: None,
            output: None,
        };
        execute_merge(merge, config.clone(), &Formatter::new(false)).unwrap();
        assert!(retry_dir.join("metadata_vlm_complete_UPDATED.csv").exists());
        assert!(retry_dir.join("metadata_vlm_complete_BACKUP.csv").exists());

        let combine = CombineArgs {
            csv_dir: None,
            output: None,
        };
        execute_combine(combine, &config, &Formatter::new(false)).unwrap();

        let combined = fs::read_to_string(config.pipeline.output_root.join(COMBINED_FILE)).unwrap();
        assert_eq!(combined.lines().count(), 3);
        assert_eq!(combined.matches("a.jpg").count(), 1);
        assert_eq!(combined.matches("b.jpg").count(), 1);
    }
}
