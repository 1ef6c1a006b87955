//! Merge command implementation.

use crate::cli::MergeArgs;
use crate::config::AppConfig;
use crate::error::Result;
use crate::output::Formatter;
use kartei_reconciler::{ReconcileConfig, Reconciler};

/// Execute the merge command.
pub fn execute_merge(args: MergeArgs, config: AppConfig, formatter: &Formatter) -> Result<()> {
    let schema = config.schema()?;
    let reconcile = with_overrides(&args, config.reconcile);

    let report = Reconciler::new(reconcile)?.with_schema(&schema).run()?;
    println!("{}", formatter.merge_report(&report));
    Ok(())
}

fn with_overrides(args: &MergeArgs, mut config: ReconcileConfig) -> ReconcileConfig {
    if let Some(dir) = &args.csv_dir {
        config.csv_dir = dir.clone();
    }
    if let Some(master) = &args.master {
        config.master_file = master.clone();
    }
    if let Some(output) = &args.output {
        config.output_file = output.clone();
    }
    config
}
