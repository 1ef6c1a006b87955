//! Resolve failed card references to image files on disk

use crate::failure_log::FailureIndex;
use kartei_domain::{CardKey, WorkItem};
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};

/// Work items of one batch, sorted by filename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    /// Batch name
    pub batch_id: String,

    /// Cards whose image exists
    pub items: Vec<WorkItem>,
}

/// A reference that could not be scheduled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingReference {
    /// Card named in the log
    pub key: CardKey,

    /// Where the image was expected, if the name was usable at all
    pub expected_path: Option<PathBuf>,
}

/// Everything a retry run will process, plus what it skipped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkPlan {
    /// Batches in sorted order; batches without any existing image are absent
    pub batches: Vec<BatchPlan>,

    /// References dropped before scheduling
    pub missing: Vec<MissingReference>,
}

impl WorkPlan {
    /// Number of scheduled cards across all batches
    pub fn total_items(&self) -> usize {
        self.batches.iter().map(|b| b.items.len()).sum()
    }

    /// True when nothing is left to process
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

/// Maps `(batch, filename)` to `<input_dir>/<batch>/<filename>` and keeps
/// only references whose file exists
#[derive(Debug, Clone)]
pub struct WorkItemResolver {
    input_dir: PathBuf,
}

impl WorkItemResolver {
    /// Create a resolver rooted at the image directory
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
        }
    }

    /// Build the work plan for a failure index
    ///
    /// Missing files are reported with a warning and never count as an
    /// attempt or a failure.
    pub fn resolve(&self, index: &FailureIndex) -> WorkPlan {
        let mut plan = WorkPlan::default();

        for (batch_id, filenames) in index {
            let mut items = Vec::new();

            for filename in filenames {
                let key = CardKey::new(batch_id.as_str(), filename.as_str());

                if !is_plain_name(batch_id) || !is_plain_name(filename) {
                    warn!(batch = %batch_id, file = %filename, "Rejecting reference with path components");
                    plan.missing.push(MissingReference {
                        key,
                        expected_path: None,
                    });
                    continue;
                }

                let path = self.input_dir.join(batch_id).join(filename);
                if path.is_file() {
                    items.push(WorkItem::new(key, path));
                } else {
                    warn!(path = %path.display(), "Image not found, skipping");
                    plan.missing.push(MissingReference {
                        key,
                        expected_path: Some(path),
                    });
                }
            }

            if !items.is_empty() {
                plan.batches.push(BatchPlan {
                    batch_id: batch_id.clone(),
                    items,
                });
            }
        }

        info!(
            cards = plan.total_items(),
            batches = plan.batches.len(),
            missing = plan.missing.len(),
            "Work plan resolved"
        );
        plan
    }
}

/// A single normal path component
fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}
