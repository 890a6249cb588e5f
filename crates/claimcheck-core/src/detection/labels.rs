//! Class-index → label table loaded from a newline-delimited names file.

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::PipelineError;

/// Class labels indexed by detector class id.
#[derive(Debug, Clone)]
pub struct LabelTable {
    labels: Vec<String>,
}

impl LabelTable {
    /// Load labels from a file with one label per line (e.g. `coco.names`).
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path).map_err(|e| PipelineError::Model {
            path: path.to_path_buf(),
            message: format!("Failed to read class labels: {e}"),
        })?;
        let table = Self::parse(&content)?;
        tracing::debug!("Loaded {} class labels from {:?}", table.len(), path);
        Ok(table)
    }

    /// Parse label text. Line index is the class id, so interior blank lines
    /// are kept as empty labels; only the trailing newline is dropped.
    pub fn parse(content: &str) -> Result<Self, PipelineError> {
        let labels: Vec<String> = content
            .lines()
            .map(|line| line.trim_end_matches('\r').to_string())
            .collect();

        if labels.is_empty() {
            return Err(PipelineError::Labels {
                message: "class label file is empty".to_string(),
            });
        }

        Ok(Self { labels })
    }

    /// Build a table from labels in class-id order.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the table has no classes.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label for a class id.
    pub fn label(&self, class_id: usize) -> Result<&str, PipelineError> {
        self.labels
            .get(class_id)
            .map(String::as_str)
            .ok_or_else(|| PipelineError::Labels {
                message: format!(
                    "class id {class_id} out of range for {} labels",
                    self.labels.len()
                ),
            })
    }

    /// Map class ids to labels, deduplicate, sort, and join with single spaces.
    ///
    /// Returns an empty string for an empty set.
    pub fn join(&self, class_ids: &BTreeSet<usize>) -> Result<String, PipelineError> {
        let labels = class_ids
            .iter()
            .map(|&id| self.label(id))
            .collect::<Result<BTreeSet<&str>, _>>()?;
        Ok(labels.into_iter().collect::<Vec<_>>().join(" "))
    }
}
