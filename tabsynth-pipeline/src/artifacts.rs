//! Artifacts exchanged with the model, evaluation and plotting collaborators

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tabsynth_core::DataFrame;

use crate::filenames::FilenameArg;

/// A trained generative model, opaque to the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    /// Architecture name, e.g. `VAE`
    pub architecture: String,
    /// Serialized model state
    pub state: Vec<u8>,
    /// Free-form descriptive metadata
    pub metadata: BTreeMap<String, String>,
}

impl TrainedModel {
    /// Create a model artifact
    pub fn new(architecture: &str, state: Vec<u8>) -> Self {
        Self {
            architecture: architecture.to_string(),
            state,
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }
}

/// One synthetic dataset, in the typed representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticDataset {
    /// Label identifying the run that produced it, e.g. the seed
    pub label: String,
    /// The synthetic rows
    pub data: DataFrame,
}

/// All synthetic datasets produced by a model stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyntheticDatasets {
    datasets: Vec<SyntheticDataset>,
}

impl SyntheticDatasets {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dataset
    pub fn push(&mut self, label: &str, data: DataFrame) {
        self.datasets.push(SyntheticDataset {
            label: label.to_string(),
            data,
        });
    }

    /// Get a dataset by label
    pub fn get(&self, label: &str) -> Option<&DataFrame> {
        self.datasets.iter().find(|d| d.label == label).map(|d| &d.data)
    }

    /// Iterate over the datasets in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &SyntheticDataset> {
        self.datasets.iter()
    }

    /// Number of datasets
    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    /// Check if there are no datasets
    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

/// Evaluation results, grouped as `group -> metric -> score`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationBundle {
    groups: BTreeMap<String, BTreeMap<String, f64>>,
}

impl EvaluationBundle {
    /// Create an empty bundle
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one score
    pub fn record(&mut self, group: &str, metric: &str, score: f64) {
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(metric.to_string(), score);
    }

    /// Get one score
    pub fn get(&self, group: &str, metric: &str) -> Option<f64> {
        self.groups.get(group)?.get(metric).copied()
    }

    /// All groups
    pub fn groups(&self) -> &BTreeMap<String, BTreeMap<String, f64>> {
        &self.groups
    }

    /// Check if nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// A rendered plot, written as-is into the experiment directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plot {
    /// Output filename; a suffix such as `_fidelity` is attached to the dataset stem
    pub filename: FilenameArg,
    /// Encoded image
    pub bytes: Vec<u8>,
}

impl Plot {
    /// Create a plot
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: FilenameArg::from(filename.into()),
            bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabsynth_core::Column;

    #[test]
    fn test_evaluation_bundle() {
        let mut bundle = EvaluationBundle::new();
        bundle.record("seed_1", "ks_complement", 0.91);
        bundle.record("seed_1", "tv_complement", 0.88);

        assert_eq!(bundle.get("seed_1", "ks_complement"), Some(0.91));
        assert_eq!(bundle.get("seed_2", "ks_complement"), None);
        assert_eq!(bundle.groups()["seed_1"].len(), 2);
    }

    #[test]
    fn test_synthetic_datasets_lookup() {
        let frame = DataFrame::from_columns(vec![Column::int64("age", vec![Some(1)])]).unwrap();
        let mut datasets = SyntheticDatasets::new();
        datasets.push("seed_7", frame.clone());

        assert_eq!(datasets.len(), 1);
        assert_eq!(datasets.get("seed_7"), Some(&frame));
        assert!(datasets.get("seed_8").is_none());
    }
}
