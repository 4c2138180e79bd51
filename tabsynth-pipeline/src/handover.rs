//! In-process exchange of artifacts between stages of one pipeline run
//!
//! When stages run back to back, each one records its outputs here and the
//! next stage takes its inputs from here instead of reading them from disk.

use std::collections::BTreeMap;
use std::fmt;

use tabsynth_core::DataFrame;
use tabsynth_transforms::MetaTransformer;

use crate::artifacts::{EvaluationBundle, SyntheticDatasets, TrainedModel};

/// Logical name of a handed-over artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactName {
    /// Dataset name the run was started with
    Dataset,
    /// Typed data
    Typed,
    /// Transformed data
    Transformed,
    /// The model stage's view of the transformed data
    PreparedDataset,
    /// Fitted metatransformer
    MetaTransformer,
    /// Synthetic datasets in the typed representation
    SyntheticDatasets,
    /// Trained model
    Model,
    /// Evaluation results
    EvalBundle,
}

impl ArtifactName {
    /// Key used in logs
    pub fn key(&self) -> &'static str {
        match self {
            ArtifactName::Dataset => "dataset",
            ArtifactName::Typed => "typed",
            ArtifactName::Transformed => "transformed",
            ArtifactName::PreparedDataset => "prepared_dataset",
            ArtifactName::MetaTransformer => "metatransformer",
            ArtifactName::SyntheticDatasets => "synthetic_datasets",
            ArtifactName::Model => "model",
            ArtifactName::EvalBundle => "eval_bundle",
        }
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// A handed-over artifact
#[derive(Debug, Clone, PartialEq)]
pub enum HandoverValue {
    /// A dataset name
    Name(String),
    /// A table
    Frame(DataFrame),
    /// A fitted metatransformer
    MetaTransformer(MetaTransformer),
    /// Synthetic datasets
    SyntheticDatasets(SyntheticDatasets),
    /// A trained model
    Model(TrainedModel),
    /// Evaluation results
    EvalBundle(EvaluationBundle),
}

/// Artifacts keyed by logical name
#[derive(Debug, Clone, Default)]
pub struct Handover {
    entries: BTreeMap<ArtifactName, HandoverValue>,
}

impl Handover {
    /// Create an empty handover
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an artifact, replacing any previous value
    pub fn insert(&mut self, name: ArtifactName, value: HandoverValue) {
        self.entries.insert(name, value);
    }

    /// Get an artifact
    pub fn get(&self, name: ArtifactName) -> Option<&HandoverValue> {
        self.entries.get(&name)
    }

    /// Check whether an artifact is present
    pub fn contains(&self, name: ArtifactName) -> bool {
        self.entries.contains_key(&name)
    }

    /// Names of all present artifacts
    pub fn names(&self) -> impl Iterator<Item = ArtifactName> + '_ {
        self.entries.keys().copied()
    }

    /// Number of artifacts
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no artifacts
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The dataset name, if handed over
    pub fn dataset(&self) -> Option<&str> {
        match self.get(ArtifactName::Dataset)? {
            HandoverValue::Name(name) => Some(name),
            _ => None,
        }
    }

    /// A table, if `name` holds one
    pub fn frame(&self, name: ArtifactName) -> Option<&DataFrame> {
        match self.get(name)? {
            HandoverValue::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    /// The metatransformer, if handed over
    pub fn metatransformer(&self) -> Option<&MetaTransformer> {
        match self.get(ArtifactName::MetaTransformer)? {
            HandoverValue::MetaTransformer(meta) => Some(meta),
            _ => None,
        }
    }

    /// The synthetic datasets, if handed over
    pub fn synthetic_datasets(&self) -> Option<&SyntheticDatasets> {
        match self.get(ArtifactName::SyntheticDatasets)? {
            HandoverValue::SyntheticDatasets(datasets) => Some(datasets),
            _ => None,
        }
    }

    /// The trained model, if handed over
    pub fn model(&self) -> Option<&TrainedModel> {
        match self.get(ArtifactName::Model)? {
            HandoverValue::Model(model) => Some(model),
            _ => None,
        }
    }

    /// The evaluation results, if handed over
    pub fn eval_bundle(&self) -> Option<&EvaluationBundle> {
        match self.get(ArtifactName::EvalBundle)? {
            HandoverValue::EvalBundle(bundle) => Some(bundle),
            _ => None,
        }
    }
}
