//! Evaluation stage: typed and synthetic data in, an evaluation bundle out

use std::path::PathBuf;

use tabsynth_core::{load_artifact, save_artifact, ArtifactKind, DataFrame};
use tracing::{debug, info};

use crate::artifacts::{EvaluationBundle, SyntheticDatasets};
use crate::config::EvaluationOptions;
use crate::error::Result;
use crate::filenames::{FilenameResolver, DEFAULT_EXTENSION};
use crate::handover::{ArtifactName, Handover, HandoverValue};

use super::{enter, InputSource, StagePhase};

const STAGE: &str = "evaluation";

/// What the evaluation stage reads
#[derive(Debug, Clone)]
pub struct EvaluationInputs {
    /// Dataset name
    pub dataset: String,
    /// The real data
    pub typed: DataFrame,
    /// Synthetic datasets to compare against it
    pub synthetic: SyntheticDatasets,
    /// Where the inputs came from
    pub source: InputSource,
}

/// Stage IO for the evaluation stage
#[derive(Debug, Clone, Copy)]
pub struct EvaluationIo<'a> {
    resolver: &'a FilenameResolver,
    options: &'a EvaluationOptions,
}

impl<'a> EvaluationIo<'a> {
    /// Create the stage IO
    pub fn new(resolver: &'a FilenameResolver, options: &'a EvaluationOptions) -> Self {
        Self { resolver, options }
    }

    /// Resolve the input files, failing with every one that is absent
    pub fn resolve_inputs(&self) -> Result<Vec<PathBuf>> {
        self.resolver.resolve_inputs(&[
            (&self.options.typed, DEFAULT_EXTENSION),
            (&self.options.synthetic_datasets, DEFAULT_EXTENSION),
        ])
    }

    /// Take the inputs from the handover if it holds all of them, otherwise load them
    pub fn load_inputs(&self, handover: &Handover) -> Result<EvaluationInputs> {
        enter(STAGE, StagePhase::InputResolution);
        if let (Some(dataset), Some(typed), Some(synthetic)) = (
            handover.dataset(),
            handover.frame(ArtifactName::Typed),
            handover.synthetic_datasets(),
        ) {
            debug!(stage = STAGE, "Taking inputs from the handover");
            return Ok(EvaluationInputs {
                dataset: dataset.to_string(),
                typed: typed.clone(),
                synthetic: synthetic.clone(),
                source: InputSource::Handover,
            });
        }

        let paths = self.resolve_inputs()?;

        enter(STAGE, StagePhase::Load);
        Ok(EvaluationInputs {
            dataset: self.resolver.dataset_name().to_string(),
            typed: load_artifact(&paths[0], ArtifactKind::TypedData)?,
            synthetic: load_artifact(&paths[1], ArtifactKind::SyntheticDatasets)?,
            source: InputSource::Disk,
        })
    }

    /// Resolve the output location
    pub fn output_path(&self) -> PathBuf {
        enter(STAGE, StagePhase::OutputResolution);
        let mut paths = self
            .resolver
            .resolve_outputs(&[(&self.options.evaluations, DEFAULT_EXTENSION)]);
        paths.pop().unwrap_or_default()
    }

    /// Write the bundle and hand it over to the next stage
    pub fn persist(&self, bundle: EvaluationBundle, handover: &mut Handover) -> Result<PathBuf> {
        let path = self.output_path();

        enter(STAGE, StagePhase::Persist);
        save_artifact(&path, ArtifactKind::EvaluationBundle, &bundle)?;
        info!(stage = STAGE, groups = bundle.groups().len(), "Persisted evaluations");

        handover.insert(ArtifactName::EvalBundle, HandoverValue::EvalBundle(bundle));
        Ok(path)
    }
}
