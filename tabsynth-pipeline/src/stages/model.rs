//! Model stage: transformed data in, synthetic datasets and a model out
//!
//! Training and sampling happen outside this crate. The caller receives the
//! transformed data and the fitted metatransformer, and returns a
//! [`ModelRun`] whose samples are still in the transformed representation.
//! The samples are reverted here, so every persisted synthetic dataset has
//! the typed schema of the original data.

use std::path::PathBuf;

use tabsynth_core::{load_artifact, save_artifact, ArtifactKind, DataFrame};
use tabsynth_transforms::MetaTransformer;
use tracing::{debug, info};

use crate::artifacts::{SyntheticDatasets, TrainedModel};
use crate::config::ModelOptions;
use crate::error::Result;
use crate::filenames::{FilenameResolver, DEFAULT_EXTENSION};
use crate::handover::{ArtifactName, Handover, HandoverValue};

use super::{enter, InputSource, StagePhase};

const STAGE: &str = "model";

/// Extension of the model file when none is given
pub const MODEL_EXTENSION: &str = ".pt";

/// What the model stage reads
#[derive(Debug, Clone)]
pub struct ModelInputs {
    /// Dataset name
    pub dataset: String,
    /// Transformed data to train on
    pub prepared: DataFrame,
    /// Metatransformer fitted by the dataloader
    pub metatransformer: MetaTransformer,
    /// Where the inputs came from
    pub source: InputSource,
}

/// Result of training and sampling, as returned by the caller
#[derive(Debug, Clone)]
pub struct ModelRun {
    /// The trained model
    pub model: TrainedModel,
    /// Labelled samples in the transformed representation
    pub samples: Vec<(String, DataFrame)>,
}

/// What the model stage produces
#[derive(Debug, Clone)]
pub struct ModelOutputs {
    /// The trained model
    pub model: TrainedModel,
    /// Synthetic datasets in the typed representation
    pub synthetic: SyntheticDatasets,
}

/// Where the model outputs were written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    /// Synthetic datasets
    pub synthetic_datasets: PathBuf,
    /// Model file
    pub model: PathBuf,
}

/// Stage IO for the model stage
#[derive(Debug, Clone, Copy)]
pub struct ModelIo<'a> {
    resolver: &'a FilenameResolver,
    options: &'a ModelOptions,
}

impl<'a> ModelIo<'a> {
    /// Create the stage IO
    pub fn new(resolver: &'a FilenameResolver, options: &'a ModelOptions) -> Self {
        Self { resolver, options }
    }

    /// Resolve the input files, failing with every one that is absent
    pub fn resolve_inputs(&self) -> Result<Vec<PathBuf>> {
        self.resolver.resolve_inputs(&[
            (&self.options.prepared, DEFAULT_EXTENSION),
            (&self.options.metatransformer, DEFAULT_EXTENSION),
        ])
    }

    /// Take the inputs from the handover if it holds all of them, otherwise load them
    pub fn load_inputs(&self, handover: &Handover) -> Result<ModelInputs> {
        enter(STAGE, StagePhase::InputResolution);
        if let (Some(dataset), Some(prepared), Some(metatransformer)) = (
            handover.dataset(),
            handover.frame(ArtifactName::PreparedDataset),
            handover.metatransformer(),
        ) {
            debug!(stage = STAGE, "Taking inputs from the handover");
            return Ok(ModelInputs {
                dataset: dataset.to_string(),
                prepared: prepared.clone(),
                metatransformer: metatransformer.clone(),
                source: InputSource::Handover,
            });
        }

        let paths = self.resolve_inputs()?;

        enter(STAGE, StagePhase::Load);
        let prepared = load_artifact(&paths[0], ArtifactKind::TransformedData)?;
        let metatransformer = load_artifact(&paths[1], ArtifactKind::MetaTransformer)?;
        Ok(ModelInputs {
            dataset: self.resolver.dataset_name().to_string(),
            prepared,
            metatransformer,
            source: InputSource::Disk,
        })
    }

    /// Revert every sample of `run` to the typed representation
    pub fn finish(&self, inputs: &ModelInputs, run: ModelRun) -> Result<ModelOutputs> {
        enter(STAGE, StagePhase::Work);
        let mut synthetic = SyntheticDatasets::new();
        for (label, sample) in run.samples {
            let typed = inputs.metatransformer.revert(&sample)?;
            debug!(
                stage = STAGE,
                label = %label,
                rows = typed.row_count(),
                "Reverted synthetic sample"
            );
            synthetic.push(&label, typed);
        }
        Ok(ModelOutputs {
            model: run.model,
            synthetic,
        })
    }

    /// Resolve the output locations
    pub fn output_paths(&self) -> ModelPaths {
        enter(STAGE, StagePhase::OutputResolution);
        let mut paths = self
            .resolver
            .resolve_outputs(&[
                (&self.options.synthetic_datasets, DEFAULT_EXTENSION),
                (&self.options.model_file, MODEL_EXTENSION),
            ])
            .into_iter();

        let mut next = || paths.next().unwrap_or_default();
        ModelPaths {
            synthetic_datasets: next(),
            model: next(),
        }
    }

    /// Write the outputs and hand them over to the next stage
    pub fn persist(&self, outputs: ModelOutputs, handover: &mut Handover) -> Result<ModelPaths> {
        let paths = self.output_paths();

        enter(STAGE, StagePhase::Persist);
        save_artifact(
            &paths.synthetic_datasets,
            ArtifactKind::SyntheticDatasets,
            &outputs.synthetic,
        )?;
        save_artifact(&paths.model, ArtifactKind::TrainedModel, &outputs.model)?;

        info!(
            stage = STAGE,
            architecture = %outputs.model.architecture,
            synthetic_datasets = outputs.synthetic.len(),
            "Persisted model outputs"
        );

        handover.insert(
            ArtifactName::SyntheticDatasets,
            HandoverValue::SyntheticDatasets(outputs.synthetic),
        );
        handover.insert(ArtifactName::Model, HandoverValue::Model(outputs.model));
        Ok(paths)
    }
}
