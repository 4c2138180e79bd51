//! Plotting stage: typed data and evaluations in, rendered plots out
//!
//! Rendering is the caller's business. This stage resolves the inputs and
//! writes whatever encoded images come back.

use std::path::PathBuf;

use tabsynth_core::{load_artifact, write_atomic, ArtifactKind, DataFrame};
use tracing::{debug, info};

use crate::artifacts::{EvaluationBundle, Plot};
use crate::config::PlottingOptions;
use crate::error::Result;
use crate::filenames::{FilenameResolver, DEFAULT_EXTENSION};
use crate::handover::{ArtifactName, Handover};

use super::{enter, InputSource, StagePhase};

const STAGE: &str = "plotting";

/// Extension of a plot file when none is given
pub const PLOT_EXTENSION: &str = ".png";

/// What the plotting stage reads
#[derive(Debug, Clone)]
pub struct PlottingInputs {
    /// Dataset name
    pub dataset: String,
    /// The real data
    pub typed: DataFrame,
    /// Evaluation results
    pub evaluations: EvaluationBundle,
    /// Where the inputs came from
    pub source: InputSource,
}

/// Stage IO for the plotting stage
#[derive(Debug, Clone, Copy)]
pub struct PlottingIo<'a> {
    resolver: &'a FilenameResolver,
    options: &'a PlottingOptions,
}

impl<'a> PlottingIo<'a> {
    /// Create the stage IO
    pub fn new(resolver: &'a FilenameResolver, options: &'a PlottingOptions) -> Self {
        Self { resolver, options }
    }

    /// Resolve the input files, failing with every one that is absent
    pub fn resolve_inputs(&self) -> Result<Vec<PathBuf>> {
        self.resolver.resolve_inputs(&[
            (&self.options.typed, DEFAULT_EXTENSION),
            (&self.options.evaluations, DEFAULT_EXTENSION),
        ])
    }

    /// Take the inputs from the handover if it holds all of them, otherwise load them
    pub fn load_inputs(&self, handover: &Handover) -> Result<PlottingInputs> {
        enter(STAGE, StagePhase::InputResolution);
        if let (Some(dataset), Some(typed), Some(evaluations)) = (
            handover.dataset(),
            handover.frame(ArtifactName::Typed),
            handover.eval_bundle(),
        ) {
            debug!(stage = STAGE, "Taking inputs from the handover");
            return Ok(PlottingInputs {
                dataset: dataset.to_string(),
                typed: typed.clone(),
                evaluations: evaluations.clone(),
                source: InputSource::Handover,
            });
        }

        let paths = self.resolve_inputs()?;

        enter(STAGE, StagePhase::Load);
        Ok(PlottingInputs {
            dataset: self.resolver.dataset_name().to_string(),
            typed: load_artifact(&paths[0], ArtifactKind::TypedData)?,
            evaluations: load_artifact(&paths[1], ArtifactKind::EvaluationBundle)?,
            source: InputSource::Disk,
        })
    }

    /// Resolve the output locations of `plots`
    pub fn output_paths(&self, plots: &[Plot]) -> Vec<PathBuf> {
        enter(STAGE, StagePhase::OutputResolution);
        let args: Vec<_> = plots.iter().map(|plot| (&plot.filename, PLOT_EXTENSION)).collect();
        self.resolver.resolve_outputs(&args)
    }

    /// Write every plot
    pub fn persist(&self, plots: &[Plot]) -> Result<Vec<PathBuf>> {
        let paths = self.output_paths(plots);

        enter(STAGE, StagePhase::Persist);
        for (plot, path) in plots.iter().zip(&paths) {
            write_atomic(path, &plot.bytes)?;
        }
        info!(stage = STAGE, plots = paths.len(), "Persisted plots");
        Ok(paths)
    }
}
