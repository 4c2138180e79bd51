//! Driver running the stages of one experiment in order
//!
//! Each `run_*` method resolves the stage inputs, calls the caller's step
//! where there is one, and persists the outputs. A step error aborts the
//! run and is returned as [`Error::External`].

use std::error::Error as StdError;
use std::path::PathBuf;

use tracing::info;

use crate::artifacts::{EvaluationBundle, Plot};
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::experiment::Experiment;
use crate::filenames::FilenameResolver;
use crate::handover::Handover;
use crate::stages::{
    DataloaderIo, DataloaderPaths, EvaluationInputs, EvaluationIo, ModelInputs, ModelIo, ModelPaths,
    ModelRun, PlottingInputs, PlottingIo,
};

fn external<E>(stage: &'static str) -> impl FnOnce(E) -> Error
where
    E: Into<Box<dyn StdError + Send + Sync>>,
{
    move |e| Error::External {
        stage,
        source: e.into(),
    }
}

/// Runs the stages of one experiment, handing artifacts over in-process
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    experiment: Experiment,
    resolver: FilenameResolver,
    handover: Handover,
}

impl Pipeline {
    /// Validate the config and create the experiment directory
    ///
    /// With `save_config` set, the config is also written to the experiment
    /// directory with the experiment name filled in, so that loading it
    /// again reruns into the same experiment.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let experiment = config.experiment();
        experiment.create()?;

        if config.save_config {
            let saved = PipelineConfig {
                experiment_name: Some(experiment.name().to_string()),
                ..config.clone()
            };
            saved.save(&experiment.config_path())?;
            info!(path = %experiment.config_path().display(), "Saved config");
        }

        let resolver = FilenameResolver::new(&config.dataset, experiment.dir());

        info!(dataset = %config.dataset, experiment = %experiment.name(), "Starting pipeline");
        Ok(Self {
            config,
            experiment,
            resolver,
            handover: Handover::new(),
        })
    }

    /// The configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The experiment this pipeline writes to
    pub fn experiment(&self) -> &Experiment {
        &self.experiment
    }

    /// Resolver for the experiment directory
    pub fn resolver(&self) -> &FilenameResolver {
        &self.resolver
    }

    /// Artifacts handed over so far
    pub fn handover(&self) -> &Handover {
        &self.handover
    }

    /// Mutable access to the handover
    pub fn handover_mut(&mut self) -> &mut Handover {
        &mut self.handover
    }

    /// Load the raw data, fit and apply the metatransformer, persist
    pub fn run_dataloader(&mut self) -> Result<DataloaderPaths> {
        let io = DataloaderIo::new(&self.resolver, &self.config.dataloader);
        let inputs = io.load_inputs()?;
        let outputs = io.transform(inputs)?;
        io.persist(outputs, &mut self.handover)
    }

    /// Train and sample with `step`, revert the samples, persist
    pub fn run_model<F, E>(&mut self, step: F) -> Result<ModelPaths>
    where
        F: FnOnce(&ModelInputs) -> std::result::Result<ModelRun, E>,
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        let io = ModelIo::new(&self.resolver, &self.config.model);
        let inputs = io.load_inputs(&self.handover)?;
        let run = step(&inputs).map_err(external("model"))?;
        let outputs = io.finish(&inputs, run)?;
        io.persist(outputs, &mut self.handover)
    }

    /// Evaluate with `step`, persist the bundle
    pub fn run_evaluation<F, E>(&mut self, step: F) -> Result<PathBuf>
    where
        F: FnOnce(&EvaluationInputs) -> std::result::Result<EvaluationBundle, E>,
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        let io = EvaluationIo::new(&self.resolver, &self.config.evaluation);
        let inputs = io.load_inputs(&self.handover)?;
        let bundle = step(&inputs).map_err(external("evaluation"))?;
        io.persist(bundle, &mut self.handover)
    }

    /// Render plots with `step`, persist them
    pub fn run_plotting<F, E>(&mut self, step: F) -> Result<Vec<PathBuf>>
    where
        F: FnOnce(&PlottingInputs) -> std::result::Result<Vec<Plot>, E>,
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        let io = PlottingIo::new(&self.resolver, &self.config.plotting);
        let inputs = io.load_inputs(&self.handover)?;
        let plots = step(&inputs).map_err(external("plotting"))?;
        io.persist(&plots)
    }
}
