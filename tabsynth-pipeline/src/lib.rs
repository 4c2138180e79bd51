//! Stage IO and artifact handover for tabsynth experiments
//!
//! This crate resolves the filenames every stage reads and writes, loads raw
//! CSV data into typed frames, and moves artifacts between the dataloader,
//! model, evaluation and plotting stages, either in-process through a
//! [`Handover`] or through files in an experiment directory.

#![warn(missing_docs)]

mod error;

pub mod artifacts;
pub mod config;
pub mod csv;
pub mod experiment;
pub mod filenames;
pub mod handover;
pub mod logging;
pub mod pipeline;
pub mod stages;

pub use artifacts::{EvaluationBundle, Plot, SyntheticDataset, SyntheticDatasets, TrainedModel};
pub use config::{
    DataloaderOptions, EvaluationOptions, ModelOptions, PipelineConfig, PlottingOptions,
};
pub use error::{Error, Result};
pub use experiment::Experiment;
pub use filenames::{FilenameArg, FilenameResolver};
pub use handover::{ArtifactName, Handover, HandoverValue};
pub use pipeline::Pipeline;
pub use stages::{InputSource, StagePhase};

// Re-export core types
pub use tabsynth_core::{ArtifactKind, DataFrame};
pub use tabsynth_transforms::{DatasetMetadata, MetaTransformer};
