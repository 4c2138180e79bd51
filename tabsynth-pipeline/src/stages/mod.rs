//! Input and output handling for each pipeline stage
//!
//! Every stage moves through the same phases:
//!
//! 1. `InputResolution`: take the inputs from the handover if it holds all of
//!    them, otherwise resolve their filenames and check they all exist
//! 2. `Load`: read the resolved artifacts from the experiment directory
//! 3. `Work`: the stage's own processing
//! 4. `OutputResolution`: resolve output filenames
//! 5. `Persist`: write each output atomically and record it in the handover

use std::fmt;

use tracing::debug;

pub mod dataloader;
pub mod evaluation;
pub mod model;
pub mod plotting;

pub use dataloader::{DataloaderInputs, DataloaderIo, DataloaderOutputs, DataloaderPaths};
pub use evaluation::{EvaluationInputs, EvaluationIo};
pub use model::{ModelInputs, ModelIo, ModelOutputs, ModelPaths, ModelRun};
pub use plotting::{PlottingInputs, PlottingIo};

/// Phase of a stage run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StagePhase {
    /// Deciding where the inputs come from
    InputResolution,
    /// Reading inputs from disk
    Load,
    /// Stage-specific processing
    Work,
    /// Deciding where the outputs go
    OutputResolution,
    /// Writing outputs
    Persist,
}

impl fmt::Display for StagePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StagePhase::InputResolution => "input_resolution",
            StagePhase::Load => "load",
            StagePhase::Work => "work",
            StagePhase::OutputResolution => "output_resolution",
            StagePhase::Persist => "persist",
        };
        write!(f, "{name}")
    }
}

/// Where a stage's inputs came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    /// Handed over in-process by an earlier stage
    Handover,
    /// Loaded from the experiment directory
    Disk,
}

/// Log entry into a phase
pub fn enter(stage: &'static str, phase: StagePhase) {
    debug!(stage, phase = %phase, "Entering stage phase");
}
