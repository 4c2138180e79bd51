//! Pipeline configuration
//!
//! Loaded from YAML. Every field has a default, so a config file only needs
//! to name the dataset.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tabsynth_core::write_atomic;
use tabsynth_transforms::MetaTransformerConfig;

use crate::error::{Error, Result};
use crate::experiment::{default_experiment_name, Experiment, DEFAULT_EXPERIMENTS_DIR};
use crate::filenames::FilenameArg;

/// Options for the dataloader stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataloaderOptions {
    /// Directory holding the raw dataset and its metadata
    pub data_dir: PathBuf,
    /// Treat the first CSV column as an index and drop it
    pub index_col: bool,
    /// Permit pass-through transformers
    pub allow_null_transformers: bool,
    /// Write the metadata as declared, without the settings that were inferred
    pub write_declared_metadata: bool,
    /// Metadata file, read from the data directory and written to the experiment
    pub metadata: FilenameArg,
    /// Typed data output
    pub typed: FilenameArg,
    /// Transformed data output
    pub transformed: FilenameArg,
    /// Metatransformer output
    pub metatransformer: FilenameArg,
}

impl Default for DataloaderOptions {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            index_col: false,
            allow_null_transformers: false,
            write_declared_metadata: false,
            metadata: FilenameArg::suffix("_metadata"),
            typed: FilenameArg::suffix("_typed"),
            transformed: FilenameArg::suffix("_transformed"),
            metatransformer: FilenameArg::suffix("_metatransformer"),
        }
    }
}

impl DataloaderOptions {
    /// Options for fitting the metatransformer
    pub fn metatransformer_config(&self) -> MetaTransformerConfig {
        MetaTransformerConfig {
            allow_null_transformers: self.allow_null_transformers,
        }
    }
}

/// Options for the model stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOptions {
    /// Transformed data input
    pub prepared: FilenameArg,
    /// Metatransformer input
    pub metatransformer: FilenameArg,
    /// Synthetic datasets output
    pub synthetic_datasets: FilenameArg,
    /// Trained model output, `.pt` unless given otherwise
    pub model_file: FilenameArg,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            prepared: FilenameArg::suffix("_transformed"),
            metatransformer: FilenameArg::suffix("_metatransformer"),
            synthetic_datasets: FilenameArg::suffix("_synthetic_datasets"),
            model_file: FilenameArg::suffix("_model"),
        }
    }
}

/// Options for the evaluation stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationOptions {
    /// Typed data input
    pub typed: FilenameArg,
    /// Synthetic datasets input
    pub synthetic_datasets: FilenameArg,
    /// Evaluation bundle output
    pub evaluations: FilenameArg,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            typed: FilenameArg::suffix("_typed"),
            synthetic_datasets: FilenameArg::suffix("_synthetic_datasets"),
            evaluations: FilenameArg::suffix("_evaluations"),
        }
    }
}

/// Options for the plotting stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlottingOptions {
    /// Typed data input
    pub typed: FilenameArg,
    /// Evaluation bundle input
    pub evaluations: FilenameArg,
}

impl Default for PlottingOptions {
    fn default() -> Self {
        Self {
            typed: FilenameArg::suffix("_typed"),
            evaluations: FilenameArg::suffix("_evaluations"),
        }
    }
}

/// Configuration of a whole pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Dataset name; the raw file is `<data_dir>/<dataset>.csv`
    pub dataset: String,
    /// Experiment name; a timestamp when absent
    pub experiment_name: Option<String>,
    /// Directory holding all experiments
    pub experiments_dir: PathBuf,
    /// Save a copy of this config in the experiment directory
    pub save_config: bool,
    /// Dataloader options
    pub dataloader: DataloaderOptions,
    /// Model options
    pub model: ModelOptions,
    /// Evaluation options
    pub evaluation: EvaluationOptions,
    /// Plotting options
    pub plotting: PlottingOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dataset: String::new(),
            experiment_name: None,
            experiments_dir: PathBuf::from(DEFAULT_EXPERIMENTS_DIR),
            save_config: false,
            dataloader: DataloaderOptions::default(),
            model: ModelOptions::default(),
            evaluation: EvaluationOptions::default(),
            plotting: PlottingOptions::default(),
        }
    }
}

impl PipelineConfig {
    /// A default config for `dataset`
    pub fn for_dataset(dataset: &str) -> Self {
        Self {
            dataset: dataset.to_string(),
            ..Self::default()
        }
    }

    /// Parse a YAML config
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML config file
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_yaml(&fs::read_to_string(path)?)
    }

    /// Serialize as YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Write as YAML, atomically
    pub fn save(&self, path: &Path) -> Result<()> {
        write_atomic(path, self.to_yaml()?.as_bytes())?;
        Ok(())
    }

    /// Check the settings that have no usable default
    pub fn validate(&self) -> Result<()> {
        if self.dataset.trim().is_empty() {
            return Err(Error::Config("a dataset name is required".into()));
        }
        if self.experiment_name.as_deref().is_some_and(|name| name.contains(['/', '\\'])) {
            return Err(Error::Config(
                "the experiment name must not contain path separators".into(),
            ));
        }
        Ok(())
    }

    /// The experiment this config runs in, naming it now if no name was given
    pub fn experiment(&self) -> Experiment {
        let name = self.experiment_name.clone().unwrap_or_else(default_experiment_name);
        Experiment::new(&self.experiments_dir, &name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_yaml_uses_defaults() {
        let config = PipelineConfig::from_yaml("dataset: patients\n").unwrap();
        assert_eq!(config.dataset, "patients");
        assert_eq!(config.experiments_dir, PathBuf::from("experiments"));
        assert_eq!(config.dataloader.data_dir, PathBuf::from("./data"));
        assert_eq!(config.model.model_file, FilenameArg::DerivedSuffix("_model".into()));
    }

    #[test]
    fn test_overrides() {
        let yaml = "
dataset: patients
experiment_name: baseline
dataloader:
  index_col: true
  allow_null_transformers: true
  typed: cohort.pkl
evaluation:
  evaluations: _scores
";
        let config = PipelineConfig::from_yaml(yaml).unwrap();
        assert!(config.dataloader.index_col);
        assert!(config.dataloader.metatransformer_config().allow_null_transformers);
        assert_eq!(config.dataloader.typed, FilenameArg::Explicit("cohort.pkl".into()));
        assert_eq!(config.evaluation.evaluations, FilenameArg::DerivedSuffix("_scores".into()));
        assert_eq!(config.experiment().name(), "baseline");
        assert_eq!(config.experiment().dir(), Path::new("experiments/baseline"));
    }

    #[test]
    fn test_dataset_is_required() {
        assert!(matches!(PipelineConfig::from_yaml("experiment_name: x\n"), Err(Error::Config(_))));
    }

    #[test]
    fn test_saved_config_reloads() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        let mut config = PipelineConfig::for_dataset("patients");
        config.save_config = true;
        config.dataloader.write_declared_metadata = true;

        config.save(&path).unwrap();
        assert_eq!(PipelineConfig::load(&path).unwrap(), config);
    }
}
