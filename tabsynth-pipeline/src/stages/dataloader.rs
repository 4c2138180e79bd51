//! Dataloader stage: raw CSV in, typed and transformed data out
//!
//! Inputs are read from the data directory rather than the experiment
//! directory: `<data_dir>/<dataset>.csv` and, if present, the metadata file
//! next to it. This is the only stage that fits a [`MetaTransformer`].

use std::fs;
use std::path::{Path, PathBuf};

use tabsynth_core::{save_artifact, write_atomic, ArtifactKind, DataFrame};
use tabsynth_transforms::{DatasetMetadata, MetaTransformer};
use tracing::info;

use crate::config::DataloaderOptions;
use crate::csv::{CsvReader, CsvReaderOptions};
use crate::error::Result;
use crate::filenames::{FilenameArg, FilenameResolver, DEFAULT_EXTENSION};
use crate::handover::{ArtifactName, Handover, HandoverValue};

use super::{enter, StagePhase};

const STAGE: &str = "dataloader";

/// Read dataset metadata from YAML
pub fn read_metadata(path: &Path) -> Result<DatasetMetadata> {
    Ok(serde_yaml::from_str(&fs::read_to_string(path)?)?)
}

/// Write dataset metadata as YAML, atomically
pub fn write_metadata(path: &Path, metadata: &DatasetMetadata) -> Result<()> {
    let yaml = serde_yaml::to_string(metadata)?;
    write_atomic(path, yaml.as_bytes())?;
    Ok(())
}

/// What the dataloader reads
#[derive(Debug, Clone)]
pub struct DataloaderInputs {
    /// Dataset name
    pub dataset: String,
    /// The raw data after typing
    pub typed: DataFrame,
    /// Declared metadata, empty when no metadata file exists
    pub metadata: DatasetMetadata,
}

/// What the dataloader produces
#[derive(Debug, Clone)]
pub struct DataloaderOutputs {
    /// Dataset name
    pub dataset: String,
    /// Typed data
    pub typed: DataFrame,
    /// Typed data after the metatransformer
    pub transformed: DataFrame,
    /// The fitted metatransformer
    pub metatransformer: MetaTransformer,
    /// Metadata to write next to the artifacts
    pub metadata: DatasetMetadata,
}

/// Where the dataloader outputs were written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataloaderPaths {
    /// Typed data
    pub typed: PathBuf,
    /// Transformed data
    pub transformed: PathBuf,
    /// Metatransformer
    pub metatransformer: PathBuf,
    /// Metadata YAML
    pub metadata: PathBuf,
}

/// Stage IO for the dataloader
#[derive(Debug, Clone, Copy)]
pub struct DataloaderIo<'a> {
    resolver: &'a FilenameResolver,
    options: &'a DataloaderOptions,
}

impl<'a> DataloaderIo<'a> {
    /// Create the stage IO; `resolver` resolves against the experiment directory
    pub fn new(resolver: &'a FilenameResolver, options: &'a DataloaderOptions) -> Self {
        Self { resolver, options }
    }

    fn data_resolver(&self) -> FilenameResolver {
        FilenameResolver::new(self.resolver.dataset_name(), &self.options.data_dir)
    }

    fn raw_data_arg(&self) -> FilenameArg {
        FilenameArg::Explicit(self.resolver.dataset_name().to_string())
    }

    /// Location of the raw CSV
    pub fn raw_data_path(&self) -> PathBuf {
        let data = self.data_resolver();
        data.path(&data.resolve(&self.raw_data_arg(), ".csv"))
    }

    /// Location of the optional metadata file in the data directory
    pub fn metadata_path(&self) -> PathBuf {
        let data = self.data_resolver();
        data.path(&data.resolve(&self.options.metadata, ".yaml"))
    }

    /// Resolve the raw CSV, failing if it is absent
    pub fn resolve_inputs(&self) -> Result<Vec<PathBuf>> {
        self.data_resolver().resolve_inputs(&[(&self.raw_data_arg(), ".csv")])
    }

    /// Resolve and read the raw data and its metadata
    pub fn load_inputs(&self) -> Result<DataloaderInputs> {
        enter(STAGE, StagePhase::InputResolution);
        let raw_path = self.resolve_inputs()?.remove(0);
        let metadata_path = self.metadata_path();

        enter(STAGE, StagePhase::Load);
        let metadata = if metadata_path.exists() {
            read_metadata(&metadata_path)?
        } else {
            info!(path = %metadata_path.display(), "No metadata file, inferring every column");
            DatasetMetadata::default()
        };

        let reader = CsvReader::new(CsvReaderOptions {
            index_col: self.options.index_col,
            ..CsvReaderOptions::default()
        });
        let typed = reader.read_path(&raw_path, &metadata)?;

        Ok(DataloaderInputs {
            dataset: self.resolver.dataset_name().to_string(),
            typed,
            metadata,
        })
    }

    /// Fit the metatransformer and apply it
    pub fn transform(&self, inputs: DataloaderInputs) -> Result<DataloaderOutputs> {
        enter(STAGE, StagePhase::Work);
        let metatransformer = MetaTransformer::fit(
            &inputs.typed,
            &inputs.metadata,
            self.options.metatransformer_config(),
        )?;
        let transformed = metatransformer.apply(&inputs.typed)?;

        let metadata = if self.options.write_declared_metadata {
            inputs.metadata
        } else {
            metatransformer.metadata().clone()
        };

        Ok(DataloaderOutputs {
            dataset: inputs.dataset,
            typed: inputs.typed,
            transformed,
            metatransformer,
            metadata,
        })
    }

    /// Resolve the output locations
    pub fn output_paths(&self) -> DataloaderPaths {
        enter(STAGE, StagePhase::OutputResolution);
        let mut paths = self
            .resolver
            .resolve_outputs(&[
                (&self.options.typed, DEFAULT_EXTENSION),
                (&self.options.transformed, DEFAULT_EXTENSION),
                (&self.options.metatransformer, DEFAULT_EXTENSION),
                (&self.options.metadata, ".yaml"),
            ])
            .into_iter();

        // resolve_outputs yields one path per argument
        let mut next = || paths.next().unwrap_or_default();
        DataloaderPaths {
            typed: next(),
            transformed: next(),
            metatransformer: next(),
            metadata: next(),
        }
    }

    /// Write the outputs and hand them over to the next stage
    pub fn persist(
        &self,
        outputs: DataloaderOutputs,
        handover: &mut Handover,
    ) -> Result<DataloaderPaths> {
        let paths = self.output_paths();

        enter(STAGE, StagePhase::Persist);
        save_artifact(&paths.typed, ArtifactKind::TypedData, &outputs.typed)?;
        save_artifact(&paths.transformed, ArtifactKind::TransformedData, &outputs.transformed)?;
        save_artifact(
            &paths.metatransformer,
            ArtifactKind::MetaTransformer,
            &outputs.metatransformer,
        )?;
        write_metadata(&paths.metadata, &outputs.metadata)?;

        info!(
            stage = STAGE,
            rows = outputs.typed.row_count(),
            columns = outputs.typed.column_count(),
            transformed_columns = outputs.transformed.column_count(),
            "Persisted dataloader outputs"
        );

        handover.insert(ArtifactName::Dataset, HandoverValue::Name(outputs.dataset));
        handover.insert(ArtifactName::Typed, HandoverValue::Frame(outputs.typed));
        handover.insert(
            ArtifactName::PreparedDataset,
            HandoverValue::Frame(outputs.transformed.clone()),
        );
        handover.insert(ArtifactName::Transformed, HandoverValue::Frame(outputs.transformed));
        handover.insert(
            ArtifactName::MetaTransformer,
            HandoverValue::MetaTransformer(outputs.metatransformer),
        );
        Ok(paths)
    }
}
