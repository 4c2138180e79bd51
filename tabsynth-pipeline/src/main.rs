//! tabsynth CLI - run the dataloader and inspect experiment directories

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tabsynth_pipeline::stages::{DataloaderIo, EvaluationIo, ModelIo, PlottingIo};
use tabsynth_pipeline::{logging, FilenameResolver, Pipeline, PipelineConfig};
use tracing::info;

#[derive(Parser)]
#[command(name = "tabsynth")]
#[command(version)]
#[command(about = "Reversible transformation and artifact handover for synthetic data experiments")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct Overrides {
    /// Dataset name, e.g. `patients` for `<data_dir>/patients.csv`
    #[arg(short, long)]
    dataset: Option<String>,

    /// Experiment name
    #[arg(short, long)]
    experiment_name: Option<String>,

    /// Directory holding all experiments
    #[arg(long)]
    experiments_dir: Option<PathBuf>,

    /// Directory holding the raw data
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Type the raw data, fit the metatransformer and write its artifacts
    Dataloader {
        #[command(flatten)]
        overrides: Overrides,

        /// Treat the first CSV column as an index
        #[arg(long)]
        index_col: bool,

        /// Permit pass-through transformers for unassignable columns
        #[arg(long)]
        allow_null_transformers: bool,

        /// Write the declared metadata instead of the completed metadata
        #[arg(long)]
        write_declared_metadata: bool,

        /// Save the config used for this run in the experiment directory
        #[arg(long)]
        save_config: bool,
    },

    /// Check that a stage's inputs exist in an experiment
    Check {
        #[command(flatten)]
        overrides: Overrides,

        /// Stage to check
        #[arg(value_enum)]
        stage: Stage,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Stage {
    Dataloader,
    Model,
    Evaluation,
    Plotting,
}

fn load_config(path: Option<&Path>, overrides: Overrides) -> Result<PipelineConfig> {
    let mut config = match path {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(dataset) = overrides.dataset {
        config.dataset = dataset;
    }
    if let Some(name) = overrides.experiment_name {
        config.experiment_name = Some(name);
    }
    if let Some(dir) = overrides.experiments_dir {
        config.experiments_dir = dir;
    }
    if let Some(dir) = overrides.data_dir {
        config.dataloader.data_dir = dir;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    match cli.command {
        Commands::Dataloader {
            overrides,
            index_col,
            allow_null_transformers,
            write_declared_metadata,
            save_config,
        } => {
            let mut config = load_config(cli.config.as_deref(), overrides)?;
            config.dataloader.index_col |= index_col;
            config.dataloader.allow_null_transformers |= allow_null_transformers;
            config.dataloader.write_declared_metadata |= write_declared_metadata;
            config.save_config |= save_config;

            let mut pipeline = Pipeline::new(config).context("Failed to start pipeline")?;
            let paths = pipeline.run_dataloader().context("Dataloader failed")?;

            println!("\n=== Dataloader Complete ===");
            println!("Experiment:      {}", pipeline.experiment().name());
            println!("Typed:           {}", paths.typed.display());
            println!("Transformed:     {}", paths.transformed.display());
            println!("Metatransformer: {}", paths.metatransformer.display());
            println!("Metadata:        {}", paths.metadata.display());
        }

        Commands::Check { overrides, stage } => {
            let config = load_config(cli.config.as_deref(), overrides)?;
            let Some(name) = config.experiment_name.as_deref() else {
                bail!("check needs an experiment name");
            };
            let experiment = config.experiment();
            let resolver = FilenameResolver::new(&config.dataset, experiment.dir());

            let resolved = match stage {
                Stage::Dataloader => {
                    DataloaderIo::new(&resolver, &config.dataloader).resolve_inputs()
                }
                Stage::Model => ModelIo::new(&resolver, &config.model).resolve_inputs(),
                Stage::Evaluation => {
                    EvaluationIo::new(&resolver, &config.evaluation).resolve_inputs()
                }
                Stage::Plotting => PlottingIo::new(&resolver, &config.plotting).resolve_inputs(),
            };
            let paths = resolved.with_context(|| format!("Experiment '{name}' is not ready"))?;

            info!(experiment = name, "All inputs present");
            for path in paths {
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}
