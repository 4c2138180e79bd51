//! Experiment directories
//!
//! All artifacts of one run live under `<experiments_dir>/<experiment_name>/`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::info;

use crate::error::Result;

/// Root directory holding all experiments
pub const DEFAULT_EXPERIMENTS_DIR: &str = "experiments";

/// File name of the config copy written into an experiment
pub const CONFIG_FILENAME: &str = "config.yaml";

/// chrono format of the default experiment name
pub const EXPERIMENT_NAME_FORMAT: &str = "%Y_%m_%d___%H_%M_%S";

/// Experiment name derived from the current local time
pub fn default_experiment_name() -> String {
    Local::now().format(EXPERIMENT_NAME_FORMAT).to_string()
}

/// A named experiment and its directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Experiment {
    name: String,
    dir: PathBuf,
}

impl Experiment {
    /// The experiment `name` under `experiments_dir`
    pub fn new(experiments_dir: &Path, name: &str) -> Self {
        Self {
            name: name.to_string(),
            dir: experiments_dir.join(name),
        }
    }

    /// Experiment name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory of the experiment
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where a copy of the run's config is saved
    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILENAME)
    }

    /// Create the directory if needed
    pub fn create(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
            info!(
                experiment = %self.name,
                dir = %self.dir.display(),
                "Created experiment directory"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use tempfile::TempDir;

    #[test]
    fn test_default_name_follows_format() {
        let name = default_experiment_name();
        assert!(NaiveDateTime::parse_from_str(&name, EXPERIMENT_NAME_FORMAT).is_ok());
        assert_eq!(name.len(), "2024_01_31___09_05_00".len());
    }

    #[test]
    fn test_create() {
        let root = TempDir::new().unwrap();
        let experiment = Experiment::new(root.path(), "run");
        assert_eq!(experiment.dir(), root.path().join("run"));
        assert_eq!(experiment.config_path(), root.path().join("run/config.yaml"));

        experiment.create().unwrap();
        experiment.create().unwrap();
        assert!(experiment.dir().is_dir());
    }
}
