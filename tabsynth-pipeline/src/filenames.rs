//! Filename resolution for stage inputs and outputs
//!
//! Every artifact filename is either given explicitly or derived from the
//! dataset name with a suffix such as `_typed`. Resolution always runs in the
//! same order: the suffix is attached to the dataset stem first and the
//! extension is normalized second. Names are interpreted relative to the
//! experiment directory.

use std::convert::Infallible;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tabsynth_core::Error as CoreError;
use tracing::warn;

use crate::error::Result;

/// Extensions that are left alone by [`consistent_ending`]
pub const RECOGNIZED_EXTENSIONS: &[&str] = &[
    ".pkl", ".pt", ".csv", ".yaml", ".yml", ".json", ".bin", ".png", ".html",
];

/// Extension appended to names that have none
pub const DEFAULT_EXTENSION: &str = ".pkl";

/// A filename argument as supplied on the command line or in a config file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FilenameArg {
    /// Used verbatim apart from extension normalization
    Explicit(String),
    /// Appended to the dataset stem, e.g. `_typed`
    DerivedSuffix(String),
}

impl FilenameArg {
    /// Interpret a raw argument; a leading underscore marks a suffix
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with('_') {
            FilenameArg::DerivedSuffix(raw.to_string())
        } else {
            FilenameArg::Explicit(raw.to_string())
        }
    }

    /// A suffix argument, adding the leading underscore when missing
    pub fn suffix(suffix: &str) -> Self {
        if suffix.starts_with('_') {
            FilenameArg::DerivedSuffix(suffix.to_string())
        } else {
            FilenameArg::DerivedSuffix(format!("_{suffix}"))
        }
    }

    /// The raw text of the argument
    pub fn as_str(&self) -> &str {
        match self {
            FilenameArg::Explicit(name) | FilenameArg::DerivedSuffix(name) => name,
        }
    }
}

impl FromStr for FilenameArg {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for FilenameArg {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<FilenameArg> for String {
    fn from(arg: FilenameArg) -> Self {
        match arg {
            FilenameArg::Explicit(name) | FilenameArg::DerivedSuffix(name) => name,
        }
    }
}

impl fmt::Display for FilenameArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `name` without `ext`, compared ignoring ASCII case
fn strip_extension<'a>(name: &'a str, ext: &str) -> Option<&'a str> {
    let split = name.len().checked_sub(ext.len())?;
    let tail = name.get(split..)?;
    tail.eq_ignore_ascii_case(ext).then(|| &name[..split])
}

/// Whether `name` already ends in one of the [`RECOGNIZED_EXTENSIONS`], in any case
pub fn has_recognized_extension(name: &str) -> bool {
    RECOGNIZED_EXTENSIONS.iter().any(|ext| strip_extension(name, ext).is_some())
}

/// Append `default_ext` unless `name` already has a recognized extension
pub fn consistent_ending(name: &str, default_ext: &str) -> String {
    if has_recognized_extension(name) {
        name.to_string()
    } else {
        format!("{name}{default_ext}")
    }
}

/// Dataset name without a recognized extension
pub fn dataset_stem(dataset_name: &str) -> &str {
    RECOGNIZED_EXTENSIONS
        .iter()
        .find_map(|ext| strip_extension(dataset_name, ext))
        .unwrap_or(dataset_name)
}

/// Attach a suffix argument to the dataset stem; explicit names pass through
pub fn potential_suffix(arg: &FilenameArg, dataset_name: &str) -> String {
    match arg {
        FilenameArg::Explicit(name) => name.clone(),
        FilenameArg::DerivedSuffix(suffix) => format!("{}{suffix}", dataset_stem(dataset_name)),
    }
}

fn is_bare_filename(name: &str) -> bool {
    let path = Path::new(name);
    !path.is_absolute() && path.components().count() <= 1
}

/// Warn about names that look like paths rather than bare filenames
///
/// Returns the offending names. Never fails.
pub fn warn_if_path_supplied(names: &[&str], experiment_dir: &Path) -> Vec<String> {
    let offending: Vec<String> = names
        .iter()
        .filter(|name| !is_bare_filename(name))
        .map(|name| (*name).to_string())
        .collect();

    for name in &offending {
        warn!(
            filename = %name,
            experiment_dir = %experiment_dir.display(),
            "Filename looks like a path; it is taken relative to the experiment directory"
        );
    }
    offending
}

/// Check that every name exists in the experiment directory
///
/// All names are checked before failing, and the error lists every absent
/// file in input order.
pub fn check_exists(names: &[&str], experiment_dir: &Path) -> Result<()> {
    let missing: Vec<PathBuf> = names
        .iter()
        .map(|name| experiment_dir.join(name))
        .filter(|path| !path.exists())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CoreError::MissingArtifact { files: missing }.into())
    }
}

/// Resolves filename arguments for one dataset and experiment directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameResolver {
    dataset_name: String,
    experiment_dir: PathBuf,
}

impl FilenameResolver {
    /// Create a resolver
    pub fn new(dataset_name: &str, experiment_dir: &Path) -> Self {
        Self {
            dataset_name: dataset_name.to_string(),
            experiment_dir: experiment_dir.to_path_buf(),
        }
    }

    /// The dataset name as given
    pub fn dataset_name(&self) -> &str {
        &self.dataset_name
    }

    /// The dataset name without extension
    pub fn dataset_stem(&self) -> &str {
        dataset_stem(&self.dataset_name)
    }

    /// Directory all names are relative to
    pub fn experiment_dir(&self) -> &Path {
        &self.experiment_dir
    }

    /// Final filename for one argument
    pub fn resolve(&self, arg: &FilenameArg, default_ext: &str) -> String {
        consistent_ending(&potential_suffix(arg, &self.dataset_name), default_ext)
    }

    /// Location of a resolved filename
    pub fn path(&self, filename: &str) -> PathBuf {
        self.experiment_dir.join(filename)
    }

    /// Resolve stage outputs, warning on path-like names
    pub fn resolve_outputs(&self, args: &[(&FilenameArg, &str)]) -> Vec<PathBuf> {
        let names = self.resolve_all(args);
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        warn_if_path_supplied(&refs, &self.experiment_dir);
        names.iter().map(|name| self.path(name)).collect()
    }

    /// Resolve stage inputs and check that every one of them exists
    pub fn resolve_inputs(&self, args: &[(&FilenameArg, &str)]) -> Result<Vec<PathBuf>> {
        let names = self.resolve_all(args);
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        warn_if_path_supplied(&refs, &self.experiment_dir);
        check_exists(&refs, &self.experiment_dir)?;
        Ok(names.iter().map(|name| self.path(name)).collect())
    }

    fn resolve_all(&self, args: &[(&FilenameArg, &str)]) -> Vec<String> {
        args.iter().map(|(arg, ext)| self.resolve(arg, ext)).collect()
    }
}
