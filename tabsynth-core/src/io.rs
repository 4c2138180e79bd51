//! Versioned artifact files and atomic writes
//!
//! Every persisted artifact starts with a small header naming the format and
//! the kind of payload, so loading the wrong file fails immediately instead
//! of deep inside a later stage.

use std::fmt;
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Error, Result};

/// Magic bytes opening every artifact file
pub const MAGIC: [u8; 4] = *b"TSYN";

/// Current artifact format version
pub const FORMAT_VERSION: u32 = 1;

/// What an artifact file contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// Raw data after typing
    TypedData,
    /// Typed data after the MetaTransformer was applied
    TransformedData,
    /// A fitted MetaTransformer
    MetaTransformer,
    /// A trained generative model
    TrainedModel,
    /// Synthetic datasets sampled from trained models
    SyntheticDatasets,
    /// Evaluation results
    EvaluationBundle,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKind::TypedData => "typed data",
            ArtifactKind::TransformedData => "transformed data",
            ArtifactKind::MetaTransformer => "metatransformer",
            ArtifactKind::TrainedModel => "trained model",
            ArtifactKind::SyntheticDatasets => "synthetic datasets",
            ArtifactKind::EvaluationBundle => "evaluation bundle",
        };
        write!(f, "{name}")
    }
}

/// Header written ahead of every artifact payload
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ArtifactHeader {
    magic: [u8; 4],
    format_version: u32,
    kind: ArtifactKind,
}

/// Serialize `value` as an artifact of the given kind
pub fn encode_artifact<T: Serialize>(kind: ArtifactKind, value: &T) -> Result<Vec<u8>> {
    let header = ArtifactHeader {
        magic: MAGIC,
        format_version: FORMAT_VERSION,
        kind,
    };

    let mut bytes = bincode::serialize(&header)?;
    bincode::serialize_into(&mut bytes, value)?;
    Ok(bytes)
}

/// Deserialize an artifact of the given kind; `path` is only used for error reporting
pub fn decode_artifact<T: DeserializeOwned>(
    kind: ArtifactKind,
    bytes: &[u8],
    path: &Path,
) -> Result<T> {
    let failure = |reason: String| Error::Deserialization {
        path: path.to_path_buf(),
        reason,
    };

    let mut cursor = Cursor::new(bytes);
    let header: ArtifactHeader = bincode::deserialize_from(&mut cursor)
        .map_err(|e| failure(format!("unreadable artifact header: {e}")))?;

    if header.magic != MAGIC {
        return Err(failure("not a tabsynth artifact".into()));
    }
    if header.format_version != FORMAT_VERSION {
        return Err(failure(format!(
            "artifact format version {} is not supported (expected {FORMAT_VERSION})",
            header.format_version
        )));
    }
    if header.kind != kind {
        return Err(failure(format!("expected {kind}, found {}", header.kind)));
    }

    let value = bincode::deserialize_from(&mut cursor)
        .map_err(|e| failure(format!("corrupt {kind} payload: {e}")))?;

    let consumed = usize::try_from(cursor.position()).unwrap_or(usize::MAX);
    if consumed != bytes.len() {
        return Err(failure(format!(
            "{} trailing bytes after {kind} payload",
            bytes.len().saturating_sub(consumed)
        )));
    }

    Ok(value)
}

/// Write `bytes` to `path` so that readers see either the old file or the complete new one
///
/// The data goes to a temporary file in the same directory, which is synced
/// and then renamed over the target. On failure the temporary file is removed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    debug!(path = %path.display(), bytes = bytes.len(), "Wrote artifact");
    Ok(())
}

/// Persist an artifact atomically
pub fn save_artifact<T: Serialize>(path: &Path, kind: ArtifactKind, value: &T) -> Result<()> {
    let bytes = encode_artifact(kind, value)?;
    write_atomic(path, &bytes)
}

/// Load an artifact, checking its header against the expected kind
pub fn load_artifact<T: DeserializeOwned>(path: &Path, kind: ArtifactKind) -> Result<T> {
    let bytes = fs::read(path)?;
    debug!(path = %path.display(), bytes = bytes.len(), %kind, "Loading artifact");
    decode_artifact(kind, &bytes, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Payload {
        name: String,
        values: Vec<f64>,
    }

    fn payload() -> Payload {
        Payload {
            name: "bundle".into(),
            values: vec![0.25, 0.5],
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("patients_evaluations.pkl");

        save_artifact(&path, ArtifactKind::EvaluationBundle, &payload()).unwrap();
        let loaded: Payload = load_artifact(&path, ArtifactKind::EvaluationBundle).unwrap();
        assert_eq!(loaded, payload());
    }

    #[test]
    fn test_wrong_kind_fails_fast() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("patients_typed.pkl");
        save_artifact(&path, ArtifactKind::TypedData, &payload()).unwrap();

        let err = load_artifact::<Payload>(&path, ArtifactKind::MetaTransformer).unwrap_err();
        match err {
            Error::Deserialization { path: p, reason } => {
                assert_eq!(p, path);
                assert!(reason.contains("expected metatransformer"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_foreign_bytes_are_rejected() {
        let path = Path::new("foreign.pkl");
        let err =
            decode_artifact::<Payload>(ArtifactKind::TypedData, b"\x80\x04\x95 pickled", path);
        assert!(matches!(err, Err(Error::Deserialization { .. })));
    }

    #[test]
    fn test_version_mismatch_is_rejected() {
        let header = ArtifactHeader {
            magic: MAGIC,
            format_version: FORMAT_VERSION + 1,
            kind: ArtifactKind::TypedData,
        };
        let mut bytes = bincode::serialize(&header).unwrap();
        bincode::serialize_into(&mut bytes, &payload()).unwrap();

        let err = decode_artifact::<Payload>(ArtifactKind::TypedData, &bytes, Path::new("x.pkl"));
        assert!(matches!(err, Err(Error::Deserialization { .. })));
    }

    #[test]
    fn test_atomic_write_replaces_and_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.pkl");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_atomic_write_creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("experiments").join("run").join("a.pkl");
        write_atomic(&path, b"x").unwrap();
        assert!(path.exists());
    }
}
