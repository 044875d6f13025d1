//! Persisting inputs that triggered unexpected failures or differential
//! divergences.
//!
//! When an artifact directory is configured, each finding writes two files
//! named after the operator and the Blake3 hash of the input. Divergences
//! carry a `diff-` prefix so they never overwrite a failure for the same input:
//!
//! ```text
//! bias_add-3f2a9c0d11e4b7a8.bin       raw fuzz input
//! bias_add-3f2a9c0d11e4b7a8.json      ArtifactRecord
//! diff-add-91c07e2b5d4a3f10.bin       input whose output left the reference
//! diff-add-91c07e2b5d4a3f10.json
//! ```
//!
//! Identical inputs map to the same file names, so repeated findings do not
//! grow the directory.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::FailureKind;

/// Number of hex characters of the input hash used in file names.
const HASH_PREFIX_LEN: usize = 16;

/// Why an input was saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    ExpectedOperationFailure,
    UnexpectedFailure,
    /// Output disagreed with a reference computation; the input was kept.
    Divergence,
}

impl ArtifactKind {
    fn file_prefix(self) -> &'static str {
        match self {
            ArtifactKind::Divergence => "diff-",
            _ => "",
        }
    }
}

impl From<FailureKind> for ArtifactKind {
    fn from(kind: FailureKind) -> Self {
        match kind {
            FailureKind::ExpectedOperationFailure => ArtifactKind::ExpectedOperationFailure,
            FailureKind::UnexpectedFailure => ArtifactKind::UnexpectedFailure,
        }
    }
}

/// Metadata written next to every saved input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    /// Harness name
    pub op: String,
    /// Length of the raw input in bytes
    pub input_len: usize,
    /// Blake3 hash of the raw input (hex)
    pub blake3: String,
    pub kind: ArtifactKind,
    /// Rendered failure or divergence message
    pub message: String,
    /// Seconds since the Unix epoch when the record was written
    pub unix_time: u64,
}

/// Writes artifacts into a directory.
#[derive(Debug, Clone)]
pub struct ArtifactSink {
    dir: PathBuf,
}

impl ArtifactSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save `data` and its record. Returns the path of the `.bin` file.
    pub fn record(
        &self,
        op: &str,
        data: &[u8],
        kind: impl Into<ArtifactKind>,
        message: &str,
    ) -> io::Result<PathBuf> {
        let kind = kind.into();
        fs::create_dir_all(&self.dir)?;

        let hash = blake3::hash(data).to_hex().to_string();
        let stem = format!(
            "{}{}-{}",
            kind.file_prefix(),
            sanitize_filename(op),
            &hash[..HASH_PREFIX_LEN]
        );

        let bin_path = self.dir.join(format!("{stem}.bin"));
        fs::write(&bin_path, data)?;

        let unix_time =
            SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
        let record = ArtifactRecord {
            op: op.to_string(),
            input_len: data.len(),
            blake3: hash,
            kind,
            message: message.to_string(),
            unix_time,
        };
        let json = serde_json::to_string_pretty(&record).map_err(io::Error::other)?;
        fs::write(self.dir.join(format!("{stem}.json")), json)?;

        Ok(bin_path)
    }
}

/// Replace path separators so operator names are safe file name components.
fn sanitize_filename(name: &str) -> String {
    name.replace(['/', '\\', '.'], "_")
}
