//! Replay saved inputs through a harness.

use anyhow::{bail, Context, Result};
use clap::Parser;
use opfuzz_common::{HarnessConfig, Verdict};
use opfuzz_harness::{execute_with, OperatorHarness};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::exit::{EXIT_DISCARDED, EXIT_SUCCESS};

/// Run saved inputs through one harness
#[derive(Debug, Parser)]
pub struct ReplayCommand {
    /// Harness name (see `opfuzz list`)
    #[arg(long, value_name = "NAME")]
    pub op: String,

    /// Input files or corpus directories
    #[arg(required = true, value_name = "PATH")]
    pub inputs: Vec<PathBuf>,

    /// Emit a JSON report on stdout
    #[arg(long)]
    pub json: bool,
}

/// Outcome of one replayed input.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayEntry {
    pub path: PathBuf,
    pub len: usize,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub op: &'static str,
    pub kept: usize,
    pub discarded: usize,
    pub entries: Vec<ReplayEntry>,
}

impl ReplayCommand {
    pub fn execute(self, config: &HarnessConfig) -> Result<i32> {
        let harness = super::select(std::slice::from_ref(&self.op))?[0];
        let files = collect_inputs(&self.inputs)?;
        if files.is_empty() {
            bail!("no input files found");
        }
        info!(op = harness.name(), files = files.len(), "replaying");

        let report = replay(harness, &files, config)?;
        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            for entry in report.entries.iter().filter(|e| e.verdict == Verdict::Discard) {
                println!("discard  {}", entry.path.display());
            }
            println!("{}: {} kept, {} discarded", report.op, report.kept, report.discarded);
        }

        Ok(if report.discarded > 0 { EXIT_DISCARDED } else { EXIT_SUCCESS })
    }
}

pub fn replay(
    harness: &dyn OperatorHarness,
    files: &[PathBuf],
    config: &HarnessConfig,
) -> Result<ReplayReport> {
    let mut entries = Vec::with_capacity(files.len());
    for path in files {
        let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let verdict = execute_with(harness, &data, config);
        debug!(path = %path.display(), len = data.len(), %verdict, "replayed");
        entries.push(ReplayEntry { path: path.clone(), len: data.len(), verdict });
    }
    let discarded = entries.iter().filter(|e| e.verdict == Verdict::Discard).count();
    Ok(ReplayReport { op: harness.name(), kept: entries.len() - discarded, discarded, entries })
}

/// Expand directories (recursively) into their files, sorted by path.
/// Artifact metadata sidecars (`*.json`) are skipped.
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        visit(path, &mut files)?;
    }
    files.sort();
    Ok(files)
}

fn visit(path: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let meta =
        fs::metadata(path).with_context(|| format!("Failed to stat {}", path.display()))?;
    if meta.is_file() {
        if path.extension().is_some_and(|ext| ext == "json") {
            return Ok(());
        }
        files.push(path.to_path_buf());
        return Ok(());
    }
    let entries =
        fs::read_dir(path).with_context(|| format!("Failed to list {}", path.display()))?;
    for entry in entries {
        visit(&entry?.path(), files)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use opfuzz_harness::registry;

    #[test]
    fn collects_nested_files_and_skips_sidecars() {
        let dir = tempfile::TempDir::new().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        fs::write(dir.path().join("b.bin"), [1u8]).unwrap();
        fs::write(nested.join("a.bin"), [2u8]).unwrap();
        fs::write(dir.path().join("b.json"), "{}").unwrap();

        let files = collect_inputs(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(files, vec![dir.path().join("b.bin"), nested.join("a.bin")]);
    }

    #[test]
    fn missing_path_is_an_error() {
        let err = collect_inputs(&[PathBuf::from("/definitely/not/here")]).unwrap_err();
        assert!(err.to_string().contains("Failed to stat"));
    }

    #[test]
    fn replay_counts_verdicts() {
        let dir = tempfile::TempDir::new().unwrap();
        let empty = dir.path().join("empty");
        let zeros = dir.path().join("zeros");
        fs::write(&empty, [0u8; 0]).unwrap();
        fs::write(&zeros, [0u8; 32]).unwrap();

        let harness = registry::find("softmax").unwrap();
        let report = replay(harness, &[empty, zeros], &HarnessConfig::default()).unwrap();
        assert_eq!(report.op, "softmax");
        assert_eq!(report.kept, 2);
        assert_eq!(report.discarded, 0);
        assert_eq!(report.entries[0].len, 0);
    }
}
