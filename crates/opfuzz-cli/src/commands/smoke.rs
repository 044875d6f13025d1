//! Deterministic sweep over every harness.
//!
//! Inputs are constant fills plus a blake3-derived byte stream per length,
//! so two runs exercise exactly the same inputs.

use anyhow::Result;
use clap::Parser;
use opfuzz_common::{progress, HarnessConfig, Verdict};
use opfuzz_harness::execute_with;
use tracing::{info, warn};

use crate::exit::{EXIT_DISCARDED, EXIT_SUCCESS};

/// Run every harness on synthetic inputs
#[derive(Debug, Parser)]
pub struct SmokeCommand {
    /// Restrict to these harnesses (repeatable)
    #[arg(long, value_name = "NAME")]
    pub op: Vec<String>,

    /// Longest input to generate
    #[arg(long, default_value_t = 64)]
    pub max_len: usize,

    /// Seed for the pseudo-random inputs
    #[arg(long, default_value = "opfuzz")]
    pub seed: String,
}

impl SmokeCommand {
    pub fn execute(self, config: &HarnessConfig) -> Result<i32> {
        let harnesses = super::select(&self.op)?;
        let inputs = synthetic_inputs(self.seed.as_bytes(), self.max_len);
        info!(harnesses = harnesses.len(), inputs = inputs.len(), "smoke sweep");

        let mut total_discarded = 0;
        for harness in harnesses {
            let discarded = inputs
                .iter()
                .filter(|data| execute_with(harness, data, config) == Verdict::Discard)
                .count();
            if discarded > 0 {
                warn!(op = harness.name(), discarded, "unexpected failures");
            }
            println!(
                "{:<14} {:>5} inputs  {:>5} discarded",
                harness.name(),
                inputs.len(),
                discarded
            );
            total_discarded += discarded;
        }
        info!(iterations = progress::iterations(), discarded = total_discarded, "smoke sweep done");

        Ok(if total_discarded > 0 { EXIT_DISCARDED } else { EXIT_SUCCESS })
    }
}

/// For each length `0..=max_len`: all `0x00`, all `0xFF`, and a seeded
/// pseudo-random stream.
pub fn synthetic_inputs(seed: &[u8], max_len: usize) -> Vec<Vec<u8>> {
    let mut inputs = Vec::with_capacity(3 * (max_len + 1));
    for len in 0..=max_len {
        inputs.push(vec![0x00; len]);
        inputs.push(vec![0xFF; len]);
        let mut hasher = blake3::Hasher::new();
        hasher.update(seed);
        hasher.update(&(len as u64).to_le_bytes());
        let mut random = vec![0u8; len];
        hasher.finalize_xof().fill(&mut random);
        inputs.push(random);
    }
    inputs
}
