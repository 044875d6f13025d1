use anyhow::Result;
use clap::Parser;
use opfuzz_harness::registry;
use serde_json::json;

use crate::exit::EXIT_SUCCESS;

/// List registered harnesses
#[derive(Debug, Parser)]
pub struct ListCommand {
    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

impl ListCommand {
    pub fn execute(self) -> Result<i32> {
        if self.json {
            let entries: Vec<_> = registry::all()
                .iter()
                .map(|h| {
                    json!({
                        "name": h.name(),
                        "min_input_len": h.min_input_len(),
                        "check_policy": format!("{:?}", h.check_policy()).to_lowercase(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        } else {
            println!("{:<14} {:>7}  checks", "harness", "min len");
            for h in registry::all() {
                println!("{:<14} {:>7}  {:?}", h.name(), h.min_input_len(), h.check_policy());
            }
        }
        Ok(EXIT_SUCCESS)
    }
}
