//! CLI command implementations

pub mod list;
pub mod replay;
pub mod smoke;

pub use list::ListCommand;
pub use replay::ReplayCommand;
pub use smoke::SmokeCommand;

use anyhow::{anyhow, Result};
use opfuzz_harness::{registry, OperatorHarness};

/// Resolve `--op` values against the registry; no names selects everything.
pub(crate) fn select(names: &[String]) -> Result<Vec<&'static dyn OperatorHarness>> {
    if names.is_empty() {
        return Ok(registry::all().to_vec());
    }
    names
        .iter()
        .map(|name| {
            registry::find(name).ok_or_else(|| {
                let known: Vec<&str> = registry::names().collect();
                anyhow!("unknown harness `{name}` (known: {})", known.join(", "))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_resolves_names() {
        assert_eq!(select(&[]).unwrap().len(), registry::all().len());
        let picked = select(&["cumsum".to_string(), "gather".to_string()]).unwrap();
        assert_eq!(picked.iter().map(|h| h.name()).collect::<Vec<_>>(), ["cumsum", "gather"]);
        let err = select(&["nope".to_string()]).unwrap_err();
        assert!(err.to_string().contains("unknown harness `nope`"));
    }
}
