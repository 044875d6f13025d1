//! The boundary between the fuzzing driver and a harness.
//!
//! Every call bumps the progress counter, keeps inputs that are too short
//! without touching the framework, runs the harness inside `catch_unwind`
//! and maps the outcome to a [`Verdict`]:
//!
//! | outcome                       | log                          | verdict |
//! |-------------------------------|------------------------------|---------|
//! | success                       | none                         | keep    |
//! | expected operation failure    | `debug`                      | keep    |
//! | panic / enforced check failed | `error`, `Exception caught:` | discard |
//!
//! Divergences a harness reports through its [`InvokeContext`] never change
//! the verdict. With an artifact directory configured, the input is saved
//! under a `diff-` prefix.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use opfuzz_common::config::report_invalid;
use opfuzz_common::{
    logging, panic_message, progress, ArtifactKind, ArtifactSink, FailureKind, HarnessConfig,
    HarnessError, PanicPolicy, UnexpectedFailure, Verdict,
};
use opfuzz_decode::ParamDecoder;
use tracing::{debug, error, info, trace, warn};

use crate::harness::{InvokeContext, OperatorHarness};

/// Fixed prefix of the diagnostic line for unexpected failures.
pub const DIAGNOSTIC_PREFIX: &str = "Exception caught:";

static PANIC_HOOK: Once = Once::new();
static CONFIG_REPORT: Once = Once::new();

/// Run `harness` on `data` with the process-wide configuration.
pub fn execute(harness: &dyn OperatorHarness, data: &[u8]) -> Verdict {
    execute_with(harness, data, HarnessConfig::global())
}

/// Run `harness` on `data` with an explicit configuration.
pub fn execute_with(harness: &dyn OperatorHarness, data: &[u8], config: &HarnessConfig) -> Verdict {
    let op = harness.name();
    progress::record_iteration(op, config.progress_interval);

    if data.len() < harness.min_input_len() {
        trace!(op, len = data.len(), min = harness.min_input_len(), "input below minimum length");
        return Verdict::Keep;
    }

    let ctx = InvokeContext::default();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut decoder = ParamDecoder::new(data);
        harness.run(&mut decoder, &ctx)
    }));
    save_divergences(op, data, &ctx, config);

    let err = match outcome {
        Ok(Ok(())) => return Verdict::Keep,
        Ok(Err(err)) => err,
        Err(payload) => {
            if config.panic_policy == PanicPolicy::Propagate {
                panic::resume_unwind(payload);
            }
            HarnessError::from(UnexpectedFailure::Panic {
                op,
                message: panic_message(payload.as_ref()),
            })
        }
    };

    classify(op, data, &err, config)
}

/// Entry used by the cargo-fuzz targets: installs logging and the panic hook
/// once, warns about rejected environment values after logging is up, then
/// runs the harness with the global configuration.
pub fn fuzz_entry(harness: &dyn OperatorHarness, data: &[u8]) -> Verdict {
    let config = HarnessConfig::global();
    logging::init(&config.log_filter);
    CONFIG_REPORT.call_once(|| report_invalid(HarnessConfig::global_errors()));
    install_panic_hook(config.panic_policy);
    execute_with(harness, data, config)
}

fn classify(op: &'static str, data: &[u8], err: &HarnessError, config: &HarnessConfig) -> Verdict {
    match err.kind() {
        FailureKind::ExpectedOperationFailure => {
            debug!(op, "{err}");
        }
        FailureKind::UnexpectedFailure => {
            error!(op, "{DIAGNOSTIC_PREFIX} {err}");
            if let Some(dir) = &config.artifact_dir {
                match ArtifactSink::new(dir).record(op, data, err.kind(), &err.to_string()) {
                    Ok(path) => info!(op, path = %path.display(), "saved failing input"),
                    Err(io_err) => warn!(op, "failed to save failing input: {io_err}"),
                }
            }
        }
    }
    err.verdict()
}

fn save_divergences(op: &'static str, data: &[u8], ctx: &InvokeContext, config: &HarnessConfig) {
    let divergences = ctx.take_divergences();
    if divergences.is_empty() {
        return;
    }
    let Some(dir) = &config.artifact_dir else {
        return;
    };
    let message = divergences.join("; ");
    match ArtifactSink::new(dir).record(op, data, ArtifactKind::Divergence, &message) {
        Ok(path) => info!(op, path = %path.display(), "saved diverging input"),
        Err(io_err) => warn!(op, "failed to save diverging input: {io_err}"),
    }
}

/// libFuzzer installs a panic hook that aborts the process. Under
/// [`PanicPolicy::Catch`] it is replaced so panics unwind to the harness
/// boundary and are classified like any other unexpected failure.
fn install_panic_hook(policy: PanicPolicy) {
    if policy != PanicPolicy::Catch {
        return;
    }
    PANIC_HOOK.call_once(|| {
        panic::set_hook(Box::new(|info| {
            debug!("panic inside harness: {info}");
        }));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use opfuzz_common::Result;
    use opfuzz_tensor::CheckPolicy;

    struct Fixed(fn() -> Result<()>);

    impl OperatorHarness for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }
        fn min_input_len(&self) -> usize {
            2
        }
        fn check_policy(&self) -> CheckPolicy {
            CheckPolicy::Report
        }
        fn run(&self, _decoder: &mut ParamDecoder<'_>, _ctx: &InvokeContext) -> Result<()> {
            (self.0)()
        }
    }

    struct Diverges;

    impl OperatorHarness for Diverges {
        fn name(&self) -> &'static str {
            "diverges"
        }
        fn min_input_len(&self) -> usize {
            1
        }
        fn check_policy(&self) -> CheckPolicy {
            CheckPolicy::Report
        }
        fn run(&self, _decoder: &mut ParamDecoder<'_>, ctx: &InvokeContext) -> Result<()> {
            ctx.report_divergence("differs from f64 reference by up to 0.25");
            Ok(())
        }
    }

    fn file_names(dir: &std::path::Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    fn config() -> HarnessConfig {
        HarnessConfig::default()
    }

    #[test]
    fn short_input_is_kept_without_running() {
        let harness = Fixed(|| panic!("must not run"));
        assert_eq!(execute_with(&harness, &[1], &config()), Verdict::Keep);
    }

    #[test]
    fn outcomes_map_to_verdicts() {
        let ok = Fixed(|| Ok(()));
        let expected = Fixed(|| Err(HarnessError::invalid_config("window too large")));
        let enforced = Fixed(|| Err(HarnessError::output_mismatch("fixed", "rank 1, expected 2")));
        let panics = Fixed(|| panic!("kernel bug"));

        assert_eq!(execute_with(&ok, &[0, 0], &config()), Verdict::Keep);
        assert_eq!(execute_with(&expected, &[0, 0], &config()), Verdict::Keep);
        assert_eq!(execute_with(&enforced, &[0, 0], &config()), Verdict::Discard);
        assert_eq!(execute_with(&panics, &[0, 0], &config()), Verdict::Discard);
        assert_eq!(Verdict::Discard.sentinel(), -1);
    }

    #[test]
    fn framework_errors_are_expected() {
        let harness = Fixed(|| Err(candle_core::Error::Msg("shape mismatch".into()).into()));
        assert_eq!(execute_with(&harness, &[0, 0], &config()), Verdict::Keep);
    }

    #[test]
    #[should_panic(expected = "kernel bug")]
    fn propagate_policy_reraises() {
        let harness = Fixed(|| panic!("kernel bug"));
        let config =
            HarnessConfig { panic_policy: PanicPolicy::Propagate, ..HarnessConfig::default() };
        execute_with(&harness, &[0, 0], &config);
    }

    #[test]
    fn unexpected_failures_write_artifacts() {
        let dir = tempfile::TempDir::new().unwrap();
        let harness = Fixed(|| Err(HarnessError::output_mismatch("fixed", "bad")));
        let config = HarnessConfig {
            artifact_dir: Some(dir.path().to_path_buf()),
            ..HarnessConfig::default()
        };
        assert_eq!(execute_with(&harness, &[7, 7, 7], &config), Verdict::Discard);

        let names = file_names(dir.path());
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|n| n.starts_with("fixed-")));
    }

    #[test]
    fn divergences_are_kept_and_saved() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = HarnessConfig {
            artifact_dir: Some(dir.path().to_path_buf()),
            ..HarnessConfig::default()
        };
        assert_eq!(execute_with(&Diverges, &[4, 2], &config), Verdict::Keep);

        let names = file_names(dir.path());
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|n| n.starts_with("diff-diverges-")), "{names:?}");
        let json = names.iter().find(|n| n.ends_with(".json")).unwrap();
        let text = std::fs::read_to_string(dir.path().join(json)).unwrap();
        let record: opfuzz_common::ArtifactRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(record.kind, ArtifactKind::Divergence);
        assert!(record.message.contains("0.25"));
    }

    #[test]
    fn divergences_without_artifact_dir_write_nothing() {
        assert_eq!(execute_with(&Diverges, &[4, 2], &config()), Verdict::Keep);
    }
}
