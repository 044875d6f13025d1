use std::cell::RefCell;

use candle_core::Device;
use opfuzz_common::Result;
use opfuzz_decode::ParamDecoder;
use opfuzz_tensor::CheckPolicy;

/// Per-invocation state handed to a harness.
#[derive(Debug, Clone)]
pub struct InvokeContext {
    pub device: Device,
    divergences: RefCell<Vec<String>>,
}

impl Default for InvokeContext {
    fn default() -> Self {
        Self { device: Device::Cpu, divergences: RefCell::new(Vec::new()) }
    }
}

impl InvokeContext {
    /// Note that the operator output disagreed with a reference computation.
    ///
    /// The verdict is unaffected; the entry point saves the input as a
    /// divergence artifact when an artifact directory is configured.
    pub fn report_divergence(&self, detail: impl Into<String>) {
        self.divergences.borrow_mut().push(detail.into());
    }

    /// Divergences reported so far, leaving the context empty.
    pub fn take_divergences(&self) -> Vec<String> {
        self.divergences.take()
    }
}

/// One fuzzed operator.
///
/// `run` decodes the operator's parameters and tensors from `decoder`,
/// invokes the operator eagerly and inspects the result. Framework errors
/// propagate as expected failures through `?`; only panics and enforced
/// output checks count as unexpected. Differential checks that disagree with
/// a reference are passed to [`InvokeContext::report_divergence`].
pub trait OperatorHarness: Sync {
    /// Stable name, used for fuzz target names, artifacts and the CLI.
    fn name(&self) -> &'static str;

    /// Inputs shorter than this are kept without invoking the operator.
    fn min_input_len(&self) -> usize;

    /// How output check failures are treated.
    fn check_policy(&self) -> CheckPolicy;

    fn run(&self, decoder: &mut ParamDecoder<'_>, ctx: &InvokeContext) -> Result<()>;
}

impl std::fmt::Debug for dyn OperatorHarness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorHarness")
            .field("name", &self.name())
            .field("min_input_len", &self.min_input_len())
            .finish()
    }
}
