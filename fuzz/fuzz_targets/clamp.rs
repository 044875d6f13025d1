#![no_main]

use libfuzzer_sys::{fuzz_target, Corpus};
use opfuzz_harness::ops::Clamp;
use opfuzz_harness::{fuzz_entry, Verdict};

fuzz_target!(|data: &[u8]| -> Corpus {
    match fuzz_entry(&Clamp, data) {
        Verdict::Keep => Corpus::Keep,
        Verdict::Discard => Corpus::Reject,
    }
});
