#![no_main]

use libfuzzer_sys::{fuzz_target, Corpus};
use opfuzz_harness::ops::Add;
use opfuzz_harness::{fuzz_entry, Verdict};

fuzz_target!(|data: &[u8]| -> Corpus {
    match fuzz_entry(&Add, data) {
        Verdict::Keep => Corpus::Keep,
        Verdict::Discard => Corpus::Reject,
    }
});
