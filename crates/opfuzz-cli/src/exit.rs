// Exit codes for CI triage
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_GENERIC_FAIL: i32 = 1;
/// At least one input produced an unexpected failure.
pub const EXIT_DISCARDED: i32 = 2;
