//! Error taxonomy tests for opfuzz-common

use opfuzz_common::*;

#[test]
fn test_framework_errors_are_expected() {
    let err: HarnessError = candle_core::Error::Msg("shape mismatch".to_string()).into();
    assert_eq!(err.kind(), FailureKind::ExpectedOperationFailure);
    assert_eq!(err.verdict(), Verdict::Keep);
    assert!(format!("{err}").contains("shape mismatch"));
}

#[test]
fn test_budget_and_config_errors_are_expected() {
    let budget: HarnessError = ExpectedFailure::ElementBudget { count: 10, limit: 5 }.into();
    assert_eq!(budget.kind(), FailureKind::ExpectedOperationFailure);
    assert_eq!(
        format!("{budget}"),
        "expected operation failure: decoded shape has 10 elements, budget is 5"
    );

    let config = HarnessError::invalid_config("window larger than input");
    assert_eq!(config.verdict(), Verdict::Keep);
    assert!(matches!(config, HarnessError::Expected(ExpectedFailure::InvalidConfig { .. })));
}

#[test]
fn test_unexpected_errors_discard() {
    let mismatch = HarnessError::output_mismatch("cumsum", "rank 2 != 3");
    assert_eq!(mismatch.kind(), FailureKind::UnexpectedFailure);
    assert_eq!(mismatch.verdict(), Verdict::Discard);
    assert_eq!(
        format!("{mismatch}"),
        "unexpected failure: cumsum output check failed: rank 2 != 3"
    );

    let panic: HarnessError =
        UnexpectedFailure::Panic { op: "matmul", message: "index out of bounds".to_string() }
            .into();
    assert_eq!(panic.verdict(), Verdict::Discard);
}

#[test]
fn test_verdict_sentinels() {
    assert_eq!(Verdict::Keep.sentinel(), 0);
    assert_eq!(Verdict::Discard.sentinel(), -1);
    assert!(Verdict::Keep.is_keep());
    assert!(!Verdict::Discard.is_keep());
    assert_eq!(Verdict::Discard.to_string(), "discard");
}

#[test]
fn test_panic_message_payloads() {
    let from_str = std::panic::catch_unwind(|| panic!("static message")).unwrap_err();
    assert_eq!(panic_message(from_str.as_ref()), "static message");

    let value = 7;
    let from_string = std::panic::catch_unwind(|| panic!("formatted {value}")).unwrap_err();
    assert_eq!(panic_message(from_string.as_ref()), "formatted 7");

    let other = std::panic::catch_unwind(|| std::panic::panic_any(42u32)).unwrap_err();
    assert_eq!(panic_message(other.as_ref()), "non-string panic payload");
}
