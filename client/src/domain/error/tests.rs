//! Tests for controller error construction and cause propagation.

use std::error::Error as _;

use super::*;
use rstest::rstest;

#[rstest]
fn service_errors_keep_their_cause() {
    let cause = QuestServiceError::not_found("quest 9");
    let err = Error::from_service(ErrorCode::DeleteFailure, "delete quest 9", cause.clone());

    assert_eq!(err.code(), ErrorCode::DeleteFailure);
    assert_eq!(err.service_error(), Some(&cause));
    assert!(err.source().is_some());
    assert_eq!(
        err.to_string(),
        "delete quest 9: quest service could not find resource: quest 9"
    );
}

#[rstest]
#[case(Error::create_failure("blank"), ErrorCode::CreateFailure)]
#[case(Error::complete_failure("done"), ErrorCode::CompleteFailure)]
#[case(Error::conflict("busy"), ErrorCode::Conflict)]
fn constructors_set_codes(#[case] err: Error, #[case] expected: ErrorCode) {
    assert_eq!(err.code(), expected);
    assert!(err.service_error().is_none());
    assert!(err.source().is_none());
}

#[rstest]
fn codes_serialise_as_snake_case() {
    let json = serde_json::to_string(&ErrorCode::DemoGenerationFailure).expect("serialise");
    assert_eq!(json, "\"demo_generation_failure\"");
}
