use pretty_assertions::assert_eq;
use wikidump_core::{CheckpointState, RunStatus};

#[test]
fn serializes_with_state_file_field_names() {
    let state = CheckpointState {
        position: 3,
        success_count: 2,
        failure_count: 1,
        last_updated: "2024-01-01 12:00:00".to_string(),
        status: RunStatus::InProgress,
    };
    let json = serde_json::to_value(&state).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "position": 3,
            "success": 2,
            "failed": 1,
            "last_updated": "2024-01-01 12:00:00",
            "status": "in_progress"
        })
    );
}

#[test]
fn reads_terminated_state_and_reopens_it() {
    let json = r#"{"position":5,"success":4,"failed":1,"last_updated":"x","status":"terminated"}"#;
    let state: CheckpointState = serde_json::from_str(json).unwrap();
    assert!(state.is_terminated());

    let resumed = state.resumed();
    assert_eq!(resumed.status, RunStatus::InProgress);
    assert_eq!(resumed.position, 5);
    assert_eq!(resumed.processed(), 5);
}

#[test]
fn missing_optional_fields_default() {
    let state: CheckpointState =
        serde_json::from_str(r#"{"position":1,"success":1,"failed":0}"#).unwrap();
    assert_eq!(state.status, RunStatus::InProgress);
    assert!(state.last_updated.is_empty());
}

#[test]
fn advance_is_monotonic_and_terminate_is_one_way() {
    let mut state = CheckpointState::starting_at(4);
    state.advance(2, 1, 1);
    assert_eq!(state.position, 6);
    state.terminate();
    state.terminate();
    assert!(state.is_terminated());
}
