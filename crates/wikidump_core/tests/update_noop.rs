use wikidump_core::{update, CheckpointState, Msg, RunState};

#[test]
fn update_is_noop() {
    let state = RunState::new(CheckpointState::default(), 10);
    let (next, effects) = update(state.clone(), Msg::NoOp);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}
