use crate::{Effect, Msg, RunState, StopReason};

/// Pure update function: applies a message to state and returns any effects.
///
/// Pages and stop requests are ignored while a batch is out or after the run
/// finished; the driver only feeds them when `RunState::accepts_input` holds.
pub fn update(mut state: RunState, msg: Msg) -> (RunState, Vec<Effect>) {
    let effects = match msg {
        Msg::PageRead(record) => {
            if !state.accepts_input() {
                return (state, Vec::new());
            }
            state.push_record(record);
            if state.batch_full() {
                state.dispatch(None)
            } else {
                Vec::new()
            }
        }
        Msg::PageInvalid(_) => {
            if !state.accepts_input() {
                return (state, Vec::new());
            }
            state.count_invalid();
            Vec::new()
        }
        Msg::StreamEnded => {
            if state.accepts_input() {
                state.flush(StopReason::Exhausted)
            } else {
                Vec::new()
            }
        }
        Msg::CancelRequested => {
            if state.accepts_input() {
                state.flush(StopReason::Cancelled)
            } else {
                Vec::new()
            }
        }
        Msg::BatchCompleted { succeeded, failed } => state.complete_batch(succeeded, failed),
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
