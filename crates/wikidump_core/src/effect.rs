use crate::{CheckpointState, PageRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Run these records through the worker pool and report back with
    /// `Msg::BatchCompleted` once all of them finished.
    DispatchBatch(Vec<PageRecord>),
    SaveCheckpoint(CheckpointState),
    Stop { reason: StopReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The dump was read to the end.
    Exhausted,
    /// A stop was requested; pending work was flushed first.
    Cancelled,
}
