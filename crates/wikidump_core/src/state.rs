use crate::{CheckpointState, Effect, PageRecord, StopReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Pulling pages and filling the next batch.
    #[default]
    Running,
    /// A stop was decided but the last batch is still out.
    Stopping(StopReason),
    Finished(StopReason),
}

/// Work handed to the pool and not yet reported back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InFlight {
    pub records: u64,
    /// Invalid pages met while this batch was filled; they advance the
    /// position together with the batch.
    pub invalid: u64,
    then: Option<StopReason>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunState {
    checkpoint: CheckpointState,
    batch_size: usize,
    pending: Vec<PageRecord>,
    pending_invalid: u64,
    in_flight: Option<InFlight>,
    session: SessionState,
    batches_dispatched: u64,
}

impl RunState {
    /// Starts a run from a loaded (or default) checkpoint. A batch size of
    /// zero is treated as one.
    pub fn new(checkpoint: CheckpointState, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            checkpoint,
            batch_size,
            pending: Vec::with_capacity(batch_size),
            pending_invalid: 0,
            in_flight: None,
            session: SessionState::Running,
            batches_dispatched: 0,
        }
    }

    pub fn checkpoint(&self) -> &CheckpointState {
        &self.checkpoint
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn in_flight(&self) -> Option<InFlight> {
        self.in_flight
    }

    pub fn batches_dispatched(&self) -> u64 {
        self.batches_dispatched
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.session, SessionState::Finished(_))
    }

    /// True while new pages (or a stop request) may be fed in.
    pub fn accepts_input(&self) -> bool {
        self.session == SessionState::Running && self.in_flight.is_none()
    }

    pub(crate) fn push_record(&mut self, record: PageRecord) {
        self.pending.push(record);
    }

    pub(crate) fn batch_full(&self) -> bool {
        self.pending.len() >= self.batch_size
    }

    pub(crate) fn count_invalid(&mut self) {
        self.checkpoint.failure_count += 1;
        self.pending_invalid += 1;
    }

    pub(crate) fn dispatch(&mut self, then: Option<StopReason>) -> Vec<Effect> {
        let batch = std::mem::replace(&mut self.pending, Vec::with_capacity(self.batch_size));
        self.in_flight = Some(InFlight {
            records: batch.len() as u64,
            invalid: std::mem::take(&mut self.pending_invalid),
            then,
        });
        if let Some(reason) = then {
            self.session = SessionState::Stopping(reason);
        }
        self.batches_dispatched += 1;
        vec![Effect::DispatchBatch(batch)]
    }

    /// Hands out whatever is pending, then stops.
    pub(crate) fn flush(&mut self, reason: StopReason) -> Vec<Effect> {
        if !self.pending.is_empty() {
            return self.dispatch(Some(reason));
        }
        let invalid = std::mem::take(&mut self.pending_invalid);
        if invalid > 0 {
            self.checkpoint.advance(invalid, 0, 0);
        }
        self.finish(reason, invalid > 0)
    }

    pub(crate) fn complete_batch(&mut self, succeeded: u64, failed: u64) -> Vec<Effect> {
        let Some(flight) = self.in_flight.take() else {
            return Vec::new();
        };
        self.checkpoint
            .advance(flight.records + flight.invalid, succeeded, failed);
        match flight.then {
            Some(reason) => self.finish(reason, true),
            None => vec![Effect::SaveCheckpoint(self.checkpoint.clone())],
        }
    }

    fn finish(&mut self, reason: StopReason, progressed: bool) -> Vec<Effect> {
        let mut effects = Vec::with_capacity(2);
        if reason == StopReason::Cancelled {
            self.checkpoint.terminate();
        }
        if progressed || reason == StopReason::Cancelled {
            effects.push(Effect::SaveCheckpoint(self.checkpoint.clone()));
        }
        self.session = SessionState::Finished(reason);
        effects.push(Effect::Stop { reason });
        effects
    }
}
