//! Drives a conversion run: feeds dump pages into the batching state machine
//! and executes the effects it asks for.

use std::collections::VecDeque;
use std::io::{self, BufRead};
use std::sync::Arc;

use engine_logging::{csv_field, engine_debug, engine_event, engine_info, engine_warn};
use thiserror::Error;
use tokio::runtime::Handle;
use wikidump_core::{update, CheckpointState, Effect, Msg, PageRecord, RunState, StopReason};

use crate::cancel::Cancellation;
use crate::checkpoint::{CheckpointManager, CheckpointStore, JsonCheckpointStore};
use crate::config::RunConfig;
use crate::convert::{MarkupConverter, PandocConverter};
use crate::persist::{ensure_output_dir, PersistError};
use crate::pool::WorkerPool;
use crate::processor::PageProcessor;
use crate::reader::{DumpItem, DumpReader, ReadError};
use crate::types::BatchTally;

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("cannot read dump: {0}")]
    Read(#[from] ReadError),
    #[error("cannot save checkpoint: {0}")]
    Checkpoint(#[source] PersistError),
    #[error("cannot prepare output directory: {0}")]
    Output(#[source] PersistError),
    #[error("cannot start worker pool: {0}")]
    Pool(#[source] io::Error),
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub checkpoint: CheckpointState,
    pub stop_reason: StopReason,
    pub batches: u64,
}

pub struct BatchScheduler {
    config: RunConfig,
    pool: WorkerPool,
    processor: Arc<PageProcessor>,
    checkpoints: CheckpointManager,
    cancel: Cancellation,
}

impl BatchScheduler {
    pub fn new(
        config: RunConfig,
        converter: Arc<dyn MarkupConverter>,
        store: Box<dyn CheckpointStore>,
        cancel: Cancellation,
    ) -> Result<Self, RunError> {
        ensure_output_dir(&config.output_dir).map_err(RunError::Output)?;
        let pool = WorkerPool::new(config.workers).map_err(RunError::Pool)?;
        let processor = Arc::new(PageProcessor::new(
            converter,
            config.output_dir.clone(),
            config.format.clone(),
            config.conversion_timeout,
        ));
        let checkpoints = CheckpointManager::new(store, Arc::clone(&config.clock));
        Ok(Self {
            config,
            pool,
            processor,
            checkpoints,
            cancel,
        })
    }

    /// Scheduler backed by the configured pandoc binary and the JSON state
    /// file under the logs directory.
    pub fn with_pandoc(config: RunConfig, cancel: Cancellation) -> Result<Self, RunError> {
        let converter = Arc::new(PandocConverter::new(config.converter.clone()));
        let store = Box::new(JsonCheckpointStore::new(config.logs_dir()));
        Self::new(config, converter, store, cancel)
    }

    /// Runtime handle of the worker pool.
    pub fn runtime_handle(&self) -> Handle {
        self.pool.handle()
    }

    /// Consumes the dump until it is exhausted or a stop is requested.
    ///
    /// Pages already covered by the loaded checkpoint are skipped. The
    /// checkpoint is saved after every batch; a failed save aborts the run.
    pub fn run<R: BufRead>(&self, mut reader: DumpReader<R>) -> Result<RunSummary, RunError> {
        let checkpoint = self.checkpoints.load(self.config.resume_from);
        engine_event!(
            "run_started,{},{},{}",
            checkpoint.position,
            checkpoint.success_count,
            checkpoint.failure_count
        );
        engine_info!(
            "Converting to {} in {} (batch size {}, {} workers)",
            self.config.format,
            self.config.output_dir.display(),
            self.config.batch_size,
            self.pool.workers()
        );
        reader.skip_pages(checkpoint.position);

        let mut last_saved = None;
        let mut state = RunState::new(checkpoint, self.config.batch_size);
        let mut queue = VecDeque::new();
        let mut stop = None;

        while stop.is_none() {
            queue.push_back(self.next_message(&mut reader)?);
            while let Some(msg) = queue.pop_front() {
                let (next, effects) = update(state, msg);
                state = next;
                for effect in effects {
                    match effect {
                        Effect::DispatchBatch(batch) => {
                            let tally = self.execute_batch(batch);
                            queue.push_back(Msg::BatchCompleted {
                                succeeded: tally.succeeded,
                                failed: tally.failed,
                            });
                        }
                        Effect::SaveCheckpoint(mut checkpoint) => {
                            self.checkpoints
                                .save(&mut checkpoint)
                                .map_err(RunError::Checkpoint)?;
                            engine_debug!("checkpoint saved at position {}", checkpoint.position);
                            last_saved = Some(checkpoint);
                        }
                        Effect::Stop { reason } => stop = Some(reason),
                    }
                }
            }
        }

        if reader.pending_skips() > 0 {
            engine_warn!(
                "Dump holds {} pages, fewer than the resume position",
                reader.pages_seen()
            );
        }
        let stop_reason = stop.unwrap_or(StopReason::Exhausted);
        let checkpoint = last_saved.unwrap_or_else(|| state.checkpoint().clone());
        engine_event!(
            "run_finished,{},{},{},{}",
            stop_reason_label(stop_reason),
            checkpoint.position,
            checkpoint.success_count,
            checkpoint.failure_count
        );
        engine_info!(
            "Run {}: {} converted, {} failed, position {}",
            stop_reason_label(stop_reason),
            checkpoint.success_count,
            checkpoint.failure_count,
            checkpoint.position
        );
        Ok(RunSummary {
            checkpoint,
            stop_reason,
            batches: state.batches_dispatched(),
        })
    }

    /// Cancellation is observed before every pull from the reader.
    fn next_message<R: BufRead>(&self, reader: &mut DumpReader<R>) -> Result<Msg, RunError> {
        if self.cancel.is_requested() {
            engine_event!(
                "cancelled,{}",
                csv_field(self.cancel.reason().unwrap_or("requested"))
            );
            return Ok(Msg::CancelRequested);
        }
        Ok(match reader.next() {
            Some(Ok(DumpItem::Page(record))) => Msg::PageRead(record),
            Some(Ok(DumpItem::Invalid(invalid))) => {
                let title = invalid.title.as_deref().unwrap_or("");
                engine_warn!("Skipping page #{} {:?}: {}", invalid.ordinal, title, invalid.reason);
                engine_event!(
                    "page_invalid,{},{},{}",
                    invalid.ordinal,
                    csv_field(title),
                    csv_field(&invalid.reason.to_string())
                );
                Msg::PageInvalid(invalid)
            }
            Some(Err(err)) => {
                engine_event!("read_failed,{}", csv_field(&err.to_string()));
                return Err(err.into());
            }
            None => Msg::StreamEnded,
        })
    }

    fn execute_batch(&self, batch: Vec<PageRecord>) -> BatchTally {
        let size = batch.len();
        let results = self.pool.run_batch(&self.processor, batch);
        for result in &results {
            match &result.outcome {
                Ok(path) => {
                    engine_debug!("converted {:?} -> {}", result.title, path.display());
                    engine_event!(
                        "page_converted,{},{}",
                        csv_field(&result.title),
                        csv_field(&path.display().to_string())
                    );
                }
                Err(err) => {
                    engine_warn!("Failed to convert {:?}: {}", result.title, err);
                    engine_event!(
                        "page_failed,{},{}",
                        csv_field(&result.title),
                        csv_field(&err.to_string())
                    );
                }
            }
        }
        let tally = BatchTally::from_results(&results);
        engine_event!(
            "batch_completed,{},{},{}",
            size,
            tally.succeeded,
            tally.failed
        );
        tally
    }
}

fn stop_reason_label(reason: StopReason) -> &'static str {
    match reason {
        StopReason::Exhausted => "completed",
        StopReason::Cancelled => "cancelled",
    }
}
