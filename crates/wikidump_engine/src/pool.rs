use std::any::Any;
use std::io;
use std::num::NonZeroUsize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::thread;

use engine_logging::{engine_debug, engine_error};
use futures_util::FutureExt;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use wikidump_core::PageRecord;

use crate::processor::PageProcessor;
use crate::types::{ConversionResult, PageError};

/// Fixed-size set of workers that processes one batch at a time.
pub struct WorkerPool {
    runtime: Runtime,
    permits: Arc<Semaphore>,
    workers: usize,
}

impl WorkerPool {
    /// `workers = None` sizes the pool to the available parallelism.
    pub fn new(workers: Option<usize>) -> io::Result<Self> {
        let workers = workers
            .filter(|n| *n > 0)
            .unwrap_or_else(|| thread::available_parallelism().map_or(1, NonZeroUsize::get));
        let runtime = Builder::new_multi_thread()
            .worker_threads(workers)
            .thread_name("wikidump-worker")
            .enable_all()
            .build()?;
        engine_debug!("worker pool started with {} workers", workers);
        Ok(Self {
            runtime,
            permits: Arc::new(Semaphore::new(workers)),
            workers,
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Handle for spawning background tasks (signal listeners) on the pool.
    pub fn handle(&self) -> Handle {
        self.runtime.handle().clone()
    }

    /// Processes every record of the batch and returns once all are done.
    ///
    /// At most `workers` records are in progress at once. A panic while
    /// processing a record is reported as that record's failure.
    pub fn run_batch(
        &self,
        processor: &Arc<PageProcessor>,
        batch: Vec<PageRecord>,
    ) -> Vec<ConversionResult> {
        let expected = batch.len();
        self.runtime.block_on(async {
            let mut tasks = JoinSet::new();
            for record in batch {
                let processor = Arc::clone(processor);
                let permits = Arc::clone(&self.permits);
                tasks.spawn(async move {
                    let _permit = permits.acquire_owned().await.ok();
                    let title = record.title().to_string();
                    match AssertUnwindSafe(processor.process(record))
                        .catch_unwind()
                        .await
                    {
                        Ok(result) => result,
                        Err(payload) => {
                            let message = panic_message(payload.as_ref());
                            engine_error!("worker panicked on {:?}: {}", title, message);
                            ConversionResult {
                                title,
                                outcome: Err(PageError::Panicked(message)),
                            }
                        }
                    }
                });
            }

            let mut results = Vec::with_capacity(expected);
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(result) => results.push(result),
                    Err(err) => {
                        engine_error!("worker task lost: {}", err);
                        results.push(ConversionResult {
                            title: String::new(),
                            outcome: Err(PageError::Panicked(err.to_string())),
                        });
                    }
                }
            }
            results
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
