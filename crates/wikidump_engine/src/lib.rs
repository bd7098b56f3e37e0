//! Wikidump engine: dump streaming, page conversion, persistence and the
//! effect executor that drives the core state machine.
mod cancel;
mod checkpoint;
mod config;
mod convert;
mod filename;
mod frontmatter;
mod persist;
mod pool;
mod processor;
mod reader;
mod scheduler;
mod types;

pub use cancel::Cancellation;
pub use checkpoint::{CheckpointManager, CheckpointStore, JsonCheckpointStore, STATE_FILE_NAME};
pub use config::{local_timestamp, Clock, RunConfig, LOGS_DIR_NAME};
pub use convert::{ConversionError, ConverterSettings, MarkupConverter, PandocConverter};
pub use filename::{article_relative_path, article_slug};
pub use frontmatter::build_article_document;
pub use persist::{ensure_output_dir, write_article, AtomicFileWriter, PersistError};
pub use pool::WorkerPool;
pub use processor::PageProcessor;
pub use reader::{DumpItem, DumpReader, ReadError};
pub use scheduler::{BatchScheduler, RunError, RunSummary};
pub use types::{BatchTally, ConversionResult, PageError};
