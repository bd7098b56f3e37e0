use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use wikidump_core::{CheckpointState, RunStatus, StopReason};
use wikidump_engine::{
    BatchScheduler, Cancellation, CheckpointStore, ConversionError, DumpReader,
    JsonCheckpointStore, MarkupConverter, PersistError, RunConfig, RunError,
};

/// Echoes the cleaned markup; fails or panics for marked pages.
#[derive(Default)]
struct FakeConverter {
    calls: AtomicUsize,
    /// Requested on the first call, as a signal handler would.
    cancel_on_first: Option<Cancellation>,
}

#[async_trait::async_trait]
impl MarkupConverter for FakeConverter {
    async fn convert(
        &self,
        text: &str,
        _format: &str,
        _timeout: Duration,
    ) -> Result<String, ConversionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(cancel) = &self.cancel_on_first {
            cancel.request("test");
        }
        if text.contains("FAIL") {
            return Err(ConversionError::EmptyOutput);
        }
        if text.contains("PANIC") {
            panic!("converter blew up");
        }
        Ok(format!("converted: {text}"))
    }
}

#[derive(Clone, Default)]
struct RecordingStore {
    saved: Arc<Mutex<Vec<CheckpointState>>>,
    initial: Option<CheckpointState>,
}

impl RecordingStore {
    fn saves(&self) -> Vec<CheckpointState> {
        self.saved.lock().unwrap().clone()
    }
}

impl CheckpointStore for RecordingStore {
    fn load(&self) -> Option<CheckpointState> {
        self.initial.clone()
    }

    fn save(&self, state: &CheckpointState) -> Result<(), PersistError> {
        self.saved.lock().unwrap().push(state.clone());
        Ok(())
    }
}

struct FailingStore;

impl CheckpointStore for FailingStore {
    fn load(&self) -> Option<CheckpointState> {
        None
    }

    fn save(&self, _state: &CheckpointState) -> Result<(), PersistError> {
        Err(PersistError::OutputDir("read-only".into()))
    }
}

fn page(title: &str, text: &str) -> String {
    format!("<page><title>{title}</title><revision><text>{text}</text></revision></page>")
}

fn dump(pages: &[String]) -> String {
    format!(
        "<mediawiki xmlns=\"http://www.mediawiki.org/xml/export-0.10/\">{}</mediawiki>",
        pages.concat()
    )
}

fn config(dir: &TempDir, batch_size: usize) -> RunConfig {
    let mut config = RunConfig::default_with_output(dir.path().join("out"));
    config.batch_size = batch_size;
    config.workers = Some(2);
    config.clock = Arc::new(|| "2024-01-01 12:00:00".to_string());
    config
}

fn scheduler(
    config: RunConfig,
    converter: FakeConverter,
    store: impl CheckpointStore + 'static,
    cancel: Cancellation,
) -> BatchScheduler {
    BatchScheduler::new(config, Arc::new(converter), Box::new(store), cancel).unwrap()
}

#[test]
fn three_pages_in_batches_of_two() {
    engine_logging::initialize_for_tests();
    let temp = TempDir::new().unwrap();
    let store = RecordingStore::default();
    let run = scheduler(
        config(&temp, 2),
        FakeConverter::default(),
        store.clone(),
        Cancellation::new(),
    );
    let xml = dump(&[page("A", "a"), page("B", "b"), page("C", "c")]);

    let summary = run.run(DumpReader::new(xml.as_bytes())).unwrap();

    assert_eq!(summary.stop_reason, StopReason::Exhausted);
    assert_eq!(summary.batches, 2);
    assert_eq!(summary.checkpoint.position, 3);
    assert_eq!(summary.checkpoint.success_count, 3);
    assert_eq!(summary.checkpoint.failure_count, 0);
    assert_eq!(summary.checkpoint.status, RunStatus::InProgress);

    let saves = store.saves();
    assert_eq!(saves.len(), 2);
    assert_eq!(saves[0].position, 2);
    assert_eq!(saves[1].position, 3);
    assert!(saves.iter().all(|s| s.last_updated == "2024-01-01 12:00:00"));

    let article = fs::read_to_string(temp.path().join("out").join("B.md")).unwrap();
    assert_eq!(article, "---\ntitle: B\npermalink: /B/\n---\n\nconverted: b");
}

#[test]
fn markup_is_cleaned_before_conversion() {
    let temp = TempDir::new().unwrap();
    let run = scheduler(
        config(&temp, 10),
        FakeConverter::default(),
        RecordingStore::default(),
        Cancellation::new(),
    );
    let xml = dump(&[page("Physicist", "See [[Albert Einstein|Einstein]].")]);
    run.run(DumpReader::new(xml.as_bytes())).unwrap();

    let article = fs::read_to_string(temp.path().join("out").join("Physicist.md")).unwrap();
    assert!(article.ends_with("converted: See [Einstein](/Albert_Einstein)."));
}

#[test]
fn invalid_and_failed_pages_are_counted_without_files() {
    let temp = TempDir::new().unwrap();
    let store = RecordingStore::default();
    let run = scheduler(
        config(&temp, 2),
        FakeConverter::default(),
        store.clone(),
        Cancellation::new(),
    );
    let xml = dump(&[
        page("Good", "ok"),
        page("Empty", "  "),
        page("Broken", "FAIL"),
        page("Fine", "ok"),
    ]);

    let summary = run.run(DumpReader::new(xml.as_bytes())).unwrap();

    assert_eq!(summary.checkpoint.position, 4);
    assert_eq!(summary.checkpoint.success_count, 2);
    assert_eq!(summary.checkpoint.failure_count, 2);
    let out = temp.path().join("out");
    assert!(out.join("Good.md").exists());
    assert!(out.join("Fine.md").exists());
    assert!(!out.join("Empty.md").exists());
    assert!(!out.join("Broken.md").exists());
    assert_eq!(store.saves().last().unwrap().position, 4);
}

#[test]
fn panicking_conversion_counts_as_failure() {
    let temp = TempDir::new().unwrap();
    let run = scheduler(
        config(&temp, 3),
        FakeConverter::default(),
        RecordingStore::default(),
        Cancellation::new(),
    );
    let xml = dump(&[page("A", "a"), page("Boom", "PANIC"), page("C", "c")]);

    let summary = run.run(DumpReader::new(xml.as_bytes())).unwrap();

    assert_eq!(summary.checkpoint.position, 3);
    assert_eq!(summary.checkpoint.success_count, 2);
    assert_eq!(summary.checkpoint.failure_count, 1);
}

#[test]
fn cancellation_during_batch_finishes_it_and_stops_reading() {
    let temp = TempDir::new().unwrap();
    let store = RecordingStore::default();
    let cancel = Cancellation::new();
    let converter = FakeConverter {
        cancel_on_first: Some(cancel.clone()),
        ..FakeConverter::default()
    };
    let run = scheduler(config(&temp, 2), converter, store.clone(), cancel.clone());
    let xml = dump(&[page("A", "a"), page("B", "b"), page("C", "c"), page("D", "d")]);

    let summary = run.run(DumpReader::new(xml.as_bytes())).unwrap();

    assert_eq!(summary.stop_reason, StopReason::Cancelled);
    assert_eq!(summary.batches, 1);
    assert_eq!(summary.checkpoint.position, 2);
    assert_eq!(summary.checkpoint.success_count, 2);
    assert_eq!(summary.checkpoint.status, RunStatus::Terminated);

    let saves = store.saves();
    assert_eq!(saves.len(), 2);
    assert_eq!(saves[0].status, RunStatus::InProgress);
    assert_eq!(saves[1].status, RunStatus::Terminated);
    assert!(!temp.path().join("out").join("C.md").exists());
}

#[test]
fn cancellation_before_start_saves_terminated_state() {
    let temp = TempDir::new().unwrap();
    let store = RecordingStore::default();
    let cancel = Cancellation::new();
    cancel.request("early");
    let converter = FakeConverter::default();
    let run = scheduler(config(&temp, 2), converter, store.clone(), cancel);
    let xml = dump(&[page("A", "a")]);

    let summary = run.run(DumpReader::new(xml.as_bytes())).unwrap();

    assert_eq!(summary.stop_reason, StopReason::Cancelled);
    assert_eq!(summary.batches, 0);
    assert_eq!(summary.checkpoint.position, 0);
    assert_eq!(store.saves().len(), 1);
    assert!(store.saves()[0].is_terminated());
}

#[test]
fn resume_skips_counted_pages_and_keeps_counters() {
    let temp = TempDir::new().unwrap();
    let store = RecordingStore {
        initial: Some(CheckpointState {
            position: 2,
            success_count: 1,
            failure_count: 1,
            last_updated: "earlier".to_string(),
            status: RunStatus::Terminated,
        }),
        ..RecordingStore::default()
    };
    let run = scheduler(
        config(&temp, 5),
        FakeConverter::default(),
        store.clone(),
        Cancellation::new(),
    );
    let xml = dump(&[page("A", "a"), page("B", "b"), page("C", "c")]);

    let summary = run.run(DumpReader::new(xml.as_bytes())).unwrap();

    assert_eq!(summary.checkpoint.position, 3);
    assert_eq!(summary.checkpoint.success_count, 2);
    assert_eq!(summary.checkpoint.failure_count, 1);
    assert_eq!(summary.checkpoint.status, RunStatus::InProgress);
    let out = temp.path().join("out");
    assert!(!out.join("A.md").exists());
    assert!(!out.join("B.md").exists());
    assert!(out.join("C.md").exists());
}

#[test]
fn resume_offset_applies_without_checkpoint() {
    let temp = TempDir::new().unwrap();
    let mut config = config(&temp, 5);
    config.resume_from = 1;
    let run = scheduler(
        config,
        FakeConverter::default(),
        RecordingStore::default(),
        Cancellation::new(),
    );
    let xml = dump(&[page("A", "a"), page("B", "b")]);

    let summary = run.run(DumpReader::new(xml.as_bytes())).unwrap();

    assert_eq!(summary.checkpoint.position, 2);
    assert_eq!(summary.checkpoint.success_count, 1);
    assert!(!temp.path().join("out").join("A.md").exists());
}

#[test]
fn parse_error_aborts_after_saving_completed_batches() {
    let temp = TempDir::new().unwrap();
    let store = RecordingStore::default();
    let run = scheduler(
        config(&temp, 1),
        FakeConverter::default(),
        store.clone(),
        Cancellation::new(),
    );
    let xml = format!(
        "<mediawiki>{}<page><title>Bad</title></revision></page></mediawiki>",
        page("A", "a")
    );

    let result = run.run(DumpReader::new(xml.as_bytes()));

    assert!(matches!(result, Err(RunError::Read(_))));
    let saves = store.saves();
    assert_eq!(saves.len(), 1);
    assert_eq!(saves[0].position, 1);
}

#[test]
fn failed_checkpoint_save_is_fatal() {
    let temp = TempDir::new().unwrap();
    let run = scheduler(
        config(&temp, 1),
        FakeConverter::default(),
        FailingStore,
        Cancellation::new(),
    );
    let xml = dump(&[page("A", "a"), page("B", "b")]);

    let result = run.run(DumpReader::new(xml.as_bytes()));
    assert!(matches!(result, Err(RunError::Checkpoint(_))));
}

#[test]
fn json_store_resume_round_trip() {
    let temp = TempDir::new().unwrap();
    let config = config(&temp, 2);
    let logs = config.logs_dir();
    let xml = dump(&[page("A", "a"), page("B", "b"), page("C", "c")]);

    let first = BatchScheduler::new(
        config.clone(),
        Arc::new(FakeConverter::default()),
        Box::new(JsonCheckpointStore::new(&logs)),
        Cancellation::new(),
    )
    .unwrap();
    first.run(DumpReader::new(xml.as_bytes())).unwrap();

    let second = BatchScheduler::new(
        config,
        Arc::new(FakeConverter::default()),
        Box::new(JsonCheckpointStore::new(&logs)),
        Cancellation::new(),
    )
    .unwrap();
    let summary = second.run(DumpReader::new(xml.as_bytes())).unwrap();

    assert_eq!(summary.batches, 0);
    assert_eq!(summary.checkpoint.position, 3);
    assert_eq!(summary.checkpoint.success_count, 3);
}
