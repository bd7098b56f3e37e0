use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::convert::ConverterSettings;

/// Produces the `last_updated` stamp written into each checkpoint.
pub type Clock = Arc<dyn Fn() -> String + Send + Sync>;

/// Name of the directory under the output root holding state and logs.
pub const LOGS_DIR_NAME: &str = "logs";

/// Everything a conversion run needs besides the dump itself.
#[derive(Clone)]
pub struct RunConfig {
    pub output_dir: PathBuf,
    /// Target format handed to the converter, e.g. `gfm`.
    pub format: String,
    pub batch_size: usize,
    /// Starting position used only when no checkpoint exists.
    pub resume_from: u64,
    /// Worker threads; `None` uses the available parallelism.
    pub workers: Option<usize>,
    pub conversion_timeout: Duration,
    pub converter: ConverterSettings,
    pub clock: Clock,
}

impl RunConfig {
    pub fn default_with_output(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            format: "gfm".to_string(),
            batch_size: 100,
            resume_from: 0,
            workers: None,
            conversion_timeout: Duration::from_secs(30),
            converter: ConverterSettings::default(),
            clock: Arc::new(local_timestamp),
        }
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.output_dir.join(LOGS_DIR_NAME)
    }
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("output_dir", &self.output_dir)
            .field("format", &self.format)
            .field("batch_size", &self.batch_size)
            .field("resume_from", &self.resume_from)
            .field("workers", &self.workers)
            .field("conversion_timeout", &self.conversion_timeout)
            .field("converter", &self.converter)
            .finish_non_exhaustive()
    }
}

/// Local wall-clock time as `YYYY-MM-DD HH:MM:SS`.
pub fn local_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
