use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use wikidump_engine::{ConverterSettings, RunConfig};

/// Converts a MediaWiki XML dump into one file per article.
#[derive(Parser, Debug, Clone)]
#[command(name = "wikidump", version)]
pub struct Cli {
    /// MediaWiki XML dump to read
    #[arg(long, env = "WIKIDUMP_FILENAME")]
    pub filename: PathBuf,

    /// Output root; state and logs go to `<output>/logs`
    #[arg(long, env = "WIKIDUMP_OUTPUT", default_value = "data")]
    pub output: PathBuf,

    /// Target format passed to the converter as `--to`
    #[arg(long, env = "WIKIDUMP_FORMAT", default_value = "gfm")]
    pub format: String,

    /// Pages per batch; the checkpoint is saved after each batch
    #[arg(long, env = "WIKIDUMP_BATCH_SIZE", default_value_t = 100)]
    pub batch_size: usize,

    /// Starting position when no checkpoint exists yet
    #[arg(long, env = "WIKIDUMP_RESUME_FROM", default_value_t = 0)]
    pub resume_from: u64,

    /// Memory hint in MB (accepted for compatibility, not enforced)
    #[arg(long, env = "WIKIDUMP_MEM_LIMIT", default_value_t = 100)]
    pub mem_limit: u64,

    /// Worker threads (defaults to the available parallelism)
    #[arg(long, env = "WIKIDUMP_WORKERS")]
    pub workers: Option<usize>,

    /// Seconds allowed for converting a single page
    #[arg(long, env = "WIKIDUMP_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Converter executable
    #[arg(long, env = "WIKIDUMP_PANDOC", default_value = "pandoc")]
    pub pandoc: String,
}

impl Cli {
    pub fn run_config(&self) -> RunConfig {
        let mut config = RunConfig::default_with_output(&self.output);
        config.format = self.format.clone();
        config.batch_size = self.batch_size;
        config.resume_from = self.resume_from;
        config.workers = self.workers;
        config.conversion_timeout = Duration::from_secs(self.timeout_secs);
        config.converter = ConverterSettings {
            program: self.pandoc.clone(),
            ..ConverterSettings::default()
        };
        config
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.output.join(wikidump_engine::LOGS_DIR_NAME)
    }
}
