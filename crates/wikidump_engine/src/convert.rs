use std::io::{self, Write};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use engine_logging::engine_trace;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::process::Command;

const STDERR_EXCERPT_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("converter exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },
    #[error("converter timed out after {0:?}")]
    Timeout(Duration),
    #[error("converter produced no output")]
    EmptyOutput,
    #[error("failed to start converter: {0}")]
    Spawn(#[source] io::Error),
    #[error("converter io error: {0}")]
    Io(#[source] io::Error),
    #[error("cannot stage converter input: {0}")]
    TempFile(#[source] io::Error),
}

/// Renders cleaned wiki markup into the requested output format.
#[async_trait::async_trait]
pub trait MarkupConverter: Send + Sync {
    async fn convert(
        &self,
        text: &str,
        format: &str,
        timeout: Duration,
    ) -> Result<String, ConversionError>;
}

/// How to launch the external renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterSettings {
    pub program: String,
    /// Arguments placed before the format flags and the input path.
    pub base_args: Vec<String>,
    pub from_format: String,
}

impl Default for ConverterSettings {
    fn default() -> Self {
        Self {
            program: "pandoc".to_string(),
            base_args: Vec::new(),
            from_format: "mediawiki".to_string(),
        }
    }
}

/// Runs pandoc (or a compatible program) once per page.
///
/// The input is staged in a temporary file that is removed when the call
/// returns, whatever the outcome. A child that outlives the timeout is
/// killed.
#[derive(Debug, Clone, Default)]
pub struct PandocConverter {
    settings: ConverterSettings,
}

impl PandocConverter {
    pub fn new(settings: ConverterSettings) -> Self {
        Self { settings }
    }

    fn command(&self, format: &str, input: &NamedTempFile) -> Command {
        let mut command = Command::new(&self.settings.program);
        command
            .args(&self.settings.base_args)
            .arg(format!("--from={}", self.settings.from_format))
            .arg(format!("--to={format}"))
            .arg("--wrap=none")
            .arg(input.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait::async_trait]
impl MarkupConverter for PandocConverter {
    async fn convert(
        &self,
        text: &str,
        format: &str,
        timeout: Duration,
    ) -> Result<String, ConversionError> {
        let mut input = NamedTempFile::new().map_err(ConversionError::TempFile)?;
        input
            .write_all(text.as_bytes())
            .and_then(|()| input.flush())
            .map_err(ConversionError::TempFile)?;

        let child = self
            .command(format, &input)
            .spawn()
            .map_err(ConversionError::Spawn)?;
        engine_trace!("converter started for {}", input.path().display());

        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| ConversionError::Timeout(timeout))?
            .map_err(ConversionError::Io)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ConversionError::Failed {
                status: output.status,
                stderr: stderr.chars().take(STDERR_EXCERPT_CHARS).collect(),
            });
        }
        let rendered = String::from_utf8_lossy(&output.stdout).into_owned();
        if rendered.trim().is_empty() {
            return Err(ConversionError::EmptyOutput);
        }
        Ok(rendered)
    }
}
