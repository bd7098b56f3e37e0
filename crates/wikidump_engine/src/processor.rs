use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use engine_logging::engine_trace;
use wikidump_core::{clean, PageRecord};

use crate::convert::MarkupConverter;
use crate::persist::write_article;
use crate::types::{ConversionResult, PageError};

/// Per-page pipeline: clean the markup, render it, write the article.
pub struct PageProcessor {
    converter: Arc<dyn MarkupConverter>,
    output_dir: PathBuf,
    format: String,
    timeout: Duration,
}

impl PageProcessor {
    pub fn new(
        converter: Arc<dyn MarkupConverter>,
        output_dir: PathBuf,
        format: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            converter,
            output_dir,
            format: format.into(),
            timeout,
        }
    }

    pub async fn process(&self, record: PageRecord) -> ConversionResult {
        let (title, raw_text) = record.into_parts();
        let outcome = self.render(&title, raw_text).await;
        ConversionResult { title, outcome }
    }

    async fn render(&self, title: &str, raw_text: String) -> Result<PathBuf, PageError> {
        let cleaned = clean(&raw_text);
        drop(raw_text);
        engine_trace!("converting {:?} ({} bytes)", title, cleaned.len());
        let rendered = self
            .converter
            .convert(&cleaned, &self.format, self.timeout)
            .await?;
        Ok(write_article(&self.output_dir, title, &rendered)?)
    }
}
