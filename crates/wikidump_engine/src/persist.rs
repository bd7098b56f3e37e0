use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::filename::{article_relative_path, article_slug};
use crate::frontmatter::build_article_document;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("cannot write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("cannot encode state: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// Writes one converted article below `output_root` and returns its path.
///
/// Intermediate directories are created as needed and an existing file is
/// overwritten. A failure part-way may leave a partial file behind.
pub fn write_article(
    output_root: &Path,
    title: &str,
    content: &str,
) -> Result<PathBuf, PersistError> {
    let slug = article_slug(title);
    let path = output_root.join(article_relative_path(&slug));
    let document = build_article_document(title, &slug, content);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| PersistError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(&path, document).map_err(|source| PersistError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Atomically write content to `{dir}/{filename}` by writing a temp file then renaming.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        // The rename replaces any previous version in one step.
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}
