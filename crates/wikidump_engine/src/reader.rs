//! Streaming reader over a MediaWiki XML export.
//!
//! The reader pulls one XML event at a time and only buffers the title and
//! first revision text of the page it is currently inside. Everything else in
//! the document is skipped as it streams past, so memory stays bounded by the
//! largest single page regardless of dump size.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use engine_logging::engine_debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use thiserror::Error;
use wikidump_core::{InvalidPage, PageRecord};

const READ_BUFFER_BYTES: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("cannot open dump {}: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("malformed XML near byte {position}: {source}")]
    Xml {
        position: u64,
        source: quick_xml::Error,
    },
    #[error("document has no root element")]
    MissingRoot,
    #[error("document ended inside an open element")]
    Truncated,
}

/// One page element of the dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DumpItem {
    Page(PageRecord),
    Invalid(InvalidPage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Title,
    Revision,
    Text,
    Other,
}

/// Fields captured for the page currently being read.
#[derive(Debug, Default)]
struct PageCapture {
    /// Tags opened below `<page>`.
    path: Vec<Tag>,
    title: Option<String>,
    text: Option<String>,
    buffer: Option<String>,
    /// Set while passing over pages already counted by a previous run.
    skipping: bool,
}

impl PageCapture {
    fn open(&mut self, tag: Tag) {
        self.path.push(tag);
        if !self.skipping && self.buffer.is_none() && self.wants_current() {
            self.buffer = Some(String::new());
        }
    }

    /// Returns false when the closing tag belongs to `<page>` itself.
    fn close(&mut self) -> bool {
        if self.path.is_empty() {
            return false;
        }
        if self.buffer.is_some() && self.wants_current() {
            let captured = self.buffer.take();
            match self.path.last() {
                Some(Tag::Title) => self.title = captured,
                _ => self.text = captured,
            }
        }
        self.path.pop();
        true
    }

    fn wants_current(&self) -> bool {
        match self.path.as_slice() {
            [Tag::Title] => self.title.is_none(),
            [Tag::Revision, Tag::Text] => self.text.is_none(),
            _ => false,
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.push_str(text);
        }
    }
}

/// Iterates the page elements of a dump, yielding a validated record or an
/// invalid-page marker for each one.
///
/// The namespace of the document root qualifies every `page`, `title`,
/// `revision` and `text` lookup; same-named elements from other namespaces
/// are ignored. The iterator is fused: after the end of the document or the
/// first error it only returns `None`.
pub struct DumpReader<R> {
    reader: NsReader<R>,
    buf: Vec<u8>,
    /// `None` until the root element has been seen.
    root_namespace: Option<Option<Vec<u8>>>,
    depth: usize,
    page: Option<PageCapture>,
    skip_remaining: u64,
    pages_seen: u64,
    finished: bool,
}

impl DumpReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ReadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ReadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufReader::with_capacity(READ_BUFFER_BYTES, file)))
    }
}

impl<R: BufRead> DumpReader<R> {
    pub fn new(source: R) -> Self {
        let mut reader = NsReader::from_reader(source);
        let config = reader.config_mut();
        config.expand_empty_elements = true;
        config.check_end_names = true;
        Self {
            reader,
            buf: Vec::with_capacity(8192),
            root_namespace: None,
            depth: 0,
            page: None,
            skip_remaining: 0,
            pages_seen: 0,
            finished: false,
        }
    }

    /// Passes over the next `count` page elements without capturing their
    /// content. They still count towards [`pages_seen`](Self::pages_seen).
    pub fn skip_pages(&mut self, count: u64) {
        self.skip_remaining = self.skip_remaining.saturating_add(count);
    }

    /// Page elements fully read so far, skipped ones included.
    pub fn pages_seen(&self) -> u64 {
        self.pages_seen
    }

    /// Pages requested via [`skip_pages`](Self::skip_pages) that the document
    /// has not yet provided.
    pub fn pending_skips(&self) -> u64 {
        self.skip_remaining
    }

    fn next_item(&mut self) -> Result<Option<DumpItem>, ReadError> {
        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(source) => {
                    return Err(ReadError::Xml {
                        position: self.reader.buffer_position() as u64,
                        source,
                    })
                }
            };
            match event {
                Event::Start(start) => {
                    self.depth += 1;
                    let (is_ours, local) = classify(&self.reader, &start, &mut self.root_namespace);
                    if let Some(page) = self.page.as_mut() {
                        page.open(if is_ours { tag_for(&local) } else { Tag::Other });
                    } else if is_ours && local == b"page" {
                        self.page = Some(PageCapture {
                            skipping: self.skip_remaining > 0,
                            ..PageCapture::default()
                        });
                    }
                }
                Event::End(_) => {
                    self.depth = self.depth.saturating_sub(1);
                    let Some(page) = self.page.as_mut() else {
                        continue;
                    };
                    if page.close() {
                        continue;
                    }
                    if let Some(page) = self.page.take() {
                        let item =
                            finish_page(page, &mut self.pages_seen, &mut self.skip_remaining);
                        if item.is_some() {
                            return Ok(item);
                        }
                    }
                }
                Event::Text(text) => {
                    if let Some(page) = self.page.as_mut().filter(|p| p.buffer.is_some()) {
                        let unescaped = text.unescape().map_err(|e| ReadError::Xml {
                            position: self.reader.buffer_position() as u64,
                            source: quick_xml::Error::from(e),
                        })?;
                        page.push_text(&unescaped);
                    }
                }
                Event::CData(data) => {
                    if let Some(page) = self.page.as_mut() {
                        page.push_text(&String::from_utf8_lossy(&data));
                    }
                }
                Event::Eof => {
                    return match (&self.root_namespace, self.depth) {
                        (None, _) => Err(ReadError::MissingRoot),
                        (Some(_), 0) => Ok(None),
                        (Some(_), _) => Err(ReadError::Truncated),
                    };
                }
                _ => {}
            }
        }
    }
}

/// Counts a closed page element and turns its captured fields into an item;
/// skipped pages yield nothing.
fn finish_page(
    page: PageCapture,
    pages_seen: &mut u64,
    skip_remaining: &mut u64,
) -> Option<DumpItem> {
    let ordinal = *pages_seen;
    *pages_seen += 1;
    if page.skipping {
        *skip_remaining -= 1;
        if *skip_remaining == 0 {
            engine_debug!("skipped {} already processed pages", pages_seen);
        }
        return None;
    }
    let title = page.title;
    let item = match PageRecord::from_fields(title.as_deref(), page.text.as_deref()) {
        Ok(record) => DumpItem::Page(record),
        Err(reason) => DumpItem::Invalid(InvalidPage {
            ordinal,
            title: title
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            reason,
        }),
    };
    Some(item)
}

/// Resolves a start tag against the root namespace, recording the root's
/// namespace when this is the first element of the document.
fn classify<R>(
    reader: &NsReader<R>,
    start: &BytesStart<'_>,
    root_namespace: &mut Option<Option<Vec<u8>>>,
) -> (bool, Vec<u8>) {
    let (resolved, local) = reader.resolve_element(start.name());
    let namespace = match resolved {
        ResolveResult::Bound(ns) => Some(ns.as_ref().to_vec()),
        _ => None,
    };
    let local = local.as_ref().to_vec();
    match root_namespace {
        Some(root) => (*root == namespace, local),
        None => {
            *root_namespace = Some(namespace);
            // The root element itself is never a page.
            (false, local)
        }
    }
}

fn tag_for(local: &[u8]) -> Tag {
    match local {
        b"title" => Tag::Title,
        b"revision" => Tag::Revision,
        b"text" => Tag::Text,
        _ => Tag::Other,
    }
}

impl<R: BufRead> Iterator for DumpReader<R> {
    type Item = Result<DumpItem, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_item() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                self.page = None;
                Some(Err(err))
            }
        }
    }
}
