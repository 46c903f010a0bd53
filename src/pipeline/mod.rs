//! Table-row sources: everything between a path and a stream of rows.
//!
//! The extraction engine never looks at geometry. It consumes a
//! [`Document`]-shaped stream (pages in order, tables in order, rows in
//! order, each row an ordered list of optional cells) through the
//! [`TableSource`] trait. This module owns the shape and its producers.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ detect ──▶ json | pdf ──▶ TableSource ──▶ extractors
//! (URL/path) (format)   (producers)    (pages)
//! ```
//!
//! 1. [`input`]: canonicalise the user-supplied path or URL to a local file
//! 2. [`detect_format`]: pick a producer from the extension or magic bytes
//! 3. [`json`] : an already tabularised document serialised as JSON
//! 4. [`pdf`]  : pdfium text segments grouped into rows and cells; runs in
//!    `spawn_blocking` because pdfium is not async-safe

pub mod input;
pub mod json;
pub mod pdf;

use crate::config::{ExtractionConfig, SourceFormat};
use crate::error::ExtractError;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// One table row: cells in column order, each text or absent.
pub type Row = Vec<Option<String>>;

/// An ordered sequence of rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table {
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }
}

/// An ordered sequence of tables on one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 1-indexed page number.
    #[serde(default)]
    pub number: usize,
    #[serde(default)]
    pub tables: Vec<Table>,
}

/// A whole document: pages in reading order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub pages: Vec<Page>,
}

impl Document {
    /// Build a single-page, single-table document from rows.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self {
            pages: vec![Page {
                number: 1,
                tables: vec![Table::new(rows)],
            }],
        }
    }

    /// Page, table and row counts, without running any extractor.
    pub fn shape(&self) -> DocumentShape {
        DocumentShape {
            pages: self.pages.len(),
            tables: self.pages.iter().map(|p| p.tables.len()).sum(),
            rows: self
                .pages
                .iter()
                .flat_map(|p| &p.tables)
                .map(|t| t.rows.len())
                .sum(),
        }
    }
}

/// Size summary reported by [`crate::inspect`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentShape {
    pub pages: usize,
    pub tables: usize,
    pub rows: usize,
}

/// Pages of a source, yielded in document order.
pub type PageIter<'a> = Box<dyn Iterator<Item = Result<Page, ExtractError>> + 'a>;

/// A producer of pages → tables → rows.
///
/// Each extraction pass calls [`TableSource::pages`] once and consumes the
/// iterator front to back. The first `Err` aborts the pass.
pub trait TableSource {
    fn pages(&mut self) -> PageIter<'_>;
}

impl TableSource for Document {
    fn pages(&mut self) -> PageIter<'_> {
        Box::new(self.pages.iter().cloned().map(Ok))
    }
}

/// Concrete producer chosen for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedFormat {
    Json,
    Pdf,
}

/// Decide how to read `path`: explicit config first, then the extension,
/// then the first non-blank bytes.
pub fn detect_format(path: &Path, requested: SourceFormat) -> Result<DetectedFormat, ExtractError> {
    match requested {
        SourceFormat::Json => return Ok(DetectedFormat::Json),
        SourceFormat::Pdf => return Ok(DetectedFormat::Pdf),
        SourceFormat::Auto => {}
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("json") => return Ok(DetectedFormat::Json),
        Some("pdf") => return Ok(DetectedFormat::Pdf),
        _ => {}
    }

    let mut head = Vec::with_capacity(64);
    std::fs::File::open(path)
        .and_then(|f| f.take(64).read_to_end(&mut head))
        .map_err(|_| ExtractError::FileNotFound {
            path: path.to_path_buf(),
        })?;

    if head.starts_with(b"%PDF") {
        return Ok(DetectedFormat::Pdf);
    }
    if head
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'{')
    {
        return Ok(DetectedFormat::Json);
    }

    let mut magic = [0u8; 4];
    for (slot, byte) in magic.iter_mut().zip(head.iter()) {
        *slot = *byte;
    }
    Err(ExtractError::UnsupportedFormat {
        path: path.to_path_buf(),
        magic,
    })
}

/// Open the table-row source for a local file.
///
/// Blocking: call from `spawn_blocking` in async contexts. The source stays
/// on the thread that opened it.
pub fn open_source(path: &Path, config: &ExtractionConfig) -> Result<Box<dyn TableSource>, ExtractError> {
    let format = detect_format(path, config.source_format)?;
    debug!("Opening {} as {:?}", path.display(), format);
    match format {
        DetectedFormat::Json => Ok(Box::new(json::JsonTableSource::open(path, &config.pages)?)),
        DetectedFormat::Pdf => Ok(Box::new(pdf::PdfTableSource::new(path, config))),
    }
}
