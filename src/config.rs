//! Configuration types for curriculum extraction.
//!
//! Everything an extraction run can vary lives in [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. The row engine itself has no knobs:
//! label tables and section rules are fixed per record family. What varies is
//! how the table-row source is read (format, pages, password, PDF geometry
//! thresholds) and how the async API schedules passes.

use crate::error::ExtractError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration for one extraction run.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use curriculum_extract::{ExtractionConfig, PageSelection, SourceFormat};
///
/// let config = ExtractionConfig::builder()
///     .source_format(SourceFormat::Json)
///     .pages(PageSelection::Range(1, 12))
///     .concurrency(2)
///     .build()
///     .unwrap();
/// assert_eq!(config.concurrency, 2);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Maximum passes run at once in "all" mode. Default: 6.
    ///
    /// Each pass opens its own source on the blocking pool. Six covers every
    /// record family at once; lower it when PDF sources are large and memory
    /// is tight.
    pub concurrency: usize,

    /// How to read the input. Default: [`SourceFormat::Auto`].
    pub source_format: SourceFormat,

    /// Page selection. Default: All pages.
    pub pages: PageSelection,

    /// Vertical distance, in PDF points, under which two text runs share a
    /// row. Default: 3.0.
    pub row_tolerance: f32,

    /// Horizontal gap, in PDF points, that starts a new cell. Default: 12.0.
    pub column_gap: f32,

    /// Receives pass lifecycle events. Default: None.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            password: None,
            download_timeout_secs: 120,
            concurrency: 6,
            source_format: SourceFormat::default(),
            pages: PageSelection::default(),
            row_tolerance: 3.0,
            column_gap: 12.0,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("concurrency", &self.concurrency)
            .field("source_format", &self.source_format)
            .field("pages", &self.pages)
            .field("row_tolerance", &self.row_tolerance)
            .field("column_gap", &self.column_gap)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn source_format(mut self, format: SourceFormat) -> Self {
        self.config.source_format = format;
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn row_tolerance(mut self, points: f32) -> Self {
        self.config.row_tolerance = points;
        self
    }

    pub fn column_gap(mut self, points: f32) -> Self {
        self.config.column_gap = points;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(ExtractError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.download_timeout_secs == 0 {
            return Err(ExtractError::InvalidConfig(
                "Download timeout must be ≥ 1 second".into(),
            ));
        }
        if !(c.row_tolerance.is_finite() && c.row_tolerance >= 0.0) {
            return Err(ExtractError::InvalidConfig(format!(
                "Row tolerance must be a non-negative number of points, got {}",
                c.row_tolerance
            )));
        }
        if !(c.column_gap.is_finite() && c.column_gap > 0.0) {
            return Err(ExtractError::InvalidConfig(format!(
                "Column gap must be a positive number of points, got {}",
                c.column_gap
            )));
        }
        if let PageSelection::Range(start, end) = c.pages {
            if start == 0 || end < start {
                return Err(ExtractError::InvalidConfig(format!(
                    "Page range {start}-{end} is empty (pages are 1-indexed)"
                )));
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How the input document is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Pick by extension, then by the first bytes. (default)
    #[default]
    Auto,
    /// A JSON document with the pages → tables → rows shape.
    Json,
    /// A PDF read through pdfium.
    Pdf,
}

impl std::str::FromStr for SourceFormat {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(SourceFormat::Auto),
            "json" => Ok(SourceFormat::Json),
            "pdf" => Ok(SourceFormat::Pdf),
            other => Err(ExtractError::InvalidConfig(format!(
                "Unknown source format '{other}' (expected auto, json or pdf)"
            ))),
        }
    }
}

/// Specifies which pages of the document to read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Read all pages (default).
    #[default]
    All,
    /// Read a single page (1-indexed).
    Single(usize),
    /// Read a contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Read specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    ///
    /// Sorting keeps document order, which the row engine depends on.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}
