//! PDF table-row source: pdfium text segments grouped into rows and cells.
//!
//! pdfium reports each run of text with its bounding box. Segments whose
//! vertical centres lie within `row_tolerance` points share a row; inside a
//! row, a horizontal gap wider than `column_gap` points starts a new cell.
//! Each page becomes one table. This is deliberately coarse: the extractors
//! only rely on row order and on column adjacency (label in the first cell,
//! value in the second).
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which uses thread-local
//! state and is not safe to call from async contexts. Callers in async code
//! run the whole pass inside `tokio::task::spawn_blocking`.

use super::{Page, PageIter, Row, Table, TableSource};
use crate::config::{ExtractionConfig, PageSelection};
use crate::error::ExtractError;
use pdfium_render::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Geometry thresholds used to rebuild rows, in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowLayout {
    pub row_tolerance: f32,
    pub column_gap: f32,
}

/// A positioned run of text on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub text: String,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Fragment {
    fn center_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }
}

/// A [`TableSource`] reading a PDF through pdfium.
///
/// pdfium is bound on the first call to [`TableSource::pages`] and kept for
/// the life of the source. Pages are read one at a time as the iterator is
/// pulled, so a pass that stops early never touches the remaining pages.
pub struct PdfTableSource {
    path: PathBuf,
    password: Option<String>,
    selection: PageSelection,
    layout: RowLayout,
    pdfium: Option<Pdfium>,
}

impl fmt::Debug for PdfTableSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdfTableSource")
            .field("path", &self.path)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("selection", &self.selection)
            .field("layout", &self.layout)
            .field("bound", &self.pdfium.is_some())
            .finish()
    }
}

impl PdfTableSource {
    pub fn new(path: &Path, config: &ExtractionConfig) -> Self {
        Self {
            path: path.to_path_buf(),
            password: config.password.clone(),
            selection: config.pages.clone(),
            layout: RowLayout {
                row_tolerance: config.row_tolerance,
                column_gap: config.column_gap,
            },
            pdfium: None,
        }
    }

    fn open_document<'a>(
        pdfium: &'a Pdfium,
        path: &Path,
        password: Option<&'a str>,
    ) -> Result<PdfDocument<'a>, ExtractError> {
        pdfium.load_pdf_from_file(path, password).map_err(|e| {
            let err_str = format!("{:?}", e);
            if err_str.contains("Password") || err_str.contains("password") {
                if password.is_some() {
                    ExtractError::WrongPassword {
                        path: path.to_path_buf(),
                    }
                } else {
                    ExtractError::PasswordRequired {
                        path: path.to_path_buf(),
                    }
                }
            } else {
                ExtractError::CorruptPdf {
                    path: path.to_path_buf(),
                    detail: err_str,
                }
            }
        })
    }

    /// Bind pdfium if needed, load the document and resolve the page indices.
    fn prepare(&mut self) -> Result<(PdfDocument<'_>, Vec<usize>), ExtractError> {
        if self.pdfium.is_none() {
            self.pdfium = Some(bind_pdfium()?);
        }
        let pdfium = self
            .pdfium
            .as_ref()
            .ok_or_else(|| ExtractError::PdfiumBindingFailed("pdfium not bound".into()))?;

        let document = Self::open_document(pdfium, &self.path, self.password.as_deref())?;
        let total_pages = document.pages().len() as usize;
        info!("PDF loaded: {} pages", total_pages);

        let indices = self.selection.to_indices(total_pages);
        if indices.is_empty() {
            return Err(ExtractError::PageOutOfRange {
                page: 0,
                total: total_pages,
            });
        }
        Ok((document, indices))
    }
}

/// Read one page (0-based `idx`) into a single-table [`Page`].
fn read_page(document: &PdfDocument<'_>, idx: usize, layout: RowLayout) -> Result<Page, ExtractError> {
    let page = document
        .pages()
        .get(idx as u16)
        .map_err(|e| ExtractError::PageReadFailed {
            page: idx + 1,
            detail: format!("{:?}", e),
        })?;
    let text = page.text().map_err(|e| ExtractError::PageReadFailed {
        page: idx + 1,
        detail: format!("{:?}", e),
    })?;

    let fragments: Vec<Fragment> = text
        .segments()
        .iter()
        .filter_map(|segment| {
            let s = segment.text();
            if s.trim().is_empty() {
                return None;
            }
            let bounds = segment.bounds();
            Some(Fragment {
                text: s,
                left: bounds.left().value,
                right: bounds.right().value,
                top: bounds.top().value,
                bottom: bounds.bottom().value,
            })
        })
        .collect();

    let rows = group_rows(fragments, layout);
    debug!("Page {} → {} rows", idx + 1, rows.len());
    if rows.is_empty() {
        warn!("Page {} has no extractable text", idx + 1);
    }

    Ok(Page {
        number: idx + 1,
        tables: vec![Table::new(rows)],
    })
}

impl TableSource for PdfTableSource {
    fn pages(&mut self) -> PageIter<'_> {
        let layout = self.layout;
        match self.prepare() {
            Ok((document, indices)) => Box::new(
                indices
                    .into_iter()
                    .map(move |idx| read_page(&document, idx, layout)),
            ),
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }
}

/// Bind pdfium from `PDFIUM_LIB_PATH` when set, else from the system.
fn bind_pdfium() -> Result<Pdfium, ExtractError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(path),
        _ => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| ExtractError::PdfiumBindingFailed(format!("{:?}", e)))?;
    Ok(Pdfium::new(bindings))
}

/// Rebuild rows from positioned fragments: top to bottom, left to right.
pub fn group_rows(mut fragments: Vec<Fragment>, layout: RowLayout) -> Vec<Row> {
    // PDF y grows upwards: higher centre first.
    fragments.sort_by(|a, b| {
        b.center_y()
            .total_cmp(&a.center_y())
            .then(a.left.total_cmp(&b.left))
    });

    let mut lines: Vec<Vec<Fragment>> = Vec::new();
    let mut line_y = f32::NAN;
    for fragment in fragments {
        let y = fragment.center_y();
        match lines.last_mut() {
            Some(line) if (line_y - y).abs() <= layout.row_tolerance => line.push(fragment),
            _ => {
                line_y = y;
                lines.push(vec![fragment]);
            }
        }
    }

    lines
        .into_iter()
        .map(|mut line| {
            line.sort_by(|a, b| a.left.total_cmp(&b.left));
            let mut cells: Vec<Option<String>> = Vec::new();
            let mut current = String::new();
            let mut prev_right: Option<f32> = None;
            for fragment in line {
                if let Some(right) = prev_right {
                    if fragment.left - right > layout.column_gap {
                        cells.push(Some(std::mem::take(&mut current)));
                    } else if !current.is_empty() {
                        current.push(' ');
                    }
                }
                current.push_str(fragment.text.trim());
                prev_right = Some(prev_right.map_or(fragment.right, |r| r.max(fragment.right)));
            }
            cells.push(Some(current));
            cells
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYOUT: RowLayout = RowLayout {
        row_tolerance: 3.0,
        column_gap: 12.0,
    };

    fn frag(text: &str, left: f32, right: f32, y: f32) -> Fragment {
        Fragment {
            text: text.to_string(),
            left,
            right,
            top: y + 5.0,
            bottom: y - 5.0,
        }
    }

    fn cells(row: &Row) -> Vec<&str> {
        row.iter().map(|c| c.as_deref().unwrap_or("")).collect()
    }

    #[test]
    fn groups_by_line_then_column() {
        let rows = group_rows(
            vec![
                frag("228118", 300.0, 340.0, 700.0),
                frag("Código", 50.0, 80.0, 701.0),
                frag("programa", 82.0, 120.0, 699.5),
                frag("Versión programa", 50.0, 130.0, 680.0),
                frag("102", 300.0, 315.0, 680.0),
            ],
            LAYOUT,
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(cells(&rows[0]), vec!["Código programa", "228118"]);
        assert_eq!(cells(&rows[1]), vec!["Versión programa", "102"]);
    }

    #[test]
    fn single_fragment_row() {
        let rows = group_rows(vec![frag("TOTAL", 10.0, 40.0, 100.0)], LAYOUT);
        assert_eq!(rows, vec![vec![Some("TOTAL".to_string())]]);
    }

    #[test]
    fn empty_page_has_no_rows() {
        assert!(group_rows(Vec::new(), LAYOUT).is_empty());
    }

    #[test]
    fn reading_without_pdfium_or_file_fails() {
        let config = ExtractionConfig::default();
        let mut source = PdfTableSource::new(Path::new("/no/such/file.pdf"), &config);
        let first = source.pages().next().expect("one item");
        assert!(first.is_err());
    }

    #[test]
    fn failed_open_yields_a_single_error_then_ends() {
        let config = ExtractionConfig::default();
        let mut source = PdfTableSource::new(Path::new("/no/such/file.pdf"), &config);
        let items: Vec<_> = source.pages().collect();
        assert_eq!(items.len(), 1);
        assert!(items[0].is_err());
        assert!(format!("{source:?}").contains("/no/such/file.pdf"));
    }
}
