//! JSON table documents: the tabular shape written out by an upstream
//! table finder.
//!
//! ```json
//! { "pages": [ { "number": 1, "tables": [ [ ["Código programa", "228118"], [null, ""] ] ] } ] }
//! ```
//!
//! Missing page numbers are filled with the 1-indexed position.

use super::{Document, Page, PageIter, TableSource};
use crate::config::PageSelection;
use crate::error::ExtractError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A [`TableSource`] backed by a parsed JSON document.
#[derive(Debug, Clone)]
pub struct JsonTableSource {
    path: PathBuf,
    document: Document,
}

impl JsonTableSource {
    /// Read and parse `path`, keeping only the selected pages.
    pub fn open(path: &Path, selection: &PageSelection) -> Result<Self, ExtractError> {
        let raw = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => ExtractError::PermissionDenied {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::NotFound => ExtractError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => ExtractError::MalformedSource {
                path: path.to_path_buf(),
                detail: e.to_string(),
            },
        })?;
        let document = parse_document(&raw, selection).map_err(|detail| {
            ExtractError::MalformedSource {
                path: path.to_path_buf(),
                detail,
            }
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            document,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

impl TableSource for JsonTableSource {
    fn pages(&mut self) -> PageIter<'_> {
        self.document.pages()
    }
}

/// Parse a JSON document string and apply the page selection.
pub fn parse_document(raw: &str, selection: &PageSelection) -> Result<Document, String> {
    let mut document: Document = serde_json::from_str(raw).map_err(|e| e.to_string())?;

    for (idx, page) in document.pages.iter_mut().enumerate() {
        if page.number == 0 {
            page.number = idx + 1;
        }
    }

    let total = document.pages.len();
    let keep = selection.to_indices(total);
    if keep.len() != total {
        debug!("Keeping {}/{} pages", keep.len(), total);
        let mut pages: Vec<Option<Page>> = document.pages.into_iter().map(Some).collect();
        document.pages = keep.into_iter().filter_map(|i| pages[i].take()).collect();
    }

    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "pages": [
            { "tables": [ [ ["A", null] ] ] },
            { "number": 7, "tables": [] },
            { "tables": [ [ ["B"] ], [ [] ] ] }
        ]
    }"#;

    #[test]
    fn fills_missing_page_numbers() {
        let doc = parse_document(DOC, &PageSelection::All).unwrap();
        let numbers: Vec<usize> = doc.pages.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 7, 3]);
        assert_eq!(doc.pages[0].tables[0].rows[0], vec![Some("A".to_string()), None]);
    }

    #[test]
    fn applies_page_selection_in_order() {
        let doc = parse_document(DOC, &PageSelection::Set(vec![3, 1])).unwrap();
        let numbers: Vec<usize> = doc.pages.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 3]);
    }

    #[test]
    fn rejects_wrong_shape() {
        let err = parse_document(r#"{"pages": [{"tables": "nope"}]}"#, &PageSelection::All).unwrap_err();
        assert!(err.contains("invalid type"), "got: {err}");
        assert!(parse_document("[]", &PageSelection::All).is_err());
    }

    #[test]
    fn open_reports_missing_file() {
        let err = JsonTableSource::open(Path::new("/no/such/doc.json"), &PageSelection::All).unwrap_err();
        assert!(matches!(err, ExtractError::FileNotFound { .. }));
    }

    #[test]
    fn open_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, DOC).unwrap();
        let mut source = JsonTableSource::open(&path, &PageSelection::Single(2)).unwrap();
        assert_eq!(source.path(), path.as_path());
        let pages: Vec<Page> = source.pages().map(Result::unwrap).collect();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].number, 7);
    }
}
