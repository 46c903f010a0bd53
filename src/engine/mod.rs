//! The row-stream engine shared by every record family.
//!
//! A pass is a small state machine fed one row at a time, in document order
//! (page → table → row). It never sees geometry, only cells. Three pieces are
//! shared across families:
//!
//! * [`RowView`]: the per-row derived text every rule matches against;
//! * [`Assembler`]: the single record in progress and its flush policy;
//! * [`run`]: the driver that walks a [`TableSource`] and honours
//!   [`Flow::SkipTable`].
//!
//! Section state machines live in [`sections`].
//!
//! ## Why an owned assembler?
//!
//! Each family keeps exactly one record in progress. Holding it in an
//! `Option<D>` owned by the pass makes "at most one record in progress" and
//! "flushed records are never touched again" properties of the type: a
//! flushed draft is moved into the output vector and sealed into its record
//! type, so there is nothing left to mutate.

pub mod sections;

use crate::error::ExtractError;
use crate::pipeline::TableSource;
use crate::text::normalize;
use std::fmt;
use tracing::trace;

// ── Row view ─────────────────────────────────────────────────────────────

/// How a row's cells are joined into its raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinStyle {
    /// Each non-empty cell trimmed, joined by one space.
    Trimmed,
    /// Non-empty cells verbatim, joined by one space, ends trimmed.
    Spaced,
    /// Non-empty cells verbatim with no separator, ends trimmed.
    Glued,
}

/// One row plus the text derived from it for matching.
#[derive(Debug, Clone)]
pub struct RowView<'a> {
    cells: &'a [Option<String>],
    first_cell: String,
    text: String,
    normalized: String,
}

impl<'a> RowView<'a> {
    pub fn new(cells: &'a [Option<String>], style: JoinStyle) -> Self {
        let present = cells.iter().flatten().filter(|c| !c.is_empty());
        let text = match style {
            JoinStyle::Trimmed => present.map(|c| c.trim()).collect::<Vec<_>>().join(" "),
            JoinStyle::Spaced => present.map(String::as_str).collect::<Vec<_>>().join(" "),
            JoinStyle::Glued => present.map(String::as_str).collect::<String>(),
        };
        let text = text.trim().to_string();
        let normalized = normalize(&text);
        let first_cell = cells
            .first()
            .and_then(|c| c.as_deref())
            .map(normalize)
            .unwrap_or_default();
        Self {
            cells,
            first_cell,
            text,
            normalized,
        }
    }

    pub fn cells(&self) -> &'a [Option<String>] {
        self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// No cell carries any text: every cell absent or empty.
    pub fn has_no_text(&self) -> bool {
        self.cells.iter().all(|c| c.as_deref().is_none_or(str::is_empty))
    }

    /// Every cell absent or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.cells
            .iter()
            .all(|c| c.as_deref().is_none_or(|s| s.trim().is_empty()))
    }

    /// Normalised first cell; empty when the row has none.
    pub fn first_cell(&self) -> &str {
        &self.first_cell
    }

    /// Raw joined text of the row.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Normalised joined text of the row.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Raw cell at `idx`, if present.
    pub fn cell(&self, idx: usize) -> Option<&'a str> {
        self.cells.get(idx).and_then(|c| c.as_deref())
    }

    /// Cell at `idx` trimmed; empty string when missing.
    pub fn value(&self, idx: usize) -> String {
        self.cell(idx).map(str::trim).unwrap_or_default().to_string()
    }

    /// Cell at `idx` normalised; empty string when missing.
    pub fn normalized_value(&self, idx: usize) -> String {
        self.cell(idx).map(normalize).unwrap_or_default()
    }
}

// ── Record assembly ──────────────────────────────────────────────────────

/// A record under construction.
pub trait Draft: Default {
    /// What a flushed draft becomes.
    type Record: fmt::Debug;

    /// True when no field has been captured.
    fn is_empty(&self) -> bool;

    /// Turn the draft into its output record (list fields are joined here).
    fn seal(self) -> Self::Record;
}

/// Owns the record in progress and the records already flushed.
#[derive(Debug)]
pub struct Assembler<D: Draft> {
    current: Option<D>,
    records: Vec<D::Record>,
}

impl<D: Draft> Default for Assembler<D> {
    fn default() -> Self {
        Self {
            current: None,
            records: Vec::new(),
        }
    }
}

impl<D: Draft> Assembler<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flush the record in progress and start `draft`.
    pub fn begin(&mut self, draft: D) {
        self.flush();
        self.current = Some(draft);
    }

    /// The record in progress, created empty when there is none.
    pub fn current(&mut self) -> &mut D {
        self.current.get_or_insert_with(D::default)
    }

    /// The record in progress, without creating one.
    pub fn peek(&self) -> Option<&D> {
        self.current.as_ref()
    }

    /// True when a record with at least one field is in progress.
    pub fn has_record(&self) -> bool {
        self.current.as_ref().is_some_and(|d| !d.is_empty())
    }

    /// Move a non-empty record in progress to the output.
    pub fn flush(&mut self) {
        if let Some(draft) = self.current.take() {
            if !draft.is_empty() {
                self.records.push(draft.seal());
            }
        }
    }

    /// Records flushed so far.
    pub fn records(&self) -> &[D::Record] {
        &self.records
    }

    /// End of stream: flush unconditionally and return everything.
    pub fn finish(mut self) -> Vec<D::Record> {
        self.flush();
        self.records
    }

    /// End of stream: flush the last record only when `keep` accepts it.
    pub fn finish_if(mut self, keep: impl FnOnce(&D) -> bool) -> Vec<D::Record> {
        if let Some(draft) = self.current.take() {
            if !draft.is_empty() && keep(&draft) {
                self.records.push(draft.seal());
            }
        }
        self.records
    }
}

// ── Driver ───────────────────────────────────────────────────────────────

/// What the driver does after a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Go on to the next row.
    Continue,
    /// Ignore the remaining rows of the current table.
    SkipTable,
}

/// One extraction pass over a row stream.
pub trait Pass {
    type Output;

    /// Handle one row. `page` is the 1-indexed page number.
    fn on_row(&mut self, cells: &[Option<String>], page: usize) -> Flow;

    /// End of stream: final flush.
    fn finish(self) -> Vec<Self::Output>;
}

/// Feed every row of `source` to `pass`, in document order.
///
/// The first source error aborts the pass; no partial records are returned.
pub fn run<P, S>(mut pass: P, source: &mut S) -> Result<Vec<P::Output>, ExtractError>
where
    P: Pass,
    S: TableSource + ?Sized,
{
    for page in source.pages() {
        let page = page?;
        for (t, table) in page.tables.iter().enumerate() {
            for row in &table.rows {
                if pass.on_row(row, page.number) == Flow::SkipTable {
                    trace!("Page {} table {}: skipping remaining rows", page.number, t + 1);
                    break;
                }
            }
        }
    }
    Ok(pass.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Document, Page, PageIter, Table};

    fn row(cells: &[Option<&str>]) -> Vec<Option<String>> {
        cells.iter().map(|c| c.map(str::to_string)).collect()
    }

    #[test]
    fn row_view_join_styles() {
        let cells = row(&[Some(" Código "), None, Some(""), Some("99999"), Some("9999 ")]);
        assert_eq!(RowView::new(&cells, JoinStyle::Trimmed).text(), "Código 99999 9999");
        assert_eq!(RowView::new(&cells, JoinStyle::Spaced).text(), "Código  99999 9999");
        assert_eq!(RowView::new(&cells, JoinStyle::Glued).text(), "Código 999999999");
        let view = RowView::new(&cells, JoinStyle::Spaced);
        assert_eq!(view.normalized(), "CODIGO 99999 9999");
        assert_eq!(view.first_cell(), "CODIGO");
    }

    #[test]
    fn row_view_values() {
        let cells = row(&[None, Some("  Análisis  ")]);
        let view = RowView::new(&cells, JoinStyle::Trimmed);
        assert_eq!(view.first_cell(), "");
        assert_eq!(view.value(1), "Análisis");
        assert_eq!(view.normalized_value(1), "ANALISIS");
        assert_eq!(view.value(5), "");
        assert_eq!(view.cell(0), None);
    }

    #[test]
    fn row_view_blankness() {
        let blank = row(&[None, Some("  ")]);
        let view = RowView::new(&blank, JoinStyle::Trimmed);
        assert!(view.is_blank());
        assert!(!view.has_no_text());
        let empty = row(&[None, Some("")]);
        assert!(RowView::new(&empty, JoinStyle::Spaced).has_no_text());
    }

    #[derive(Debug, Default)]
    struct Note {
        title: Option<String>,
        lines: Vec<String>,
    }

    impl Draft for Note {
        type Record = String;

        fn is_empty(&self) -> bool {
            self.title.is_none() && self.lines.is_empty()
        }

        fn seal(self) -> String {
            format!("{}:{}", self.title.unwrap_or_default(), self.lines.join("|"))
        }
    }

    #[test]
    fn assembler_flushes_on_begin_and_finish() {
        let mut asm = Assembler::<Note>::new();
        asm.current().lines.push("orphan".into());
        asm.begin(Note { title: Some("A".into()), ..Default::default() });
        asm.current().lines.push("a1".into());
        asm.begin(Note { title: Some("B".into()), ..Default::default() });
        assert_eq!(asm.records(), &[":orphan".to_string(), "A:a1".to_string()]);
        assert_eq!(asm.finish(), vec![":orphan", "A:a1", "B:"]);
    }

    #[test]
    fn assembler_skips_empty_drafts() {
        let mut asm = Assembler::<Note>::new();
        let _ = asm.current();
        assert!(!asm.has_record());
        asm.flush();
        assert!(asm.records().is_empty());
        assert!(asm.finish().is_empty());
    }

    #[test]
    fn assembler_finish_if_drops_rejected_tail() {
        let mut asm = Assembler::<Note>::new();
        asm.begin(Note { title: Some("keep".into()), ..Default::default() });
        asm.begin(Note { title: None, lines: vec!["tail".into()] });
        assert_eq!(asm.finish_if(|d| d.title.is_some()), vec!["keep:"]);
    }

    /// Records every first cell it sees; skips the table after "STOP".
    #[derive(Default)]
    struct Collect(Vec<String>);

    impl Pass for Collect {
        type Output = String;

        fn on_row(&mut self, cells: &[Option<String>], page: usize) -> Flow {
            let view = RowView::new(cells, JoinStyle::Trimmed);
            self.0.push(format!("{page}:{}", view.first_cell()));
            if view.first_cell() == "STOP" {
                Flow::SkipTable
            } else {
                Flow::Continue
            }
        }

        fn finish(self) -> Vec<String> {
            self.0
        }
    }

    #[test]
    fn run_walks_in_order_and_skips_tables() {
        let mut doc = Document {
            pages: vec![
                Page {
                    number: 1,
                    tables: vec![
                        Table::new(vec![row(&[Some("a")]), row(&[Some("stop")]), row(&[Some("hidden")])]),
                        Table::new(vec![row(&[Some("b")])]),
                    ],
                },
                Page { number: 2, tables: vec![Table::new(vec![row(&[Some("c")])])] },
            ],
        };
        let seen = run(Collect::default(), &mut doc).unwrap();
        assert_eq!(seen, vec!["1:A", "1:STOP", "1:B", "2:C"]);
    }

    struct Failing;

    impl TableSource for Failing {
        fn pages(&mut self) -> PageIter<'_> {
            Box::new(
                vec![
                    Ok(Page { number: 1, tables: vec![Table::new(vec![row(&[Some("a")])])] }),
                    Err(ExtractError::PageReadFailed { page: 2, detail: "boom".into() }),
                ]
                .into_iter(),
            )
        }
    }

    #[test]
    fn run_aborts_on_source_error() {
        let err = run(Collect::default(), &mut Failing).unwrap_err();
        assert!(matches!(err, ExtractError::PageReadFailed { page: 2, .. }));
    }
}
