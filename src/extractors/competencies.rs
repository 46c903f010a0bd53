//! Competency units: unit name, labor-norm code, competency name, duration.
//!
//! Listings end with a synthetic practical stage carrying the sentinel code
//! `999999999`; [`PracticalStageGuard`] hides it. Rows are joined without a
//! separator, so a sentinel split across two cells is still seen.

use crate::engine::sections::{Guard, PracticalStageGuard};
use crate::engine::{Assembler, Draft, Flow, JoinStyle, Pass, RowView};
use crate::fields::has_hours;
use crate::output::CompetencyRecord;
use crate::text::{first_match, LabelRule};
use tracing::debug;

const NORM_CODE_LABEL: &str = "CODIGO NORMA DE COMPETENCIA LABORAL";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Unit,
    NormCode,
    Name,
    Duration,
}

const RULES: &[LabelRule<Field>] = &[
    LabelRule::cell("UNIDAD DE COMPETENCIA", Field::Unit),
    LabelRule::cell(NORM_CODE_LABEL, Field::NormCode),
    LabelRule::cell("NOMBRE DE LA COMPETENCIA", Field::Name),
    LabelRule::cell("DURACION MAXIMA ESTIMADA", Field::Duration),
];

impl Draft for CompetencyRecord {
    type Record = CompetencyRecord;

    fn is_empty(&self) -> bool {
        *self == CompetencyRecord::default()
    }

    fn seal(self) -> CompetencyRecord {
        self
    }
}

/// One pass producing [`CompetencyRecord`]s.
#[derive(Debug, Default)]
pub struct CompetencyPass {
    records: Assembler<CompetencyRecord>,
    guard: PracticalStageGuard,
}

impl CompetencyPass {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Pass for CompetencyPass {
    type Output = CompetencyRecord;

    fn on_row(&mut self, cells: &[Option<String>], page: usize) -> Flow {
        if cells.len() < 2 {
            return Flow::Continue;
        }
        let row = RowView::new(cells, JoinStyle::Glued);

        match self.guard.check(&row, NORM_CODE_LABEL) {
            Guard::Entered => {
                self.records.flush();
                return Flow::Continue;
            }
            Guard::Inside => return Flow::Continue,
            Guard::Open => {}
        }

        match first_match(RULES, row.first_cell(), row.normalized()) {
            Some(Field::Unit) => {
                let unit = row.normalized_value(1);
                debug!("Competency unit: {}", unit);
                self.records.begin(CompetencyRecord {
                    unidad_competencia: Some(unit),
                    ..Default::default()
                });
            }
            Some(Field::NormCode) => self.records.current().codigo_norma = Some(row.value(1)),
            Some(Field::Name) => {
                self.records.current().nombre_competencia = Some(row.normalized_value(1))
            }
            Some(Field::Duration) => {
                for cell in row.cells().iter().flatten() {
                    if cell.is_empty() || !has_hours(cell) {
                        continue;
                    }
                    if !self.records.has_record() {
                        debug!("[P{}] Ignoring hours outside a competency: {}", page, cell.trim());
                        continue;
                    }
                    self.records.current().duracion_maxima = Some(cell.trim().to_string());
                    break;
                }
            }
            None => {}
        }
        Flow::Continue
    }

    fn finish(self) -> Vec<CompetencyRecord> {
        self.records.finish()
    }
}
