//! Program metadata: name, code, version, validity, stage hours, type, title.
//!
//! Labels are matched in the first cell and the value sits in the second.
//! The duration table spans several rows and is handled by
//! [`DurationBlock`]; while it is open the type and title labels are not
//! consulted.

use crate::engine::sections::{DurationBlock, FilledHours, StageHours};
use crate::engine::{Assembler, Draft, Flow, JoinStyle, Pass, RowView};
use crate::output::ProgramRecord;
use crate::text::{first_match, LabelRule};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Code,
    Version,
    Validity,
    Duration,
    Kind,
    Title,
}

/// Rules before the duration block check.
const HEAD_RULES: &[LabelRule<Field>] = &[
    LabelRule::cell("DENOMINACION DEL PROGRAMA", Field::Name),
    LabelRule::cell("CODIGO PROGRAMA", Field::Code),
    LabelRule::cell("VERSION PROGRAMA", Field::Version),
    LabelRule::cell("VIGENCIA DEL PROGRAMA", Field::Validity),
    LabelRule::cell("DURACION MAXIMA ESTIMADA DEL APRENDIZAJE (HORAS)", Field::Duration),
];

/// Rules consulted only outside the duration block.
const TAIL_RULES: &[LabelRule<Field>] = &[
    LabelRule::cell("TIPO DE PROGRAMA", Field::Kind),
    LabelRule::cell("TITULO O CERTIFICADO QUE OBTENDRA", Field::Title),
];

impl Draft for ProgramRecord {
    type Record = ProgramRecord;

    fn is_empty(&self) -> bool {
        *self == ProgramRecord::default()
    }

    fn seal(self) -> ProgramRecord {
        self
    }
}

fn filled(record: Option<&ProgramRecord>) -> FilledHours {
    record.map_or_else(FilledHours::default, |r| FilledHours {
        classroom: r.horas_etapa_lectiva.is_some(),
        productive: r.horas_etapa_productiva.is_some(),
        totals: r.horas_totales.is_some(),
    })
}

/// One pass producing [`ProgramRecord`]s.
#[derive(Debug, Default)]
pub struct ProgramPass {
    records: Assembler<ProgramRecord>,
    duration: DurationBlock,
}

impl ProgramPass {
    pub fn new() -> Self {
        Self::default()
    }

    fn store_hours(&mut self, captured: Option<(StageHours, String)>) {
        let Some((stage, hours)) = captured else {
            return;
        };
        debug!("{:?} hours: {}", stage, hours);
        let record = self.records.current();
        let slot = match stage {
            StageHours::Classroom => &mut record.horas_etapa_lectiva,
            StageHours::Productive => &mut record.horas_etapa_productiva,
            StageHours::Totals => &mut record.horas_totales,
        };
        *slot = Some(hours);
    }
}

impl Pass for ProgramPass {
    type Output = ProgramRecord;

    fn on_row(&mut self, cells: &[Option<String>], _page: usize) -> Flow {
        if cells.is_empty() {
            return Flow::Continue;
        }
        let row = RowView::new(cells, JoinStyle::Trimmed);

        if let Some(field) = first_match(HEAD_RULES, row.first_cell(), row.normalized()) {
            let value = row.value(1);
            match field {
                Field::Name => {
                    debug!("Program: {}", value);
                    self.records.begin(ProgramRecord {
                        nombre_programa: Some(value),
                        ..Default::default()
                    });
                }
                Field::Code => self.records.current().codigo_programa = Some(value),
                Field::Version => self.records.current().version_programa = Some(value),
                Field::Validity => self.records.current().vigencia = Some(value),
                Field::Duration => {
                    let filled = filled(self.records.peek());
                    let captured = self.duration.enter(&row, filled);
                    self.store_hours(captured);
                }
                Field::Kind | Field::Title => {}
            }
            return Flow::Continue;
        }

        if self.duration.is_active() {
            let filled = filled(self.records.peek());
            let captured = self.duration.observe(&row, filled);
            self.store_hours(captured);
            return Flow::Continue;
        }

        match first_match(TAIL_RULES, row.first_cell(), row.normalized()) {
            Some(Field::Kind) => self.records.current().tipo = Some(row.value(1)),
            Some(Field::Title) => self.records.current().titulo = Some(row.value(1)),
            _ => {}
        }
        Flow::Continue
    }

    fn finish(self) -> Vec<ProgramRecord> {
        self.records.finish()
    }
}
