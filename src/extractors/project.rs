//! Formative project basic information.
//!
//! Nothing is captured before the `INFORMACION BASICA DEL PROYECTO` heading.
//! The project and program codes share one row with their labels; they are
//! picked positionally (see [`long_codes`]).

use crate::engine::sections::SectionGate;
use crate::engine::{Assembler, Draft, Flow, JoinStyle, Pass, RowView};
use crate::fields::long_codes;
use crate::output::ProjectRecord;
use crate::text::{contains_label, first_match, LabelRule};
use tracing::debug;

const PROJECT_CODE_LABEL: &str = "CODIGO PROYECTO SOFIA";
const PROGRAM_CODE_LABEL: &str = "CODIGO DEL PROGRAMA SOFIA";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Center,
    Region,
    Name,
    Program,
}

impl Field {
    /// Column holding the value.
    fn column(self) -> usize {
        match self {
            Field::Region => 3,
            _ => 1,
        }
    }
}

const RULES: &[LabelRule<Field>] = &[
    LabelRule::cell("CENTRO DE FORMACION", Field::Center),
    LabelRule::row("REGIONAL", Field::Region),
    LabelRule::cell("NOMBRE DEL PROYECTO", Field::Name),
    LabelRule::cell("PROGRAMA DE FORMACION AL QUE DA RESPUESTA", Field::Program),
];

impl Draft for ProjectRecord {
    type Record = ProjectRecord;

    fn is_empty(&self) -> bool {
        *self == ProjectRecord::default()
    }

    fn seal(self) -> ProjectRecord {
        self
    }
}

/// One pass producing at most one [`ProjectRecord`].
#[derive(Debug)]
pub struct ProjectPass {
    records: Assembler<ProjectRecord>,
    gate: SectionGate,
}

impl Default for ProjectPass {
    fn default() -> Self {
        Self {
            records: Assembler::new(),
            gate: SectionGate::new("INFORMACION BASICA DEL PROYECTO"),
        }
    }
}

impl ProjectPass {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Pass for ProjectPass {
    type Output = ProjectRecord;

    fn on_row(&mut self, cells: &[Option<String>], _page: usize) -> Flow {
        if cells.is_empty() {
            return Flow::Continue;
        }
        let row = RowView::new(cells, JoinStyle::Trimmed);
        if self.gate.is_marker(&row) || !self.gate.is_open() {
            return Flow::Continue;
        }

        let normalized = row.normalized();
        if contains_label(normalized, PROJECT_CODE_LABEL) && contains_label(normalized, PROGRAM_CODE_LABEL) {
            let codes = long_codes(row.cells().iter().map(|c| c.as_deref()));
            let record = self.records.current();
            if let Some(project) = codes.project {
                debug!("Project code: {}", project);
                record.codigo_proyecto = Some(project);
            }
            if let Some(program) = codes.program {
                debug!("Program code: {}", program);
                record.codigo_programa = Some(program);
            }
            return Flow::Continue;
        }

        if let Some(field) = first_match(RULES, row.first_cell(), normalized) {
            let value = row.value(field.column());
            debug!("{:?}: {}", field, value);
            let record = self.records.current();
            let slot = match field {
                Field::Center => &mut record.centro_formacion,
                Field::Region => &mut record.regional,
                Field::Name => &mut record.nombre_proyecto,
                Field::Program => &mut record.programa_formacion,
            };
            *slot = Some(value);
        }
        Flow::Continue
    }

    fn finish(self) -> Vec<ProjectRecord> {
        self.records.finish()
    }
}
