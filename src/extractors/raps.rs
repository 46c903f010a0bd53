//! Learning-outcome bundles: one per competency unit.
//!
//! Each bundle collects four lists under their headers (outcomes, process
//! knowledge, evaluation criteria, theoretical knowledge). Exactly one list
//! is active at a time, tracked by [`CaptureSection`]. Captured content is
//! the raw row text, so bullets and numbering survive for later structuring
//! (see [`crate::structure`]).
//!
//! Unlike the competency listing, this family has no full practical-stage
//! guard: only the sentinel code is refused as a competency code, and the
//! final bundle is kept only when it carries a code.

use crate::engine::sections::{CaptureSection, SENTINEL_CODE};
use crate::engine::{Assembler, Draft, Flow, JoinStyle, Pass, RowView};
use crate::output::RapUnitRecord;
use crate::text::{contains_any, first_match, normalize, LabelRule};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Page furniture repeated on every sheet.
const IGNORED: &[&str] = &[
    "LINEA TECNOLOGICA",
    "RED TECNOLOGICA",
    "RED DE CONOCIMIENTO",
    "DENOMINACION",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Unit,
    Code,
    Name,
}

const RULES: &[LabelRule<Field>] = &[
    LabelRule::cell("UNIDAD DE COMPETENCIA", Field::Unit),
    LabelRule::cell("CODIGO NORMA DE COMPETENCIA LABORAL", Field::Code),
    LabelRule::cell("NOMBRE DE LA COMPETENCIA", Field::Name),
];

/// Outcome lines that are really the next section's heading.
static RE_MISFILED_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*4\.6\s*CONOCIMIENTOS").unwrap());

/// A bundle under construction. `None` lists were never opened by a header.
#[derive(Debug, Default)]
pub struct RapDraft {
    codigo_competencia: Option<String>,
    competencia: Option<String>,
    outcomes: Option<Vec<String>>,
    process: Option<Vec<String>>,
    criteria: Option<Vec<String>>,
    theory: Option<Vec<String>>,
}

impl RapDraft {
    fn list_mut(&mut self, section: CaptureSection) -> Option<&mut Option<Vec<String>>> {
        match section {
            CaptureSection::None => None,
            CaptureSection::Outcomes => Some(&mut self.outcomes),
            CaptureSection::ProcessKnowledge => Some(&mut self.process),
            CaptureSection::EvaluationCriteria => Some(&mut self.criteria),
            CaptureSection::TheoreticalKnowledge => Some(&mut self.theory),
        }
    }
}

impl Draft for RapDraft {
    type Record = RapUnitRecord;

    fn is_empty(&self) -> bool {
        self.codigo_competencia.is_none()
            && self.competencia.is_none()
            && self.outcomes.is_none()
            && self.process.is_none()
            && self.criteria.is_none()
            && self.theory.is_none()
    }

    fn seal(self) -> RapUnitRecord {
        let join = |lines: Option<Vec<String>>| lines.map(|l| l.join("\n"));
        RapUnitRecord {
            codigo_competencia: self.codigo_competencia,
            competencia: self.competencia,
            resultados_aprendizaje: self.outcomes.map(|lines| {
                lines
                    .into_iter()
                    .filter(|l| !RE_MISFILED_HEADING.is_match(&normalize(l)))
                    .collect()
            }),
            conocimientos_proceso: join(self.process),
            conocimientos_saber: join(self.theory),
            criterios_evaluacion: join(self.criteria),
        }
    }
}

/// One pass producing [`RapUnitRecord`]s.
#[derive(Debug, Default)]
pub struct RapPass {
    records: Assembler<RapDraft>,
    capture: CaptureSection,
}

impl RapPass {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Pass for RapPass {
    type Output = RapUnitRecord;

    fn on_row(&mut self, cells: &[Option<String>], _page: usize) -> Flow {
        let row = RowView::new(cells, JoinStyle::Spaced);
        if row.has_no_text() || contains_any(row.normalized(), IGNORED) {
            return Flow::Continue;
        }

        match first_match(RULES, row.first_cell(), row.normalized()) {
            Some(Field::Unit) => {
                let name = row.value(1);
                debug!("Outcome bundle for unit: {}", name);
                self.records.begin(RapDraft {
                    competencia: Some(name),
                    ..Default::default()
                });
                self.capture = CaptureSection::None;
                return Flow::Continue;
            }
            Some(Field::Code) => {
                let code = row.value(1);
                if !code.is_empty() && code != SENTINEL_CODE {
                    debug!("Competency code: {}", code);
                    self.records.current().codigo_competencia = Some(code);
                }
                return Flow::Continue;
            }
            Some(Field::Name) => {
                self.records.current().competencia = Some(row.value(1));
                return Flow::Continue;
            }
            None => {}
        }

        if CaptureSection::is_end_marker(row.normalized()) {
            self.capture = CaptureSection::None;
            return Flow::Continue;
        }

        if let Some(section) = CaptureSection::from_header(row.first_cell()) {
            debug!("Capturing {:?}", section);
            self.capture = section;
            if let Some(list) = self.records.current().list_mut(section) {
                *list = Some(Vec::new());
            }
            return Flow::Continue;
        }

        if self.capture != CaptureSection::None && !row.text().is_empty() {
            let text = row.text().to_string();
            if let Some(list) = self.records.current().list_mut(self.capture) {
                list.get_or_insert_with(Vec::new).push(text);
            }
        }
        Flow::Continue
    }

    fn finish(self) -> Vec<RapUnitRecord> {
        self.records.finish_if(|draft| draft.codigo_competencia.is_some())
    }
}
