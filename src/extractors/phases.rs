//! Project phases found in the planning section, in canonical order.

use crate::engine::sections::{Planning, PlanningMarkers, PlanningSection};
use crate::engine::{Flow, JoinStyle, Pass, RowView};
use crate::output::PhaseRecord;
use crate::text::contains_label;
use std::collections::BTreeSet;
use tracing::debug;

/// The four phases of a formative project, in project order.
pub const CANONICAL_PHASES: [&str; 4] = ["ANALISIS", "PLANEACION", "EJECUCION", "EVALUACION"];

const MARKERS: PlanningMarkers = PlanningMarkers {
    enter: &["PLANEACION DEL PROYECTO", "FASES DEL PROYECTO"],
    exit: &["RUBROS PRESUPUESTALES", "EQUIPO QUE PARTICIPO", "VALORACION PRODUCTIVA"],
};

/// One pass producing [`PhaseRecord`]s.
#[derive(Debug)]
pub struct PhasePass {
    section: PlanningSection,
    /// Indices into [`CANONICAL_PHASES`]; ordered iteration gives canonical order.
    found: BTreeSet<usize>,
}

impl Default for PhasePass {
    fn default() -> Self {
        Self {
            section: PlanningSection::new(MARKERS),
            found: BTreeSet::new(),
        }
    }
}

impl PhasePass {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Pass for PhasePass {
    type Output = PhaseRecord;

    fn on_row(&mut self, cells: &[Option<String>], page: usize) -> Flow {
        let row = RowView::new(cells, JoinStyle::Trimmed);
        if row.is_blank() {
            return Flow::Continue;
        }
        match self.section.observe(&row, page) {
            Planning::Entered | Planning::Outside => Flow::Continue,
            Planning::Exited => Flow::SkipTable,
            Planning::Inside => {
                if let Some(idx) = CANONICAL_PHASES
                    .iter()
                    .position(|phase| contains_label(row.first_cell(), phase))
                {
                    if self.found.insert(idx) {
                        debug!("Phase found: {}", CANONICAL_PHASES[idx]);
                    }
                }
                Flow::Continue
            }
        }
    }

    fn finish(self) -> Vec<PhaseRecord> {
        self.found
            .into_iter()
            .map(|idx| PhaseRecord {
                nombre: CANONICAL_PHASES[idx].to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::run;
    use crate::pipeline::{Document, Page, Table};

    fn row(cells: &[&str]) -> Vec<Option<String>> {
        cells.iter().map(|c| Some(c.to_string())).collect()
    }

    fn names(records: &[PhaseRecord]) -> Vec<&str> {
        records.iter().map(|r| r.nombre.as_str()).collect()
    }

    fn extract(rows: Vec<Vec<Option<String>>>) -> Vec<PhaseRecord> {
        run(PhasePass::new(), &mut Document::from_rows(rows)).unwrap()
    }

    #[test]
    fn out_of_order_phases_come_back_canonical() {
        let records = extract(vec![
            row(&["Planeación del proyecto"]),
            row(&["Fase de ejecución", "Construir"]),
            row(&["Análisis", "Diagnosticar"]),
            row(&["Ejecución", "Probar"]),
        ]);
        assert_eq!(names(&records), vec!["ANALISIS", "EJECUCION"]);
    }

    #[test]
    fn phases_outside_section_are_ignored() {
        let records = extract(vec![row(&["Evaluación", "x"]), row(&["Planeación", "y"])]);
        assert!(records.is_empty());
    }

    #[test]
    fn exit_marker_skips_rest_of_table() {
        let doc = Document {
            pages: vec![Page {
                number: 1,
                tables: vec![
                    Table::new(vec![
                        row(&["Fases del proyecto"]),
                        row(&["Análisis"]),
                        row(&["Valoración productiva"]),
                        row(&["Evaluación"]),
                    ]),
                    Table::new(vec![row(&["Planeación del proyecto"]), row(&["Evaluación"])]),
                ],
            }],
        };
        let records = run(PhasePass::new(), &mut doc.clone()).unwrap();
        assert_eq!(names(&records), vec!["ANALISIS", "EVALUACION"]);
    }

    #[test]
    fn entry_row_itself_is_not_a_phase() {
        // "PLANEACION DEL PROYECTO" contains "PLANEACION" but only opens the section.
        let records = extract(vec![row(&["Planeación del proyecto"])]);
        assert!(records.is_empty());
    }
}
