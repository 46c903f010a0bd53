//! Section trackers: which part of the document a pass is in.
//!
//! Every tracker is driven by marker text on the rows themselves. Document
//! order is load-bearing: a marker seen on page 3 changes how every later row
//! is read, and nothing earlier is revisited.

use super::RowView;
use crate::fields::extract_hours;
use crate::text::{contains_any, contains_label, is_totals_heading};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

// ── Practical-stage guard ────────────────────────────────────────────────

/// Sequence number of the synthetic practical stage.
pub const SENTINEL_CODE: &str = "999999999";

const PRACTICAL_STAGE: &str = "ETAPA PRACTICA";

/// What the guard decided for a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// The row opened the practical stage: flush and skip it.
    Entered,
    /// The row lies inside the practical stage: skip it.
    Inside,
    /// Normal processing (including the row that closed the stage).
    Open,
}

/// Skips the synthetic practical stage of a competency listing.
#[derive(Debug, Default)]
pub struct PracticalStageGuard {
    active: bool,
}

impl PracticalStageGuard {
    /// `exit_label` must be in the first cell of the row that ends the stage.
    pub fn check(&mut self, row: &RowView<'_>, exit_label: &str) -> Guard {
        if contains_label(row.normalized(), PRACTICAL_STAGE) || row.text().contains(SENTINEL_CODE) {
            if !self.active {
                debug!("Entering practical stage");
            }
            self.active = true;
            return Guard::Entered;
        }
        if self.active {
            // The sentinel case already returned above.
            if contains_label(row.first_cell(), exit_label) {
                debug!("Leaving practical stage");
                self.active = false;
            } else {
                return Guard::Inside;
            }
        }
        Guard::Open
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

// ── Duration block ───────────────────────────────────────────────────────

const CLASSROOM_STAGE: &str = "ETAPA LECTIVA";
const PRODUCTIVE_STAGE: &str = "ETAPA PRODUCTIVA";

/// Which hour field a duration-block row fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageHours {
    Classroom,
    Productive,
    Totals,
}

/// Hour fields already captured on the record in progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilledHours {
    pub classroom: bool,
    pub productive: bool,
    pub totals: bool,
}

/// The program's duration table: classroom, productive and total hours.
///
/// Entered on the duration label; left once the totals row yields hours.
#[derive(Debug, Default)]
pub struct DurationBlock {
    active: bool,
}

impl DurationBlock {
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Enter the block. The label row itself may carry classroom hours.
    pub fn enter(&mut self, row: &RowView<'_>, filled: FilledHours) -> Option<(StageHours, String)> {
        if !self.active {
            debug!("Entering duration block");
        }
        self.active = true;
        if contains_label(row.normalized(), CLASSROOM_STAGE) && !filled.classroom {
            return extract_hours(row.text()).map(|h| (StageHours::Classroom, h));
        }
        None
    }

    /// Classify a row inside the block.
    ///
    /// Markers are tested in order: classroom, productive, totals. A marker
    /// whose field is already filled is passed over. A matching marker
    /// without an hour value captures nothing. Totals close the block.
    pub fn observe(&mut self, row: &RowView<'_>, filled: FilledHours) -> Option<(StageHours, String)> {
        let normalized = row.normalized();
        if contains_label(normalized, CLASSROOM_STAGE) && !filled.classroom {
            extract_hours(row.text()).map(|h| (StageHours::Classroom, h))
        } else if contains_label(normalized, PRODUCTIVE_STAGE) && !filled.productive {
            extract_hours(row.text()).map(|h| (StageHours::Productive, h))
        } else if !filled.totals && is_totals_heading(normalized) {
            let hours = extract_hours(row.text())?;
            debug!("Totals row closes duration block");
            self.active = false;
            Some((StageHours::Totals, hours))
        } else {
            None
        }
    }
}

// ── One-way gate ─────────────────────────────────────────────────────────

/// A section that, once its marker appears, stays open to the end.
#[derive(Debug)]
pub struct SectionGate {
    marker: &'static str,
    open: bool,
}

impl SectionGate {
    pub const fn new(marker: &'static str) -> Self {
        Self { marker, open: false }
    }

    /// True when the row is the marker row itself (and should be skipped).
    pub fn is_marker(&mut self, row: &RowView<'_>) -> bool {
        if contains_label(row.normalized(), self.marker) {
            if !self.open {
                debug!("Section '{}' opened", self.marker);
            }
            self.open = true;
            return true;
        }
        false
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

// ── Planning section ─────────────────────────────────────────────────────

/// Marker phrases of a planning section.
#[derive(Debug, Clone, Copy)]
pub struct PlanningMarkers {
    pub enter: &'static [&'static str],
    pub exit: &'static [&'static str],
}

/// What the planning tracker decided for a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Planning {
    /// Entry marker: skip this row.
    Entered,
    /// Exit marker: skip the rest of the table.
    Exited,
    /// Row lies outside the section.
    Outside,
    /// Row lies inside the section.
    Inside,
}

/// Project planning section: re-enterable, closed by budget/team headings.
#[derive(Debug)]
pub struct PlanningSection {
    markers: PlanningMarkers,
    active: bool,
}

impl PlanningSection {
    pub const fn new(markers: PlanningMarkers) -> Self {
        Self {
            markers,
            active: false,
        }
    }

    pub fn observe(&mut self, row: &RowView<'_>, page: usize) -> Planning {
        let normalized = row.normalized();
        if contains_any(normalized, self.markers.enter) {
            debug!("Planning section entered on page {}", page);
            self.active = true;
            return Planning::Entered;
        }
        if !self.active {
            return Planning::Outside;
        }
        if contains_any(normalized, self.markers.exit) {
            debug!("Planning section closed on page {}", page);
            self.active = false;
            return Planning::Exited;
        }
        Planning::Inside
    }
}

// ── RAP capture section ──────────────────────────────────────────────────

/// Which list of a learning-outcome bundle rows are appended to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CaptureSection {
    #[default]
    None,
    Outcomes,
    ProcessKnowledge,
    EvaluationCriteria,
    TheoreticalKnowledge,
}

/// Header labels, tested against the first cell in this order.
const CAPTURE_HEADERS: [(&str, CaptureSection); 4] = [
    ("RESULTADOS DE APRENDIZAJE", CaptureSection::Outcomes),
    ("CONOCIMIENTOS DE PROCESO", CaptureSection::ProcessKnowledge),
    ("CRITERIOS DE EVALUACION", CaptureSection::EvaluationCriteria),
    ("CONOCIMIENTOS DEL SABER", CaptureSection::TheoreticalKnowledge),
];

static END_OF_SECTION: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"PERFIL DEL INSTRUCTOR",
        r"REQUISITOS ACADEMICOS",
        r"4\.8\s+PERFIL",
        r"4\.8\.1",
        r"CONTENIDOS CURRICULARES DE LA COMPETENCIA",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

impl CaptureSection {
    /// The section a header row opens, if the first cell is a header.
    pub fn from_header(first_cell: &str) -> Option<Self> {
        CAPTURE_HEADERS
            .iter()
            .find(|(label, _)| contains_label(first_cell, label))
            .map(|&(_, section)| section)
    }

    /// True for rows that close any capture (instructor profile, curricular
    /// contents and their numbered headings).
    pub fn is_end_marker(normalized: &str) -> bool {
        END_OF_SECTION.iter().any(|re| re.is_match(normalized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::JoinStyle;

    fn cells(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    fn check(guard: &mut PracticalStageGuard, values: &[&str]) -> Guard {
        let c = cells(values);
        guard.check(&RowView::new(&c, JoinStyle::Glued), "CODIGO NORMA DE COMPETENCIA LABORAL")
    }

    #[test]
    fn guard_skips_until_code_row_without_sentinel() {
        let mut g = PracticalStageGuard::default();
        assert_eq!(check(&mut g, &["Unidad de competencia", "X"]), Guard::Open);
        assert_eq!(check(&mut g, &["Etapa práctica", ""]), Guard::Entered);
        assert_eq!(check(&mut g, &["Nombre de la competencia", "Y"]), Guard::Inside);
        assert_eq!(check(&mut g, &["Código norma de competencia laboral", "999999999"]), Guard::Entered);
        assert!(g.is_active());
        assert_eq!(check(&mut g, &["Código norma de competencia laboral", "220501046"]), Guard::Open);
        assert!(!g.is_active());
    }

    #[test]
    fn guard_sees_sentinel_split_across_cells() {
        let mut g = PracticalStageGuard::default();
        assert_eq!(check(&mut g, &["9999", "99999"]), Guard::Entered);
    }

    fn view(values: &[&str]) -> Vec<Option<String>> {
        cells(values)
    }

    #[test]
    fn duration_block_walks_stages() {
        let mut block = DurationBlock::default();
        let mut filled = FilledHours::default();

        let entry = view(&["Duración máxima estimada del aprendizaje (horas)", "Etapa lectiva", "2256 horas"]);
        let got = block.enter(&RowView::new(&entry, JoinStyle::Trimmed), filled);
        assert_eq!(got, Some((StageHours::Classroom, "2256 horas".to_string())));
        filled.classroom = true;
        assert!(block.is_active());

        let productive = view(&["", "Etapa productiva", "864 horas"]);
        let got = block.observe(&RowView::new(&productive, JoinStyle::Trimmed), filled);
        assert_eq!(got, Some((StageHours::Productive, "864 horas".to_string())));
        filled.productive = true;

        let noise = view(&["", "Totalmente presencial", "40 horas"]);
        assert_eq!(block.observe(&RowView::new(&noise, JoinStyle::Trimmed), filled), None);
        assert!(block.is_active());

        let total = view(&["", "T O T A L", "3120 horas"]);
        let got = block.observe(&RowView::new(&total, JoinStyle::Trimmed), filled);
        assert_eq!(got, Some((StageHours::Totals, "3120 horas".to_string())));
        assert!(!block.is_active());
    }

    #[test]
    fn duration_totals_need_hours() {
        let mut block = DurationBlock::default();
        let label = view(&["Duración máxima estimada del aprendizaje (horas)"]);
        assert_eq!(block.enter(&RowView::new(&label, JoinStyle::Trimmed), FilledHours::default()), None);
        let heading = view(&["TOTAL"]);
        assert_eq!(block.observe(&RowView::new(&heading, JoinStyle::Trimmed), FilledHours::default()), None);
        assert!(block.is_active());
    }

    #[test]
    fn gate_opens_once_and_stays_open() {
        let mut gate = SectionGate::new("INFORMACION BASICA DEL PROYECTO");
        let before = view(&["Regional", "Antioquia"]);
        assert!(!gate.is_marker(&RowView::new(&before, JoinStyle::Trimmed)));
        assert!(!gate.is_open());
        let marker = view(&["1. Información básica del proyecto"]);
        assert!(gate.is_marker(&RowView::new(&marker, JoinStyle::Trimmed)));
        assert!(gate.is_open());
    }

    #[test]
    fn planning_enters_exits_and_reenters() {
        let mut p = PlanningSection::new(PlanningMarkers {
            enter: &["PLANEACION DEL PROYECTO", "FASES DEL PROYECTO"],
            exit: &["RUBROS PRESUPUESTALES"],
        });
        let mut obs = |values: &[&str]| {
            let c = view(values);
            p.observe(&RowView::new(&c, JoinStyle::Trimmed), 1)
        };
        assert_eq!(obs(&["Análisis"]), Planning::Outside);
        assert_eq!(obs(&["3. Planeación del proyecto"]), Planning::Entered);
        assert_eq!(obs(&["Análisis"]), Planning::Inside);
        assert_eq!(obs(&["Rubros presupuestales"]), Planning::Exited);
        assert_eq!(obs(&["Ejecución"]), Planning::Outside);
        assert_eq!(obs(&["Fases del proyecto"]), Planning::Entered);
        assert_eq!(obs(&["Ejecución"]), Planning::Inside);
    }

    #[test]
    fn capture_headers_and_end_markers() {
        assert_eq!(CaptureSection::from_header("4.5 RESULTADOS DE APRENDIZAJE"), Some(CaptureSection::Outcomes));
        assert_eq!(CaptureSection::from_header("CONOCIMIENTOS DEL SABER"), Some(CaptureSection::TheoreticalKnowledge));
        assert_eq!(CaptureSection::from_header("CONOCIMIENTOS"), None);
        assert!(CaptureSection::is_end_marker("4.8 PERFIL TECNICO DEL INSTRUCTOR"));
        assert!(CaptureSection::is_end_marker("4.8.1 REQUISITOS"));
        assert!(!CaptureSection::is_end_marker("4.6 CONOCIMIENTOS"));
    }
}
