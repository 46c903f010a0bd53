//! Project activities with the learning outcomes each one covers.
//!
//! The planning table reads `[phase, activity, outcomes, competency]`. The
//! phase cell is filled only on the first row of each phase, so the pass
//! carries the current phase forward until another phase name appears.

use super::phases::CANONICAL_PHASES;
use crate::engine::sections::{Planning, PlanningMarkers, PlanningSection};
use crate::engine::{Flow, JoinStyle, Pass, RowView};
use crate::fields::parse_rap_codes;
use crate::output::ActivityRecord;
use tracing::debug;

const MARKERS: PlanningMarkers = PlanningMarkers {
    enter: &["PLANEACION DEL PROYECTO", "ACTIVIDADES DEL PROYECTO"],
    exit: &["RUBROS PRESUPUESTALES", "EQUIPO QUE PARTICIPO"],
};

/// One pass producing [`ActivityRecord`]s.
#[derive(Debug)]
pub struct ActivityPass {
    section: PlanningSection,
    phase: Option<&'static str>,
    records: Vec<ActivityRecord>,
}

impl Default for ActivityPass {
    fn default() -> Self {
        Self {
            section: PlanningSection::new(MARKERS),
            phase: None,
            records: Vec::new(),
        }
    }
}

impl ActivityPass {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Pass for ActivityPass {
    type Output = ActivityRecord;

    fn on_row(&mut self, cells: &[Option<String>], page: usize) -> Flow {
        let row = RowView::new(cells, JoinStyle::Trimmed);
        if row.is_blank() {
            return Flow::Continue;
        }
        match self.section.observe(&row, page) {
            Planning::Entered | Planning::Outside => return Flow::Continue,
            Planning::Exited => return Flow::SkipTable,
            Planning::Inside => {}
        }
        if row.len() < 3 {
            return Flow::Continue;
        }

        if let Some(phase) = CANONICAL_PHASES.iter().find(|p| **p == row.first_cell()) {
            if self.phase != Some(*phase) {
                debug!("Current phase: {}", phase);
            }
            self.phase = Some(*phase);
        }

        let activity = row.value(1);
        let outcomes = row.value(2);
        let Some(phase) = self.phase else {
            return Flow::Continue;
        };
        if activity.is_empty() || outcomes.is_empty() {
            return Flow::Continue;
        }

        let raps = parse_rap_codes(&outcomes);
        if raps.is_empty() {
            debug!("[P{}] No outcome codes in activity row: {}", page, activity);
            return Flow::Continue;
        }
        debug!("Activity '{}' covers {} outcomes", activity, raps.len());
        self.records.push(ActivityRecord {
            fase: phase.to_string(),
            nombre_actividad: activity,
            raps,
        });
        Flow::Continue
    }

    fn finish(self) -> Vec<ActivityRecord> {
        self.records
    }
}
