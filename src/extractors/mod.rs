//! One extraction pass per record family.
//!
//! | Family        | Pass               | Section state                       |
//! |---------------|--------------------|-------------------------------------|
//! | programa      | [`ProgramPass`]    | duration block                      |
//! | competencias  | [`CompetencyPass`] | practical-stage guard               |
//! | unidadRaps    | [`RapPass`]        | one active capture list             |
//! | proyecto      | [`ProjectPass`]    | basic-information gate              |
//! | fases         | [`PhasePass`]      | planning section                    |
//! | actividades   | [`ActivityPass`]   | planning section + current phase    |
//!
//! Passes share nothing. Running several over one document means opening
//! the source once per pass.

pub mod activities;
pub mod competencies;
pub mod phases;
pub mod program;
pub mod project;
pub mod raps;

pub use activities::ActivityPass;
pub use competencies::CompetencyPass;
pub use phases::PhasePass;
pub use program::ProgramPass;
pub use project::ProjectPass;
pub use raps::RapPass;

use crate::engine::run;
use crate::error::ExtractError;
use crate::kind::ExtractionKind;
use crate::output::Records;
use crate::pipeline::TableSource;
use tracing::info;

/// Run the pass for `kind` over `source`.
///
/// Blocking when the source is a PDF: call from `spawn_blocking` in async
/// contexts.
pub fn run_kind<S>(kind: ExtractionKind, source: &mut S) -> Result<Records, ExtractError>
where
    S: TableSource + ?Sized,
{
    info!("Extracting {}", kind);
    let records = match kind {
        ExtractionKind::Program => Records::Program(run(ProgramPass::new(), source)?),
        ExtractionKind::Competencies => Records::Competencies(run(CompetencyPass::new(), source)?),
        ExtractionKind::Raps => Records::Raps(run(RapPass::new(), source)?),
        ExtractionKind::Project => Records::Project(run(ProjectPass::new(), source)?),
        ExtractionKind::Phases => Records::Phases(run(PhasePass::new(), source)?),
        ExtractionKind::Activities => Records::Activities(run(ActivityPass::new(), source)?),
    };
    info!("{}: {} records", kind, records.len());
    Ok(records)
}
