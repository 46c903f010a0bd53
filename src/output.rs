//! Output types: one record struct per family, the `data` object and the
//! result envelope.
//!
//! Every record field is optional. An absent field is a missing JSON key,
//! never `null`, so each field carries `skip_serializing_if`. A field that was
//! captured with an empty value (`Some("")`) is present.

use crate::error::ExtractError;
use crate::kind::ExtractionKind;
use crate::structure::{RapSummary, StructuredUnit};
use serde::{Deserialize, Serialize};

// ── Records ──────────────────────────────────────────────────────────────

/// Program metadata: one per program edition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nombre_programa: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codigo_programa: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_programa: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vigencia: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horas_etapa_lectiva: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horas_etapa_productiva: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horas_totales: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tipo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub titulo: Option<String>,
}

/// One competency unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetencyRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unidad_competencia: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codigo_norma: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nombre_competencia: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duracion_maxima: Option<String>,
}

/// The learning-outcome bundle of one competency unit.
///
/// `resultados_aprendizaje` stays a list; the three knowledge blocks are
/// newline-joined text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RapUnitRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codigo_competencia: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competencia: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resultados_aprendizaje: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conocimientos_proceso: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conocimientos_saber: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criterios_evaluacion: Option<String>,
}

/// Basic information of a formative project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codigo_proyecto: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codigo_programa: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub centro_formacion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regional: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nombre_proyecto: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub programa_formacion: Option<String>,
}

/// A project phase, by canonical name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub nombre: String,
}

/// One project activity and the learning outcomes it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub fase: String,
    pub nombre_actividad: String,
    /// `(sub-code, description)` pairs, serialised as two-element arrays.
    pub raps: Vec<(String, String)>,
}

// ── Results ──────────────────────────────────────────────────────────────

/// Records produced by one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Records {
    Program(Vec<ProgramRecord>),
    Competencies(Vec<CompetencyRecord>),
    Raps(Vec<RapUnitRecord>),
    Project(Vec<ProjectRecord>),
    Phases(Vec<PhaseRecord>),
    Activities(Vec<ActivityRecord>),
}

impl Records {
    pub fn kind(&self) -> ExtractionKind {
        match self {
            Records::Program(_) => ExtractionKind::Program,
            Records::Competencies(_) => ExtractionKind::Competencies,
            Records::Raps(_) => ExtractionKind::Raps,
            Records::Project(_) => ExtractionKind::Project,
            Records::Phases(_) => ExtractionKind::Phases,
            Records::Activities(_) => ExtractionKind::Activities,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Records::Program(r) => r.len(),
            Records::Competencies(r) => r.len(),
            Records::Raps(r) => r.len(),
            Records::Project(r) => r.len(),
            Records::Phases(r) => r.len(),
            Records::Activities(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The `data` object: one record list per requested family.
///
/// Families that were not requested are absent keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub programa: Option<Vec<ProgramRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competencias: Option<Vec<CompetencyRecord>>,
    #[serde(rename = "unidadRaps", default, skip_serializing_if = "Option::is_none")]
    pub unidad_raps: Option<Vec<RapUnitRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proyecto: Option<Vec<ProjectRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fases: Option<Vec<PhaseRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actividades: Option<Vec<ActivityRecord>>,
    /// Per-RAP split of `unidadRaps`, see [`crate::structure::annotate`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estructura: Option<Vec<StructuredUnit>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resumen: Option<RapSummary>,
}

impl ExtractionData {
    /// Store one pass's records under its key, replacing earlier ones.
    pub fn insert(&mut self, records: Records) {
        match records {
            Records::Program(r) => self.programa = Some(r),
            Records::Competencies(r) => self.competencias = Some(r),
            Records::Raps(r) => self.unidad_raps = Some(r),
            Records::Project(r) => self.proyecto = Some(r),
            Records::Phases(r) => self.fases = Some(r),
            Records::Activities(r) => self.actividades = Some(r),
        }
    }

    /// Families present, in assembly order.
    pub fn kinds(&self) -> Vec<ExtractionKind> {
        let present = [
            self.programa.is_some(),
            self.competencias.is_some(),
            self.unidad_raps.is_some(),
            self.proyecto.is_some(),
            self.fases.is_some(),
            self.actividades.is_some(),
        ];
        ExtractionKind::ALL
            .into_iter()
            .zip(present)
            .filter_map(|(kind, p)| p.then_some(kind))
            .collect()
    }
}

impl FromIterator<Records> for ExtractionData {
    fn from_iter<I: IntoIterator<Item = Records>>(iter: I) -> Self {
        let mut data = ExtractionData::default();
        for records in iter {
            data.insert(records);
        }
        data
    }
}

// ── Envelope ─────────────────────────────────────────────────────────────

/// The outermost result: `{"success": true, "data": …}` or
/// `{"success": false, "error": "…"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ExtractionData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    pub fn ok(data: ExtractionData) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// The only place an [`ExtractError`] becomes data.
    pub fn from_result(result: Result<ExtractionData, ExtractError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::failure(e.to_string()),
        }
    }

    /// Serialise as JSON, optionally indented.
    pub fn to_json(&self, pretty: bool) -> Result<String, ExtractError> {
        let json = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        json.map_err(|e| ExtractError::Internal(format!("Serialising envelope: {e}")))
    }
}
