//! Extraction kinds: which record family a pass produces.

use crate::error::ExtractError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One record family. Each runs as an independent pass over the rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionKind {
    Program,
    Competencies,
    Raps,
    Project,
    Phases,
    Activities,
}

impl ExtractionKind {
    /// Every family, in the order results are assembled.
    pub const ALL: [ExtractionKind; 6] = [
        ExtractionKind::Program,
        ExtractionKind::Competencies,
        ExtractionKind::Raps,
        ExtractionKind::Project,
        ExtractionKind::Phases,
        ExtractionKind::Activities,
    ];

    /// Key of this family in the envelope's `data` object.
    pub fn data_key(self) -> &'static str {
        match self {
            ExtractionKind::Program => "programa",
            ExtractionKind::Competencies => "competencias",
            ExtractionKind::Raps => "unidadRaps",
            ExtractionKind::Project => "proyecto",
            ExtractionKind::Phases => "fases",
            ExtractionKind::Activities => "actividades",
        }
    }
}

impl fmt::Display for ExtractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.data_key())
    }
}

/// What the caller asked for: one family, or all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KindRequest {
    One(ExtractionKind),
    All,
}

impl KindRequest {
    /// Families to run, in assembly order.
    pub fn kinds(self) -> Vec<ExtractionKind> {
        match self {
            KindRequest::One(kind) => vec![kind],
            KindRequest::All => ExtractionKind::ALL.to_vec(),
        }
    }
}

impl From<ExtractionKind> for KindRequest {
    fn from(kind: ExtractionKind) -> Self {
        KindRequest::One(kind)
    }
}

impl FromStr for KindRequest {
    type Err = ExtractError;

    /// Accepts the Spanish names used by the envelope and English aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "todo" | "all" => return Ok(KindRequest::All),
            "programa" | "program" => ExtractionKind::Program,
            "competencias" | "competencies" => ExtractionKind::Competencies,
            "raps" | "unidadraps" => ExtractionKind::Raps,
            "proyecto" | "project" => ExtractionKind::Project,
            "fases" | "phases" => ExtractionKind::Phases,
            "actividades" | "activities" => ExtractionKind::Activities,
            _ => return Err(ExtractError::UnknownKind(s.to_string())),
        };
        Ok(KindRequest::One(kind))
    }
}
