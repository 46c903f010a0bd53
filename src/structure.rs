//! Post-extraction structuring of learning-outcome bundles.
//!
//! A [`RapUnitRecord`] keeps its knowledge and criteria as one text block per
//! competency. This module splits those blocks per learning outcome (RAP),
//! derives per-RAP codes and durations, and summarises bundles.
//!
//! ## Splitting knowledge blocks
//!
//! Two layouts occur in practice:
//!
//! * **Titled**: the block contains uppercase section titles ending in `:`
//!   (a line of 20+ uppercase letters). Each section is matched to the RAP
//!   whose leading text it mentions and keeps that section's `*` bullets.
//! * **Untitled**: a flat list of `*` bullets, dealt out evenly across the
//!   RAPs in order (`ceil(items / raps)` per RAP).

use crate::fields::hour_count;
use crate::output::{CompetencyRecord, ExtractionData, RapUnitRecord};
use crate::text::normalize;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Key used when a bundle has no competency code.
pub const NO_CODE: &str = "SIN_CODIGO";

/// Characters of a RAP's text used to recognise its section title.
const TITLE_KEY_CHARS: usize = 40;

static RE_HAS_TITLES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[A-ZÑÁÉÍÓÚ][A-ZÑÁÉÍÓÚ\s]{20,}:").unwrap());

static RE_TITLE_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-ZÑÁÉÍÓÚ][A-ZÑÁÉÍÓÚ\s]{15,}:").unwrap());

static RE_LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\s+").unwrap());

static RE_RAP_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{1,2})\s+(.+)").unwrap());

static RE_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\*\s*").unwrap());

/// One learning outcome with its share of the bundle's knowledge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredRap {
    pub codigo: String,
    pub denominacion: String,
    pub conocimientos_proceso: String,
    pub conocimientos_saber: String,
    pub criterios_evaluacion: String,
}

/// A bundle split per RAP, with the competency's hours spread across them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredUnit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codigo_competencia: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competencia: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duracion_por_rap: Option<u32>,
    pub raps: Vec<StructuredRap>,
}

/// Per-competency line of a [`RapSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSummary {
    pub nombre: String,
    pub num_raps: usize,
}

/// Counts over a set of bundles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RapSummary {
    /// Keyed by competency code, or [`NO_CODE`]. A repeated code keeps the
    /// last bundle.
    pub por_competencia: BTreeMap<String, UnitSummary>,
    pub total_competencias: usize,
    pub total_raps: usize,
}

// ── Bullets ──────────────────────────────────────────────────────────────

/// Lines starting with `*`, without the marker, joined by newlines.
fn bullet_block(text: &str) -> String {
    bullet_items(text).join("\n")
}

fn bullet_items(text: &str) -> Vec<String> {
    text.split('\n')
        .map(str::trim)
        .filter(|l| l.starts_with('*'))
        .map(|l| RE_BULLET.replace(l, "").trim().to_string())
        .collect()
}

// ── Splitting ────────────────────────────────────────────────────────────

/// True when `text` has uppercase section titles.
pub fn has_titled_sections(text: &str) -> bool {
    RE_HAS_TITLES.is_match(text)
}

/// Split `text` at every newline that starts a section title.
fn titled_sections(text: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices('\n') {
        if RE_TITLE_START.is_match(&text[idx + 1..]) {
            sections.push(&text[start..idx]);
            start = idx + 1;
        }
    }
    sections.push(&text[start..]);
    sections
}

/// Normalised leading text of a RAP, without its number.
fn title_key(rap: &str) -> String {
    let stripped = RE_LEADING_NUMBER.replace(rap, "");
    let head: String = stripped.chars().take(TITLE_KEY_CHARS).collect();
    normalize(&head)
}

fn split_titled(text: &str, raps: &[String]) -> Vec<String> {
    let keys: Vec<String> = raps.iter().map(|r| title_key(r)).collect();
    let mut blocks = vec![String::new(); raps.len()];

    for section in titled_sections(text) {
        if section.trim().is_empty() {
            continue;
        }
        let first_line = section.split('\n').next().unwrap_or_default().trim();
        let title = normalize(first_line.strip_suffix(':').unwrap_or(first_line));
        if title.is_empty() {
            continue;
        }
        let owner = keys
            .iter()
            .position(|key| !key.is_empty() && (title.contains(key.as_str()) || key.contains(title.as_str())));
        let Some(idx) = owner else {
            debug!("No RAP for section '{}'", title);
            continue;
        };
        let block = bullet_block(section);
        if !block.is_empty() {
            blocks[idx] = block;
        }
    }
    blocks
}

fn split_evenly(text: &str, raps: usize) -> Vec<String> {
    let items = bullet_items(text);
    let mut blocks = vec![String::new(); raps];
    if items.is_empty() {
        return blocks;
    }
    let per_rap = items.len().div_ceil(raps);
    for (i, chunk) in items.chunks(per_rap).enumerate() {
        blocks[i] = chunk.join("\n");
    }
    blocks
}

/// Split a knowledge or criteria block into one block per RAP, by position.
///
/// RAPs with no share get an empty string.
pub fn split_by_rap(text: &str, raps: &[String]) -> Vec<String> {
    if text.is_empty() || raps.is_empty() {
        return vec![String::new(); raps.len()];
    }
    if has_titled_sections(text) {
        debug!("Titled knowledge layout");
        split_titled(text, raps)
    } else {
        debug!("Untitled knowledge layout, distributing evenly");
        split_evenly(text, raps.len())
    }
}

// ── Units ────────────────────────────────────────────────────────────────

/// Code and name of a RAP line: `"3 IDENTIFICAR…"` → `("03", "IDENTIFICAR…")`.
///
/// Without a leading number the 1-based `position` is the code.
pub fn rap_code(rap: &str, position: usize) -> (String, String) {
    let clean = rap.replace('\n', " ");
    let clean = clean.trim();
    match RE_RAP_CODE.captures(clean) {
        Some(caps) => (format!("{:0>2}", &caps[1]), caps[2].trim().to_string()),
        None => (format!("{:02}", position), clean.to_string()),
    }
}

/// Split one bundle into its RAPs.
pub fn structure_unit(unit: &RapUnitRecord) -> Vec<StructuredRap> {
    let raps = unit.resultados_aprendizaje.as_deref().unwrap_or_default();
    if raps.is_empty() {
        warn!(
            "Competency {} has no learning outcomes",
            unit.codigo_competencia.as_deref().unwrap_or(NO_CODE)
        );
        return Vec::new();
    }

    let split = |block: &Option<String>| split_by_rap(block.as_deref().unwrap_or_default(), raps);
    let process = split(&unit.conocimientos_proceso);
    let theory = split(&unit.conocimientos_saber);
    let criteria = split(&unit.criterios_evaluacion);

    raps.iter()
        .enumerate()
        .zip(process.into_iter().zip(theory).zip(criteria))
        .map(|((i, rap), ((conocimientos_proceso, conocimientos_saber), criterios_evaluacion))| {
            let (codigo, denominacion) = rap_code(rap, i + 1);
            StructuredRap {
                codigo,
                denominacion,
                conocimientos_proceso,
                conocimientos_saber,
                criterios_evaluacion,
            }
        })
        .collect()
}

/// Competency hours spread evenly across its RAPs, rounded half up.
///
/// `None` when there are no hours or no RAPs.
pub fn duration_per_rap(hours: u32, raps: usize) -> Option<u32> {
    if hours == 0 || raps == 0 {
        return None;
    }
    let raps = u64::try_from(raps).ok()?;
    let per = (2 * u64::from(hours) + raps) / (2 * raps);
    u32::try_from(per).ok()
}

/// Structure every bundle that has RAPs, attaching per-RAP hours from the
/// competency with the same norm code.
pub fn structure_units(units: &[RapUnitRecord], competencies: &[CompetencyRecord]) -> Vec<StructuredUnit> {
    units
        .iter()
        .filter_map(|unit| {
            let raps = structure_unit(unit);
            if raps.is_empty() {
                return None;
            }
            let hours = unit.codigo_competencia.as_deref().and_then(|code| {
                competencies
                    .iter()
                    .find(|c| c.codigo_norma.as_deref() == Some(code))
                    .and_then(|c| c.duracion_maxima.as_deref())
                    .and_then(hour_count)
            });
            Some(StructuredUnit {
                codigo_competencia: unit.codigo_competencia.clone(),
                competencia: unit.competencia.clone(),
                duracion_por_rap: hours.and_then(|h| duration_per_rap(h, raps.len())),
                raps,
            })
        })
        .collect()
}

/// Per-competency RAP counts and totals.
pub fn summarize(units: &[RapUnitRecord]) -> RapSummary {
    let mut summary = RapSummary {
        total_competencias: units.len(),
        ..Default::default()
    };
    for unit in units {
        let num_raps = unit.resultados_aprendizaje.as_ref().map_or(0, Vec::len);
        summary.total_raps += num_raps;
        summary.por_competencia.insert(
            unit.codigo_competencia.clone().unwrap_or_else(|| NO_CODE.to_string()),
            UnitSummary {
                nombre: unit.competencia.clone().unwrap_or_default(),
                num_raps,
            },
        );
    }
    summary
}

/// Attach the per-RAP split and/or the summary of `data.unidad_raps`.
///
/// No-op for either when no RAP bundles were extracted.
pub fn annotate(data: &mut ExtractionData, structure: bool, summary: bool) {
    let Some(units) = data.unidad_raps.as_deref() else {
        return;
    };
    if structure {
        let competencies = data.competencias.as_deref().unwrap_or_default();
        data.estructura = Some(structure_units(units, competencies));
    }
    if summary {
        data.resumen = Some(summarize(units));
    }
}
