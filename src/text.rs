//! Text normalisation and label matching.
//!
//! Every match the extractors make is done on normalised text: accents
//! removed, uppercased, whitespace collapsed. Source tables are typed by
//! hand and rendered by different tools, so `Duración máxima`, `DURACION
//! MAXIMA` and `Duracion\n máxima` must all look the same to the matcher.
//!
//! Matching is substring containment, never equality. One label can be a
//! substring of another (`CODIGO PROGRAMA` vs `CODIGO DEL PROGRAMA SOFIA`),
//! so multi-label dispatch goes through an ordered [`LabelRule`] table where
//! the first matching rule wins. Callers list the most specific label first.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonicalise `text` for matching.
///
/// Uppercases, decomposes (NFD) and drops combining marks, collapses runs of
/// whitespace to one space and trims both ends. Total and idempotent.
///
/// ```
/// use curriculum_extract::text::normalize;
/// assert_eq!(normalize("  Duración\n máxima "), "DURACION MAXIMA");
/// ```
pub fn normalize(text: &str) -> String {
    // Uppercase first: some case mappings produce decomposed output.
    let upper = text.to_uppercase();
    let stripped: String = upper.nfd().filter(|c| !is_combining_mark(*c)).collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when the normalised `label` occurs anywhere in `normalized`.
///
/// Labels in this crate are written already normalised, so no work is done
/// on `label`.
#[inline]
pub fn contains_label(normalized: &str, label: &str) -> bool {
    normalized.contains(label)
}

/// True when any of `labels` occurs in `normalized`.
pub fn contains_any(normalized: &str, labels: &[&str]) -> bool {
    labels.iter().any(|l| contains_label(normalized, l))
}

/// Which part of a row a [`LabelRule`] is tested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The normalised first cell only.
    FirstCell,
    /// The normalised concatenation of all non-empty cells.
    Row,
}

/// One entry of an ordered label dispatch table.
#[derive(Debug, Clone, Copy)]
pub struct LabelRule<F> {
    pub label: &'static str,
    pub scope: Scope,
    pub field: F,
}

impl<F> LabelRule<F> {
    pub const fn cell(label: &'static str, field: F) -> Self {
        Self {
            label,
            scope: Scope::FirstCell,
            field,
        }
    }

    pub const fn row(label: &'static str, field: F) -> Self {
        Self {
            label,
            scope: Scope::Row,
            field,
        }
    }
}

/// Return the field of the first rule whose label matches, in table order.
pub fn first_match<F: Copy>(rules: &[LabelRule<F>], first_cell: &str, row: &str) -> Option<F> {
    rules.iter().find_map(|rule| {
        let haystack = match rule.scope {
            Scope::FirstCell => first_cell,
            Scope::Row => row,
        };
        contains_label(haystack, rule.label).then_some(rule.field)
    })
}

// ── Letter-spaced headings ───────────────────────────────────────────────────

/// Collapse runs of the same character (`TTOOTTAALL` → `TOTAL`).
///
/// Bold text in some renderers is emitted twice per glyph.
pub fn collapse_repeats(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev: Option<char> = None;
    for c in text.chars() {
        if prev != Some(c) {
            out.push(c);
        }
        prev = Some(c);
    }
    out
}

/// Join runs of single-letter tokens (`T O T A L 96` → `TOTAL 96`).
pub fn join_spaced_letters(text: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut run = String::new();
    for token in text.split(' ') {
        let mut chars = token.chars();
        let single_letter = matches!((chars.next(), chars.next()), (Some(c), None) if c.is_alphabetic());
        if single_letter {
            run.push_str(token);
            continue;
        }
        if !run.is_empty() {
            words.push(std::mem::take(&mut run));
        }
        if !token.is_empty() {
            words.push(token.to_string());
        }
    }
    if !run.is_empty() {
        words.push(run);
    }
    words.join(" ")
}

static RE_TOTAL_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bTOTAL(?:ES)?\b").unwrap());

/// True when a normalised row reads as a totals heading.
///
/// Tolerates doubled glyphs and letter spacing, but requires `TOTAL` (or
/// `TOTALES`) as a whole token, so `TOTALMENTE` does not qualify.
pub fn is_totals_heading(normalized: &str) -> bool {
    let simple = join_spaced_letters(&collapse_repeats(normalized));
    RE_TOTAL_TOKEN.is_match(&simple)
}

// ── Tests ────────────────────────────────────────────────────────────────────
