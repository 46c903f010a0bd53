//! Field parsers: pure extractors over a cell or a row string.
//!
//! Each parser is a `&str → value` function with no shared state, so the
//! orchestrators can call them in any rule without ordering concerns.

use once_cell::sync::Lazy;
use regex::Regex;

// ── Hours ────────────────────────────────────────────────────────────────────

static RE_HOURS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(\d{1,4})\s*HORAS?\b").unwrap());

static RE_FIRST_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Extract an hour count written as `<1-4 digits> hora(s)` in any case.
///
/// Returns the canonical `"<N> horas"` form.
///
/// ```
/// use curriculum_extract::fields::extract_hours;
/// assert_eq!(extract_hours("duracion: 120HORAS").as_deref(), Some("120 horas"));
/// assert_eq!(extract_hours("sin dato"), None);
/// ```
pub fn extract_hours(text: &str) -> Option<String> {
    RE_HOURS
        .captures(text)
        .map(|caps| format!("{} horas", &caps[1]))
}

/// True when `text` carries an hour count.
pub fn has_hours(text: &str) -> bool {
    RE_HOURS.is_match(text)
}

/// Numeric value of the first digit run, e.g. `"3120 horas"` → `3120`.
pub fn hour_count(text: &str) -> Option<u32> {
    RE_FIRST_NUMBER
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
}

// ── Numeric codes ────────────────────────────────────────────────────────────

static RE_LONG_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{5,}$").unwrap());

/// Project and program codes found positionally in one row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodePair {
    pub project: Option<String>,
    pub program: Option<String>,
}

/// Scan cells in order for values made only of 5+ digits.
///
/// The first one is the project code, the next distinct one the program
/// code. A third token is ignored; fewer than two leave fields unset.
pub fn long_codes<'a, I>(cells: I) -> CodePair
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut pair = CodePair::default();
    for cell in cells.into_iter().flatten() {
        let token = cell.trim();
        if !RE_LONG_CODE.is_match(token) {
            continue;
        }
        match &pair.project {
            None => pair.project = Some(token.to_string()),
            Some(first) if pair.program.is_none() && first != token => {
                pair.program = Some(token.to_string());
            }
            Some(_) => {}
        }
    }
    pair
}

// ── RAP codes ────────────────────────────────────────────────────────────────

/// Longest description kept per RAP, in characters.
pub const RAP_DESCRIPTION_LIMIT: usize = 100;

/// Start of an entry: `<6-7 digit code> - <sub-code> <UPPERCASE letter>`.
static RE_RAP_HEAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{6,7}\s*-\s*(\d{1,2})\s+[A-ZÀÁÉÍÓÚÑ]").unwrap());

/// Boundary of the next entry: `<6-7 digit code> -`.
static RE_RAP_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{6,7}\s*-").unwrap());

static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Parse `"593343 - 01 IDENTIFICAR ... 593343 - 02 APLICAR ..."` into
/// `(sub-code, description)` pairs in document order.
///
/// A description runs from its first uppercase letter up to the next code
/// prefix or the end of input, across line breaks. It is at least two
/// characters long. Sub-codes are zero-padded to two digits; descriptions
/// are whitespace-collapsed and cut to [`RAP_DESCRIPTION_LIMIT`] chars.
pub fn parse_rap_codes(text: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut pos = 0;

    while let Some(head) = RE_RAP_HEAD.captures_at(text, pos) {
        let Some(whole) = head.get(0) else { break };
        let sub_code = &head[1];
        // The head ends just after the description's first letter.
        let desc_start = whole.end() - text[..whole.end()].chars().next_back().map_or(0, char::len_utf8);

        // At least one more character must follow that letter.
        let min_end = match text[whole.end()..].chars().next() {
            Some(c) => whole.end() + c.len_utf8(),
            None => {
                pos = next_char_boundary(text, whole.start());
                continue;
            }
        };

        let end = RE_RAP_PREFIX
            .find_at(text, min_end)
            .map_or(text.len(), |m| m.start());

        let description = RE_WS.replace_all(text[desc_start..end].trim(), " ");
        let description: String = description.chars().take(RAP_DESCRIPTION_LIMIT).collect();
        pairs.push((format!("{sub_code:0>2}"), description));
        pos = end;
    }

    pairs
}

fn next_char_boundary(text: &str, at: usize) -> usize {
    text[at..]
        .chars()
        .next()
        .map_or(text.len(), |c| at + c.len_utf8())
}

// ── Tests ────────────────────────────────────────────────────────────────────
