//! Parse provider output into records and name lists
//!
//! Provider responses are not guaranteed to be clean JSON. They may be wrapped
//! in markdown code fences, surrounded by prose, or carry emoji noise. The
//! pipeline here is:
//!
//! 1. strip code-fence lines
//! 2. locate the first complete bracketed array
//! 3. strip pictograph ranges
//! 4. drop a trailing comma before the closing bracket
//! 5. strict decode

use crate::error::ExtractorError;
use gazetteer_domain::Record;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

static FENCE_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?mi)^```(?:json)?\s*").expect("valid fence regex"));
static FENCE_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)\s*```$").expect("valid fence regex"));
static TRAILING_COMMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*\]").expect("valid comma regex"));

/// Emoji and pictograph code point ranges removed before decoding
pub const PICTOGRAPH_RANGES: &[(char, char)] = &[
    ('\u{1F600}', '\u{1F64F}'), // emoticons
    ('\u{1F300}', '\u{1F5FF}'), // symbols and pictographs
    ('\u{1F680}', '\u{1F6FF}'), // transport and map
    ('\u{1F1E0}', '\u{1F1FF}'), // flags
    ('\u{2700}', '\u{27BF}'),   // dingbats
    ('\u{2460}', '\u{24FF}'),   // enclosed alphanumerics
    ('\u{1F100}', '\u{1F1FF}'), // enclosed alphanumeric supplement
    ('\u{1F200}', '\u{1F2FF}'), // enclosed ideographic supplement
    ('\u{FE00}', '\u{FE0F}'),   // variation selectors
    ('\u{1F900}', '\u{1F9FF}'), // supplemental symbols
    ('\u{1FA70}', '\u{1FAFF}'), // extended-A
    ('\u{2600}', '\u{26FF}'),   // miscellaneous symbols
    ('\u{2B00}', '\u{2BFF}'),   // arrows
];

/// Extract the first JSON array from a raw response
///
/// Returns `None` if the response holds no complete bracketed array.
pub fn extract_json_array(raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        return None;
    }

    let unfenced = strip_code_fences(raw);
    let array = find_array(&unfenced)?;
    let cleaned = strip_pictographs(array);
    Some(TRAILING_COMMA_RE.replace_all(&cleaned, "]").trim().to_string())
}

/// Parse a response into records
///
/// Every array element must be a JSON object whose `identity_field` holds a
/// non-empty string. A single bad element rejects the whole response.
pub fn parse_records(raw: &str, identity_field: &str) -> Result<Vec<Record>, ExtractorError> {
    let values = decode_array(raw)?;

    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let record = Record::from_value(value)
                .map_err(|reason| ExtractorError::Schema { index, reason })?;
            match record.display_name(identity_field) {
                Some(name) if !name.trim().is_empty() => Ok(record),
                Some(_) => Err(ExtractorError::Schema {
                    index,
                    reason: format!("'{}' is empty", identity_field),
                }),
                None => Err(ExtractorError::Schema {
                    index,
                    reason: format!("Missing or invalid '{}'", identity_field),
                }),
            }
        })
        .collect()
}

/// Parse an enumeration response into a list of names
///
/// Every element must be a string. Names are trimmed, empty names dropped and
/// repeats removed, keeping the first occurrence.
pub fn parse_names(raw: &str) -> Result<Vec<String>, ExtractorError> {
    let values = decode_array(raw)?;

    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        let Value::String(name) = value else {
            return Err(ExtractorError::Schema {
                index,
                reason: "Expected a string".to_string(),
            });
        };
        let name = name.trim();
        if !name.is_empty() && seen.insert(name.to_string()) {
            names.push(name.to_string());
        }
    }

    Ok(names)
}

fn decode_array(raw: &str) -> Result<Vec<Value>, ExtractorError> {
    let json = extract_json_array(raw).ok_or(ExtractorError::NoArray)?;
    debug!("Extracted array of {} chars", json.len());
    Ok(serde_json::from_str(&json)?)
}

/// Remove markdown code-fence markers
fn strip_code_fences(text: &str) -> String {
    let opened = FENCE_OPEN_RE.replace_all(text, "");
    FENCE_CLOSE_RE.replace_all(&opened, "").into_owned()
}

/// Find the first complete bracketed array
///
/// Scans from each `[` in order and returns the shortest balanced span that
/// starts there, ignoring brackets inside string literals.
fn find_array(text: &str) -> Option<&str> {
    text.match_indices('[')
        .find_map(|(start, _)| balanced_end(&text[start..]).map(|end| &text[start..start + end]))
}

/// Byte length of the balanced bracket span at the start of `text`
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + c.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

/// Remove every character inside [`PICTOGRAPH_RANGES`]
pub fn strip_pictographs(text: &str) -> String {
    text.chars().filter(|c| !is_pictograph(*c)).collect()
}

fn is_pictograph(c: char) -> bool {
    PICTOGRAPH_RANGES
        .iter()
        .any(|(low, high)| (*low..=*high).contains(&c))
}
