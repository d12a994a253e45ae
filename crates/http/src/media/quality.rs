//! Lenient quality (`q` / `qs`) extraction.
//!
//! Clients send all kinds of slightly broken quality values (`q= .8`,
//! `q =0.5`, `q=0. 5`). Rejecting them would make content negotiation fail for
//! requests that obviously mean something, so the scanner accepts digits with
//! at most one period, ignores embedded whitespace and falls back to a quality
//! of 1.0 when nothing usable is found.

use crate::media::QualityKey;

/// The quality assumed when no usable quality parameter is present.
pub const DEFAULT_QUALITY: f32 = 1.0;

/// Scans the parameters of a single header entry for its quality.
///
/// Scanning starts at `offset` and walks `name[=value]` pairs separated by `;`
/// until a `,` (which is not consumed) or the end of `input`. Each well formed
/// occurrence of `key` replaces the previous one; malformed ones are ignored.
///
/// Returns the quality and the offset where scanning stopped, or
/// `(DEFAULT_QUALITY, None)` when no well formed quality was found.
pub fn scan_quality(input: &str, offset: usize, key: QualityKey) -> (f32, Option<usize>) {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut pos = offset.min(len);
    let mut found = None;

    while pos < len {
        let name_start = pos;
        while pos < len && !matches!(bytes[pos], b'=' | b';' | b',') {
            pos += 1;
        }
        let name = input[name_start..pos].trim();

        if pos == len || bytes[pos] == b',' {
            break;
        }
        if bytes[pos] == b';' {
            pos += 1;
            continue;
        }

        // bytes[pos] == b'='
        pos += 1;
        let value_start = pos;
        let mut in_quote = false;
        while pos < len {
            match bytes[pos] {
                b'"' => in_quote = !in_quote,
                b';' | b',' if !in_quote => break,
                _ => {}
            }
            pos += 1;
        }

        if key.matches(name) {
            if let Some(quality) = parse_quality_value(&input[value_start..pos]) {
                found = Some(quality);
            }
        }

        if pos < len && bytes[pos] == b';' {
            pos += 1;
        }
    }

    match found {
        Some(quality) => (quality, Some(pos)),
        None => (DEFAULT_QUALITY, None),
    }
}

/// Parses a raw quality value, tolerating whitespace anywhere inside it.
///
/// Accepts one or more digits with at most one period, optionally quoted, in
/// the range `0.0..=1.0`.
pub(crate) fn parse_quality_value(raw: &str) -> Option<f32> {
    let trimmed = raw.trim();
    let unquoted = trimmed.strip_prefix('"').and_then(|v| v.strip_suffix('"')).unwrap_or(trimmed);

    let mut digits = String::with_capacity(unquoted.len());
    let mut periods = 0;
    for c in unquoted.chars() {
        match c {
            '0'..='9' => digits.push(c),
            '.' => {
                periods += 1;
                digits.push(c);
            }
            c if c.is_ascii_whitespace() => {}
            _ => return None,
        }
    }

    if periods > 1 || !digits.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let quality: f32 = digits.parse().ok()?;
    (0.0..=1.0).contains(&quality).then_some(quality)
}
