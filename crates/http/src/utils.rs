//! Utility macros and functions for the HTTP crate.
//!
//! This module provides helper macros and the quoted-string handling shared
//! by the media type and cache-control header grammars.

use std::borrow::Cow;
use std::fmt;

/// A macro for early returns with an error if a condition is not met.
///
/// This is similar to the `assert!` macro, but returns an error instead of panicking.
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;

/// Returns true for RFC 7230 `tchar` bytes.
#[inline]
pub(crate) fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '!' | '#' | '$' | '%' | '&' | '\'' | '*' | '+' | '-' | '.' | '^' | '_' | '`' | '|' | '~')
}

/// Splits `input` on `delimiter`, ignoring delimiters inside quoted strings.
///
/// Yields `(offset, segment)` pairs where `offset` is the byte offset of the
/// segment inside `input`. An unterminated quote extends to the end of input.
pub(crate) fn split_unquoted(input: &str, delimiter: char) -> SplitUnquoted<'_> {
    SplitUnquoted { input, position: 0, delimiter, done: false }
}

#[derive(Debug)]
pub(crate) struct SplitUnquoted<'a> {
    input: &'a str,
    position: usize,
    delimiter: char,
    done: bool,
}

impl<'a> Iterator for SplitUnquoted<'a> {
    type Item = (usize, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let start = self.position;
        let mut in_quote = false;
        let mut escaped = false;
        for (i, c) in self.input[start..].char_indices() {
            if in_quote {
                match (escaped, c) {
                    (true, _) => escaped = false,
                    (false, '\\') => escaped = true,
                    (false, '"') => in_quote = false,
                    _ => {}
                }
                continue;
            }
            if c == '"' {
                in_quote = true;
            } else if c == self.delimiter {
                let end = start + i;
                self.position = end + c.len_utf8();
                return Some((start, &self.input[start..end]));
            }
        }

        self.done = true;
        Some((start, &self.input[start..]))
    }
}

/// Removes surrounding quotes and backslash escapes from a parameter value.
pub(crate) fn unquote(value: &str) -> Cow<'_, str> {
    let Some(inner) = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) else {
        return Cow::Borrowed(value);
    };
    if !inner.contains('\\') {
        return Cow::Borrowed(inner);
    }

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// Writes a parameter value, quoting it when it is not a plain token.
pub(crate) fn write_value(f: &mut impl fmt::Write, value: &str) -> fmt::Result {
    if !value.is_empty() && value.chars().all(is_token_char) {
        return f.write_str(value);
    }

    f.write_char('"')?;
    for c in value.chars() {
        if c == '"' || c == '\\' {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    f.write_char('"')
}
