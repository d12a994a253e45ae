//! `Cache-Control` header parsing and formatting.
//!
//! Every known directive is described by an entry of [`DIRECTIVES`]: its name
//! plus the function parsing its argument and the one formatting it back.
//! Formatting walks the table in order, so a header is always rendered in the
//! same directive order no matter how it was built. Unknown directives are
//! kept as extensions and rendered after the known ones.

use crate::utils::{split_unquoted, unquote, write_value};
use std::fmt;
use std::fmt::Write;
use tracing::debug;

/// The argument of a directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveValue {
    /// `no-store`
    Flag,
    /// `max-age=60`
    Seconds(u64),
    /// `private="set-cookie, x-user"`, an empty list renders as a bare flag
    Fields(Vec<String>),
}

type ParseFn = fn(Option<&str>) -> Option<DirectiveValue>;
type FormatFn = fn(&DirectiveValue, &mut String) -> fmt::Result;

struct Directive {
    name: &'static str,
    parse: ParseFn,
    format: FormatFn,
}

const DIRECTIVES: &[Directive] = &[
    Directive { name: "public", parse: parse_flag, format: format_flag },
    Directive { name: "private", parse: parse_fields, format: format_fields },
    Directive { name: "no-cache", parse: parse_fields, format: format_fields },
    Directive { name: "no-store", parse: parse_flag, format: format_flag },
    Directive { name: "no-transform", parse: parse_flag, format: format_flag },
    Directive { name: "must-revalidate", parse: parse_flag, format: format_flag },
    Directive { name: "proxy-revalidate", parse: parse_flag, format: format_flag },
    Directive { name: "immutable", parse: parse_flag, format: format_flag },
    Directive { name: "max-age", parse: parse_seconds, format: format_seconds },
    Directive { name: "s-maxage", parse: parse_seconds, format: format_seconds },
    Directive { name: "stale-while-revalidate", parse: parse_seconds, format: format_seconds },
    Directive { name: "stale-if-error", parse: parse_seconds, format: format_seconds },
];

fn parse_flag(arg: Option<&str>) -> Option<DirectiveValue> {
    arg.is_none().then_some(DirectiveValue::Flag)
}

fn format_flag(_value: &DirectiveValue, _out: &mut String) -> fmt::Result {
    Ok(())
}

fn parse_seconds(arg: Option<&str>) -> Option<DirectiveValue> {
    unquote(arg?.trim()).parse().ok().map(DirectiveValue::Seconds)
}

fn format_seconds(value: &DirectiveValue, out: &mut String) -> fmt::Result {
    match value {
        DirectiveValue::Seconds(seconds) => write!(out, "={seconds}"),
        _ => Ok(()),
    }
}

fn parse_fields(arg: Option<&str>) -> Option<DirectiveValue> {
    let Some(arg) = arg else {
        return Some(DirectiveValue::Fields(vec![]));
    };
    let fields = unquote(arg.trim())
        .split(',')
        .map(|field| field.trim().to_ascii_lowercase())
        .filter(|field| !field.is_empty())
        .collect();
    Some(DirectiveValue::Fields(fields))
}

fn format_fields(value: &DirectiveValue, out: &mut String) -> fmt::Result {
    match value {
        DirectiveValue::Fields(fields) if !fields.is_empty() => {
            write!(out, "=\"{}\"", fields.join(", "))
        }
        _ => Ok(()),
    }
}

fn lookup(name: &str) -> Option<(usize, &'static Directive)> {
    DIRECTIVES.iter().enumerate().find(|(_, directive)| directive.name == name)
}

/// A parsed `Cache-Control` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheControl {
    known: Vec<Option<DirectiveValue>>,
    extensions: Vec<(String, Option<String>)>,
}

impl CacheControl {
    pub fn new() -> Self {
        Self { known: vec![None; DIRECTIVES.len()], extensions: vec![] }
    }

    /// Parses a header value. Directives with a malformed argument are dropped.
    pub fn parse(header: &str) -> Self {
        let mut cache_control = Self::new();
        for (_, item) in split_unquoted(header, ',') {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }

            let (name, arg) = match item.split_once('=') {
                Some((name, arg)) => (name.trim().to_ascii_lowercase(), Some(arg.trim())),
                None => (item.to_ascii_lowercase(), None),
            };

            match lookup(&name) {
                Some((index, directive)) => match (directive.parse)(arg) {
                    Some(value) => cache_control.known[index] = Some(value),
                    None => debug!(directive = %name, "skip malformed cache-control directive"),
                },
                None => cache_control.extensions.push((name, arg.map(|arg| unquote(arg).into_owned()))),
            }
        }
        cache_control
    }

    pub fn get(&self, name: &str) -> Option<&DirectiveValue> {
        let (index, _) = lookup(&name.to_ascii_lowercase())?;
        self.known.get(index)?.as_ref()
    }

    pub fn extension(&self, name: &str) -> Option<Option<&str>> {
        self.extensions.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)).map(|(_, arg)| arg.as_deref())
    }

    /// Sets a known directive, returns false for unknown names.
    pub fn set(&mut self, name: &str, value: DirectiveValue) -> bool {
        match lookup(&name.to_ascii_lowercase()) {
            Some((index, _)) => {
                self.known[index] = Some(value);
                true
            }
            None => false,
        }
    }

    pub fn set_extension(&mut self, name: impl Into<String>, arg: Option<String>) {
        self.extensions.push((name.into().to_ascii_lowercase(), arg));
    }

    #[must_use]
    pub fn with(mut self, name: &str, value: DirectiveValue) -> Self {
        self.set(name, value);
        self
    }

    pub fn max_age(&self) -> Option<u64> {
        match self.get("max-age") {
            Some(DirectiveValue::Seconds(seconds)) => Some(*seconds),
            _ => None,
        }
    }

    pub fn is_no_store(&self) -> bool {
        self.get("no-store").is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.known.iter().all(Option::is_none) && self.extensions.is_empty()
    }
}

impl Default for CacheControl {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CacheControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        let known = DIRECTIVES.iter().zip(&self.known).filter_map(|(directive, value)| Some((directive, value.as_ref()?)));
        for (directive, value) in known {
            if !out.is_empty() {
                out.push_str(", ");
            }
            out.push_str(directive.name);
            (directive.format)(value, &mut out)?;
        }

        for (name, arg) in &self.extensions {
            if !out.is_empty() {
                out.push_str(", ");
            }
            out.push_str(name);
            if let Some(arg) = arg {
                out.push('=');
                write_value(&mut out, arg)?;
            }
        }

        f.write_str(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let cache_control = CacheControl::parse(r#"max-age=60, Private="Set-Cookie, X-User", no-store, community="UCI""#);
        assert_eq!(cache_control.max_age(), Some(60));
        assert!(cache_control.is_no_store());
        assert_eq!(
            cache_control.get("private"),
            Some(&DirectiveValue::Fields(vec!["set-cookie".to_string(), "x-user".to_string()]))
        );
        assert_eq!(cache_control.extension("community"), Some(Some("UCI")));
    }

    #[test]
    fn test_format_uses_table_order() {
        let cache_control = CacheControl::new()
            .with("max-age", DirectiveValue::Seconds(10))
            .with("no-cache", DirectiveValue::Fields(vec![]))
            .with("public", DirectiveValue::Flag);
        assert_eq!(cache_control.to_string(), "public, no-cache, max-age=10");
    }

    #[test]
    fn test_malformed_argument_is_dropped() {
        let cache_control = CacheControl::parse("max-age=abc, no-store=1, must-revalidate");
        assert_eq!(cache_control.max_age(), None);
        assert!(!cache_control.is_no_store());
        assert_eq!(cache_control.to_string(), "must-revalidate");
    }

    #[test]
    fn test_round_trip() {
        let header = r#"private="set-cookie", max-age=0, x-ext="a b""#;
        let cache_control = CacheControl::parse(header);
        assert_eq!(cache_control.to_string(), r#"private="set-cookie", max-age=0, x-ext="a b""#);
        assert_eq!(CacheControl::parse(&cache_control.to_string()), cache_control);
    }

    #[test]
    fn test_unknown_directive_cannot_be_set() {
        let mut cache_control = CacheControl::new();
        assert!(!cache_control.set("x-unknown", DirectiveValue::Flag));
        assert!(cache_control.is_empty());
    }
}
