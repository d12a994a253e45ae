//! Path templates compiled into anchored regular expressions.
//!
//! A template is a sequence of literal runs and parameters:
//!
//! ```text
//! /users/{id}/files/{path: .+\.txt}
//! ```
//!
//! - literal runs are percent-encoded the way a request path carries them, then
//!   regex-escaped; repeated `/` are collapsed, a trailing `/` is dropped and a
//!   leading `/` is added when missing
//! - `{name}` matches one or more non-`/` characters
//! - `{name: regex}` matches the given regex; named groups inside it are
//!   renamed so they can never clash with the groups generated for parameters
//!
//! The compiled expression is anchored at the start and accepts any trailing
//! `/...` remainder, which is reported with the match so sub-resource roots
//! can continue dispatching on it.

use crate::router::path::MatrixPath;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::fmt::Write;
use thiserror::Error;

/// Default expression for a parameter without a custom regex.
const DEFAULT_GROUP: &str = "[^/]+";

/// Name of the group capturing the unmatched remainder.
const REST_GROUP: &str = "rest";

/// Prefix given to named groups written inside a custom regex.
const USER_GROUP_MARKER: &str = "x_";

/// Errors raised when a template cannot be compiled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("empty parameter name at offset {offset}")]
    EmptyName { offset: usize },

    #[error("unterminated parameter starting at offset {offset}")]
    Unterminated { offset: usize },

    #[error("invalid character {found:?} in parameter name at offset {offset}")]
    InvalidName { found: char, offset: usize },

    #[error("invalid regex for parameter {name}: {reason}")]
    InvalidRegex { name: String, reason: String },
}

/// Ranking of a pattern against others matching the same path.
///
/// Orders by literal characters (more is greater), then total groups (fewer
/// is greater), then explicit groups (fewer is greater). The greater pattern
/// is the more specific one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Specificity {
    pub literal_chars: usize,
    pub groups: usize,
    pub explicit_groups: usize,
}

impl Ord for Specificity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.literal_chars
            .cmp(&other.literal_chars)
            .then_with(|| other.groups.cmp(&self.groups))
            .then_with(|| other.explicit_groups.cmp(&self.explicit_groups))
    }
}

impl PartialOrd for Specificity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone)]
struct Group {
    name: String,
    group_name: String,
}

/// A compiled path template.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    template: String,
    regex: Regex,
    groups: Vec<Group>,
    literal_char_count: usize,
    default_group_count: usize,
    explicit_group_count: usize,
}

/// One parameter bound by a match.
///
/// `start` and `end` are byte offsets into the matrix-stripped path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub value: String,
    pub start: usize,
    pub end: usize,
}

/// Result of matching a path against a [`RoutePattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    bindings: Vec<Binding>,
    remainder: String,
}

impl PatternMatch {
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn into_bindings(self) -> Vec<Binding> {
        self.bindings
    }

    /// The part of the path after the pattern, empty or starting with `/`.
    pub fn remainder(&self) -> &str {
        &self.remainder
    }

    /// True when nothing but an optional trailing `/` is left.
    pub fn is_exact(&self) -> bool {
        self.remainder.is_empty() || self.remainder == "/"
    }
}

enum Token {
    Literal(String),
    Param { name: String, regex: Option<String>, end: usize },
}

impl RoutePattern {
    /// Compiles a template.
    pub fn compile(template: &str) -> Result<Self, TemplateError> {
        let tokens = normalize(tokenize(template)?);

        let mut body = String::new();
        let mut groups = vec![];
        let mut literal_char_count = 0;
        let mut default_group_count = 0;
        let mut explicit_group_count = 0;

        for token in tokens {
            match token {
                Token::Literal(literal) => {
                    literal_char_count += decoded_len(&literal);
                    body.push_str(&regex::escape(&encode_path(&literal)));
                }
                Token::Param { name, regex, end } => {
                    let group_name = format!("p{}_{end}", groups.len());
                    let expression = match regex {
                        Some(custom) => {
                            let custom = mark_user_groups(&custom);
                            Regex::new(&format!("^(?:{custom})$")).map_err(|e| TemplateError::InvalidRegex {
                                name: name.clone(),
                                reason: e.to_string(),
                            })?;
                            explicit_group_count += 1;
                            custom
                        }
                        None => {
                            default_group_count += 1;
                            DEFAULT_GROUP.to_string()
                        }
                    };
                    let _ = write!(body, "(?P<{group_name}>{expression})");
                    groups.push(Group { name, group_name });
                }
            }
        }

        let regex = Regex::new(&format!("^{body}(?P<{REST_GROUP}>/.*)?$"))
            .map_err(|e| TemplateError::InvalidRegex { name: String::new(), reason: e.to_string() })?;

        Ok(Self {
            template: template.to_string(),
            regex,
            groups,
            literal_char_count,
            default_group_count,
            explicit_group_count,
        })
    }

    /// Compiles `prefix` and `suffix` joined by exactly one `/`.
    pub fn join(prefix: &str, suffix: &str) -> Result<Self, TemplateError> {
        Self::compile(&join_templates(prefix, suffix))
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// The regular expression the template compiled to.
    pub fn as_regex(&self) -> &str {
        self.regex.as_str()
    }

    pub fn literal_char_count(&self) -> usize {
        self.literal_char_count
    }

    pub fn default_group_count(&self) -> usize {
        self.default_group_count
    }

    pub fn explicit_group_count(&self) -> usize {
        self.explicit_group_count
    }

    /// Parameter names in template order, duplicates included.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|group| group.name.as_str())
    }

    pub fn specificity(&self) -> Specificity {
        Specificity {
            literal_chars: self.literal_char_count,
            groups: self.default_group_count + self.explicit_group_count,
            explicit_groups: self.explicit_group_count,
        }
    }

    /// Matches a raw request path, matrix parameters are stripped first.
    pub fn matches(&self, path: &str) -> Option<PatternMatch> {
        self.match_stripped(MatrixPath::parse(path).stripped())
    }

    /// Matches a path that no longer carries matrix parameters.
    pub fn match_stripped(&self, path: &str) -> Option<PatternMatch> {
        let captures = self.regex.captures(path)?;

        let bindings = self
            .groups
            .iter()
            .filter_map(|group| {
                captures.name(&group.group_name).map(|m| Binding {
                    name: group.name.clone(),
                    value: m.as_str().to_string(),
                    start: m.start(),
                    end: m.end(),
                })
            })
            .collect();
        let remainder = captures.name(REST_GROUP).map(|m| m.as_str().to_string()).unwrap_or_default();

        Some(PatternMatch { bindings, remainder })
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

/// Joins two template fragments with exactly one `/` between them.
pub fn join_templates(prefix: &str, suffix: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let suffix = suffix.trim_start_matches('/');
    match (prefix.is_empty(), suffix.is_empty()) {
        (_, true) => format!("{prefix}/"),
        (true, false) => format!("/{suffix}"),
        (false, false) => format!("{prefix}/{suffix}"),
    }
}

fn tokenize(template: &str) -> Result<Vec<Token>, TemplateError> {
    let mut tokens = vec![];
    let mut literal = String::new();
    let mut chars = template.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        if c != '{' {
            literal.push(c);
            continue;
        }
        if !literal.is_empty() {
            tokens.push(Token::Literal(std::mem::take(&mut literal)));
        }

        while chars.next_if(|&(_, c)| c.is_whitespace()).is_some() {}

        let mut name = String::new();
        while let Some((i, c)) = chars.next_if(|&(_, c)| !c.is_whitespace() && !matches!(c, ':' | '}')) {
            let valid = if name.is_empty() {
                c.is_ascii_alphanumeric() || c == '_'
            } else {
                c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')
            };
            if !valid {
                return Err(TemplateError::InvalidName { found: c, offset: i });
            }
            name.push(c);
        }

        while chars.next_if(|&(_, c)| c.is_whitespace()).is_some() {}

        match chars.next() {
            Some((i, '}')) if name.is_empty() => return Err(TemplateError::EmptyName { offset: i }),
            Some((_, ':')) if name.is_empty() => return Err(TemplateError::EmptyName { offset }),
            Some((i, '}')) => tokens.push(Token::Param { name, regex: None, end: i + 1 }),
            Some((_, ':')) => {
                let (regex, end) = read_custom_regex(&mut chars).ok_or(TemplateError::Unterminated { offset })?;
                let regex = regex.trim().to_string();
                if regex.is_empty() {
                    tokens.push(Token::Param { name, regex: None, end });
                } else {
                    tokens.push(Token::Param { name, regex: Some(regex), end });
                }
            }
            Some((i, found)) => return Err(TemplateError::InvalidName { found, offset: i }),
            None => return Err(TemplateError::Unterminated { offset }),
        }
    }

    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    Ok(tokens)
}

/// Reads up to the `}` closing the parameter, nested braces included.
/// Returns the regex and the offset right after the closing brace.
fn read_custom_regex(chars: &mut impl Iterator<Item = (usize, char)>) -> Option<(String, usize)> {
    let mut regex = String::new();
    let mut depth = 0usize;
    let mut escaped = false;

    for (i, c) in chars {
        if escaped {
            escaped = false;
            regex.push(c);
            continue;
        }
        match c {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' if depth == 0 => return Some((regex, i + 1)),
            '}' => depth -= 1,
            _ => {}
        }
        regex.push(c);
    }
    None
}

/// Collapses separators and fixes the leading and trailing `/`.
fn normalize(tokens: Vec<Token>) -> Vec<Token> {
    let mut normalized: Vec<Token> = Vec::with_capacity(tokens.len() + 1);

    for token in tokens {
        match token {
            Token::Literal(literal) => {
                let mut collapsed = String::with_capacity(literal.len());
                for c in literal.chars() {
                    if c == '/' && collapsed.ends_with('/') {
                        continue;
                    }
                    collapsed.push(c);
                }
                if normalized.is_empty() && !collapsed.starts_with('/') {
                    collapsed.insert(0, '/');
                }
                normalized.push(Token::Literal(collapsed));
            }
            param => {
                if normalized.is_empty() {
                    normalized.push(Token::Literal("/".to_string()));
                }
                normalized.push(param);
            }
        }
    }

    if let Some(Token::Literal(last)) = normalized.last_mut() {
        if last.ends_with('/') {
            last.pop();
        }
        if last.is_empty() {
            normalized.pop();
        }
    }
    normalized
}

fn mark_user_groups(regex: &str) -> String {
    let mut marked = String::with_capacity(regex.len());
    let mut rest = regex;
    while let Some(index) = rest.find("(?") {
        let (head, tail) = rest.split_at(index);
        marked.push_str(head);

        let prefix_len = if tail.starts_with("(?P<") {
            4
        } else if tail.starts_with("(?<") && tail[3..].starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
            3
        } else {
            2
        };
        marked.push_str(&tail[..prefix_len]);
        if prefix_len > 2 {
            marked.push_str(USER_GROUP_MARKER);
        }
        rest = &tail[prefix_len..];
    }
    marked.push_str(rest);
    marked
}

fn is_path_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"-._~!$&'()*+,;=:@/".contains(&b)
}

/// Percent-encodes characters a request path cannot carry literally.
/// Existing `%XX` escapes are kept.
fn encode_path(literal: &str) -> String {
    let bytes = literal.as_bytes();
    let mut encoded = String::with_capacity(literal.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'%' && i + 2 < bytes.len() && bytes[i + 1].is_ascii_hexdigit() && bytes[i + 2].is_ascii_hexdigit() {
            encoded.push_str(&literal[i..i + 3]);
            i += 3;
            continue;
        }
        if is_path_byte(b) {
            encoded.push(char::from(b));
        } else {
            let _ = write!(encoded, "%{b:02X}");
        }
        i += 1;
    }
    encoded
}

/// Counts characters of a literal once its `%XX` escapes are decoded.
fn decoded_len(literal: &str) -> usize {
    let bytes = literal.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() && bytes[i + 1].is_ascii_hexdigit() && bytes[i + 2].is_ascii_hexdigit()
        {
            decoded.push((hex_value(bytes[i + 1]) << 4) | hex_value(bytes[i + 2]));
            i += 3;
            continue;
        }
        decoded.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&decoded).chars().count()
}

fn hex_value(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        _ => b.to_ascii_uppercase() - b'A' + 10,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_default_group() {
        let pattern = RoutePattern::compile("/users/{id}").unwrap();
        assert_eq!(pattern.as_regex(), r"^/users/(?P<p0_11>[^/]+)(?P<rest>/.*)?$");
        assert_eq!(pattern.literal_char_count(), 7);
        assert_eq!(pattern.default_group_count(), 1);
        assert_eq!(pattern.explicit_group_count(), 0);
    }

    #[test]
    fn test_separators_are_normalized() {
        let pattern = RoutePattern::compile("users//{id}///files/").unwrap();
        assert_eq!(pattern.as_regex(), r"^/users/(?P<p0_11>[^/]+)/files(?P<rest>/.*)?$");
        assert_eq!(pattern.literal_char_count(), "/users//files".len());
    }

    #[test]
    fn test_literal_is_encoded_and_escaped() {
        let pattern = RoutePattern::compile("/a b/c.d/caf\u{e9}").unwrap();
        assert_eq!(pattern.literal_char_count(), 13);
        assert!(pattern.matches("/a%20b/c.d/caf%C3%A9").is_some());
        assert!(pattern.matches("/a%20b/cxd/caf%C3%A9").is_none());

        let encoded = RoutePattern::compile("/a%20b").unwrap();
        assert_eq!(encoded.literal_char_count(), 4);
        assert!(encoded.matches("/a%20b").is_some());
    }

    #[test]
    fn test_stray_percent_before_multibyte_char() {
        let pattern = RoutePattern::compile("/%a\u{e9}").unwrap();
        assert_eq!(pattern.literal_char_count(), 4);
        assert!(pattern.matches("/%25a%C3%A9").is_some());

        let trailing = RoutePattern::compile("/x%").unwrap();
        assert_eq!(trailing.literal_char_count(), 3);
    }

    #[test]
    fn test_whitespace_around_name() {
        let pattern = RoutePattern::compile("/{ id }/{ name : [a-z]+ }").unwrap();
        let matched = pattern.matches("/7/abc").unwrap();
        assert_eq!(matched.bindings()[0].name, "id");
        assert_eq!(matched.bindings()[1].name, "name");
        assert_eq!(matched.bindings()[1].value, "abc");
        assert!(pattern.matches("/7/ABC").is_none());
    }

    #[test]
    fn test_custom_regex_with_braces() {
        let pattern = RoutePattern::compile(r"/code/{code: [0-9]{3}}").unwrap();
        assert_eq!(pattern.explicit_group_count(), 1);
        assert!(pattern.matches("/code/404").is_some());
        assert!(pattern.matches("/code/4040").is_none());
    }

    #[test]
    fn test_user_named_groups_cannot_collide() {
        let pattern = RoutePattern::compile(r"/{a: (?P<p0_5>x)(?<rest>y)}").unwrap();
        let matched = pattern.matches("/xy/more").unwrap();
        assert_eq!(matched.bindings()[0].value, "xy");
        assert_eq!(matched.remainder(), "/more");
    }

    #[test]
    fn test_invalid_templates() {
        assert_eq!(RoutePattern::compile("/{}").unwrap_err(), TemplateError::EmptyName { offset: 2 });
        assert!(matches!(RoutePattern::compile("/{id"), Err(TemplateError::Unterminated { .. })));
        assert!(matches!(RoutePattern::compile("/{id: [0-9]+"), Err(TemplateError::Unterminated { .. })));
        assert!(matches!(RoutePattern::compile("/{i d}"), Err(TemplateError::InvalidName { found: 'd', .. })));
        assert!(matches!(RoutePattern::compile("/{-id}"), Err(TemplateError::InvalidName { found: '-', .. })));
        assert!(matches!(RoutePattern::compile("/{id: [0-9}"), Err(TemplateError::InvalidRegex { .. })));
    }

    #[test]
    fn test_name_characters() {
        let pattern = RoutePattern::compile("/{user.first-name_1}").unwrap();
        assert_eq!(pattern.param_names().collect::<Vec<_>>(), vec!["user.first-name_1"]);
    }

    #[test]
    fn test_match_offsets_and_remainder() {
        let pattern = RoutePattern::compile("/users/{id}").unwrap();
        let matched = pattern.matches("/users/42/orders/1").unwrap();
        assert_eq!(
            matched.bindings(),
            &[Binding { name: "id".to_string(), value: "42".to_string(), start: 7, end: 9 }]
        );
        assert_eq!(matched.remainder(), "/orders/1");
        assert!(!matched.is_exact());

        assert!(pattern.matches("/users/42/").unwrap().is_exact());
        assert!(pattern.matches("/users").is_none());
        assert!(pattern.matches("/usersx/1").is_none());
    }

    #[test]
    fn test_matrix_params_are_stripped() {
        let pattern = RoutePattern::compile("/cars/{make}/{model}").unwrap();
        let matched = pattern.matches("/cars;color=red/mercedes;year=2020/e55").unwrap();
        let values: Vec<_> = matched.bindings().iter().map(|b| (b.value.as_str(), b.start, b.end)).collect();
        assert_eq!(values, vec![("mercedes", 6, 14), ("e55", 15, 18)]);
    }

    #[test]
    fn test_duplicate_names_are_kept_apart() {
        let pattern = RoutePattern::join("/items/{id}", "/parts/{id}").unwrap();
        let matched = pattern.matches("/items/1/parts/2").unwrap();
        let values: Vec<_> = matched.bindings().iter().map(|b| (b.name.as_str(), b.value.as_str())).collect();
        assert_eq!(values, vec![("id", "1"), ("id", "2")]);
    }

    #[test]
    fn test_join() {
        assert_eq!(join_templates("/api/", "/users"), "/api/users");
        assert_eq!(join_templates("/api", "users"), "/api/users");
        assert_eq!(join_templates("api", ""), "api/");
        assert_eq!(join_templates("", "users"), "/users");
        assert_eq!(RoutePattern::join("/api/", "/users").unwrap().template(), "/api/users");
    }

    #[test]
    fn test_root() {
        let pattern = RoutePattern::compile("/").unwrap();
        assert_eq!(pattern.literal_char_count(), 0);
        assert!(pattern.matches("/").unwrap().is_exact());
        assert!(pattern.matches("").unwrap().is_exact());
        assert_eq!(pattern.matches("/a").unwrap().remainder(), "/a");
    }

    #[test]
    fn test_specificity_order() {
        let literal = RoutePattern::compile("/users/me").unwrap().specificity();
        let param = RoutePattern::compile("/users/{id}").unwrap().specificity();
        let explicit = RoutePattern::compile("/users/{id: [0-9]+}").unwrap().specificity();
        let two = RoutePattern::compile("/users/{a}{b}").unwrap().specificity();

        assert!(literal > param);
        assert!(param > explicit);
        assert!(param > two);
        assert_eq!(param.cmp(&param), Ordering::Equal);
    }
}
