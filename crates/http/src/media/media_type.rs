use crate::utils::write_value;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::fmt;

/// The wildcard marker used for type and subtype.
pub const WILDCARD: &str = "*";

/// `*/*`, the universal wildcard.
pub static WILDCARD_TYPE: Lazy<MediaType> = Lazy::new(|| MediaType::new(WILDCARD, WILDCARD));

/// `application/octet-stream`, assumed for request bodies without a `Content-Type`.
pub static APPLICATION_OCTET_STREAM: Lazy<MediaType> = Lazy::new(|| MediaType::new("application", "octet-stream"));

/// Which parameter carries the quality of a media type.
///
/// Client headers (`Accept`) use `q`, server declarations use `qs`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum QualityKey {
    Q,
    Qs,
}

impl QualityKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityKey::Q => "q",
            QualityKey::Qs => "qs",
        }
    }

    #[inline]
    pub(crate) fn matches(&self, name: &str) -> bool {
        name.eq_ignore_ascii_case(self.as_str())
    }
}

/// A parsed media type: `type/subtype` with parameters and an optional quality.
///
/// Type, subtype and parameter names are stored lower-cased. Parameters are
/// kept in a sorted map so that two media types compare equal regardless of
/// the order their parameters were written in. The quality parameter is never
/// stored in the map.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaType {
    type_: String,
    subtype: String,
    params: BTreeMap<String, String>,
    quality: Option<f32>,
}

impl MediaType {
    pub fn new(type_: impl AsRef<str>, subtype: impl AsRef<str>) -> Self {
        Self {
            type_: type_.as_ref().to_ascii_lowercase(),
            subtype: subtype.as_ref().to_ascii_lowercase(),
            params: BTreeMap::new(),
            quality: None,
        }
    }

    #[must_use]
    pub fn with_param(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.set_param(name, value);
        self
    }

    #[must_use]
    pub fn with_quality(mut self, quality: f32) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn set_param(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.params.insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    pub(crate) fn set_quality(&mut self, quality: f32) {
        self.quality = Some(quality);
    }

    pub fn type_(&self) -> &str {
        &self.type_
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// The structured syntax suffix, `json` for `hal+json`.
    pub fn suffix(&self) -> Option<&str> {
        self.subtype.rsplit_once('+').map(|(_, suffix)| suffix)
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub(crate) fn params_map(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn charset(&self) -> Option<&str> {
        self.param("charset")
    }

    /// The declared quality, 1.0 when none was given.
    pub fn quality(&self) -> f32 {
        self.quality.unwrap_or(1.0)
    }

    pub fn has_quality(&self) -> bool {
        self.quality.is_some()
    }

    pub fn is_wildcard_type(&self) -> bool {
        self.type_ == WILDCARD
    }

    pub fn is_wildcard_subtype(&self) -> bool {
        self.subtype == WILDCARD
    }

    /// Returns true for `*/*`.
    pub fn is_wildcard(&self) -> bool {
        self.is_wildcard_type() && self.is_wildcard_subtype()
    }

    /// Returns true if neither type nor subtype is a wildcard.
    pub fn is_concrete(&self) -> bool {
        !self.is_wildcard_type() && !self.is_wildcard_subtype()
    }

    pub fn essence(&self) -> String {
        format!("{}/{}", self.type_, self.subtype)
    }
}

/// Renders the `Content-Type` form: `type/subtype;name=value`, quoting values
/// that are not plain tokens. The quality is not rendered.
impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.type_, self.subtype)?;
        for (name, value) in &self.params {
            write!(f, ";{name}=")?;
            write_value(f, value)?;
        }
        Ok(())
    }
}

impl From<&mime::Mime> for MediaType {
    fn from(mime: &mime::Mime) -> Self {
        let (type_, subtype) = mime.essence_str().split_once('/').unwrap_or((mime.essence_str(), WILDCARD));
        let mut media_type = MediaType::new(type_, subtype);
        for (name, value) in mime.params() {
            media_type.set_param(name.as_str(), value.as_str());
        }
        media_type
    }
}

impl From<mime::Mime> for MediaType {
    fn from(mime: mime::Mime) -> Self {
        MediaType::from(&mime)
    }
}
