//! Compatibility between server declared and client requested media types.
//!
//! For a server type `S` and a client type `C`:
//!
//! 1. `*/*` on one side resolves to the other side; `*/*` on both sides resolves
//!    to `*/*` with distance 0.
//! 2. Different concrete types never match.
//! 3. Different subtypes match when one is `*` or one is the structured syntax
//!    suffix of the other (`hal+json` and `json`).
//! 4. The distance counts the dimensions (type, subtype) that were not an exact
//!    match.
//! 5. A `charset` declared by `S` must equal the one of `C`, or be accepted by
//!    `Accept-Charset` when `C` has none.
//! 6. Parameters are those of `S` overlaid with those of `C`, the quality is the
//!    one of `C`.

use crate::media::charset::is_charset_accepted;
use crate::media::{MediaType, WILDCARD};
use std::cmp::Ordering;

/// The outcome of matching one server type against one client type.
#[derive(Debug, Clone, PartialEq)]
pub struct CompatibleMatch {
    media_type: MediaType,
    distance: u8,
    quality: f32,
    server_quality: f32,
    wildcard_pair: bool,
}

impl CompatibleMatch {
    /// The resolved media type, carrying the merged parameters and no quality.
    pub fn media_type(&self) -> &MediaType {
        &self.media_type
    }

    pub fn into_media_type(self) -> MediaType {
        self.media_type
    }

    /// 0 for an exact match, 1 when one dimension needed a wildcard, 2 when both did.
    pub fn distance(&self) -> u8 {
        self.distance
    }

    /// The client side quality.
    pub fn quality(&self) -> f32 {
        self.quality
    }

    pub fn server_quality(&self) -> f32 {
        self.server_quality
    }

    /// True when both sides were `*/*`.
    pub fn is_wildcard_pair(&self) -> bool {
        self.wildcard_pair
    }

    /// Orders matches from most to least preferred.
    ///
    /// Wildcard pairs come last, then quality descending, distance ascending
    /// and server quality descending.
    pub fn preference_cmp(&self, other: &Self) -> Ordering {
        self.wildcard_pair
            .cmp(&other.wildcard_pair)
            .then_with(|| other.quality.total_cmp(&self.quality))
            .then_with(|| self.distance.cmp(&other.distance))
            .then_with(|| other.server_quality.total_cmp(&self.server_quality))
    }
}

/// Resolves every compatible (server, client) pair, most preferred first.
///
/// Pairs are produced server-major, so among equally ranked matches the
/// server's declaration order wins.
pub fn resolve(server: &[MediaType], client: &[MediaType], accept_charsets: Option<&[String]>) -> Vec<CompatibleMatch> {
    let mut matches = vec![];
    for server_type in server {
        for client_type in client {
            if let Some(compatible) = compatible(server_type, client_type, accept_charsets) {
                matches.push(compatible);
            }
        }
    }

    matches.sort_by(CompatibleMatch::preference_cmp);
    matches
}

/// Returns the most preferred compatible pair.
pub fn best_match(server: &[MediaType], client: &[MediaType], accept_charsets: Option<&[String]>) -> Option<CompatibleMatch> {
    resolve(server, client, accept_charsets).into_iter().next()
}

/// Matches a single server type against a single client type.
///
/// Types declared with a quality of zero are never acceptable.
pub fn compatible(server: &MediaType, client: &MediaType, accept_charsets: Option<&[String]>) -> Option<CompatibleMatch> {
    if client.quality() <= 0.0 || server.quality() <= 0.0 {
        return None;
    }

    let (type_, subtype, distance, wildcard_pair) = if server.is_wildcard() && client.is_wildcard() {
        (WILDCARD, WILDCARD, 0, true)
    } else {
        let (type_, type_distance) = resolve_type(server.type_(), client.type_())?;
        let (subtype, subtype_distance) = resolve_subtype(server.subtype(), client.subtype())?;
        (type_, subtype, type_distance + subtype_distance, false)
    };

    if !charset_satisfied(server, client, accept_charsets) {
        return None;
    }

    let mut media_type = MediaType::new(type_, subtype);
    for (name, value) in server.params_map().iter().chain(client.params_map()) {
        media_type.set_param(name, value.clone());
    }

    Some(CompatibleMatch { media_type, distance, quality: client.quality(), server_quality: server.quality(), wildcard_pair })
}

fn resolve_type<'a>(server: &'a str, client: &'a str) -> Option<(&'a str, u8)> {
    match (server, client) {
        (s, c) if s == c && s != WILDCARD => Some((s, 0)),
        (WILDCARD, c) => Some((c, 1)),
        (s, WILDCARD) => Some((s, 1)),
        _ => None,
    }
}

fn resolve_subtype<'a>(server: &'a str, client: &'a str) -> Option<(&'a str, u8)> {
    if let Some(resolved) = resolve_type(server, client) {
        return Some(resolved);
    }

    // the more specific `x+suffix` form is kept
    match (suffix_of(server), suffix_of(client)) {
        (Some(suffix), _) if suffix == client => Some((server, 1)),
        (_, Some(suffix)) if suffix == server => Some((client, 1)),
        _ => None,
    }
}

fn suffix_of(subtype: &str) -> Option<&str> {
    subtype.rsplit_once('+').map(|(_, suffix)| suffix)
}

fn charset_satisfied(server: &MediaType, client: &MediaType, accept_charsets: Option<&[String]>) -> bool {
    let Some(charset) = server.charset() else {
        return true;
    };

    match client.charset() {
        Some(client_charset) => charset.eq_ignore_ascii_case(client_charset),
        None => is_charset_accepted(charset, accept_charsets),
    }
}
