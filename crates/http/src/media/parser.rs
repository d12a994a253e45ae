//! Media type header grammar.
//!
//! ```text
//! media-range = type "/" subtype *( OWS ";" OWS token "=" ( token / quoted-string ) )
//! header      = media-range *( OWS "," OWS media-range )
//! ```
//!
//! Parsing is done per comma separated entry. A malformed entry is reported
//! and skipped, the remaining entries are still used. A bare `type` without
//! `/` and without parameters is read as `type/*`.

use crate::media::quality::parse_quality_value;
use crate::media::{MediaType, QualityKey, WILDCARD};
use crate::protocol::MediaTypeError;
use crate::utils::{ensure, is_token_char, split_unquoted, unquote};
use tracing::debug;

/// Parses a client header (`Accept`), sorted by quality descending.
///
/// Entries with equal quality keep their header order.
pub fn parse_accept(header: &str) -> Vec<MediaType> {
    parse_lenient(header, QualityKey::Q)
}

/// Parses a single `Content-Type` value.
pub fn parse_content_type(header: &str) -> Result<MediaType, MediaTypeError> {
    parse_entry(header, QualityKey::Q)
}

/// Parses server declared media types (`consumes` / `produces`).
///
/// Registration is strict: the first malformed entry fails the whole list,
/// and a `q` parameter (instead of `qs`) is rejected.
pub fn parse_server_types(header: &str) -> Result<Vec<MediaType>, MediaTypeError> {
    let mut media_types = vec![];
    for (_, entry) in split_unquoted(header, ',') {
        if entry.trim().is_empty() {
            continue;
        }
        media_types.push(parse_entry(entry, QualityKey::Qs)?);
    }
    sort_by_quality(&mut media_types);
    Ok(media_types)
}

/// Parses a comma separated list, skipping malformed entries.
pub fn parse_lenient(header: &str, key: QualityKey) -> Vec<MediaType> {
    let mut media_types = vec![];
    for (offset, entry) in split_unquoted(header, ',') {
        if entry.trim().is_empty() {
            continue;
        }
        match parse_entry(entry, key) {
            Ok(media_type) => media_types.push(media_type),
            Err(e) => debug!(entry = entry, offset, cause = %e, "skip malformed media type entry"),
        }
    }
    sort_by_quality(&mut media_types);
    media_types
}

fn sort_by_quality(media_types: &mut [MediaType]) {
    // stable, so equal qualities keep the declared order
    media_types.sort_by(|a, b| b.quality().total_cmp(&a.quality()));
}

/// Parses one media range, `entry` must not contain an unquoted comma.
pub fn parse_entry(entry: &str, key: QualityKey) -> Result<MediaType, MediaTypeError> {
    let mut segments = split_unquoted(entry, ';');
    let (_, essence) = segments.next().ok_or(MediaTypeError::Empty)?;
    let has_params = entry.len() > essence.len();

    let essence_offset = essence.len() - essence.trim_start().len();
    let essence = essence.trim();
    ensure!(!essence.is_empty(), MediaTypeError::Empty);

    let mut media_type = match essence.split_once('/') {
        Some((type_, subtype)) => {
            let type_ = type_.trim_end();
            let subtype = subtype.trim_start();
            check_token(type_, essence_offset)?;
            ensure!(!subtype.is_empty(), MediaTypeError::MissingSubtype { offset: essence_offset + essence.len() });
            check_token(subtype, essence_offset + essence.len() - subtype.len())?;
            MediaType::new(type_, subtype)
        }
        None => {
            ensure!(!has_params, MediaTypeError::MissingSubtype { offset: essence_offset + essence.len() });
            check_token(essence, essence_offset)?;
            MediaType::new(essence, WILDCARD)
        }
    };

    for (offset, segment) in segments {
        if segment.trim().is_empty() {
            continue;
        }

        let Some((name, value)) = segment.split_once('=') else {
            let trimmed = segment.trim();
            let found = trimmed.chars().find(|c| !is_token_char(*c)).unwrap_or(';');
            return Err(MediaTypeError::unexpected(found, offset + segment.len()));
        };
        let name = name.trim();
        let value = value.trim();
        check_token(name, offset)?;

        if key.matches(name) {
            // a malformed quality keeps the previous one (default 1.0)
            if let Some(quality) = parse_quality_value(value) {
                media_type.set_quality(quality);
            }
            continue;
        }
        if key == QualityKey::Qs && QualityKey::Q.matches(name) {
            return Err(MediaTypeError::client_quality_on_server_type(essence));
        }
        if key == QualityKey::Q && QualityKey::Qs.matches(name) {
            // server quality has no meaning on the client side
            continue;
        }

        let value_offset = offset + segment.find('=').unwrap_or(0) + 1;
        if value.starts_with('"') {
            ensure!(value.len() >= 2 && value.ends_with('"'), MediaTypeError::UnterminatedQuote { offset: value_offset });
            media_type.set_param(name, unquote(value).into_owned());
        } else {
            check_token(value, value_offset)?;
            media_type.set_param(name, value);
        }
    }

    Ok(media_type)
}

fn check_token(token: &str, offset: usize) -> Result<(), MediaTypeError> {
    ensure!(!token.is_empty(), MediaTypeError::Empty);
    match token.char_indices().find(|(_, c)| !is_token_char(*c)) {
        Some((i, c)) => Err(MediaTypeError::unexpected(c, offset + i)),
        None => Ok(()),
    }
}
