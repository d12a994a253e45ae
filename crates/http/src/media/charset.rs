use crate::media::QualityKey;
use crate::media::quality::scan_quality;
use crate::utils::{is_token_char, split_unquoted};

/// Parses an `Accept-Charset` header into lower-cased charset names, most
/// preferred first.
///
/// Entries with `q=0` are dropped, `*` is kept as is. Malformed entries are
/// skipped.
pub fn parse_accept_charset(header: &str) -> Vec<String> {
    let mut charsets = vec![];
    for (_, entry) in split_unquoted(header, ',') {
        let name_end = entry.find(';').unwrap_or(entry.len());
        let name = entry[..name_end].trim();
        if name.is_empty() || !name.chars().all(is_token_char) {
            continue;
        }

        let (quality, _) = scan_quality(entry, name_end, QualityKey::Q);
        if quality > 0.0 {
            charsets.push((name.to_ascii_lowercase(), quality));
        }
    }

    charsets.sort_by(|a, b| b.1.total_cmp(&a.1));
    charsets.into_iter().map(|(name, _)| name).collect()
}

/// Checks `charset` against an accepted list.
///
/// `None` stands for a request without `Accept-Charset` and takes anything.
/// An empty list, such as the one a header refusing every entry parses to,
/// takes nothing.
pub fn is_charset_accepted(charset: &str, accepted: Option<&[String]>) -> bool {
    accepted.is_none_or(|accepted| {
        accepted.iter().any(|accepted| accepted == "*" || accepted.eq_ignore_ascii_case(charset))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accept_charset() {
        let charsets = parse_accept_charset("iso-8859-5;q=0.5, UTF-8, unicode-1-1;q=0.8, latin1;q=0");
        assert_eq!(charsets, vec!["utf-8", "unicode-1-1", "iso-8859-5"]);
    }

    #[test]
    fn test_lenient_quality() {
        let charsets = parse_accept_charset("a;q= .2 ,b;q =0.9; ,c");
        assert_eq!(charsets, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_is_charset_accepted() {
        let accepted = vec!["utf-8".to_string()];
        assert!(is_charset_accepted("UTF-8", Some(accepted.as_slice())));
        assert!(!is_charset_accepted("latin1", Some(accepted.as_slice())));
        assert!(is_charset_accepted("latin1", None));
        assert!(is_charset_accepted("latin1", Some(&["*".to_string()][..])));
    }

    #[test]
    fn test_refused_charset_is_not_accepted() {
        let refused = parse_accept_charset("utf-8;q=0");
        assert!(refused.is_empty());
        assert!(!is_charset_accepted("utf-8", Some(refused.as_slice())));
    }
}
