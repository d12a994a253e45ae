//! HTTP response header handling.
//!
//! A response head is the status line and headers of a response before any
//! body byte is produced. The adaptive writer holds on to it until it knows
//! how the body will be framed.

use http::{Response, StatusCode, header};

/// Type alias for HTTP response headers.
///
/// This type represents the header portion of an HTTP response, using
/// `http::Response<()>` with an empty body placeholder.
pub type ResponseHead = Response<()>;

/// Returns true when the status forbids a message body (1xx, 204, 304).
#[inline]
pub fn is_bodiless_status(status: StatusCode) -> bool {
    status.is_informational() || status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED
}

/// Reads an explicit, well formed `Content-Length` declared on the head.
pub fn declared_content_length(head: &ResponseHead) -> Option<u64> {
    head.headers().get(header::CONTENT_LENGTH)?.to_str().ok()?.trim().parse().ok()
}

/// Returns true if the head explicitly asks for chunked transfer encoding.
pub fn declares_chunked(head: &ResponseHead) -> bool {
    head.headers()
        .get_all(header::TRANSFER_ENCODING)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_content_length() {
        let head = Response::builder().header(header::CONTENT_LENGTH, " 42 ").body(()).unwrap();
        assert_eq!(declared_content_length(&head), Some(42));

        let head = Response::builder().header(header::CONTENT_LENGTH, "abc").body(()).unwrap();
        assert_eq!(declared_content_length(&head), None);
    }

    #[test]
    fn test_declares_chunked() {
        let head = Response::builder().header(header::TRANSFER_ENCODING, "gzip, Chunked").body(()).unwrap();
        assert!(declares_chunked(&head));

        let head = Response::builder().body(()).unwrap();
        assert!(!declares_chunked(&head));
    }

    #[test]
    fn test_bodiless_status() {
        assert!(is_bodiless_status(StatusCode::NO_CONTENT));
        assert!(is_bodiless_status(StatusCode::NOT_MODIFIED));
        assert!(is_bodiless_status(StatusCode::CONTINUE));
        assert!(!is_bodiless_status(StatusCode::OK));
    }
}
