//! Conversion of handler results into HTTP responses.
//!
//! Text and byte payloads take the media type negotiated for the request when
//! the route declared a concrete one, and fall back to `text/plain` or
//! `application/octet-stream` otherwise.

use crate::RequestContext;
use crate::body::ResponseBody;
use bytes::Bytes;
use http::{HeaderValue, Response, StatusCode, header};
use micro_rest_http::protocol::CacheControl;
use std::convert::Infallible;
use tracing::warn;

pub trait Responder {
    fn response_to(self, req: &RequestContext) -> Response<ResponseBody>;
}

impl<T: Responder, E: Responder> Responder for Result<T, E> {
    fn response_to(self, req: &RequestContext) -> Response<ResponseBody> {
        match self {
            Ok(t) => t.response_to(req),
            Err(e) => e.response_to(req),
        }
    }
}

/// `None` is an empty entity.
impl<T: Responder> Responder for Option<T> {
    fn response_to(self, req: &RequestContext) -> Response<ResponseBody> {
        match self {
            Some(t) => t.response_to(req),
            None => Response::new(ResponseBody::empty()),
        }
    }
}

impl<B> Responder for Response<B>
where
    B: Into<ResponseBody>,
{
    fn response_to(self, _req: &RequestContext) -> Response<ResponseBody> {
        self.map(Into::into)
    }
}

impl<T: Responder> Responder for (StatusCode, T) {
    fn response_to(self, req: &RequestContext) -> Response<ResponseBody> {
        let (status, responder) = self;
        let mut response = responder.response_to(req);
        *response.status_mut() = status;
        response
    }
}

/// Sets `Cache-Control` on the wrapped response, an empty directive set
/// leaves the header alone.
impl<T: Responder> Responder for (CacheControl, T) {
    fn response_to(self, req: &RequestContext) -> Response<ResponseBody> {
        let (cache_control, responder) = self;
        let mut response = responder.response_to(req);
        if cache_control.is_empty() {
            return response;
        }

        match HeaderValue::from_str(&cache_control.to_string()) {
            Ok(value) => {
                response.headers_mut().insert(header::CACHE_CONTROL, value);
            }
            Err(e) => warn!(%cache_control, "cache-control is not a valid header value: {e}"),
        }
        response
    }
}

impl<T: Responder> Responder for Box<T> {
    fn response_to(self, req: &RequestContext) -> Response<ResponseBody> {
        (*self).response_to(req)
    }
}

impl Responder for () {
    fn response_to(self, _req: &RequestContext) -> Response<ResponseBody> {
        Response::new(ResponseBody::empty())
    }
}

/// A bare status is an empty entity.
impl Responder for StatusCode {
    fn response_to(self, req: &RequestContext) -> Response<ResponseBody> {
        (self, ()).response_to(req)
    }
}

impl Responder for &'static str {
    fn response_to(self, req: &RequestContext) -> Response<ResponseBody> {
        text_response(req, ResponseBody::from(self))
    }
}

impl Responder for String {
    fn response_to(self, req: &RequestContext) -> Response<ResponseBody> {
        text_response(req, ResponseBody::from(self))
    }
}

impl Responder for Bytes {
    fn response_to(self, req: &RequestContext) -> Response<ResponseBody> {
        binary_response(req, ResponseBody::from(self))
    }
}

impl Responder for Vec<u8> {
    fn response_to(self, req: &RequestContext) -> Response<ResponseBody> {
        binary_response(req, ResponseBody::from(self))
    }
}

impl Responder for Infallible {
    fn response_to(self, _req: &RequestContext) -> Response<ResponseBody> {
        match self {}
    }
}

fn text_response(req: &RequestContext, body: ResponseBody) -> Response<ResponseBody> {
    with_content_type(req, body, HeaderValue::from_static("text/plain; charset=utf-8"))
}

fn binary_response(req: &RequestContext, body: ResponseBody) -> Response<ResponseBody> {
    with_content_type(req, body, HeaderValue::from_static("application/octet-stream"))
}

fn with_content_type(req: &RequestContext, body: ResponseBody, fallback: HeaderValue) -> Response<ResponseBody> {
    let content_type = req
        .negotiated()
        .and_then(|media_type| HeaderValue::from_str(&media_type.to_string()).ok())
        .unwrap_or(fallback);

    let mut response = Response::new(body);
    response.headers_mut().reserve(8);
    response.headers_mut().insert(header::CONTENT_TYPE, content_type);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::{Router, Selection, get};
    use crate::{RequestBody, handler_fn};
    use http::{HeaderMap, Method, Version};

    async fn noop(_req: RequestContext, _body: RequestBody) {}

    fn plain_context() -> RequestContext {
        RequestContext::new(Method::GET, "/".parse().unwrap(), Version::HTTP_11, HeaderMap::new())
    }

    #[test]
    fn test_string_defaults_to_text_plain() {
        let response = "hello".to_string().response_to(&plain_context());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain; charset=utf-8");
    }

    #[test]
    fn test_string_takes_negotiated_type() {
        let router = Router::builder().route("/", get(handler_fn(noop)).produces("application/json")).build().unwrap();
        let mut ctx = plain_context();
        match router.select(&Method::GET, "/", &HeaderMap::new()).unwrap() {
            Selection::Route(route_match) => ctx.bind(route_match),
            Selection::Options(_) => panic!("unexpected options advert"),
        }

        let response = r#"{"ok":true}"#.response_to(&ctx);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_status_tuple() {
        let response = (StatusCode::CREATED, "made").response_to(&plain_context());
        assert_eq!(response.status(), StatusCode::CREATED);

        let response: Result<String, StatusCode> = Err(StatusCode::CONFLICT);
        let response = response.response_to(&plain_context());
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert!(response.body().is_known_empty());
    }

    #[test]
    fn test_cache_control() {
        let cache_control = CacheControl::parse("max-age=60, no-transform");
        let response = (StatusCode::ACCEPTED, (cache_control, "cached")).response_to(&plain_context());
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-transform, max-age=60");

        let response = (CacheControl::new(), "plain").response_to(&plain_context());
        assert!(!response.headers().contains_key(header::CACHE_CONTROL));
    }

    #[test]
    fn test_bytes_default_to_octet_stream() {
        let response = vec![1_u8, 2, 3].response_to(&plain_context());
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/octet-stream");
    }
}
