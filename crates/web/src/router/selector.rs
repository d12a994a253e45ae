//! Selection of the single registration answering a request.
//!
//! Every registration is checked in declaration order:
//!
//! 1. the path must match its pattern (routes with a method must match the
//!    whole path, sub-resource roots may leave a remainder)
//! 2. the method must be the declared one, otherwise it is a method mismatch
//! 3. a request body must be acceptable to `consumes`, otherwise the media type
//!    is unsupported
//! 4. `produces` must satisfy `Accept` and `Accept-Charset`, otherwise the
//!    request is not acceptable
//!
//! Registrations passing every check are full matches and get ranked. When
//! nothing fully matches, `OPTIONS` gets an advertisement of what the path
//! supports, `HEAD` is retried as `GET` and anything else fails with the most
//! relevant near miss: 406, then 415, then 405, then 404.

use crate::body::ResponseBody;
use crate::request::RequestContext;
use crate::responder::Responder;
use crate::router::path::MatrixPath;
use crate::router::pattern::{Binding, PatternMatch, Specificity};
use crate::router::{RouteRegistration, Router};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Response, StatusCode, header};
use micro_rest_http::media::{
    APPLICATION_OCTET_STREAM, CompatibleMatch, MediaType, WILDCARD_TYPE, best_match, compatible, parse_accept,
    parse_accept_charset, parse_content_type,
};
use std::cmp::Ordering;
use thiserror::Error;
use tracing::{debug, warn};

/// Why no registration could answer a request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("no route matches the request path")]
    NotFound,

    #[error("method not allowed, allowed: {allow:?}")]
    MethodNotAllowed { allow: Vec<Method> },

    #[error("unsupported request media type")]
    UnsupportedMediaType,

    #[error("no acceptable response media type")]
    NotAcceptable,
}

impl MatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            MatchError::NotFound => StatusCode::NOT_FOUND,
            MatchError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            MatchError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            MatchError::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
        }
    }
}

impl Responder for MatchError {
    fn response_to(self, _req: &RequestContext) -> Response<ResponseBody> {
        let mut response = Response::new(ResponseBody::empty());
        *response.status_mut() = self.status();
        if let MatchError::MethodNotAllowed { allow } = &self {
            if let Some(value) = join_methods(allow) {
                response.headers_mut().insert(header::ALLOW, value);
            }
        }
        response
    }
}

/// The synthesized answer to an `OPTIONS` request no route handles itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionsAdvert {
    allow: Vec<Method>,
    allow_headers: Vec<HeaderName>,
}

impl OptionsAdvert {
    pub fn allow(&self) -> &[Method] {
        &self.allow
    }

    /// Request headers that steer selection on this path.
    pub fn allow_headers(&self) -> &[HeaderName] {
        &self.allow_headers
    }
}

impl Responder for OptionsAdvert {
    fn response_to(self, _req: &RequestContext) -> Response<ResponseBody> {
        let mut response = Response::new(ResponseBody::empty());
        let headers = response.headers_mut();
        if let Some(value) = join_methods(&self.allow) {
            headers.insert(header::ALLOW, value);
        }
        if !self.allow_headers.is_empty() {
            let allow_headers = self.allow_headers.iter().map(HeaderName::as_str).collect::<Vec<_>>().join(", ");
            if let Ok(value) = HeaderValue::from_str(&allow_headers) {
                headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, value);
            }
        }
        response
    }
}

fn join_methods(methods: &[Method]) -> Option<HeaderValue> {
    let joined = methods.iter().map(Method::as_str).collect::<Vec<_>>().join(", ");
    HeaderValue::from_str(&joined).ok()
}

/// The registration picked for a request, with everything bound while matching.
#[derive(Debug)]
pub struct RouteMatch<'r> {
    registration: &'r RouteRegistration,
    bindings: Vec<Binding>,
    remainder: String,
    path: MatrixPath,
    negotiated: CompatibleMatch,
    ambiguous: bool,
}

impl<'r> RouteMatch<'r> {
    pub fn registration(&self) -> &'r RouteRegistration {
        self.registration
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// The unmatched part of the path, only non empty for sub-resource roots.
    pub fn remainder(&self) -> &str {
        &self.remainder
    }

    pub fn matrix_path(&self) -> &MatrixPath {
        &self.path
    }

    /// The negotiated response representation.
    pub fn negotiated(&self) -> &CompatibleMatch {
        &self.negotiated
    }

    /// True when another registration ranked the same and lost on
    /// declaration order.
    pub fn is_ambiguous(&self) -> bool {
        self.ambiguous
    }

    pub(crate) fn into_parts(self) -> (Vec<Binding>, String, MatrixPath, CompatibleMatch) {
        (self.bindings, self.remainder, self.path, self.negotiated)
    }
}

/// Outcome of a successful selection.
#[derive(Debug)]
pub enum Selection<'r> {
    Route(RouteMatch<'r>),
    Options(OptionsAdvert),
}

/// Request headers that take part in selection, parsed once.
struct Negotiation {
    /// `None` when the request has no body, `Some(None)` for an unusable `Content-Type`
    content_type: Option<Option<MediaType>>,
    accept: Vec<MediaType>,
    /// `None` without an `Accept-Charset` header
    accept_charsets: Option<Vec<String>>,
}

impl Negotiation {
    fn from_headers(headers: &HeaderMap) -> Self {
        let content_type = has_body(headers).then(|| match headers.get(header::CONTENT_TYPE) {
            None => Some((*APPLICATION_OCTET_STREAM).clone()),
            Some(value) => value.to_str().ok().and_then(|value| parse_content_type(value).ok()),
        });

        let accept = joined(headers, &header::ACCEPT).map(|accept| parse_accept(&accept)).unwrap_or_default();
        let accept = if accept.is_empty() { vec![(*WILDCARD_TYPE).clone()] } else { accept };

        let accept_charsets = joined(headers, &header::ACCEPT_CHARSET).map(|charsets| parse_accept_charset(&charsets));

        Self { content_type, accept, accept_charsets }
    }

    fn consumable(&self, registration: &RouteRegistration) -> bool {
        match &self.content_type {
            None => true,
            Some(None) => false,
            Some(Some(content_type)) => server_types(registration.consumes())
                .iter()
                .any(|consumes| compatible(consumes, content_type, None).is_some()),
        }
    }

    fn producible(&self, registration: &RouteRegistration) -> Option<CompatibleMatch> {
        best_match(server_types(registration.produces()), &self.accept, self.accept_charsets.as_deref())
    }
}

fn server_types(declared: &[MediaType]) -> &[MediaType] {
    if declared.is_empty() { std::slice::from_ref(&*WILDCARD_TYPE) } else { declared }
}

fn has_body(headers: &HeaderMap) -> bool {
    let length = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(0);
    length > 0 || headers.contains_key(header::TRANSFER_ENCODING)
}

fn joined(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    let values: Vec<_> = headers.get_all(name).iter().filter_map(|value| value.to_str().ok()).collect();
    (!values.is_empty()).then(|| values.join(","))
}

struct Candidate<'r> {
    registration: &'r RouteRegistration,
    pattern_match: PatternMatch,
    negotiated: CompatibleMatch,
    specificity: Specificity,
    param_len: usize,
}

impl Candidate<'_> {
    fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .specificity
            .cmp(&self.specificity)
            .then_with(|| self.pattern_match.bindings().len().cmp(&other.pattern_match.bindings().len()))
            .then_with(|| self.param_len.cmp(&other.param_len))
            .then_with(|| self.negotiated.preference_cmp(&other.negotiated))
            .then_with(|| self.registration.is_sub_resource_root().cmp(&other.registration.is_sub_resource_root()))
    }
}

#[derive(Default)]
struct Scan<'r> {
    candidates: Vec<Candidate<'r>>,
    path_matched: Vec<&'r RouteRegistration>,
    mismatched_methods: Vec<Method>,
    unsupported: bool,
    not_acceptable: bool,
}

impl Router {
    /// Selects the registration answering `method` on the raw request `path`.
    pub fn select(&self, method: &Method, path: &str, headers: &HeaderMap) -> Result<Selection<'_>, MatchError> {
        let path = MatrixPath::parse(path);
        let negotiation = Negotiation::from_headers(headers);

        let scan = self.scan(method, &path, &negotiation);
        if !scan.candidates.is_empty() {
            return Ok(Selection::Route(pick(method, path, scan.candidates)));
        }

        if method == Method::OPTIONS && !scan.path_matched.is_empty() {
            let advert = advertise(&scan.path_matched);
            debug!(path = path.stripped(), allow = ?advert.allow, "answer options request");
            return Ok(Selection::Options(advert));
        }

        if method == Method::HEAD {
            let scan = self.scan(&Method::GET, &path, &negotiation);
            if !scan.candidates.is_empty() {
                return Ok(Selection::Route(pick(&Method::GET, path, scan.candidates)));
            }
            return Err(failure(scan));
        }

        Err(failure(scan))
    }

    fn scan<'r>(&'r self, method: &Method, path: &MatrixPath, negotiation: &Negotiation) -> Scan<'r> {
        let mut scan = Scan::default();

        for registration in self.registrations() {
            let Some(pattern_match) = registration.pattern().match_stripped(path.stripped()) else {
                continue;
            };
            if !registration.is_sub_resource_root() && !pattern_match.is_exact() {
                continue;
            }
            scan.path_matched.push(registration);

            if let Some(declared) = registration.method() {
                if declared != method {
                    if !scan.mismatched_methods.contains(declared) {
                        scan.mismatched_methods.push(declared.clone());
                    }
                    continue;
                }
            }

            if !negotiation.consumable(registration) {
                scan.unsupported = true;
                continue;
            }

            let Some(negotiated) = negotiation.producible(registration) else {
                scan.not_acceptable = true;
                continue;
            };

            let param_len = pattern_match.bindings().iter().map(|binding| binding.value.len()).sum();
            scan.candidates.push(Candidate {
                registration,
                specificity: registration.pattern().specificity(),
                pattern_match,
                negotiated,
                param_len,
            });
        }

        scan
    }
}

fn pick<'r>(method: &Method, path: MatrixPath, mut candidates: Vec<Candidate<'r>>) -> RouteMatch<'r> {
    // stable: equally ranked candidates keep declaration order
    candidates.sort_by(Candidate::rank_cmp);

    let ambiguous = candidates.len() > 1 && candidates[0].rank_cmp(&candidates[1]) == Ordering::Equal;
    if ambiguous {
        warn!(
            method = %method,
            path = path.stripped(),
            selected = candidates[0].registration.pattern().template(),
            other = candidates[1].registration.pattern().template(),
            "ambiguous route match, the first declared route is used"
        );
    }

    let best = candidates.swap_remove(0);
    let remainder = best.pattern_match.remainder().to_string();
    RouteMatch {
        registration: best.registration,
        bindings: best.pattern_match.into_bindings(),
        remainder,
        path,
        negotiated: best.negotiated,
        ambiguous,
    }
}

fn advertise(path_matched: &[&RouteRegistration]) -> OptionsAdvert {
    let mut allow: Vec<Method> = vec![];
    for method in path_matched.iter().filter_map(|registration| registration.method()) {
        if !allow.contains(method) {
            allow.push(method.clone());
        }
    }
    if allow.contains(&Method::GET) && !allow.contains(&Method::HEAD) {
        allow.push(Method::HEAD);
    }
    if !allow.contains(&Method::OPTIONS) {
        allow.push(Method::OPTIONS);
    }

    let mut allow_headers = vec![];
    if path_matched.iter().any(|registration| !registration.consumes().is_empty()) {
        allow_headers.push(header::CONTENT_TYPE);
    }
    if path_matched.iter().any(|registration| !registration.produces().is_empty()) {
        allow_headers.push(header::ACCEPT);
    }

    OptionsAdvert { allow, allow_headers }
}

fn failure(scan: Scan<'_>) -> MatchError {
    if scan.not_acceptable {
        MatchError::NotAcceptable
    } else if scan.unsupported {
        MatchError::UnsupportedMediaType
    } else if !scan.mismatched_methods.is_empty() {
        MatchError::MethodNotAllowed { allow: scan.mismatched_methods }
    } else {
        MatchError::NotFound
    }
}
