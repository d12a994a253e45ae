//! Request information handed to interceptors, handlers and exception mappers.
//!
//! - `RequestContext`: the request head plus everything selection bound to it
//! - `PathParams`: the template variables bound from the request path

use crate::router::{Binding, MatrixPath, RouteMatch};
use http::request::Parts;
use http::{HeaderMap, Method, Uri, Version, header};
use micro_rest_http::media::{MediaType, parse_content_type};

/// The head of a request and, once a route is selected, its bound data.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    path_params: PathParams,
    matrix_path: MatrixPath,
    remaining_path: String,
    negotiated: Option<MediaType>,
}

impl RequestContext {
    pub fn new(method: Method, uri: Uri, version: Version, headers: HeaderMap) -> Self {
        let matrix_path = MatrixPath::parse(uri.path());
        Self {
            method,
            uri,
            version,
            headers,
            path_params: PathParams::empty(),
            matrix_path,
            remaining_path: String::new(),
            negotiated: None,
        }
    }

    pub fn from_parts(parts: Parts) -> Self {
        Self::new(parts.method, parts.uri, parts.version, parts.headers)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Rewrites the method, only meaningful before matching.
    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Rewrites the target, only meaningful before matching.
    pub fn set_uri(&mut self, uri: Uri) {
        self.matrix_path = MatrixPath::parse(uri.path());
        self.uri = uri;
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn path_params(&self) -> &PathParams {
        &self.path_params
    }

    /// Path left over by a sub-resource root, empty for other routes.
    pub fn remaining_path(&self) -> &str {
        &self.remaining_path
    }

    /// The response media type chosen during negotiation, when it is concrete.
    pub fn negotiated(&self) -> Option<&MediaType> {
        self.negotiated.as_ref()
    }

    /// The parsed `Content-Type`, `None` when absent or malformed.
    pub fn content_type(&self) -> Option<MediaType> {
        let value = self.headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
        parse_content_type(value).ok()
    }

    /// Matrix parameters of the segment the path parameter `name` was bound in.
    pub fn matrix_params(&self, name: &str) -> &[(String, Option<String>)] {
        self.path_params
            .get_binding(name)
            .and_then(|binding| self.matrix_path.segment_at(binding.start))
            .map(|segment| segment.params())
            .unwrap_or_default()
    }

    pub(crate) fn bind(&mut self, route_match: RouteMatch<'_>) {
        let (bindings, remainder, matrix_path, negotiated) = route_match.into_parts();
        self.path_params = PathParams::new(bindings);
        self.remaining_path = remainder;
        self.matrix_path = matrix_path;
        self.negotiated = Some(negotiated.into_media_type()).filter(MediaType::is_concrete);
    }
}

/// Template variables bound from the request path, in template order.
///
/// A name used twice in a template is bound twice; [`get`](PathParams::get)
/// returns the last binding.
#[derive(Debug, Clone, Default)]
pub struct PathParams {
    bindings: Vec<Binding>,
}

impl PathParams {
    fn new(bindings: Vec<Binding>) -> Self {
        Self { bindings }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// The raw, still percent encoded, value of `name`.
    pub fn get(&self, name: impl AsRef<str>) -> Option<&str> {
        self.get_binding(name.as_ref()).map(|binding| binding.value.as_str())
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.bindings.iter().filter(move |binding| binding.name == name).map(|binding| binding.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().map(|binding| (binding.name.as_str(), binding.value.as_str()))
    }

    fn get_binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.iter().rev().find(|binding| binding.name == name)
    }
}
