//! Route table: registrations built up front and shared read-only afterwards.
//!
//! ```
//! use micro_rest::router::{get, locator, post, Router};
//! use micro_rest::{handler_fn, RequestBody, RequestContext};
//!
//! async fn show(_req: RequestContext, _body: RequestBody) -> String {
//!     "user".to_string()
//! }
//!
//! let router = Router::builder()
//!     .route("/users/{id}", get(handler_fn(show)).produces("application/json, text/plain;qs=0.5"))
//!     .route("/users", post(handler_fn(show)).consumes("application/json"))
//!     .resource("/admin", |admin| admin.route("/{section}", locator(handler_fn(show))))
//!     .build()
//!     .unwrap();
//! assert_eq!(router.registrations().len(), 3);
//! ```

pub mod path;
pub mod pattern;
mod selector;

pub use path::MatrixPath;
pub use pattern::{Binding, PatternMatch, RoutePattern, Specificity, TemplateError};
pub use selector::{MatchError, OptionsAdvert, RouteMatch, Selection};

use crate::handler::RequestHandler;
use http::Method;
use micro_rest_http::media::{MediaType, parse_server_types};
use micro_rest_http::protocol::MediaTypeError;
use micro_rest_http::writer::WriterOverrides;
use pattern::join_templates;
use thiserror::Error;
use tracing::error;

/// Errors raised while building a [`Router`].
#[derive(Error, Debug)]
pub enum RouteError {
    #[error("invalid template {template:?}: {source}")]
    InvalidTemplate {
        template: String,
        #[source]
        source: TemplateError,
    },

    #[error("invalid media types {media_types:?} on route {template:?}: {source}")]
    InvalidMediaType {
        template: String,
        media_types: String,
        #[source]
        source: MediaTypeError,
    },
}

/// A route with everything needed to select and invoke it.
pub struct RouteRegistration {
    method: Option<Method>,
    pattern: RoutePattern,
    consumes: Vec<MediaType>,
    produces: Vec<MediaType>,
    writer_overrides: WriterOverrides,
    handler: Box<dyn RequestHandler>,
    locator: usize,
}

impl RouteRegistration {
    /// The method this route answers, `None` for sub-resource roots which
    /// answer every method.
    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    /// Declared request media types, empty meaning anything.
    pub fn consumes(&self) -> &[MediaType] {
        &self.consumes
    }

    /// Declared response media types, empty meaning anything.
    pub fn produces(&self) -> &[MediaType] {
        &self.produces
    }

    pub fn writer_overrides(&self) -> &WriterOverrides {
        &self.writer_overrides
    }

    pub fn handler(&self) -> &dyn RequestHandler {
        self.handler.as_ref()
    }

    /// Position in declaration order.
    pub fn locator(&self) -> usize {
        self.locator
    }

    pub fn is_sub_resource_root(&self) -> bool {
        self.method.is_none()
    }
}

impl std::fmt::Debug for RouteRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteRegistration")
            .field("method", &self.method)
            .field("pattern", &self.pattern.template())
            .field("consumes", &self.consumes)
            .field("produces", &self.produces)
            .field("locator", &self.locator)
            .finish_non_exhaustive()
    }
}

/// The immutable route table.
#[derive(Debug)]
pub struct Router {
    registrations: Vec<RouteRegistration>,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Registrations in declaration order.
    pub fn registrations(&self) -> &[RouteRegistration] {
        &self.registrations
    }
}

/// Collects routes, compiling them in [`build`](RouterBuilder::build).
pub struct RouterBuilder {
    items: Vec<(String, RouteItemBuilder)>,
}

impl RouterBuilder {
    fn new() -> Self {
        Self { items: vec![] }
    }

    pub fn route(mut self, template: impl Into<String>, item_builder: RouteItemBuilder) -> Self {
        self.items.push((template.into(), item_builder));
        self
    }

    /// Registers the routes added by `f` under a shared template prefix.
    pub fn resource<F>(mut self, prefix: &str, f: F) -> Self
    where
        F: FnOnce(RouterBuilder) -> RouterBuilder,
    {
        let nested = f(RouterBuilder::new());
        for (template, item_builder) in nested.items {
            self.items.push((join_templates(prefix, &template), item_builder));
        }
        self
    }

    pub fn build(self) -> Result<Router, RouteError> {
        let mut registrations = Vec::with_capacity(self.items.len());

        for (locator, (template, item_builder)) in self.items.into_iter().enumerate() {
            let registration = item_builder.build(&template, locator).inspect_err(|e| {
                error!(template = %template, cause = %e, "failed to register route");
            })?;
            registrations.push(registration);
        }

        Ok(Router { registrations })
    }
}

impl std::fmt::Debug for RouterBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterBuilder").field("routes", &self.items.len()).finish()
    }
}

macro_rules! method_route {
    ($method:ident, $upper_case_method:ident) => {
        #[doc = concat!("Starts a route answering HTTP ", stringify!($upper_case_method), " requests.")]
        pub fn $method<H: RequestHandler + 'static>(handler: H) -> RouteItemBuilder {
            RouteItemBuilder::new(Some(Method::$upper_case_method), handler)
        }
    };
}

method_route!(get, GET);
method_route!(post, POST);
method_route!(put, PUT);
method_route!(delete, DELETE);
method_route!(head, HEAD);
method_route!(options, OPTIONS);
method_route!(patch, PATCH);
method_route!(trace, TRACE);

/// Starts a sub-resource root: matches any method and leaves the rest of the
/// path to the handler.
pub fn locator<H: RequestHandler + 'static>(handler: H) -> RouteItemBuilder {
    RouteItemBuilder::new(None, handler)
}

/// Starts a route answering an arbitrary method.
pub fn method<H: RequestHandler + 'static>(method: Method, handler: H) -> RouteItemBuilder {
    RouteItemBuilder::new(Some(method), handler)
}

pub struct RouteItemBuilder {
    method: Option<Method>,
    consumes: Option<String>,
    produces: Option<String>,
    writer_overrides: WriterOverrides,
    handler: Box<dyn RequestHandler>,
}

impl RouteItemBuilder {
    fn new<H: RequestHandler + 'static>(method: Option<Method>, handler: H) -> Self {
        Self { method, consumes: None, produces: None, writer_overrides: WriterOverrides::default(), handler: Box::new(handler) }
    }

    /// Comma separated request media types, `qs` allowed.
    pub fn consumes(mut self, media_types: impl Into<String>) -> Self {
        self.consumes = Some(media_types.into());
        self
    }

    /// Comma separated response media types, `qs` allowed.
    pub fn produces(mut self, media_types: impl Into<String>) -> Self {
        self.produces = Some(media_types.into());
        self
    }

    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.writer_overrides.buffer_size = Some(buffer_size);
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.writer_overrides.chunk_size = Some(chunk_size);
        self
    }

    fn build(self, template: &str, locator: usize) -> Result<RouteRegistration, RouteError> {
        let pattern = RoutePattern::compile(template)
            .map_err(|source| RouteError::InvalidTemplate { template: template.to_string(), source })?;
        let parse = |media_types: Option<String>| match media_types {
            None => Ok(vec![]),
            Some(media_types) => parse_server_types(&media_types).map_err(|source| RouteError::InvalidMediaType {
                template: template.to_string(),
                media_types,
                source,
            }),
        };

        Ok(RouteRegistration {
            method: self.method,
            pattern,
            consumes: parse(self.consumes)?,
            produces: parse(self.produces)?,
            writer_overrides: self.writer_overrides,
            handler: self.handler,
            locator,
        })
    }
}

impl std::fmt::Debug for RouteItemBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteItemBuilder")
            .field("method", &self.method)
            .field("consumes", &self.consumes)
            .field("produces", &self.produces)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RequestBody, RequestContext, handler_fn};

    async fn noop(_req: RequestContext, _body: RequestBody) {}

    #[test]
    fn test_build_in_declaration_order() {
        let router = Router::builder()
            .route("/a", get(handler_fn(noop)))
            .route("/b", post(handler_fn(noop)).consumes("application/json").produces("text/html;qs=0.5, text/plain"))
            .route("/c", locator(handler_fn(noop)))
            .build()
            .unwrap();

        let registrations = router.registrations();
        assert_eq!(registrations.len(), 3);
        assert_eq!(registrations[0].method(), Some(&Method::GET));
        assert_eq!(registrations[1].locator(), 1);
        assert_eq!(registrations[1].consumes()[0].essence(), "application/json");
        assert_eq!(registrations[1].produces()[0].essence(), "text/plain");
        assert!(registrations[2].is_sub_resource_root());
    }

    #[test]
    fn test_resource_prefix() {
        let router = Router::builder()
            .resource("/api/", |api| api.route("/users/{id}", get(handler_fn(noop))).route("", get(handler_fn(noop))))
            .build()
            .unwrap();
        assert_eq!(router.registrations()[0].pattern().template(), "/api/users/{id}");
        assert_eq!(router.registrations()[1].pattern().template(), "/api/");
    }

    #[test]
    fn test_invalid_template() {
        let result = Router::builder().route("/{id", get(handler_fn(noop))).build();
        assert!(matches!(result, Err(RouteError::InvalidTemplate { .. })));
    }

    #[test]
    fn test_q_on_server_type() {
        let result = Router::builder().route("/", get(handler_fn(noop)).produces("text/html;q=0.5")).build();
        assert!(matches!(
            result,
            Err(RouteError::InvalidMediaType { source: MediaTypeError::ClientQualityOnServerType { .. }, .. })
        ));
    }

    #[test]
    fn test_writer_overrides() {
        let router = Router::builder().route("/", get(handler_fn(noop)).buffer_size(16).chunk_size(8)).build().unwrap();
        let overrides = router.registrations()[0].writer_overrides();
        assert_eq!(overrides.buffer_size, Some(16));
        assert_eq!(overrides.chunk_size, Some(8));
    }
}
