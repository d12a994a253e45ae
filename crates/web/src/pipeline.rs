//! The request pipeline: one request, from its head to the bytes on the sink.
//!
//! ```text
//! pre_match ─► match ─► on_request ─► invoke ─► on_response ─► write
//!     │          │           │           │
//!     └──────────┴───────────┴─ abort ───┴──► on_response ─► write
//! ```
//!
//! Every stage runs at most once per request. Match failures become their
//! status response, handler failures go through the exception mappers and end
//! as a `500` when none of them claims the error.

use crate::body::{BoxError, RequestBody, ResponseBody};
use crate::exception::{ExceptionMapper, ExceptionMappers};
use crate::interceptor::{Interceptor, Interceptors};
use crate::request::RequestContext;
use crate::responder::Responder;
use crate::router::{RouteRegistration, Router, Selection};
use bytes::Bytes;
use http::{HeaderValue, Method, Request, Response, StatusCode, header};
use http_body::Body;
use micro_rest_http::protocol::{ConfigError, SendError};
use micro_rest_http::writer::{AdaptiveWriter, WriterConfig, WriterOverrides};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncWrite;
use tracing::{debug, error};

/// Steps of the pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    PreMatch,
    Match,
    RequestFilter,
    Invoke,
    ResponseFilter,
    Write,
}

impl Stage {
    const COUNT: usize = 6;
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("pipeline stage {stage:?} entered twice")]
    StageReentered { stage: Stage },

    #[error("invalid writer config: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("failed to send response: {source}")]
    Send {
        #[from]
        source: SendError,
    },
}

#[derive(Error, Debug)]
pub enum PipelineBuildError {
    #[error("router must be set")]
    MissingRouter,
}

/// One-shot flags, one per [`Stage`].
#[derive(Debug, Default)]
struct StageGuard {
    entered: [bool; Stage::COUNT],
}

impl StageGuard {
    fn enter(&mut self, stage: Stage) -> Result<(), PipelineError> {
        let entered = &mut self.entered[stage as usize];
        if *entered {
            error!(stage = ?stage, "pipeline stage re-entered");
            return Err(PipelineError::StageReentered { stage });
        }
        *entered = true;
        Ok(())
    }
}

pub struct RequestPipelineBuilder {
    router: Option<Arc<Router>>,
    interceptors: Interceptors,
    exception_mappers: ExceptionMappers,
    writer_config: WriterConfig,
}

impl RequestPipelineBuilder {
    fn new() -> Self {
        Self {
            router: None,
            interceptors: Interceptors::default(),
            exception_mappers: ExceptionMappers::new(),
            writer_config: WriterConfig::default(),
        }
    }

    pub fn router(self, router: Router) -> Self {
        self.shared_router(Arc::new(router))
    }

    /// Uses a route table shared with other pipelines.
    pub fn shared_router(mut self, router: Arc<Router>) -> Self {
        self.router = Some(router);
        self
    }

    pub fn interceptors(mut self, interceptors: Interceptors) -> Self {
        self.interceptors = interceptors;
        self
    }

    /// Appends a mapper, mappers are asked in the order they were added.
    pub fn exception_mapper<M: ExceptionMapper + 'static>(mut self, mapper: M) -> Self {
        self.exception_mappers.add(mapper);
        self
    }

    pub fn writer_config(mut self, writer_config: WriterConfig) -> Self {
        self.writer_config = writer_config;
        self
    }

    pub fn build(self) -> Result<RequestPipeline, PipelineBuildError> {
        let router = self.router.ok_or(PipelineBuildError::MissingRouter)?;
        Ok(RequestPipeline {
            router,
            interceptors: self.interceptors,
            exception_mappers: self.exception_mappers,
            writer_config: self.writer_config,
        })
    }
}

impl std::fmt::Debug for RequestPipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPipelineBuilder")
            .field("router", &self.router.is_some())
            .field("interceptors", &self.interceptors)
            .field("writer_config", &self.writer_config)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct RequestPipeline {
    router: Arc<Router>,
    interceptors: Interceptors,
    exception_mappers: ExceptionMappers,
    writer_config: WriterConfig,
}

impl RequestPipeline {
    pub fn builder() -> RequestPipelineBuilder {
        RequestPipelineBuilder::new()
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Processes `request` and writes the response to `sink`.
    ///
    /// Both the request body and the sink are dropped before returning, on
    /// success and on error alike.
    ///
    /// # Errors
    ///
    /// Returns an error when writing to `sink` fails, when the route's writer
    /// overrides are invalid or when a stage is re-entered.
    pub async fn handle<B, W>(&self, request: Request<B>, sink: W) -> Result<(), PipelineError>
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
        W: AsyncWrite + Unpin,
    {
        let mut guard = StageGuard::default();
        let (parts, body) = request.into_parts();
        let mut req = RequestContext::from_parts(parts);

        let (mut response, overrides) = self.dispatch(&mut guard, &mut req, RequestBody::new(body)).await?;

        guard.enter(Stage::ResponseFilter)?;
        self.interceptors.on_response(&req, &mut response).await;

        guard.enter(Stage::Write)?;
        let config = self.writer_config.with_overrides(&overrides)?;
        let head_only = req.method() == Method::HEAD;
        let mut writer = AdaptiveWriter::new(sink, config);
        writer.send(response, head_only).await?;
        Ok(())
    }

    async fn dispatch(
        &self,
        guard: &mut StageGuard,
        req: &mut RequestContext,
        mut body: RequestBody,
    ) -> Result<(Response<ResponseBody>, WriterOverrides), PipelineError> {
        guard.enter(Stage::PreMatch)?;
        if let Some(response) = self.interceptors.pre_match(req).await {
            debug!(method = %req.method(), path = req.uri().path(), "request aborted before matching");
            return Ok((response, WriterOverrides::default()));
        }

        guard.enter(Stage::Match)?;
        let selection = self.router.select(req.method(), req.uri().path(), req.headers());
        let route_match = match selection {
            Ok(Selection::Route(route_match)) => route_match,
            Ok(Selection::Options(advert)) => return Ok((advert.response_to(req), WriterOverrides::default())),
            Err(e) => {
                debug!(method = %req.method(), path = req.uri().path(), status = %e.status(), "no route selected");
                return Ok((e.response_to(req), WriterOverrides::default()));
            }
        };
        let registration = route_match.registration();
        req.bind(route_match);
        let overrides = *registration.writer_overrides();

        guard.enter(Stage::RequestFilter)?;
        if let Some(response) = self.interceptors.on_request(req, &mut body).await {
            debug!(method = %req.method(), path = req.uri().path(), "request aborted by filter");
            return Ok((response, overrides));
        }

        guard.enter(Stage::Invoke)?;
        let response = match registration.handler().invoke(req, body).await {
            Ok(response) => complete(response, registration, req),
            Err(e) => self.map_exception(&e, req),
        };

        Ok((response, overrides))
    }

    fn map_exception(&self, e: &BoxError, req: &RequestContext) -> Response<ResponseBody> {
        if let Some(response) = self.exception_mappers.map(e.as_ref(), req) {
            return response;
        }

        error!(method = %req.method(), path = req.uri().path(), cause = %e, "handler failed");
        StatusCode::INTERNAL_SERVER_ERROR.response_to(req)
    }
}

/// Applies the defaults a handler response gets from its route.
fn complete(
    mut response: Response<ResponseBody>,
    registration: &RouteRegistration,
    req: &RequestContext,
) -> Response<ResponseBody> {
    let empty = response.body().is_known_empty();

    if empty && response.status() == StatusCode::OK && registration.produces().is_empty() {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }

    if !empty && !response.headers().contains_key(header::CONTENT_TYPE) {
        if let Some(value) = req.negotiated().and_then(|media_type| HeaderValue::from_str(&media_type.to_string()).ok()) {
            response.headers_mut().insert(header::CONTENT_TYPE, value);
        }
    }

    response
}
