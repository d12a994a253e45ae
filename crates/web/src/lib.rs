//! Request dispatch and content negotiation on top of [`micro_rest_http`].
//!
//! A [`Router`] is built once from route registrations, each made of a path
//! template, an optional method, the media types it consumes and produces
//! and a [`RequestHandler`]. A [`RequestPipeline`] then takes one request at a
//! time through filtering, route selection, invocation and exception mapping,
//! and writes the response with the adaptive writer.
//!
//! ```
//! use http::{Method, Request};
//! use http_body_util::Empty;
//! use bytes::Bytes;
//! use micro_rest::router::{get, Router};
//! use micro_rest::{handler_fn, RequestBody, RequestContext, RequestPipeline};
//!
//! async fn user(req: RequestContext, _body: RequestBody) -> String {
//!     format!("user {}", req.path_params().get("id").unwrap_or_default())
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let router = Router::builder().route("/users/{id: [0-9]+}", get(handler_fn(user))).build().unwrap();
//! let pipeline = RequestPipeline::builder().router(router).build().unwrap();
//!
//! let request = Request::builder().method(Method::GET).uri("/users/42").body(Empty::<Bytes>::new()).unwrap();
//! let mut out = Vec::new();
//! pipeline.handle(request, &mut out).await.unwrap();
//! assert!(out.ends_with(b"\r\n\r\nuser 42"));
//! # });
//! ```

mod body;
mod handler;
mod request;
mod responder;

pub mod exception;
pub mod interceptor;
pub mod pipeline;
pub mod router;

pub use body::BoxError;
pub use body::RequestBody;
pub use body::ResponseBody;
pub use exception::ExceptionMapper;
pub use handler::FnHandler;
pub use handler::RequestHandler;
pub use handler::handler_fn;
pub use pipeline::RequestPipeline;
pub use request::PathParams;
pub use request::RequestContext;
pub use responder::Responder;
pub use router::Router;
