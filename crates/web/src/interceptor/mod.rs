//! Request filters around route selection and invocation.
//!
//! `pre_match` runs before a route is selected and may still rewrite the
//! method or target. `on_request` runs once a route is bound, `on_response`
//! sees every response, including the ones produced by an aborting filter or a
//! failed match. Returning a response from `pre_match` or `on_request` aborts
//! the request with that response.

use crate::{RequestBody, RequestContext, ResponseBody};
use async_trait::async_trait;
use http::Response;

#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn pre_match(&self, _req: &mut RequestContext) -> Option<Response<ResponseBody>> {
        None
    }

    async fn on_request(&self, _req: &mut RequestContext, _body: &mut RequestBody) -> Option<Response<ResponseBody>> {
        None
    }

    async fn on_response(&self, _req: &RequestContext, _resp: &mut Response<ResponseBody>) {}
}

pub struct Interceptors {
    inner: Vec<Box<dyn Interceptor>>,
}

#[async_trait]
impl Interceptor for Interceptors {
    async fn pre_match(&self, req: &mut RequestContext) -> Option<Response<ResponseBody>> {
        for interceptor in &self.inner {
            if let Some(response) = interceptor.pre_match(req).await {
                return Some(response);
            }
        }
        None
    }

    async fn on_request(&self, req: &mut RequestContext, body: &mut RequestBody) -> Option<Response<ResponseBody>> {
        for interceptor in &self.inner {
            if let Some(response) = interceptor.on_request(req, body).await {
                return Some(response);
            }
        }
        None
    }

    async fn on_response(&self, req: &RequestContext, resp: &mut Response<ResponseBody>) {
        for interceptor in &self.inner {
            interceptor.on_response(req, resp).await;
        }
    }
}

impl Interceptors {
    pub fn builder() -> InterceptorsBuilder {
        InterceptorsBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for Interceptors {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl std::fmt::Debug for Interceptors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interceptors").field("len", &self.inner.len()).finish()
    }
}

pub struct InterceptorsBuilder {
    inner: Vec<Box<dyn Interceptor>>,
}

impl InterceptorsBuilder {
    fn new() -> Self {
        Self { inner: vec![] }
    }

    pub fn add_last<I: Interceptor + 'static>(mut self, interceptor: I) -> Self {
        self.inner.push(Box::new(interceptor));
        self
    }

    pub fn add_first<I: Interceptor + 'static>(mut self, interceptor: I) -> Self {
        self.inner.insert(0, Box::new(interceptor));
        self
    }

    pub fn build(self) -> Interceptors {
        Interceptors { inner: self.inner }
    }
}

impl std::fmt::Debug for InterceptorsBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorsBuilder").field("len", &self.inner.len()).finish()
    }
}
