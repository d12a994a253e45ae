//! Mapping of handler failures into responses.
//!
//! Mappers are asked in registration order; the first one returning a
//! response wins. A failure no mapper claims becomes a `500`.

use crate::RequestContext;
use crate::body::ResponseBody;
use http::Response;
use std::error::Error;

#[cfg_attr(test, mockall::automock)]
pub trait ExceptionMapper: Send + Sync {
    fn map(&self, error: &(dyn Error + Send + Sync + 'static), req: &RequestContext) -> Option<Response<ResponseBody>>;
}

pub struct FnMapper<F> {
    f: F,
}

/// Builds an [`ExceptionMapper`] out of a closure.
pub fn mapper_fn<F>(f: F) -> FnMapper<F>
where
    F: Fn(&(dyn Error + Send + Sync + 'static), &RequestContext) -> Option<Response<ResponseBody>> + Send + Sync,
{
    FnMapper { f }
}

impl<F> ExceptionMapper for FnMapper<F>
where
    F: Fn(&(dyn Error + Send + Sync + 'static), &RequestContext) -> Option<Response<ResponseBody>> + Send + Sync,
{
    fn map(&self, error: &(dyn Error + Send + Sync + 'static), req: &RequestContext) -> Option<Response<ResponseBody>> {
        (self.f)(error, req)
    }
}

impl<F> std::fmt::Debug for FnMapper<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnMapper").finish_non_exhaustive()
    }
}

/// Mappers in the order they were registered.
#[derive(Default)]
pub struct ExceptionMappers {
    inner: Vec<Box<dyn ExceptionMapper>>,
}

impl ExceptionMappers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<M: ExceptionMapper + 'static>(&mut self, mapper: M) {
        self.inner.push(Box::new(mapper));
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// The response of the first mapper claiming `error`.
    pub fn map(&self, error: &(dyn Error + Send + Sync + 'static), req: &RequestContext) -> Option<Response<ResponseBody>> {
        self.inner.iter().find_map(|mapper| mapper.map(error, req))
    }
}

impl std::fmt::Debug for ExceptionMappers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExceptionMappers").field("len", &self.inner.len()).finish()
    }
}
