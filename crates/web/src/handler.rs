use crate::body::{BoxError, ResponseBody};
use crate::responder::Responder;
use crate::{RequestBody, RequestContext};
use async_trait::async_trait;
use http::Response;

#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn invoke(&self, req: &RequestContext, req_body: RequestBody) -> Result<Response<ResponseBody>, BoxError>;
}

/// Adapts an async fn taking the request context and body into a [`RequestHandler`].
pub struct FnHandler<F> {
    f: F,
}

pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(RequestContext, RequestBody) -> Fut + Send + Sync,
    Fut: Future + Send + 'static,
    Fut::Output: Responder,
{
    FnHandler { f }
}

impl<F> std::fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut> RequestHandler for FnHandler<F>
where
    F: Fn(RequestContext, RequestBody) -> Fut + Send + Sync,
    Fut: Future + Send + 'static,
    Fut::Output: Responder,
{
    async fn invoke(&self, req: &RequestContext, req_body: RequestBody) -> Result<Response<ResponseBody>, BoxError> {
        let responder = (self.f)(req.clone(), req_body).await;
        Ok(responder.response_to(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{HeaderMap, Method, StatusCode, Version};
    use http_body_util::{BodyExt, Full};

    fn assert_is_handler<T: RequestHandler>(_handler: &T) {
        // no op
    }

    fn context() -> RequestContext {
        RequestContext::new(Method::POST, "/echo".parse().unwrap(), Version::HTTP_11, HeaderMap::new())
    }

    #[test]
    fn assert_fn_is_handler() {
        async fn unit(_req: RequestContext, _body: RequestBody) {}
        async fn fallible(_req: RequestContext, _body: RequestBody) -> Result<String, StatusCode> {
            Err(StatusCode::BAD_REQUEST)
        }

        assert_is_handler(&handler_fn(unit));
        assert_is_handler(&handler_fn(fallible));
    }

    #[tokio::test]
    async fn test_invoke() {
        async fn echo(_req: RequestContext, body: RequestBody) -> Result<Vec<u8>, StatusCode> {
            let bytes = body.bytes().await.ok().ok_or(StatusCode::BAD_REQUEST)?;
            Ok(bytes.to_vec())
        }

        let handler: Box<dyn RequestHandler> = Box::new(handler_fn(echo));
        let body = RequestBody::new(Full::new(Bytes::from_static(b"ping")));
        let response = handler.invoke(&context(), body).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.into_body().collect().await.unwrap().to_bytes(), Bytes::from_static(b"ping"));
    }
}
