use bytes::Bytes;
use http::{Method, Request, StatusCode, header};
use http_body_util::Full;
use micro_rest::router::{Router, delete, get, locator, post};
use micro_rest::{RequestBody, RequestContext, RequestPipeline, handler_fn};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

async fn show_user(req: RequestContext, _body: RequestBody) -> String {
    let id = req.path_params().get("id").unwrap_or_default();
    match req.negotiated().map(|media_type| media_type.subtype().to_string()).as_deref() {
        Some("json") => format!(r#"{{"id":{id}}}"#),
        _ => format!("<p>user {id}</p>"),
    }
}

async fn create_user(_req: RequestContext, body: RequestBody) -> Result<(StatusCode, String), StatusCode> {
    let bytes = body.bytes().await.ok().ok_or(StatusCode::BAD_REQUEST)?;
    Ok((StatusCode::CREATED, format!("created from {} bytes", bytes.len())))
}

async fn delete_user(_req: RequestContext, _body: RequestBody) {}

async fn browse(req: RequestContext, _body: RequestBody) -> String {
    format!("{} {}", req.method(), req.remaining_path())
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let router = Router::builder()
        .route("/users/{id: [0-9]+}", get(handler_fn(show_user)).produces("application/json, text/html;qs=0.5"))
        .route("/users", post(handler_fn(create_user)).consumes("application/json"))
        .route("/users/{id: [0-9]+}", delete(handler_fn(delete_user)))
        .route("/files", locator(handler_fn(browse)))
        .build()
        .expect("routes should be valid");

    let pipeline = RequestPipeline::builder().router(router).build().expect("router is set");

    let requests = [
        (Method::GET, "/users/7", None, Some("text/html")),
        (Method::GET, "/users/7", None, Some("application/json")),
        (Method::HEAD, "/users/7", None, None),
        (Method::POST, "/users", Some("application/json"), None),
        (Method::POST, "/users", Some("text/plain"), None),
        (Method::DELETE, "/users/7", None, None),
        (Method::PUT, "/users/7", None, None),
        (Method::OPTIONS, "/users/7", None, None),
        (Method::GET, "/files/2024/report.csv", None, None),
        (Method::GET, "/users/7", None, Some("image/png")),
    ];

    for (method, uri, content_type, accept) in requests {
        let mut builder = Request::builder().method(method.clone()).uri(uri);
        let body = if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type).header(header::CONTENT_LENGTH, 10);
            Bytes::from_static(br#"{"id": 12}"#)
        } else {
            Bytes::new()
        };
        if let Some(accept) = accept {
            builder = builder.header(header::ACCEPT, accept);
        }
        let request = builder.body(Full::new(body)).expect("request should be valid");

        let mut out = Vec::new();
        match pipeline.handle(request, &mut out).await {
            Ok(()) => info!(%method, uri, "response:\n{}", String::from_utf8_lossy(&out)),
            Err(e) => info!(%method, uri, cause = %e, "failed to handle request"),
        }
    }
}
