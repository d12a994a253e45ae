use bencher::Fixture;
use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use http::{HeaderMap, HeaderValue, Method, header};
use micro_rest::router::{Router, RoutePattern, get};
use micro_rest::{RequestBody, RequestContext, handler_fn};
use std::hint::black_box;

static ROUTES: Fixture = Fixture::new("api.txt", include_str!("../resources/routes/api.txt"));
static PATHS: Fixture = Fixture::new("paths.txt", include_str!("../resources/routes/paths.txt"));

async fn noop(_req: RequestContext, _body: RequestBody) {}

fn router() -> Router {
    ROUTES
        .lines()
        .fold(Router::builder(), |builder, template| {
            builder.route(template, get(handler_fn(noop)).produces("application/json, text/html;qs=0.5"))
        })
        .build()
        .expect("route fixtures should compile")
}

fn benchmark_compile(criterion: &mut Criterion) {
    criterion.bench_function("compile_templates", |b| {
        b.iter_batched(
            || ROUTES.lines().collect::<Vec<_>>(),
            |templates| {
                for template in templates {
                    black_box(RoutePattern::compile(template).expect("route fixtures should compile"));
                }
            },
            BatchSize::SmallInput,
        );
    });
}

fn benchmark_select(criterion: &mut Criterion) {
    let router = router();
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static("text/html,application/xml;q=0.9,*/*;q=0.8"));

    let mut group = criterion.benchmark_group("select");
    for (index, path) in PATHS.lines().enumerate() {
        group.bench_with_input(BenchmarkId::new("path", index), path, |b, path| {
            b.iter(|| {
                let selection = router.select(&Method::GET, black_box(path), &headers);
                black_box(selection.is_ok())
            });
        });
    }
    group.finish();
}

criterion_group!(routing, benchmark_compile, benchmark_select);
criterion_main!(routing);
