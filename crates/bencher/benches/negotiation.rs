use bencher::{BenchCase, Fixture};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use micro_rest_http::media::{best_match, parse_accept, parse_server_types};
use std::hint::black_box;

static SINGLE: Fixture = Fixture::new("single.txt", include_str!("../resources/accept/single.txt"));
static BROWSER: Fixture = Fixture::new("browser.txt", include_str!("../resources/accept/browser.txt"));
static API: Fixture = Fixture::new("api.txt", include_str!("../resources/accept/api.txt"));

fn create_bench_cases() -> Vec<BenchCase> {
    vec![BenchCase::small("single", SINGLE), BenchCase::normal("browser", BROWSER), BenchCase::large("api", API)]
}

fn benchmark_parse_accept(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("parse_accept");

    for case in create_bench_cases() {
        group.throughput(Throughput::Bytes(case.fixture().content().len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(case.name()), &case, |b, case| {
            b.iter(|| black_box(parse_accept(black_box(case.fixture().content()))));
        });
    }

    group.finish();
}

fn benchmark_best_match(criterion: &mut Criterion) {
    let server = parse_server_types("application/json, application/hal+json;qs=0.9, text/html;qs=0.8, text/csv;qs=0.5")
        .expect("server types should be valid");
    let mut group = criterion.benchmark_group("best_match");

    for case in create_bench_cases() {
        let client = parse_accept(case.fixture().content());
        group.bench_with_input(BenchmarkId::from_parameter(case.name()), &client, |b, client| {
            b.iter(|| black_box(best_match(&server, black_box(client), None)));
        });
    }

    group.finish();
}

criterion_group!(negotiation, benchmark_parse_accept, benchmark_best_match);
criterion_main!(negotiation);
