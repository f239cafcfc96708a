use std::hint::black_box;

use bencher::{TestCase, TestFile};
use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use micro_message::{Headers, HttpMessage, Request};

static CURL: TestFile = TestFile::new("curl.txt", include_str!("../resources/headers/curl.txt"));
static BROWSER: TestFile = TestFile::new("browser.txt", include_str!("../resources/headers/browser.txt"));

fn create_test_cases() -> Vec<TestCase> {
    vec![TestCase::new("curl_headers", CURL), TestCase::new("browser_headers", BROWSER)]
}

fn benchmark_headers_from_pairs(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("headers_from_pairs");

    for case in create_test_cases() {
        group.bench_with_input(BenchmarkId::from_parameter(case.name()), &case, |b, case| {
            b.iter_batched(
                || case.file().header_pairs(),
                |pairs| black_box(Headers::from_pairs(pairs).expect("fixture headers should be valid")),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn benchmark_request_with_header(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("request_with_header");

    for case in create_test_cases() {
        let mut builder = Request::builder().uri("http://127.0.0.1:8080/index.html");
        for (name, value) in case.file().header_pairs() {
            builder = builder.header(name, value);
        }
        let request = builder.build().expect("fixture request should be valid");

        group.bench_with_input(BenchmarkId::from_parameter(case.name()), &request, |b, request| {
            b.iter(|| {
                let changed = request
                    .with_header(black_box("X-Request-Id"), "0af7651916cd43dd8448eb211c80319c")
                    .and_then(|r| r.with_added_header("accept", "application/json"))
                    .expect("header should be valid");
                black_box(changed.header_line("x-request-id"))
            });
        });
    }

    group.finish();
}

criterion_group!(headers, benchmark_headers_from_pairs, benchmark_request_with_header);
criterion_main!(headers);
