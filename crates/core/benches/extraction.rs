use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use gleaner_core::{Document, ExtractConfig, IndexConfig, extract_body, extract_body_from_html, parse_index_page};

fn bench_parse(c: &mut Criterion) {
    let article = std::fs::read_to_string("../../tests/fixtures/article.html").unwrap();
    let listing = std::fs::read_to_string("../../tests/fixtures/listing.html").unwrap();

    let mut group = c.benchmark_group("parse");

    group.bench_with_input(BenchmarkId::new("article", "fixture"), &article, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.bench_with_input(BenchmarkId::new("listing", "fixture"), &listing, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.finish();
}

fn bench_full_extraction(c: &mut Criterion) {
    let html = std::fs::read_to_string("../../tests/fixtures/article.html").unwrap();
    let config = ExtractConfig::default();

    c.bench_function("full_extraction", |b| {
        b.iter(|| extract_body_from_html(black_box(&html), &config))
    });
}

fn bench_body_walk(c: &mut Criterion) {
    let html = std::fs::read_to_string("../../tests/fixtures/article.html").unwrap();
    let doc = Document::parse(&html).unwrap();
    let config = ExtractConfig::default();

    c.bench_function("body_walk", |b| b.iter(|| extract_body(black_box(&doc), black_box(&config))));
}

fn bench_index_page(c: &mut Criterion) {
    let html = std::fs::read_to_string("../../tests/fixtures/listing.html").unwrap();
    let config = IndexConfig::default();

    c.bench_function("index_page", |b| b.iter(|| parse_index_page(black_box(&html), None, &config)));
}

criterion_group!(
    benches,
    bench_parse,
    bench_full_extraction,
    bench_body_walk,
    bench_index_page
);
criterion_main!(benches);
