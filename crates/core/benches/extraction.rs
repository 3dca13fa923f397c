use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use colligo_core::preprocess::{prepare_document, strip_scripts_and_styles};
use colligo_core::rewrite::parse_rules;
use colligo_core::{Document, Entry, RewriteConfig, Rewriter, RuleTables, extract_content};

fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(format!("../../tests/fixtures/{}", name)).unwrap()
}

/// The article body repeated until the page is roughly `copies` times larger.
fn inflated_article(copies: usize) -> String {
    let html = load_fixture("article.html");
    let body_start = html.find("<div class=\"article-body\">").unwrap();
    let body_end = html[body_start..].find("<div class=\"comments\">").unwrap() + body_start;
    let body = &html[body_start..body_end];
    let mut inflated = String::from(&html[..body_start]);
    for _ in 0..copies {
        inflated.push_str(body);
    }
    inflated.push_str(&html[body_end..]);
    inflated
}

fn bench_parse(c: &mut Criterion) {
    let small = load_fixture("article.html");
    let medium = inflated_article(20);
    let large = inflated_article(200);

    let mut group = c.benchmark_group("parse");

    group.bench_with_input(BenchmarkId::new("small", "4KB"), &small, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.bench_with_input(BenchmarkId::new("medium", "40KB"), &medium, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.bench_with_input(BenchmarkId::new("large", "400KB"), &large, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.finish();
}

fn bench_full_extraction(c: &mut Criterion) {
    let html = inflated_article(20);

    c.bench_function("full_extraction", |b| b.iter(|| extract_content(black_box(&html))));
}

fn bench_preprocess(c: &mut Criterion) {
    let html = inflated_article(20);

    c.bench_function("preprocess", |b| {
        b.iter(|| {
            let stripped = strip_scripts_and_styles(black_box(&html));
            let doc = Document::parse(&stripped);
            prepare_document(&doc).is_empty()
        })
    });
}

fn bench_rewrite(c: &mut Criterion) {
    let tables = RuleTables::new();
    let rewriter = Rewriter::new(&tables, RewriteConfig::default());
    let content = inflated_article(5);
    let rules = r#"add_dynamic_image, add_image_title, remove(".sidebar, .comments"), convert_text_link"#;

    c.bench_function("parse_rules", |b| b.iter(|| parse_rules(black_box(rules))));

    c.bench_function("rewrite_entry", |b| {
        b.iter(|| {
            let mut entry = Entry::new("https://example.org/post", "Title", content.as_str());
            rewriter.rewrite("https://example.org/post", &mut entry, black_box(rules));
            entry.content.len()
        })
    });
}

criterion_group!(benches, bench_parse, bench_full_extraction, bench_preprocess, bench_rewrite);
criterion_main!(benches);
