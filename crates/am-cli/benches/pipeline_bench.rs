//! Benchmarks for the extract and serialize pipeline.
//!
//! Run with: cargo bench --bench pipeline_bench

use am_core::Document;
use am_extract::{classify, extract};
use am_layout::GridConfig;
use am_parser::parse_document;
use am_render_xml::{render_drawio, serialize_exchange};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

/// Generate a vault with `rows` table rows per phase document.
fn generate_vault(rows: usize) -> Vec<Document> {
    let table = |phase: &str, header: &str, prefix: &str| {
        let mut content = format!("---\nphase: {phase}\n---\n| {header} | Status |\n|---|---|\n");
        for index in 0..rows {
            let status = match index % 5 {
                0 => "Planned",
                1 => "Retired",
                _ => "Live",
            };
            content.push_str(&format!("| {prefix} {index} | {status} |\n"));
        }
        content
    };

    let mut diagram = String::from("```mermaid\nflowchart LR\n");
    for index in 1..rows {
        diagram.push_str(&format!("  a{}[Service {}] --> a{index}[Service {index}]\n", index - 1, index - 1));
    }
    diagram.push_str("```\n");

    vec![
        Document::new("01-vision.md", table("A", "Stakeholder", "Stakeholder")),
        Document::new("02-business.md", table("B", "Process", "Process")),
        Document::new(
            "03-applications.md",
            format!("{}\n{diagram}", table("C", "Application", "Service")),
        ),
        Document::new("04-technology.md", table("D", "Component", "Service")),
        Document::new("05-roadmap.md", table("F", "Work Package", "Wave")),
    ]
}

/// Benchmark parsing one document
fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_document");

    for size in [10, 100, 500].iter() {
        let vault = generate_vault(*size);
        let content = &vault[2].content;

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &_size| {
            b.iter(|| parse_document(black_box(content)));
        });
    }

    group.finish();
}

/// Benchmark model extraction including relationship passes and views
fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract");

    for size in [10, 100, 500].iter() {
        let vault = generate_vault(*size);

        group.throughput(Throughput::Elements(*size as u64 * vault.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &_size| {
            b.iter(|| extract(black_box(&vault), "Bench"));
        });
    }

    group.finish();
}

/// Benchmark both serializers on a pre-extracted model
fn bench_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize");
    let grid = GridConfig::default();

    for size in [10, 100, 500].iter() {
        let vault = generate_vault(*size);
        let model = extract(&vault, "Bench");
        let classified = classify(&model, &vault);

        group.bench_with_input(BenchmarkId::new("exchange", size), size, |b, &_size| {
            b.iter(|| serialize_exchange(black_box(&model), &grid));
        });
        group.bench_with_input(BenchmarkId::new("drawio", size), size, |b, &_size| {
            b.iter(|| render_drawio(black_box(&classified), &grid));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse, bench_extract, bench_serialize);
criterion_main!(benches);
