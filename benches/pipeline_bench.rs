/*!
 * Benchmarks for the synchronous document stages.
 *
 * Measures performance of:
 * - Batch planning
 * - Text redistribution across runs
 * - Section detection
 * - XML part parsing and serialization
 */

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use lexlate::document::redistribute::distribute;
use lexlate::document::sections::detect_sections;
use lexlate::document::xml::XmlTree;
use lexlate::document::{Location, TextUnit};
use lexlate::translation::plan_batches;

const CLAUSES: [&str; 8] = [
    "1. Definitions",
    "In this Agreement the following terms have the meanings set out below.",
    "The Supplier shall deliver the Services in accordance with Schedule 1.",
    "2. Payment",
    "The Customer shall pay each invoice within thirty (30) days of receipt.",
    "Late payments bear interest at the statutory rate.",
    "3. Confidentiality",
    "Each party shall keep the other party's Confidential Information secret.",
];

/// Generate units that look like a contract body.
fn generate_units(count: usize) -> Vec<TextUnit> {
    (0..count)
        .map(|i| {
            let text = CLAUSES[i % CLAUSES.len()];
            let style = text.starts_with(char::is_numeric).then(|| "Heading1".to_string());
            TextUnit::new(i, text.to_string(), "word/document.xml", i, Location::Body, style)
        })
        .collect()
}

/// Generate a document part with multi-run paragraphs.
fn generate_part(paragraphs: usize) -> String {
    let body: String = (0..paragraphs)
        .map(|i| {
            format!(
                r#"<w:p><w:pPr><w:spacing w:after="120"/></w:pPr><w:r><w:t xml:space="preserve">{} </w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>clause</w:t></w:r></w:p>"#,
                CLAUSES[i % CLAUSES.len()]
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    )
}

fn bench_plan_batches(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_batches");

    for size in [100, 1000, 10000].iter() {
        let units = generate_units(*size);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &units, |b, units| {
            b.iter(|| plan_batches(black_box(units.iter()), 20, 4000));
        });
    }

    group.finish();
}

fn bench_distribute(c: &mut Criterion) {
    let mut group = c.benchmark_group("distribute");
    let text = "Le Fournisseur doit fournir les Services conformément à l'Annexe 1 et aux instructions raisonnables du Client.";

    for runs in [2, 8, 32].iter() {
        let lengths: Vec<usize> = (0..*runs).map(|i| 5 + (i * 7) % 13).collect();
        group.bench_with_input(BenchmarkId::from_parameter(runs), &lengths, |b, lengths| {
            b.iter(|| distribute(black_box(text), black_box(lengths), 5));
        });
    }

    group.finish();
}

fn bench_detect_sections(c: &mut Criterion) {
    let mut group = c.benchmark_group("detect_sections");

    for size in [100, 1000].iter() {
        let units = generate_units(*size);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &units, |b, units| {
            b.iter(|| detect_sections(black_box(units)));
        });
    }

    group.finish();
}

fn bench_xml_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("xml_roundtrip");

    for paragraphs in [100, 1000].iter() {
        let part = generate_part(*paragraphs);
        group.throughput(Throughput::Bytes(part.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(paragraphs), &part, |b, part| {
            b.iter(|| {
                let tree = XmlTree::parse("word/document.xml", black_box(part.as_bytes())).unwrap();
                tree.serialize()
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_plan_batches,
    bench_distribute,
    bench_detect_sections,
    bench_xml_roundtrip,
);
criterion_main!(benches);
