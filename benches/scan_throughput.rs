extern crate flint_yaml;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use flint_yaml::error::NullSink;
use flint_yaml::tokenizer::TokenKind;
use flint_yaml::treebuild::{Node, NodeKind};
use flint_yaml::{Scanner, Stream};

const IN1: &str = r#"
invoice: 34843
date: 2001-01-23
bill-to: &id001
  given: Chris
  family: Dumars
  address:
    lines: "458 Walkman Dr.\nSuite #292"
    city: Royal Oak
    state: MI
ship-to: *id001
product:
  - sku: BL394D
    quantity: 4
    description: Basketball
    price: 450.00
  - sku: BL4438H
    quantity: 1
    description: Super Hoop
    price: 2392.00
tax: 251.42
total: 4443.52
comments: Late afternoon is best.
"#;

fn scan_tokens(input: &[u8]) -> usize {
    let mut scanner = Scanner::new(input, Box::new(NullSink));
    let mut count = 0;
    loop {
        let token = scanner.pop();
        count += 1;
        if matches!(token.kind, TokenKind::StreamEnd | TokenKind::Error) {
            break;
        }
    }
    count
}

fn walk(node: Node) -> usize {
    match node.kind() {
        NodeKind::Mapping => {
            let mapping = node.as_mapping().expect("mapping");
            let mut count = 1;
            for entry in mapping.entries() {
                count += walk(entry.key());
                count += walk(entry.value());
            }
            count
        }
        NodeKind::Sequence => {
            let sequence = node.as_sequence().expect("sequence");
            let mut count = 1;
            for element in sequence.entries() {
                count += walk(element);
            }
            count
        }
        _ => 1,
    }
}

fn build_tree(input: &[u8]) -> usize {
    let stream = Stream::new(input, Box::new(NullSink));
    let mut count = 0;
    for document in stream.documents() {
        count += walk(document.root());
    }
    count
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("bench-yaml");
    group.significance_level(0.1).sample_size(50);
    group.bench_function("scan_tokens", |b| {
        b.iter(|| scan_tokens(black_box(IN1.as_bytes())))
    });
    group.bench_function("build_tree", |b| {
        b.iter(|| build_tree(black_box(IN1.as_bytes())))
    });
    group.finish();
}

criterion_group!(benches, bench_scan);
criterion_main!(benches);
