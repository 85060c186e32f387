// SPDX-License-Identifier: PMPL-1.0-or-later
//! Benchmarks for snapshotbot scanners and diffing

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use snapshotbot::diff::{compare_structure, compare_tab_order};
use snapshotbot::identity::HashAlgorithm;
use snapshotbot::scanners::structure::{self, ScanOptions};
use snapshotbot::scanners::tab_order;
use snapshotbot::Document;

/// A page with `sections` landmark sections, each holding a heading,
/// a few links and a button
fn synthetic_page(sections: usize) -> String {
    let mut html = String::from("<!DOCTYPE html><html><head><title>Bench</title></head><body><main>");
    for i in 0..sections {
        html.push_str(&format!(
            "<section aria-label=\"Section {i}\"><h2>Heading {i}</h2>\
             <a href=\"/a/{i}\">First {i}</a><a href=\"/b/{i}\">Second {i}</a>\
             <button tabindex=\"{}\">Action {i}</button></section>",
            i % 3
        ));
    }
    html.push_str("</main></body></html>");
    html
}

fn bench_parse(c: &mut Criterion) {
    let html = synthetic_page(200);

    c.bench_function("parse_document", |b| b.iter(|| Document::parse(black_box(&html))));
}

fn bench_structure_scan(c: &mut Criterion) {
    let doc = Document::parse(&synthetic_page(200));
    let options = ScanOptions::default();

    c.bench_function("structure_scan", |b| {
        b.iter(|| structure::scan(black_box(&doc), black_box(&options)))
    });
}

fn bench_tab_order_scan(c: &mut Criterion) {
    let doc = Document::parse(&synthetic_page(200));

    c.bench_function("tab_order_scan", |b| {
        b.iter(|| tab_order::scan(black_box(&doc), HashAlgorithm::Fnv64))
    });
}

fn bench_diff(c: &mut Criterion) {
    let old_doc = Document::parse(&synthetic_page(200));
    let new_doc = Document::parse(&synthetic_page(210));
    let old_tabs = tab_order::records(&old_doc, HashAlgorithm::Fnv64);
    let new_tabs = tab_order::records(&new_doc, HashAlgorithm::Fnv64);
    let options = ScanOptions::default();
    let old_structure = structure::scan(&old_doc, &options);
    let new_structure = structure::scan(&new_doc, &options);
    let old_records = old_structure.structural_elements().unwrap_or_default();
    let new_records = new_structure.structural_elements().unwrap_or_default();

    c.bench_function("tab_order_diff", |b| {
        b.iter(|| compare_tab_order(black_box(&old_tabs), black_box(&new_tabs)))
    });
    c.bench_function("structure_diff", |b| {
        b.iter(|| compare_structure(black_box(old_records), black_box(new_records)))
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_structure_scan,
    bench_tab_order_scan,
    bench_diff
);
criterion_main!(benches);
