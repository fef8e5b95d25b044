// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for parsing, serializing, and the redaction scan in
// the pagewerk-document crate, on a synthetic many-page document.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use lopdf::{Dictionary, Object, Stream};

use pagewerk_core::EngineConfig;
use pagewerk_document::{
    Document, OperationQueue, RedactOptions, RedactionRule, organize, redact,
};

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

/// `pages` pages of forty lines each, with an SSN-shaped string on every
/// tenth line.
fn synthetic_pdf(pages: usize) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));

    let mut kids = Vec::with_capacity(pages);
    for page in 0..pages {
        let mut content = String::from("BT /F1 10 Tf 12 TL 50 760 Td\n");
        for line in 0..40 {
            if line % 10 == 0 {
                content.push_str(&format!("(Record {page}-{line}: 123-45-{:04}) '\n", 1000 + line));
            } else {
                content.push_str("(Lorem ipsum dolor sit amet, consectetur adipiscing elit.) '\n");
            }
        }
        content.push_str("ET");
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
        kids.push(Object::Reference(doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
        ]))));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(pages as i64)),
            ("Kids", Object::Array(kids)),
            (
                "Resources",
                Object::Dictionary(Dictionary::from_iter([(
                    "Font",
                    Object::Dictionary(Dictionary::from_iter([("F1", Object::Reference(font_id))])),
                )])),
            ),
            (
                "MediaBox",
                Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
            ),
        ])),
    );
    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("fixture serialises");
    bytes
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_round_trip(c: &mut Criterion) {
    let bytes = synthetic_pdf(50);
    let config = EngineConfig::default();

    c.bench_function("load (50 pages)", |b| {
        b.iter(|| black_box(Document::from_bytes(black_box(&bytes), None).expect("loads")));
    });

    let doc = Document::from_bytes(&bytes, None).expect("loads");
    c.bench_function("save (50 pages)", |b| {
        b.iter(|| black_box(doc.to_bytes(&config).expect("saves")));
    });
}

/// Heuristic redaction scans every page, runs six patterns over its text,
/// and rewrites the matching text operators.
fn bench_redaction(c: &mut Criterion) {
    let doc = Document::from_bytes(&synthetic_pdf(20), None).expect("loads");
    let rule = RedactionRule::all_pii();
    let options = RedactOptions::default();

    c.bench_function("redact all_pii (20 pages)", |b| {
        b.iter(|| black_box(redact(&doc, black_box(&rule), &options).expect("redacts")));
    });
}

fn bench_organize(c: &mut Criterion) {
    let doc = Document::from_bytes(&synthetic_pdf(100), None).expect("loads");
    let queue =
        OperationQueue::parse("move:100:1, duplicate:5, rotate:2:90, delete:50, extract:1, extract:2")
            .expect("queue parses");

    c.bench_function("organize queue (100 pages)", |b| {
        b.iter(|| black_box(organize::apply(&doc, black_box(&queue)).expect("applies")));
    });
}

criterion_group!(benches, bench_round_trip, bench_redaction, bench_organize);
criterion_main!(benches);
