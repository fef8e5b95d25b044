// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end tests for the `pagewerk` binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use lopdf::{Dictionary, Object, Stream};
use pagewerk_document::Document;
use tempfile::TempDir;

/// One page per entry, each showing its string in Helvetica.
fn write_pdf(dir: &Path, name: &str, texts: &[&str]) -> PathBuf {
    let mut doc = lopdf::Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));

    let kids: Vec<Object> = texts
        .iter()
        .map(|text| {
            let content = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
            Object::Reference(doc.add_object(Dictionary::from_iter([
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                ("Contents", Object::Reference(content_id)),
            ])))
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(kids.len() as i64)),
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

    let path = dir.join(name);
    doc.save(&path).unwrap();
    path
}

fn pagewerk(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pagewerk"))
        .args(args)
        .env("RUST_LOG", "warn")
        .env_remove("PAGEWERK_CONFIG")
        .env_remove("PAGEWERK_PASSWORD")
        .output()
        .unwrap()
}

fn ok(args: &[&str]) -> Output {
    let out = pagewerk(args);
    assert!(
        out.status.success(),
        "pagewerk {args:?} failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    out
}

fn open(path: &Path) -> Document {
    Document::from_bytes(&std::fs::read(path).unwrap(), None).unwrap()
}

fn texts(path: &Path) -> Vec<String> {
    open(path).pages().iter().map(|p| p.text().trim().to_string()).collect()
}

fn s(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn merge_takes_ranges_per_input() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", &["A1", "A2", "A3"]);
    let b = write_pdf(dir.path(), "b.pdf", &["B1", "B2"]);
    let out = dir.path().join("merged.pdf");

    let a_spec = format!("{}@3,1", s(&a));
    ok(&["merge", &a_spec, s(&b), "-o", s(&out), "--bookmarks"]);

    assert_eq!(texts(&out), ["A3", "A1", "B1", "B2"]);
    let doc = open(&out);
    let titles: Vec<&str> = doc.bookmarks().iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, ["a.pdf", "b.pdf"]);
}

#[test]
fn split_every_writes_numbered_parts() {
    let dir = TempDir::new().unwrap();
    let input = write_pdf(dir.path(), "report.pdf", &["1", "2", "3", "4", "5"]);
    let parts = dir.path().join("parts");

    ok(&["split", s(&input), "-o", s(&parts), "--every", "2"]);

    let mut names: Vec<String> = std::fs::read_dir(&parts)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, ["report-part-1.pdf", "report-part-2.pdf", "report-part-3.pdf"]);
    assert_eq!(texts(&parts.join("report-part-3.pdf")), ["5"]);
}

#[test]
fn extract_and_remove() {
    let dir = TempDir::new().unwrap();
    let input = write_pdf(dir.path(), "in.pdf", &["one", "two", "three"]);
    let extracted = dir.path().join("extracted.pdf");
    let trimmed = dir.path().join("trimmed.pdf");

    ok(&["extract", s(&input), "3,1", "-o", s(&extracted)]);
    ok(&["remove", s(&input), "2", "-o", s(&trimmed)]);

    assert_eq!(texts(&extracted), ["three", "one"]);
    assert_eq!(texts(&trimmed), ["one", "three"]);
}

#[test]
fn organize_replays_the_queue() {
    let dir = TempDir::new().unwrap();
    let input = write_pdf(dir.path(), "in.pdf", &["p1", "p2", "p3"]);
    let out = dir.path().join("out.pdf");

    ok(&["organize", s(&input), "--ops", "move:3:1,delete:3,rotate:1:90", "-o", s(&out)]);

    assert_eq!(texts(&out), ["p3", "p1"]);
    let doc = open(&out);
    assert_eq!(doc.pages()[0].effective_rotation(), 90);
    assert_eq!(doc.pages()[1].effective_rotation(), 0);
}

#[test]
fn rotate_accepts_negative_degrees() {
    let dir = TempDir::new().unwrap();
    let input = write_pdf(dir.path(), "in.pdf", &["x", "y"]);
    let out = dir.path().join("out.pdf");

    ok(&["rotate", s(&input), "--degrees", "-90", "--pages", "2", "-o", s(&out)]);

    let rotations: Vec<i32> = open(&out).pages().iter().map(|p| p.effective_rotation()).collect();
    assert_eq!(rotations, [0, 270]);
}

#[test]
fn rotate_many_files_into_a_directory() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", &["a"]);
    let b = write_pdf(dir.path(), "b.pdf", &["b"]);
    let out = dir.path().join("rotated");

    ok(&["rotate", s(&a), s(&b), "--degrees", "180", "-o", s(&out)]);

    for name in ["a-rotated.pdf", "b-rotated.pdf"] {
        assert_eq!(open(&out.join(name)).pages()[0].effective_rotation(), 180);
    }
}

#[test]
fn watermark_adds_an_overlay() {
    let dir = TempDir::new().unwrap();
    let input = write_pdf(dir.path(), "in.pdf", &["body"]);
    let out = dir.path().join("out.pdf");

    ok(&["watermark", s(&input), "--text", "DRAFT", "--position", "top-right", "-o", s(&out)]);

    assert!(open(&out).pages()[0].text().contains("DRAFT"));
}

#[test]
fn protect_writes_an_encrypt_dictionary() {
    let dir = TempDir::new().unwrap();
    let input = write_pdf(dir.path(), "in.pdf", &["secret"]);
    let out = dir.path().join("out.pdf");

    ok(&[
        "protect",
        s(&input),
        "--owner-password",
        "owner",
        "--level",
        "aes-256",
        "--no-copy",
        "-o",
        s(&out),
    ]);

    let bytes = std::fs::read(&out).unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("/Encrypt"));
}

#[test]
fn protect_without_a_password_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_pdf(dir.path(), "in.pdf", &["x"]);
    let out = dir.path().join("out.pdf");

    let result = pagewerk(&["protect", s(&input), "-o", s(&out)]);
    assert!(!result.status.success());
    assert!(!out.exists());
}

#[test]
fn redact_removes_pii_and_records_the_audit_trail() {
    let dir = TempDir::new().unwrap();
    let input = write_pdf(dir.path(), "in.pdf", &["SSN 123-45-6789 on file", "nothing here"]);
    let out = dir.path().join("out.pdf");
    let db = dir.path().join("audit.db");

    ok(&["redact", s(&input), "--pii", "ssn", "--audit-db", s(&db), "-o", s(&out)]);

    let pages = texts(&out);
    assert!(!pages[0].contains("123-45-6789"));
    assert_eq!(pages[1], "nothing here");

    let log = pagewerk_security::AuditLog::open(&db).unwrap();
    assert_eq!(log.count().unwrap(), 1);
}

#[test]
fn out_of_range_pages_are_explained() {
    let dir = TempDir::new().unwrap();
    let input = write_pdf(dir.path(), "in.pdf", &["only"]);
    let out = dir.path().join("out.pdf");

    let result = pagewerk(&["extract", s(&input), "4", "-o", s(&out)]);
    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("Error:"), "{stderr}");
    assert!(!out.exists());
}

#[test]
fn info_reports_pages_as_json() {
    let dir = TempDir::new().unwrap();
    let input = write_pdf(dir.path(), "in.pdf", &["a", "b"]);

    let out = ok(&["info", s(&input), "--json"]);
    let info: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(info["pages"], 2);
    assert_eq!(info["page_details"][0]["width"], 612.0);
}

#[test]
fn config_file_is_honoured() {
    let dir = TempDir::new().unwrap();
    let input = write_pdf(dir.path(), "in.pdf", &["x"]);
    let config = dir.path().join("config.json");
    std::fs::write(&config, r#"{ "max_input_bytes": 16 }"#).unwrap();

    let result = pagewerk(&["--config", s(&config), "info", s(&input)]);
    assert!(!result.status.success());
}

#[test]
fn audit_lists_records_for_the_redacted_file() {
    let dir = TempDir::new().unwrap();
    let input = write_pdf(dir.path(), "in.pdf", &["mail bob@example.com today"]);
    let out = dir.path().join("out.pdf");
    let db = dir.path().join("audit.db");

    ok(&["redact", s(&input), "--pii", "email", "--audit-db", s(&db), "-o", s(&out)]);

    let listed = ok(&["audit", s(&out), "--db", s(&db), "--json"]);
    let records: serde_json::Value = serde_json::from_slice(&listed.stdout).unwrap();
    assert_eq!(records.as_array().unwrap().len(), 1);
    assert_eq!(records[0]["page"], 1);
    assert_eq!(records[0]["rule"], "heuristic:email");
    assert!(!String::from_utf8_lossy(&listed.stdout).contains("bob@example.com"));

    // The unredacted input has no records of its own.
    let none = ok(&["audit", s(&input), "--db", s(&db), "--json"]);
    let records: serde_json::Value = serde_json::from_slice(&none.stdout).unwrap();
    assert!(records.as_array().unwrap().is_empty());
}

#[test]
fn info_verifies_the_digest() {
    let dir = TempDir::new().unwrap();
    let input = write_pdf(dir.path(), "in.pdf", &["x"]);
    let digest = pagewerk_security::hash_bytes(&std::fs::read(&input).unwrap());

    ok(&["info", s(&input), "--verify", &digest]);
    assert!(!pagewerk(&["info", s(&input), "--verify", "00ff"]).status.success());
}
