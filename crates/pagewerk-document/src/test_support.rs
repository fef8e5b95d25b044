// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// lopdf fixtures shared by the unit tests.

use lopdf::{Dictionary, Object, ObjectId, Stream};

use crate::model::Document;

/// Build a PDF whose pages have the given raw content streams. All pages share
/// one resource dictionary with Helvetica as `/F1`. `decorate` may add
/// catalog entries or a trailer `/Info` before saving.
pub(crate) fn build_pdf(
    contents: &[String],
    decorate: impl FnOnce(&mut lopdf::Document, &mut Dictionary, &[ObjectId]),
) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));
    let resources_id = doc.add_object(Dictionary::from_iter([(
        "Font",
        Object::Dictionary(Dictionary::from_iter([("F1", Object::Reference(font_id))])),
    )]));

    let mut page_ids = Vec::with_capacity(contents.len());
    for content in contents {
        let mut page = Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
        ]);
        if !content.is_empty() {
            let content_id =
                doc.add_object(Stream::new(Dictionary::new(), content.as_bytes().to_vec()));
            page.set("Contents", Object::Reference(content_id));
        }
        page_ids.push(doc.add_object(page));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            (
                "Kids",
                Object::Array(page_ids.iter().map(|&id| Object::Reference(id)).collect()),
            ),
            ("Count", Object::Integer(page_ids.len() as i64)),
            ("Resources", Object::Reference(resources_id)),
            (
                "MediaBox",
                Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
            ),
        ])),
    );

    let mut catalog = Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);
    decorate(&mut doc, &mut catalog, &page_ids);
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("fixture serialises");
    bytes
}

/// Content stream drawing each line of text with Helvetica 12pt.
pub(crate) fn text_content(lines: &[&str]) -> String {
    let mut content = String::from("BT /F1 12 Tf 14 TL 72 720 Td\n");
    for (i, line) in lines.iter().enumerate() {
        let escaped = line
            .replace('\\', "\\\\")
            .replace('(', "\\(")
            .replace(')', "\\)");
        let operator = if i == 0 { "Tj" } else { "'" };
        content.push_str(&format!("({escaped}) {operator}\n"));
    }
    content.push_str("ET");
    content
}

/// `pages` pages reading "Page 1", "Page 2", ...
pub(crate) fn sample_pdf(pages: u32) -> Vec<u8> {
    let contents: Vec<String> = (1..=pages)
        .map(|n| text_content(&[&format!("Page {n}")]))
        .collect();
    build_pdf(&contents, |_, _, _| {})
}

/// One page per entry, each with the given lines of text.
pub(crate) fn text_pdf(pages: &[&[&str]]) -> Vec<u8> {
    let contents: Vec<String> = pages.iter().map(|lines| text_content(lines)).collect();
    build_pdf(&contents, |_, _, _| {})
}

/// Three pages with an outline (one `/Dest`, one GoTo action) and an
/// information dictionary.
pub(crate) fn outlined_pdf() -> Vec<u8> {
    let contents: Vec<String> = (1..=3)
        .map(|n| text_content(&[&format!("Page {n}")]))
        .collect();
    build_pdf(&contents, |doc, catalog, pages| {
        let outlines_id = doc.new_object_id();
        let intro_id = doc.new_object_id();
        let appendix_id = doc.new_object_id();

        doc.objects.insert(
            intro_id,
            Object::Dictionary(Dictionary::from_iter([
                ("Title", Object::string_literal("Introduction")),
                ("Parent", Object::Reference(outlines_id)),
                ("Next", Object::Reference(appendix_id)),
                (
                    "Dest",
                    Object::Array(vec![
                        Object::Reference(pages[0]),
                        Object::Name(b"Fit".to_vec()),
                    ]),
                ),
            ])),
        );
        doc.objects.insert(
            appendix_id,
            Object::Dictionary(Dictionary::from_iter([
                ("Title", Object::string_literal("Appendix")),
                ("Parent", Object::Reference(outlines_id)),
                ("Prev", Object::Reference(intro_id)),
                (
                    "A",
                    Object::Dictionary(Dictionary::from_iter([
                        ("S", Object::Name(b"GoTo".to_vec())),
                        (
                            "D",
                            Object::Array(vec![
                                Object::Reference(pages[2]),
                                Object::Name(b"Fit".to_vec()),
                            ]),
                        ),
                    ])),
                ),
            ])),
        );
        doc.objects.insert(
            outlines_id,
            Object::Dictionary(Dictionary::from_iter([
                ("Type", Object::Name(b"Outlines".to_vec())),
                ("First", Object::Reference(intro_id)),
                ("Last", Object::Reference(appendix_id)),
                ("Count", Object::Integer(2)),
            ])),
        );
        catalog.set("Outlines", Object::Reference(outlines_id));

        let info_id = doc.add_object(Dictionary::from_iter([
            ("Title", Object::string_literal("Outlined")),
            ("Author", Object::string_literal("Pagewerk Tests")),
            ("Department", Object::string_literal("Records")),
        ]));
        doc.trailer.set("Info", Object::Reference(info_id));
    })
}

/// Page 1 has text, page 2 has no content stream, page 3 only paints white.
pub(crate) fn pdf_with_blank_pages() -> Vec<u8> {
    build_pdf(
        &[
            text_content(&["Cover"]),
            String::new(),
            "1 g 0 0 612 792 re f".to_string(),
            text_content(&["Body"]),
        ],
        |_, _, _| {},
    )
}

pub(crate) fn load(bytes: &[u8]) -> Document {
    Document::from_bytes(bytes, None).expect("fixture loads")
}

/// Text of every page, in order.
pub(crate) fn page_texts(doc: &Document) -> Vec<String> {
    doc.pages().iter().map(|page| page.text()).collect()
}

/// Original indices of every page, in order.
pub(crate) fn original_indices(doc: &Document) -> Vec<u32> {
    doc.pages().iter().map(|page| page.original_index()).collect()
}

/// A small PNG with a translucent red fill.
pub(crate) fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba([220, 20, 20, 128]));
    let mut bytes = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(image)
        .write_to(&mut bytes, image::ImageFormat::Png)
        .expect("png encodes");
    bytes.into_inner()
}
