// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader: parse bytes with `lopdf` and lift pages, outlines, and the
// information dictionary into the document model.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use lopdf::content::Content;
use lopdf::{Dictionary, Object, ObjectId};
use pagewerk_core::config::EngineConfig;
use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_core::types::Rect;
use tracing::{debug, info, instrument, warn};

use super::{decode_text_string, is_page, number, resolve};
use crate::model::{Bookmark, DEFAULT_MEDIA_BOX, Document, Metadata, Page, PageKey};

/// Page-tree and outline walks give up past this depth.
const MAX_TREE_DEPTH: usize = 32;

/// Parse `bytes` into a [`Document`].
#[instrument(skip_all, fields(bytes_len = bytes.len(), with_password = password.is_some()))]
pub(crate) fn load(bytes: &[u8], password: Option<&str>, config: &EngineConfig) -> Result<Document> {
    let size = bytes.len() as u64;
    if size > config.max_input_bytes {
        return Err(PagewerkError::InputTooLarge {
            size,
            max: config.max_input_bytes,
        });
    }

    let mut source = lopdf::Document::load_mem(bytes).map_err(|err| match err {
        lopdf::Error::Decryption(_) => password_error(password),
        other => PagewerkError::PdfError(format!("failed to load PDF from memory: {other}")),
    })?;

    if source.is_encrypted() {
        source.decrypt(password.unwrap_or("")).map_err(|err| {
            debug!(%err, "decryption failed");
            password_error(password)
        })?;
        debug!("encrypted input decrypted");
    }

    let source = Arc::new(source);
    let page_ids = source.get_pages();
    let mut pages = Vec::with_capacity(page_ids.len());
    let mut keys: HashMap<ObjectId, PageKey> = HashMap::with_capacity(page_ids.len());

    for (&page_number, &page_id) in &page_ids {
        let index = page_number - 1;
        let page = read_page(&source, page_id, index)?;
        keys.entry(page_id).or_insert(page.key());
        pages.push(page);
    }

    let bookmarks = read_outlines(&source, &keys);
    let metadata = read_metadata(&source);

    info!(
        pages = pages.len(),
        bookmarks = bookmarks.len(),
        version = %source.version,
        "PDF loaded"
    );

    Ok(Document::from_parts(pages, bookmarks, metadata))
}

fn password_error(password: Option<&str>) -> PagewerkError {
    match password {
        None | Some("") => PagewerkError::PasswordRequired,
        Some(_) => PagewerkError::IncorrectPassword,
    }
}

// -- Pages --------------------------------------------------------------------

fn read_page(source: &Arc<lopdf::Document>, page_id: ObjectId, index: u32) -> Result<Page> {
    let dict = source.get_dictionary(page_id).map_err(|err| {
        PagewerkError::PdfError(format!("cannot read page object {page_id:?}: {err}"))
    })?;

    let media_box = inherited(source, dict, b"MediaBox")
        .and_then(|obj| rect_from_array(source, obj))
        .unwrap_or_else(|| {
            warn!(page = index + 1, "page has no usable /MediaBox, assuming US Letter");
            DEFAULT_MEDIA_BOX
        });

    let base_rotation = inherited(source, dict, b"Rotate")
        .and_then(|obj| obj.as_i64().ok())
        .map(|r| r as i32)
        .unwrap_or(0);

    let raw_content = source.get_page_content(page_id).unwrap_or_else(|err| {
        debug!(page = index + 1, %err, "page has no readable content stream");
        Vec::new()
    });
    let content = Content::decode(&raw_content).map_err(|err| {
        PagewerkError::PdfError(format!(
            "cannot decode content stream of page {}: {err}",
            index + 1
        ))
    })?;

    let mut visited = HashSet::new();
    let mut resource_bytes = 0;
    if let Some(resources) = inherited(source, dict, b"Resources") {
        resource_bytes += reachable_size(source, resources, &mut visited);
    }
    if let Ok(annots) = dict.get(b"Annots") {
        resource_bytes += reachable_size(source, annots, &mut visited);
    }

    debug!(
        page = index + 1,
        operations = content.operations.len(),
        resource_bytes,
        base_rotation,
        "page read"
    );

    Ok(Page::from_source(
        index,
        base_rotation,
        media_box,
        Arc::clone(source),
        page_id,
        content.operations,
        resource_bytes,
    ))
}

/// Look up an inheritable page attribute, walking `/Parent` links.
pub(crate) fn inherited<'a>(
    doc: &'a lopdf::Document,
    page: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Object> {
    let mut node = page;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return resolve(doc, value);
        }
        let parent = node.get(b"Parent").ok()?;
        node = resolve(doc, parent)?.as_dict().ok()?;
    }
    None
}

/// True when the page's resources define `name` in the `category` dictionary.
pub(crate) fn has_resource(
    doc: &lopdf::Document,
    page_id: ObjectId,
    category: &[u8],
    name: &[u8],
) -> bool {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return false;
    };
    inherited(doc, page, b"Resources")
        .and_then(|resources| resources.as_dict().ok())
        .and_then(|resources| resources.get(category).ok())
        .and_then(|entries| resolve(doc, entries))
        .and_then(|entries| entries.as_dict().ok())
        .is_some_and(|entries| entries.has(name))
}

pub(crate) fn rect_from_array(doc: &lopdf::Document, object: &Object) -> Option<Rect> {
    let array = resolve(doc, object)?.as_array().ok()?;
    if array.len() != 4 {
        return None;
    }
    let mut values = [0.0f32; 4];
    for (slot, item) in values.iter_mut().zip(array) {
        *slot = number(resolve(doc, item)?)?;
    }
    let rect = Rect::from_corners(values[0], values[1], values[2], values[3]);
    (rect.area() > 0.0).then_some(rect)
}

/// Rough byte count of everything reachable from `object`.
fn reachable_size(doc: &lopdf::Document, object: &Object, visited: &mut HashSet<ObjectId>) -> usize {
    match object {
        Object::Reference(id) => {
            if !visited.insert(*id) {
                return 0;
            }
            match doc.get_object(*id) {
                // Page objects are reached through annotation /P links.
                Ok(Object::Dictionary(dict)) if is_page(dict) => 0,
                Ok(target) => reachable_size(doc, target, visited),
                Err(_) => 0,
            }
        }
        Object::Dictionary(dict) => dict_size(doc, dict, visited),
        Object::Array(items) => items
            .iter()
            .map(|item| 8 + reachable_size(doc, item, visited))
            .sum(),
        Object::Stream(stream) => {
            stream.content.len() + dict_size(doc, &stream.dict, visited)
        }
        Object::String(bytes, _) | Object::Name(bytes) => bytes.len() + 2,
        _ => 8,
    }
}

fn dict_size(doc: &lopdf::Document, dict: &Dictionary, visited: &mut HashSet<ObjectId>) -> usize {
    dict.iter()
        .filter(|(key, _)| key.as_slice() != b"Parent")
        .map(|(key, value)| key.len() + 2 + reachable_size(doc, value, visited))
        .sum()
}

// -- Outlines -----------------------------------------------------------------

fn read_outlines(source: &lopdf::Document, keys: &HashMap<ObjectId, PageKey>) -> Vec<Bookmark> {
    let Ok(catalog) = source.catalog() else {
        return Vec::new();
    };
    let Some(outlines) = catalog
        .get(b"Outlines")
        .ok()
        .and_then(|o| resolve(source, o))
        .and_then(|o| o.as_dict().ok())
    else {
        return Vec::new();
    };

    let mut visited = HashSet::new();
    let first = outlines.get(b"First").and_then(Object::as_reference).ok();
    let bookmarks = read_outline_level(source, catalog, first, keys, &mut visited, 0);
    debug!(count = bookmarks.len(), "outline read");
    bookmarks
}

fn read_outline_level(
    source: &lopdf::Document,
    catalog: &Dictionary,
    first: Option<ObjectId>,
    keys: &HashMap<ObjectId, PageKey>,
    visited: &mut HashSet<ObjectId>,
    depth: usize,
) -> Vec<Bookmark> {
    let mut level = Vec::new();
    if depth >= MAX_TREE_DEPTH {
        warn!("outline nested too deeply, truncating");
        return level;
    }

    let mut cursor = first;
    while let Some(id) = cursor {
        if !visited.insert(id) {
            warn!(?id, "outline contains a cycle, stopping");
            break;
        }
        let Ok(item) = source.get_dictionary(id) else {
            break;
        };

        let title = item
            .get(b"Title")
            .ok()
            .and_then(|t| resolve(source, t))
            .and_then(|t| t.as_str().ok())
            .map(decode_text_string)
            .unwrap_or_default();
        let child_first = item.get(b"First").and_then(Object::as_reference).ok();
        let children = read_outline_level(source, catalog, child_first, keys, visited, depth + 1);

        match outline_target(source, catalog, item).and_then(|page| keys.get(&page)) {
            Some(&target) => level.push(Bookmark {
                title,
                target,
                children,
            }),
            None => {
                debug!(%title, "outline entry has no page target, keeping its children");
                level.extend(children);
            }
        }

        cursor = item.get(b"Next").and_then(Object::as_reference).ok();
    }
    level
}

/// The page object an outline item points at, via `/Dest` or a GoTo `/A`.
fn outline_target(source: &lopdf::Document, catalog: &Dictionary, item: &Dictionary) -> Option<ObjectId> {
    let dest = match item.get(b"Dest") {
        Ok(dest) => dest,
        Err(_) => {
            let action = resolve(source, item.get(b"A").ok()?)?.as_dict().ok()?;
            if action.get(b"S").and_then(Object::as_name).ok()? != b"GoTo" {
                return None;
            }
            action.get(b"D").ok()?
        }
    };
    destination_page(source, catalog, dest, 0)
}

fn destination_page(
    source: &lopdf::Document,
    catalog: &Dictionary,
    dest: &Object,
    depth: usize,
) -> Option<ObjectId> {
    if depth > 2 {
        return None;
    }
    match resolve(source, dest)? {
        Object::Array(items) => items.first()?.as_reference().ok(),
        // Named destination: `/Dests` dictionary (PDF 1.1) or `/Names` tree.
        Object::Name(name) => {
            let dests = resolve(source, catalog.get(b"Dests").ok()?)?.as_dict().ok()?;
            destination_page(source, catalog, dests.get(name).ok()?, depth + 1)
        }
        Object::String(name, _) => {
            let names = resolve(source, catalog.get(b"Names").ok()?)?.as_dict().ok()?;
            let tree = resolve(source, names.get(b"Dests").ok()?)?.as_dict().ok()?;
            let found = name_tree_lookup(source, tree, name, 0)?;
            destination_page(source, catalog, found, depth + 1)
        }
        Object::Dictionary(dict) => destination_page(source, catalog, dict.get(b"D").ok()?, depth + 1),
        _ => None,
    }
}

fn name_tree_lookup<'a>(
    source: &'a lopdf::Document,
    node: &'a Dictionary,
    key: &[u8],
    depth: usize,
) -> Option<&'a Object> {
    if depth >= MAX_TREE_DEPTH {
        return None;
    }
    if let Ok(names) = node.get(b"Names").and_then(Object::as_array) {
        for pair in names.chunks_exact(2) {
            if pair[0].as_str().ok() == Some(key) {
                return Some(&pair[1]);
            }
        }
    }
    let kids = node.get(b"Kids").and_then(Object::as_array).ok()?;
    kids.iter()
        .filter_map(|kid| resolve(source, kid)?.as_dict().ok())
        .find_map(|kid| name_tree_lookup(source, kid, key, depth + 1))
}

// -- Metadata -----------------------------------------------------------------

fn read_metadata(source: &lopdf::Document) -> Metadata {
    let Some(info) = source
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|i| resolve(source, i))
        .and_then(|i| i.as_dict().ok())
    else {
        return Metadata::default();
    };

    let mut metadata = Metadata::default();
    for (key, value) in info.iter() {
        let Some(text) = resolve(source, value)
            .and_then(|v| v.as_str().ok())
            .map(decode_text_string)
        else {
            continue;
        };
        match key.as_slice() {
            b"Title" => metadata.title = Some(text),
            b"Author" => metadata.author = Some(text),
            b"Subject" => metadata.subject = Some(text),
            b"Keywords" => metadata.keywords = Some(text),
            b"Creator" => metadata.creator = Some(text),
            b"Producer" => metadata.producer = Some(text),
            // Dates are rewritten by whoever saves the file next.
            b"CreationDate" | b"ModDate" => {}
            other => {
                metadata
                    .custom
                    .insert(String::from_utf8_lossy(other).into_owned(), text);
            }
        }
    }
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{outlined_pdf, sample_pdf};

    #[test]
    fn loads_pages_in_order() {
        let doc = Document::from_bytes(&sample_pdf(4), None).unwrap();
        assert_eq!(doc.page_count(), 4);
        for (i, page) in doc.pages().iter().enumerate() {
            assert_eq!(page.original_index(), i as u32);
            assert_eq!(page.text(), format!("Page {}", i + 1));
            assert_eq!(page.media_box(), DEFAULT_MEDIA_BOX);
        }
    }

    #[test]
    fn reads_outline_targets() {
        let doc = Document::from_bytes(&outlined_pdf(), None).unwrap();
        let bookmarks = doc.bookmarks();
        assert_eq!(bookmarks.len(), 2);
        assert_eq!(bookmarks[0].title, "Introduction");
        assert_eq!(bookmarks[0].target, doc.pages()[0].key());
        assert_eq!(bookmarks[1].title, "Appendix");
        assert_eq!(bookmarks[1].target, doc.pages()[2].key());
    }

    #[test]
    fn reads_information_dictionary() {
        let doc = Document::from_bytes(&outlined_pdf(), None).unwrap();
        assert_eq!(doc.metadata().title.as_deref(), Some("Outlined"));
        assert_eq!(doc.metadata().author.as_deref(), Some("Pagewerk Tests"));
        assert_eq!(
            doc.metadata().custom.get("Department").map(String::as_str),
            Some("Records")
        );
    }

    #[test]
    fn rejects_oversized_input() {
        let config = EngineConfig {
            max_input_bytes: 16,
            ..EngineConfig::default()
        };
        let err = Document::from_bytes_with(&sample_pdf(1), None, &config).unwrap_err();
        assert!(matches!(err, PagewerkError::InputTooLarge { max: 16, .. }));
    }

    #[test]
    fn rejects_garbage() {
        let err = Document::from_bytes(b"definitely not a pdf", None).unwrap_err();
        assert!(matches!(err, PagewerkError::PdfError(_)));
    }

    #[test]
    fn password_error_distinguishes_missing_from_wrong() {
        assert!(matches!(password_error(None), PagewerkError::PasswordRequired));
        assert!(matches!(password_error(Some("")), PagewerkError::PasswordRequired));
        assert!(matches!(
            password_error(Some("guess")),
            PagewerkError::IncorrectPassword
        ));
    }
}
