// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer: serialise the document model into a fresh lopdf document.
//
// Source pages are copied with their resources and annotations. Objects are
// memoised per source file so fonts and images shared between pages are
// written once. Each page's content is re-encoded from the (possibly
// rewritten) operation list; overlays follow as separate streams so they
// draw over the original content in a clean graphics state.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Object, ObjectId, Stream, StringFormat};
use pagewerk_core::config::EngineConfig;
use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_security::{EncryptDictionary, SecurityHandler, generate_file_id};
use tracing::{debug, info, instrument, warn};

use super::reader::{inherited, rect_from_array};
use super::{encode_text_string, resolve};
use crate::model::{
    Bookmark, Document, Metadata, Overlay, Page, PageKey, PageOrigin, ResourceObject,
    SecurityConfig,
};

/// Serialised bytes plus the encryption parameters used, if any.
#[derive(Debug, Clone)]
pub struct SavedPdf {
    pub bytes: Vec<u8>,
    pub encryption: Option<EncryptionReport>,
}

/// What a reader needs to authenticate against the written `/Encrypt`.
#[derive(Debug, Clone)]
pub struct EncryptionReport {
    pub dictionary: EncryptDictionary,
    pub file_id: Vec<u8>,
}

/// Page dictionary keys that are rebuilt rather than copied.
const REBUILT_PAGE_KEYS: &[&[u8]] = &[
    b"Type",
    b"Parent",
    b"Contents",
    b"Resources",
    b"Rotate",
    b"MediaBox",
    b"CropBox",
    b"Annots",
    // The structure tree is not carried over.
    b"StructParents",
    b"B",
];

/// Per-source-file copy state.
#[derive(Default)]
struct SourceState {
    memo: HashMap<ObjectId, ObjectId>,
    /// Source page object -> first output page built from it.
    page_targets: HashMap<ObjectId, ObjectId>,
    page_ids: HashSet<ObjectId>,
}

/// Deep copy of objects from one source into the output.
struct Copier<'a> {
    out: &'a mut lopdf::Document,
    source: &'a lopdf::Document,
    memo: &'a mut HashMap<ObjectId, ObjectId>,
    page_targets: &'a HashMap<ObjectId, ObjectId>,
    page_ids: &'a HashSet<ObjectId>,
}

impl Copier<'_> {
    fn copy(&mut self, object: &Object) -> Object {
        match object {
            Object::Reference(id) => self.copy_reference(*id),
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dict(dict)),
            Object::Array(items) => Object::Array(items.iter().map(|item| self.copy(item)).collect()),
            Object::Stream(stream) => {
                let dict = self.copy_dict(&stream.dict);
                Object::Stream(Stream::new(dict, stream.content.clone()))
            }
            other => other.clone(),
        }
    }

    /// Copy a dictionary, dropping `/Parent` back-links.
    fn copy_dict(&mut self, dict: &Dictionary) -> Dictionary {
        let mut copied = Dictionary::new();
        for (key, value) in dict.iter() {
            if key.as_slice() == b"Parent" {
                continue;
            }
            copied.set(key.clone(), self.copy(value));
        }
        copied
    }

    fn copy_reference(&mut self, id: ObjectId) -> Object {
        if let Some(&target) = self.page_targets.get(&id) {
            return Object::Reference(target);
        }
        // A link to a page that is not part of the output.
        if self.page_ids.contains(&id) {
            return Object::Null;
        }
        if let Some(&copied) = self.memo.get(&id) {
            return Object::Reference(copied);
        }
        match self.source.get_object(id) {
            Ok(object) => {
                let new_id = self.out.new_object_id();
                self.memo.insert(id, new_id);
                let copied = self.copy(object);
                self.out.objects.insert(new_id, copied);
                Object::Reference(new_id)
            }
            Err(err) => {
                warn!(?id, %err, "cannot resolve reference, using Null");
                Object::Null
            }
        }
    }
}

fn source_key(source: &Arc<lopdf::Document>) -> usize {
    Arc::as_ptr(source) as usize
}

/// Serialise `doc`, applying its pending encryption.
#[instrument(skip_all, fields(pages = doc.page_count(), encrypted = doc.security().is_some()))]
pub(crate) fn save(doc: &Document, config: &EngineConfig) -> Result<SavedPdf> {
    if doc.page_count() == 0 {
        return Err(PagewerkError::EmptySelection);
    }

    let version = output_version(config, doc.security());
    let mut out = lopdf::Document::with_version(version.as_str());
    let pages_id = out.new_object_id();
    let page_ids: Vec<ObjectId> = doc.pages().iter().map(|_| out.new_object_id()).collect();

    let mut sources: HashMap<usize, SourceState> = HashMap::new();
    let mut key_targets: HashMap<PageKey, ObjectId> = HashMap::new();
    for (page, &out_id) in doc.pages().iter().zip(&page_ids) {
        key_targets.entry(page.key()).or_insert(out_id);
        if let PageOrigin::Source { source, page_id } = &page.origin {
            let state = sources.entry(source_key(source)).or_insert_with(|| SourceState {
                page_ids: source.get_pages().values().copied().collect(),
                ..SourceState::default()
            });
            state.page_targets.entry(*page_id).or_insert(out_id);
        }
    }

    let mut images: HashMap<usize, ObjectId> = HashMap::new();
    let mut placed: HashSet<(usize, ObjectId)> = HashSet::new();
    for (index, (page, &out_id)) in doc.pages().iter().zip(&page_ids).enumerate() {
        let dict = build_page(
            &mut out,
            page,
            pages_id,
            &mut sources,
            &mut images,
            &mut placed,
        )?;
        out.objects.insert(out_id, Object::Dictionary(dict));
        debug!(page = index + 1, "page written");
    }

    out.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            (
                "Kids",
                Object::Array(page_ids.iter().map(|&id| Object::Reference(id)).collect()),
            ),
            ("Count", Object::Integer(page_ids.len() as i64)),
        ])),
    );

    let mut catalog = Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);
    if let Some(outlines_id) = write_outlines(&mut out, doc.bookmarks(), &key_targets) {
        catalog.set("Outlines", Object::Reference(outlines_id));
        catalog.set("PageMode", Object::Name(b"UseOutlines".to_vec()));
    }
    let catalog_id = out.add_object(catalog);
    out.trailer.set("Root", Object::Reference(catalog_id));

    if !doc.metadata().is_empty() {
        let info_id = out.add_object(info_dictionary(doc.metadata()));
        out.trailer.set("Info", Object::Reference(info_id));
    }

    if config.compress_output {
        out.compress();
    }

    let encryption = match doc.security() {
        Some(security) => Some(encrypt(&mut out, security)?),
        None => None,
    };

    let mut bytes = Vec::new();
    out.save_to(&mut bytes)
        .map_err(|err| PagewerkError::PdfError(format!("failed to serialise PDF: {err}")))?;

    info!(
        pages = page_ids.len(),
        output_bytes = bytes.len(),
        %version,
        "PDF serialised"
    );
    Ok(SavedPdf { bytes, encryption })
}

/// The configured version, raised when the encryption level needs newer.
fn output_version(config: &EngineConfig, security: Option<&SecurityConfig>) -> String {
    let parse = |v: &str| v.trim().parse::<f32>().unwrap_or(0.0);
    match security {
        Some(security) => {
            let minimum = security.level.minimum_pdf_version();
            if parse(minimum) > parse(&config.pdf_version) {
                minimum.to_string()
            } else {
                config.pdf_version.clone()
            }
        }
        None => config.pdf_version.clone(),
    }
}

// -- Pages --------------------------------------------------------------------

fn build_page(
    out: &mut lopdf::Document,
    page: &Page,
    pages_id: ObjectId,
    sources: &mut HashMap<usize, SourceState>,
    images: &mut HashMap<usize, ObjectId>,
    placed: &mut HashSet<(usize, ObjectId)>,
) -> Result<Dictionary> {
    let media = page.media_box();
    let mut dict = Dictionary::from_iter([
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_id)),
        (
            "MediaBox",
            Object::Array(
                [media.x, media.y, media.right(), media.top()]
                    .into_iter()
                    .map(Object::Real)
                    .collect(),
            ),
        ),
    ]);
    if page.effective_rotation() != 0 {
        dict.set("Rotate", Object::Integer(i64::from(page.effective_rotation())));
    }

    let mut resources = Dictionary::new();
    if let PageOrigin::Source { source, page_id } = &page.origin {
        let key = source_key(source);
        let source_dict = source.get_dictionary(*page_id).map_err(|err| {
            PagewerkError::PdfError(format!("cannot read page object {page_id:?}: {err}"))
        })?;
        let state = sources.entry(key).or_default();
        let duplicate = !placed.insert((key, *page_id));

        let mut copier = Copier {
            out: &mut *out,
            source,
            memo: &mut state.memo,
            page_targets: &state.page_targets,
            page_ids: &state.page_ids,
        };

        if let Some(Object::Dictionary(source_resources)) = inherited(source, source_dict, b"Resources") {
            for (name, value) in source_resources.iter() {
                // Category dictionaries are inlined so overlay entries can be added.
                let copied = match resolve(source, value) {
                    Some(Object::Dictionary(category)) => Object::Dictionary(copier.copy_dict(category)),
                    _ => copier.copy(value),
                };
                resources.set(name.clone(), copied);
            }
        }
        if let Some(crop) = inherited(source, source_dict, b"CropBox")
            .and_then(|crop| rect_from_array(source, crop))
        {
            dict.set(
                "CropBox",
                Object::Array(
                    [crop.x, crop.y, crop.right(), crop.top()]
                        .into_iter()
                        .map(Object::Real)
                        .collect(),
                ),
            );
        }
        for (name, value) in source_dict.iter() {
            if !REBUILT_PAGE_KEYS.contains(&name.as_slice()) {
                dict.set(name.clone(), copier.copy(value));
            }
        }

        if let Ok(annots) = source_dict.get(b"Annots") {
            let copied = if duplicate {
                // A second copy of the page needs its own annotation objects.
                let mut fresh = HashMap::new();
                Copier {
                    out: &mut *out,
                    source,
                    memo: &mut fresh,
                    page_targets: &state.page_targets,
                    page_ids: &state.page_ids,
                }
                .copy(annots)
            } else {
                copier.copy(annots)
            };
            dict.set("Annots", copied);
        }
    }

    for overlay in page.overlays() {
        add_overlay_resources(out, &mut resources, overlay, images);
    }
    dict.set("Resources", Object::Dictionary(resources));

    let mut contents = Vec::with_capacity(1 + page.overlays().len());
    if !page.content.is_empty() {
        contents.push(Object::Reference(add_content_stream(out, &page.content)?));
    }
    for overlay in page.overlays() {
        contents.push(Object::Reference(add_content_stream(out, &overlay.operations)?));
    }
    if !contents.is_empty() {
        dict.set("Contents", Object::Array(contents));
    }

    Ok(dict)
}

/// Write `operations` wrapped in `q ... Q` as a new stream object.
fn add_content_stream(out: &mut lopdf::Document, operations: &[Operation]) -> Result<ObjectId> {
    let mut wrapped = Vec::with_capacity(operations.len() + 2);
    wrapped.push(Operation::new("q", vec![]));
    wrapped.extend(operations.iter().cloned());
    wrapped.push(Operation::new("Q", vec![]));

    let bytes = Content {
        operations: wrapped,
    }
    .encode()
    .map_err(|err| PagewerkError::PdfError(format!("failed to encode content stream: {err}")))?;
    Ok(out.add_object(Stream::new(Dictionary::new(), bytes)))
}

fn add_overlay_resources(
    out: &mut lopdf::Document,
    resources: &mut Dictionary,
    overlay: &Overlay,
    images: &mut HashMap<usize, ObjectId>,
) {
    for resource in &overlay.resources {
        let value = match &resource.object {
            ResourceObject::Direct(dict) => Object::Dictionary(dict.clone()),
            ResourceObject::Image { image, smask } => {
                let key = Arc::as_ptr(image) as usize;
                let id = *images.entry(key).or_insert_with(|| {
                    let mut stream = (**image).clone();
                    if let Some(mask) = smask {
                        let mask_id = out.add_object((**mask).clone());
                        stream.dict.set("SMask", Object::Reference(mask_id));
                    }
                    out.add_object(stream)
                });
                Object::Reference(id)
            }
        };

        let category = resource.category.key();
        let mut entries = match resources.remove(category) {
            Some(Object::Dictionary(existing)) => existing,
            _ => Dictionary::new(),
        };
        entries.set(resource.name.as_bytes().to_vec(), value);
        resources.set(category.to_vec(), Object::Dictionary(entries));
    }
}

// -- Outlines -----------------------------------------------------------------

/// Drop bookmarks whose page is gone, promoting their children.
fn prune(bookmarks: &[Bookmark], targets: &HashMap<PageKey, ObjectId>) -> Vec<Bookmark> {
    let mut kept = Vec::new();
    for bookmark in bookmarks {
        let children = prune(&bookmark.children, targets);
        if targets.contains_key(&bookmark.target) {
            kept.push(Bookmark {
                title: bookmark.title.clone(),
                target: bookmark.target,
                children,
            });
        } else {
            kept.extend(children);
        }
    }
    kept
}

fn write_outlines(
    out: &mut lopdf::Document,
    bookmarks: &[Bookmark],
    targets: &HashMap<PageKey, ObjectId>,
) -> Option<ObjectId> {
    let pruned = prune(bookmarks, targets);
    if pruned.is_empty() {
        return None;
    }
    let outlines_id = out.new_object_id();
    let (first, last, count) = write_outline_level(out, &pruned, outlines_id, targets)?;
    out.objects.insert(
        outlines_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Outlines".to_vec())),
            ("First", Object::Reference(first)),
            ("Last", Object::Reference(last)),
            ("Count", Object::Integer(count)),
        ])),
    );
    Some(outlines_id)
}

/// Returns `(first, last, visible descendant count)` for one sibling list.
fn write_outline_level(
    out: &mut lopdf::Document,
    items: &[Bookmark],
    parent: ObjectId,
    targets: &HashMap<PageKey, ObjectId>,
) -> Option<(ObjectId, ObjectId, i64)> {
    let ids: Vec<ObjectId> = items.iter().map(|_| out.new_object_id()).collect();
    let mut total = 0;
    for (i, item) in items.iter().enumerate() {
        let mut dict = Dictionary::from_iter([
            ("Title", encode_text_string(&item.title)),
            ("Parent", Object::Reference(parent)),
        ]);
        if let Some(&page) = targets.get(&item.target) {
            dict.set(
                "Dest",
                Object::Array(vec![Object::Reference(page), Object::Name(b"Fit".to_vec())]),
            );
        }
        if i > 0 {
            dict.set("Prev", Object::Reference(ids[i - 1]));
        }
        if let Some(&next) = ids.get(i + 1) {
            dict.set("Next", Object::Reference(next));
        }
        if let Some((first, last, count)) = write_outline_level(out, &item.children, ids[i], targets) {
            dict.set("First", Object::Reference(first));
            dict.set("Last", Object::Reference(last));
            dict.set("Count", Object::Integer(count));
            total += count;
        }
        total += 1;
        out.objects.insert(ids[i], Object::Dictionary(dict));
    }
    Some((*ids.first()?, *ids.last()?, total))
}

// -- Metadata -----------------------------------------------------------------

fn info_dictionary(metadata: &Metadata) -> Dictionary {
    let mut info = Dictionary::new();
    let fields = [
        ("Title", &metadata.title),
        ("Author", &metadata.author),
        ("Subject", &metadata.subject),
        ("Keywords", &metadata.keywords),
        ("Creator", &metadata.creator),
        ("Producer", &metadata.producer),
    ];
    for (key, value) in fields {
        if let Some(value) = value {
            info.set(key, encode_text_string(value));
        }
    }
    for (key, value) in &metadata.custom {
        info.set(key.as_bytes().to_vec(), encode_text_string(value));
    }
    info
}

// -- Encryption ---------------------------------------------------------------

fn encrypt(out: &mut lopdf::Document, security: &SecurityConfig) -> Result<EncryptionReport> {
    let file_id = generate_file_id()?;
    let handler = SecurityHandler::new(
        &security.user_password,
        &security.owner_password,
        &security.permissions,
        security.level,
        &file_id,
    )?;

    for (&(number, generation), object) in out.objects.iter_mut() {
        encrypt_object(&handler, object, number, generation)?;
    }

    let encrypt_id = out.add_object(encrypt_dictionary(handler.dictionary()));
    out.trailer.set("Encrypt", Object::Reference(encrypt_id));
    out.trailer.set(
        "ID",
        Object::Array(vec![
            Object::String(file_id.clone(), StringFormat::Hexadecimal),
            Object::String(file_id.clone(), StringFormat::Hexadecimal),
        ]),
    );

    debug!(
        revision = handler.dictionary().revision,
        objects = out.objects.len(),
        "objects encrypted"
    );
    Ok(EncryptionReport {
        dictionary: handler.dictionary().clone(),
        file_id,
    })
}

fn encrypt_object(handler: &SecurityHandler, object: &mut Object, number: u32, generation: u16) -> Result<()> {
    match object {
        Object::String(bytes, format) => {
            *bytes = handler.encrypt_string(bytes, number, generation)?;
            *format = StringFormat::Hexadecimal;
        }
        Object::Array(items) => {
            for item in items {
                encrypt_object(handler, item, number, generation)?;
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter_mut() {
                encrypt_object(handler, value, number, generation)?;
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter_mut() {
                encrypt_object(handler, value, number, generation)?;
            }
            let sealed = handler.encrypt_stream(&stream.content, number, generation)?;
            stream.set_content(sealed);
        }
        _ => {}
    }
    Ok(())
}

fn encrypt_dictionary(values: &EncryptDictionary) -> Dictionary {
    let hex = |bytes: &[u8]| Object::String(bytes.to_vec(), StringFormat::Hexadecimal);
    let mut dict = Dictionary::from_iter([
        ("Filter", Object::Name(b"Standard".to_vec())),
        ("V", Object::Integer(i64::from(values.version))),
        ("R", Object::Integer(i64::from(values.revision))),
        ("Length", Object::Integer(i64::from(values.length_bits))),
        ("O", hex(&values.owner_hash)),
        ("U", hex(&values.user_hash)),
        ("P", Object::Integer(i64::from(values.p))),
    ]);
    if values.uses_aes() {
        let std_cf = Dictionary::from_iter([
            ("CFM", Object::Name(b"AESV3".to_vec())),
            ("AuthEvent", Object::Name(b"DocOpen".to_vec())),
            ("Length", Object::Integer(32)),
        ]);
        dict.set("CF", Dictionary::from_iter([("StdCF", Object::Dictionary(std_cf))]));
        dict.set("StmF", Object::Name(b"StdCF".to_vec()));
        dict.set("StrF", Object::Name(b"StdCF".to_vec()));
        for (key, value) in [
            ("OE", &values.owner_key),
            ("UE", &values.user_key),
            ("Perms", &values.perms),
        ] {
            if let Some(bytes) = value {
                dict.set(key, hex(bytes));
            }
        }
    }
    if !values.encrypt_metadata {
        dict.set("EncryptMetadata", Object::Boolean(false));
    }
    dict
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DEFAULT_MEDIA_BOX, SecurityConfig};
    use crate::test_support::{outlined_pdf, sample_pdf};
    use pagewerk_security::{
        EncryptionLevel, PermissionSet, authenticate_owner_password, authenticate_user_password,
    };

    fn load(bytes: &[u8]) -> Document {
        Document::from_bytes(bytes, None).unwrap()
    }

    #[test]
    fn round_trip_keeps_pages_and_text() {
        let doc = load(&sample_pdf(3));
        let reread = load(&doc.to_bytes(&EngineConfig::default()).unwrap());
        assert_eq!(reread.page_count(), 3);
        assert_eq!(reread.pages()[2].text(), "Page 3");
    }

    #[test]
    fn round_trip_keeps_outline_and_metadata() {
        let doc = load(&outlined_pdf());
        let reread = load(&doc.to_bytes(&EngineConfig::default()).unwrap());
        let titles: Vec<&str> = reread.bookmarks().iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, ["Introduction", "Appendix"]);
        assert_eq!(reread.bookmarks()[1].target, reread.pages()[2].key());
        assert_eq!(reread.metadata(), doc.metadata());
    }

    #[test]
    fn empty_documents_are_rejected() {
        let err = Document::default().to_bytes(&EngineConfig::default()).unwrap_err();
        assert!(matches!(err, PagewerkError::EmptySelection));
    }

    #[test]
    fn blank_pages_serialise() {
        let doc = Document::from_parts(
            vec![Page::blank(DEFAULT_MEDIA_BOX, 0)],
            Vec::new(),
            Metadata::default(),
        );
        let reread = load(&doc.to_bytes(&EngineConfig::default()).unwrap());
        assert_eq!(reread.page_count(), 1);
        assert!(reread.pages()[0].is_empty());
    }

    #[test]
    fn rotation_is_written_to_the_page() {
        let mut doc = load(&sample_pdf(1));
        doc.pages[0].rotate_by(90);
        let reread = load(&doc.to_bytes(&EngineConfig::default()).unwrap());
        assert_eq!(reread.pages()[0].effective_rotation(), 90);
    }

    #[test]
    fn encryption_writes_an_authenticating_dictionary() {
        let mut doc = load(&sample_pdf(2));
        doc.set_security(SecurityConfig {
            user_password: "open".into(),
            owner_password: "admin".into(),
            permissions: PermissionSet::restricted(),
            level: EncryptionLevel::Bits128,
        });
        let saved = doc.save(&EngineConfig::default()).unwrap();
        let report = saved.encryption.expect("encryption report");

        assert!(authenticate_user_password(&report.dictionary, b"open", &report.file_id).is_some());
        assert!(authenticate_owner_password(&report.dictionary, b"admin", &report.file_id).is_some());
        assert!(authenticate_user_password(&report.dictionary, b"nope", &report.file_id).is_none());
        assert!(String::from_utf8_lossy(&saved.bytes).contains("/Encrypt"));
    }

    #[test]
    fn aes_output_declares_pdf_2() {
        let mut doc = load(&sample_pdf(1));
        doc.set_security(SecurityConfig {
            user_password: String::new(),
            owner_password: "owner".into(),
            permissions: PermissionSet::default(),
            level: EncryptionLevel::Bits256,
        });
        let saved = doc.save(&EngineConfig::default()).unwrap();
        assert!(saved.bytes.starts_with(b"%PDF-2.0"));
        let report = saved.encryption.unwrap();
        assert!(report.dictionary.uses_aes());
        assert!(authenticate_user_password(&report.dictionary, b"", &report.file_id).is_some());
    }

    #[test]
    fn encrypted_output_hides_content_strings() {
        let config = EngineConfig {
            compress_output: false,
            ..EngineConfig::default()
        };
        let doc = load(&sample_pdf(1));
        let plain = doc.to_bytes(&config).unwrap();
        assert!(String::from_utf8_lossy(&plain).contains("(Page 1)"));

        let mut protected = doc.clone();
        protected.set_security(SecurityConfig {
            user_password: "pw".into(),
            owner_password: "owner".into(),
            permissions: PermissionSet::default(),
            level: EncryptionLevel::Bits40,
        });
        let sealed = protected.to_bytes(&config).unwrap();
        assert!(!String::from_utf8_lossy(&sealed).contains("(Page 1)"));
    }

    #[test]
    fn shared_resources_are_written_once() {
        let doc = load(&sample_pdf(4));
        let config = EngineConfig {
            compress_output: false,
            ..EngineConfig::default()
        };
        let bytes = doc.to_bytes(&config).unwrap();
        let fonts = String::from_utf8_lossy(&bytes).matches("/BaseFont").count();
        assert_eq!(fonts, 1);
    }
}
