// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The in-memory document model every engine operates on.
//
// A `Document` is an ordered list of `Page`s plus a bookmark tree and a
// metadata record. Pages keep a handle on the lopdf document they were read
// from so the writer can copy their resources and annotations verbatim; the
// content stream itself is held decoded so redaction can rewrite it.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use lopdf::content::Operation;
use lopdf::{Dictionary, ObjectId, Stream};

use pagewerk_core::config::EngineConfig;
use pagewerk_core::error::Result;
use pagewerk_core::types::Rect;
use pagewerk_security::{EncryptionLevel, PermissionSet};

use crate::pdf::content::ContentScan;
use crate::pdf::{reader, writer};

pub use crate::pdf::writer::{EncryptionReport, SavedPdf};

/// US Letter, used when a page has no usable media box.
pub const DEFAULT_MEDIA_BOX: Rect = Rect {
    x: 0.0,
    y: 0.0,
    width: 612.0,
    height: 792.0,
};

static NEXT_PAGE_KEY: AtomicU64 = AtomicU64::new(1);

/// Identity of a page within a document, stable across reordering.
///
/// Bookmarks point at keys rather than positions. A duplicated page gets a
/// fresh key so bookmarks keep pointing at the original.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageKey(u64);

impl PageKey {
    pub(crate) fn fresh() -> Self {
        Self(NEXT_PAGE_KEY.fetch_add(1, Ordering::Relaxed))
    }
}

/// Where a page's resources and annotations come from.
#[derive(Debug, Clone)]
pub(crate) enum PageOrigin {
    Source {
        source: Arc<lopdf::Document>,
        page_id: ObjectId,
    },
    Blank,
}

/// What an overlay was added for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    Watermark,
    RedactionBox,
}

/// Resource dictionary an overlay resource is registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResourceCategory {
    Font,
    ExtGState,
    XObject,
}

impl ResourceCategory {
    pub(crate) fn key(self) -> &'static [u8] {
        match self {
            Self::Font => b"Font",
            Self::ExtGState => b"ExtGState",
            Self::XObject => b"XObject",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum ResourceObject {
    /// Written inline into the page's resource dictionary.
    Direct(Dictionary),
    /// Shared image XObject (and its alpha mask), written once per output
    /// file no matter how many pages use it.
    Image {
        image: Arc<Stream>,
        smask: Option<Arc<Stream>>,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct OverlayResource {
    pub category: ResourceCategory,
    pub name: String,
    pub object: ResourceObject,
}

/// Content drawn on top of a page's original content.
#[derive(Debug, Clone)]
pub struct Overlay {
    pub(crate) kind: OverlayKind,
    pub(crate) operations: Vec<Operation>,
    pub(crate) resources: Vec<OverlayResource>,
}

impl Overlay {
    pub fn kind(&self) -> OverlayKind {
        self.kind
    }
}

/// One page of a document.
#[derive(Debug, Clone)]
pub struct Page {
    key: PageKey,
    original_index: u32,
    base_rotation: i32,
    rotation: i32,
    media_box: Rect,
    pub(crate) origin: PageOrigin,
    pub(crate) content: Vec<Operation>,
    pub(crate) overlays: Vec<Overlay>,
    /// Estimated bytes of resources and annotations reachable from the page.
    pub(crate) resource_bytes: usize,
}

impl Page {
    pub(crate) fn from_source(
        original_index: u32,
        base_rotation: i32,
        media_box: Rect,
        source: Arc<lopdf::Document>,
        page_id: ObjectId,
        content: Vec<Operation>,
        resource_bytes: usize,
    ) -> Self {
        Self {
            key: PageKey::fresh(),
            original_index,
            base_rotation: base_rotation.rem_euclid(360),
            rotation: 0,
            media_box,
            origin: PageOrigin::Source { source, page_id },
            content,
            overlays: Vec::new(),
            resource_bytes,
        }
    }

    /// An empty page of the given size. Its original index is the position
    /// it was inserted at.
    pub fn blank(media_box: Rect, original_index: u32) -> Self {
        Self {
            key: PageKey::fresh(),
            original_index,
            base_rotation: 0,
            rotation: 0,
            media_box,
            origin: PageOrigin::Blank,
            content: Vec::new(),
            overlays: Vec::new(),
            resource_bytes: 0,
        }
    }

    pub fn key(&self) -> PageKey {
        self.key
    }

    /// 0-based index of this page in the file it was read from.
    pub fn original_index(&self) -> u32 {
        self.original_index
    }

    pub fn media_box(&self) -> Rect {
        self.media_box
    }

    /// Rotation added by engines, in {0, 90, 180, 270}.
    pub fn rotation_offset(&self) -> i32 {
        self.rotation
    }

    /// The `/Rotate` value the page will be written with.
    pub fn effective_rotation(&self) -> i32 {
        (self.base_rotation + self.rotation).rem_euclid(360)
    }

    /// Add `degrees` (a multiple of 90, may be negative) to the rotation.
    pub fn rotate_by(&mut self, degrees: i32) {
        self.rotation = (self.rotation + degrees).rem_euclid(360);
    }

    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    pub fn is_blank_page(&self) -> bool {
        matches!(self.origin, PageOrigin::Blank)
    }

    /// Copy of this page under a new key, for duplication.
    pub(crate) fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.key = PageKey::fresh();
        copy
    }

    /// True when nothing visible would be drawn: no overlays and no ink in
    /// the content stream.
    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty() && !ContentScan::scan(&self.content).has_ink
    }

    /// Text of the page as the redaction engine sees it. Operators that
    /// continue the same baseline are joined, and a new line starts a new
    /// line of text.
    pub fn text(&self) -> String {
        ContentScan::scan(&self.content).page_text()
    }

    /// Uncompressed estimate of what this page adds to a serialized file.
    pub fn estimated_size(&self) -> usize {
        const PAGE_OBJECT_OVERHEAD: usize = 256;
        let overlay_bytes: usize = self
            .overlays
            .iter()
            .map(|o| {
                crate::pdf::content::encoded_len(&o.operations)
                    + o.resources.iter().map(resource_size).sum::<usize>()
            })
            .sum();
        PAGE_OBJECT_OVERHEAD
            + crate::pdf::content::encoded_len(&self.content)
            + self.resource_bytes
            + overlay_bytes
    }

    pub(crate) fn push_overlay(&mut self, overlay: Overlay) {
        self.overlays.push(overlay);
    }

    /// True when `name` is taken under `category`, either in the page's own
    /// (possibly inherited) resources or by an overlay added earlier.
    pub(crate) fn has_resource(&self, category: ResourceCategory, name: &str) -> bool {
        let in_overlays = self
            .overlays
            .iter()
            .flat_map(|overlay| &overlay.resources)
            .any(|resource| resource.category == category && resource.name == name);
        in_overlays
            || match &self.origin {
                PageOrigin::Source { source, page_id } => {
                    reader::has_resource(source, *page_id, category.key(), name.as_bytes())
                }
                PageOrigin::Blank => false,
            }
    }
}

fn resource_size(resource: &OverlayResource) -> usize {
    match &resource.object {
        ResourceObject::Direct(dict) => 32 * dict.len(),
        ResourceObject::Image { image, smask } => {
            image.content.len() + smask.as_ref().map_or(0, |s| s.content.len())
        }
    }
}

/// An outline entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Bookmark {
    pub title: String,
    pub target: PageKey,
    pub children: Vec<Bookmark>,
}

impl Bookmark {
    pub fn new(title: impl Into<String>, target: PageKey) -> Self {
        Self {
            title: title.into(),
            target,
            children: Vec::new(),
        }
    }

    /// Number of entries in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Bookmark::count).sum::<usize>()
    }
}

/// Document information dictionary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub custom: BTreeMap<String, String>,
}

impl Metadata {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.subject.is_none()
            && self.keywords.is_none()
            && self.creator.is_none()
            && self.producer.is_none()
            && self.custom.is_empty()
    }
}

/// Encryption to apply when the document is serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityConfig {
    pub user_password: String,
    pub owner_password: String,
    pub permissions: PermissionSet,
    pub level: EncryptionLevel,
}

/// An ordered set of pages with bookmarks and metadata.
#[derive(Debug, Clone, Default)]
pub struct Document {
    name: Option<String>,
    pub(crate) pages: Vec<Page>,
    pub(crate) bookmarks: Vec<Bookmark>,
    pub(crate) metadata: Metadata,
    pub(crate) security: Option<SecurityConfig>,
}

impl Document {
    // -- Construction ---------------------------------------------------------

    /// Parse PDF bytes. `password` is tried against encrypted files; `None`
    /// tries the empty user password.
    pub fn from_bytes(bytes: &[u8], password: Option<&str>) -> Result<Self> {
        Self::from_bytes_with(bytes, password, &EngineConfig::default())
    }

    pub fn from_bytes_with(
        bytes: &[u8],
        password: Option<&str>,
        config: &EngineConfig,
    ) -> Result<Self> {
        reader::load(bytes, password, config)
    }

    /// Assemble a document from parts.
    pub fn from_parts(pages: Vec<Page>, bookmarks: Vec<Bookmark>, metadata: Metadata) -> Self {
        Self {
            name: None,
            pages,
            bookmarks,
            metadata,
            security: None,
        }
    }

    // -- Serialization --------------------------------------------------------

    pub fn to_bytes(&self, config: &EngineConfig) -> Result<Vec<u8>> {
        Ok(self.save(config)?.bytes)
    }

    /// Serialize, also reporting the encryption parameters that were used.
    pub fn save(&self, config: &EngineConfig) -> Result<SavedPdf> {
        writer::save(self, config)
    }

    // -- Inspection -----------------------------------------------------------

    /// Source file name, if known.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// File name without directory or `.pdf` extension, or `"document"`.
    pub fn file_stem(&self) -> String {
        let name = self.name.as_deref().unwrap_or("");
        let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
        let stem = match base.rfind('.') {
            Some(dot) if dot > 0 => &base[..dot],
            _ => base,
        };
        if stem.is_empty() {
            "document".to_string()
        } else {
            stem.to_string()
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Encryption pending for the next serialization.
    pub fn security(&self) -> Option<&SecurityConfig> {
        self.security.as_ref()
    }

    pub(crate) fn set_security(&mut self, security: SecurityConfig) {
        self.security = Some(security);
    }

    /// Document with only the given pages (by current index, in order),
    /// keeping name, metadata, and the bookmarks whose target survives.
    pub(crate) fn with_selected_pages(&self, indices: &[usize]) -> Self {
        let mut seen = std::collections::HashSet::new();
        let pages: Vec<Page> = indices
            .iter()
            .map(|&i| {
                let page = &self.pages[i];
                if seen.insert(page.key()) {
                    page.clone()
                } else {
                    page.duplicate()
                }
            })
            .collect();
        Self {
            name: self.name.clone(),
            pages,
            bookmarks: self.bookmarks.clone(),
            metadata: self.metadata.clone(),
            security: None,
        }
    }
}
