// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Redact: remove matched text (and, for areas, graphics) from pages and
// paint cover boxes over the spots.
//
// Permanent redaction rewrites the content stream: matched glyphs are cut
// out of their text operators and replaced by equivalent displacements, so
// the remaining text keeps its position and the removed text cannot be
// extracted. Cover-only redaction paints the boxes and leaves the content
// alone.

pub mod matcher;

use std::collections::{BTreeMap, BTreeSet};

use lopdf::content::Operation;
use lopdf::Object;
use pagewerk_core::config::EngineConfig;
use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_core::job::JobControl;
use pagewerk_core::types::{Rect, RgbColor};
use pagewerk_security::{AuditLog, RedactionAuditEntry, hash_bytes};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::model::{Document, Metadata, Overlay, OverlayKind, Page};
use crate::pdf::content::{ContentScan, remove_glyphs};
use crate::selector::PageSelector;

pub use matcher::{PatternSource, PiiCategory, RedactionMatcher, RedactionRule, TextMatch};

/// Margin added around matched glyphs when painting cover boxes.
const COVER_MARGIN_PT: f32 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactOptions {
    /// Remove content rather than only covering it.
    pub permanent_redaction: bool,
    /// Clear the document information dictionary.
    pub redact_metadata: bool,
    /// Collect an audit entry per redacted span.
    pub audit_trail: bool,
    /// Cover colour; `None` uses the configured fill.
    pub fill_color: Option<RgbColor>,
    /// Pages searched by text rules. Area rules name their own page.
    pub pages: PageSelector,
}

impl Default for RedactOptions {
    fn default() -> Self {
        Self {
            permanent_redaction: true,
            redact_metadata: false,
            audit_trail: true,
            fill_color: None,
            pages: PageSelector::All,
        }
    }
}

/// Audit entries for one redaction run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditTrail {
    entries: Vec<RedactionAuditEntry>,
}

impl AuditTrail {
    pub fn entries(&self) -> &[RedactionAuditEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store the trail keyed by the SHA-256 of the serialized output.
    /// Returns the batch id.
    pub fn persist(&self, log: &AuditLog, output: &[u8]) -> Result<String> {
        log.record_trail(&hash_bytes(output), &self.entries)
    }
}

#[derive(Debug, Clone)]
pub struct RedactOutcome {
    pub document: Document,
    pub audit: Option<AuditTrail>,
    /// Number of redacted spans (text matches plus areas).
    pub redactions: usize,
}

pub fn redact(doc: &Document, rule: &RedactionRule, options: &RedactOptions) -> Result<RedactOutcome> {
    redact_all(doc, std::slice::from_ref(rule), options)
}

pub fn redact_all(doc: &Document, rules: &[RedactionRule], options: &RedactOptions) -> Result<RedactOutcome> {
    redact_with(doc, rules, options, &EngineConfig::default(), &JobControl::new())
}

/// Apply every rule in order, one progress step per page.
#[instrument(skip_all, fields(pages = doc.page_count(), rules = rules.len()))]
pub fn redact_with(
    doc: &Document,
    rules: &[RedactionRule],
    options: &RedactOptions,
    config: &EngineConfig,
    job: &JobControl,
) -> Result<RedactOutcome> {
    if rules.is_empty() {
        return Err(PagewerkError::InvalidOption(
            "no redaction rules given".into(),
        ));
    }
    let matchers = rules
        .iter()
        .map(RedactionMatcher::new)
        .collect::<Result<Vec<_>>>()?;

    let total = doc.page_count();
    for (page_index, _) in matchers.iter().filter_map(RedactionMatcher::area) {
        if page_index as usize >= total {
            return Err(PagewerkError::OutOfBounds {
                page: page_index + 1,
                total: total as u32,
            });
        }
    }
    let searched = options.pages.mask(total)?;
    let permanent = options.permanent_redaction;
    if !permanent {
        warn!("cover-only redaction: the covered text remains in the file and can be extracted");
    }
    let fill = options.fill_color.unwrap_or(config.redaction_fill);

    let mut out = doc.clone();
    let mut entries = Vec::new();
    let mut redactions = 0;
    job.report(0, total);

    for index in 0..total {
        job.checkpoint()?;
        let page_number = index as u32 + 1;
        let page = &mut out.pages[index];
        let mut boxes = Vec::new();

        for matcher in &matchers {
            match matcher.area() {
                Some((area_page, rect)) if area_page as usize == index => {
                    redact_area(page, rect, matcher.label(), page_number, permanent, &mut boxes, &mut entries);
                    redactions += 1;
                }
                Some(_) => {}
                None if searched[index] => {
                    redactions += redact_text(page, matcher, page_number, permanent, &mut boxes, &mut entries);
                }
                None => {}
            }
        }

        if !boxes.is_empty() {
            debug!(page = page_number, boxes = boxes.len(), "page redacted");
            page.push_overlay(cover_overlay(&boxes, fill));
        }
        job.report(index + 1, total);
    }

    if options.redact_metadata {
        info!("document metadata cleared");
        out.metadata = Metadata::default();
    }

    info!(redactions, permanent, "redaction complete");
    Ok(RedactOutcome {
        document: out,
        audit: options.audit_trail.then_some(AuditTrail { entries }),
        redactions,
    })
}

fn redact_text(
    page: &mut Page,
    matcher: &RedactionMatcher,
    page_number: u32,
    permanent: bool,
    boxes: &mut Vec<Rect>,
    entries: &mut Vec<RedactionAuditEntry>,
) -> usize {
    let scan = ContentScan::scan(&page.content);
    let matches = matcher.find(&scan.page_text());
    if matches.is_empty() {
        return 0;
    }

    let offsets = scan.run_offsets();
    let mut removals: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
    for found in &matches {
        // One box per text run the match touches.
        let mut per_run: BTreeMap<usize, Rect> = BTreeMap::new();
        for ch in found.chars.clone() {
            let run_index = offsets.partition_point(|&start| start <= ch) - 1;
            let local = ch - offsets[run_index];
            // Past the last glyph is the line separator.
            let Some(glyph) = scan.runs[run_index].glyph_boxes.get(local) else {
                continue;
            };
            per_run
                .entry(run_index)
                .and_modify(|bbox| *bbox = bbox.union(glyph))
                .or_insert(*glyph);
            removals.entry(run_index).or_default().insert(local);
        }

        boxes.extend(per_run.values().map(|bbox| bbox.inflate(COVER_MARGIN_PT)));
        entries.push(RedactionAuditEntry {
            page: page_number,
            rule: found.rule.clone(),
            excerpt: found.text.clone(),
            permanent,
            bbox: per_run.values().copied().reduce(|a, b| a.union(&b)),
        });
    }

    if permanent {
        let replacements = removals
            .iter()
            .map(|(&run_index, removed)| {
                let run = &scan.runs[run_index];
                (run.op_index, remove_glyphs(&page.content[run.op_index], run, removed))
            })
            .collect();
        page.content = splice(&page.content, replacements, &BTreeSet::new());
    }
    matches.len()
}

/// Remove glyphs that touch the area, image draws that touch it, and painted
/// paths that lie inside it.
fn redact_area(
    page: &mut Page,
    rect: Rect,
    rule: &str,
    page_number: u32,
    permanent: bool,
    boxes: &mut Vec<Rect>,
    entries: &mut Vec<RedactionAuditEntry>,
) {
    let scan = ContentScan::scan(&page.content);
    let mut excerpt = String::new();
    let mut replacements = BTreeMap::new();
    let mut deletions = BTreeSet::new();

    for run in &scan.runs {
        let hit: BTreeSet<usize> = run
            .glyph_boxes
            .iter()
            .enumerate()
            .filter(|(_, glyph)| glyph.intersects(&rect))
            .map(|(i, _)| i)
            .collect();
        if hit.is_empty() {
            continue;
        }
        if !excerpt.is_empty() {
            excerpt.push('\n');
        }
        excerpt.extend(
            run.text
                .chars()
                .enumerate()
                .filter(|(i, _)| hit.contains(i))
                .map(|(_, c)| c),
        );
        replacements.insert(run.op_index, remove_glyphs(&page.content[run.op_index], run, &hit));
    }
    for image in &scan.images {
        if image.bbox.is_some_and(|bbox| bbox.intersects(&rect)) {
            deletions.insert(image.op_index);
        }
    }
    for path in &scan.paths {
        if path.painted && path.bbox.is_some_and(|bbox| rect.contains(&bbox)) {
            deletions.extend(path.start..=path.end);
        }
    }

    if permanent {
        debug!(
            page = page_number,
            text_ops = replacements.len(),
            removed_ops = deletions.len(),
            "area content removed"
        );
        page.content = splice(&page.content, replacements, &deletions);
    }
    boxes.push(rect);
    entries.push(RedactionAuditEntry {
        page: page_number,
        rule: rule.to_string(),
        excerpt,
        permanent,
        bbox: Some(rect),
    });
}

fn splice(
    content: &[Operation],
    mut replacements: BTreeMap<usize, Vec<Operation>>,
    deletions: &BTreeSet<usize>,
) -> Vec<Operation> {
    let mut out = Vec::with_capacity(content.len());
    for (index, op) in content.iter().enumerate() {
        if deletions.contains(&index) {
            continue;
        }
        match replacements.remove(&index) {
            Some(replacement) => out.extend(replacement),
            None => out.push(op.clone()),
        }
    }
    out
}

fn cover_overlay(boxes: &[Rect], fill: RgbColor) -> Overlay {
    let mut operations = vec![Operation::new(
        "rg",
        vec![Object::Real(fill.r), Object::Real(fill.g), Object::Real(fill.b)],
    )];
    for bbox in boxes {
        operations.push(Operation::new(
            "re",
            vec![
                Object::Real(bbox.x),
                Object::Real(bbox.y),
                Object::Real(bbox.width),
                Object::Real(bbox.height),
            ],
        ));
    }
    operations.push(Operation::new("f", vec![]));
    Overlay {
        kind: OverlayKind::RedactionBox,
        operations,
        resources: Vec::new(),
    }
}
