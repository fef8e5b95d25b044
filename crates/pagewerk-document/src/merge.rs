// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Merge: concatenate whole documents or page ranges of them.

use std::collections::HashSet;

use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_core::job::JobControl;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::model::{Bookmark, Document, Metadata, Page};
use crate::range::PageRangeSpec;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeOptions {
    /// One top-level bookmark per input, labelled with its file name.
    pub add_bookmarks: bool,
    /// Copy the information dictionary of the first input.
    pub preserve_metadata: bool,
    /// A blank page between consecutive inputs.
    pub insert_blank_pages: bool,
    /// Title of the merged document when metadata is not preserved.
    pub output_title: Option<String>,
}

pub fn merge(inputs: Vec<(Document, Option<PageRangeSpec>)>, options: &MergeOptions) -> Result<Document> {
    merge_with(inputs, options, &JobControl::new())
}

/// Merge with progress reporting and cancellation, one step per copied page.
#[instrument(skip_all, fields(inputs = inputs.len()))]
pub fn merge_with(
    inputs: Vec<(Document, Option<PageRangeSpec>)>,
    options: &MergeOptions,
    job: &JobControl,
) -> Result<Document> {
    if inputs.is_empty() {
        return Err(PagewerkError::EmptySelection);
    }

    // Every range is checked before anything is copied.
    let mut selections: Vec<Vec<usize>> = Vec::with_capacity(inputs.len());
    for (document, range) in &inputs {
        let count = document.page_count();
        let indices = match range {
            Some(range) => {
                if let Some(&bad) = range.indices().iter().find(|&&i| i as usize >= count) {
                    return Err(PagewerkError::OutOfBounds {
                        page: bad + 1,
                        total: count as u32,
                    });
                }
                range.indices().iter().map(|&i| i as usize).collect()
            }
            None => (0..count).collect(),
        };
        selections.push(indices);
    }

    let total: usize = selections.iter().map(Vec::len).sum();
    if total == 0 {
        return Err(PagewerkError::EmptySelection);
    }
    info!(inputs = inputs.len(), pages = total, "merging documents");

    let metadata = if options.preserve_metadata {
        inputs[0].0.metadata().clone()
    } else {
        Metadata {
            title: options.output_title.clone(),
            ..Metadata::default()
        }
    };

    let mut pages: Vec<Page> = Vec::with_capacity(total + inputs.len());
    let mut bookmarks: Vec<Bookmark> = Vec::new();
    let mut seen = HashSet::new();
    let mut copied = 0;
    job.report(0, total);

    for (input_index, ((document, _), indices)) in inputs.iter().zip(&selections).enumerate() {
        if indices.is_empty() {
            continue;
        }
        if options.insert_blank_pages
            && let Some(previous) = pages.last()
        {
            let blank = Page::blank(previous.media_box(), pages.len() as u32);
            pages.push(blank);
        }

        let first_key = pages.len();
        for &index in indices {
            job.checkpoint()?;
            let source = &document.pages()[index];
            let page = if seen.insert(source.key()) {
                source.clone()
            } else {
                source.duplicate()
            };
            pages.push(page);
            copied += 1;
            job.report(copied, total);
        }

        let label = document
            .name()
            .map(|name| name.rsplit(['/', '\\']).next().unwrap_or(name).to_string())
            .unwrap_or_else(|| format!("Document {}", input_index + 1));
        if options.add_bookmarks {
            bookmarks.push(Bookmark {
                title: label,
                target: pages[first_key].key(),
                children: document.bookmarks().to_vec(),
            });
        } else {
            bookmarks.extend_from_slice(document.bookmarks());
        }
        debug!(input = input_index + 1, pages = indices.len(), "input merged");
    }

    let mut merged = Document::from_parts(pages, bookmarks, metadata);
    merged.set_name("merged.pdf");
    info!(pages = merged.page_count(), "merge complete");
    Ok(merged)
}
