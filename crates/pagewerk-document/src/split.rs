// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Split: one document in, one or more documents out.
//
// Every mode is validated in full before the first part is produced. Extract
// and remove are single-output uses of the same machinery.

use std::collections::HashSet;

use pagewerk_core::config::EngineConfig;
use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_core::job::JobControl;
use pagewerk_core::types::OutputFile;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::model::Document;
use crate::range;

/// How to divide a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SplitMode {
    /// One file with pages `start..=end` (1-based).
    Range { start: u32, end: u32 },
    /// Consecutive chunks of `n` pages; the last may be shorter.
    Every { n: u32 },
    /// One file per range string.
    Bookmarks { ranges: Vec<String> },
    /// One file with the given 0-based pages, in the given order.
    Extract { pages: Vec<u32> },
    /// Greedy chunks whose estimated size stays under `max_bytes`.
    Size { max_bytes: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitOptions {
    pub mode: SplitMode,
    /// Drop pages with no visible content before splitting.
    #[serde(default)]
    pub remove_blank_pages: bool,
    /// Output names become `{prefix}-{n}.pdf`.
    #[serde(default)]
    pub custom_naming: Option<String>,
}

impl SplitOptions {
    pub fn new(mode: SplitMode) -> Self {
        Self {
            mode,
            remove_blank_pages: false,
            custom_naming: None,
        }
    }
}

/// Something the caller should know about a split that still succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitWarning {
    /// A single page is larger than the size budget and was emitted alone.
    SizeBudgetTooSmall {
        /// 1-based page number in the (blank-filtered) input.
        page: u32,
        estimated_bytes: u64,
        max_bytes: u64,
    },
}

#[derive(Debug, Clone)]
pub struct SplitPart {
    pub document: Document,
    pub file_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct SplitOutcome {
    pub parts: Vec<SplitPart>,
    pub warnings: Vec<SplitWarning>,
}

impl SplitOutcome {
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.parts.iter().map(|part| &part.document)
    }

    /// Serialize every part. Multi-part results are typically bundled as an
    /// archive by the caller; single-part results are written as-is.
    pub fn into_outputs(self, config: &EngineConfig) -> Result<Vec<OutputFile>> {
        self.parts
            .into_iter()
            .map(|part| Ok(OutputFile::new(part.file_name, part.document.to_bytes(config)?)))
            .collect()
    }
}

pub fn split(doc: &Document, options: &SplitOptions) -> Result<SplitOutcome> {
    split_with(doc, options, &EngineConfig::default(), &JobControl::new())
}

/// Split with an explicit configuration (for the size overhead) and job
/// control, one progress step per part.
#[instrument(skip_all, fields(pages = doc.page_count()))]
pub fn split_with(
    doc: &Document,
    options: &SplitOptions,
    config: &EngineConfig,
    job: &JobControl,
) -> Result<SplitOutcome> {
    let working = if options.remove_blank_pages {
        let kept: Vec<usize> = (0..doc.page_count())
            .filter(|&i| !doc.pages()[i].is_empty())
            .collect();
        if kept.is_empty() {
            return Err(PagewerkError::EmptySelection);
        }
        debug!(
            removed = doc.page_count() - kept.len(),
            "blank pages dropped before split"
        );
        doc.with_selected_pages(&kept)
    } else {
        doc.clone()
    };

    let mut warnings = Vec::new();
    let groups = plan(&working, &options.mode, config, &mut warnings)?;
    let stem = doc.file_stem();
    info!(parts = groups.len(), "splitting document");

    let mut parts = Vec::with_capacity(groups.len());
    job.report(0, groups.len());
    for (i, indices) in groups.iter().enumerate() {
        job.checkpoint()?;
        let file_name = match &options.custom_naming {
            Some(prefix) => format!("{prefix}-{}.pdf", i + 1),
            None => default_name(&stem, &options.mode, i, indices),
        };
        let mut document = working.with_selected_pages(indices);
        document.set_name(file_name.clone());
        parts.push(SplitPart {
            document,
            file_name,
        });
        job.report(i + 1, groups.len());
    }

    Ok(SplitOutcome { parts, warnings })
}

/// Keep every page except the given 0-based ones.
pub fn remove_pages(doc: &Document, pages: &[u32]) -> Result<SplitOutcome> {
    let total = doc.page_count() as u32;
    for &index in pages {
        check_index(index, total)?;
    }
    let removed: HashSet<u32> = pages.iter().copied().collect();
    let kept: Vec<u32> = (0..total).filter(|i| !removed.contains(i)).collect();
    if kept.is_empty() {
        return Err(PagewerkError::EmptySelection);
    }
    split(doc, &SplitOptions::new(SplitMode::Extract { pages: kept }))
}

fn check_page(page: u32, total: u32) -> Result<()> {
    if page == 0 || page > total {
        return Err(PagewerkError::OutOfBounds { page, total });
    }
    Ok(())
}

/// Like [`check_page`] for a 0-based index; the error names the page.
fn check_index(index: u32, total: u32) -> Result<()> {
    if index >= total {
        return Err(PagewerkError::OutOfBounds {
            page: index.saturating_add(1),
            total,
        });
    }
    Ok(())
}

/// Resolve the mode into 0-based page groups, one per output file.
fn plan(
    doc: &Document,
    mode: &SplitMode,
    config: &EngineConfig,
    warnings: &mut Vec<SplitWarning>,
) -> Result<Vec<Vec<usize>>> {
    let count = doc.page_count();
    let total = count as u32;

    match mode {
        SplitMode::Range { start, end } => {
            if *start == 0 || start > end {
                return Err(PagewerkError::InvalidOption(format!(
                    "split range {start}-{end} is not valid"
                )));
            }
            check_page(*end, total)?;
            Ok(vec![(*start as usize - 1..*end as usize).collect()])
        }
        SplitMode::Every { n } => {
            if *n == 0 {
                return Err(PagewerkError::InvalidOption(
                    "pages per part must be at least 1".into(),
                ));
            }
            let indices: Vec<usize> = (0..count).collect();
            Ok(indices.chunks(*n as usize).map(<[usize]>::to_vec).collect())
        }
        SplitMode::Bookmarks { ranges } => {
            if ranges.is_empty() {
                return Err(PagewerkError::InvalidOption(
                    "at least one range is required".into(),
                ));
            }
            let mut groups = Vec::with_capacity(ranges.len());
            for spec in ranges {
                let indices = range::parse(spec, total)?;
                if indices.is_empty() {
                    return Err(PagewerkError::EmptySelection);
                }
                groups.push(indices.into_iter().map(|i| i as usize).collect());
            }
            Ok(groups)
        }
        SplitMode::Extract { pages } => {
            if pages.is_empty() {
                return Err(PagewerkError::EmptySelection);
            }
            let mut seen = HashSet::with_capacity(pages.len());
            let mut indices: Vec<usize> = Vec::with_capacity(pages.len());
            for &index in pages {
                check_index(index, total)?;
                if seen.insert(index) {
                    indices.push(index as usize);
                }
            }
            Ok(vec![indices])
        }
        SplitMode::Size { max_bytes } => {
            if *max_bytes == 0 {
                return Err(PagewerkError::InvalidOption(
                    "size limit must be greater than zero".into(),
                ));
            }
            Ok(size_chunks(doc, *max_bytes, config.size_overhead_bytes, warnings))
        }
    }
}

/// Greedy packing: a page joins the current chunk unless that would push the
/// estimate past the budget. A page that alone exceeds the budget is emitted
/// by itself with a warning.
fn size_chunks(
    doc: &Document,
    max_bytes: u64,
    overhead: u64,
    warnings: &mut Vec<SplitWarning>,
) -> Vec<Vec<usize>> {
    let mut chunks = Vec::new();
    let mut current: Vec<usize> = Vec::new();
    let mut current_bytes = overhead;

    for (index, page) in doc.pages().iter().enumerate() {
        let size = page.estimated_size() as u64;
        if !current.is_empty() && current_bytes + size > max_bytes {
            chunks.push(std::mem::take(&mut current));
            current_bytes = overhead;
        }

        if overhead + size > max_bytes {
            warn!(
                page = index + 1,
                estimated = overhead + size,
                max_bytes,
                "page exceeds the size budget on its own"
            );
            warnings.push(SplitWarning::SizeBudgetTooSmall {
                page: index as u32 + 1,
                estimated_bytes: overhead + size,
                max_bytes,
            });
            chunks.push(vec![index]);
            continue;
        }

        current.push(index);
        current_bytes += size;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn default_name(stem: &str, mode: &SplitMode, part: usize, indices: &[usize]) -> String {
    let n = part + 1;
    match mode {
        SplitMode::Range { start, end } => format!("{stem}-pages-{start}-{end}.pdf"),
        SplitMode::Every { .. } => format!("{stem}-part-{n}.pdf"),
        SplitMode::Bookmarks { .. } => format!("{stem}-section-{n}.pdf"),
        SplitMode::Extract { .. } => {
            let pages: Vec<u32> = indices.iter().map(|&i| i as u32).collect();
            format!("{stem}-extracted-{}.pdf", range::format(&pages))
        }
        SplitMode::Size { .. } => format!("{stem}-chunk-{n}.pdf"),
    }
}
