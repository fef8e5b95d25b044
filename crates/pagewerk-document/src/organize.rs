// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Organize: a queue of page operations replayed against the document.
//
// Positions in each record refer to the page order *after* the preceding
// records. The queue is replayed over a list of slots first; pages are only
// materialized once every record has been validated, so a bad record leaves
// the input untouched.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_core::job::JobControl;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::model::{Document, Page};

/// One queued page operation. Positions are 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OperationRecord {
    Move { from: usize, to: usize },
    Delete { at: usize },
    /// Mark for extraction. If any page is marked, only marked pages remain.
    Extract { at: usize },
    /// Insert a copy directly after `at`.
    Duplicate { at: usize },
    Rotate { at: usize, degrees: i32 },
}

impl fmt::Display for OperationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Move { from, to } => write!(f, "move:{}:{}", from + 1, to + 1),
            Self::Delete { at } => write!(f, "delete:{}", at + 1),
            Self::Extract { at } => write!(f, "extract:{}", at + 1),
            Self::Duplicate { at } => write!(f, "duplicate:{}", at + 1),
            Self::Rotate { at, degrees } => write!(f, "rotate:{}:{degrees}", at + 1),
        }
    }
}

/// Parses the compact 1-based form used on the command line:
/// `move:3:1`, `delete:2`, `extract:4`, `duplicate:1`, `rotate:2:90`.
impl FromStr for OperationRecord {
    type Err = PagewerkError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || PagewerkError::InvalidOption(format!("unrecognised page operation '{s}'"));
        let parts: Vec<&str> = s.trim().split(':').map(str::trim).collect();
        let position = |part: &str| -> Result<usize> {
            match part.parse::<usize>() {
                Ok(0) | Err(_) => Err(invalid()),
                Ok(n) => Ok(n - 1),
            }
        };

        match parts.as_slice() {
            [op, from, to] if op.eq_ignore_ascii_case("move") => Ok(Self::Move {
                from: position(from)?,
                to: position(to)?,
            }),
            [op, at] if op.eq_ignore_ascii_case("delete") => Ok(Self::Delete { at: position(at)? }),
            [op, at] if op.eq_ignore_ascii_case("extract") => Ok(Self::Extract { at: position(at)? }),
            [op, at] if op.eq_ignore_ascii_case("duplicate") => {
                Ok(Self::Duplicate { at: position(at)? })
            }
            [op, at, degrees] if op.eq_ignore_ascii_case("rotate") => Ok(Self::Rotate {
                at: position(at)?,
                degrees: degrees.parse().map_err(|_| invalid())?,
            }),
            _ => Err(invalid()),
        }
    }
}

/// Ordered page operations with single-step undo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationQueue {
    records: Vec<OperationRecord>,
}

impl OperationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: OperationRecord) -> &mut Self {
        self.records.push(record);
        self
    }

    /// Remove and return the most recent record.
    pub fn undo(&mut self) -> Option<OperationRecord> {
        self.records.pop()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OperationRecord> {
        self.records.iter()
    }

    /// Parse a comma- or semicolon-separated list of compact records.
    pub fn parse(script: &str) -> Result<Self> {
        let records = script
            .split([',', ';'])
            .filter(|part| !part.trim().is_empty())
            .map(str::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { records })
    }
}

impl FromIterator<OperationRecord> for OperationQueue {
    fn from_iter<I: IntoIterator<Item = OperationRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

/// A position in the working order: which input page, and what has been
/// done to it.
#[derive(Debug, Clone, Copy)]
struct Slot {
    source: usize,
    rotation: i32,
    extract: bool,
}

/// For each position after `record`, the position it occupied before.
fn remap(record: &OperationRecord, len: usize) -> Result<Vec<usize>> {
    let check = |at: usize| {
        if at < len {
            Ok(())
        } else {
            Err(PagewerkError::OutOfBounds {
                page: at as u32 + 1,
                total: len as u32,
            })
        }
    };

    let mut order: Vec<usize> = (0..len).collect();
    match *record {
        OperationRecord::Move { from, to } => {
            check(from)?;
            check(to)?;
            let moved = order.remove(from);
            order.insert(to, moved);
        }
        OperationRecord::Delete { at } => {
            check(at)?;
            if len == 1 {
                return Err(PagewerkError::EmptySelection);
            }
            order.remove(at);
        }
        OperationRecord::Duplicate { at } => {
            check(at)?;
            order.insert(at + 1, at);
        }
        OperationRecord::Extract { at } => check(at)?,
        OperationRecord::Rotate { at, degrees } => {
            check(at)?;
            if degrees % 90 != 0 {
                return Err(PagewerkError::InvalidOption(format!(
                    "rotation must be a multiple of 90 degrees, got {degrees}"
                )));
            }
        }
    }
    Ok(order)
}

fn replay(queue: &OperationQueue, page_count: usize, job: &JobControl) -> Result<Vec<Slot>> {
    let mut slots: Vec<Slot> = (0..page_count)
        .map(|source| Slot {
            source,
            rotation: 0,
            extract: false,
        })
        .collect();

    for (step, record) in queue.iter().enumerate() {
        job.checkpoint()?;
        let order = remap(record, slots.len())?;
        slots = order.iter().map(|&previous| slots[previous]).collect();
        match *record {
            OperationRecord::Extract { at } => slots[at].extract = true,
            OperationRecord::Rotate { at, degrees } => {
                slots[at].rotation = (slots[at].rotation + degrees).rem_euclid(360)
            }
            _ => {}
        }
        debug!(step = step + 1, %record, pages = slots.len(), "page operation replayed");
        job.report(step + 1, queue.len());
    }
    Ok(slots)
}

pub fn apply(doc: &Document, queue: &OperationQueue) -> Result<Document> {
    apply_with(doc, queue, &JobControl::new())
}

/// Replay the queue with progress reporting, one step per record.
#[instrument(skip_all, fields(pages = doc.page_count(), records = queue.len()))]
pub fn apply_with(doc: &Document, queue: &OperationQueue, job: &JobControl) -> Result<Document> {
    if doc.page_count() == 0 {
        return Err(PagewerkError::EmptySelection);
    }
    job.report(0, queue.len());
    let mut slots = replay(queue, doc.page_count(), job)?;

    if slots.iter().any(|slot| slot.extract) {
        slots.retain(|slot| slot.extract);
    }

    let mut used = HashSet::new();
    let pages: Vec<Page> = slots
        .iter()
        .map(|slot| {
            let original = &doc.pages()[slot.source];
            let mut page = if used.insert(slot.source) {
                original.clone()
            } else {
                original.duplicate()
            };
            page.rotate_by(slot.rotation);
            page
        })
        .collect();

    info!(
        before = doc.page_count(),
        after = pages.len(),
        "page operations applied"
    );
    let mut result = doc.with_selected_pages(&[]);
    result.pages = pages;
    Ok(result)
}
