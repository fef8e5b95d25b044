// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagewerk-document — page operations on PDF documents.
//
// Documents are parsed into an in-memory page model (`model`), transformed
// by the engines below, and serialized back to PDF by `pdf::writer`. Every
// engine takes its input by reference and returns a new document, so a
// failed call leaves the caller's document as it was.

pub mod batch;
pub mod merge;
pub mod model;
pub mod organize;
pub mod pdf;
pub mod protect;
pub mod range;
pub mod redact;
pub mod rotate;
pub mod selector;
pub mod split;
pub mod watermark;

#[cfg(test)]
mod test_support;

pub use batch::{BatchItem, BatchReport};
pub use merge::{MergeOptions, merge};
pub use model::{Bookmark, Document, Metadata, Page, PageKey, SavedPdf};
pub use organize::{OperationQueue, OperationRecord};
pub use protect::{ProtectOptions, protect};
pub use range::PageRangeSpec;
pub use redact::{
    AuditTrail, PiiCategory, RedactOptions, RedactOutcome, RedactionRule, redact, redact_all,
};
pub use rotate::rotate;
pub use selector::PageSelector;
pub use split::{SplitMode, SplitOptions, SplitOutcome, split};
pub use watermark::{Placement, Position, WatermarkPayload, watermark};
