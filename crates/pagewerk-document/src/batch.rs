// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Apply one engine to many files in parallel.
//
// Work items are raw bytes: each rayon task parses, transforms, and
// serializes its own document, so no document is shared between threads.
// A failure affects only its own item.

use std::sync::atomic::{AtomicUsize, Ordering};

use pagewerk_core::config::EngineConfig;
use pagewerk_core::error::Result;
use pagewerk_core::job::JobControl;
use pagewerk_core::types::OutputFile;
use rayon::prelude::*;
use tracing::{info, instrument, warn};

use crate::model::Document;
use crate::protect::{ProtectOptions, protect};
use crate::rotate::rotate;
use crate::selector::PageSelector;
use crate::watermark::{Placement, WatermarkPayload, watermark_with};

/// One input file.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl BatchItem {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Outcome for one input, in input order.
#[derive(Debug)]
pub struct BatchReport {
    pub name: String,
    pub result: Result<OutputFile>,
}

impl BatchReport {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Run `op` over every item. Outputs are named `{stem}-{suffix}.pdf`.
#[instrument(skip_all, fields(items = items.len(), suffix))]
pub fn run<F>(
    items: &[BatchItem],
    suffix: &str,
    config: &EngineConfig,
    job: &JobControl,
    op: F,
) -> Vec<BatchReport>
where
    F: Fn(&Document) -> Result<Document> + Sync,
{
    let done = AtomicUsize::new(0);
    job.report(0, items.len());

    let reports: Vec<BatchReport> = items
        .par_iter()
        .map(|item| {
            let result = job.checkpoint().and_then(|()| {
                let mut doc = Document::from_bytes_with(&item.bytes, None, config)?;
                doc.set_name(item.name.clone());
                let stem = doc.file_stem();
                let transformed = op(&doc)?;
                Ok(OutputFile::new(
                    format!("{stem}-{suffix}.pdf"),
                    transformed.to_bytes(config)?,
                ))
            });
            if let Err(err) = &result {
                warn!(file = %item.name, error = %err, "batch item failed");
            }
            job.report(done.fetch_add(1, Ordering::SeqCst) + 1, items.len());
            BatchReport {
                name: item.name.clone(),
                result,
            }
        })
        .collect();

    let failed = reports.iter().filter(|r| !r.is_ok()).count();
    info!(succeeded = reports.len() - failed, failed, "batch complete");
    reports
}

pub fn protect_all(items: &[BatchItem], options: &ProtectOptions, config: &EngineConfig) -> Vec<BatchReport> {
    run(items, "protected", config, &JobControl::new(), |doc| protect(doc, options))
}

pub fn rotate_all(
    items: &[BatchItem],
    degrees: i32,
    selector: &PageSelector,
    config: &EngineConfig,
) -> Vec<BatchReport> {
    run(items, "rotated", config, &JobControl::new(), |doc| {
        rotate(doc, degrees, selector)
    })
}

pub fn watermark_all(
    items: &[BatchItem],
    payload: &WatermarkPayload,
    placement: &Placement,
    selector: &PageSelector,
    config: &EngineConfig,
) -> Vec<BatchReport> {
    run(items, "watermarked", config, &JobControl::new(), |doc| {
        watermark_with(doc, payload, placement, selector, config, &JobControl::new())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{load, sample_pdf};
    use pagewerk_core::error::PagewerkError;
    use std::sync::{Arc, Mutex};

    fn items() -> Vec<BatchItem> {
        vec![
            BatchItem::new("one.pdf", sample_pdf(1)),
            BatchItem::new("broken.pdf", b"%PDF-1.7 nonsense".to_vec()),
            BatchItem::new("dir/three.pdf", sample_pdf(3)),
        ]
    }

    #[test]
    fn failures_stay_with_their_item() {
        let reports = rotate_all(&items(), 90, &PageSelector::All, &EngineConfig::default());
        let names: Vec<&str> = reports.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["one.pdf", "broken.pdf", "dir/three.pdf"]);
        assert!(reports[0].is_ok());
        assert!(!reports[1].is_ok());

        let three = reports[2].result.as_ref().unwrap();
        assert_eq!(three.name, "three-rotated.pdf");
        let doc = load(&three.bytes);
        assert!(doc.pages().iter().all(|p| p.effective_rotation() == 90));
    }

    #[test]
    fn engine_errors_are_reported_per_item() {
        let items = vec![BatchItem::new("a.pdf", sample_pdf(2))];
        let reports = rotate_all(&items, 90, &PageSelector::Range(1, 5), &EngineConfig::default());
        assert!(matches!(
            reports[0].result,
            Err(PagewerkError::OutOfBounds { page: 5, total: 2 })
        ));
    }

    #[test]
    fn protect_all_encrypts_each_file() {
        let options = ProtectOptions {
            owner_password: Some("owner".into()),
            ..ProtectOptions::default()
        };
        let items = vec![BatchItem::new("a.pdf", sample_pdf(1)), BatchItem::new("b.pdf", sample_pdf(2))];
        let reports = protect_all(&items, &options, &EngineConfig::default());
        for report in &reports {
            let file = report.result.as_ref().unwrap();
            assert!(String::from_utf8_lossy(&file.bytes).contains("/Encrypt"));
        }
    }

    #[test]
    fn progress_reaches_the_item_count() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let job = JobControl::new().with_progress(move |p| sink.lock().unwrap().push(p.completed));
        let reports = run(&items(), "copy", &EngineConfig::default(), &job, |doc| Ok(doc.clone()));
        assert_eq!(reports.len(), 3);
        assert_eq!(seen.lock().unwrap().iter().max(), Some(&3));
    }
}
