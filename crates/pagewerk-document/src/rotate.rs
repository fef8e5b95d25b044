// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rotate selected pages by a quarter-turn multiple.

use pagewerk_core::error::{PagewerkError, Result};
use tracing::{info, instrument};

use crate::model::Document;
use crate::selector::PageSelector;

/// Normalise an accepted angle: 90, 180, 270, or -90 (same as 270).
pub fn normalize_degrees(degrees: i32) -> Result<i32> {
    match degrees {
        90 | 180 | 270 => Ok(degrees),
        -90 => Ok(270),
        other => Err(PagewerkError::InvalidOption(format!(
            "rotation must be 90, 180, 270, or -90 degrees, got {other}"
        ))),
    }
}

/// Add `degrees` to the rotation of every selected page. Rotation is
/// cumulative with whatever the page already carries.
#[instrument(skip(doc, selector), fields(pages = doc.page_count()))]
pub fn rotate(doc: &Document, degrees: i32, selector: &PageSelector) -> Result<Document> {
    let degrees = normalize_degrees(degrees)?;
    let selected = selector.resolve(doc.page_count())?;

    let mut rotated = doc.clone();
    for &index in &selected {
        rotated.pages[index].rotate_by(degrees);
    }
    info!(degrees, pages = selected.len(), "pages rotated");
    Ok(rotated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{load, sample_pdf};
    use pagewerk_core::config::EngineConfig;

    fn rotations(doc: &Document) -> Vec<i32> {
        doc.pages().iter().map(|p| p.effective_rotation()).collect()
    }

    #[test]
    fn only_selected_pages_turn() {
        let doc = load(&sample_pdf(4));
        let out = rotate(&doc, 90, &PageSelector::Even).unwrap();
        assert_eq!(rotations(&out), [0, 90, 0, 90]);
        assert_eq!(rotations(&doc), [0, 0, 0, 0]);
    }

    #[test]
    fn minus_ninety_is_two_seventy_and_rotation_accumulates() {
        let doc = load(&sample_pdf(1));
        let once = rotate(&doc, -90, &PageSelector::All).unwrap();
        assert_eq!(rotations(&once), [270]);
        let twice = rotate(&once, 180, &PageSelector::All).unwrap();
        assert_eq!(rotations(&twice), [90]);
    }

    #[test]
    fn other_angles_are_rejected() {
        let doc = load(&sample_pdf(1));
        for degrees in [0, 45, 360, -180] {
            assert!(matches!(
                rotate(&doc, degrees, &PageSelector::All),
                Err(PagewerkError::InvalidOption(_))
            ));
        }
    }

    #[test]
    fn out_of_range_selection_is_reported() {
        let doc = load(&sample_pdf(2));
        assert!(matches!(
            rotate(&doc, 90, &PageSelector::Range(1, 3)),
            Err(PagewerkError::OutOfBounds { page: 3, total: 2 })
        ));
    }

    #[test]
    fn rotation_survives_serialization() {
        let doc = load(&sample_pdf(2));
        let out = rotate(&doc, 270, &PageSelector::Specific(vec![1])).unwrap();
        let reread = load(&out.to_bytes(&EngineConfig::default()).unwrap());
        assert_eq!(rotations(&reread), [0, 270]);
    }
}
