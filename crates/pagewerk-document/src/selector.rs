// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page selectors for the rotate, watermark, and redact engines.

use pagewerk_core::error::{PagewerkError, Result};
use serde::{Deserialize, Serialize};

use crate::range;

/// Which pages an operation applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSelector {
    #[default]
    All,
    /// Pages 1, 3, 5, ...
    Odd,
    /// Pages 2, 4, 6, ...
    Even,
    /// 0-based indices.
    Specific(Vec<u32>),
    /// 1-based inclusive bounds.
    Range(u32, u32),
}

impl PageSelector {
    /// Bridge from the range-string grammar.
    pub fn from_range_str(input: &str, page_count: u32) -> Result<Self> {
        Ok(Self::Specific(range::parse(input, page_count)?))
    }

    /// 0-based indices this selector picks in a document of `page_count`
    /// pages, ascending for the pattern selectors and in the given order
    /// (de-duplicated) for `Specific`.
    pub fn resolve(&self, page_count: usize) -> Result<Vec<usize>> {
        let total = page_count as u32;
        let indices: Vec<usize> = match self {
            Self::All => (0..page_count).collect(),
            Self::Odd => (0..page_count).step_by(2).collect(),
            Self::Even => (1..page_count).step_by(2).collect(),
            Self::Specific(list) => {
                let mut picked = Vec::with_capacity(list.len());
                for &index in list {
                    if index >= total {
                        return Err(PagewerkError::OutOfBounds {
                            page: index + 1,
                            total,
                        });
                    }
                    if !picked.contains(&(index as usize)) {
                        picked.push(index as usize);
                    }
                }
                picked
            }
            Self::Range(start, end) => {
                if *start == 0 || start > end {
                    return Err(PagewerkError::InvalidOption(format!(
                        "page range {start}-{end} is not valid"
                    )));
                }
                if *end > total {
                    return Err(PagewerkError::OutOfBounds { page: *end, total });
                }
                (*start as usize - 1..*end as usize).collect()
            }
        };

        if indices.is_empty() {
            return Err(PagewerkError::EmptySelection);
        }
        Ok(indices)
    }

    /// Membership mask over `page_count` pages.
    pub fn mask(&self, page_count: usize) -> Result<Vec<bool>> {
        let mut mask = vec![false; page_count];
        for index in self.resolve(page_count)? {
            mask[index] = true;
        }
        Ok(mask)
    }
}
