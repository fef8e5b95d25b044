// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-range grammar.
//
//   range   := "" | token ("," token)*
//   token   := number | number "-" number | keyword
//   keyword := "all" | "even" | "odd" | "reverse"      (case-insensitive)
//
// Numbers are 1-based in the string and 0-based in the result. Keywords and
// numbers cannot be mixed in one string.

use std::collections::HashSet;
use std::fmt;

use pagewerk_core::error::ParseError;

/// Validated, de-duplicated, 0-based page indices in user order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRangeSpec {
    indices: Vec<u32>,
}

impl PageRangeSpec {
    pub fn parse(input: &str, page_count: u32) -> Result<Self, ParseError> {
        parse(input, page_count).map(|indices| Self { indices })
    }

    /// Wrap explicit 0-based indices, validating and de-duplicating them.
    pub fn from_indices(indices: &[u32], page_count: u32) -> Result<Self, ParseError> {
        let mut seen = HashSet::with_capacity(indices.len());
        let mut spec = Self {
            indices: Vec::with_capacity(indices.len()),
        };
        for &index in indices {
            if index >= page_count {
                return Err(ParseError::OutOfBounds {
                    page: index.saturating_add(1),
                    page_count,
                });
            }
            if seen.insert(index) {
                spec.indices.push(index);
            }
        }
        Ok(spec)
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

impl fmt::Display for PageRangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format(&self.indices))
    }
}

#[derive(Clone, Copy)]
enum Keyword {
    All,
    Even,
    Odd,
    Reverse,
}

impl Keyword {
    fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "even" => Some(Self::Even),
            "odd" => Some(Self::Odd),
            "reverse" => Some(Self::Reverse),
            _ => None,
        }
    }

    fn indices(self, page_count: u32) -> Vec<u32> {
        match self {
            Self::All => (0..page_count).collect(),
            // Even and odd refer to 1-based page numbers.
            Self::Even => (0..page_count).filter(|i| i % 2 == 1).collect(),
            Self::Odd => (0..page_count).filter(|i| i % 2 == 0).collect(),
            Self::Reverse => (0..page_count).rev().collect(),
        }
    }
}

/// Parse a range string into 0-based indices.
///
/// An empty (or all-whitespace) string selects every page.
pub fn parse(input: &str, page_count: u32) -> Result<Vec<u32>, ParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok((0..page_count).collect());
    }

    let mut indices: Vec<u32> = Vec::new();
    let mut seen: HashSet<u32> = HashSet::new();
    let mut push = |index: u32| {
        if seen.insert(index) {
            indices.push(index);
        }
    };
    let mut saw_keyword = false;
    let mut saw_number = false;

    for raw in input.split(',') {
        let token = raw.trim();
        if token.is_empty() {
            return Err(ParseError::InvalidToken {
                token: raw.to_string(),
            });
        }

        if let Some(keyword) = Keyword::from_token(token) {
            if saw_number {
                return Err(ParseError::MixedSyntax {
                    token: token.to_string(),
                });
            }
            saw_keyword = true;
            keyword.indices(page_count).into_iter().for_each(&mut push);
            continue;
        }

        if saw_keyword {
            return Err(ParseError::MixedSyntax {
                token: token.to_string(),
            });
        }
        saw_number = true;

        let (start, end) = match token.split_once('-') {
            Some((a, b)) => (page_number(a, token)?, page_number(b, token)?),
            None => {
                let page = page_number(token, token)?;
                (page, page)
            }
        };
        if start > end {
            return Err(ParseError::InvalidRange {
                token: token.to_string(),
            });
        }
        if end > page_count {
            return Err(ParseError::OutOfBounds {
                page: start.max(page_count + 1),
                page_count,
            });
        }
        (start - 1..end).for_each(&mut push);
    }

    Ok(indices)
}

fn page_number(part: &str, token: &str) -> Result<u32, ParseError> {
    let part = part.trim();
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidToken {
            token: token.to_string(),
        });
    }
    match part.parse::<u32>() {
        Ok(0) => Err(ParseError::ZeroPage {
            token: token.to_string(),
        }),
        Ok(page) => Ok(page),
        Err(_) => Err(ParseError::InvalidToken {
            token: token.to_string(),
        }),
    }
}

/// Render 0-based indices back into the compact 1-based grammar, collapsing
/// ascending runs: `[0, 1, 2, 4]` becomes `"1-3,5"`.
pub fn format(indices: &[u32]) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut i = 0;
    while i < indices.len() {
        let start = indices[i];
        let mut end = start;
        while i + 1 < indices.len() && end.checked_add(1) == Some(indices[i + 1]) {
            end = indices[i + 1];
            i += 1;
        }
        parts.push(if start == end {
            format!("{}", start + 1)
        } else {
            format!("{}-{}", start + 1, end + 1)
        });
        i += 1;
    }
    parts.join(",")
}
