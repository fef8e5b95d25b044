// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Redaction rules and the matcher that finds their spans in page text.

use std::fmt;
use std::ops::Range;

use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_core::types::Rect;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Built-in personal-data categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiCategory {
    Ssn,
    CreditCard,
    Phone,
    Email,
    Ipv4,
    Date,
}

impl PiiCategory {
    pub const ALL: [Self; 6] = [
        Self::Ssn,
        Self::CreditCard,
        Self::Phone,
        Self::Email,
        Self::Ipv4,
        Self::Date,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Ssn => "ssn",
            Self::CreditCard => "credit_card",
            Self::Phone => "phone",
            Self::Email => "email",
            Self::Ipv4 => "ipv4",
            Self::Date => "date",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(label.trim()))
    }

    fn pattern(self) -> &'static str {
        match self {
            Self::Ssn => r"\b\d{3}-\d{2}-\d{4}\b",
            Self::CreditCard => r"\b(?:\d[ -]?){12,18}\d\b",
            Self::Phone => r"(?:\+\d{1,3}[ .-]?)?(?:\(\d{3}\)|\b\d{3})[ .-]?\d{3}[ .-]\d{4}\b",
            Self::Email => r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
            Self::Ipv4 => r"\b(?:\d{1,3}\.){3}\d{1,3}\b",
            Self::Date => r"\b(?:\d{4}-\d{2}-\d{2}|\d{1,2}[/.-]\d{1,2}[/.-]\d{4})\b",
        }
    }

    fn regex(self) -> Result<Regex> {
        compile(self.pattern(), true)
    }

    /// Structural check beyond the pattern, applied by heuristic rules.
    fn validate(self, matched: &str) -> bool {
        match self {
            Self::Ssn => valid_ssn(matched),
            Self::CreditCard => {
                let digits: Vec<u32> = matched.chars().filter_map(|c| c.to_digit(10)).collect();
                (13..=19).contains(&digits.len()) && luhn(&digits)
            }
            Self::Ipv4 => matched.split('.').all(|octet| octet.parse::<u16>().is_ok_and(|v| v <= 255)),
            Self::Date => valid_date(matched),
            Self::Phone | Self::Email => true,
        }
    }
}

impl fmt::Display for PiiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternSource {
    Builtin(PiiCategory),
    Custom(String),
}

/// What to redact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum RedactionRule {
    LiteralText {
        text: String,
        case_sensitive: bool,
        whole_word: bool,
    },
    Pattern {
        pattern: PatternSource,
    },
    /// A rectangle in page space on one 0-based page.
    Area {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        page_index: u32,
    },
    /// Built-in patterns plus validation (Luhn, octet range, calendar).
    Heuristic {
        categories: Vec<PiiCategory>,
    },
}

impl RedactionRule {
    /// Case-insensitive substring match.
    pub fn literal(text: impl Into<String>) -> Self {
        Self::LiteralText {
            text: text.into(),
            case_sensitive: false,
            whole_word: false,
        }
    }

    pub fn pattern(regex: impl Into<String>) -> Self {
        Self::Pattern {
            pattern: PatternSource::Custom(regex.into()),
        }
    }

    pub fn area(page_index: u32, rect: Rect) -> Self {
        Self::Area {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            page_index,
        }
    }

    /// Every built-in category.
    pub fn all_pii() -> Self {
        Self::Heuristic {
            categories: PiiCategory::ALL.to_vec(),
        }
    }
}

/// A matched span in page text. `chars` indexes characters, not bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMatch {
    pub chars: Range<usize>,
    pub text: String,
    /// Audit label of the rule (and category) that matched.
    pub rule: String,
}

enum Kind {
    Text {
        regex: Regex,
        whole_word: bool,
    },
    Heuristic(Vec<(PiiCategory, Regex)>),
    Area {
        page_index: u32,
        rect: Rect,
    },
}

/// A compiled rule. Patterns are compiled once here and reused for every
/// page.
pub struct RedactionMatcher {
    kind: Kind,
    label: String,
}

impl fmt::Debug for RedactionMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedactionMatcher")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

fn compile(pattern: &str, case_sensitive: bool) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .build()
        .map_err(|err| PagewerkError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: err.to_string(),
        })
}

impl RedactionMatcher {
    pub fn new(rule: &RedactionRule) -> Result<Self> {
        match rule {
            RedactionRule::LiteralText {
                text,
                case_sensitive,
                whole_word,
            } => {
                if text.is_empty() {
                    return Err(PagewerkError::InvalidOption(
                        "literal redaction text is empty".into(),
                    ));
                }
                Ok(Self {
                    kind: Kind::Text {
                        regex: compile(&regex::escape(text), *case_sensitive)?,
                        whole_word: *whole_word,
                    },
                    // The searched text is not repeated in the audit label.
                    label: "literal".into(),
                })
            }
            RedactionRule::Pattern { pattern } => {
                let (regex, label) = match pattern {
                    PatternSource::Builtin(category) => (category.regex()?, format!("pattern:{category}")),
                    PatternSource::Custom(source) => {
                        (compile(source, true)?, format!("pattern:/{source}/"))
                    }
                };
                Ok(Self {
                    kind: Kind::Text {
                        regex,
                        whole_word: false,
                    },
                    label,
                })
            }
            RedactionRule::Heuristic { categories } => {
                if categories.is_empty() {
                    return Err(PagewerkError::InvalidOption(
                        "no PII categories selected".into(),
                    ));
                }
                let compiled = categories
                    .iter()
                    .map(|&c| Ok((c, c.regex()?)))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Self {
                    kind: Kind::Heuristic(compiled),
                    label: "heuristic".into(),
                })
            }
            RedactionRule::Area {
                x,
                y,
                width,
                height,
                page_index,
            } => {
                let rect = Rect::new(*x, *y, *width, *height);
                if !(rect.width > 0.0 && rect.height > 0.0) {
                    return Err(PagewerkError::InvalidOption(format!(
                        "redaction area {width}x{height} has no extent"
                    )));
                }
                Ok(Self {
                    kind: Kind::Area {
                        page_index: *page_index,
                        rect,
                    },
                    label: format!("area:page {}", page_index + 1),
                })
            }
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// `(page_index, rect)` for area rules.
    pub fn area(&self) -> Option<(u32, Rect)> {
        match self.kind {
            Kind::Area { page_index, rect } => Some((page_index, rect)),
            _ => None,
        }
    }

    /// Non-overlapping matches in `text`, in order. Area rules match nothing.
    pub fn find(&self, text: &str) -> Vec<TextMatch> {
        let char_index = CharIndex::new(text);
        let mut found: Vec<TextMatch> = Vec::new();

        match &self.kind {
            Kind::Text { regex, whole_word } => {
                for m in regex.find_iter(text) {
                    if m.is_empty() || (*whole_word && !on_word_boundaries(text, m.range())) {
                        continue;
                    }
                    found.push(TextMatch {
                        chars: char_index.range(m.range()),
                        text: m.as_str().to_string(),
                        rule: self.label.clone(),
                    });
                }
            }
            Kind::Heuristic(categories) => {
                for (category, regex) in categories {
                    for m in regex.find_iter(text) {
                        if !m.is_empty() && category.validate(m.as_str()) {
                            found.push(TextMatch {
                                chars: char_index.range(m.range()),
                                text: m.as_str().to_string(),
                                rule: format!("heuristic:{category}"),
                            });
                        }
                    }
                }
                // Earliest start wins; among equal starts, the longest.
                found.sort_by(|a, b| {
                    a.chars
                        .start
                        .cmp(&b.chars.start)
                        .then(b.chars.end.cmp(&a.chars.end))
                });
                let mut end = 0;
                found.retain(|m| {
                    let keep = m.chars.start >= end;
                    if keep {
                        end = m.chars.end;
                    }
                    keep
                });
            }
            Kind::Area { .. } => {}
        }
        found
    }
}

/// Byte offset to char offset conversion.
struct CharIndex {
    starts: Vec<usize>,
}

impl CharIndex {
    fn new(text: &str) -> Self {
        Self {
            starts: text.char_indices().map(|(i, _)| i).collect(),
        }
    }

    fn char_at(&self, byte: usize) -> usize {
        self.starts.partition_point(|&start| start < byte)
    }

    fn range(&self, bytes: Range<usize>) -> Range<usize> {
        self.char_at(bytes.start)..self.char_at(bytes.end)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn on_word_boundaries(text: &str, range: Range<usize>) -> bool {
    let before = text[..range.start].chars().next_back();
    let after = text[range.end..].chars().next();
    !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
}

fn luhn(digits: &[u32]) -> bool {
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

/// Area not 000, 666, or 9xx; group not 00; serial not 0000.
fn valid_ssn(matched: &str) -> bool {
    let parts: Vec<&str> = matched.split('-').collect();
    let [area, group, serial] = parts.as_slice() else {
        return false;
    };
    *area != "000" && *area != "666" && !area.starts_with('9') && *group != "00" && *serial != "0000"
}

fn valid_date(matched: &str) -> bool {
    let fields: Vec<u32> = matched
        .split(['-', '/', '.'])
        .filter_map(|f| f.parse().ok())
        .collect();
    let [a, b, c] = fields.as_slice() else {
        return false;
    };
    let (year, month, day) = if *a > 999 {
        (*a, *b, *c)
    } else {
        // d/m/y and m/d/y are both accepted when they read as a real date.
        let dmy = (*c, *b, *a);
        if is_calendar_date(dmy.0, dmy.1, dmy.2) {
            return true;
        }
        (*c, *a, *b)
    };
    is_calendar_date(year, month, day)
}

fn is_calendar_date(year: u32, month: u32, day: u32) -> bool {
    let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
    let days = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if leap => 29,
        2 => 28,
        _ => return false,
    };
    (1..=days).contains(&day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(matcher: &RedactionMatcher, text: &str) -> Vec<String> {
        matcher.find(text).into_iter().map(|m| m.text).collect()
    }

    #[test]
    fn literal_is_case_insensitive_by_default() {
        let m = RedactionMatcher::new(&RedactionRule::literal("secret")).unwrap();
        assert_eq!(texts(&m, "Secret plans, SECRET base"), ["Secret", "SECRET"]);
    }

    #[test]
    fn literal_whole_word_and_case() {
        let rule = RedactionRule::LiteralText {
            text: "Ann".into(),
            case_sensitive: true,
            whole_word: true,
        };
        let m = RedactionMatcher::new(&rule).unwrap();
        assert_eq!(texts(&m, "Ann, Annual, ann, (Ann)"), ["Ann", "Ann"]);
    }

    #[test]
    fn literal_metacharacters_are_escaped() {
        let m = RedactionMatcher::new(&RedactionRule::literal("a.b(c)")).unwrap();
        assert_eq!(texts(&m, "axb(c) a.b(c)"), ["a.b(c)"]);
    }

    #[test]
    fn empty_literal_is_rejected() {
        assert!(matches!(
            RedactionMatcher::new(&RedactionRule::literal("")),
            Err(PagewerkError::InvalidOption(_))
        ));
    }

    #[test]
    fn invalid_pattern_names_the_pattern() {
        let err = RedactionMatcher::new(&RedactionRule::pattern("(unclosed")).unwrap_err();
        assert!(matches!(err, PagewerkError::InvalidPattern { pattern, .. } if pattern == "(unclosed"));
    }

    #[test]
    fn ranges_are_in_chars() {
        let m = RedactionMatcher::new(&RedactionRule::literal("id")).unwrap();
        let found = m.find("café id");
        assert_eq!(found[0].chars, 5..7);
    }

    #[test]
    fn heuristics_validate_their_matches() {
        let m = RedactionMatcher::new(&RedactionRule::all_pii()).unwrap();
        let text = "card 4111 1111 1111 1111 and 4111 1111 1111 1112, \
                    ip 192.168.1.20 not 300.1.1.1, ssn 123-45-6789 not 666-12-3456, \
                    mail jo@example.org on 2024-02-29 not 2023-02-29";
        let found = texts(&m, text);
        assert_eq!(
            found,
            [
                "4111 1111 1111 1111",
                "192.168.1.20",
                "123-45-6789",
                "jo@example.org",
                "2024-02-29",
            ]
        );
    }

    #[test]
    fn heuristic_labels_name_the_category() {
        let m = RedactionMatcher::new(&RedactionRule::Heuristic {
            categories: vec![PiiCategory::Email, PiiCategory::Phone],
        })
        .unwrap();
        let found = m.find("call (555) 123-4567 or x@y.io");
        let rules: Vec<&str> = found.iter().map(|f| f.rule.as_str()).collect();
        assert_eq!(rules, ["heuristic:phone", "heuristic:email"]);
    }

    #[test]
    fn builtin_pattern_skips_validation() {
        let m = RedactionMatcher::new(&RedactionRule::Pattern {
            pattern: PatternSource::Builtin(PiiCategory::Ipv4),
        })
        .unwrap();
        assert_eq!(texts(&m, "300.1.1.1"), ["300.1.1.1"]);
        assert_eq!(m.label(), "pattern:ipv4");
    }

    #[test]
    fn area_rules_need_extent() {
        assert!(RedactionMatcher::new(&RedactionRule::area(0, Rect::new(0.0, 0.0, 0.0, 5.0))).is_err());
        let m = RedactionMatcher::new(&RedactionRule::area(2, Rect::new(1.0, 2.0, 3.0, 4.0))).unwrap();
        assert_eq!(m.area(), Some((2, Rect::new(1.0, 2.0, 3.0, 4.0))));
        assert!(m.find("anything").is_empty());
    }

    #[test]
    fn dates_accept_either_day_order() {
        assert!(valid_date("31/12/2024"));
        assert!(valid_date("12/31/2024"));
        assert!(!valid_date("31/31/2024"));
    }

    #[test]
    fn category_labels_round_trip() {
        for category in PiiCategory::ALL {
            assert_eq!(PiiCategory::from_label(category.label()), Some(category));
        }
    }
}
