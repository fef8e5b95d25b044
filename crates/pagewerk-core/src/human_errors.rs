// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the toolbox UI and CLI.
//
// Every engine error is mapped to a plain English message with a concrete
// suggestion. Severity drives how the front end presents it.

use crate::error::{PagewerkError, ParseError};

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Nothing is wrong with the input; trying again may work.
    Transient,
    /// The user must change something (fix a range, enter a password).
    ActionRequired,
    /// The input itself is unusable (damaged PDF, unsupported image).
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether repeating the same request could succeed.
    pub retriable: bool,
    pub severity: Severity,
}

impl HumanError {
    fn action(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: suggestion.into(),
            retriable: false,
            severity: Severity::ActionRequired,
        }
    }

    fn permanent(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: suggestion.into(),
            retriable: false,
            severity: Severity::Permanent,
        }
    }

    fn transient(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: suggestion.into(),
            retriable: true,
            severity: Severity::Transient,
        }
    }
}

/// Convert a `PagewerkError` into a `HumanError`.
pub fn humanize_error(err: &PagewerkError) -> HumanError {
    match err {
        // -- Input validation --
        PagewerkError::Parse(parse) => humanize_parse_error(parse),

        PagewerkError::OutOfBounds { page, total } => HumanError::action(
            format!("Page {page} doesn't exist."),
            format!("This document has {total} pages. Pick page numbers from 1 to {total}."),
        ),

        PagewerkError::EmptySelection => HumanError::action(
            "No pages would be left.",
            "Your selection leaves the result empty. Keep at least one page.",
        ),

        PagewerkError::InvalidOption(detail) => HumanError::action(
            "One of the settings isn't valid.",
            format!("Check the settings and try again. ({detail})"),
        ),

        PagewerkError::InvalidPattern { pattern, reason } => HumanError::action(
            "The search pattern couldn't be understood.",
            format!("Check the pattern {pattern:?} for typos. ({reason})"),
        ),

        PagewerkError::InputTooLarge { max, .. } => HumanError::permanent(
            "This file is too large.",
            format!(
                "Files up to {} MB are supported. Try splitting it on another device first.",
                max / (1024 * 1024)
            ),
        ),

        // -- Document errors --
        PagewerkError::PdfError(_) => HumanError::permanent(
            "There's a problem with this PDF file.",
            "The file may be damaged. Try opening it in a PDF viewer to check it works, or try a different file.",
        ),

        PagewerkError::PasswordRequired => HumanError::action(
            "This PDF is password protected.",
            "Enter the document's password to open it.",
        ),

        PagewerkError::IncorrectPassword => HumanError::action(
            "That password didn't work.",
            "Check the password (passwords are case sensitive) and try again.",
        ),

        PagewerkError::ImageError(_) => HumanError::permanent(
            "There's a problem with this image.",
            "The image may be damaged or in an unusual format. Try saving it as a PNG or JPEG first.",
        ),

        // -- Security errors --
        PagewerkError::NoPasswordSupplied => HumanError::action(
            "No password was given.",
            "Enter a password to open the document, a permissions password, or both.",
        ),

        PagewerkError::Encryption(_) => HumanError::permanent(
            "The document couldn't be protected.",
            "Try again with a different encryption level.",
        ),

        PagewerkError::IntegrityMismatch { .. } => HumanError::permanent(
            "This file has been changed since it was stored.",
            "The stored copy doesn't match the original. Load the file again from the original source.",
        ),

        // -- Storage --
        PagewerkError::Database(_) => HumanError::transient(
            "The audit log couldn't be written.",
            "Try again. If this keeps happening, check that there is free disk space.",
        ),

        PagewerkError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError::action(
                "The file couldn't be found.",
                "It may have been moved or deleted. Try choosing the file again.",
            ),
            std::io::ErrorKind::PermissionDenied => HumanError::action(
                "There's no permission to read or write that file.",
                "Check the file permissions, or copy the file to a different location first.",
            ),
            _ => HumanError::transient(
                "There was a problem reading or writing a file.",
                "Try again. If this keeps happening, your storage may be full.",
            ),
        },

        PagewerkError::Serialization(_) => HumanError::action(
            "The settings file couldn't be read.",
            "Check the configuration file is valid JSON.",
        ),

        // -- Job control --
        PagewerkError::Cancelled => HumanError::transient(
            "The operation was cancelled.",
            "Nothing was changed. Start the operation again when you're ready.",
        ),
    }
}

fn humanize_parse_error(err: &ParseError) -> HumanError {
    match err {
        ParseError::InvalidToken { token } => HumanError::action(
            "The page list couldn't be understood.",
            format!("{token:?} isn't a page number or range. Use something like 1-3,5,8-10."),
        ),
        ParseError::InvalidRange { token } => HumanError::action(
            "A page range is backwards.",
            format!("In {token:?} the first page comes after the last. Write it lowest first."),
        ),
        ParseError::ZeroPage { token } => HumanError::action(
            "Page numbers start at 1.",
            format!("{token:?} uses page 0. The first page is page 1."),
        ),
        ParseError::MixedSyntax { token } => HumanError::action(
            "Words and page numbers can't be mixed.",
            format!("Use either a word like \"odd\" or page numbers, not both (found {token:?})."),
        ),
        ParseError::OutOfBounds { page, page_count } => HumanError::action(
            format!("Page {page} doesn't exist."),
            format!("This document has {page_count} pages."),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_password_is_action_required() {
        let human = humanize_error(&PagewerkError::IncorrectPassword);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(!human.retriable);
    }

    #[test]
    fn damaged_pdf_is_permanent() {
        let human = humanize_error(&PagewerkError::PdfError("bad xref".into()));
        assert_eq!(human.severity, Severity::Permanent);
    }

    #[test]
    fn parse_errors_name_the_token() {
        let err = PagewerkError::Parse(ParseError::InvalidToken { token: "abc".into() });
        let human = humanize_error(&err);
        assert!(human.suggestion.contains("abc"));
    }

    #[test]
    fn cancellation_is_retriable() {
        let human = humanize_error(&PagewerkError::Cancelled);
        assert!(human.retriable);
    }
}
