// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Pagewerk.

use thiserror::Error;

/// Failures of the page-range grammar (`"1-3,5"`, `"odd"`, ...).
///
/// Every variant carries the offending token or page number so the UI can
/// point the user at exactly what to fix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid token {token:?}")]
    InvalidToken { token: String },

    #[error("invalid range {token:?}: start page is after end page")]
    InvalidRange { token: String },

    #[error("page numbers start at 1, got {token:?}")]
    ZeroPage { token: String },

    #[error("keywords cannot be combined with page numbers (found {token:?})")]
    MixedSyntax { token: String },

    #[error("page {page} is out of bounds (document has {page_count} pages)")]
    OutOfBounds { page: u32, page_count: u32 },
}

/// Top-level error type for all Pagewerk operations.
#[derive(Debug, Error)]
pub enum PagewerkError {
    // -- Input validation --
    #[error("invalid page range: {0}")]
    Parse(#[from] ParseError),

    /// `page` is 1-based, as shown to the user.
    #[error("page {page} out of bounds (document has {total} pages)")]
    OutOfBounds { page: u32, total: u32 },

    #[error("selection matches no pages")]
    EmptySelection,

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("invalid redaction pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("input too large: {size} bytes (maximum {max} bytes)")]
    InputTooLarge { size: u64, max: u64 },

    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("PDF is password protected")]
    PasswordRequired,

    #[error("incorrect password")]
    IncorrectPassword,

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Security errors --
    #[error("no user or owner password supplied")]
    NoPasswordSupplied,

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },

    // -- Storage / persistence --
    #[error("database error: {0}")]
    Database(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Job control --
    #[error("operation cancelled")]
    Cancelled,
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PagewerkError>;
