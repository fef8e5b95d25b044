// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document integrity: SHA-256 fingerprints for audit records and tamper checks.

use pagewerk_core::error::PagewerkError;
use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of `data` and return it as a lowercase hex string.
///
/// Audit records identify documents (and redacted excerpts) by this digest
/// rather than by their content.
pub fn hash_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Verify that `data` matches the expected SHA-256 hex digest.
///
/// Comparison is case-insensitive on the hex digits.
pub fn verify_hash(data: &[u8], expected_hex: &str) -> Result<(), PagewerkError> {
    let actual = hash_bytes(data);
    if actual.eq_ignore_ascii_case(expected_hex.trim()) {
        Ok(())
    } else {
        Err(PagewerkError::IntegrityMismatch {
            expected: expected_hex.to_owned(),
            actual,
        })
    }
}
