// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagewerk-security — permissions, PDF encryption, integrity fingerprints,
// and the redaction audit log.
//
// Nothing here depends on the PDF object model: the document crate feeds
// bytes in and writes the resulting dictionary values out.

pub mod audit;
pub mod encryption;
pub mod integrity;
pub mod permissions;

pub use audit::{AuditLog, RedactionAuditEntry, StoredAuditRecord};
pub use encryption::{
    EncryptDictionary, SecurityHandler, authenticate_owner_password, authenticate_user_password,
    generate_file_id, generate_owner_password,
};
pub use integrity::{hash_bytes, verify_hash};
pub use permissions::{EncryptionLevel, PermissionSet, PrintPermission};
