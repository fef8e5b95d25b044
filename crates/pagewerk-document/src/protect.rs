// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Protect: attach password encryption and permissions to a document.
//
// Nothing is encrypted here. The configuration rides on the document and the
// writer encrypts every string and stream when the document is serialized.

use pagewerk_core::error::{PagewerkError, Result};
use pagewerk_security::{EncryptionLevel, PermissionSet, generate_owner_password};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::model::{Document, SecurityConfig};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtectOptions {
    /// Required to open the document. `None` lets anyone open it.
    pub user_password: Option<String>,
    /// Grants full access. Generated when only a user password is given.
    pub owner_password: Option<String>,
    pub permissions: PermissionSet,
    pub level: EncryptionLevel,
}

#[instrument(skip_all, fields(level = ?options.level))]
pub fn protect(doc: &Document, options: &ProtectOptions) -> Result<Document> {
    let non_empty = |p: &Option<String>| p.as_deref().filter(|p| !p.is_empty()).map(str::to_owned);
    let user = non_empty(&options.user_password);
    let owner = non_empty(&options.owner_password);

    if user.is_none() && owner.is_none() {
        return Err(PagewerkError::NoPasswordSupplied);
    }

    let owner_password = match owner {
        Some(owner) => owner,
        None => {
            info!("no owner password supplied, generating one");
            generate_owner_password()?
        }
    };
    let user_password = user.unwrap_or_default();
    if user_password == owner_password {
        warn!("user and owner passwords are identical; permissions will not be enforced");
    }

    let mut protected = doc.clone();
    protected.set_security(SecurityConfig {
        user_password,
        owner_password,
        permissions: options.permissions,
        level: options.level,
    });
    info!(
        pages = protected.page_count(),
        printing = ?options.permissions.printing,
        high_res_print = options.permissions.allows_high_res_printing(),
        "document protected"
    );
    Ok(protected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{load, sample_pdf};
    use pagewerk_core::config::EngineConfig;
    use pagewerk_security::{PrintPermission, authenticate_owner_password, authenticate_user_password};

    fn options(user: Option<&str>, owner: Option<&str>) -> ProtectOptions {
        ProtectOptions {
            user_password: user.map(str::to_owned),
            owner_password: owner.map(str::to_owned),
            ..ProtectOptions::default()
        }
    }

    #[test]
    fn a_password_is_required() {
        let doc = load(&sample_pdf(1));
        assert!(matches!(
            protect(&doc, &options(None, None)),
            Err(PagewerkError::NoPasswordSupplied)
        ));
        assert!(matches!(
            protect(&doc, &options(Some(""), Some(""))),
            Err(PagewerkError::NoPasswordSupplied)
        ));
    }

    #[test]
    fn owner_password_is_generated_when_missing() {
        let doc = load(&sample_pdf(1));
        let out = protect(&doc, &options(Some("open"), None)).unwrap();
        let security = out.security().unwrap();
        assert_eq!(security.user_password, "open");
        assert!(security.owner_password.len() >= 16);
        assert_ne!(security.owner_password, "open");
        assert!(doc.security().is_none());
    }

    #[test]
    fn owner_only_leaves_the_document_openable() {
        let doc = load(&sample_pdf(1));
        let out = protect(&doc, &options(None, Some("admin"))).unwrap();
        let saved = out.save(&EngineConfig::default()).unwrap();
        let report = saved.encryption.unwrap();
        assert!(authenticate_user_password(&report.dictionary, b"", &report.file_id).is_some());
        assert!(authenticate_owner_password(&report.dictionary, b"admin", &report.file_id).is_some());
    }

    #[test]
    fn permissions_are_recorded_in_the_output() {
        let doc = load(&sample_pdf(2));
        let mut opts = options(Some("u"), Some("o"));
        opts.permissions = PermissionSet {
            printing: PrintPermission::LowResolution,
            copying: false,
            ..PermissionSet::allow_all()
        };
        let report = protect(&doc, &opts)
            .unwrap()
            .save(&EngineConfig::default())
            .unwrap()
            .encryption
            .unwrap();
        let stored = report.dictionary.permissions();
        assert_eq!(stored.printing, PrintPermission::LowResolution);
        assert!(!stored.copying);
        assert!(stored.modifying);
        assert_eq!(report.dictionary.revision, 3);
    }

    #[test]
    fn aes_256_raises_the_header_version() {
        let doc = load(&sample_pdf(1));
        let mut opts = options(Some("u"), Some("o"));
        opts.level = EncryptionLevel::Bits256;
        let saved = protect(&doc, &opts).unwrap().save(&EngineConfig::default()).unwrap();
        assert!(saved.bytes.starts_with(b"%PDF-2.0"));
        assert!(saved.encryption.unwrap().dictionary.uses_aes());
    }
}
