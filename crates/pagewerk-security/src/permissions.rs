// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document permissions and encryption strength.
//
// A `PermissionSet` is the typed form of the `/P` entry of a standard
// security handler's encryption dictionary. Bit positions (1-based, as the
// PDF reference numbers them):
//
//   3  print                     9  fill form fields
//   4  modify contents          10  extract for accessibility
//   5  copy / extract text      11  assemble (insert, rotate, delete pages)
//   6  annotate                 12  high-quality print
//
// Bits 1-2 must be 0, bits 7-8 and 13-32 must be 1. Revision 2 handlers
// only understand bits 3-6 and treat 7-32 as reserved (all 1).

use serde::{Deserialize, Serialize};
use tracing::warn;

const BIT_PRINT: u32 = 1 << 2;
const BIT_MODIFY: u32 = 1 << 3;
const BIT_COPY: u32 = 1 << 4;
const BIT_ANNOTATE: u32 = 1 << 5;
const BIT_FILL_FORMS: u32 = 1 << 8;
const BIT_ACCESSIBILITY: u32 = 1 << 9;
const BIT_ASSEMBLE: u32 = 1 << 10;
const BIT_PRINT_HIGH_RES: u32 = 1 << 11;

/// Reserved bits that must be set for revision 3 and later.
const RESERVED_R3: u32 = 0xFFFF_F0C0;
/// Revision 2 has no extended bits, so 7-32 are all reserved.
const RESERVED_R2: u32 = 0xFFFF_FFC0;

/// Printing permission. Low-resolution printing never implies high-resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrintPermission {
    None,
    LowResolution,
    #[default]
    HighResolution,
}

/// What a user who opens the document with the user password may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionSet {
    pub printing: PrintPermission,
    pub modifying: bool,
    pub copying: bool,
    pub annotating: bool,
    pub form_filling: bool,
    /// Text extraction for screen readers. Allowed unless explicitly denied.
    pub content_accessibility: bool,
    pub document_assembly: bool,
}

impl Default for PermissionSet {
    fn default() -> Self {
        Self::allow_all()
    }
}

impl PermissionSet {
    pub fn allow_all() -> Self {
        Self {
            printing: PrintPermission::HighResolution,
            modifying: true,
            copying: true,
            annotating: true,
            form_filling: true,
            content_accessibility: true,
            document_assembly: true,
        }
    }

    /// Deny everything except accessibility extraction.
    pub fn restricted() -> Self {
        Self {
            printing: PrintPermission::None,
            modifying: false,
            copying: false,
            annotating: false,
            form_filling: false,
            content_accessibility: true,
            document_assembly: false,
        }
    }

    /// Encode as the signed 32-bit `/P` value for the given handler revision.
    pub fn to_p_value(&self, revision: u32) -> i32 {
        let mut bits = if revision >= 3 { RESERVED_R3 } else { RESERVED_R2 };

        match self.printing {
            PrintPermission::None => {}
            PrintPermission::LowResolution => {
                bits |= BIT_PRINT;
                if revision < 3 {
                    warn!("revision 2 cannot restrict print quality; low-resolution printing becomes full printing");
                }
            }
            PrintPermission::HighResolution => {
                bits |= BIT_PRINT;
                if revision >= 3 {
                    bits |= BIT_PRINT_HIGH_RES;
                }
            }
        }

        if self.modifying {
            bits |= BIT_MODIFY;
        }
        if self.copying {
            bits |= BIT_COPY;
        }
        if self.annotating {
            bits |= BIT_ANNOTATE;
        }

        if revision >= 3 {
            if self.form_filling {
                bits |= BIT_FILL_FORMS;
            }
            if self.content_accessibility {
                bits |= BIT_ACCESSIBILITY;
            }
            if self.document_assembly {
                bits |= BIT_ASSEMBLE;
            }
        }

        bits as i32
    }

    /// Decode a `/P` value.
    ///
    /// Revision 2 has no form, accessibility or assembly bits: form filling
    /// follows the annotate bit, assembly follows the modify bit and
    /// accessibility follows the copy bit, as revision 2 readers do.
    pub fn from_p_value(p: i32, revision: u32) -> Self {
        let bits = p as u32;
        let has = |bit: u32| bits & bit != 0;

        let printing = match (has(BIT_PRINT), revision >= 3 && !has(BIT_PRINT_HIGH_RES)) {
            (false, _) => PrintPermission::None,
            (true, true) => PrintPermission::LowResolution,
            (true, false) => PrintPermission::HighResolution,
        };

        if revision >= 3 {
            Self {
                printing,
                modifying: has(BIT_MODIFY),
                copying: has(BIT_COPY),
                annotating: has(BIT_ANNOTATE),
                form_filling: has(BIT_FILL_FORMS),
                content_accessibility: has(BIT_ACCESSIBILITY),
                document_assembly: has(BIT_ASSEMBLE),
            }
        } else {
            Self {
                printing,
                modifying: has(BIT_MODIFY),
                copying: has(BIT_COPY),
                annotating: has(BIT_ANNOTATE),
                form_filling: has(BIT_ANNOTATE),
                content_accessibility: has(BIT_COPY),
                document_assembly: has(BIT_MODIFY),
            }
        }
    }

    pub fn allows_high_res_printing(&self) -> bool {
        self.printing == PrintPermission::HighResolution
    }
}

/// Encryption strength offered by the Protect tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EncryptionLevel {
    /// RC4, 40-bit key (V1 / R2). Legacy readers only.
    Bits40,
    /// RC4, 128-bit key (V2 / R3).
    #[default]
    Bits128,
    /// AES-256 (V5 / R6).
    Bits256,
}

impl EncryptionLevel {
    /// The `/V` entry.
    pub fn version(self) -> u32 {
        match self {
            Self::Bits40 => 1,
            Self::Bits128 => 2,
            Self::Bits256 => 5,
        }
    }

    /// The `/R` entry.
    pub fn revision(self) -> u32 {
        match self {
            Self::Bits40 => 2,
            Self::Bits128 => 3,
            Self::Bits256 => 6,
        }
    }

    pub fn key_length_bytes(self) -> usize {
        match self {
            Self::Bits40 => 5,
            Self::Bits128 => 16,
            Self::Bits256 => 32,
        }
    }

    pub fn key_length_bits(self) -> u32 {
        self.key_length_bytes() as u32 * 8
    }

    pub fn is_aes(self) -> bool {
        matches!(self, Self::Bits256)
    }

    /// Minimum PDF header version a reader needs for this handler.
    pub fn minimum_pdf_version(self) -> &'static str {
        match self {
            Self::Bits40 => "1.3",
            Self::Bits128 => "1.4",
            Self::Bits256 => "2.0",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_all_sets_every_permission_bit() {
        let p = PermissionSet::allow_all().to_p_value(3) as u32;
        assert_eq!(p, 0xFFFF_FFFC);
    }

    #[test]
    fn restricted_keeps_accessibility_only() {
        let p = PermissionSet::restricted().to_p_value(3) as u32;
        assert_eq!(p, RESERVED_R3 | BIT_ACCESSIBILITY);
        assert_eq!(p & 0b11, 0, "bits 1-2 must be clear");
    }

    #[test]
    fn low_resolution_does_not_imply_high_resolution() {
        let perms = PermissionSet {
            printing: PrintPermission::LowResolution,
            ..PermissionSet::allow_all()
        };
        let p = perms.to_p_value(6) as u32;
        assert_ne!(p & BIT_PRINT, 0);
        assert_eq!(p & BIT_PRINT_HIGH_RES, 0);
        assert!(!PermissionSet::from_p_value(p as i32, 6).allows_high_res_printing());
    }

    #[test]
    fn revision_two_maps_low_res_to_print() {
        let perms = PermissionSet {
            printing: PrintPermission::LowResolution,
            ..PermissionSet::restricted()
        };
        let p = perms.to_p_value(2) as u32;
        assert_eq!(p, RESERVED_R2 | BIT_PRINT);
        assert_eq!(
            PermissionSet::from_p_value(p as i32, 2).printing,
            PrintPermission::HighResolution
        );
    }

    #[test]
    fn decode_inverts_encode_for_revision_three() {
        let perms = PermissionSet {
            printing: PrintPermission::LowResolution,
            modifying: false,
            copying: true,
            annotating: false,
            form_filling: true,
            content_accessibility: true,
            document_assembly: false,
        };
        assert_eq!(PermissionSet::from_p_value(perms.to_p_value(3), 3), perms);
    }

    #[test]
    fn levels_map_to_handler_versions() {
        assert_eq!(
            (EncryptionLevel::Bits40.version(), EncryptionLevel::Bits40.revision()),
            (1, 2)
        );
        assert_eq!(
            (EncryptionLevel::Bits128.version(), EncryptionLevel::Bits128.revision()),
            (2, 3)
        );
        assert_eq!(
            (EncryptionLevel::Bits256.version(), EncryptionLevel::Bits256.revision()),
            (5, 6)
        );
        assert_eq!(EncryptionLevel::Bits256.key_length_bits(), 256);
    }
}
