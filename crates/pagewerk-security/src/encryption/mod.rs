// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Standard security handler: builds the `/Encrypt` dictionary for a chosen
// `EncryptionLevel` and encrypts individual strings and streams with their
// per-object keys.
//
// This module knows nothing about PDF object syntax. The document codec
// walks its objects and calls `encrypt_string` / `encrypt_stream` with each
// object's number and generation.

mod aes;
mod algorithms;
mod rc4;

use std::fmt;

use md5::{Digest, Md5};
use ring::rand::{SecureRandom, SystemRandom};
use tracing::{debug, instrument};

use pagewerk_core::error::{PagewerkError, Result};

use crate::permissions::{EncryptionLevel, PermissionSet};

const ZERO_IV: [u8; 16] = [0u8; 16];

/// Values of the `/Encrypt` dictionary for the standard security handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptDictionary {
    /// `/V`
    pub version: u32,
    /// `/R`
    pub revision: u32,
    /// `/Length` in bits.
    pub length_bits: u32,
    /// `/O`: 32 bytes (R2/R3) or 48 bytes (R6).
    pub owner_hash: Vec<u8>,
    /// `/U`: 32 bytes (R2/R3) or 48 bytes (R6).
    pub user_hash: Vec<u8>,
    /// `/OE` (R6 only).
    pub owner_key: Option<Vec<u8>>,
    /// `/UE` (R6 only).
    pub user_key: Option<Vec<u8>>,
    /// `/Perms` (R6 only).
    pub perms: Option<Vec<u8>>,
    /// `/P`
    pub p: i32,
    pub encrypt_metadata: bool,
}

impl EncryptDictionary {
    /// True when strings and streams use AES (crypt filter `/AESV3`).
    pub fn uses_aes(&self) -> bool {
        self.version >= 4
    }

    pub fn permissions(&self) -> PermissionSet {
        PermissionSet::from_p_value(self.p, self.revision)
    }

    fn key_len(&self) -> usize {
        (self.length_bits / 8) as usize
    }
}

/// Encrypts document objects under one file key.
pub struct SecurityHandler {
    level: EncryptionLevel,
    file_key: Vec<u8>,
    dictionary: EncryptDictionary,
}

impl fmt::Debug for SecurityHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityHandler")
            .field("level", &self.level)
            .field("dictionary", &self.dictionary)
            .finish_non_exhaustive()
    }
}

impl SecurityHandler {
    /// Derive keys and build the encryption dictionary.
    ///
    /// `user_password` may be empty (the document then opens without a
    /// prompt). An empty `owner_password` falls back to the user password.
    #[instrument(skip_all, fields(level = ?level))]
    pub fn new(
        user_password: &str,
        owner_password: &str,
        permissions: &PermissionSet,
        level: EncryptionLevel,
        file_id: &[u8],
    ) -> Result<Self> {
        let user = user_password.as_bytes();
        let owner = if owner_password.is_empty() {
            user
        } else {
            owner_password.as_bytes()
        };
        let revision = level.revision();
        let p = permissions.to_p_value(revision);

        let (file_key, dictionary) = if level.is_aes() {
            build_r6(user, owner, p)?
        } else {
            let key_len = level.key_length_bytes();
            let owner_hash = algorithms::owner_hash_rc4(owner, user, revision, key_len);
            let file_key =
                algorithms::file_key_rc4(user, &owner_hash, p, file_id, revision, key_len);
            let user_hash = algorithms::user_hash_rc4(&file_key, file_id, revision);
            let dictionary = EncryptDictionary {
                version: level.version(),
                revision,
                length_bits: level.key_length_bits(),
                owner_hash,
                user_hash,
                owner_key: None,
                user_key: None,
                perms: None,
                p,
                encrypt_metadata: true,
            };
            (file_key, dictionary)
        };

        debug!(p, revision, "security handler ready");
        Ok(Self {
            level,
            file_key,
            dictionary,
        })
    }

    /// Open an existing dictionary with either password.
    pub fn from_password(
        dictionary: &EncryptDictionary,
        password: &str,
        file_id: &[u8],
    ) -> Result<Self> {
        let level = match dictionary.revision {
            2 => EncryptionLevel::Bits40,
            3 => EncryptionLevel::Bits128,
            6 => EncryptionLevel::Bits256,
            other => {
                return Err(PagewerkError::Encryption(format!(
                    "unsupported security handler revision {other}"
                )));
            }
        };

        let file_key = authenticate_owner_password(dictionary, password.as_bytes(), file_id)
            .or_else(|| authenticate_user_password(dictionary, password.as_bytes(), file_id))
            .ok_or(PagewerkError::IncorrectPassword)?;

        if let Some(perms) = &dictionary.perms {
            verify_perms(perms, &file_key, dictionary.p)?;
        }

        Ok(Self {
            level,
            file_key,
            dictionary: dictionary.clone(),
        })
    }

    pub fn level(&self) -> EncryptionLevel {
        self.level
    }

    pub fn dictionary(&self) -> &EncryptDictionary {
        &self.dictionary
    }

    /// Encrypt a string belonging to object `(obj_num, generation)`.
    pub fn encrypt_string(&self, data: &[u8], obj_num: u32, generation: u16) -> Result<Vec<u8>> {
        self.encrypt(data, obj_num, generation)
    }

    /// Encrypt the (already filtered) data of a stream object.
    pub fn encrypt_stream(&self, data: &[u8], obj_num: u32, generation: u16) -> Result<Vec<u8>> {
        self.encrypt(data, obj_num, generation)
    }

    /// Decrypt a string or stream encrypted by this handler's file key.
    pub fn decrypt(&self, data: &[u8], obj_num: u32, generation: u16) -> Result<Vec<u8>> {
        if self.level.is_aes() {
            aes::aes256_decrypt_with_iv(&self.file_key, data)
        } else {
            Ok(rc4::rc4_crypt(&self.object_key(obj_num, generation), data))
        }
    }

    fn encrypt(&self, data: &[u8], obj_num: u32, generation: u16) -> Result<Vec<u8>> {
        if self.level.is_aes() {
            let iv = random_bytes(16)?;
            aes::aes256_encrypt_with_iv(&self.file_key, &iv, data)
        } else {
            Ok(rc4::rc4_crypt(&self.object_key(obj_num, generation), data))
        }
    }

    /// Algorithm 1: MD5 of the file key and the low bytes of the object
    /// number and generation, truncated to `n + 5` bytes (at most 16).
    fn object_key(&self, obj_num: u32, generation: u16) -> Vec<u8> {
        let mut hasher = Md5::new();
        hasher.update(&self.file_key);
        hasher.update(&obj_num.to_le_bytes()[..3]);
        hasher.update(generation.to_le_bytes());
        let hash = hasher.finalize();
        let len = (self.file_key.len() + 5).min(16);
        hash[..len].to_vec()
    }
}

/// Algorithm 8 (`/U`, `/UE`), Algorithm 9 (`/O`, `/OE`), Algorithm 10 (`/Perms`).
fn build_r6(user: &[u8], owner: &[u8], p: i32) -> Result<(Vec<u8>, EncryptDictionary)> {
    let file_key = random_bytes(32)?;

    let user_salts = random_bytes(16)?;
    let (user_validation, user_key_salt) = user_salts.split_at(8);
    let mut user_hash = algorithms::hash_r6(user, user_validation, &[])?.to_vec();
    user_hash.extend_from_slice(user_validation);
    user_hash.extend_from_slice(user_key_salt);
    let ue_key = algorithms::hash_r6(user, user_key_salt, &[])?;
    let user_key = aes::aes256_cbc_encrypt_raw(&ue_key, &ZERO_IV, &file_key)?;

    let owner_salts = random_bytes(16)?;
    let (owner_validation, owner_key_salt) = owner_salts.split_at(8);
    let mut owner_hash = algorithms::hash_r6(owner, owner_validation, &user_hash)?.to_vec();
    owner_hash.extend_from_slice(owner_validation);
    owner_hash.extend_from_slice(owner_key_salt);
    let oe_key = algorithms::hash_r6(owner, owner_key_salt, &user_hash)?;
    let owner_key = aes::aes256_cbc_encrypt_raw(&oe_key, &ZERO_IV, &file_key)?;

    let mut perms_block = [0u8; 16];
    perms_block[..4].copy_from_slice(&p.to_le_bytes());
    perms_block[4..8].copy_from_slice(&[0xFF; 4]);
    perms_block[8] = b'T';
    perms_block[9..12].copy_from_slice(b"adb");
    perms_block[12..].copy_from_slice(&random_bytes(4)?);
    let perms = aes::aes256_cbc_encrypt_raw(&file_key, &ZERO_IV, &perms_block)?;

    let dictionary = EncryptDictionary {
        version: 5,
        revision: 6,
        length_bits: 256,
        owner_hash,
        user_hash,
        owner_key: Some(owner_key),
        user_key: Some(user_key),
        perms: Some(perms),
        p,
        encrypt_metadata: true,
    };
    Ok((file_key, dictionary))
}

fn verify_perms(perms: &[u8], file_key: &[u8], p: i32) -> Result<()> {
    let block = aes::aes256_cbc_decrypt_raw(file_key, &ZERO_IV, perms)?;
    if block.len() < 12 || &block[9..12] != b"adb" || block[..4] != p.to_le_bytes() {
        return Err(PagewerkError::Encryption(
            "/Perms does not match /P".into(),
        ));
    }
    Ok(())
}

/// Check `password` as the user password. Returns the file key on success.
pub fn authenticate_user_password(
    dictionary: &EncryptDictionary,
    password: &[u8],
    file_id: &[u8],
) -> Option<Vec<u8>> {
    let d = dictionary;
    if d.revision >= 5 {
        let (u, user_key) = (d.user_hash.get(..48)?, d.user_key.as_ref()?);
        let hash = algorithms::hash_r6(password, &u[32..40], &[]).ok()?;
        if !algorithms::constant_time_eq(&hash, &u[..32]) {
            return None;
        }
        let ue_key = algorithms::hash_r6(password, &u[40..48], &[]).ok()?;
        return aes::aes256_cbc_decrypt_raw(&ue_key, &ZERO_IV, user_key).ok();
    }

    let key_len = d.key_len();
    let key = algorithms::file_key_rc4(password, &d.owner_hash, d.p, file_id, d.revision, key_len);
    let expected = algorithms::user_hash_rc4(&key, file_id, d.revision);
    let compared = if d.revision >= 3 { 16 } else { 32 };
    let stored = d.user_hash.get(..compared)?;
    algorithms::constant_time_eq(&expected[..compared], stored).then_some(key)
}

/// Check `password` as the owner password. Returns the file key on success.
pub fn authenticate_owner_password(
    dictionary: &EncryptDictionary,
    password: &[u8],
    file_id: &[u8],
) -> Option<Vec<u8>> {
    let d = dictionary;
    if d.revision >= 5 {
        let (o, u, owner_key) = (
            d.owner_hash.get(..48)?,
            d.user_hash.get(..48)?,
            d.owner_key.as_ref()?,
        );
        let hash = algorithms::hash_r6(password, &o[32..40], u).ok()?;
        if !algorithms::constant_time_eq(&hash, &o[..32]) {
            return None;
        }
        let oe_key = algorithms::hash_r6(password, &o[40..48], u).ok()?;
        return aes::aes256_cbc_decrypt_raw(&oe_key, &ZERO_IV, owner_key).ok();
    }

    let padded_user =
        algorithms::user_password_from_owner(password, &d.owner_hash, d.revision, d.key_len());
    authenticate_user_password(d, &padded_user, file_id)
}

/// Cryptographically secure random bytes.
pub fn random_bytes(len: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    SystemRandom::new()
        .fill(&mut buf)
        .map_err(|_| PagewerkError::Encryption("system random generator unavailable".into()))?;
    Ok(buf)
}

/// A random 32-character hex owner password, used when the caller supplies
/// only a user password.
pub fn generate_owner_password() -> Result<String> {
    Ok(hex::encode(random_bytes(16)?))
}

/// A random 16-byte file identifier for the trailer `/ID`.
pub fn generate_file_id() -> Result<Vec<u8>> {
    random_bytes(16)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::PrintPermission;

    const FILE_ID: &[u8] = b"0123456789abcdef";

    fn handler(level: EncryptionLevel, user: &str, owner: &str) -> SecurityHandler {
        SecurityHandler::new(user, owner, &PermissionSet::default(), level, FILE_ID).unwrap()
    }

    #[test]
    fn passwords_authenticate_at_every_level() {
        for level in [
            EncryptionLevel::Bits40,
            EncryptionLevel::Bits128,
            EncryptionLevel::Bits256,
        ] {
            let h = handler(level, "user-pw", "owner-pw");
            let dict = h.dictionary();
            assert!(authenticate_user_password(dict, b"user-pw", FILE_ID).is_some(), "{level:?}");
            assert!(authenticate_owner_password(dict, b"owner-pw", FILE_ID).is_some(), "{level:?}");
            assert!(authenticate_user_password(dict, b"wrong", FILE_ID).is_none(), "{level:?}");
            assert!(authenticate_owner_password(dict, b"user-pw", FILE_ID).is_none(), "{level:?}");
        }
    }

    #[test]
    fn both_passwords_recover_the_same_file_key() {
        for level in [EncryptionLevel::Bits128, EncryptionLevel::Bits256] {
            let h = handler(level, "u", "o");
            let via_user = authenticate_user_password(h.dictionary(), b"u", FILE_ID).unwrap();
            let via_owner = authenticate_owner_password(h.dictionary(), b"o", FILE_ID).unwrap();
            assert_eq!(via_user, via_owner);
            assert_eq!(via_user, h.file_key);
        }
    }

    #[test]
    fn empty_user_password_opens_without_prompt() {
        let owner = generate_owner_password().unwrap();
        let h = handler(EncryptionLevel::Bits256, "", &owner);
        assert!(authenticate_user_password(h.dictionary(), b"", FILE_ID).is_some());
        assert!(authenticate_owner_password(h.dictionary(), b"", FILE_ID).is_none());
    }

    #[test]
    fn strings_round_trip_through_object_keys() {
        for level in [
            EncryptionLevel::Bits40,
            EncryptionLevel::Bits128,
            EncryptionLevel::Bits256,
        ] {
            let h = handler(level, "a", "b");
            let sealed = h.encrypt_string(b"Confidential", 12, 0).unwrap();
            assert_ne!(sealed, b"Confidential");
            assert_eq!(h.decrypt(&sealed, 12, 0).unwrap(), b"Confidential");
        }
    }

    #[test]
    fn object_keys_differ_per_object() {
        let h = handler(EncryptionLevel::Bits40, "a", "b");
        assert_eq!(h.object_key(1, 0).len(), 10);
        assert_ne!(h.object_key(1, 0), h.object_key(2, 0));
        assert_ne!(h.object_key(1, 0), h.object_key(1, 1));
    }

    #[test]
    fn reopening_checks_perms() {
        let perms = PermissionSet {
            printing: PrintPermission::None,
            ..PermissionSet::restricted()
        };
        let h = SecurityHandler::new("", "owner", &perms, EncryptionLevel::Bits256, FILE_ID).unwrap();
        let reopened = SecurityHandler::from_password(h.dictionary(), "", FILE_ID).unwrap();
        assert_eq!(reopened.dictionary().permissions().printing, PrintPermission::None);

        let mut tampered = h.dictionary().clone();
        tampered.p = PermissionSet::allow_all().to_p_value(6);
        assert!(SecurityHandler::from_password(&tampered, "owner", FILE_ID).is_err());
    }

    #[test]
    fn generated_owner_passwords_are_random_hex() {
        let a = generate_owner_password().unwrap();
        let b = generate_owner_password().unwrap();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
