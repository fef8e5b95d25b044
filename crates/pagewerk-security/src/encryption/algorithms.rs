// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Key derivation for the standard security handler (ISO 32000-2, 7.6.4).
//
// Revisions 2 and 3 derive the file key from the user password with MD5 and
// RC4 (Algorithms 2-7). Revision 6 uses a random file key wrapped under
// SHA-2 based password hashes (Algorithms 2.A, 2.B, 8-10).

use md5::{Digest, Md5};
use sha2::{Sha256, Sha384, Sha512};

use pagewerk_core::error::Result;

use super::aes::aes128_cbc_encrypt_raw;
use super::rc4::rc4_crypt;

/// Password padding string (Algorithm 2, step a).
pub(crate) const PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

// -- Revisions 2 and 3 --------------------------------------------------------

/// Pad or truncate a password to exactly 32 bytes.
pub(crate) fn pad_password(password: &[u8]) -> [u8; 32] {
    let mut padded = PADDING;
    let len = password.len().min(32);
    padded[..len].copy_from_slice(&password[..len]);
    padded[len..].copy_from_slice(&PADDING[..32 - len]);
    padded
}

/// RC4 key derived from the owner password (Algorithm 3, steps a-d).
fn owner_rc4_key(owner_password: &[u8], revision: u32, key_len: usize) -> Vec<u8> {
    let mut hash = Md5::digest(pad_password(owner_password)).to_vec();
    if revision >= 3 {
        for _ in 0..50 {
            hash = Md5::digest(&hash[..key_len]).to_vec();
        }
    }
    hash.truncate(key_len);
    hash
}

/// Revision 3 applies RC4 twenty times with the key XORed by the round index.
fn rc4_rounds(key: &[u8], data: &[u8], rounds: impl Iterator<Item = u8>) -> Vec<u8> {
    let mut out = data.to_vec();
    for round in rounds {
        let round_key: Vec<u8> = key.iter().map(|b| b ^ round).collect();
        out = rc4_crypt(&round_key, &out);
    }
    out
}

/// The `/O` value (Algorithm 3).
pub(crate) fn owner_hash_rc4(
    owner_password: &[u8],
    user_password: &[u8],
    revision: u32,
    key_len: usize,
) -> Vec<u8> {
    let key = owner_rc4_key(owner_password, revision, key_len);
    let padded_user = pad_password(user_password);
    if revision >= 3 {
        rc4_rounds(&key, &padded_user, 0..=19)
    } else {
        rc4_crypt(&key, &padded_user)
    }
}

/// The file encryption key (Algorithm 2).
pub(crate) fn file_key_rc4(
    password: &[u8],
    owner_hash: &[u8],
    p: i32,
    file_id: &[u8],
    revision: u32,
    key_len: usize,
) -> Vec<u8> {
    let mut hasher = Md5::new();
    hasher.update(pad_password(password));
    hasher.update(owner_hash);
    hasher.update(p.to_le_bytes());
    hasher.update(file_id);
    let mut hash = hasher.finalize().to_vec();

    if revision >= 3 {
        for _ in 0..50 {
            hash = Md5::digest(&hash[..key_len]).to_vec();
        }
    }
    hash.truncate(key_len);
    hash
}

/// The `/U` value (Algorithm 4 for revision 2, Algorithm 5 for revision 3).
pub(crate) fn user_hash_rc4(file_key: &[u8], file_id: &[u8], revision: u32) -> Vec<u8> {
    if revision >= 3 {
        let mut hasher = Md5::new();
        hasher.update(PADDING);
        hasher.update(file_id);
        let seed = hasher.finalize().to_vec();
        let mut out = rc4_rounds(file_key, &seed, 0..=19);
        // 16 arbitrary bytes of padding
        out.extend_from_slice(&[0u8; 16]);
        out
    } else {
        rc4_crypt(file_key, &PADDING)
    }
}

/// Recover the padded user password from `/O` (Algorithm 7, step b).
pub(crate) fn user_password_from_owner(
    owner_password: &[u8],
    owner_hash: &[u8],
    revision: u32,
    key_len: usize,
) -> Vec<u8> {
    let key = owner_rc4_key(owner_password, revision, key_len);
    if revision >= 3 {
        rc4_rounds(&key, owner_hash, (0..=19).rev())
    } else {
        rc4_crypt(&key, owner_hash)
    }
}

// -- Revision 6 ---------------------------------------------------------------

/// Passwords are UTF-8, truncated to 127 bytes on a character boundary.
pub(crate) fn truncate_utf8_password(password: &[u8]) -> &[u8] {
    if password.len() <= 127 {
        return password;
    }
    let mut end = 127;
    while end > 0 && (password[end] & 0xC0) == 0x80 {
        end -= 1;
    }
    &password[..end]
}

/// Algorithm 2.B: the iterated SHA-2 hash used by revision 6.
///
/// `user_key` is the 48-byte `/U` value when hashing the owner password and
/// empty otherwise.
pub(crate) fn hash_r6(password: &[u8], salt: &[u8], user_key: &[u8]) -> Result<[u8; 32]> {
    let password = truncate_utf8_password(password);

    let mut hasher = Sha256::new();
    hasher.update(password);
    hasher.update(salt);
    hasher.update(user_key);
    let mut k: Vec<u8> = hasher.finalize().to_vec();

    let mut round: u32 = 0;
    loop {
        let mut block = Vec::with_capacity(password.len() + k.len() + user_key.len());
        block.extend_from_slice(password);
        block.extend_from_slice(&k);
        block.extend_from_slice(user_key);
        let k1 = block.repeat(64);

        let e = aes128_cbc_encrypt_raw(&k[..16], &k[16..32], &k1)?;

        // The first 16 bytes of E as a big-endian integer mod 3 equals the sum
        // of those bytes mod 3, since 256 = 1 (mod 3).
        let selector = e[..16].iter().map(|&b| u32::from(b)).sum::<u32>() % 3;
        k = match selector {
            0 => Sha256::digest(&e).to_vec(),
            1 => Sha384::digest(&e).to_vec(),
            _ => Sha512::digest(&e).to_vec(),
        };

        round += 1;
        let last = u32::from(e.last().copied().unwrap_or(0));
        if round >= 64 && last + 32 <= round {
            break;
        }
    }

    let mut out = [0u8; 32];
    out.copy_from_slice(&k[..32]);
    Ok(out)
}

/// Compare without early exit on the first differing byte.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
