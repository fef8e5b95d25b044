// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// AES-CBC helpers for the revision 6 security handler.
//
// Object data is padded with PKCS#7 and prefixed with its IV. Key wrapping
// (`/UE`, `/OE`, `/Perms`) and the Algorithm 2.B hash use unpadded CBC on
// block-aligned input.

use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::{Aes128, Aes256};

use pagewerk_core::error::{PagewerkError, Result};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

const BLOCK: usize = 16;

fn check_lengths(key: &[u8], key_len: usize, iv: &[u8]) -> Result<()> {
    if key.len() != key_len {
        return Err(PagewerkError::Encryption(format!(
            "AES key must be {key_len} bytes, got {}",
            key.len()
        )));
    }
    if iv.len() != BLOCK {
        return Err(PagewerkError::Encryption(format!(
            "IV must be {BLOCK} bytes, got {}",
            iv.len()
        )));
    }
    Ok(())
}

fn check_aligned(data: &[u8]) -> Result<()> {
    if data.len() % BLOCK != 0 {
        return Err(PagewerkError::Encryption(format!(
            "unpadded AES input must be a multiple of {BLOCK} bytes, got {}",
            data.len()
        )));
    }
    Ok(())
}

/// AES-128-CBC over block-aligned data, no padding.
pub(crate) fn aes128_cbc_encrypt_raw(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    check_lengths(key, 16, iv)?;
    check_aligned(data)?;
    let mut buf = data.to_vec();
    let len = buf.len();
    Aes128CbcEnc::new(key.into(), iv.into())
        .encrypt_padded_mut::<NoPadding>(&mut buf, len)
        .map_err(|_| PagewerkError::Encryption("AES-128 encryption failed".into()))?;
    Ok(buf)
}

/// AES-256-CBC over block-aligned data, no padding.
pub(crate) fn aes256_cbc_encrypt_raw(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    check_lengths(key, 32, iv)?;
    check_aligned(data)?;
    let mut buf = data.to_vec();
    let len = buf.len();
    Aes256CbcEnc::new(key.into(), iv.into())
        .encrypt_padded_mut::<NoPadding>(&mut buf, len)
        .map_err(|_| PagewerkError::Encryption("AES-256 encryption failed".into()))?;
    Ok(buf)
}

pub(crate) fn aes256_cbc_decrypt_raw(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    check_lengths(key, 32, iv)?;
    check_aligned(data)?;
    let mut buf = data.to_vec();
    let plain = Aes256CbcDec::new(key.into(), iv.into())
        .decrypt_padded_mut::<NoPadding>(&mut buf)
        .map_err(|_| PagewerkError::Encryption("AES-256 decryption failed".into()))?;
    Ok(plain.to_vec())
}

/// AES-256-CBC with PKCS#7 padding; the IV is prepended to the output.
pub(crate) fn aes256_encrypt_with_iv(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let pad = BLOCK - data.len() % BLOCK;
    let mut padded = Vec::with_capacity(data.len() + pad);
    padded.extend_from_slice(data);
    padded.extend(std::iter::repeat_n(pad as u8, pad));

    let cipher = aes256_cbc_encrypt_raw(key, iv, &padded)?;
    let mut out = Vec::with_capacity(BLOCK + cipher.len());
    out.extend_from_slice(iv);
    out.extend(cipher);
    Ok(out)
}

/// Inverse of [`aes256_encrypt_with_iv`].
pub(crate) fn aes256_decrypt_with_iv(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < 2 * BLOCK {
        return Err(PagewerkError::Encryption(
            "AES ciphertext shorter than IV plus one block".into(),
        ));
    }
    let (iv, body) = data.split_at(BLOCK);
    let mut plain = aes256_cbc_decrypt_raw(key, iv, body)?;

    let pad = plain.last().copied().unwrap_or(0) as usize;
    if pad == 0 || pad > BLOCK || plain[plain.len() - pad..].iter().any(|&b| b as usize != pad) {
        return Err(PagewerkError::Encryption("invalid PKCS#7 padding".into()));
    }
    plain.truncate(plain.len() - pad);
    Ok(plain)
}
