// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// lopdf-backed codec: bytes to `Document` and back, plus the content-stream
// scanner used by redaction and blank-page detection.

pub mod content;
pub(crate) mod reader;
pub mod writer;

use lopdf::{Dictionary, Object, StringFormat};

/// Follow references until a direct object is reached.
pub(crate) fn resolve<'a>(doc: &'a lopdf::Document, object: &'a Object) -> Option<&'a Object> {
    let mut current = object;
    // Reference chains are never legitimately long.
    for _ in 0..16 {
        match current {
            Object::Reference(id) => current = doc.get_object(*id).ok()?,
            direct => return Some(direct),
        }
    }
    None
}

pub(crate) fn is_page(dict: &Dictionary) -> bool {
    dict.get(b"Type")
        .and_then(Object::as_name)
        .is_ok_and(|name| name == b"Page")
}

pub(crate) fn number(object: &Object) -> Option<f32> {
    object.as_float().ok()
}

/// Decode a PDF text string: UTF-16BE with a byte-order mark, otherwise
/// PDFDocEncoding (approximated as Latin-1).
pub(crate) fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}

/// Encode a text string, using UTF-16BE only when Latin-1 cannot hold it.
pub(crate) fn encode_text_string(text: &str) -> Object {
    if text.chars().all(|c| (c as u32) < 0x100) {
        let bytes = text.chars().map(|c| c as u8).collect();
        Object::String(bytes, StringFormat::Literal)
    } else {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Object::String(bytes, StringFormat::Hexadecimal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_strings_round_trip() {
        for text in ["Quarterly report", "Café", "Отчёт"] {
            let Object::String(bytes, _) = encode_text_string(text) else {
                panic!("expected a string object");
            };
            assert_eq!(decode_text_string(&bytes), text);
        }
    }

    #[test]
    fn non_latin_text_uses_utf16() {
        let Object::String(bytes, format) = encode_text_string("日本") else {
            panic!("expected a string object");
        };
        assert_eq!(&bytes[..2], &[0xFE, 0xFF]);
        assert!(matches!(format, StringFormat::Hexadecimal));
    }
}
