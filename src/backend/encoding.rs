//! Text decoding shared by the native reader and blob intake
//!
//! Recognises UTF-8 (with or without BOM) and BOM-marked UTF-16. Anything
//! else that is not valid UTF-8 is rejected rather than decoded lossily, so a
//! binary file can never silently replace the document.

use crate::error::DecodeError;

/// Detected encoding of a byte buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// UTF-8 without BOM
    #[default]
    Utf8,
    /// UTF-8 with BOM
    Utf8Bom,
    /// UTF-16 Little Endian with BOM
    Utf16Le,
    /// UTF-16 Big Endian with BOM
    Utf16Be,
}

/// Detect encoding from byte order marks, defaulting to UTF-8
pub fn detect_encoding(bytes: &[u8]) -> TextEncoding {
    match bytes {
        [0xEF, 0xBB, 0xBF, ..] => TextEncoding::Utf8Bom,
        [0xFF, 0xFE, ..] => TextEncoding::Utf16Le,
        [0xFE, 0xFF, ..] => TextEncoding::Utf16Be,
        _ => TextEncoding::Utf8,
    }
}

/// Decode bytes to a string, failing on anything that is not text
pub fn decode_text(bytes: &[u8]) -> Result<String, DecodeError> {
    match detect_encoding(bytes) {
        TextEncoding::Utf8 => decode_utf8(bytes),
        TextEncoding::Utf8Bom => decode_utf8(&bytes[3..]),
        TextEncoding::Utf16Le => decode_utf16(&bytes[2..], u16::from_le_bytes),
        TextEncoding::Utf16Be => decode_utf16(&bytes[2..], u16::from_be_bytes),
    }
}

fn decode_utf8(bytes: &[u8]) -> Result<String, DecodeError> {
    match std::str::from_utf8(bytes) {
        Ok(s) if !s.contains('\0') => Ok(s.to_string()),
        Ok(s) => Err(DecodeError::InvalidUtf8 {
            offset: s.find('\0').unwrap_or_default(),
        }),
        Err(e) => Err(DecodeError::InvalidUtf8 {
            offset: e.valid_up_to(),
        }),
    }
}

fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> Result<String, DecodeError> {
    if bytes.len() % 2 != 0 {
        return Err(DecodeError::InvalidUtf16);
    }
    let units = bytes.chunks_exact(2).map(|chunk| to_unit([chunk[0], chunk[1]]));
    char::decode_utf16(units)
        .collect::<Result<String, _>>()
        .map_err(|_| DecodeError::InvalidUtf16)
}
