//! ISO-8859-1 decoding for `cscope.out`.
//!
//! `cscope.out` is 8-bit text: every byte value is meaningful, including
//! the `0x80..=0xFF` range used by the digram coder. ISO-8859-1 maps each
//! byte to the Unicode scalar value of the same ordinal, so the conversion
//! is total, lossless, and trivially invertible — unlike UTF-8 decoding,
//! it never rejects a byte string.

/// Decode raw bytes as ISO-8859-1 into a `String` (one `char` per byte).
pub fn decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Encode a string of ISO-8859-1-range characters back to bytes.
///
/// Characters outside `0x00..=0xFF` are not representable and are replaced
/// with `?` (`0x3F`); this only happens for strings that never passed
/// through [`decode`] in the first place.
pub fn encode(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| u32::try_from(c).ok().and_then(|n| u8::try_from(n).ok()).unwrap_or(b'?'))
        .collect()
}
