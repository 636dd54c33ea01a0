//! The classic cscope "dicode" compressor: a two-character digram coder.
//!
//! Symbols stored in `cscope.out` are compressed using a fixed table of
//! frequent character pairs; each pair from `FIRST × SECOND` collapses to a
//! single byte in `0x80..=0xFF`, which never collides with 7-bit ASCII.
//! Kept isolated from the rest of the crate: these two functions have no
//! knowledge of files, lines, or the tag database — they operate purely on
//! strings whose characters represent single ISO-8859-1 bytes (see
//! [`crate::latin1`]).

use std::collections::HashMap;
use std::sync::LazyLock;

/// 16 most frequent first characters of a digram.
const FIRST: &[u8; 16] = b" teisaprnl(of)=c";
/// 8 most frequent second characters of a digram.
const SECOND: &[u8; 8] = b" tnerpla";

struct Tables {
    encode: HashMap<(char, char), u8>,
    decode: HashMap<u8, (char, char)>,
}

fn build_tables() -> Tables {
    let mut encode = HashMap::with_capacity(FIRST.len() * SECOND.len());
    let mut decode = HashMap::with_capacity(FIRST.len() * SECOND.len());

    for (i1, &c1) in FIRST.iter().enumerate() {
        for (i2, &c2) in SECOND.iter().enumerate() {
            // 128 codes total, spanning 0x80..=0xFF exactly.
            let code = (0x80 + i1 * 8 + i2) as u8;
            encode.insert((c1 as char, c2 as char), code);
            decode.insert(code, (c1 as char, c2 as char));
        }
    }

    Tables { encode, decode }
}

static TABLES: LazyLock<Tables> = LazyLock::new(build_tables);

/// Compress `input` by greedily replacing digram pairs with their coded
/// byte, scanning left to right. Strings shorter than two characters pass
/// through unchanged.
pub fn encode(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    if chars.len() < 2 {
        return input.to_string();
    }

    let mut out = String::with_capacity(chars.len());
    let mut i = 0;
    while i + 1 < chars.len() {
        match TABLES.encode.get(&(chars[i], chars[i + 1])) {
            Some(&code) => {
                out.push(code as char);
                i += 2;
            }
            None => {
                out.push(chars[i]);
                i += 1;
            }
        }
    }
    if i < chars.len() {
        out.push(chars[i]);
    }
    out
}

/// Expand every coded byte in `input` back to its two-character digram.
/// Characters outside `0x80..=0xFF`, or bytes not present in the table,
/// pass through unchanged.
pub fn decode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        let code = c as u32;
        let expanded = (0x80..=0xFF)
            .contains(&code)
            .then(|| TABLES.decode.get(&(code as u8)))
            .flatten();
        match expanded {
            Some(&(c1, c2)) => {
                out.push(c1);
                out.push(c2);
            }
            None => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn short_strings_pass_through() {
        assert_eq!(encode(""), "");
        assert_eq!(encode("a"), "a");
        assert_eq!(decode(""), "");
        assert_eq!(decode("a"), "a");
    }

    #[test]
    fn known_pair_compresses_to_one_char() {
        // 'a' is FIRST[5], 'r' is SECOND[6] -> single compressed char.
        let encoded = encode("ar");
        assert_eq!(encoded.chars().count(), 1);
        assert_eq!(decode(&encoded), "ar");
    }

    #[test]
    fn non_digram_pair_is_untouched() {
        // 'x' never appears in FIRST, 'y' never in SECOND.
        assert_eq!(encode("xy"), "xy");
    }

    proptest! {
        #[test]
        fn roundtrip_over_digram_alphabet(
            s in "[ teisaprnl(of)=ctnerpla]{0,40}"
        ) {
            prop_assert_eq!(decode(&encode(&s)), s);
        }

        #[test]
        fn decode_encode_are_total(s in ".{0,40}") {
            // Never panics, regardless of input.
            let _ = encode(&s);
            let _ = decode(&s);
        }
    }
}
