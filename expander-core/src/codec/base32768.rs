//! Text-safe packing of bytes into 15-bit characters
//!
//! Each output character carries 15 bits. The main alphabet is 32768
//! contiguous-in-two-runs BMP letters:
//!
//! ```text
//! value 0x0000..0x6C00  →  U+3400..U+9FFF  (CJK Ext-A, Yijing, CJK Unified)
//! value 0x6C00..0x8000  →  U+AC00..U+BFFF  (Hangul syllables)
//! ```
//!
//! A trailing group with 7 or fewer data bits is written with the 128-letter
//! tail alphabet `U+0100..U+017F` (Latin Extended-A) instead. Padding is zero
//! bits and always shorter than one byte, so the decoder recovers the exact
//! length as `total_bits / 8` with no stored length.
//!
//! None of these code points is a quote, backslash, control character,
//! surrogate or byte-order mark.

use crate::error::{ExpanderError, Result};

const MAIN_BITS: u32 = 15;
const TAIL_BITS: u32 = 7;

const MAIN_FIRST_RUN: u32 = 0x3400;
const MAIN_FIRST_LEN: u32 = 0xA000 - 0x3400;
const MAIN_SECOND_RUN: u32 = 0xAC00;
const MAIN_SECOND_END: u32 = 0xAC00 + (1 << MAIN_BITS) - MAIN_FIRST_LEN;

const TAIL_FIRST: u32 = 0x0100;
const TAIL_END: u32 = TAIL_FIRST + (1 << TAIL_BITS);

fn main_char(value: u32) -> char {
    let code = if value < MAIN_FIRST_LEN {
        MAIN_FIRST_RUN + value
    } else {
        MAIN_SECOND_RUN + (value - MAIN_FIRST_LEN)
    };
    // Both runs sit inside the BMP, away from the surrogate range.
    char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
}

fn tail_char(value: u32) -> char {
    char::from_u32(TAIL_FIRST + value).unwrap_or(char::REPLACEMENT_CHARACTER)
}

enum Symbol {
    Main(u32),
    Tail(u32),
}

fn classify(c: char) -> Option<Symbol> {
    let code = c as u32;
    if (MAIN_FIRST_RUN..MAIN_FIRST_RUN + MAIN_FIRST_LEN).contains(&code) {
        Some(Symbol::Main(code - MAIN_FIRST_RUN))
    } else if (MAIN_SECOND_RUN..MAIN_SECOND_END).contains(&code) {
        Some(Symbol::Main(code - MAIN_SECOND_RUN + MAIN_FIRST_LEN))
    } else if (TAIL_FIRST..TAIL_END).contains(&code) {
        Some(Symbol::Tail(code - TAIL_FIRST))
    } else {
        None
    }
}

/// Number of characters `encode` produces for `len` bytes
pub fn encoded_len(len: usize) -> usize {
    let bits = len * 8;
    let full = bits / MAIN_BITS as usize;
    if bits % MAIN_BITS as usize == 0 {
        full
    } else {
        full + 1
    }
}

/// Pack bytes into the text-safe alphabet
pub fn encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(encoded_len(bytes.len()) * 3);
    let mut buffer: u32 = 0;
    let mut pending: u32 = 0;

    for &byte in bytes {
        buffer = (buffer << 8) | u32::from(byte);
        pending += 8;
        if pending >= MAIN_BITS {
            pending -= MAIN_BITS;
            out.push(main_char(buffer >> pending));
            buffer &= (1 << pending) - 1;
        }
    }

    if pending > 0 {
        if pending <= TAIL_BITS {
            out.push(tail_char(buffer << (TAIL_BITS - pending)));
        } else {
            out.push(main_char(buffer << (MAIN_BITS - pending)));
        }
    }

    out
}

/// Unpack text produced by [`encode`].
///
/// Fails with `CorruptStream` on characters outside both alphabets, a tail
/// character before the end, or a final group whose padding is not a
/// sub-byte run of zero bits.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    let count = text.chars().count();
    let mut out = Vec::with_capacity(count * 15 / 8);
    let mut buffer: u32 = 0;
    let mut pending: u32 = 0;
    let mut ends_with_tail = false;
    let mut chars = text.chars().enumerate().peekable();

    while let Some((position, c)) = chars.next() {
        let (value, width) = match classify(c) {
            Some(Symbol::Main(value)) => (value, MAIN_BITS),
            Some(Symbol::Tail(value)) => {
                if chars.peek().is_some() {
                    return Err(ExpanderError::CorruptStream(format!(
                        "tail character U+{:04X} at position {position} is not last",
                        c as u32
                    )));
                }
                ends_with_tail = true;
                (value, TAIL_BITS)
            }
            None => {
                return Err(ExpanderError::CorruptStream(format!(
                    "character U+{:04X} at position {position} is outside the alphabet",
                    c as u32
                )));
            }
        };

        buffer = (buffer << width) | value;
        pending += width;
        while pending >= 8 {
            pending -= 8;
            out.push((buffer >> pending) as u8);
            buffer &= (1 << pending) - 1;
        }
    }

    if buffer != 0 {
        return Err(ExpanderError::CorruptStream(format!(
            "final group has {pending} non-zero padding bits"
        )));
    }

    // A canonical stream picks the tail alphabet exactly when 1..=7 bits remain.
    let remainder = (out.len() * 8) % MAIN_BITS as usize;
    let expects_tail = remainder != 0 && remainder <= TAIL_BITS as usize;
    if ends_with_tail != expects_tail || encoded_len(out.len()) != count {
        return Err(ExpanderError::CorruptStream(
            "final group does not match the encoded length".to_string(),
        ));
    }

    Ok(out)
}
