//! Synchsafe integers and the unsynchronisation escape.

use crate::core::io::BufStream;
use std::io;

/// Largest value a 28-bit synchsafe integer can hold.
pub(crate) const U28_MAX: u32 = 0x0FFF_FFFF;

/// Decode four synchsafe bytes, ignoring the high bit of each byte.
pub fn to_u28(raw: [u8; 4]) -> u32 {
    raw.iter()
        .fold(0, |sum, &byte| (sum << 7) | u32::from(byte & 0x7F))
}

/// Encode the low 28 bits of `num` into four synchsafe bytes.
pub fn from_u28(num: u32) -> [u8; 4] {
    debug_assert!(num <= U28_MAX, "{} does not fit in a synchsafe integer", num);

    let num = num & U28_MAX;

    [
        ((num >> 21) & 0x7F) as u8,
        ((num >> 14) & 0x7F) as u8,
        ((num >> 7) & 0x7F) as u8,
        (num & 0x7F) as u8,
    ]
}

pub(crate) fn read_u28(stream: &mut BufStream) -> io::Result<u32> {
    Ok(to_u28(stream.read_array()?))
}

/// Undo the unsynchronisation escape by dropping every `0x00` that follows an `0xFF`.
pub fn decode(src: &[u8]) -> Vec<u8> {
    let mut dest = Vec::with_capacity(src.len());
    let mut last = 0;

    for &byte in src {
        if !(last == 0xFF && byte == 0x00) {
            dest.push(byte);
        }

        // An escaped 0xFF 0x00 0x00 must keep its second zero, so the zero we skip
        // cannot start a new escape.
        last = if last == 0xFF && byte == 0x00 { 0x00 } else { byte };
    }

    dest
}

/// Apply the unsynchronisation escape, inserting a `0x00` after every `0xFF` that is
/// followed by either `0x00` or a byte of `0xE0` or above.
pub fn encode(src: &[u8]) -> Vec<u8> {
    let mut dest = Vec::with_capacity(src.len() + src.len() / 8);

    for (i, &byte) in src.iter().enumerate() {
        dest.push(byte);

        if byte == 0xFF {
            if let Some(&next) = src.get(i + 1) {
                if next == 0x00 || next >= 0xE0 {
                    dest.push(0x00);
                }
            }
        }
    }

    dest
}
