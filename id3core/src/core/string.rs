//! Tag string handling.

use crate::core::io::BufStream;
use log::warn;

/// The text encodings a tag string can be stored in.
///
/// Only [`Latin1`](Encoding::Latin1) and [`Utf16`](Encoding::Utf16) exist in ID3v2.3. The
/// other two are remapped to [`Utf16`](Encoding::Utf16) when an ID3v2.3 tag is written.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Encoding {
    /// ISO-8859-1. Characters outside of it are written as `?`.
    Latin1,
    /// UTF-16 with a byte order mark. Written as `FF FE` followed by little-endian data.
    Utf16,
    /// UTF-16BE without a byte order mark. ID3v2.4 only.
    Utf16Be,
    /// UTF-8. ID3v2.4 only.
    Utf8,
}

impl Encoding {
    /// Width of the NUL terminator for this encoding.
    pub(crate) fn nul_size(&self) -> usize {
        match self {
            Self::Latin1 | Self::Utf8 => 1,
            Self::Utf16 | Self::Utf16Be => 2,
        }
    }

    pub(crate) fn nul(&self) -> &'static [u8] {
        match self.nul_size() {
            1 => &[0],
            _ => &[0, 0],
        }
    }
}

impl Default for Encoding {
    fn default() -> Self {
        Self::Utf8
    }
}

/// Consumes the rest of the stream as a single string.
pub(crate) fn read(encoding: Encoding, stream: &mut BufStream) -> String {
    decode(encoding, stream.take_rest())
}

/// Consumes the stream up to and including a terminator of the correct width, returning
/// the string before it.
pub(crate) fn read_terminated(encoding: Encoding, stream: &mut BufStream) -> String {
    decode(encoding, stream.search(encoding.nul()))
}

pub(crate) fn render(encoding: Encoding, string: &str) -> Vec<u8> {
    match encoding {
        Encoding::Latin1 => encode_latin1(string),
        Encoding::Utf16 => encode_utf16(string),
        Encoding::Utf16Be => encode_utf16be(string),
        Encoding::Utf8 => string.as_bytes().to_vec(),
    }
}

pub(crate) fn render_terminated(encoding: Encoding, string: &str) -> Vec<u8> {
    let mut result = render(encoding, string);
    result.extend(encoding.nul());
    result
}

/// Whether every character of `string` survives a round trip through Latin1.
pub(crate) fn is_latin1(string: &str) -> bool {
    string.chars().all(|ch| u32::from(ch) <= 0xFF)
}

pub(crate) fn decode(encoding: Encoding, data: &[u8]) -> String {
    // Plenty of writers terminate strings that don't need to be, so trailing
    // terminators are always stripped.
    let mut data = data;

    while let Some(stripped) = data.strip_suffix(encoding.nul()) {
        data = stripped;
    }

    match encoding {
        Encoding::Latin1 => decode_latin1(data),
        Encoding::Utf16 => decode_utf16(data),
        Encoding::Utf16Be => decode_utf16be(data),
        Encoding::Utf8 => String::from_utf8_lossy(data).into_owned(),
    }
}

fn decode_latin1(data: &[u8]) -> String {
    // Latin1 code points line up with the first 256 unicode code points.
    data.iter().map(|&byte| char::from(byte)).collect()
}

fn decode_utf16(data: &[u8]) -> String {
    match data {
        [0xFF, 0xFE, rest @ ..] => decode_utf16le(rest),
        [0xFE, 0xFF, rest @ ..] => decode_utf16be(rest),
        [] => String::new(),
        _ => {
            warn!("could not determine UTF-16 BOM, defaulting to UTF-16BE");
            decode_utf16be(data)
        }
    }
}

fn decode_utf16be(data: &[u8]) -> String {
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();

    String::from_utf16_lossy(&units)
}

fn decode_utf16le(data: &[u8]) -> String {
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    String::from_utf16_lossy(&units)
}

fn encode_latin1(string: &str) -> Vec<u8> {
    string
        .chars()
        .map(|ch| if u32::from(ch) > 0xFF { b'?' } else { ch as u8 })
        .collect()
}

fn encode_utf16(string: &str) -> Vec<u8> {
    let mut result = vec![0xFF, 0xFE];
    result.extend(string.encode_utf16().flat_map(|cp| cp.to_le_bytes()));
    result
}

fn encode_utf16be(string: &str) -> Vec<u8> {
    string
        .encode_utf16()
        .flat_map(|cp| cp.to_be_bytes())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const STR_LATIN1: &str = "Lîke â while loop wïth nø escapê";
    const STR_UNICODE: &str = "║ Lîke â 𝕨𝕙𝕚le l𝒐𝒐p wïth nø escapê ║";

    const DATA_LATIN1: &[u8] = b"L\xEEke \xE2 while loop w\xEFth n\xF8 escap\xEA";
    const DATA_LATIN1_LOSSY: &[u8] = b"? L\xEEke \xE2 ???le l??p w\xEFth n\xF8 escap\xEA ?";

    const DATA_UTF16: &[u8] = b"\xFF\xFE\x51\x25\x20\x00\x4c\x00\xee\x00\x6b\x00\x65\x00\x20\x00\
                                \xe2\x00\x20\x00\x35\xd8\x68\xdd\x35\xd8\x59\xdd\x35\xd8\x5a\xdd\
                                \x6c\x00\x65\x00\x20\x00\x6c\x00\x35\xd8\x90\xdc\x35\xd8\x90\xdc\
                                \x70\x00\x20\x00\x77\x00\xef\x00\x74\x00\x68\x00\x20\x00\x6e\x00\
                                \xf8\x00\x20\x00\x65\x00\x73\x00\x63\x00\x61\x00\x70\x00\xea\x00\
                                \x20\x00\x51\x25";

    const DATA_UTF16BE: &[u8] = b"\x25\x51\x00\x20\x00\x4c\x00\xee\x00\x6b\x00\x65\x00\x20\x00\xe2\
                                  \x00\x20\xd8\x35\xdd\x68\xd8\x35\xdd\x59\xd8\x35\xdd\x5a\x00\x6c\
                                  \x00\x65\x00\x20\x00\x6c\xd8\x35\xdc\x90\xd8\x35\xdc\x90\x00\x70\
                                  \x00\x20\x00\x77\x00\xef\x00\x74\x00\x68\x00\x20\x00\x6e\x00\xf8\
                                  \x00\x20\x00\x65\x00\x73\x00\x63\x00\x61\x00\x70\x00\xea\x00\x20\
                                  \x25\x51";

    const DATA_UTF8: &[u8] = b"\xe2\x95\x91\x20\x4c\xc3\xae\x6b\x65\x20\xc3\xa2\x20\xf0\x9d\x95\
                               \xa8\xf0\x9d\x95\x99\xf0\x9d\x95\x9a\x6c\x65\x20\x6c\xf0\x9d\x92\
                               \x90\xf0\x9d\x92\x90\x70\x20\x77\xc3\xaf\x74\x68\x20\x6e\xc3\xb8\
                               \x20\x65\x73\x63\x61\x70\xc3\xaa\x20\xe2\x95\x91";

    #[test]
    fn decode_each_encoding() {
        assert_eq!(decode(Encoding::Latin1, DATA_LATIN1), STR_LATIN1);
        assert_eq!(decode(Encoding::Utf16, DATA_UTF16), STR_UNICODE);
        assert_eq!(decode(Encoding::Utf16Be, DATA_UTF16BE), STR_UNICODE);
        assert_eq!(decode(Encoding::Utf8, DATA_UTF8), STR_UNICODE);
    }

    #[test]
    fn decode_big_endian_bom() {
        assert_eq!(decode(Encoding::Utf16, b"\xFE\xFF\x00\x61\x00\x62"), "ab");
    }

    #[test]
    fn render_each_encoding() {
        assert_eq!(render(Encoding::Latin1, STR_LATIN1), DATA_LATIN1);
        assert_eq!(render(Encoding::Latin1, STR_UNICODE), DATA_LATIN1_LOSSY);
        assert_eq!(render(Encoding::Utf16, STR_UNICODE), DATA_UTF16);
        assert_eq!(render(Encoding::Utf16Be, STR_UNICODE), DATA_UTF16BE);
        assert_eq!(render(Encoding::Utf8, STR_UNICODE), DATA_UTF8);
    }

    #[test]
    fn read_terminated_latin1() {
        let data = b"L\xEEke \xE2 while loo\0p w\xEFth n\xF8 escap\xEA";
        let mut stream = BufStream::new(data);

        assert_eq!(read_terminated(Encoding::Latin1, &mut stream), "Lîke â while loo");
        assert_eq!(read_terminated(Encoding::Latin1, &mut stream), "p wïth nø escapê");
    }

    #[test]
    fn read_terminated_utf16() {
        // "a" followed by U+0100, whose low byte is zero. An unaligned search would
        // cut the string inside of that code unit.
        let data = b"\xFF\xFE\x61\x00\x00\x01\x00\x00\xFF\xFE\x62\x00";
        let mut stream = BufStream::new(data);

        assert_eq!(read_terminated(Encoding::Utf16, &mut stream), "a\u{100}");
        assert_eq!(read_terminated(Encoding::Utf16, &mut stream), "b");
    }

    #[test]
    fn render_terminators() {
        assert_eq!(render_terminated(Encoding::Latin1, "ab"), b"ab\0");
        assert_eq!(render_terminated(Encoding::Utf8, "ab"), b"ab\0");
        assert_eq!(render_terminated(Encoding::Utf16Be, "a"), b"\x00\x61\0\0");
        assert_eq!(render_terminated(Encoding::Utf16, "a"), b"\xFF\xFE\x61\x00\0\0");
    }

    #[test]
    fn latin1_detection() {
        assert!(is_latin1(STR_LATIN1));
        assert!(!is_latin1(STR_UNICODE));
    }
}
