use crate::core::io::BufStream;
use crate::core::string::{self, Encoding};
use crate::id3v2::frames::{encoding, expect_kind, FrameBody, FrameError, FrameId, FrameKind};
use crate::id3v2::tag::TagHeader;
use crate::id3v2::ParseResult;
use std::fmt::{self, Display, Formatter};

/// A frame holding one or more strings, identified by any `T***` id that has no
/// dedicated body of its own.
#[derive(Debug, Clone)]
pub struct TextFrame {
    frame_id: FrameId,
    pub encoding: Encoding,
    pub text: Vec<String>,
}

impl TextFrame {
    pub fn new(frame_id: FrameId) -> Result<Self, FrameError> {
        expect_kind(frame_id, FrameKind::Text)?;

        Ok(Self {
            frame_id,
            encoding: Encoding::default(),
            text: Vec::new(),
        })
    }

    pub fn with_text(frame_id: FrameId, encoding: Encoding, text: &str) -> Result<Self, FrameError> {
        let mut frame = Self::new(frame_id)?;
        frame.encoding = encoding;
        frame.text.push(text.to_string());

        Ok(frame)
    }

    pub(crate) fn parse(frame_id: FrameId, stream: &mut BufStream) -> ParseResult<Self> {
        let encoding = encoding::parse(stream)?;
        let text = parse_text(encoding, stream);

        Ok(Self {
            frame_id,
            encoding,
            text,
        })
    }
}

impl FrameBody for TextFrame {
    fn id(&self) -> FrameId {
        self.frame_id
    }

    fn key(&self) -> String {
        self.frame_id.to_string()
    }

    fn is_empty(&self) -> bool {
        self.text.iter().all(String::is_empty)
    }

    fn render(&self, tag_header: &TagHeader) -> Vec<u8> {
        let encoding = encoding::check(self.encoding, tag_header.version());

        let mut result = vec![encoding::render(encoding)];

        for string in self.text.iter().filter(|string| !string.is_empty()) {
            result.extend(string::render_terminated(encoding, string));
        }

        result
    }
}

impl Display for TextFrame {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        fmt_text(&self.text, f)
    }
}

/// A `TXXX` frame, which pairs a description with one or more values.
#[derive(Debug, Clone, Default)]
pub struct UserTextFrame {
    pub encoding: Encoding,
    pub desc: String,
    pub text: Vec<String>,
}

impl UserTextFrame {
    pub fn new(desc: &str, text: &str) -> Self {
        Self {
            encoding: Encoding::default(),
            desc: desc.to_string(),
            text: vec![text.to_string()],
        }
    }

    pub(crate) fn parse(stream: &mut BufStream) -> ParseResult<Self> {
        let encoding = encoding::parse(stream)?;

        let desc = string::read_terminated(encoding, stream);
        let text = parse_text(encoding, stream);

        Ok(Self {
            encoding,
            desc,
            text,
        })
    }
}

impl FrameBody for UserTextFrame {
    fn id(&self) -> FrameId {
        FrameId::known(b"TXXX")
    }

    fn key(&self) -> String {
        format!["TXXX:{}", self.desc]
    }

    fn is_empty(&self) -> bool {
        self.desc.is_empty() && self.text.iter().all(String::is_empty)
    }

    fn render(&self, tag_header: &TagHeader) -> Vec<u8> {
        let encoding = encoding::check(self.encoding, tag_header.version());

        let mut result = vec![encoding::render(encoding)];
        result.extend(string::render_terminated(encoding, &self.desc));
        result.extend(render_text(encoding, &self.text));

        result
    }
}

impl Display for UserTextFrame {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        fmt_text(&self.text, f)
    }
}

pub(crate) fn fmt_text<D: Display>(text: &[D], f: &mut Formatter) -> fmt::Result {
    for (i, string) in text.iter().enumerate() {
        if i > 0 {
            write![f, ", "]?;
        }

        write![f, "{}", string]?;
    }

    Ok(())
}

/// Read every terminated string left in the stream.
pub(crate) fn parse_text(encoding: Encoding, stream: &mut BufStream) -> Vec<String> {
    let mut text = Vec::new();

    while !stream.is_empty() {
        let string = string::read_terminated(encoding, stream);

        // Taggers sometimes pad text with zeroes. These are not real entries.
        if !string.is_empty() {
            text.push(string);
        }
    }

    text
}

/// Join strings with the encoding's terminator, leaving the last one unterminated.
pub(crate) fn render_text(encoding: Encoding, text: &[String]) -> Vec<u8> {
    let mut result = Vec::new();

    for (i, string) in text.iter().enumerate() {
        if i > 0 {
            result.resize(result.len() + encoding.nul_size(), 0)
        }

        result.extend(string::render(encoding, string));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id3v2::frames::{self, Frame};
    use crate::id3v2::tag::Version;

    const TIT2_DATA: &[u8] = b"TIT2\x00\x00\x00\x49\x00\x00\
                               \x01\
                               \xFF\xFE\x49\x00\x20\x00\x53\x00\x77\x00\x61\x00\x6c\x00\x6c\x00\
                               \x6f\x00\x77\x00\x65\x00\x64\x00\x20\x00\x48\x00\x61\x00\x72\x00\
                               \x64\x00\x2c\x00\x20\x00\x4c\x00\x69\x00\x6b\x00\x65\x00\x20\x00\
                               \x49\x00\x20\x00\x55\x00\x6e\x00\x64\x00\x65\x00\x72\x00\x73\x00\
                               \x74\x00\x6f\x00\x6f\x00\x64\x00";

    const TCON_DATA: &[u8] = b"TCON\x00\x00\x00\x17\x00\x00\
                               \x00\
                               Post-Rock\0\
                               Electronica\0";

    const TXXX_DATA: &[u8] = b"TXXX\x00\x00\x00\x23\x00\x00\
                               \x00\
                               replaygain_track_gain\0\
                               -7.429688 dB";

    #[test]
    fn parse_text() {
        make_frame!(TextFrame, TIT2_DATA, frame);

        assert_eq!(frame.encoding, Encoding::Utf16);
        assert_eq!(frame.text[0], "I Swallowed Hard, Like I Understood");

        make_frame!(TextFrame, TCON_DATA, frame);

        assert_eq!(frame.encoding, Encoding::Latin1);
        assert_eq!(frame.text, &["Post-Rock", "Electronica"]);
        assert_eq!(frame.to_string(), "Post-Rock, Electronica");
    }

    #[test]
    fn parse_txxx() {
        make_frame!(UserTextFrame, TXXX_DATA, frame);

        assert_eq!(frame.encoding, Encoding::Latin1);
        assert_eq!(frame.desc, "replaygain_track_gain");
        assert_eq!(frame.text[0], "-7.429688 dB");
        assert_eq!(frame.key(), "TXXX:replaygain_track_gain");
    }

    #[test]
    fn render_text() {
        let mut frame = TextFrame::new(FrameId::known(b"TCON")).unwrap();
        frame.encoding = Encoding::Latin1;
        frame.text = vec![String::from("Post-Rock"), String::from("Electronica")];

        assert_render!(frame, TCON_DATA);
    }

    #[test]
    fn render_txxx() {
        let mut frame = UserTextFrame::new("replaygain_track_gain", "-7.429688 dB");
        frame.encoding = Encoding::Latin1;

        assert_render!(frame, TXXX_DATA);
    }

    #[test]
    fn text_round_trip_in_each_encoding() {
        let header = TagHeader::with_version(Version::V24);
        let encodings = [
            Encoding::Latin1,
            Encoding::Utf16,
            Encoding::Utf16Be,
            Encoding::Utf8,
        ];

        for &enc in encodings.iter() {
            let frame = TextFrame::with_text(FrameId::known(b"TIT2"), enc, "TITLE").unwrap();
            let data = frames::render(&header, &Frame::from(frame)).unwrap();

            make_frame!(TextFrame, &data, parsed);

            assert_eq!(parsed.encoding, enc);
            assert_eq!(parsed.text, &["TITLE"]);
        }
    }

    #[test]
    fn remap_encoding_for_v3() {
        let frame = TextFrame::with_text(FrameId::known(b"TIT2"), Encoding::Utf8, "a").unwrap();

        assert_render!(
            frame,
            b"TIT2\x00\x00\x00\x07\x00\x00\x01\xFF\xFE\x61\x00\x00\x00",
            Version::V23
        );
    }

    #[test]
    fn reject_non_text_ids() {
        assert!(TextFrame::new(FrameId::known(b"APIC")).is_err());
        assert!(TextFrame::new(FrameId::known(b"TXXX")).is_err());
        assert!(TextFrame::new(FrameId::known(b"TDRC")).is_err());
        assert!(TextFrame::new(FrameId::known(b"TYER")).is_ok());
    }

    #[test]
    fn empty_text() {
        let mut frame = TextFrame::new(FrameId::known(b"TIT2")).unwrap();
        assert!(frame.is_empty());

        frame.text.push(String::new());
        assert!(frame.is_empty());
    }
}
