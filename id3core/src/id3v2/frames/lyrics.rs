//! Unsynchronised and synchronised lyrics.

use crate::core::io::BufStream;
use crate::core::string::{self, Encoding};
use crate::id3v2::frames::{encoding, FrameBody, FrameId, Language};
use crate::id3v2::tag::TagHeader;
use crate::id3v2::ParseResult;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

#[derive(Default, Debug, Clone)]
pub struct UnsyncLyricsFrame {
    pub encoding: Encoding,
    pub lang: Language,
    pub desc: String,
    pub lyrics: String,
}

impl UnsyncLyricsFrame {
    pub fn new(lang: Language, desc: &str, lyrics: &str) -> Self {
        Self {
            encoding: Encoding::default(),
            lang,
            desc: desc.to_string(),
            lyrics: lyrics.to_string(),
        }
    }

    pub(crate) fn parse(stream: &mut BufStream) -> ParseResult<Self> {
        let encoding = encoding::parse(stream)?;
        let lang = Language::parse(stream)?;
        let desc = string::read_terminated(encoding, stream);
        let lyrics = string::read(encoding, stream);

        Ok(Self {
            encoding,
            lang,
            desc,
            lyrics,
        })
    }
}

impl FrameBody for UnsyncLyricsFrame {
    fn id(&self) -> FrameId {
        FrameId::known(b"USLT")
    }

    fn key(&self) -> String {
        format!["USLT:{}:{}", self.desc, self.lang]
    }

    fn is_empty(&self) -> bool {
        self.lyrics.is_empty()
    }

    fn render(&self, tag_header: &TagHeader) -> Vec<u8> {
        let encoding = encoding::check(self.encoding, tag_header.version());

        let mut result = vec![encoding::render(encoding)];
        result.extend(self.lang.code());
        result.extend(string::render_terminated(encoding, &self.desc));
        result.extend(string::render(encoding, &self.lyrics));

        result
    }
}

impl Display for UnsyncLyricsFrame {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if !self.desc.is_empty() {
            writeln![f, "{}:", self.desc]?;
        }

        write![f, "{}", self.lyrics]
    }
}

/// Lyrics or other text keyed by the time each entry appears.
#[derive(Default, Debug, Clone)]
pub struct SyncedLyricsFrame {
    pub encoding: Encoding,
    pub lang: Language,
    pub format: TimestampFormat,
    pub content_type: SyncedContentType,
    pub desc: String,
    /// Entries by timestamp, in units of [`format`](SyncedLyricsFrame::format).
    pub lyrics: BTreeMap<u32, String>,
}

impl SyncedLyricsFrame {
    pub fn new(lang: Language, desc: &str) -> Self {
        Self {
            lang,
            desc: desc.to_string(),
            ..Self::default()
        }
    }

    pub(crate) fn parse(stream: &mut BufStream) -> ParseResult<Self> {
        let encoding = encoding::parse(stream)?;

        let lang = Language::parse(stream)?;
        let format = TimestampFormat::parse(stream.read_u8()?);
        let content_type = SyncedContentType::parse(stream.read_u8()?);

        // Some taggers write a BOM on the description and leave it off every entry. Those
        // entries take the byte order of the description.
        let implicit_bom = match (encoding, stream.peek(0..2)) {
            (Encoding::Utf16, Ok(bom)) if is_bom(bom) => Some(bom),
            _ => None,
        };

        let desc = string::read_terminated(encoding, stream);

        let mut lyrics = BTreeMap::new();

        while !stream.is_empty() {
            let text = match implicit_bom {
                Some(bom) if !stream.peek(0..2).map(is_bom).unwrap_or(false) => {
                    let mut raw = bom.to_vec();
                    raw.extend(stream.search(encoding.nul()));
                    string::decode(encoding, &raw)
                }

                _ => string::read_terminated(encoding, stream),
            };

            let time = stream.read_u32()?;

            lyrics.insert(time, text);
        }

        Ok(Self {
            encoding,
            lang,
            format,
            content_type,
            desc,
            lyrics,
        })
    }
}

fn is_bom(raw: &[u8]) -> bool {
    raw == [0xFF, 0xFE] || raw == [0xFE, 0xFF]
}

impl FrameBody for SyncedLyricsFrame {
    fn id(&self) -> FrameId {
        FrameId::known(b"SYLT")
    }

    fn key(&self) -> String {
        format!["SYLT:{}:{}", self.desc, self.lang]
    }

    fn is_empty(&self) -> bool {
        self.lyrics.is_empty()
    }

    fn render(&self, tag_header: &TagHeader) -> Vec<u8> {
        let encoding = encoding::check(self.encoding, tag_header.version());

        let mut result = vec![encoding::render(encoding)];
        result.extend(self.lang.code());
        result.push(self.format as u8);
        result.push(self.content_type as u8);
        result.extend(string::render_terminated(encoding, &self.desc));

        for (time, text) in &self.lyrics {
            result.extend(string::render_terminated(encoding, text));
            result.extend(time.to_be_bytes());
        }

        result
    }
}

impl Display for SyncedLyricsFrame {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        // The content type only makes sense next to a description.
        if !self.desc.is_empty() {
            writeln![f, "\"{}\" [{:?}]:", self.desc, self.content_type]?;
        }

        for (i, text) in self.lyrics.values().enumerate() {
            if i > 0 {
                writeln![f]?;
            }

            write![f, "{}", text.trim_matches(|ch| ch == '\r' || ch == '\n')]?;
        }

        Ok(())
    }
}

byte_enum! {
    /// The unit of a synchronised timestamp.
    pub enum TimestampFormat {
        Other = 0x00,
        MpegFrames = 0x01,
        Millis = 0x02,
    };
    TimestampFormat::Other
}

impl Default for TimestampFormat {
    fn default() -> Self {
        TimestampFormat::Millis
    }
}

byte_enum! {
    pub enum SyncedContentType {
        Other = 0x00,
        Lyrics = 0x01,
        TextTranscription = 0x02,
        Movement = 0x03,
        Events = 0x04,
        Chord = 0x05,
        Trivia = 0x06,
        WebpageUrls = 0x07,
        ImageUrls = 0x08,
    };
    SyncedContentType::Other
}

impl Default for SyncedContentType {
    fn default() -> Self {
        SyncedContentType::Lyrics
    }
}
