//! Comments frames.

use crate::core::io::BufStream;
use crate::core::string::{self, Encoding};
use crate::id3v2::frames::{encoding, FrameBody, FrameId, Language};
use crate::id3v2::tag::TagHeader;
use crate::id3v2::ParseResult;
use std::fmt::{self, Display, Formatter};

#[derive(Default, Debug, Clone)]
pub struct CommentsFrame {
    pub encoding: Encoding,
    pub lang: Language,
    pub desc: String,
    pub text: String,
}

impl CommentsFrame {
    pub fn new(encoding: Encoding, lang: Language, desc: &str, text: &str) -> Self {
        Self {
            encoding,
            lang,
            desc: desc.to_string(),
            text: text.to_string(),
        }
    }

    pub(crate) fn parse(stream: &mut BufStream) -> ParseResult<Self> {
        let encoding = encoding::parse(stream)?;
        let lang = Language::parse(stream)?;
        let desc = string::read_terminated(encoding, stream);
        let text = string::read(encoding, stream);

        Ok(Self {
            encoding,
            lang,
            desc,
            text,
        })
    }
}

impl FrameBody for CommentsFrame {
    fn id(&self) -> FrameId {
        FrameId::known(b"COMM")
    }

    fn key(&self) -> String {
        format!["COMM:{}:{}", self.desc, self.lang]
    }

    fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn render(&self, tag_header: &TagHeader) -> Vec<u8> {
        let encoding = encoding::check(self.encoding, tag_header.version());

        let mut result = vec![encoding::render(encoding)];
        result.extend(self.lang.code());
        result.extend(string::render_terminated(encoding, &self.desc));
        result.extend(string::render(encoding, &self.text));

        result
    }
}

impl Display for CommentsFrame {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write![f, "{}", self.text]
    }
}
