//! Chapter and table of contents frames.
//!
//! Both can embed their own frames, which use the same grammar as the frames in the tag
//! itself. Embedded frames are covered by the escape of their parent, so they are read and
//! written as if the tag were not unsynchronised.

use crate::core::io::BufStream;
use crate::core::string::{self, Encoding};
use crate::id3v2::collections::FrameMap;
use crate::id3v2::frames::{self, FrameBody, FrameError, FrameId, FrameResult};
use crate::id3v2::tag::TagHeader;
use crate::id3v2::ParseResult;
use log::warn;
use std::fmt::{self, Display, Formatter};

/// Most children a table of contents can list.
pub const MAX_ELEMENTS: usize = 255;

#[derive(Debug, Clone)]
pub struct ChapterFrame {
    element_id: String,
    pub time: ChapterTime,
    pub frames: FrameMap,
}

impl ChapterFrame {
    pub fn new(element_id: &str) -> Result<Self, FrameError> {
        Ok(Self {
            element_id: check_element_id(element_id)?,
            time: ChapterTime::default(),
            frames: FrameMap::new(),
        })
    }

    pub(crate) fn parse(tag_header: &TagHeader, stream: &mut BufStream) -> ParseResult<Self> {
        let element_id = string::read_terminated(Encoding::Latin1, stream);

        let time = ChapterTime {
            start_time: stream.read_u32()?,
            end_time: stream.read_u32()?,
            start_offset: stream.read_u32()?,
            end_offset: stream.read_u32()?,
        };

        let frames = parse_embedded(tag_header, stream);

        Ok(Self {
            element_id,
            time,
            frames,
        })
    }

    pub fn element_id(&self) -> &str {
        &self.element_id
    }
}

impl FrameBody for ChapterFrame {
    fn id(&self) -> FrameId {
        FrameId::known(b"CHAP")
    }

    fn key(&self) -> String {
        format!["CHAP:{}", self.element_id]
    }

    fn is_empty(&self) -> bool {
        false
    }

    fn render(&self, tag_header: &TagHeader) -> Vec<u8> {
        let mut result = string::render_terminated(Encoding::Latin1, &self.element_id);

        result.extend(self.time.start_time.to_be_bytes());
        result.extend(self.time.end_time.to_be_bytes());
        result.extend(self.time.start_offset.to_be_bytes());
        result.extend(self.time.end_offset.to_be_bytes());

        result.extend(render_embedded(tag_header, &self.frames));

        result
    }
}

impl Display for ChapterFrame {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write![
            f,
            "{} [Start: {}, End: {}]",
            self.element_id, self.time.start_time, self.time.end_time
        ]?;

        fmt_embedded(&self.frames, f)
    }
}

/// Where a chapter sits in the audio. Times are in milliseconds.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ChapterTime {
    pub start_time: u32,
    pub end_time: u32,
    /// Byte offset of the start, or `u32::MAX` if only the times are meaningful.
    pub start_offset: u32,
    pub end_offset: u32,
}

impl Default for ChapterTime {
    fn default() -> Self {
        ChapterTime {
            start_time: 0,
            end_time: 0,
            start_offset: u32::MAX,
            end_offset: u32::MAX,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TableOfContentsFrame {
    element_id: String,
    pub flags: TocFlags,
    elements: Vec<String>,
    pub frames: FrameMap,
}

impl TableOfContentsFrame {
    pub fn new(element_id: &str) -> Result<Self, FrameError> {
        Ok(Self {
            element_id: check_element_id(element_id)?,
            flags: TocFlags::default(),
            elements: Vec::new(),
            frames: FrameMap::new(),
        })
    }

    pub(crate) fn parse(tag_header: &TagHeader, stream: &mut BufStream) -> ParseResult<Self> {
        let element_id = string::read_terminated(Encoding::Latin1, stream);

        let flags = stream.read_u8()?;
        let flags = TocFlags {
            top_level: flags & 0x2 != 0,
            ordered: flags & 0x1 != 0,
        };

        let entry_count = stream.read_u8()?;
        let mut elements = Vec::new();

        for _ in 0..entry_count {
            // The entry count can't be trusted to match the data.
            if stream.is_empty() {
                break;
            }

            elements.push(string::read_terminated(Encoding::Latin1, stream));
        }

        let frames = parse_embedded(tag_header, stream);

        Ok(Self {
            element_id,
            flags,
            elements,
            frames,
        })
    }

    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    /// The element ids of the chapters or nested tables this table lists.
    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    pub fn push_element(&mut self, element_id: &str) -> Result<(), FrameError> {
        if self.elements.len() >= MAX_ELEMENTS {
            return Err(FrameError::TooManyElements(self.elements.len() + 1));
        }

        self.elements.push(check_element_id(element_id)?);

        Ok(())
    }

    pub fn remove_element(&mut self, element_id: &str) -> bool {
        let len = self.elements.len();
        self.elements.retain(|element| element != element_id);
        self.elements.len() != len
    }
}

impl FrameBody for TableOfContentsFrame {
    fn id(&self) -> FrameId {
        FrameId::known(b"CTOC")
    }

    fn key(&self) -> String {
        format!["CTOC:{}", self.element_id]
    }

    fn is_empty(&self) -> bool {
        false
    }

    fn render(&self, tag_header: &TagHeader) -> Vec<u8> {
        let mut result = string::render_terminated(Encoding::Latin1, &self.element_id);

        let mut flags = 0;

        if self.flags.top_level {
            flags |= 0x2;
        }

        if self.flags.ordered {
            flags |= 0x1;
        }

        result.push(flags);

        // push_element keeps this within a byte.
        result.push(self.elements.len() as u8);

        for element in &self.elements {
            result.extend(string::render_terminated(Encoding::Latin1, element));
        }

        result.extend(render_embedded(tag_header, &self.frames));

        result
    }
}

impl Display for TableOfContentsFrame {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write![f, "{}", self.element_id]?;

        if !self.elements.is_empty() {
            write![f, ", Elements:"]?;

            for entry in &self.elements {
                write![f, " {}", entry]?;
            }
        }

        fmt_embedded(&self.frames, f)
    }
}

#[derive(Default, Debug, Clone, Copy, Eq, PartialEq)]
pub struct TocFlags {
    /// This table is the root of the chapter tree.
    pub top_level: bool,
    /// The listed elements are in playback order.
    pub ordered: bool,
}

fn check_element_id(element_id: &str) -> Result<String, FrameError> {
    if element_id.is_empty() {
        return Err(FrameError::EmptyElementId);
    }

    Ok(element_id.to_string())
}

fn embedded_header(tag_header: &TagHeader) -> TagHeader {
    let mut header = tag_header.clone();
    header.flags_mut().unsync = false;
    header
}

fn parse_embedded(tag_header: &TagHeader, stream: &mut BufStream) -> FrameMap {
    let tag_header = embedded_header(tag_header);
    let mut frames = FrameMap::new();

    while !stream.is_empty() {
        match frames::parse(&tag_header, stream) {
            Ok(FrameResult::Frame(frame)) => {
                frames.add(frame);
            }

            Ok(FrameResult::Dropped) => continue,
            Err(_) => break,
        }
    }

    frames
}

fn render_embedded(tag_header: &TagHeader, frames: &FrameMap) -> Vec<u8> {
    let tag_header = embedded_header(tag_header);
    let mut result = Vec::new();

    for frame in frames.values().filter(|frame| !frame.is_empty()) {
        match frames::render(&tag_header, frame) {
            Ok(data) => result.extend(data),
            Err(err) => {
                warn!(target: "id3v2", "could not render embedded frame {}: {}", frame.id(), err)
            }
        }
    }

    result
}

fn fmt_embedded(frames: &FrameMap, f: &mut Formatter) -> fmt::Result {
    if !frames.is_empty() {
        write![f, ", Sub-Frames:"]?;

        for frame in frames.values() {
            write![f, " {}", frame.id()]?;
        }
    }

    Ok(())
}
