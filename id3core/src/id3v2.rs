//! ID3v2 tags.
//!
//! A [`Tag`](Tag) is the tag header plus an ordered [`FrameMap`](FrameMap). Tags can be
//! read from a byte slice or a file, edited in memory, converted between ID3v2.3 and
//! ID3v2.4 and rendered back into bytes. Writing a tag back into a file is done through
//! the [`TagEditor`](TagEditor).

pub mod collections;
mod compat;
mod editor;
mod fields;
pub mod frames;
pub mod syncdata;
pub mod tag;

pub use collections::FrameMap;
pub use editor::{TagEditor, WriteOptions};
pub use fields::Field;
pub use tag::{TagFlags, TagHeader, Version, HEADER_SIZE};

use crate::core::io::BufStream;
use crate::file::File;
use frames::{Frame, FrameResult};
use log::{debug, info, warn};
use std::error;
use std::fmt::{self, Display, Formatter};
use std::io::{self, ErrorKind};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct Tag {
    header: TagHeader,
    frames: FrameMap,
}

impl Tag {
    /// Create an empty tag. It must be given at least one frame before it can be rendered.
    pub fn new(version: Version) -> Self {
        Tag {
            header: TagHeader::with_version(version),
            frames: FrameMap::new(),
        }
    }

    /// Read the tag at the start of the file at `path` without opening it for writing.
    pub fn open<P: AsRef<Path>>(path: P) -> ParseResult<Self> {
        let mut file = File::open_read(path)?;
        Self::read_from(&mut file)
    }

    /// Parse a tag from the start of `data`. Anything past the tag is ignored.
    pub fn parse(data: &[u8]) -> ParseResult<Self> {
        let mut stream = BufStream::new(data);
        let mut header = TagHeader::parse(stream.read_array()?)?;
        let body = stream.slice(header.size())?;

        if header.flags().footer {
            let valid = stream
                .read_array()
                .map(|raw| tag::check_footer(&header, raw))
                .unwrap_or(false);

            if !valid {
                info!(target: "id3v2", "footer flag set without a valid footer, ignoring it");
                header.flags_mut().footer = false;
            }
        }

        Ok(Self::parse_body(header, body))
    }

    pub(crate) fn read_from(file: &mut File) -> ParseResult<Self> {
        let len = file.len()?;

        if len < HEADER_SIZE as u64 {
            return Err(ParseError::NotFound);
        }

        let mut raw = [0; HEADER_SIZE];
        file.seek(0)?;
        file.read_into(&mut raw)?;

        let mut header = TagHeader::parse(raw)?;

        // Ensure that this file is large enough to even contain this tag.
        if (HEADER_SIZE + header.size()) as u64 > len {
            return Err(ParseError::NotEnoughData);
        }

        let body = file.read_vec(header.size())?;

        if header.flags().footer {
            let mut raw = [0; HEADER_SIZE];

            let valid = header.region_len() as u64 <= len
                && file.read_into(&mut raw).is_ok()
                && tag::check_footer(&header, raw);

            if !valid {
                info!(target: "id3v2", "footer flag set without a valid footer, ignoring it");
                header.flags_mut().footer = false;
            }
        }

        Ok(Self::parse_body(header, &body))
    }

    fn parse_body(mut header: TagHeader, body: &[u8]) -> Self {
        // ID3v2.3 unsynchronises the whole tag body at once, ID3v2.4 does it per frame.
        let decoded;
        let body = if header.version() == Version::V23 && header.flags().unsync {
            decoded = syncdata::decode(body);
            &decoded[..]
        } else {
            body
        };

        let mut stream = BufStream::new(body);

        if header.flags().extended {
            let mut ext_stream = stream.clone();

            match tag::skip_ext_header(header.version(), &mut ext_stream) {
                Ok(()) => stream = ext_stream,

                // Flag was incorrectly set, move on as if there was no extended header.
                Err(_) => info!(target: "id3v2", "could not read extended header, ignoring it"),
            }

            info!(target: "id3v2", "dropping extended header");
            header.flags_mut().extended = false;
        }

        let frames = parse_frames(&header, &mut stream);

        Tag { header, frames }
    }

    pub fn header(&self) -> &TagHeader {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut TagHeader {
        &mut self.header
    }

    pub fn version(&self) -> Version {
        self.header.version()
    }

    pub fn frames(&self) -> &FrameMap {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut FrameMap {
        &mut self.frames
    }

    /// Add a frame, replacing the frame with the same key if there is one.
    pub fn set(&mut self, frame: impl Into<Frame>) -> Option<Frame> {
        self.frames.insert(frame)
    }

    pub fn get(&self, key: &str) -> Option<&Frame> {
        self.frames.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Frame> {
        self.frames.get_mut(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Frame> {
        self.frames.remove(key)
    }

    /// Remove every frame with the identifier `id`.
    pub fn remove_all(&mut self, id: &[u8; 4]) -> Vec<Frame> {
        self.frames.remove_all(id)
    }

    /// Convert this tag to `version`, migrating the date frames and discarding frames the
    /// target version does not define.
    pub fn convert(&mut self, version: Version) {
        let from = self.version();

        if from == version {
            return;
        }

        debug!(target: "id3v2", "converting tag from {} to {}", from, version);

        compat::convert_frames(&mut self.frames, version);
        self.header.set_version(version);
    }

    /// Render this tag into its on-disk form, without any padding.
    pub fn render(&mut self) -> SaveResult<Vec<u8>> {
        self.assemble(0)
    }

    /// Render the header, every non-empty frame and `padding` zero bytes. The header sizes
    /// are updated to match.
    pub(crate) fn assemble(&mut self, padding: usize) -> SaveResult<Vec<u8>> {
        let mut data = Vec::new();

        // Footers and extended headers are never written.
        self.header.flags_mut().extended = false;
        self.header.flags_mut().footer = false;

        for frame in self.frames.values_mut() {
            if frame.is_empty() {
                info!(target: "id3v2", "skipping empty frame {}", frame.key());
                continue;
            }

            let rendered = frames::render(&self.header, frame)?;
            frame.header_mut().set_size(rendered.len() - HEADER_SIZE);
            data.extend(rendered);
        }

        if data.is_empty() {
            return Err(SaveError::NoFrames);
        }

        if self.header.version() == Version::V23 && self.header.flags().unsync {
            data = syncdata::encode(&data);
        }

        let size = data.len() + padding;

        if size > syncdata::U28_MAX as usize {
            warn!(target: "id3v2", "tag size {}b exceeds the maximum of {}b", size, syncdata::U28_MAX);
            return Err(SaveError::TooLarge);
        }

        self.header.set_size(size);

        let mut result = Vec::with_capacity(HEADER_SIZE + size);
        result.extend(self.header.render());
        result.extend(data);
        result.resize(HEADER_SIZE + size, 0);

        Ok(result)
    }
}

fn parse_frames(header: &TagHeader, stream: &mut BufStream) -> FrameMap {
    let mut frames = FrameMap::new();

    while stream.remaining() >= HEADER_SIZE {
        // Its assumed the moment we've hit a zero, we've reached the padding
        if stream.peek(0..1).map(|id| id[0] == 0).unwrap_or(true) {
            break;
        }

        match frames::parse(header, stream) {
            Ok(FrameResult::Frame(frame)) => {
                frames.add(frame);
            }
            Ok(FrameResult::Dropped) => continue,
            Err(err) => {
                warn!(target: "id3v2", "stopping at unreadable frame: {}", err);
                break;
            }
        }
    }

    frames
}

/// A failure to read a tag.
#[derive(Debug)]
pub enum ParseError {
    IoError(io::Error),
    NotEnoughData,
    MalformedData,
    Unsupported,
    NotFound,
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::IoError(err) => write![f, "{}", err],
            Self::NotEnoughData => write![f, "not enough data"],
            Self::MalformedData => write![f, "malformed data"],
            Self::Unsupported => write![f, "unsupported"],
            Self::NotFound => write![f, "no tag found"],
        }
    }
}

impl error::Error for ParseError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ParseError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            ErrorKind::UnexpectedEof => Self::NotEnoughData,
            _ => Self::IoError(err),
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// A failure to render or write a tag.
#[derive(Debug)]
pub enum SaveError {
    IoError(io::Error),
    /// The tag has no non-empty frames.
    NoFrames,
    /// A frame or the tag is larger than a synchsafe size can describe.
    TooLarge,
}

impl Display for SaveError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::IoError(err) => write![f, "{}", err],
            Self::NoFrames => write![f, "tag has no frames to write"],
            Self::TooLarge => write![f, "tag is too large"],
        }
    }
}

impl error::Error for SaveError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for SaveError {
    fn from(err: io::Error) -> Self {
        Self::IoError(err)
    }
}

pub type SaveResult<T> = Result<T, SaveError>;
