//! Frame parsing and implementations.
//!
//! An ID3v2 tag is made up of chunks of data called frames. Every frame has a
//! [`FrameHeader`](FrameHeader) and a body whose layout depends on the frame identifier.
//!
//! Frames are modelled as a [`Frame`](Frame) wrapping a header and a [`FrameContent`](FrameContent),
//! a closed set of typed bodies. Identifiers this crate has no typed body for are kept as
//! [`UnknownFrame`](UnknownFrame)s so that they survive a round trip untouched.

pub mod bin;
pub mod chapters;
pub mod comments;
mod encoding;
pub mod file;
pub mod header;
pub mod lang;
pub mod lyrics;
pub mod text;
pub mod time;

pub use bin::UnknownFrame;
pub use chapters::{ChapterFrame, ChapterTime, TableOfContentsFrame, TocFlags};
pub use comments::CommentsFrame;
pub use file::{AttachedPictureFrame, PictureType};
pub use header::{FrameFlag, FrameFlags, FrameHeader};
pub use lang::Language;
pub use lyrics::{SyncedContentType, SyncedLyricsFrame, TimestampFormat, UnsyncLyricsFrame};
pub use text::{TextFrame, UserTextFrame};
pub use time::{Precision, Timestamp, TimestampFrame};

use crate::core::io::BufStream;
use crate::id3v2::tag::{TagHeader, Version};
use crate::id3v2::{syncdata, Field, ParseError, ParseResult, SaveError, SaveResult};
use log::{info, warn};
use std::borrow::Cow;
use std::error;
use std::fmt::{self, Debug, Display, Formatter};
use std::str::{self, FromStr};

/// The capability every typed frame body shares.
pub trait FrameBody: Display + Debug + Clone {
    /// The identifier this body is stored under.
    fn id(&self) -> FrameId;

    /// The collection key, which is the identifier plus whatever makes the frame unique.
    fn key(&self) -> String;

    /// Empty frames are skipped when a tag is written.
    fn is_empty(&self) -> bool;

    fn render(&self, tag_header: &TagHeader) -> Vec<u8>;
}

/// Typed access to a [`FrameContent`](FrameContent) variant.
pub trait AsContent: Sized {
    fn from_content(content: &FrameContent) -> Option<&Self>;
    fn from_content_mut(content: &mut FrameContent) -> Option<&mut Self>;
}

macro_rules! frame_content {
    ($($variant:ident($body:ty)),+ $(,)?) => {
        /// The typed body of a frame.
        #[derive(Clone, Debug)]
        pub enum FrameContent {
            $($variant($body),)+
        }

        impl FrameContent {
            pub fn id(&self) -> FrameId {
                match self { $(Self::$variant(body) => body.id(),)+ }
            }

            pub fn key(&self) -> String {
                match self { $(Self::$variant(body) => body.key(),)+ }
            }

            pub fn is_empty(&self) -> bool {
                match self { $(Self::$variant(body) => body.is_empty(),)+ }
            }

            pub(crate) fn render(&self, tag_header: &TagHeader) -> Vec<u8> {
                match self { $(Self::$variant(body) => body.render(tag_header),)+ }
            }
        }

        impl Display for FrameContent {
            fn fmt(&self, f: &mut Formatter) -> fmt::Result {
                match self { $(Self::$variant(body) => Display::fmt(body, f),)+ }
            }
        }

        $(
            impl From<$body> for FrameContent {
                fn from(body: $body) -> Self {
                    Self::$variant(body)
                }
            }

            impl From<$body> for Frame {
                fn from(body: $body) -> Self {
                    Frame::new(FrameContent::$variant(body))
                }
            }

            impl AsContent for $body {
                fn from_content(content: &FrameContent) -> Option<&Self> {
                    match content {
                        FrameContent::$variant(body) => Some(body),
                        _ => None,
                    }
                }

                fn from_content_mut(content: &mut FrameContent) -> Option<&mut Self> {
                    match content {
                        FrameContent::$variant(body) => Some(body),
                        _ => None,
                    }
                }
            }
        )+
    };
}

frame_content! {
    Text(TextFrame),
    Timestamp(TimestampFrame),
    Comments(CommentsFrame),
    UnsyncLyrics(UnsyncLyricsFrame),
    SyncedLyrics(SyncedLyricsFrame),
    Picture(AttachedPictureFrame),
    UserText(UserTextFrame),
    Chapter(ChapterFrame),
    TableOfContents(TableOfContentsFrame),
    Unknown(UnknownFrame),
}

/// A frame header paired with a typed body.
#[derive(Clone, Debug)]
pub struct Frame {
    header: FrameHeader,
    content: FrameContent,
}

impl Frame {
    pub fn new(content: FrameContent) -> Self {
        Self {
            header: FrameHeader::new(content.id()),
            content,
        }
    }

    pub fn id(&self) -> FrameId {
        self.content.id()
    }

    pub fn key(&self) -> String {
        self.content.key()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    pub fn flags(&self) -> &FrameFlags {
        self.header.flags()
    }

    pub fn flags_mut(&mut self) -> &mut FrameFlags {
        self.header.flags_mut()
    }

    pub fn set_group_id(&mut self, group_id: Option<u8>) {
        self.header.set_group_id(group_id)
    }

    pub fn content(&self) -> &FrameContent {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut FrameContent {
        &mut self.content
    }

    pub fn into_content(self) -> FrameContent {
        self.content
    }

    pub fn is<T: AsContent>(&self) -> bool {
        T::from_content(&self.content).is_some()
    }

    pub fn downcast<T: AsContent>(&self) -> Option<&T> {
        T::from_content(&self.content)
    }

    pub fn downcast_mut<T: AsContent>(&mut self) -> Option<&mut T> {
        T::from_content_mut(&mut self.content)
    }

    pub(crate) fn header_mut(&mut self) -> &mut FrameHeader {
        &mut self.header
    }
}

impl Display for Frame {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Display::fmt(&self.content, f)
    }
}

/// A four character frame identifier made of uppercase ASCII letters and digits.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FrameId([u8; 4]);

impl FrameId {
    pub fn new(id: &[u8; 4]) -> Result<Self, FrameError> {
        if !Self::is_valid(id) {
            return Err(FrameError::InvalidId(String::from_utf8_lossy(id).into_owned()));
        }

        Ok(Self(*id))
    }

    /// For identifiers written out in this crate that are known to be valid.
    pub(crate) const fn known(id: &[u8; 4]) -> Self {
        Self(*id)
    }

    pub(crate) fn is_valid(id: &[u8]) -> bool {
        id.len() == 4
            && id
                .iter()
                .all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit())
    }

    pub fn inner(&self) -> &[u8; 4] {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        // Only ASCII is ever stored.
        str::from_utf8(&self.0).unwrap_or_default()
    }

    pub fn starts_with(&self, ch: u8) -> bool {
        self.0[0] == ch
    }
}

impl FromStr for FrameId {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.as_bytes() {
            &[a, b, c, d] => Self::new(&[a, b, c, d]),
            _ => Err(FrameError::InvalidId(s.to_string())),
        }
    }
}

impl Display for FrameId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write![f, "{}", self.as_str()]
    }
}

impl PartialEq<[u8; 4]> for FrameId {
    fn eq(&self, other: &[u8; 4]) -> bool {
        self.0 == *other
    }
}

impl PartialEq<&[u8; 4]> for FrameId {
    fn eq(&self, other: &&[u8; 4]) -> bool {
        self == *other
    }
}

/// A rejected frame construction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FrameError {
    /// The identifier is not four uppercase ASCII letters or digits.
    InvalidId(String),
    /// The identifier is valid but belongs to a different kind of frame.
    WrongKind { id: FrameId, expected: FrameKind },
    /// The language code is not three ASCII letters.
    InvalidLanguage(String),
    /// The description is longer than the format allows, in characters.
    DescriptionTooLong(usize),
    /// Chapter and table of contents frames need a non-empty element id.
    EmptyElementId,
    /// A table of contents can hold at most 255 children.
    TooManyElements(usize),
    /// The string matches none of the timestamp formats.
    InvalidTimestamp(String),
    /// The field does not hold plain text.
    NotText(Field),
}

impl Display for FrameError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::InvalidId(id) => write![f, "invalid frame id {:?}", id],
            Self::WrongKind { id, expected } => {
                write![f, "{} is not a {:?} frame id", id, expected]
            }
            Self::InvalidLanguage(lang) => write![f, "invalid language code {:?}", lang],
            Self::DescriptionTooLong(len) => {
                write![f, "description of {} characters is too long", len]
            }
            Self::EmptyElementId => write![f, "element id cannot be empty"],
            Self::TooManyElements(len) => {
                write![f, "{} child elements exceed the limit of 255", len]
            }
            Self::InvalidTimestamp(ts) => write![f, "invalid timestamp {:?}", ts],
            Self::NotText(field) => write![f, "{:?} is not a text field", field],
        }
    }
}

impl error::Error for FrameError {
    // Nothing to implement
}

/// The kinds of frame body, as decided by the frame identifier.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FrameKind {
    Text,
    Timestamp,
    Comments,
    UnsyncLyrics,
    SyncedLyrics,
    Picture,
    UserText,
    Chapter,
    TableOfContents,
    Unknown,
}

/// Decide which kind of body a frame identifier carries.
pub fn classify(frame_id: FrameId) -> FrameKind {
    match frame_id.inner() {
        b"APIC" => FrameKind::Picture,
        b"COMM" => FrameKind::Comments,
        b"USLT" => FrameKind::UnsyncLyrics,
        b"SYLT" => FrameKind::SyncedLyrics,
        b"TXXX" => FrameKind::UserText,
        b"CHAP" => FrameKind::Chapter,
        b"CTOC" => FrameKind::TableOfContents,
        _ if TimestampFrame::is_id(frame_id) => FrameKind::Timestamp,
        _ if frame_id.starts_with(b'T') => FrameKind::Text,
        _ => FrameKind::Unknown,
    }
}

pub(crate) fn expect_kind(frame_id: FrameId, expected: FrameKind) -> Result<(), FrameError> {
    if classify(frame_id) != expected {
        return Err(FrameError::WrongKind {
            id: frame_id,
            expected,
        });
    }

    Ok(())
}

pub(crate) enum FrameResult {
    Frame(Frame),
    /// The frame was read but could not be kept. Its siblings are unaffected.
    Dropped,
}

// --------
// Frame decoding. The order here matters: the unsync escape covers everything after the
// header, including the group byte and data length indicator, and only then can the body
// be decompressed.
// --------

pub(crate) fn parse(tag_header: &TagHeader, stream: &mut BufStream) -> ParseResult<FrameResult> {
    let version = tag_header.version();
    let mut header = FrameHeader::parse(version, stream)?;
    let frame_id = header.id();
    let flags = *header.flags();

    let raw = stream.slice(header.size())?;

    if raw.is_empty() {
        info!(target: "id3v2", "dropping empty frame {}", frame_id);
        return Ok(FrameResult::Dropped);
    }

    if flags.get(FrameFlag::Encrypted) {
        warn!(target: "id3v2", "encryption is not supported, dropping frame {}", frame_id);
        return Ok(FrameResult::Dropped);
    }

    let unsync = version == Version::V24
        && (flags.get(FrameFlag::Unsync) || tag_header.flags().unsync);

    let body: Cow<[u8]> = if unsync {
        Cow::Owned(syncdata::decode(raw))
    } else {
        Cow::Borrowed(raw)
    };

    let mut body_stream = BufStream::new(&body);
    let compressed = flags.get(FrameFlag::Compressed);

    if read_prefix(version, &mut header, &mut body_stream).is_err() {
        warn!(target: "id3v2", "frame {} is too short for its flags, dropping it", frame_id);
        return Ok(FrameResult::Dropped);
    }

    let data: Cow<[u8]> = if compressed {
        match inflate_frame(body_stream.take_rest()) {
            Ok(data) => Cow::Owned(data),
            Err(_) => {
                warn!(target: "id3v2", "could not decompress frame {}, dropping it", frame_id);
                return Ok(FrameResult::Dropped);
            }
        }
    } else {
        Cow::Borrowed(body_stream.take_rest())
    };

    match parse_content(tag_header, frame_id, &data) {
        Ok(content) => Ok(FrameResult::Frame(Frame { header, content })),
        Err(err) => {
            warn!(target: "id3v2", "dropping malformed frame {}: {}", frame_id, err);
            Ok(FrameResult::Dropped)
        }
    }
}

// The fields between the header and the body proper. Their order differs between versions.
fn read_prefix(
    version: Version,
    header: &mut FrameHeader,
    stream: &mut BufStream,
) -> ParseResult<()> {
    let flags = *header.flags();
    let compressed = flags.get(FrameFlag::Compressed);

    match version {
        Version::V23 => {
            // Compression implies a plain decompressed size, which we recompute anyway.
            if compressed {
                stream.skip(4)?;
            }

            if flags.get(FrameFlag::Grouped) {
                header.set_group_id(Some(stream.read_u8()?));
            }
        }

        Version::V24 => {
            if flags.get(FrameFlag::Grouped) {
                header.set_group_id(Some(stream.read_u8()?));
            }

            // Some writers forget the indicator flag on compressed frames.
            if flags.get(FrameFlag::DataLenIndicator) || compressed {
                stream.skip(4)?;
            }
        }
    }

    Ok(())
}

pub(crate) fn parse_content(
    tag_header: &TagHeader,
    frame_id: FrameId,
    data: &[u8],
) -> ParseResult<FrameContent> {
    let stream = &mut BufStream::new(data);

    let content = match classify(frame_id) {
        FrameKind::Text => TextFrame::parse(frame_id, stream)?.into(),
        FrameKind::Timestamp => match TimestampFrame::parse(frame_id, stream) {
            Ok(frame) => frame.into(),
            Err(_) => {
                // Keep the bytes rather than lose a date we can't read.
                info!(target: "id3v2", "could not read timestamp in {}, keeping it raw", frame_id);
                UnknownFrame::from_raw(frame_id, data).into()
            }
        },
        FrameKind::Comments => CommentsFrame::parse(stream)?.into(),
        FrameKind::UnsyncLyrics => UnsyncLyricsFrame::parse(stream)?.into(),
        FrameKind::SyncedLyrics => SyncedLyricsFrame::parse(stream)?.into(),
        FrameKind::Picture => AttachedPictureFrame::parse(stream)?.into(),
        FrameKind::UserText => UserTextFrame::parse(stream)?.into(),
        FrameKind::Chapter => ChapterFrame::parse(tag_header, stream)?.into(),
        FrameKind::TableOfContents => TableOfContentsFrame::parse(tag_header, stream)?.into(),
        FrameKind::Unknown => UnknownFrame::from_raw(frame_id, data).into(),
    };

    Ok(content)
}

#[cfg(feature = "id3v2_zlib")]
fn inflate_frame(data: &[u8]) -> ParseResult<Vec<u8>> {
    miniz_oxide::inflate::decompress_to_vec_zlib(data).map_err(|err| {
        warn!(target: "id3v2", "could not decompress frame: {:?}", err);
        ParseError::MalformedData
    })
}

#[cfg(not(feature = "id3v2_zlib"))]
fn inflate_frame(_: &[u8]) -> ParseResult<Vec<u8>> {
    warn!(target: "id3v2", "frame decompression is not enabled");
    Err(ParseError::Unsupported)
}

#[cfg(feature = "id3v2_zlib")]
fn deflate_frame(data: &[u8]) -> Option<Vec<u8>> {
    Some(miniz_oxide::deflate::compress_to_vec_zlib(data, 6))
}

#[cfg(not(feature = "id3v2_zlib"))]
fn deflate_frame(_: &[u8]) -> Option<Vec<u8>> {
    warn!(target: "id3v2", "frame compression is not enabled, writing uncompressed");
    None
}

/// Render a frame, header included. The caller records the resulting size.
pub(crate) fn render(tag_header: &TagHeader, frame: &Frame) -> SaveResult<Vec<u8>> {
    let version = tag_header.version();
    let mut flags = *frame.flags();

    let body = frame.content.render(tag_header);
    let body_len = body.len();

    // These are all recomputed below.
    flags.set(FrameFlag::Encrypted, false);
    flags.set(FrameFlag::DataLenIndicator, false);
    flags.set(FrameFlag::Unsync, false);
    flags.set(FrameFlag::Grouped, frame.header.group_id().is_some());

    let body = if flags.get(FrameFlag::Compressed) {
        deflate_frame(&body).unwrap_or_else(|| {
            flags.set(FrameFlag::Compressed, false);
            body
        })
    } else {
        body
    };

    let compressed = flags.get(FrameFlag::Compressed);
    let mut data = Vec::with_capacity(body.len() + 5);

    match version {
        Version::V23 => {
            if compressed {
                data.extend(checked_size(body_len, u32::MAX)?.to_be_bytes());
            }

            if let Some(group_id) = frame.header.group_id() {
                data.push(group_id);
            }
        }

        Version::V24 => {
            if let Some(group_id) = frame.header.group_id() {
                data.push(group_id);
            }

            if compressed {
                flags.set(FrameFlag::DataLenIndicator, true);
                data.extend(syncdata::from_u28(checked_size(body_len, syncdata::U28_MAX)?));
            }
        }
    }

    data.extend(body);

    if version == Version::V24 && (tag_header.flags().unsync || frame.flags().get(FrameFlag::Unsync)) {
        data = syncdata::encode(&data);
        flags.set(FrameFlag::Unsync, true);
    }

    let mut result = Vec::with_capacity(data.len() + 10);
    result.extend(frame.id().inner());

    match version {
        Version::V23 => result.extend(checked_size(data.len(), u32::MAX)?.to_be_bytes()),
        Version::V24 => {
            result.extend(syncdata::from_u28(checked_size(data.len(), syncdata::U28_MAX)?))
        }
    }

    result.extend(flags.render(version).to_be_bytes());
    result.extend(data);

    Ok(result)
}

fn checked_size(size: usize, max: u32) -> SaveResult<u32> {
    if size > max as usize {
        warn!(target: "id3v2", "frame size {}b exceeds the maximum of {}b", size, max);
        return Err(SaveError::TooLarge);
    }

    Ok(size as u32)
}
