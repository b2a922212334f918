//! Frame headers and flags.

use crate::core::io::BufStream;
use crate::id3v2::frames::FrameId;
use crate::id3v2::tag::Version;
use crate::id3v2::{syncdata, ParseError, ParseResult};
use log::info;

/// The logical frame flags, independent of where each version stores them.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FrameFlag {
    /// Discard this frame if the tag is altered and the frame is unknown.
    TagAlterPreservation,
    /// Discard this frame if the audio is altered.
    FileAlterPreservation,
    ReadOnly,
    /// The frame carries a group identifier byte.
    Grouped,
    /// The frame body is zlib-compressed.
    Compressed,
    /// The frame body is encrypted. Such frames are never kept.
    Encrypted,
    /// The frame body is unsynchronised. ID3v2.4 only.
    Unsync,
    /// The frame carries a data length indicator. ID3v2.4 only.
    DataLenIndicator,
}

/// Where each flag lives in the two flag bytes, read as a big-endian `u16`, for
/// ID3v2.3 and ID3v2.4 respectively. Zero means the version has no such flag.
const FLAG_BITS: &[(FrameFlag, u16, u16)] = &[
    (FrameFlag::TagAlterPreservation, 0x8000, 0x4000),
    (FrameFlag::FileAlterPreservation, 0x4000, 0x2000),
    (FrameFlag::ReadOnly, 0x2000, 0x1000),
    (FrameFlag::Grouped, 0x0020, 0x0040),
    (FrameFlag::Compressed, 0x0080, 0x0008),
    (FrameFlag::Encrypted, 0x0040, 0x0004),
    (FrameFlag::Unsync, 0x0000, 0x0002),
    (FrameFlag::DataLenIndicator, 0x0000, 0x0001),
];

fn flag_bit(flag: FrameFlag, version: Version) -> u16 {
    FLAG_BITS
        .iter()
        .find(|(entry, _, _)| *entry == flag)
        .map(|(_, v3, v4)| match version {
            Version::V23 => *v3,
            Version::V24 => *v4,
        })
        .unwrap_or(0)
}

/// A set of [`FrameFlag`](FrameFlag)s.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FrameFlags(u8);

impl FrameFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, flag: FrameFlag) -> bool {
        self.0 & Self::mask(flag) != 0
    }

    pub fn set(&mut self, flag: FrameFlag, value: bool) {
        if value {
            self.0 |= Self::mask(flag);
        } else {
            self.0 &= !Self::mask(flag);
        }
    }

    /// Decode the raw flag bytes. Bits with no meaning in `version` are ignored.
    pub(crate) fn parse(raw: u16, version: Version) -> Self {
        let mut flags = Self::default();

        for &(flag, _, _) in FLAG_BITS {
            let bit = flag_bit(flag, version);
            flags.set(flag, bit != 0 && raw & bit != 0);
        }

        flags
    }

    /// Encode into raw flag bytes. Flags with no place in `version` are dropped.
    pub(crate) fn render(&self, version: Version) -> u16 {
        FLAG_BITS
            .iter()
            .filter(|(flag, _, _)| self.get(*flag))
            .fold(0, |raw, (flag, _, _)| raw | flag_bit(*flag, version))
    }

    fn mask(flag: FrameFlag) -> u8 {
        1 << flag as u8
    }
}

/// The header in front of every frame body.
#[derive(Clone, Debug)]
pub struct FrameHeader {
    frame_id: FrameId,
    frame_size: usize,
    flags: FrameFlags,
    group_id: Option<u8>,
}

impl FrameHeader {
    pub(crate) fn new(frame_id: FrameId) -> Self {
        Self {
            frame_id,
            frame_size: 0,
            flags: FrameFlags::default(),
            group_id: None,
        }
    }

    pub(crate) fn parse(version: Version, stream: &mut BufStream) -> ParseResult<Self> {
        let frame_id = FrameId::new(&stream.read_array()?).map_err(|_| ParseError::MalformedData)?;
        let size_bytes = stream.read_array()?;

        let frame_size = match version {
            Version::V23 => u32::from_be_bytes(size_bytes) as usize,
            Version::V24 => {
                let size = syncdata::to_u28(size_bytes) as usize;

                if size >= 0x80 {
                    fix_itunes_frame_size(size_bytes, size, stream)
                } else {
                    size
                }
            }
        };

        let flags = FrameFlags::parse(stream.read_u16()?, version);

        Ok(Self {
            frame_id,
            frame_size,
            flags,
            group_id: None,
        })
    }

    pub fn id(&self) -> FrameId {
        self.frame_id
    }

    /// The body size recorded when this frame was last parsed or rendered.
    pub fn size(&self) -> usize {
        self.frame_size
    }

    pub fn flags(&self) -> &FrameFlags {
        &self.flags
    }

    pub fn flags_mut(&mut self) -> &mut FrameFlags {
        &mut self.flags
    }

    pub fn group_id(&self) -> Option<u8> {
        self.group_id
    }

    /// Set or clear the group identifier, which also toggles the grouped flag.
    pub fn set_group_id(&mut self, group_id: Option<u8>) {
        self.group_id = group_id;
        self.flags.set(FrameFlag::Grouped, group_id.is_some());
    }

    pub(crate) fn set_size(&mut self, size: usize) {
        self.frame_size = size;
    }
}

// Some writers stored plain big-endian sizes in ID3v2.4 tags. If the synchsafe size leads
// into garbage but the plain size leads to another frame, the plain size wins.
fn fix_itunes_frame_size(size_bytes: [u8; 4], v4_size: usize, stream: &BufStream) -> usize {
    // The stream sits right before the flag bytes.
    let next_id = |size: usize| stream.peek(size + 2..size + 6).ok();

    match next_id(v4_size) {
        Some(id) if id[0] != 0 && !FrameId::is_valid(id) => {}
        _ => return v4_size,
    }

    let v3_size = u32::from_be_bytes(size_bytes) as usize;

    match next_id(v3_size) {
        Some(id) if FrameId::is_valid(id) => {
            info!(target: "id3v2", "correcting non-synchsafe ID3v2.4 frame size");
            v3_size
        }

        _ => v4_size,
    }
}
