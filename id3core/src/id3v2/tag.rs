//! The 10-byte tag header and its flags.

use crate::core::io::BufStream;
use crate::id3v2::{syncdata, ParseError, ParseResult};
use std::fmt::{self, Display, Formatter};

pub(crate) const ID_HEADER: &[u8] = b"ID3";
pub(crate) const ID_FOOTER: &[u8] = b"3DI";

/// Size of the tag header, which is also the size of the footer.
pub const HEADER_SIZE: usize = 10;

/// The ID3v2 versions this crate reads and writes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum Version {
    /// ID3v2.3
    V23,
    /// ID3v2.4
    V24,
}

impl Version {
    pub(crate) fn major(&self) -> u8 {
        match self {
            Self::V23 => 3,
            Self::V24 => 4,
        }
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write![f, "ID3v2.{}", self.major()]
    }
}

#[derive(Clone, Debug)]
pub struct TagHeader {
    version: Version,
    revision: u8,
    tag_size: usize,
    flags: TagFlags,
}

impl TagHeader {
    pub(crate) fn parse(raw: [u8; 10]) -> ParseResult<Self> {
        if &raw[0..3] != ID_HEADER {
            return Err(ParseError::NotFound);
        }

        let version = match raw[3] {
            3 => Version::V23,
            4 => Version::V24,
            _ => return Err(ParseError::Unsupported),
        };

        let revision = raw[4];

        if revision == 0xFF {
            return Err(ParseError::MalformedData);
        }

        let flags = raw[5];

        // Undefined flag bits must be clear.
        if (version == Version::V24 && flags & 0x0F != 0)
            || (version == Version::V23 && flags & 0x1F != 0)
        {
            return Err(ParseError::MalformedData);
        }

        let flags = TagFlags {
            unsync: flags & 0x80 != 0,
            extended: flags & 0x40 != 0,
            experimental: flags & 0x20 != 0,
            footer: flags & 0x10 != 0,
        };

        let tag_size = syncdata::to_u28([raw[6], raw[7], raw[8], raw[9]]) as usize;

        // A tag must be able to hold at least one frame header and one byte of data.
        if tag_size <= HEADER_SIZE {
            return Err(ParseError::MalformedData);
        }

        Ok(TagHeader {
            version,
            revision,
            tag_size,
            flags,
        })
    }

    pub(crate) fn render(&self) -> [u8; 10] {
        let mut raw = [0; 10];

        raw[0..3].copy_from_slice(ID_HEADER);
        raw[3] = self.version.major();
        raw[4] = self.revision;

        // Footers and extended headers are never written.
        let mut flags = 0;

        if self.flags.unsync {
            flags |= 0x80;
        }

        if self.flags.experimental {
            flags |= 0x20;
        }

        raw[5] = flags;
        raw[6..10].copy_from_slice(&syncdata::from_u28(self.tag_size as u32));

        raw
    }

    pub(crate) fn with_version(version: Version) -> Self {
        TagHeader {
            version,
            revision: 0,
            tag_size: 0,
            flags: TagFlags::default(),
        }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn revision(&self) -> u8 {
        self.revision
    }

    /// The size of the tag body as declared by the header, padding included and header
    /// and footer excluded.
    pub fn size(&self) -> usize {
        self.tag_size
    }

    /// The number of bytes the whole tag occupies on disk.
    pub fn region_len(&self) -> usize {
        let footer = if self.flags.footer { HEADER_SIZE } else { 0 };
        HEADER_SIZE + self.tag_size + footer
    }

    pub fn flags(&self) -> &TagFlags {
        &self.flags
    }

    pub fn flags_mut(&mut self) -> &mut TagFlags {
        &mut self.flags
    }

    pub(crate) fn set_version(&mut self, version: Version) {
        if self.version != version {
            self.revision = 0;
        }

        self.version = version;
    }

    pub(crate) fn set_size(&mut self, size: usize) {
        self.tag_size = size;
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TagFlags {
    pub unsync: bool,
    pub extended: bool,
    pub experimental: bool,
    /// Only meaningful in ID3v2.4.
    pub footer: bool,
}

/// Skip past an extended header at the start of the tag body. The contents are not kept.
pub(crate) fn skip_ext_header(version: Version, stream: &mut BufStream) -> ParseResult<()> {
    let len = match version {
        // The ID3v2.3 size excludes itself and is 6 or 10 bytes.
        Version::V23 => {
            let size = stream.read_u32()? as usize;

            if size != 6 && size != 10 {
                return Err(ParseError::MalformedData);
            }

            size
        }

        // The ID3v2.4 size is synchsafe and includes itself.
        Version::V24 => {
            let size = syncdata::read_u28(stream)? as usize;

            if size < 6 {
                return Err(ParseError::MalformedData);
            }

            size - 4
        }
    };

    stream.skip(len)?;

    Ok(())
}

/// Validate an ID3v2.4 footer against its header.
pub(crate) fn check_footer(header: &TagHeader, raw: [u8; 10]) -> bool {
    &raw[0..3] == ID_FOOTER
        && raw[3] == header.version.major()
        && raw[6..10] == syncdata::from_u28(header.tag_size as u32)
}
