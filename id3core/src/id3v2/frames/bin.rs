use crate::id3v2::frames::{expect_kind, FrameBody, FrameError, FrameId, FrameKind};
use crate::id3v2::tag::TagHeader;
use std::fmt::{self, Display, Formatter};

/// A frame whose body is kept as raw bytes.
///
/// Frames with an identifier this crate has no typed body for are read into this, as are
/// timestamp frames that could not be read. The bytes are written back untouched.
///
/// Any number of these can share an identifier. The first is keyed by the identifier
/// alone, later ones by the identifier and their position among frames of that identifier,
/// such as `PRIV:1`.
#[derive(Debug, Clone)]
pub struct UnknownFrame {
    frame_id: FrameId,
    index: usize,
    pub data: Vec<u8>,
}

impl UnknownFrame {
    pub fn new(frame_id: FrameId, data: Vec<u8>) -> Result<Self, FrameError> {
        expect_kind(frame_id, FrameKind::Unknown)?;

        Ok(Self {
            frame_id,
            index: 0,
            data,
        })
    }

    pub(crate) fn from_raw(frame_id: FrameId, data: &[u8]) -> Self {
        Self {
            frame_id,
            index: 0,
            data: data.to_vec(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }
}

impl FrameBody for UnknownFrame {
    fn id(&self) -> FrameId {
        self.frame_id
    }

    fn key(&self) -> String {
        match self.index {
            0 => self.frame_id.to_string(),
            n => format!["{}:{}", self.frame_id, n],
        }
    }

    fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn render(&self, _: &TagHeader) -> Vec<u8> {
        self.data.clone()
    }
}

impl Display for UnknownFrame {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write![f, "[{} bytes]", self.data.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reject_known_ids() {
        assert!(UnknownFrame::new(FrameId::known(b"PRIV"), vec![1]).is_ok());
        assert!(UnknownFrame::new(FrameId::known(b"TIT2"), vec![1]).is_err());
        assert!(UnknownFrame::new(FrameId::known(b"APIC"), vec![1]).is_err());
    }

    #[test]
    fn display_unknown() {
        let frame = UnknownFrame::new(FrameId::known(b"PRIV"), vec![0; 16]).unwrap();
        assert_eq!(frame.to_string(), "[16 bytes]");
        assert_eq!(frame.key(), "PRIV");
    }

    #[test]
    fn key_by_index() {
        let mut frame = UnknownFrame::new(FrameId::known(b"PRIV"), vec![1]).unwrap();
        frame.set_index(2);
        assert_eq!(frame.key(), "PRIV:2");
    }
}
