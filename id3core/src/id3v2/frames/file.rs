//! Attached pictures.

use crate::core::io::BufStream;
use crate::core::string::{self, Encoding};
use crate::id3v2::frames::{encoding, FrameBody, FrameError, FrameId};
use crate::id3v2::tag::TagHeader;
use crate::id3v2::ParseResult;
use std::fmt::{self, Display, Formatter};

/// Longest description a picture can be given, in characters.
pub const MAX_DESC_LEN: usize = 64;

#[derive(Default, Debug, Clone)]
pub struct AttachedPictureFrame {
    pub encoding: Encoding,
    pub mime: String,
    pub pic_type: PictureType,
    desc: String,
    pub picture: Vec<u8>,
}

impl AttachedPictureFrame {
    pub fn new(
        mime: &str,
        pic_type: PictureType,
        desc: &str,
        picture: Vec<u8>,
    ) -> Result<Self, FrameError> {
        let mut frame = Self {
            mime: mime.to_string(),
            pic_type,
            picture,
            ..Self::default()
        };

        frame.set_desc(desc)?;

        Ok(frame)
    }

    pub(crate) fn parse(stream: &mut BufStream) -> ParseResult<Self> {
        let encoding = encoding::parse(stream)?;

        let mut mime = string::read_terminated(Encoding::Latin1, stream);

        // image/ is implied when there is no mime type.
        if mime.is_empty() {
            mime.push_str("image/");
        }

        let pic_type = PictureType::parse(stream.read_u8()?);

        // Descriptions in existing tags are kept whatever their length.
        let desc = string::read_terminated(encoding, stream);
        let picture = stream.take_rest().to_vec();

        Ok(Self {
            encoding,
            mime,
            pic_type,
            desc,
            picture,
        })
    }

    pub fn desc(&self) -> &str {
        &self.desc
    }

    pub fn set_desc(&mut self, desc: &str) -> Result<(), FrameError> {
        let len = desc.chars().count();

        if len > MAX_DESC_LEN {
            return Err(FrameError::DescriptionTooLong(len));
        }

        self.desc = desc.to_string();

        Ok(())
    }
}

impl FrameBody for AttachedPictureFrame {
    fn id(&self) -> FrameId {
        FrameId::known(b"APIC")
    }

    fn key(&self) -> String {
        format!["APIC:{}", self.desc]
    }

    fn is_empty(&self) -> bool {
        self.picture.is_empty()
    }

    fn render(&self, tag_header: &TagHeader) -> Vec<u8> {
        let encoding = encoding::check(self.encoding, tag_header.version());

        let mut result = vec![encoding::render(encoding)];
        result.extend(string::render_terminated(Encoding::Latin1, &self.mime));
        result.push(self.pic_type as u8);
        result.extend(string::render_terminated(encoding, &self.desc));
        result.extend(&self.picture);

        result
    }
}

impl Display for AttachedPictureFrame {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write![f, "{} ", self.mime]?;

        if !self.desc.is_empty() {
            write![f, "\"{}\" ", self.desc]?;
        }

        write![f, "[{:?}]", self.pic_type]
    }
}

byte_enum! {
    pub enum PictureType {
        Other = 0x00,
        FileIcon = 0x01,
        OtherFileIcon = 0x02,
        FrontCover = 0x03,
        BackCover = 0x04,
        LeafletPage = 0x05,
        Media = 0x06,
        LeadArtist = 0x07,
        Artist = 0x08,
        Conductor = 0x09,
        Band = 0x0A,
        Composer = 0x0B,
        Writer = 0x0C,
        RecordingLocation = 0x0D,
        DuringRecording = 0x0E,
        DuringPerformance = 0x0F,
        MovieScreenCapture = 0x10,
        ColoredFish = 0x11,
        Illustration = 0x12,
        BandLogo = 0x13,
        PublisherLogo = 0x14,
    };
    PictureType::Other
}

impl Default for PictureType {
    fn default() -> Self {
        PictureType::FrontCover
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const APIC_DATA: &[u8] = b"APIC\x00\x00\x00\x2B\x00\x00\
                               \x00\
                               image/png\0\
                               \x03\
                               Geodesic Dome\0\
                               \x16\x16\x16\x16\x16\x16\x16\x16\x16\x16\x16\x16\x16\x16\x16\x16\x16";

    #[test]
    fn parse_apic() {
        make_frame!(AttachedPictureFrame, APIC_DATA, frame);

        assert_eq!(frame.encoding, Encoding::Latin1);
        assert_eq!(frame.mime, "image/png");
        assert_eq!(frame.pic_type, PictureType::FrontCover);
        assert_eq!(frame.desc(), "Geodesic Dome");
        assert_eq!(frame.picture, &[0x16; 17][..]);
        assert_eq!(frame.key(), "APIC:Geodesic Dome");
    }

    #[test]
    fn render_apic() {
        let mut frame = AttachedPictureFrame::new(
            "image/png",
            PictureType::FrontCover,
            "Geodesic Dome",
            vec![0x16; 17],
        )
        .unwrap();

        frame.encoding = Encoding::Latin1;

        assert_render!(frame, APIC_DATA);
    }

    #[test]
    fn implied_mime() {
        let data = b"APIC\x00\x00\x00\x05\x00\x00\x00\0\x01\0\xAB";
        make_frame!(AttachedPictureFrame, data, frame);

        assert_eq!(frame.mime, "image/");
        assert_eq!(frame.pic_type, PictureType::FileIcon);
        assert_eq!(frame.picture, b"\xAB");
    }

    #[test]
    fn limit_desc_length() {
        let desc = "a".repeat(MAX_DESC_LEN);
        assert!(AttachedPictureFrame::new("image/png", PictureType::Other, &desc, vec![1]).is_ok());

        let desc = "a".repeat(MAX_DESC_LEN + 1);
        assert_eq!(
            AttachedPictureFrame::new("image/png", PictureType::Other, &desc, vec![1]).unwrap_err(),
            FrameError::DescriptionTooLong(MAX_DESC_LEN + 1)
        );
    }
}
