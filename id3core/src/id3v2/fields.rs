//! Generic field names mapped onto concrete frames.

use crate::core::string::{self, Encoding};
use crate::id3v2::frames::{
    AttachedPictureFrame, CommentsFrame, Frame, FrameError, FrameId, Language, TextFrame,
    Timestamp, TimestampFrame, UnsyncLyricsFrame,
};
use crate::id3v2::{Tag, Version};
use std::fmt::{self, Display, Formatter};

/// A common piece of metadata, independent of the frame that stores it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Field {
    Title,
    Artist,
    Album,
    AlbumArtist,
    Year,
    Comment,
    Genre,
    TrackNumber,
    DiscNumber,
    Composer,
    Lyrics,
    Picture,
}

struct Mapping {
    field: Field,
    name: &'static str,
    v3: &'static [u8; 4],
    v4: &'static [u8; 4],
}

#[rustfmt::skip]
const MAPPINGS: &[Mapping] = &[
    Mapping { field: Field::Title, name: "title", v3: b"TIT2", v4: b"TIT2" },
    Mapping { field: Field::Artist, name: "artist", v3: b"TPE1", v4: b"TPE1" },
    Mapping { field: Field::Album, name: "album", v3: b"TALB", v4: b"TALB" },
    Mapping { field: Field::AlbumArtist, name: "album_artist", v3: b"TPE2", v4: b"TPE2" },
    Mapping { field: Field::Year, name: "year", v3: b"TYER", v4: b"TDRC" },
    Mapping { field: Field::Comment, name: "comment", v3: b"COMM", v4: b"COMM" },
    Mapping { field: Field::Genre, name: "genre", v3: b"TCON", v4: b"TCON" },
    Mapping { field: Field::TrackNumber, name: "track", v3: b"TRCK", v4: b"TRCK" },
    Mapping { field: Field::DiscNumber, name: "disc", v3: b"TPOS", v4: b"TPOS" },
    Mapping { field: Field::Composer, name: "composer", v3: b"TCOM", v4: b"TCOM" },
    Mapping { field: Field::Lyrics, name: "lyrics", v3: b"USLT", v4: b"USLT" },
    Mapping { field: Field::Picture, name: "picture", v3: b"APIC", v4: b"APIC" },
];

// Language given to comments and lyrics created through a field.
const FIELD_LANG: &[u8; 3] = b"eng";

impl Field {
    pub const ALL: [Field; 12] = [
        Field::Title,
        Field::Artist,
        Field::Album,
        Field::AlbumArtist,
        Field::Year,
        Field::Comment,
        Field::Genre,
        Field::TrackNumber,
        Field::DiscNumber,
        Field::Composer,
        Field::Lyrics,
        Field::Picture,
    ];

    /// Look up a field by its lowercase name, such as `album_artist`.
    pub fn from_name(name: &str) -> Option<Field> {
        MAPPINGS
            .iter()
            .find(|mapping| mapping.name == name)
            .map(|mapping| mapping.field)
    }

    pub fn name(&self) -> &'static str {
        self.mapping().name
    }

    /// The frame that holds this field in a tag of `version`.
    pub fn frame_id(&self, version: Version) -> FrameId {
        let mapping = self.mapping();

        match version {
            Version::V23 => FrameId::known(mapping.v3),
            Version::V24 => FrameId::known(mapping.v4),
        }
    }

    fn mapping(&self) -> &'static Mapping {
        // Every field has exactly one mapping.
        &MAPPINGS[*self as usize]
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write![f, "{}", self.name()]
    }
}

impl Tag {
    /// The value of `field` as a display string, if the tag has it.
    ///
    /// Comments and lyrics prefer the frame without a description.
    pub fn field(&self, field: Field) -> Option<String> {
        let frame_id = field.frame_id(self.version());

        match field {
            Field::Comment => {
                let frame = self.described_frame::<CommentsFrame, _>(frame_id, |frame| &frame.desc)?;
                Some(frame.text.clone())
            }

            Field::Lyrics => {
                let frame =
                    self.described_frame::<UnsyncLyricsFrame, _>(frame_id, |frame| &frame.desc)?;
                Some(frame.lyrics.clone())
            }

            Field::Picture => self
                .frames()
                .get_all(frame_id.inner())
                .first()
                .map(|frame| frame.to_string()),

            _ => self.get(frame_id.as_str()).map(|frame| frame.to_string()),
        }
    }

    /// Create or replace the frame behind `field` with a single `value`.
    ///
    /// The encoding is picked for the tag version: UTF-8 on ID3v2.4, and Latin-1 or
    /// UTF-16 on ID3v2.3. Pictures have to go through [`set_picture`](Tag::set_picture).
    pub fn set_field(&mut self, field: Field, value: &str) -> Result<(), FrameError> {
        let version = self.version();
        let frame_id = field.frame_id(version);
        let encoding = field_encoding(version, value);

        let frame: Frame = match field {
            Field::Picture => return Err(FrameError::NotText(field)),

            Field::Comment => {
                let lang = Language::new(FIELD_LANG)?;
                CommentsFrame::new(encoding, lang, "", value).into()
            }

            Field::Lyrics => {
                let mut frame = UnsyncLyricsFrame::new(Language::new(FIELD_LANG)?, "", value);
                frame.encoding = encoding;
                frame.into()
            }

            Field::Year if version == Version::V24 => {
                let mut frame = TimestampFrame::new(frame_id, value.trim().parse::<Timestamp>()?)?;
                frame.encoding = encoding;
                frame.into()
            }

            // ID3v2.3 only has room for the year.
            Field::Year => {
                let year = format!["{:04}", value.trim().parse::<Timestamp>()?.year()];
                TextFrame::with_text(frame_id, field_encoding(version, &year), &year)?.into()
            }

            _ => TextFrame::with_text(frame_id, encoding, value)?.into(),
        };

        self.set(frame);

        Ok(())
    }

    /// Remove every frame `field` maps to, returning how many were removed.
    pub fn remove_field(&mut self, field: Field) -> usize {
        let frame_id = field.frame_id(self.version());
        self.remove_all(frame_id.inner()).len()
    }

    /// Add a picture, replacing the one with the same description.
    pub fn set_picture(&mut self, frame: AttachedPictureFrame) -> Option<Frame> {
        self.set(frame)
    }

    // The first frame of `frame_id` with an empty description, or the first one at all.
    fn described_frame<T, F>(&self, frame_id: FrameId, desc: F) -> Option<&T>
    where
        T: crate::id3v2::frames::AsContent,
        F: Fn(&T) -> &String,
    {
        let candidates: Vec<&T> = self
            .frames()
            .get_all(frame_id.inner())
            .into_iter()
            .filter_map(|frame| frame.downcast::<T>())
            .collect();

        candidates
            .iter()
            .find(|frame| desc(frame).is_empty())
            .or_else(|| candidates.first())
            .copied()
    }
}

fn field_encoding(version: Version, value: &str) -> Encoding {
    match version {
        Version::V24 => Encoding::Utf8,
        Version::V23 if string::is_latin1(value) => Encoding::Latin1,
        Version::V23 => Encoding::Utf16,
    }
}
