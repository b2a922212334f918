//! Legacy ID3v1 trailers.
//!
//! These are only read. A file that has one loses it the moment an ID3v2 tag is committed,
//! and its fields can be used to seed a fresh ID3v2 tag.

use crate::core::string::{self, Encoding};
use crate::file::File;
use crate::id3v2::{Field, Tag as Id3v2Tag, Version};
use log::info;
use std::io;

/// Size of an ID3v1 trailer.
pub const TAG_SIZE: usize = 128;

const ID: &[u8] = b"TAG";

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Tag {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub year: String,
    pub comment: String,
    /// Only present in ID3v1.1 trailers.
    pub track: Option<u8>,
    pub genre: Option<u8>,
}

impl Tag {
    pub fn parse(raw: &[u8; TAG_SIZE]) -> Option<Self> {
        if &raw[0..3] != ID {
            return None;
        }

        // ID3v1.1 steals the last byte of the comment for the track number, marked by a
        // zero byte in front of it.
        let (comment, track) = if raw[125] == 0 && raw[126] != 0 {
            (&raw[97..125], Some(raw[126]))
        } else {
            (&raw[97..127], None)
        };

        let genre = match raw[127] {
            0xFF => None,
            genre => Some(genre),
        };

        Some(Self {
            title: read_field(&raw[3..33]),
            artist: read_field(&raw[33..63]),
            album: read_field(&raw[63..93]),
            year: read_field(&raw[93..97]),
            comment: read_field(comment),
            track,
            genre,
        })
    }

    /// Look for a trailer at the end of `file`.
    pub fn read(file: &mut File) -> io::Result<Option<Self>> {
        let len = file.len()?;

        if len < TAG_SIZE as u64 {
            return Ok(None);
        }

        let mut raw = [0; TAG_SIZE];
        file.seek(len - TAG_SIZE as u64)?;
        file.read_into(&mut raw)?;

        Ok(Self::parse(&raw))
    }

    /// Copy every non-empty field into `tag`.
    pub fn seed(&self, tag: &mut Id3v2Tag) {
        let version = tag.version();

        let fields = [
            (Field::Title, self.title.clone()),
            (Field::Artist, self.artist.clone()),
            (Field::Album, self.album.clone()),
            (Field::Year, self.year.clone()),
            (Field::Comment, self.comment.clone()),
            (Field::TrackNumber, self.track.map(|n| n.to_string()).unwrap_or_default()),
            (Field::Genre, self.genre.map(|n| genre_string(version, n)).unwrap_or_default()),
        ];

        for (field, value) in fields.iter() {
            if value.is_empty() {
                continue;
            }

            if let Err(err) = tag.set_field(*field, value) {
                info!(target: "id3v2", "could not carry over ID3v1 {:?}: {}", field, err);
            }
        }
    }
}

fn read_field(raw: &[u8]) -> String {
    let end = raw.iter().position(|&byte| byte == 0).unwrap_or(raw.len());

    string::decode(Encoding::Latin1, &raw[..end])
        .trim_end()
        .to_string()
}

// ID3v2.3 refers to numeric genres in parentheses, ID3v2.4 writes the bare number.
fn genre_string(version: Version, genre: u8) -> String {
    match version {
        Version::V23 => format!["({})", genre],
        Version::V24 => genre.to_string(),
    }
}
