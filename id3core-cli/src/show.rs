use crate::{errorln, print_entry, print_header};
use crate::CliError;

use clap::Values;
use id3core::id3v2::frames::{CommentsFrame, Frame, FrameId, UnsyncLyricsFrame, UserTextFrame};
use id3core::id3v2::{ParseError, Tag};
use std::cmp::{Ord, Ordering, PartialOrd};
use std::fmt::{self, Display, Formatter};

#[derive(Debug, Eq, PartialEq)]
pub struct DisplayTag {
    pub name: DisplayName,
    pub value: String,
}

impl DisplayTag {
    pub fn print(&self, indents: usize) {
        print_entry!("{}{}:", format!["{:>i$}", "", i = indents], self.name);

        let split: Vec<&str> = self
            .value
            .split('\n')
            .filter(|string| !string.is_empty())
            .collect();

        if split.len() == 1 {
            println!(" {}", split[0]);
        } else {
            let indent = format!["{:>i$}", "", i = indents + 2];

            println!();
            for line in split {
                println!("{}{}", indent, line);
            }
        }
    }
}

impl Ord for DisplayTag {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl PartialOrd for DisplayTag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Eq, PartialEq)]
pub enum DisplayName {
    Name(&'static str),
    Custom(&'static str, String),
    Unknown(String),
}

impl DisplayName {
    fn rank(&self) -> u8 {
        match self {
            Self::Name(_) => 0,
            Self::Custom(_, _) => 1,
            Self::Unknown(_) => 2,
        }
    }
}

impl Ord for DisplayName {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Name(my_name), Self::Name(other_name)) => my_name.cmp(other_name),
            (Self::Custom(_, my_name), Self::Custom(_, other_name)) => my_name.cmp(other_name),
            (Self::Unknown(my_raw), Self::Unknown(other_raw)) => my_raw.cmp(other_raw),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for DisplayName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for DisplayName {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Name(name) => write![f, "{}", name],
            Self::Custom(_, name) => write![f, "{}", name],
            Self::Unknown(raw) => write![f, "{}", raw],
        }
    }
}

pub type TagFilter<'a> = Option<Values<'a>>;

/// Print the tags of every file in `paths`. Returns whether every file could be shown.
///
/// `filter` narrows the output down to readable names like `title` or `comment (desc)`,
/// or to raw frame ids prefixed with `^`, like `^TPE1`.
pub fn show<'a>(paths: Values<'a>, filter: TagFilter<'a>) -> bool {
    let mut ok = true;

    for path in paths {
        // It's okay if a file fails to parse here, just log the problem and move on.
        if let Err(err) = show_file(path, filter.clone()) {
            errorln!("{}: {}", path, err);
            ok = false;
        }
    }

    ok
}

fn show_file<'a>(path: &'a str, filter: TagFilter<'a>) -> Result<(), CliError> {
    let tag = match Tag::open(path) {
        Ok(tag) => tag,
        Err(ParseError::IoError(err)) => return Err(CliError::IoError(err)),
        Err(_) => return Err(CliError::NoMetadata),
    };

    let tags = display_tags(&tag, filter);

    print_header!("Metadata for {}:", path);
    println!("  {}:", tag.version());

    for tag in tags {
        tag.print(4)
    }

    Ok(())
}

fn display_tags(tag: &Tag, filter: TagFilter) -> Vec<DisplayTag> {
    let mut tags = Vec::new();
    let (filter_names, filter_ids) = process_filter(filter);

    for (key, frame) in tag.frames() {
        let display_tag = transform_frame(key, frame);

        if !filter_ids.is_empty() || !filter_names.is_empty() {
            if filter_ids.contains(&frame.id()) {
                // Filter case 1: A manual ^XXXX id was specified.
                tags.push(display_tag)
            } else {
                // Filter case 2: A readable name was specified.
                // This could be in the form of a simple tag name like "title",
                // the name of a custom tag like "replaygain_track_gain", or the
                // name of a specific tag variation, like "comment (xyz)".
                let name_matches = match display_tag.name {
                    DisplayName::Name(ref name) => filter_names.contains(name),
                    DisplayName::Custom(ref name, ref custom) => {
                        filter_names.contains(name) || filter_names.contains(&custom.as_str())
                    }
                    DisplayName::Unknown(_) => false,
                };

                if name_matches {
                    tags.push(display_tag)
                }
            }
        } else {
            tags.push(display_tag)
        }
    }

    tags.sort();

    tags
}

fn process_filter(filter: TagFilter) -> (Vec<&str>, Vec<FrameId>) {
    let mut filter_names = Vec::new();
    let mut filter_ids = Vec::new();

    if let Some(tags) = filter {
        for tag in tags {
            if let Some(Ok(id)) = tag.strip_prefix('^').map(|id| id.parse::<FrameId>()) {
                // User inputted a raw frame ID
                filter_ids.push(id);
            } else {
                filter_names.push(tag);
            }
        }
    }

    (filter_names, filter_ids)
}

// --- FRAME TRANSFORMATION ---

fn transform_frame(key: &str, frame: &Frame) -> DisplayTag {
    for analogue in SHOW_ANALOGUES {
        if analogue.ids.iter().any(|id| frame.id() == **id) {
            if let Some(tag) = (analogue.transform)(analogue.name, frame) {
                return tag;
            }
        }
    }

    DisplayTag {
        name: DisplayName::Unknown(key.to_string()),
        value: frame.to_string(),
    }
}

type Transform = fn(&'static str, &Frame) -> Option<DisplayTag>;

struct Analogue {
    ids: &'static [&'static [u8; 4]],
    name: &'static str,
    transform: Transform,
}

// All ID3v2 frames that have a readable name.
#[rustfmt::skip]
static SHOW_ANALOGUES: &[Analogue] = &[
    Analogue { ids: &[b"TALB"], name: "album", transform: plain_transform },
    Analogue { ids: &[b"TCOM"], name: "composer", transform: plain_transform },
    Analogue { ids: &[b"TCON"], name: "genre", transform: plain_transform },
    Analogue { ids: &[b"TCOP"], name: "copyright", transform: plain_transform },
    Analogue { ids: &[b"TENC"], name: "encoded_by", transform: plain_transform },
    Analogue { ids: &[b"TEXT"], name: "writer", transform: plain_transform },
    Analogue { ids: &[b"TFLT"], name: "file_type", transform: plain_transform },
    Analogue { ids: &[b"TIT1"], name: "category", transform: plain_transform },
    Analogue { ids: &[b"TIT2"], name: "title", transform: plain_transform },
    Analogue { ids: &[b"TIT3"], name: "subtitle", transform: plain_transform },
    Analogue { ids: &[b"TKEY"], name: "initial_key", transform: plain_transform },
    Analogue { ids: &[b"TLAN"], name: "language", transform: plain_transform },
    Analogue { ids: &[b"TMED"], name: "media_type", transform: plain_transform },
    Analogue { ids: &[b"TOAL"], name: "original_album", transform: plain_transform },
    Analogue { ids: &[b"TOFN"], name: "original_filename", transform: plain_transform },
    Analogue { ids: &[b"TOLY"], name: "original_writer", transform: plain_transform },
    Analogue { ids: &[b"TOPE"], name: "original_artist", transform: plain_transform },
    Analogue { ids: &[b"TOWN"], name: "owner", transform: plain_transform },
    Analogue { ids: &[b"TPE1"], name: "artist", transform: plain_transform },
    Analogue { ids: &[b"TPE2"], name: "album_artist", transform: plain_transform },
    Analogue { ids: &[b"TPE3"], name: "conductor", transform: plain_transform },
    Analogue { ids: &[b"TPE4"], name: "remixer", transform: plain_transform },
    Analogue { ids: &[b"TPUB"], name: "publisher", transform: plain_transform },
    Analogue { ids: &[b"TRSN"], name: "station", transform: plain_transform },
    Analogue { ids: &[b"TRSO"], name: "station_owner", transform: plain_transform },
    Analogue { ids: &[b"TSRC"], name: "isrc", transform: plain_transform },
    Analogue { ids: &[b"TSSE"], name: "encoding", transform: plain_transform },
    Analogue { ids: &[b"TRDA"], name: "recording_dates", transform: plain_transform }, // [ID3v2.3]
    Analogue { ids: &[b"TMOO"], name: "mood", transform: plain_transform }, // [ID3v2.4]
    Analogue { ids: &[b"TPRO"], name: "copyright_notice", transform: plain_transform }, // [ID3v2.4]
    Analogue { ids: &[b"TSOA"], name: "sort_album", transform: plain_transform }, // [ID3v2.4]
    Analogue { ids: &[b"TSOP"], name: "sort_artist", transform: plain_transform }, // [ID3v2.4]
    Analogue { ids: &[b"TSOT"], name: "sort_title", transform: plain_transform }, // [ID3v2.4]
    Analogue { ids: &[b"TSST"], name: "sort_subtitle", transform: plain_transform }, // [ID3v2.4]
    Analogue { ids: &[b"TSO2"], name: "sort_album_artist", transform: plain_transform }, // [iTunes]
    Analogue { ids: &[b"TSOC"], name: "sort_composer", transform: plain_transform }, // [iTunes]
    Analogue { ids: &[b"TCAT"], name: "podcast_category", transform: plain_transform }, // [iTunes]
    Analogue { ids: &[b"TDES"], name: "podcast_desc", transform: plain_transform }, // [iTunes]
    Analogue { ids: &[b"TGID"], name: "podcast_id", transform: plain_transform }, // [iTunes]
    Analogue { ids: &[b"MVNM"], name: "movement_name", transform: plain_transform }, // [iTunes]
    Analogue { ids: &[b"GRP1"], name: "grouping", transform: plain_transform }, // [iTunes]
    Analogue { ids: &[b"TBPM"], name: "bpm", transform: plain_transform },
    Analogue { ids: &[b"TDLY"], name: "playlist_delay", transform: plain_transform },
    Analogue { ids: &[b"TLEN"], name: "length", transform: plain_transform },
    Analogue { ids: &[b"TPOS"], name: "disc", transform: plain_transform },
    Analogue { ids: &[b"TRCK"], name: "track", transform: plain_transform },
    Analogue { ids: &[b"MVIN"], name: "movement_no", transform: plain_transform },
    Analogue { ids: &[b"TDEN"], name: "encoding_date", transform: plain_transform }, // [ID3v2.4]
    Analogue { ids: &[b"TDOR", b"TORY"], name: "original_release_date", transform: plain_transform },
    Analogue { ids: &[b"TDRL"], name: "release_date", transform: plain_transform }, // [ID3v2.4]
    Analogue { ids: &[b"TDTG"], name: "tagging_date", transform: plain_transform }, // [ID3v2.4]
    Analogue { ids: &[b"TIPL"], name: "people", transform: plain_transform }, // [ID3v2.4]
    Analogue { ids: &[b"TMCL"], name: "musicians", transform: plain_transform }, // [ID3v2.4]
    Analogue { ids: &[b"APIC"], name: "picture", transform: plain_transform },
    Analogue { ids: &[b"SYLT"], name: "synced_lyrics", transform: plain_transform },
    Analogue { ids: &[b"TDRC", b"TYER", b"TDAT", b"TIME"], name: "date", transform: date_transform },
    Analogue { ids: &[b"COMM"], name: "comment", transform: comm_transform },
    Analogue { ids: &[b"USLT"], name: "lyrics", transform: uslt_transform },
    Analogue { ids: &[b"TXXX"], name: "custom_text", transform: txxx_transform },
    Analogue { ids: &[b"CHAP"], name: "chapter", transform: plain_transform },
    Analogue { ids: &[b"CTOC"], name: "table_of_contents", transform: plain_transform },
];

// Basic frame transformation using the name and
// the string representation of the frame.
fn plain_transform(name: &'static str, frame: &Frame) -> Option<DisplayTag> {
    Some(DisplayTag {
        name: DisplayName::Name(name),
        value: frame.to_string(),
    })
}

// Date frame [TDRC, TYER, TDAT, TIME] transformation, which adds proper
// clarification to frame names while still aliasing all of them under "date".
fn date_transform(name: &'static str, frame: &Frame) -> Option<DisplayTag> {
    let name = match frame.id().inner() {
        b"TYER" => DisplayName::Custom(name, String::from("year")),
        b"TDAT" => DisplayName::Custom(name, String::from("recording_date")),
        b"TIME" => DisplayName::Custom(name, String::from("recording_time")),
        _ => DisplayName::Name(name),
    };

    Some(DisplayTag {
        name,
        value: frame.to_string(),
    })
}

// COMM frame transformation, adding the description alongside the normal name.
fn comm_transform(name: &'static str, frame: &Frame) -> Option<DisplayTag> {
    let comm = frame.downcast::<CommentsFrame>()?;

    Some(DisplayTag {
        name: described(name, &comm.desc),
        value: comm.text.clone(),
    })
}

// USLT frame transformation, adding the description alongside the normal name.
fn uslt_transform(name: &'static str, frame: &Frame) -> Option<DisplayTag> {
    let uslt = frame.downcast::<UnsyncLyricsFrame>()?;

    Some(DisplayTag {
        name: described(name, &uslt.desc),
        value: uslt.lyrics.clone(),
    })
}

// TXXX frame transformation, adding the description alongside the normal name.
fn txxx_transform(name: &'static str, frame: &Frame) -> Option<DisplayTag> {
    let txxx = frame.downcast::<UserTextFrame>()?;

    Some(DisplayTag {
        name: DisplayName::Custom(name, txxx.desc.clone()),
        value: txxx.to_string(),
    })
}

fn described(name: &'static str, desc: &str) -> DisplayName {
    if desc.is_empty() {
        DisplayName::Name(name)
    } else {
        DisplayName::Custom(name, format!["{} ({})", name, desc])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use id3core::id3v2::frames::Language;
    use id3core::id3v2::{Field, Version};
    use id3core::Encoding;

    fn tag() -> Tag {
        let mut tag = Tag::new(Version::V24);

        tag.set_field(Field::Title, "Title").unwrap();
        tag.set_field(Field::Artist, "Artist").unwrap();
        tag.set_field(Field::Year, "2020").unwrap();
        tag.set(CommentsFrame::new(Encoding::Utf8, Language::default(), "desc", "Text"));
        tag.set(UserTextFrame::new("replaygain_track_gain", "-6.0 dB"));

        tag
    }

    #[test]
    fn name_frames() {
        let tags = display_tags(&tag(), None);
        let names: Vec<String> = tags.iter().map(|tag| tag.name.to_string()).collect();

        assert_eq!(
            names,
            &["artist", "date", "title", "comment (desc)", "replaygain_track_gain"]
        );
    }

    #[test]
    fn keep_unknown_frames() {
        let mut tag = tag();
        tag.set(
            id3core::id3v2::frames::UnknownFrame::new("PRIV".parse().unwrap(), vec![1, 2, 3])
                .unwrap(),
        );

        let tags = display_tags(&tag, None);
        let last = tags.last().unwrap();

        assert_eq!(last.name, DisplayName::Unknown(String::from("PRIV")));
        assert_eq!(last.value, "[3 bytes]");
    }
}
