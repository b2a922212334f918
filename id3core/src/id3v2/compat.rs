//! Conversion between ID3v2.3 and ID3v2.4 frames.

use crate::core::io::BufStream;
use crate::core::string::Encoding;
use crate::id3v2::collections::FrameMap;
use crate::id3v2::frames::{
    ChapterFrame, FrameBody, FrameId, TableOfContentsFrame, TextFrame, Timestamp,
    TimestampFrame, UnknownFrame,
};
use crate::id3v2::tag::{TagHeader, Version};
use log::info;

// Frames defined by both versions, plus the common non-standard frames iTunes writes.
const SHARED_FRAMES: &[&[u8; 4]] = &[
    b"AENC", b"APIC", b"CHAP", b"COMM", b"COMR", b"CTOC", b"ENCR", b"ETCO", b"GEOB", b"GRID",
    b"LINK", b"MCDI", b"MLLT", b"OWNE", b"PCNT", b"POPM", b"POSS", b"PRIV", b"RBUF", b"RVRB",
    b"SYLT", b"SYTC", b"TALB", b"TBPM", b"TCOM", b"TCON", b"TCOP", b"TDLY", b"TENC", b"TEXT",
    b"TFLT", b"TIT1", b"TIT2", b"TIT3", b"TKEY", b"TLAN", b"TLEN", b"TMED", b"TOAL", b"TOFN",
    b"TOLY", b"TOPE", b"TOWN", b"TPE1", b"TPE2", b"TPE3", b"TPE4", b"TPOS", b"TPUB", b"TRCK",
    b"TRSN", b"TRSO", b"TSRC", b"TSSE", b"TXXX", b"UFID", b"USER", b"USLT", b"WCOM", b"WCOP",
    b"WOAF", b"WOAR", b"WOAS", b"WORS", b"WPAY", b"WPUB", b"WXXX",
    // iTunes proprietary frames
    b"GRP1", b"MVIN", b"MVNM", b"PCST", b"TCAT", b"TCMP", b"TDES", b"TGID", b"TSO2", b"TSOC",
    b"WFED",
];

const V3_FRAMES: &[&[u8; 4]] = &[
    b"EQUA", b"IPLS", b"RVAD", b"TDAT", b"TIME", b"TORY", b"TRDA", b"TSIZ", b"TYER",
];

const V4_FRAMES: &[&[u8; 4]] = &[
    b"ASPI", b"EQU2", b"RVA2", b"SEEK", b"SIGN", b"TDEN", b"TDOR", b"TDRC", b"TDRL", b"TDTG",
    b"TIPL", b"TMCL", b"TMOO", b"TPRO", b"TSOA", b"TSOP", b"TSOT", b"TSST",
];

/// Whether `version` defines the frame `frame_id`.
pub(crate) fn is_known(frame_id: FrameId, version: Version) -> bool {
    let specific = match version {
        Version::V23 => V3_FRAMES,
        Version::V24 => V4_FRAMES,
    };

    SHARED_FRAMES
        .iter()
        .chain(specific.iter())
        .any(|id| frame_id == **id)
}

/// Migrate `frames` so that they can be written as `version`, including the frames
/// embedded in chapters and tables of contents.
pub(crate) fn convert_frames(frames: &mut FrameMap, version: Version) {
    for frame in frames.values_mut() {
        if let Some(chapter) = frame.downcast_mut::<ChapterFrame>() {
            convert_frames(&mut chapter.frames, version);
        } else if let Some(toc) = frame.downcast_mut::<TableOfContentsFrame>() {
            convert_frames(&mut toc.frames, version);
        }
    }

    match version {
        Version::V23 => {
            split_recording_time(frames);
            downgrade_original_time(frames);
            convert_people_list(frames, b"TIPL", b"IPLS", version);
        }

        Version::V24 => {
            join_recording_time(frames);
            upgrade_original_year(frames);
            convert_people_list(frames, b"IPLS", b"TIPL", version);
        }
    }

    frames.retain(|key, frame| {
        let known = is_known(frame.id(), version);

        if !known {
            info!(target: "id3v2", "discarding {} frame {}", version, key);
        }

        known
    });
}

// --------
// ID3v2.4 -> ID3v2.3
// --------

// TDRC becomes TYER, TDAT and TIME, as far as its precision goes.
fn split_recording_time(frames: &mut FrameMap) {
    let timestamp = match take_timestamp(frames, b"TDRC") {
        Some(timestamp) => timestamp,
        None => return,
    };

    add_text(frames, b"TYER", format!["{:04}", timestamp.year()]);

    if let (Some(month), Some(day)) = (timestamp.month(), timestamp.day()) {
        add_text(frames, b"TDAT", format!["{:02}{:02}", day, month]);

        if let (Some(hour), Some(minute)) = (timestamp.hour(), timestamp.minute()) {
            add_text(frames, b"TIME", format!["{:02}{:02}", hour, minute]);
        }
    }
}

fn downgrade_original_time(frames: &mut FrameMap) {
    if let Some(timestamp) = take_timestamp(frames, b"TDOR") {
        add_text(frames, b"TORY", format!["{:04}", timestamp.year()]);
    }
}

fn take_timestamp(frames: &mut FrameMap, id: &[u8; 4]) -> Option<Timestamp> {
    let frame = frames.remove(FrameId::known(id).as_str())?;
    frame.downcast::<TimestampFrame>().map(|frame| frame.timestamp)
}

// The values are all digits, so Latin-1 is enough.
fn add_text(frames: &mut FrameMap, id: &[u8; 4], text: String) {
    if let Ok(frame) = TextFrame::with_text(FrameId::known(id), Encoding::Latin1, &text) {
        frames.add(frame);
    }
}

// --------
// ID3v2.3 -> ID3v2.4
// --------

// TYER, TDAT and TIME become TDRC. The old frames are always removed, even if they
// cannot be combined.
fn join_recording_time(frames: &mut FrameMap) {
    let year = take_text(frames, b"TYER");
    let date = take_text(frames, b"TDAT");
    let time = take_text(frames, b"TIME");

    let year = match year {
        Some(year) => year,
        None => {
            if date.is_some() || time.is_some() {
                info!(target: "id3v2", "dropping TDAT/TIME without a TYER frame");
            }

            return;
        }
    };

    let mut stamp = year;

    // Each part only counts if the parts before it were present.
    if let Some(date) = date.filter(|date| date.len() == 4) {
        stamp.push_str(&format!["-{}-{}", &date[2..4], &date[0..2]]);

        if let Some(time) = time.filter(|time| time.len() == 4) {
            stamp.push_str(&format!["T{}:{}", &time[0..2], &time[2..4]]);
        }
    }

    match stamp.parse::<Timestamp>() {
        Ok(timestamp) => add_timestamp(frames, b"TDRC", timestamp),
        Err(err) => info!(target: "id3v2", "could not build TDRC: {}", err),
    }
}

fn upgrade_original_year(frames: &mut FrameMap) {
    let year = match take_text(frames, b"TORY") {
        Some(year) => year,
        None => return,
    };

    match year.parse::<Timestamp>() {
        Ok(timestamp) => add_timestamp(frames, b"TDOR", timestamp),
        Err(err) => info!(target: "id3v2", "could not build TDOR: {}", err),
    }
}

// Removes the text frame `id` and returns its first string, provided it is ASCII.
fn take_text(frames: &mut FrameMap, id: &[u8; 4]) -> Option<String> {
    let frame = frames.remove(FrameId::known(id).as_str())?;

    frame
        .downcast::<TextFrame>()
        .and_then(|frame| frame.text.first())
        .map(|text| text.trim().to_string())
        .filter(|text| text.is_ascii())
}

fn add_timestamp(frames: &mut FrameMap, id: &[u8; 4], timestamp: Timestamp) {
    if let Ok(frame) = TimestampFrame::new(FrameId::known(id), timestamp) {
        frames.add(frame);
    }
}

// --------
// Involved people lists. ID3v2.3 IPLS has no typed body here, so it travels as raw bytes
// holding the same layout as a ID3v2.4 TIPL text frame.
// --------

fn convert_people_list(frames: &mut FrameMap, from: &[u8; 4], to: &[u8; 4], version: Version) {
    let frame = match frames.remove(FrameId::known(from).as_str()) {
        Some(frame) => frame,
        None => return,
    };

    let to = FrameId::known(to);

    match version {
        Version::V23 => {
            if let Some(list) = frame.downcast::<TextFrame>() {
                let data = list.render(&TagHeader::with_version(version));
                frames.add(UnknownFrame::from_raw(to, &data));
            }
        }

        Version::V24 => {
            let data = match frame.downcast::<UnknownFrame>() {
                Some(frame) => &frame.data,
                None => return,
            };

            match TextFrame::parse(to, &mut BufStream::new(data)) {
                Ok(list) => {
                    frames.add(list);
                }
                Err(_) => info!(target: "id3v2", "dropping unreadable IPLS frame"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id3v2::frames::Frame;

    fn text(frames: &FrameMap, key: &str) -> String {
        frames[key].downcast::<TextFrame>().unwrap().text[0].clone()
    }

    fn timestamp(frames: &FrameMap, key: &str) -> String {
        frames[key].downcast::<TimestampFrame>().unwrap().timestamp.to_string()
    }

    #[test]
    fn split_and_join_recording_time() {
        let mut frames = FrameMap::new();
        let stamp = "2020-01-02T03:04:05".parse().unwrap();
        frames.insert(TimestampFrame::new(FrameId::known(b"TDRC"), stamp).unwrap());

        convert_frames(&mut frames, Version::V23);

        assert_eq!(frames.len(), 3);
        assert_eq!(text(&frames, "TYER"), "2020");
        assert_eq!(text(&frames, "TDAT"), "0201");
        assert_eq!(text(&frames, "TIME"), "0304");

        convert_frames(&mut frames, Version::V24);

        // Seconds can't be stored in ID3v2.3.
        assert_eq!(frames.len(), 1);
        assert_eq!(timestamp(&frames, "TDRC"), "2020-01-02T03:04");
        assert!(!frames.contains_any(b"TYER"));
        assert!(!frames.contains_any(b"TDAT"));
        assert!(!frames.contains_any(b"TIME"));
    }

    #[test]
    fn split_partial_recording_time() {
        let mut frames = FrameMap::new();
        let stamp = "2020-01".parse().unwrap();
        frames.insert(TimestampFrame::new(FrameId::known(b"TDRC"), stamp).unwrap());

        convert_frames(&mut frames, Version::V23);

        assert_eq!(frames.len(), 1);
        assert_eq!(text(&frames, "TYER"), "2020");
    }

    #[test]
    fn drop_orphaned_date_frames() {
        let mut frames = FrameMap::new();
        add_text(&mut frames, b"TDAT", String::from("0201"));
        add_text(&mut frames, b"TIME", String::from("0304"));

        convert_frames(&mut frames, Version::V24);

        assert!(frames.is_empty());
    }

    #[test]
    fn join_date_without_time() {
        let mut frames = FrameMap::new();
        add_text(&mut frames, b"TYER", String::from("1999"));
        add_text(&mut frames, b"TIME", String::from("1200"));

        convert_frames(&mut frames, Version::V24);

        assert_eq!(frames.len(), 1);
        assert_eq!(timestamp(&frames, "TDRC"), "1999");
    }

    #[test]
    fn convert_original_release() {
        let mut frames = FrameMap::new();
        let stamp = "1985-06-07".parse().unwrap();
        frames.insert(TimestampFrame::new(FrameId::known(b"TDOR"), stamp).unwrap());

        convert_frames(&mut frames, Version::V23);
        assert_eq!(text(&frames, "TORY"), "1985");

        convert_frames(&mut frames, Version::V24);
        assert_eq!(timestamp(&frames, "TDOR"), "1985");
    }

    #[test]
    fn convert_people_lists() {
        let mut frames = FrameMap::new();
        let mut list = TextFrame::new(FrameId::known(b"TIPL")).unwrap();
        list.encoding = Encoding::Latin1;
        list.text = vec![String::from("Producer"), String::from("Name")];
        frames.insert(list);

        convert_frames(&mut frames, Version::V23);

        let ipls = frames["IPLS"].downcast::<UnknownFrame>().unwrap();
        assert_eq!(ipls.data, b"\x00Producer\x00Name\x00");

        convert_frames(&mut frames, Version::V24);

        let tipl = frames["TIPL"].downcast::<TextFrame>().unwrap();
        assert_eq!(tipl.text, &["Producer", "Name"]);
    }

    #[test]
    fn discard_foreign_frames() {
        let mut frames = FrameMap::new();
        frames.insert(TextFrame::with_text(FrameId::known(b"TSOP"), Encoding::Utf8, "Artist").unwrap());
        frames.insert(TextFrame::with_text(FrameId::known(b"TIT2"), Encoding::Utf8, "Title").unwrap());
        frames.insert(UnknownFrame::new(FrameId::known(b"PRIV"), vec![1, 2]).unwrap());

        convert_frames(&mut frames, Version::V23);

        assert_eq!(frames.keys().collect::<Vec<_>>(), &["TIT2", "PRIV"]);
    }

    #[test]
    fn convert_embedded_frames() {
        let mut chapter = ChapterFrame::new("chp0").unwrap();
        let stamp = "2020".parse().unwrap();
        chapter.frames.insert(TimestampFrame::new(FrameId::known(b"TDRC"), stamp).unwrap());

        let mut frames = FrameMap::new();
        frames.insert(chapter);

        convert_frames(&mut frames, Version::V23);

        let chapter: &Frame = &frames["CHAP:chp0"];
        let chapter = chapter.downcast::<ChapterFrame>().unwrap();
        assert_eq!(text(&chapter.frames, "TYER"), "2020");
    }
}
