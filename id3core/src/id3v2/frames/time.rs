use crate::core::io::BufStream;
use crate::core::string::{self, Encoding};
use crate::id3v2::frames::{encoding, expect_kind, text, FrameBody, FrameError, FrameId, FrameKind};
use crate::id3v2::tag::TagHeader;
use crate::id3v2::{ParseError, ParseResult};
use regex::Regex;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::sync::OnceLock;

/// How much of a [`Timestamp`](Timestamp) is present.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum Precision {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

// Each accepted layout, from least to most precise. Captures are the components in order.
const FORMATS: &[(&str, Precision)] = &[
    (r"^([0-9]{4})$", Precision::Year),
    (r"^([0-9]{4})-([0-9]{2})$", Precision::Month),
    (r"^([0-9]{4})-([0-9]{2})-([0-9]{2})$", Precision::Day),
    (r"^([0-9]{4})-([0-9]{2})-([0-9]{2})T([0-9]{2})$", Precision::Hour),
    (
        r"^([0-9]{4})-([0-9]{2})-([0-9]{2})T([0-9]{2}):([0-9]{2})$",
        Precision::Minute,
    ),
    (
        r"^([0-9]{4})-([0-9]{2})-([0-9]{2})T([0-9]{2}):([0-9]{2}):([0-9]{2})$",
        Precision::Second,
    ),
];

fn formats() -> &'static [(Regex, Precision)] {
    static COMPILED: OnceLock<Vec<(Regex, Precision)>> = OnceLock::new();

    COMPILED.get_or_init(|| {
        FORMATS
            .iter()
            .map(|&(pattern, precision)| {
                (Regex::new(pattern).expect("timestamp pattern is valid"), precision)
            })
            .collect()
    })
}

/// A partial ISO 8601 date and time, as stored in the ID3v2.4 timestamp frames.
///
/// Any prefix of `yyyy-MM-ddTHH:mm:ss` is valid, as long as it ends on a whole component.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Timestamp {
    year: u16,
    month: Option<u8>,
    day: Option<u8>,
    hour: Option<u8>,
    minute: Option<u8>,
    second: Option<u8>,
}

impl Timestamp {
    pub fn new(year: u16) -> Self {
        Self {
            year,
            month: None,
            day: None,
            hour: None,
            minute: None,
            second: None,
        }
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> Option<u8> {
        self.month
    }

    pub fn day(&self) -> Option<u8> {
        self.day
    }

    pub fn hour(&self) -> Option<u8> {
        self.hour
    }

    pub fn minute(&self) -> Option<u8> {
        self.minute
    }

    pub fn second(&self) -> Option<u8> {
        self.second
    }

    pub fn precision(&self) -> Precision {
        match (self.month, self.day, self.hour, self.minute, self.second) {
            (_, _, _, _, Some(_)) => Precision::Second,
            (_, _, _, Some(_), _) => Precision::Minute,
            (_, _, Some(_), _, _) => Precision::Hour,
            (_, Some(_), _, _, _) => Precision::Day,
            (Some(_), _, _, _, _) => Precision::Month,
            _ => Precision::Year,
        }
    }
}

impl FromStr for Timestamp {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FrameError::InvalidTimestamp(s.to_string());

        let (caps, precision) = formats()
            .iter()
            .find_map(|(regex, precision)| regex.captures(s).map(|caps| (caps, *precision)))
            .ok_or_else(invalid)?;

        // Every group is made of ASCII digits, so only the range can be wrong.
        let part = |i: usize, range: (u8, u8)| -> Result<Option<u8>, FrameError> {
            match caps.get(i) {
                Some(m) => match m.as_str().parse::<u8>() {
                    Ok(n) if n >= range.0 && n <= range.1 => Ok(Some(n)),
                    _ => Err(invalid()),
                },
                None => Ok(None),
            }
        };

        let year = caps
            .get(1)
            .and_then(|m| m.as_str().parse::<u16>().ok())
            .ok_or_else(invalid)?;

        let timestamp = Timestamp {
            year,
            month: part(2, (1, 12))?,
            day: part(3, (1, 31))?,
            hour: part(4, (0, 23))?,
            minute: part(5, (0, 59))?,
            second: part(6, (0, 59))?,
        };

        debug_assert_eq!(timestamp.precision(), precision);

        Ok(timestamp)
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write![f, "{:04}", self.year]?;

        let rest = [
            ("-", self.month),
            ("-", self.day),
            ("T", self.hour),
            (":", self.minute),
            (":", self.second),
        ];

        for (sep, part) in rest.iter() {
            match part {
                Some(part) => write![f, "{}{:02}", sep, part]?,
                None => break,
            }
        }

        Ok(())
    }
}

/// One of the ID3v2.4 timestamp frames.
#[derive(Debug, Clone)]
pub struct TimestampFrame {
    frame_id: FrameId,
    pub encoding: Encoding,
    pub timestamp: Timestamp,
}

impl TimestampFrame {
    pub fn new(frame_id: FrameId, timestamp: Timestamp) -> Result<Self, FrameError> {
        expect_kind(frame_id, FrameKind::Timestamp)?;

        Ok(Self {
            frame_id,
            encoding: Encoding::default(),
            timestamp,
        })
    }

    pub(crate) fn parse(frame_id: FrameId, stream: &mut BufStream) -> ParseResult<Self> {
        let encoding = encoding::parse(stream)?;

        // Only the first timestamp is kept if there are several.
        let timestamp = text::parse_text(encoding, stream)
            .first()
            .and_then(|string| string.trim().parse().ok())
            .ok_or(ParseError::MalformedData)?;

        Ok(Self {
            frame_id,
            encoding,
            timestamp,
        })
    }

    pub fn is_id(frame_id: FrameId) -> bool {
        is_id!(frame_id, b"TDEN", b"TDOR", b"TDRC", b"TDRL", b"TDTG")
    }
}

impl FrameBody for TimestampFrame {
    fn id(&self) -> FrameId {
        self.frame_id
    }

    fn key(&self) -> String {
        self.frame_id.to_string()
    }

    fn is_empty(&self) -> bool {
        false
    }

    fn render(&self, tag_header: &TagHeader) -> Vec<u8> {
        let encoding = encoding::check(self.encoding, tag_header.version());

        let mut result = vec![encoding::render(encoding)];
        result.extend(string::render_terminated(encoding, &self.timestamp.to_string()));

        result
    }
}

impl Display for TimestampFrame {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write![f, "{}", self.timestamp]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id3v2::frames::UnknownFrame;

    const TDRC_DATA: &[u8] = b"TDRC\x00\x00\x00\x15\x00\x00\
                               \x00\
                               2020-11-25T14:30:09\0";

    #[test]
    fn parse_timestamps() {
        let ts: Timestamp = "2020".parse().unwrap();
        assert_eq!(ts.year(), 2020);
        assert_eq!(ts.month(), None);
        assert_eq!(ts.precision(), Precision::Year);

        let ts: Timestamp = "2020-11".parse().unwrap();
        assert_eq!(ts.month(), Some(11));
        assert_eq!(ts.precision(), Precision::Month);

        let ts: Timestamp = "2020-11-25T14".parse().unwrap();
        assert_eq!(ts.day(), Some(25));
        assert_eq!(ts.hour(), Some(14));
        assert_eq!(ts.precision(), Precision::Hour);

        let ts: Timestamp = "2020-11-25T14:30:09".parse().unwrap();
        assert_eq!(ts.minute(), Some(30));
        assert_eq!(ts.second(), Some(9));
        assert_eq!(ts.precision(), Precision::Second);
    }

    #[test]
    fn reject_bad_timestamps() {
        for bad in &[
            "",
            "20",
            "2020-1",
            "2020-11-25 14:30",
            "2020-13",
            "2020-11-32",
            "2020-11-25T24",
            "2020-11-25T14:60",
            "2020-11-25T14:30:09Z",
        ] {
            assert!(bad.parse::<Timestamp>().is_err(), "{} was accepted", bad);
        }
    }

    #[test]
    fn display_timestamps() {
        for ts in &["1999", "1999-01", "1999-01-02", "1999-01-02T03", "1999-01-02T03:04:05"] {
            assert_eq!(ts.parse::<Timestamp>().unwrap().to_string(), *ts);
        }

        assert_eq!(Timestamp::new(42).to_string(), "0042");
    }

    #[test]
    fn parse_tdrc() {
        make_frame!(TimestampFrame, TDRC_DATA, frame);

        assert_eq!(frame.id(), b"TDRC");
        assert_eq!(frame.encoding, Encoding::Latin1);
        assert_eq!(frame.timestamp.to_string(), "2020-11-25T14:30:09");
    }

    #[test]
    fn render_tdrc() {
        let mut frame = TimestampFrame::new(
            FrameId::known(b"TDRC"),
            "2020-11-25T14:30:09".parse().unwrap(),
        )
        .unwrap();

        frame.encoding = Encoding::Latin1;

        assert_render!(frame, TDRC_DATA);
    }

    #[test]
    fn keep_unreadable_timestamps_raw() {
        let data = b"TDRC\x00\x00\x00\x05\x00\x00\x00soon";
        make_frame!(UnknownFrame, data, frame);

        assert_eq!(frame.id(), b"TDRC");
        assert_eq!(frame.data, b"\x00soon");
    }
}
