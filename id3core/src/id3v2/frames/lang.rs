use crate::core::io::BufStream;
use crate::id3v2::frames::FrameError;
use crate::id3v2::ParseResult;
use std::fmt::{self, Display, Formatter};
use std::str::{self, FromStr};

/// An ISO-639-2 language code.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Language {
    code: [u8; 3],
}

impl Language {
    /// Create a language from three ASCII letters. Uppercase letters are lowered.
    pub fn new(code: &[u8; 3]) -> Result<Self, FrameError> {
        let mut lang = [0; 3];

        for (i, byte) in code.iter().enumerate() {
            if !byte.is_ascii_alphabetic() {
                return Err(FrameError::InvalidLanguage(String::from_utf8_lossy(code).into_owned()));
            }

            lang[i] = byte.to_ascii_lowercase();
        }

        Ok(Self { code: lang })
    }

    /// Invalid codes in tags are common enough that they fall back to the default.
    pub(crate) fn parse(stream: &mut BufStream) -> ParseResult<Self> {
        Ok(Self::new(&stream.read_array()?).unwrap_or_default())
    }

    pub fn code(&self) -> &[u8; 3] {
        &self.code
    }

    pub fn as_str(&self) -> &str {
        // Only ASCII letters are ever stored.
        str::from_utf8(&self.code).unwrap_or("xxx")
    }
}

impl FromStr for Language {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.as_bytes() {
            &[a, b, c] => Self::new(&[a, b, c]),
            _ => Err(FrameError::InvalidLanguage(s.to_string())),
        }
    }
}

impl Display for Language {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write![f, "{}", self.as_str()]
    }
}

impl Default for Language {
    fn default() -> Self {
        // "xxx" isn't in ISO-639-2, but it is the usual stand-in for an unknown language.
        Language { code: [b'x'; 3] }
    }
}

impl PartialEq<[u8; 3]> for Language {
    fn eq(&self, other: &[u8; 3]) -> bool {
        self.code == *other
    }
}

impl PartialEq<&[u8; 3]> for Language {
    fn eq(&self, other: &&[u8; 3]) -> bool {
        self.code == **other
    }
}
