use std::error;
use std::fmt::{self, Display, Formatter};
use std::io::{self, ErrorKind};
use std::ops::Range;

/// A bounds-checked cursor over a borrowed byte slice.
///
/// All frame and header decoding goes through this type, so that truncated or lying
/// size fields surface as errors instead of panics.
#[derive(Clone)]
pub struct BufStream<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> BufStream<'a> {
    pub fn new(src: &'a [u8]) -> Self {
        Self { src, pos: 0 }
    }

    /// Fill `buf` completely or fail. The stream position is unchanged on failure.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        if self.remaining() < buf.len() {
            return Err(underread_error());
        }

        buf.copy_from_slice(&self.src[self.pos..self.pos + buf.len()]);
        self.pos += buf.len();

        Ok(())
    }

    pub fn read_array<const N: usize>(&mut self) -> io::Result<[u8; N]> {
        let mut arr = [0; N];
        self.read_exact(&mut arr)?;
        Ok(arr)
    }

    pub fn read_u8(&mut self) -> io::Result<u8> {
        if self.is_empty() {
            return Err(eos_error());
        }

        self.pos += 1;

        Ok(self.src[self.pos - 1])
    }

    /// Read a big-endian u16.
    pub fn read_u16(&mut self) -> io::Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    /// Read a big-endian u32.
    pub fn read_u32(&mut self) -> io::Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    pub fn skip(&mut self, n: usize) -> io::Result<()> {
        if self.remaining() < n {
            return Err(oob_error());
        }

        self.pos += n;

        Ok(())
    }

    /// Consume the next `n` bytes and return them as a slice.
    pub fn slice(&mut self, n: usize) -> io::Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(underread_error());
        }

        self.pos += n;

        Ok(&self.src[self.pos - n..self.pos])
    }

    /// Like [`slice`](BufStream::slice), but wraps the result in its own stream.
    pub fn slice_stream(&mut self, n: usize) -> io::Result<BufStream<'a>> {
        Ok(BufStream::new(self.slice(n)?))
    }

    /// Look at a range relative to the current position without consuming anything.
    pub fn peek(&self, range: Range<usize>) -> io::Result<&'a [u8]> {
        let start = self.pos + range.start;
        let end = self.pos + range.end;

        if start > end || end > self.len() {
            return Err(oob_error());
        }

        Ok(&self.src[start..end])
    }

    /// Consume data up to and including `needle`, returning everything before it.
    ///
    /// The search walks in steps of `needle.len()`, so a two-byte UTF-16 terminator is only
    /// matched on a code unit boundary. When the needle is never found, the rest of the
    /// stream is returned instead.
    pub fn search(&mut self, needle: &[u8]) -> &'a [u8] {
        let start = self.pos;
        let mut begin = self.pos;
        let mut end = self.pos + needle.len();

        while end <= self.len() {
            if &self.src[begin..end] == needle {
                self.pos = end;
                return &self.src[start..begin];
            }

            begin += needle.len();
            end += needle.len();
        }

        self.take_rest()
    }

    pub fn take_rest(&mut self) -> &'a [u8] {
        let rest = &self.src[self.pos..];
        self.pos = self.len();
        rest
    }

    pub fn len(&self) -> usize {
        self.src.len()
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }
}

#[derive(Debug)]
pub enum StreamError {
    EndOfStream,
    BufferUnderread,
    OutOfBounds,
}

impl Display for StreamError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let msg = match self {
            Self::EndOfStream => "end of stream",
            Self::BufferUnderread => "not enough data to fill buffer",
            Self::OutOfBounds => "position out of bounds",
        };

        write![f, "{}", msg]
    }
}

impl error::Error for StreamError {
    // Nothing to implement
}

#[inline(always)]
fn eos_error() -> io::Error {
    io::Error::new(ErrorKind::UnexpectedEof, StreamError::EndOfStream)
}

#[inline(always)]
fn underread_error() -> io::Error {
    io::Error::new(ErrorKind::UnexpectedEof, StreamError::BufferUnderread)
}

#[inline(always)]
fn oob_error() -> io::Error {
    io::Error::new(ErrorKind::UnexpectedEof, StreamError::OutOfBounds)
}
