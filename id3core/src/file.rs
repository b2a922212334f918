//! Raw file access used when reading and committing tags.

use log::trace;
use std::error;
use std::fmt::{self, Display, Formatter};
use std::fs::{self, OpenOptions};
use std::io::{self, Error, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Size of the buffer used when shifting file contents.
const BLOCK_SIZE: u64 = 64 * 1024;

pub struct File {
    handle: fs::File,
}

impl File {
    /// Open a file for reading and writing.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<File> {
        check_path(path.as_ref())?;

        let handle = OpenOptions::new().read(true).write(true).open(path)?;

        Ok(File { handle })
    }

    /// Open a file for reading only.
    pub fn open_read<P: AsRef<Path>>(path: P) -> io::Result<File> {
        check_path(path.as_ref())?;

        Ok(File {
            handle: fs::File::open(path)?,
        })
    }

    pub fn len(&self) -> io::Result<u64> {
        Ok(self.handle.metadata()?.len())
    }

    pub fn is_empty(&self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }

    pub(crate) fn seek(&mut self, to: u64) -> io::Result<u64> {
        self.handle.seek(SeekFrom::Start(to))
    }

    pub(crate) fn read_into(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.handle.read_exact(buf)
    }

    pub(crate) fn read_vec(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0; len];
        self.read_into(&mut buf)?;
        Ok(buf)
    }

    pub(crate) fn write_at(&mut self, pos: u64, data: &[u8]) -> io::Result<()> {
        self.seek(pos)?;
        self.handle.write_all(data)
    }

    pub(crate) fn truncate(&mut self, len: u64) -> io::Result<()> {
        trace!(target: "file", "truncating to {}b", len);
        self.handle.set_len(len)
    }

    pub(crate) fn flush(&mut self) -> io::Result<()> {
        self.handle.flush()
    }

    /// Copy `len` bytes at `from` to `to`. The ranges may overlap.
    pub(crate) fn move_block(&mut self, from: u64, to: u64, len: u64) -> io::Result<()> {
        if from == to || len == 0 {
            return Ok(());
        }

        trace!(target: "file", "moving {}b from {} to {}", len, from, to);

        let mut buf = vec![0; BLOCK_SIZE.min(len) as usize];
        let mut done = 0;

        while done < len {
            let chunk = BLOCK_SIZE.min(len - done);
            let buf = &mut buf[..chunk as usize];

            // Moving forward has to start from the end so nothing is overwritten before
            // it is copied.
            let offset = if to > from {
                len - done - chunk
            } else {
                done
            };

            self.seek(from + offset)?;
            self.read_into(buf)?;
            self.write_at(to + offset, buf)?;

            done += chunk;
        }

        Ok(())
    }
}

fn check_path(path: &Path) -> io::Result<()> {
    if path.metadata()?.is_dir() {
        return Err(Error::new(ErrorKind::InvalidInput, FileError::IsDir));
    }

    Ok(())
}

#[derive(Debug)]
enum FileError {
    IsDir,
}

impl Display for FileError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let msg = match self {
            FileError::IsDir => "is a directory",
        };

        write![f, "{}", msg]
    }
}

impl error::Error for FileError {}
