//! Writing tags back into files.

use crate::file::File;
use crate::id3v1;
use crate::id3v2::{ParseError, SaveResult, Tag, Version, HEADER_SIZE};
use log::{debug, info};
use std::io;
use std::path::Path;

/// Settings for committing a tag.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WriteOptions {
    /// Zero bytes reserved after the frames whenever the tag has to be rewritten.
    pub padding: usize,
    /// The most padding an in-place write may leave behind. Past this the file is
    /// shrunk instead.
    pub max_padding: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            padding: 1024,
            max_padding: 16384,
        }
    }
}

/// An ID3v2 tag opened for editing, along with the file it lives in.
///
/// Changes only reach the file on [`commit`](TagEditor::commit). Committing reuses the
/// padding of the existing tag when the new tag fits, and otherwise moves the rest of the
/// file to make room.
pub struct TagEditor {
    file: File,
    options: WriteOptions,
    tag: Option<Tag>,
    legacy: Option<id3v1::Tag>,
    disk: DiskState,
}

// The tag as it currently sits on disk.
#[derive(Clone, Copy, Debug, Default)]
struct DiskState {
    /// Header, body and footer. Zero when there is no tag.
    region_len: u64,
    /// The body size in the header.
    size: usize,
    footer: bool,
}

impl TagEditor {
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Self::open_with(path, WriteOptions::default())
    }

    pub fn open_with<P: AsRef<Path>>(path: P, options: WriteOptions) -> io::Result<Self> {
        let mut file = File::open(path)?;

        let tag = match Tag::read_from(&mut file) {
            Ok(tag) => Some(tag),
            Err(ParseError::IoError(err)) => return Err(err),
            Err(err) => {
                info!(target: "id3v2", "no tag read: {}", err);
                None
            }
        };

        let disk = match &tag {
            Some(tag) => DiskState {
                region_len: tag.header().region_len() as u64,
                size: tag.header().size(),
                footer: tag.header().flags().footer,
            },
            None => DiskState::default(),
        };

        // A trailer inside the ID3v2 tag is not a trailer.
        let legacy = if file.len()? >= disk.region_len + id3v1::TAG_SIZE as u64 {
            id3v1::Tag::read(&mut file)?
        } else {
            None
        };

        Ok(TagEditor {
            file,
            options,
            tag,
            legacy,
            disk,
        })
    }

    pub fn tag(&self) -> Option<&Tag> {
        self.tag.as_ref()
    }

    pub fn tag_mut(&mut self) -> Option<&mut Tag> {
        self.tag.as_mut()
    }

    /// Get the tag, creating an ID3v2.4 tag if there is none. A new tag is filled in from
    /// the ID3v1 trailer if the file has one.
    pub fn tag_or_insert(&mut self) -> &mut Tag {
        let legacy = &self.legacy;

        self.tag.get_or_insert_with(|| {
            let mut tag = Tag::new(Version::V24);

            if let Some(legacy) = legacy {
                info!(target: "id3v2", "seeding new tag from ID3v1");
                legacy.seed(&mut tag);
            }

            tag
        })
    }

    pub fn set_tag(&mut self, tag: Tag) -> Option<Tag> {
        self.tag.replace(tag)
    }

    /// Mark the tag for removal on the next commit.
    pub fn remove_tag(&mut self) -> Option<Tag> {
        self.tag.take()
    }

    /// The ID3v1 trailer found when the file was opened, if it has not been removed yet.
    pub fn legacy(&self) -> Option<&id3v1::Tag> {
        self.legacy.as_ref()
    }

    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: WriteOptions) {
        self.options = options;
    }

    /// Write the tag into the file, or remove the tag from the file if there is none.
    ///
    /// Writing a tag also removes any ID3v1 trailer.
    pub fn commit(&mut self) -> SaveResult<()> {
        match self.tag.take() {
            Some(mut tag) => {
                let result = self.write_tag(&mut tag);
                self.tag = Some(tag);
                result?
            }

            None if self.disk.region_len > 0 => self.remove_region()?,

            None => debug!(target: "id3v2", "no tag to write or remove"),
        }

        self.file.flush()?;

        Ok(())
    }

    fn write_tag(&mut self, tag: &mut Tag) -> SaveResult<()> {
        let mut data = tag.assemble(0)?;
        let frames_len = data.len() - HEADER_SIZE;

        if self.fits_in_place(frames_len) {
            debug!(
                target: "id3v2",
                "writing {}b tag in place, {}b of padding",
                frames_len,
                self.disk.size - frames_len
            );

            tag.header_mut().set_size(self.disk.size);
            data.resize(HEADER_SIZE + self.disk.size, 0);

            // The header goes last, so a failed write keeps the old size.
            self.file.write_at(HEADER_SIZE as u64, &data[HEADER_SIZE..])?;
            self.file.write_at(0, &tag.header().render())?;

            if self.legacy.take().is_some() {
                info!(target: "id3v2", "removing ID3v1 trailer");
                let len = self.file.len()?;
                self.file.truncate(len - id3v1::TAG_SIZE as u64)?;
            }
        } else {
            let data = tag.assemble(self.options.padding)?;
            self.rewrite(&data)?;
        }

        self.disk = DiskState {
            region_len: (HEADER_SIZE + tag.header().size()) as u64,
            size: tag.header().size(),
            footer: false,
        };

        Ok(())
    }

    fn fits_in_place(&self, frames_len: usize) -> bool {
        self.disk.region_len > 0
            && !self.disk.footer
            && frames_len <= self.disk.size
            && self.disk.size - frames_len <= self.options.max_padding
    }

    // Replace the old tag region with `data`, moving everything after it.
    fn rewrite(&mut self, data: &[u8]) -> SaveResult<()> {
        let len = self.file.len()?;
        let old_len = self.disk.region_len;
        let new_len = data.len() as u64;

        let end = match self.legacy.take() {
            Some(_) => {
                info!(target: "id3v2", "removing ID3v1 trailer");
                len - id3v1::TAG_SIZE as u64
            }
            None => len,
        };

        let rest = end - old_len;

        if new_len > old_len {
            debug!(target: "id3v2", "growing tag region from {}b to {}b", old_len, new_len);

            // The old tag stays intact until the rest of the file is out of the way.
            self.file.move_block(old_len, new_len, rest)?;
            self.file.write_at(0, data)?;
        } else {
            debug!(target: "id3v2", "shrinking tag region from {}b to {}b", old_len, new_len);

            self.file.write_at(0, data)?;
            self.file.move_block(old_len, new_len, rest)?;
        }

        self.file.truncate(new_len + rest)?;

        Ok(())
    }

    fn remove_region(&mut self) -> SaveResult<()> {
        let len = self.file.len()?;
        let region_len = self.disk.region_len;

        debug!(target: "id3v2", "removing {}b tag region", region_len);

        // Clear the magic before moving anything.
        self.file.write_at(0, &[0; 3])?;
        self.file.move_block(region_len, 0, len - region_len)?;
        self.file.truncate(len - region_len)?;

        self.disk = DiskState::default();

        Ok(())
    }
}
