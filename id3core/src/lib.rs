//! ID3v2 tag reading, editing and writing.
//!
//! `id3core` parses the ID3v2.3 and ID3v2.4 tags found at the start of audio files into
//! an ordered, key-unique collection of typed frames, and writes them back while reusing
//! existing padding whenever it can.
//!
//! Reading a tag only needs [`id3v2::Tag::open`]. Editing a file in place goes through
//! [`id3v2::TagEditor`], which also takes care of legacy ID3v1 trailers.

#![forbid(unsafe_code)]

#[macro_use]
mod core;

pub mod file;
pub mod id3v1;
pub mod id3v2;

pub use crate::core::string::Encoding;
