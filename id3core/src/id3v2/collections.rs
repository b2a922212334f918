//! Frame collection and management.

use crate::id3v2::frames::{Frame, FrameBody, UnknownFrame};
use indexmap::map::{IntoIter, Iter, IterMut, Keys, Values, ValuesMut};
use indexmap::IndexMap;
use log::info;
use std::ops::{Index, IndexMut};

/// An ordered collection of frames where every frame has a unique key.
///
/// Frames keep the position they were first added at, even when replaced.
#[derive(Debug, Clone, Default)]
pub struct FrameMap {
    map: IndexMap<String, Frame>,
}

impl FrameMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a frame only if no frame with the same key exists. Returns whether it was added.
    ///
    /// [`UnknownFrame`](UnknownFrame)s are never turned away. A clashing one is given the
    /// next free index instead.
    pub fn add(&mut self, frame: impl Into<Frame>) -> bool {
        let mut frame = frame.into();

        if let Some(unknown) = frame.downcast_mut::<UnknownFrame>() {
            let mut index = unknown.index();

            while self.map.contains_key(&unknown.key()) {
                index += 1;
                unknown.set_index(index);
            }
        }

        let key = frame.key();

        if self.map.contains_key(&key) {
            info!(target: "id3v2", "keeping the first of several {} frames", key);
            return false;
        }

        self.map.insert(key, frame);

        true
    }

    /// Add a frame, replacing any frame with the same key in place.
    pub fn insert(&mut self, frame: impl Into<Frame>) -> Option<Frame> {
        let frame = frame.into();
        self.map.insert(frame.key(), frame)
    }

    pub fn get(&self, key: &str) -> Option<&Frame> {
        self.map.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Frame> {
        self.map.get_mut(key)
    }

    /// Every frame with the identifier `id`, in order.
    pub fn get_all(&self, id: &[u8; 4]) -> Vec<&Frame> {
        self.values().filter(|frame| frame.id() == id).collect()
    }

    pub fn get_all_mut(&mut self, id: &[u8; 4]) -> Vec<&mut Frame> {
        self.values_mut().filter(|frame| frame.id() == id).collect()
    }

    /// Remove the frame under `key`, keeping the order of the rest.
    pub fn remove(&mut self, key: &str) -> Option<Frame> {
        self.map.shift_remove(key)
    }

    /// Remove every frame with the identifier `id`, whatever its key.
    pub fn remove_all(&mut self, id: &[u8; 4]) -> Vec<Frame> {
        let keys: Vec<String> = self
            .iter()
            .filter(|(_, frame)| frame.id() == id)
            .map(|(key, _)| key.clone())
            .collect();

        keys.iter().filter_map(|key| self.remove(key)).collect()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn contains_any(&self, id: &[u8; 4]) -> bool {
        self.values().any(|frame| frame.id() == id)
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str, &mut Frame) -> bool,
    {
        self.map.retain(|key, frame| keep(key, frame))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear()
    }

    pub fn iter(&self) -> Iter<String, Frame> {
        self.map.iter()
    }

    pub fn iter_mut(&mut self) -> IterMut<String, Frame> {
        self.map.iter_mut()
    }

    pub fn keys(&self) -> Keys<String, Frame> {
        self.map.keys()
    }

    pub fn values(&self) -> Values<String, Frame> {
        self.map.values()
    }

    pub fn values_mut(&mut self) -> ValuesMut<String, Frame> {
        self.map.values_mut()
    }
}

impl Index<&str> for FrameMap {
    type Output = Frame;

    fn index(&self, key: &str) -> &Self::Output {
        &self.map[key]
    }
}

impl IndexMut<&str> for FrameMap {
    fn index_mut(&mut self, key: &str) -> &mut Self::Output {
        &mut self.map[key]
    }
}

impl IntoIterator for FrameMap {
    type Item = (String, Frame);
    type IntoIter = IntoIter<String, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.into_iter()
    }
}

impl<'a> IntoIterator for &'a FrameMap {
    type Item = (&'a String, &'a Frame);
    type IntoIter = Iter<'a, String, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.iter()
    }
}

impl Extend<Frame> for FrameMap {
    fn extend<I: IntoIterator<Item = Frame>>(&mut self, iter: I) {
        for frame in iter {
            self.insert(frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::string::Encoding;
    use crate::id3v2::frames::{
        AttachedPictureFrame, CommentsFrame, FrameId, Language, PictureType, TextFrame,
    };

    fn text(id: &[u8; 4], text: &str) -> TextFrame {
        TextFrame::with_text(FrameId::known(id), Encoding::Utf8, text).unwrap()
    }

    fn comment(desc: &str, text: &str) -> CommentsFrame {
        CommentsFrame::new(Encoding::Utf8, Language::default(), desc, text)
    }

    #[test]
    fn pictures_are_keyed_by_desc() {
        let mut frames = FrameMap::new();

        let cover = |desc: &str, byte: u8| {
            AttachedPictureFrame::new("image/png", PictureType::FrontCover, desc, vec![byte])
                .unwrap()
        };

        frames.insert(cover("Front", 1));
        frames.insert(cover("Back", 2));
        assert_eq!(frames.len(), 2);

        frames.insert(cover("Front", 3));
        assert_eq!(frames.len(), 2);

        let front = frames["APIC:Front"].downcast::<AttachedPictureFrame>().unwrap();
        assert_eq!(front.picture, &[3]);
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut frames = FrameMap::new();

        frames.insert(text(b"TIT2", "Title"));
        frames.insert(text(b"TPE1", "Artist"));
        let old = frames.insert(text(b"TIT2", "New Title"));

        assert_eq!(old.unwrap().to_string(), "Title");
        assert_eq!(frames.keys().collect::<Vec<_>>(), &["TIT2", "TPE1"]);
        assert_eq!(frames["TIT2"].to_string(), "New Title");
    }

    #[test]
    fn add_keeps_first() {
        let mut frames = FrameMap::new();

        assert!(frames.add(text(b"TIT2", "First")));
        assert!(!frames.add(text(b"TIT2", "Second")));
        assert_eq!(frames["TIT2"].to_string(), "First");
    }

    #[test]
    fn add_numbers_unknown_frames() {
        let mut frames = FrameMap::new();
        let private =
            |data: &[u8]| UnknownFrame::new(FrameId::known(b"PRIV"), data.to_vec()).unwrap();

        assert!(frames.add(private(b"WM/A\x00\x01")));
        assert!(frames.add(private(b"WM/B\x00\x02")));
        assert!(frames.add(private(b"WM/B\x00\x02")));

        assert_eq!(frames.keys().collect::<Vec<_>>(), &["PRIV", "PRIV:1", "PRIV:2"]);
        assert_eq!(frames.get_all(b"PRIV").len(), 3);

        let second = frames["PRIV:1"].downcast::<UnknownFrame>().unwrap();
        assert_eq!(second.data, b"WM/B\x00\x02");
    }

    #[test]
    fn remove_keeps_order() {
        let mut frames = FrameMap::new();

        frames.insert(text(b"TIT2", "Title"));
        frames.insert(text(b"TPE1", "Artist"));
        frames.insert(text(b"TALB", "Album"));

        assert!(frames.remove("TPE1").is_some());
        assert!(frames.remove("TPE1").is_none());
        assert_eq!(frames.keys().collect::<Vec<_>>(), &["TIT2", "TALB"]);
    }

    #[test]
    fn remove_all_of_id() {
        let mut frames = FrameMap::new();

        frames.insert(comment("a", "1"));
        frames.insert(text(b"TIT2", "Title"));
        frames.insert(comment("b", "2"));
        frames.insert(comment("c", "3"));

        assert_eq!(frames.get_all(b"COMM").len(), 3);
        assert!(frames.contains_any(b"COMM"));

        // Removing by key only takes one.
        frames.remove("COMM:a:xxx");
        assert_eq!(frames.get_all(b"COMM").len(), 2);

        let removed = frames.remove_all(b"COMM");
        assert_eq!(removed.len(), 2);
        assert!(!frames.contains_any(b"COMM"));
        assert_eq!(frames.len(), 1);
    }
}
