use id3core::id3v2::frames::{AttachedPictureFrame, PictureType, UnknownFrame};
use id3core::id3v2::{Field, Tag, TagEditor, Version, WriteOptions};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

const TIT2: &[u8] = b"TIT2\x00\x00\x00\x07\x00\x00\x03Title\x00";

fn audio() -> Vec<u8> {
    let mut data = b"\xFF\xFB\x90\x00".to_vec();
    data.extend((0..4096u32).map(|i| (i % 253) as u8));
    data
}

fn temp_file(data: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(data).unwrap();
    file.flush().unwrap();
    file
}

fn contents(path: &Path) -> Vec<u8> {
    fs::read(path).unwrap()
}

fn legacy_trailer() -> Vec<u8> {
    let mut raw = vec![0; 128];
    raw[0..3].copy_from_slice(b"TAG");
    raw[3..8].copy_from_slice(b"Title");
    raw[33..39].copy_from_slice(b"Artist");
    raw[127] = 0xFF;
    raw
}

// Commit a fresh tag with only a title, returning the file.
fn tagged_file(title: &str, options: WriteOptions) -> NamedTempFile {
    let file = temp_file(&audio());

    let mut editor = TagEditor::open_with(file.path(), options).unwrap();
    editor.tag_or_insert().set_field(Field::Title, title).unwrap();
    editor.commit().unwrap();

    file
}

#[test]
fn untouched_files_stay_untouched() {
    let file = temp_file(&audio());

    let mut editor = TagEditor::open(file.path()).unwrap();
    assert!(editor.tag().is_none());
    editor.commit().unwrap();

    assert_eq!(contents(file.path()), audio());
}

#[test]
fn write_new_tag() {
    let file = tagged_file("Title", WriteOptions::default());
    let data = contents(file.path());

    // Header, TIT2 and the default padding.
    assert_eq!(data.len(), 10 + 17 + 1024 + audio().len());
    assert_eq!(&data[..10], b"ID3\x04\x00\x00\x00\x00\x08\x11");
    assert_eq!(&data[10..27], TIT2);
    assert!(data[27..1051].iter().all(|&byte| byte == 0));
    assert_eq!(&data[1051..], &audio()[..]);

    let tag = Tag::open(file.path()).unwrap();
    assert_eq!(tag.field(Field::Title).unwrap(), "Title");
}

#[test]
fn reuse_padding() {
    let file = tagged_file("Title", WriteOptions::default());
    let len = contents(file.path()).len();

    let mut editor = TagEditor::open(file.path()).unwrap();
    let tag = editor.tag_mut().unwrap();
    tag.set_field(Field::Title, "Another Title").unwrap();
    tag.set_field(Field::Artist, "Artist").unwrap();
    editor.commit().unwrap();

    let data = contents(file.path());
    assert_eq!(data.len(), len);
    assert_eq!(&data[1051..], &audio()[..]);

    let tag = Tag::open(file.path()).unwrap();
    assert_eq!(tag.header().size(), 1041);
    assert_eq!(tag.field(Field::Title).unwrap(), "Another Title");
    assert_eq!(tag.field(Field::Artist).unwrap(), "Artist");
}

#[test]
fn grow_tag() {
    let file = tagged_file("Title", WriteOptions::default());
    let title = "a".repeat(2000);

    let mut editor = TagEditor::open(file.path()).unwrap();
    editor.tag_mut().unwrap().set_field(Field::Title, &title).unwrap();
    editor.commit().unwrap();

    let data = contents(file.path());
    let region = 10 + (10 + 1 + 2000 + 1) + 1024;

    assert_eq!(data.len(), region + audio().len());
    assert_eq!(&data[region..], &audio()[..]);
    assert_eq!(Tag::open(file.path()).unwrap().field(Field::Title).unwrap(), title);
}

#[test]
fn shrink_past_padding_budget() {
    let options = WriteOptions {
        padding: 16,
        max_padding: 64,
    };

    let file = tagged_file(&"a".repeat(200), options);
    assert_eq!(contents(file.path()).len(), 10 + 212 + 16 + audio().len());

    let mut editor = TagEditor::open_with(file.path(), options).unwrap();
    editor.tag_mut().unwrap().set_field(Field::Title, "T").unwrap();
    editor.commit().unwrap();

    let data = contents(file.path());
    assert_eq!(data.len(), 10 + 13 + 16 + audio().len());
    assert_eq!(&data[39..], &audio()[..]);
}

#[test]
fn remove_tag() {
    let file = tagged_file("Title", WriteOptions::default());

    let mut editor = TagEditor::open(file.path()).unwrap();
    assert!(editor.remove_tag().is_some());
    editor.commit().unwrap();

    assert_eq!(contents(file.path()), audio());
    assert!(Tag::open(file.path()).is_err());

    // Committing again has nothing left to do.
    editor.commit().unwrap();
    assert_eq!(contents(file.path()), audio());
}

#[test]
fn remove_tag_with_footer() {
    let mut data = b"ID3\x04\x00\x10\x00\x00\x00\x11".to_vec();
    data.extend(TIT2);
    data.extend(b"3DI\x04\x00\x10\x00\x00\x00\x11");
    data.extend(audio());

    let file = temp_file(&data);

    let mut editor = TagEditor::open(file.path()).unwrap();
    assert!(editor.tag().unwrap().header().flags().footer);
    editor.remove_tag();
    editor.commit().unwrap();

    assert_eq!(contents(file.path()), audio());
}

#[test]
fn rewrite_tag_with_footer() {
    let mut data = b"ID3\x04\x00\x10\x00\x00\x00\x11".to_vec();
    data.extend(TIT2);
    data.extend(b"3DI\x04\x00\x10\x00\x00\x00\x11");
    data.extend(audio());

    let file = temp_file(&data);

    let mut editor = TagEditor::open(file.path()).unwrap();
    editor.commit().unwrap();

    let data = contents(file.path());
    assert_eq!(data.len(), 10 + 17 + 1024 + audio().len());
    assert_eq!(&data[1051..], &audio()[..]);

    let tag = Tag::open(file.path()).unwrap();
    assert!(!tag.header().flags().footer);
    assert_eq!(tag.field(Field::Title).unwrap(), "Title");
}

#[test]
fn replace_legacy_trailer() {
    let file = temp_file(&[audio(), legacy_trailer()].concat());

    let mut editor = TagEditor::open(file.path()).unwrap();
    assert_eq!(editor.legacy().unwrap().title, "Title");

    let tag = editor.tag_or_insert();
    assert_eq!(tag.field(Field::Artist).unwrap(), "Artist");
    assert!(tag.field(Field::Genre).is_none());

    editor.commit().unwrap();
    assert!(editor.legacy().is_none());

    let data = contents(file.path());
    assert!(data.ends_with(&audio()));

    let tag = Tag::open(file.path()).unwrap();
    assert_eq!(tag.field(Field::Title).unwrap(), "Title");
    assert_eq!(data.len(), tag.header().region_len() + audio().len());
}

#[test]
fn drop_legacy_trailer_in_place() {
    let file = tagged_file("Title", WriteOptions::default());

    let mut data = contents(file.path());
    data.extend(legacy_trailer());
    fs::write(file.path(), &data).unwrap();

    let mut editor = TagEditor::open(file.path()).unwrap();
    assert!(editor.legacy().is_some());
    editor.commit().unwrap();

    let data = contents(file.path());
    assert_eq!(data.len(), 1051 + audio().len());
    assert_eq!(&data[1051..], &audio()[..]);
}

#[test]
fn write_unsync_v3_tag() {
    let file = temp_file(&audio());
    let picture = vec![0xFF, 0xE0, 0xFF, 0x00, 0x01, 0xFF];

    let mut tag = Tag::new(Version::V23);
    tag.header_mut().flags_mut().unsync = true;
    tag.set_picture(
        AttachedPictureFrame::new("image/png", PictureType::FrontCover, "", picture.clone())
            .unwrap(),
    );

    let mut editor = TagEditor::open(file.path()).unwrap();
    editor.set_tag(tag);
    editor.commit().unwrap();

    let data = contents(file.path());
    assert_eq!(data[5], 0x80);

    let region = Tag::open(file.path()).unwrap().header().region_len();
    assert!(!data[10..region].windows(2).any(|w| w[0] == 0xFF && w[1] >= 0xE0));

    let tag = Tag::open(file.path()).unwrap();
    let apic = tag.get("APIC:").unwrap().downcast::<AttachedPictureFrame>().unwrap();
    assert_eq!(apic.picture, picture);
    assert!(data.ends_with(&audio()));
}

#[test]
fn convert_and_commit() {
    let file = temp_file(&audio());

    let mut editor = TagEditor::open(file.path()).unwrap();
    let tag = editor.tag_or_insert();
    tag.set_field(Field::Year, "2020-01-02T03:04").unwrap();
    tag.convert(Version::V23);
    editor.commit().unwrap();

    let mut tag = Tag::open(file.path()).unwrap();
    assert_eq!(tag.version(), Version::V23);
    assert_eq!(tag.field(Field::Year).unwrap(), "2020");
    assert!(tag.get("TDAT").is_some());
    assert!(tag.get("TIME").is_some());

    tag.convert(Version::V24);
    assert_eq!(tag.field(Field::Year).unwrap(), "2020-01-02T03:04");
}

#[test]
fn rewrite_tag_with_revision() {
    let mut data = b"ID3\x04\x01\x00\x00\x00\x00\x11".to_vec();
    data.extend(TIT2);
    data.extend(audio());

    let file = temp_file(&data);

    let mut editor = TagEditor::open(file.path()).unwrap();
    let tag = editor.tag_mut().unwrap();
    assert_eq!(tag.header().revision(), 1);
    tag.set_field(Field::Artist, "Artist").unwrap();
    editor.commit().unwrap();

    let data = contents(file.path());
    assert_eq!(&data[..5], b"ID3\x04\x01");
    assert!(data.ends_with(&audio()));

    let tag = Tag::open(file.path()).unwrap();
    assert_eq!(data.len(), tag.header().region_len() + audio().len());
    assert_eq!(tag.field(Field::Title).unwrap(), "Title");
    assert_eq!(tag.field(Field::Artist).unwrap(), "Artist");
}

#[test]
fn keep_repeated_private_frames() {
    let private = |owner: &[u8]| {
        let mut frame = b"PRIV\x00\x00\x00\x06\x00\x00".to_vec();
        frame.extend(owner);
        frame.extend(b"\x00\x01");
        frame
    };

    let mut data = b"ID3\x04\x00\x00\x00\x00\x00\x31".to_vec();
    data.extend(private(b"WM/A"));
    data.extend(private(b"WM/B"));
    data.extend(TIT2);
    data.extend(audio());

    let file = temp_file(&data);

    let mut editor = TagEditor::open(file.path()).unwrap();
    editor.tag_mut().unwrap().set_field(Field::Title, "Other").unwrap();
    editor.commit().unwrap();

    let tag = Tag::open(file.path()).unwrap();
    let owners: Vec<_> = tag
        .frames()
        .get_all(b"PRIV")
        .iter()
        .map(|frame| frame.downcast::<UnknownFrame>().unwrap().data[..4].to_vec())
        .collect();

    assert_eq!(owners, &[b"WM/A".to_vec(), b"WM/B".to_vec()]);
    assert_eq!(tag.field(Field::Title).unwrap(), "Other");
}
