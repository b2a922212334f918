use crate::errorln;
use crate::CliError;

use clap::Values;
use id3core::id3v2::{Field, TagEditor, Version};
use log::info;

/// Apply `field=value` assignments to the tag of `path`, creating the tag if needed. An
/// empty value removes the field.
pub fn set(path: &str, assignments: Values) -> Result<(), CliError> {
    let assignments = assignments
        .map(parse_assignment)
        .collect::<Result<Vec<_>, _>>()?;

    set_fields(path, &assignments)
}

fn set_fields(path: &str, assignments: &[(Field, &str)]) -> Result<(), CliError> {
    let mut editor = TagEditor::open(path)?;
    let tag = editor.tag_or_insert();

    for &(field, value) in assignments {
        if value.is_empty() {
            info!(target: "id3core", "removing {}", field);
            tag.remove_field(field);
        } else {
            tag.set_field(field, value)?;
        }
    }

    // A tag with nothing left in it cannot be written.
    if tag.frames().values().all(|frame| frame.is_empty()) {
        info!(target: "id3core", "no fields left, removing the tag");
        editor.remove_tag();
    }

    editor.commit()?;

    Ok(())
}

fn parse_assignment(arg: &str) -> Result<(Field, &str), CliError> {
    let (name, value) = match arg.find('=') {
        Some(idx) => (&arg[..idx], &arg[idx + 1..]),
        None => return Err(CliError::BadArgument(arg.to_string())),
    };

    match Field::from_name(name) {
        Some(field) => Ok((field, value)),
        None => Err(CliError::BadArgument(name.to_string())),
    }
}

/// Remove the tag from every file in `paths`. Returns whether every file succeeded.
pub fn strip(paths: Values) -> bool {
    let mut ok = true;

    for path in paths {
        if let Err(err) = strip_file(path) {
            errorln!("{}: {}", path, err);
            ok = false;
        }
    }

    ok
}

fn strip_file(path: &str) -> Result<(), CliError> {
    let mut editor = TagEditor::open(path)?;

    if editor.remove_tag().is_none() {
        return Err(CliError::NoMetadata);
    }

    editor.commit()?;

    Ok(())
}

/// Convert the tag of `path` to another version.
pub fn convert(path: &str, version: &str) -> Result<(), CliError> {
    let version = match version {
        "3" => Version::V23,
        "4" => Version::V24,
        _ => return Err(CliError::BadArgument(version.to_string())),
    };

    let mut editor = TagEditor::open(path)?;

    match editor.tag_mut() {
        Some(tag) => tag.convert(version),
        None => return Err(CliError::NoMetadata),
    }

    editor.commit()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use id3core::id3v2::Tag;
    use std::fs;
    use tempfile::NamedTempFile;

    const AUDIO: &[u8] = b"\xFF\xFB\x90\x00\x01\x02\x03\x04";

    fn audio_file() -> NamedTempFile {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), AUDIO).unwrap();
        file
    }

    #[test]
    fn parse_assignments() {
        assert!(matches!(parse_assignment("title=Title"), Ok((Field::Title, "Title"))));
        assert!(matches!(parse_assignment("year="), Ok((Field::Year, ""))));
        assert!(matches!(parse_assignment("comment=a=b"), Ok((Field::Comment, "a=b"))));
        assert!(matches!(parse_assignment("title"), Err(CliError::BadArgument(_))));
        assert!(matches!(parse_assignment("nothing=1"), Err(CliError::BadArgument(_))));
    }

    #[test]
    fn set_and_clear_fields() {
        let file = audio_file();
        let path = file.path().to_str().unwrap();

        set_fields(path, &[(Field::Title, "Title"), (Field::Artist, "Artist")]).unwrap();

        let tag = Tag::open(path).unwrap();
        assert_eq!(tag.field(Field::Title).unwrap(), "Title");
        assert_eq!(tag.field(Field::Artist).unwrap(), "Artist");

        set_fields(path, &[(Field::Title, ""), (Field::Artist, "")]).unwrap();
        assert_eq!(fs::read(path).unwrap(), AUDIO);
    }

    #[test]
    fn clear_fields_without_tag() {
        let file = audio_file();
        let path = file.path().to_str().unwrap();

        set_fields(path, &[(Field::Title, "")]).unwrap();
        assert_eq!(fs::read(path).unwrap(), AUDIO);
    }
}
