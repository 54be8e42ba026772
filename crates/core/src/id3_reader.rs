use crate::error::VariableError;
use crate::metadata::{Id3Field, MetadataMap, MetadataProvider};
use lofty::file::FileType;
use lofty::prelude::*;
use lofty::tag::{ItemKey, TagType};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct Id3Provider;

impl MetadataProvider for Id3Provider {
    fn extract_fields(&self, path: &Path) -> Result<MetadataMap, VariableError> {
        if !path.exists() {
            return Err(VariableError::io(path, "ファイルが存在しません"));
        }
        let tagged = lofty::read_from_path(path).map_err(|err| VariableError::metadata(path, err))?;

        let mut map = MetadataMap::new();
        if let Some(name) = file_type_name(tagged.file_type()) {
            map.insert(Id3Field::FileType.key(), name);
        }

        let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) else {
            return Ok(map);
        };

        if let Some(name) = tag_type_name(tag.tag_type()) {
            map.insert(Id3Field::Format.key(), name);
        }

        let text_fields = [
            (Id3Field::Title, tag.title()),
            (Id3Field::Artist, tag.artist()),
            (Id3Field::Album, tag.album()),
            (Id3Field::Genre, tag.genre()),
        ];
        for (field, value) in text_fields {
            if let Some(value) = value {
                map.insert(field.key(), value.into_owned());
            }
        }

        if let Some(album_artist) = tag.get_string(&ItemKey::AlbumArtist) {
            map.insert(Id3Field::AlbumArtist.key(), album_artist);
        }

        let number_fields = [
            (Id3Field::Year, tag.year()),
            (Id3Field::Track, tag.track()),
            (Id3Field::TotalTracks, tag.track_total()),
            (Id3Field::Disc, tag.disk()),
            (Id3Field::TotalDiscs, tag.disk_total()),
        ];
        for (field, value) in number_fields {
            if let Some(value) = value {
                map.insert(field.key(), value.to_string());
            }
        }

        Ok(map)
    }
}

fn file_type_name(file_type: FileType) -> Option<&'static str> {
    let name = match file_type {
        FileType::Aac => "aac",
        FileType::Aiff => "aiff",
        FileType::Ape => "ape",
        FileType::Flac => "flac",
        FileType::Mpeg => "mp3",
        FileType::Mp4 => "mp4",
        FileType::Mpc => "mpc",
        FileType::Opus => "opus",
        FileType::Vorbis => "ogg",
        FileType::Speex => "speex",
        FileType::Wav => "wav",
        FileType::WavPack => "wavpack",
        FileType::Custom(name) => name,
        _ => return None,
    };
    Some(name)
}

fn tag_type_name(tag_type: TagType) -> Option<&'static str> {
    let name = match tag_type {
        TagType::Ape => "APE",
        TagType::Id3v1 => "ID3v1",
        TagType::Id3v2 => "ID3v2",
        TagType::Mp4Ilst => "MP4",
        TagType::VorbisComments => "Vorbis",
        TagType::RiffInfo => "RIFF",
        TagType::AiffText => "AIFF",
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn container_and_tag_names_are_fixed_strings() {
        assert_eq!(file_type_name(FileType::Mpeg), Some("mp3"));
        assert_eq!(file_type_name(FileType::Vorbis), Some("ogg"));
        assert_eq!(file_type_name(FileType::Custom("dsf")), Some("dsf"));
        assert_eq!(tag_type_name(TagType::Id3v2), Some("ID3v2"));
        assert_eq!(tag_type_name(TagType::VorbisComments), Some("Vorbis"));
        assert_eq!(tag_type_name(TagType::Mp4Ilst), Some("MP4"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Id3Provider
            .extract_fields(Path::new("/definitely/not/here.mp3"))
            .expect_err("must fail");
        assert!(matches!(err, VariableError::Io { .. }));
    }

    #[test]
    fn non_audio_file_is_metadata_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("notes.txt");
        fs::write(&path, "plain text, no tags").expect("write");
        let err = Id3Provider.extract_fields(&path).expect_err("must fail");
        assert!(matches!(err, VariableError::Metadata { .. }));
    }
}
