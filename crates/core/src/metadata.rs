use crate::error::VariableError;
use crate::exif_reader::ExifProvider;
use crate::exiftool::ExifToolProvider;
use crate::id3_reader::Id3Provider;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MetadataSource {
    Exif,
    Id3,
    ExifTool,
}

impl fmt::Display for MetadataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Exif => "exif",
            Self::Id3 => "id3",
            Self::ExifTool => "exiftool",
        };
        f.write_str(name)
    }
}

/// Flat field map handed back by a metadata extractor. Blank values are
/// dropped on insert so a lookup never yields an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataMap {
    fields: BTreeMap<String, String>,
}

impl MetadataMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        self.fields.insert(key.into(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn require(&self, from: MetadataSource, key: &str) -> Result<&str, VariableError> {
        self.get(key)
            .ok_or_else(|| VariableError::missing(from, key))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MetadataMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

pub trait MetadataProvider: Send + Sync {
    fn extract_fields(&self, path: &Path) -> Result<MetadataMap, VariableError>;
}

#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    fields: MetadataMap,
}

impl StaticProvider {
    pub fn new(fields: MetadataMap) -> Self {
        Self { fields }
    }
}

impl MetadataProvider for StaticProvider {
    fn extract_fields(&self, _path: &Path) -> Result<MetadataMap, VariableError> {
        Ok(self.fields.clone())
    }
}

pub struct Providers {
    pub exif: Box<dyn MetadataProvider>,
    pub id3: Box<dyn MetadataProvider>,
    pub exiftool: Box<dyn MetadataProvider>,
}

impl Default for Providers {
    fn default() -> Self {
        Self {
            exif: Box::new(ExifProvider),
            id3: Box::new(Id3Provider),
            exiftool: Box::new(ExifToolProvider::default()),
        }
    }
}

impl fmt::Debug for Providers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Providers").finish_non_exhaustive()
    }
}

impl Providers {
    pub fn with_exif(mut self, provider: impl MetadataProvider + 'static) -> Self {
        self.exif = Box::new(provider);
        self
    }

    pub fn with_id3(mut self, provider: impl MetadataProvider + 'static) -> Self {
        self.id3 = Box::new(provider);
        self
    }

    pub fn with_exiftool(mut self, provider: impl MetadataProvider + 'static) -> Self {
        self.exiftool = Box::new(provider);
        self
    }

    pub fn for_source(&self, source: MetadataSource) -> &dyn MetadataProvider {
        match source {
            MetadataSource::Exif => self.exif.as_ref(),
            MetadataSource::Id3 => self.id3.as_ref(),
            MetadataSource::ExifTool => self.exiftool.as_ref(),
        }
    }
}

pub mod exif_keys {
    pub const MAKE: &str = "Make";
    pub const MODEL: &str = "Model";
    pub const LENS: &str = "LensModel";
    pub const ISO: &str = "ISO";
    pub const WIDTH: &str = "ImageWidth";
    pub const HEIGHT: &str = "ImageHeight";
    pub const EXPOSURE_TIME: &str = "ExposureTime";
    pub const FOCAL_LENGTH: &str = "FocalLength";
    pub const FOCAL_LENGTH_35: &str = "FocalLengthIn35mmFilm";
    pub const F_NUMBER: &str = "FNumber";
    pub const SOFTWARE: &str = "Software";
    pub const LATITUDE: &str = "GPSLatitude";
    pub const LONGITUDE: &str = "GPSLongitude";
    pub const DATE_TIME_ORIGINAL: &str = "DateTimeOriginal";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExifField {
    Make,
    Model,
    Lens,
    Iso,
    Width,
    Height,
    Dimensions,
    ExposureTime,
    FocalLength,
    FocalLength35,
    FNumber,
    Software,
    Latitude,
    Longitude,
}

impl ExifField {
    pub const ALL: [Self; 14] = [
        Self::Make,
        Self::Model,
        Self::Lens,
        Self::Iso,
        Self::Width,
        Self::Height,
        Self::Dimensions,
        Self::ExposureTime,
        Self::FocalLength,
        Self::FocalLength35,
        Self::FNumber,
        Self::Software,
        Self::Latitude,
        Self::Longitude,
    ];

    pub fn parse(alias: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.alias() == alias)
    }

    pub fn alias(self) -> &'static str {
        match self {
            Self::Make => "make",
            Self::Model => "model",
            Self::Lens => "lens",
            Self::Iso => "iso",
            Self::Width => "w",
            Self::Height => "h",
            Self::Dimensions => "wh",
            Self::ExposureTime => "et",
            Self::FocalLength => "fl",
            Self::FocalLength35 => "fl35",
            Self::FNumber => "fnum",
            Self::Software => "soft",
            Self::Latitude => "lat",
            Self::Longitude => "lon",
        }
    }

    pub fn key(self) -> Option<&'static str> {
        match self {
            Self::Make => Some(exif_keys::MAKE),
            Self::Model => Some(exif_keys::MODEL),
            Self::Lens => Some(exif_keys::LENS),
            Self::Iso => Some(exif_keys::ISO),
            Self::Width => Some(exif_keys::WIDTH),
            Self::Height => Some(exif_keys::HEIGHT),
            Self::Dimensions => None,
            Self::ExposureTime => Some(exif_keys::EXPOSURE_TIME),
            Self::FocalLength => Some(exif_keys::FOCAL_LENGTH),
            Self::FocalLength35 => Some(exif_keys::FOCAL_LENGTH_35),
            Self::FNumber => Some(exif_keys::F_NUMBER),
            Self::Software => Some(exif_keys::SOFTWARE),
            Self::Latitude => Some(exif_keys::LATITUDE),
            Self::Longitude => Some(exif_keys::LONGITUDE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExifToken {
    Field(ExifField),
    DateTime(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Id3Field {
    Title,
    Artist,
    Album,
    AlbumArtist,
    Genre,
    Year,
    Track,
    TotalTracks,
    Disc,
    TotalDiscs,
    Format,
    FileType,
}

impl Id3Field {
    pub const ALL: [Self; 12] = [
        Self::Title,
        Self::Artist,
        Self::Album,
        Self::AlbumArtist,
        Self::Genre,
        Self::Year,
        Self::Track,
        Self::TotalTracks,
        Self::Disc,
        Self::TotalDiscs,
        Self::Format,
        Self::FileType,
    ];

    pub fn parse(alias: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == alias)
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Artist => "artist",
            Self::Album => "album",
            Self::AlbumArtist => "album_artist",
            Self::Genre => "genre",
            Self::Year => "year",
            Self::Track => "track",
            Self::TotalTracks => "total_tracks",
            Self::Disc => "disc",
            Self::TotalDiscs => "total_discs",
            Self::Format => "format",
            Self::FileType => "type",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_trims_and_drops_blank_values() {
        let mut map = MetadataMap::new();
        map.insert("Make", "  FUJIFILM  ");
        map.insert("Model", "   ");
        assert_eq!(map.get("Make"), Some("FUJIFILM"));
        assert_eq!(map.get("Model"), None);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn require_reports_missing_field() {
        let map: MetadataMap = [("title", "Song")].into_iter().collect();
        assert_eq!(map.require(MetadataSource::Id3, "title"), Ok("Song"));
        let err = map
            .require(MetadataSource::Id3, "album")
            .expect_err("must fail");
        assert_eq!(err, VariableError::missing(MetadataSource::Id3, "album"));
    }

    #[test]
    fn aliases_round_trip() {
        for field in ExifField::ALL {
            assert_eq!(ExifField::parse(field.alias()), Some(field));
        }
        for field in Id3Field::ALL {
            assert_eq!(Id3Field::parse(field.key()), Some(field));
        }
        assert_eq!(ExifField::parse("shutter"), None);
    }

    #[test]
    fn providers_can_be_substituted() {
        let fields: MetadataMap = [("FOV", "69.4 deg")].into_iter().collect();
        let providers = Providers::default().with_exiftool(StaticProvider::new(fields.clone()));
        let extracted = providers
            .for_source(MetadataSource::ExifTool)
            .extract_fields(Path::new("any.dng"))
            .expect("static provider");
        assert_eq!(extracted, fields);
    }
}
