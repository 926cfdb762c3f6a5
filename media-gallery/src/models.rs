use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::PathBuf;

/// Kind of an indexed media asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    /// Wire ordinal used by the caller-facing surface (0 = image, 1 = video).
    pub fn ordinal(self) -> u8 {
        match self {
            MediaType::Image => 0,
            MediaType::Video => 1,
        }
    }

    pub fn from_ordinal(value: u8) -> Option<Self> {
        match value {
            0 => Some(MediaType::Image),
            1 => Some(MediaType::Video),
            _ => None,
        }
    }
}

impl Serialize for MediaType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.ordinal())
    }
}

impl<'de> Deserialize<'de> for MediaType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        MediaType::from_ordinal(value)
            .ok_or_else(|| D::Error::custom(format!("unknown media type ordinal {}", value)))
    }
}

/// Asset rotation, restricted to the four canonical values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Orientation {
    pub fn degrees(self) -> u16 {
        match self {
            Orientation::Deg0 => 0,
            Orientation::Deg90 => 90,
            Orientation::Deg180 => 180,
            Orientation::Deg270 => 270,
        }
    }

    /// Snaps raw metadata degrees to a canonical value. Anything that is not
    /// a quarter turn counts as upright.
    pub fn from_degrees(raw: i32) -> Self {
        match raw.rem_euclid(360) {
            90 => Orientation::Deg90,
            180 => Orientation::Deg180,
            270 => Orientation::Deg270,
            _ => Orientation::Deg0,
        }
    }

    /// Orientation inferred from pixel dimensions, for records that carry no
    /// usable rotation metadata. Portrait dimensions imply a 90 degree turn.
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        if width < height {
            Orientation::Deg90
        } else {
            Orientation::Deg0
        }
    }

    /// Maps the preferred transform matrix (a, b, c, d) of a video track to a
    /// rotation. Unrecognized matrices are treated as upright.
    pub fn from_transform(t: [f64; 4]) -> Self {
        if t == [0.0, 1.0, -1.0, 0.0] {
            Orientation::Deg90
        } else if t == [0.0, -1.0, 1.0, 0.0] {
            Orientation::Deg270
        } else if t == [-1.0, 0.0, 0.0, -1.0] {
            Orientation::Deg180
        } else {
            Orientation::Deg0
        }
    }
}

impl Serialize for Orientation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.degrees())
    }
}

impl<'de> Deserialize<'de> for Orientation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Orientation::from_degrees(i32::deserialize(deserializer)?))
    }
}

/// A single indexed media item, normalized across platforms.
///
/// `duration` is in fractional seconds and present only for videos and live
/// photos. `path` stays empty until the platform has resolved it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFile {
    pub id: String,
    pub album_id: String,
    pub album_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_added: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_path: Option<String>,
    pub orientation: Orientation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub is_live_photo: bool,
}

/// Compact record for bulk asset listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAsset {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_added: Option<i64>,
    pub orientation: Orientation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub is_live_photo: bool,
}

impl From<&MediaFile> for MediaAsset {
    fn from(file: &MediaFile) -> Self {
        Self {
            id: file.id.clone(),
            date_added: file.date_added,
            orientation: file.orientation,
            duration: file.duration,
            media_type: file.media_type,
            is_live_photo: file.is_live_photo,
        }
    }
}

/// A named grouping of media files as reported by the platform index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: String,
    pub name: String,
    pub files: Vec<MediaFile>,
}

/// Configuration for gallery initialization.
#[derive(Debug, Clone)]
pub struct GalleryConfig {
    /// Directory for generated thumbnails
    pub cache_dir: PathBuf,
    /// Directory for exported live photo resources
    pub resource_dir: PathBuf,
    /// Thumbnail edge length for images
    pub image_thumbnail_size: u32,
    /// Thumbnail edge length for videos
    pub video_thumbnail_size: u32,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::new(),
            resource_dir: PathBuf::new(),
            image_thumbnail_size: 90,
            video_thumbnail_size: 270,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_wire_ordinals() {
        assert_eq!(MediaType::Image.ordinal(), 0);
        assert_eq!(MediaType::Video.ordinal(), 1);
        assert_eq!(MediaType::from_ordinal(1), Some(MediaType::Video));
        assert_eq!(MediaType::from_ordinal(7), None);
    }

    #[test]
    fn test_orientation_snaps_to_canonical_values() {
        assert_eq!(Orientation::from_degrees(90), Orientation::Deg90);
        assert_eq!(Orientation::from_degrees(-90), Orientation::Deg270);
        assert_eq!(Orientation::from_degrees(450), Orientation::Deg90);
        assert_eq!(Orientation::from_degrees(45), Orientation::Deg0);
    }

    #[test]
    fn test_media_file_wire_shape() {
        let file = MediaFile {
            id: "42".to_string(),
            album_id: "7".to_string(),
            album_name: "Camera".to_string(),
            date_added: Some(1_700_000_000),
            path: Some("/storage/DCIM/a.jpg".to_string()),
            thumbnail_path: None,
            orientation: Orientation::Deg90,
            duration: None,
            mime_type: Some("image/jpeg".to_string()),
            media_type: MediaType::Image,
            is_live_photo: false,
        };

        let value = serde_json::to_value(&file).unwrap();
        assert_eq!(value["id"], "42");
        assert_eq!(value["albumId"], "7");
        assert_eq!(value["dateAdded"], 1_700_000_000_i64);
        assert_eq!(value["orientation"], 90);
        assert_eq!(value["type"], 0);
        assert_eq!(value["isLivePhoto"], false);
        // Absent optionals stay off the wire entirely.
        assert!(value.get("thumbnailPath").is_none());
        assert!(value.get("duration").is_none());

        let back: MediaFile = serde_json::from_value(value).unwrap();
        assert_eq!(back, file);
    }
}
