use std::time::Duration;

use crate::models::{MediaFile, MediaType, Orientation};

/// Raw metadata row as reported by a platform media index, before
/// normalization.
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub id: String,
    pub kind: MediaType,
    /// Epoch seconds
    pub date_added: Option<i64>,
    /// Epoch seconds; the thumbnail cache invalidation anchor
    pub modified_at: i64,
    pub path: Option<String>,
    pub bucket_id: String,
    pub bucket_name: Option<String>,
    pub mime_type: Option<String>,
    /// Rotation metadata, where the platform exposes it directly
    pub orientation_degrees: Option<i32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration: Option<Duration>,
    /// Preferred transform matrix (a, b, c, d) of the primary video track
    pub transform: Option<[f64; 4]>,
    pub is_live_photo: bool,
}

impl RawRecord {
    pub fn new(id: impl Into<String>, kind: MediaType) -> Self {
        Self {
            id: id.into(),
            kind,
            date_added: None,
            modified_at: 0,
            path: None,
            bucket_id: String::new(),
            bucket_name: None,
            mime_type: None,
            orientation_degrees: None,
            width: None,
            height: None,
            duration: None,
            transform: None,
            is_live_photo: false,
        }
    }
}

/// Converts raw platform records into uniform [`MediaFile`]s.
///
/// Per-platform metadata quirks (orientation sources, duration units,
/// unreliable album names) live behind this interface; an implementation is
/// selected once when the source adapter is constructed.
pub trait Normalizer: Send + Sync {
    fn normalize(&self, raw: &RawRecord) -> MediaFile;
}

/// Normalizer for MediaStore-style indexes (Android).
///
/// Rotation is read straight from metadata. Bucket display names for images
/// are unusable on some devices, so an empty name is emitted instead of a
/// broken one.
pub struct MediaStoreNormalizer;

impl Normalizer for MediaStoreNormalizer {
    fn normalize(&self, raw: &RawRecord) -> MediaFile {
        let orientation = match raw.orientation_degrees {
            Some(degrees) => Orientation::from_degrees(degrees),
            None => dimension_orientation(raw),
        };

        let album_name = match raw.kind {
            MediaType::Image => String::new(),
            MediaType::Video => raw.bucket_name.clone().unwrap_or_default(),
        };

        build_file(raw, orientation, album_name)
    }
}

/// Normalizer for Photos-framework-style records (iOS).
///
/// Image rotation is inferred from pixel dimensions; video rotation comes
/// from the track transform matrix.
pub struct PhotoKitNormalizer;

impl Normalizer for PhotoKitNormalizer {
    fn normalize(&self, raw: &RawRecord) -> MediaFile {
        let orientation = match raw.kind {
            MediaType::Image => dimension_orientation(raw),
            MediaType::Video => raw
                .transform
                .map(Orientation::from_transform)
                .unwrap_or_default(),
        };

        let album_name = raw.bucket_name.clone().unwrap_or_default();

        build_file(raw, orientation, album_name)
    }
}

fn build_file(raw: &RawRecord, orientation: Orientation, album_name: String) -> MediaFile {
    let is_live_photo = raw.kind == MediaType::Image && raw.is_live_photo;

    MediaFile {
        id: raw.id.clone(),
        album_id: raw.bucket_id.clone(),
        album_name,
        date_added: raw.date_added,
        path: raw.path.clone(),
        thumbnail_path: None,
        orientation,
        duration: duration_secs(raw, is_live_photo),
        mime_type: raw.mime_type.clone(),
        media_type: raw.kind,
        is_live_photo,
    }
}

/// Duration in fractional seconds, the one canonical unit. Only videos and
/// live photos carry one.
fn duration_secs(raw: &RawRecord, is_live_photo: bool) -> Option<f64> {
    if raw.kind == MediaType::Video || is_live_photo {
        raw.duration.map(|d| d.as_secs_f64())
    } else {
        None
    }
}

fn dimension_orientation(raw: &RawRecord) -> Orientation {
    match (raw.width, raw.height) {
        (Some(width), Some(height)) => Orientation::from_dimensions(width, height),
        _ => Orientation::Deg0,
    }
}
