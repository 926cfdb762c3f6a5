use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio_util::sync::CancellationToken;

use crate::error::GalleryError;
use crate::models::{MediaFile, MediaType};
use crate::normalize::{MediaStoreNormalizer, Normalizer, RawRecord};

/// Inclusive date-added window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Filters for bulk media queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct MediaFilter {
    pub with_images: bool,
    pub with_videos: bool,
    pub range: Option<DateRange>,
}

impl MediaFilter {
    pub fn new(with_images: bool, with_videos: bool) -> Self {
        Self {
            with_images,
            with_videos,
            range: None,
        }
    }

    pub fn with_range(mut self, range: DateRange) -> Self {
        self.range = Some(range);
        self
    }
}

/// Read-only view of the device media index.
///
/// Bulk queries return results in descending device-id order, a proxy for
/// recency on the platforms this models (not guaranteed to match true
/// recency; callers sort where order matters).
pub trait MediaSource: Send + Sync {
    /// Bulk query; matching nothing yields an empty list, never an error.
    fn fetch_all(&self, filter: &MediaFilter) -> Result<Vec<MediaFile>, GalleryError>;

    /// Single asset lookup; a missing row surfaces as `NotFound`.
    fn fetch_one(&self, id: &str, kind: MediaType) -> Result<MediaFile, GalleryError>;

    /// Last-modified stamp of an asset, the thumbnail cache invalidation
    /// anchor.
    fn modification_stamp(&self, id: &str, kind: MediaType) -> Result<i64, GalleryError>;

    /// Thumbnails the platform already tracks for the given kind
    /// (asset id to rendered preview path). Platforms without a registry
    /// report none.
    fn known_thumbnails(&self, _kind: MediaType) -> Result<HashMap<String, String>, GalleryError> {
        Ok(HashMap::new())
    }

    /// Registers a generated thumbnail with the platform registry. Best
    /// effort; platforms without one accept and ignore it.
    fn register_thumbnail(
        &self,
        _id: &str,
        _kind: MediaType,
        _path: &Path,
    ) -> Result<(), GalleryError> {
        Ok(())
    }
}

/// Streams paired asset resources (the video half of a live photo) to disk.
#[async_trait]
pub trait ResourceWriter: Send + Sync {
    /// Writes the paired video of a live photo into `dest` (a directory)
    /// and returns the written file's path.
    async fn write_paired_video(
        &self,
        id: &str,
        dest: &Path,
        token: &CancellationToken,
    ) -> Result<PathBuf, GalleryError>;
}

const IMAGE_COLUMNS: &str = "id, date_added, date_modified, path, bucket_id, bucket_name, \
     mime_type, orientation, width, height, is_live_photo";
const VIDEO_COLUMNS: &str = "id, date_added, date_modified, path, bucket_id, bucket_name, \
     mime_type, orientation, duration_ms";

/// Media source backed by the on-device index database.
///
/// Platform-specific metadata quirks are isolated in the [`Normalizer`]
/// chosen at construction.
pub struct IndexSource {
    conn: Mutex<Connection>,
    normalizer: Box<dyn Normalizer>,
}

impl IndexSource {
    pub fn new(conn: Connection) -> Self {
        Self::with_normalizer(conn, Box::new(MediaStoreNormalizer))
    }

    pub fn with_normalizer(conn: Connection, normalizer: Box<dyn Normalizer>) -> Self {
        Self {
            conn: Mutex::new(conn),
            normalizer,
        }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn query_kind(
        &self,
        conn: &Connection,
        kind: MediaType,
        range: Option<DateRange>,
        out: &mut Vec<MediaFile>,
    ) -> Result<(), GalleryError> {
        let sql = match (kind, range.is_some()) {
            (MediaType::Image, true) => format!(
                "SELECT {} FROM images WHERE date_added BETWEEN ?1 AND ?2 ORDER BY id DESC",
                IMAGE_COLUMNS
            ),
            (MediaType::Image, false) => {
                format!("SELECT {} FROM images ORDER BY id DESC", IMAGE_COLUMNS)
            }
            (MediaType::Video, true) => format!(
                "SELECT {} FROM videos WHERE date_added BETWEEN ?1 AND ?2 ORDER BY id DESC",
                VIDEO_COLUMNS
            ),
            (MediaType::Video, false) => {
                format!("SELECT {} FROM videos ORDER BY id DESC", VIDEO_COLUMNS)
            }
        };

        let mapper: fn(&Row<'_>) -> rusqlite::Result<RawRecord> = match kind {
            MediaType::Image => image_record,
            MediaType::Video => video_record,
        };

        let mut stmt = conn.prepare(&sql)?;
        let records: Vec<RawRecord> = match range {
            Some(range) => stmt
                .query_map(
                    params![range.start.timestamp(), range.end.timestamp()],
                    mapper,
                )?
                .collect::<Result<_, _>>()?,
            None => stmt.query_map([], mapper)?.collect::<Result<_, _>>()?,
        };

        out.extend(records.iter().map(|raw| self.normalizer.normalize(raw)));
        Ok(())
    }

    fn raw_one(&self, id: &str, kind: MediaType) -> Result<Option<RawRecord>, GalleryError> {
        // Device-internal ids are numeric in this index; anything else
        // cannot resolve.
        let numeric: i64 = match id.parse() {
            Ok(numeric) => numeric,
            Err(_) => return Ok(None),
        };

        let conn = self.conn();
        let record = match kind {
            MediaType::Image => conn
                .query_row(
                    &format!("SELECT {} FROM images WHERE id = ?1", IMAGE_COLUMNS),
                    params![numeric],
                    image_record,
                )
                .optional()?,
            MediaType::Video => conn
                .query_row(
                    &format!("SELECT {} FROM videos WHERE id = ?1", VIDEO_COLUMNS),
                    params![numeric],
                    video_record,
                )
                .optional()?,
        };

        Ok(record)
    }
}

impl MediaSource for IndexSource {
    fn fetch_all(&self, filter: &MediaFilter) -> Result<Vec<MediaFile>, GalleryError> {
        let conn = self.conn();
        let mut files = Vec::new();

        if filter.with_images {
            self.query_kind(&conn, MediaType::Image, filter.range, &mut files)?;
        }
        if filter.with_videos {
            self.query_kind(&conn, MediaType::Video, filter.range, &mut files)?;
        }

        log::debug!("media index query matched {} files", files.len());
        Ok(files)
    }

    fn fetch_one(&self, id: &str, kind: MediaType) -> Result<MediaFile, GalleryError> {
        self.raw_one(id, kind)?
            .map(|raw| self.normalizer.normalize(&raw))
            .ok_or_else(|| GalleryError::NotFound(format!("asset {} not found", id)))
    }

    fn modification_stamp(&self, id: &str, kind: MediaType) -> Result<i64, GalleryError> {
        self.raw_one(id, kind)?
            .map(|raw| raw.modified_at)
            .ok_or_else(|| GalleryError::NotFound(format!("asset {} not found", id)))
    }

    fn known_thumbnails(&self, kind: MediaType) -> Result<HashMap<String, String>, GalleryError> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT asset_id, path FROM thumbnails WHERE kind = ?1")?;
        let rows = stmt.query_map(params![kind.ordinal() as i64], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut known = HashMap::new();
        for row in rows {
            let (asset_id, path) = row?;
            // Registry rows can outlive the files they point at.
            if Path::new(&path).exists() {
                known.insert(asset_id, path);
            }
        }
        Ok(known)
    }

    fn register_thumbnail(
        &self,
        id: &str,
        kind: MediaType,
        path: &Path,
    ) -> Result<(), GalleryError> {
        self.conn().execute(
            "INSERT OR REPLACE INTO thumbnails (asset_id, kind, path) VALUES (?1, ?2, ?3)",
            params![id, kind.ordinal() as i64, path.to_string_lossy().into_owned()],
        )?;
        Ok(())
    }
}

#[async_trait]
impl ResourceWriter for IndexSource {
    async fn write_paired_video(
        &self,
        id: &str,
        dest: &Path,
        token: &CancellationToken,
    ) -> Result<PathBuf, GalleryError> {
        let source: Option<String> = {
            let numeric: i64 = id
                .parse()
                .map_err(|_| GalleryError::NotFound(format!("asset {} not found", id)))?;
            self.conn()
                .query_row(
                    "SELECT paired_video_path FROM images WHERE id = ?1",
                    params![numeric],
                    |row| row.get(0),
                )
                .optional()?
                .flatten()
        };

        let source = source.ok_or_else(|| {
            GalleryError::NotFound(format!("no paired video resource for asset {}", id))
        })?;

        let file_name = Path::new(&source)
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("paired.mov"));
        let target = dest.join(file_name);

        tokio::fs::create_dir_all(dest).await?;
        tokio::select! {
            _ = token.cancelled() => Err(GalleryError::Cancelled),
            copied = tokio::fs::copy(&source, &target) => {
                copied?;
                Ok(target)
            }
        }
    }
}

fn image_record(row: &Row<'_>) -> rusqlite::Result<RawRecord> {
    Ok(RawRecord {
        id: row.get::<_, i64>(0)?.to_string(),
        kind: MediaType::Image,
        date_added: row.get(1)?,
        modified_at: row.get(2)?,
        path: row.get(3)?,
        bucket_id: row.get(4)?,
        bucket_name: row.get(5)?,
        mime_type: row.get(6)?,
        orientation_degrees: row.get(7)?,
        width: row.get(8)?,
        height: row.get(9)?,
        duration: None,
        transform: None,
        is_live_photo: row.get(10)?,
    })
}

fn video_record(row: &Row<'_>) -> rusqlite::Result<RawRecord> {
    Ok(RawRecord {
        id: row.get::<_, i64>(0)?.to_string(),
        kind: MediaType::Video,
        date_added: row.get(1)?,
        modified_at: row.get(2)?,
        path: row.get(3)?,
        bucket_id: row.get(4)?,
        bucket_name: row.get(5)?,
        mime_type: row.get(6)?,
        orientation_degrees: row.get(7)?,
        width: None,
        height: None,
        duration: row
            .get::<_, Option<i64>>(8)?
            .and_then(|ms| u64::try_from(ms).ok())
            .map(Duration::from_millis),
        transform: None,
        is_live_photo: false,
    })
}
