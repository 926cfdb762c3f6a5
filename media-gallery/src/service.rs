use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::album::aggregate_albums;
use crate::error::GalleryError;
use crate::models::{Album, GalleryConfig, MediaAsset, MediaFile, MediaType};
use crate::source::{MediaFilter, MediaSource, ResourceWriter};
use crate::thumbnail::{ThumbnailCache, ThumbnailRenderer};

/// Gallery service: albums, media metadata and on-demand thumbnails.
///
/// Every operation is an awaitable task; callers that need to abandon
/// long-running generation pass a [`CancellationToken`].
pub struct GalleryService {
    config: GalleryConfig,
    source: Arc<dyn MediaSource>,
    writer: Arc<dyn ResourceWriter>,
    cache: ThumbnailCache,
}

impl GalleryService {
    pub fn new(
        config: GalleryConfig,
        source: Arc<dyn MediaSource>,
        writer: Arc<dyn ResourceWriter>,
        renderer: Arc<dyn ThumbnailRenderer>,
    ) -> Self {
        let cache = ThumbnailCache::new(
            config.cache_dir.clone(),
            config.image_thumbnail_size,
            config.video_thumbnail_size,
            renderer,
        );
        Self {
            config,
            source,
            writer,
            cache,
        }
    }

    /// All albums matching the filter, each sorted by recency. Previews the
    /// platform already tracks are attached; none are generated here.
    pub async fn get_albums(&self, filter: &MediaFilter) -> Result<Vec<Album>, GalleryError> {
        let mut files = self.source.fetch_all(filter)?;
        self.attach_known_thumbnails(&mut files, filter)?;
        let albums = aggregate_albums(files);
        log::debug!("aggregated {} albums", albums.len());
        Ok(albums)
    }

    /// Compact records for bulk listings.
    pub async fn get_media_assets(
        &self,
        filter: &MediaFilter,
    ) -> Result<Vec<MediaAsset>, GalleryError> {
        let files = self.source.fetch_all(filter)?;
        Ok(files.iter().map(MediaAsset::from).collect())
    }

    /// Single file lookup, optionally running the thumbnail pipeline.
    pub async fn get_media_file(
        &self,
        id: &str,
        kind: MediaType,
        load_thumbnail: bool,
        token: &CancellationToken,
    ) -> Result<MediaFile, GalleryError> {
        let mut file = self.source.fetch_one(id, kind)?;
        if load_thumbnail {
            let path = self.thumbnail_for(&file, token).await?;
            file.thumbnail_path = Some(path.display().to_string());
        }
        Ok(file)
    }

    /// Cached thumbnail path for an asset, generated on miss.
    pub async fn get_thumbnail(
        &self,
        id: &str,
        kind: MediaType,
        token: &CancellationToken,
    ) -> Result<PathBuf, GalleryError> {
        let file = self.source.fetch_one(id, kind)?;
        self.thumbnail_for(&file, token).await
    }

    /// Resolved path of a video asset.
    pub async fn get_video_path(&self, id: &str) -> Result<String, GalleryError> {
        let file = self.source.fetch_one(id, MediaType::Video)?;
        file.path
            .ok_or_else(|| GalleryError::NotFound(format!("no resolved path for video {}", id)))
    }

    /// Exports the paired video of a live photo and returns its path.
    pub async fn get_live_photo_path(
        &self,
        id: &str,
        token: &CancellationToken,
    ) -> Result<String, GalleryError> {
        let file = self.source.fetch_one(id, MediaType::Image)?;
        if !file.is_live_photo {
            return Err(GalleryError::NotFound(format!(
                "asset {} is not a live photo",
                id
            )));
        }

        let dest = self.config.resource_dir.join(Uuid::new_v4().to_string());
        let written = self.writer.write_paired_video(id, &dest, token).await?;
        Ok(written.display().to_string())
    }

    async fn thumbnail_for(
        &self,
        file: &MediaFile,
        token: &CancellationToken,
    ) -> Result<PathBuf, GalleryError> {
        let stamp = self.source.modification_stamp(&file.id, file.media_type)?;
        let (path, created) = self.cache.get_or_create(file, stamp, token).await?;

        if created {
            // Registration with the platform registry is an optimization,
            // never a failure.
            if let Err(e) = self
                .source
                .register_thumbnail(&file.id, file.media_type, &path)
            {
                log::debug!("thumbnail registration for {} skipped: {}", file.id, e);
            }
        }

        Ok(path)
    }

    fn attach_known_thumbnails(
        &self,
        files: &mut [MediaFile],
        filter: &MediaFilter,
    ) -> Result<(), GalleryError> {
        for kind in [MediaType::Image, MediaType::Video] {
            let wanted = match kind {
                MediaType::Image => filter.with_images,
                MediaType::Video => filter.with_videos,
            };
            if !wanted {
                continue;
            }

            let known = self.source.known_thumbnails(kind)?;
            if known.is_empty() {
                continue;
            }

            for file in files
                .iter_mut()
                .filter(|f| f.media_type == kind && f.thumbnail_path.is_none())
            {
                if let Some(path) = known.get(&file.id) {
                    file.thumbnail_path = Some(path.clone());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::init_index_schema;
    use crate::source::IndexSource;
    use crate::thumbnail::ThumbnailRenderer;
    use async_trait::async_trait;
    use image::DynamicImage;
    use rusqlite::{params, Connection};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingRenderer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ThumbnailRenderer for CountingRenderer {
        async fn render(
            &self,
            _file: &MediaFile,
            target_size: u32,
        ) -> Result<DynamicImage, GalleryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(DynamicImage::ImageRgb8(image::RgbImage::new(
                target_size,
                target_size,
            )))
        }
    }

    struct Fixture {
        service: GalleryService,
        renderer: Arc<CountingRenderer>,
        _dirs: tempfile::TempDir,
    }

    fn fixture(populate: impl FnOnce(&Connection)) -> Fixture {
        let dirs = tempfile::tempdir().unwrap();
        let conn = Connection::open_in_memory().unwrap();
        init_index_schema(&conn).unwrap();
        populate(&conn);

        let source = Arc::new(IndexSource::new(conn));
        let renderer = Arc::new(CountingRenderer {
            calls: AtomicUsize::new(0),
        });
        let config = GalleryConfig {
            cache_dir: dirs.path().join("thumbs"),
            resource_dir: dirs.path().join("resources"),
            ..GalleryConfig::default()
        };
        let service = GalleryService::new(config, source.clone(), source, renderer.clone());

        Fixture {
            service,
            renderer,
            _dirs: dirs,
        }
    }

    fn insert_image(conn: &Connection, id: i64, date_added: i64, bucket: &str) {
        conn.execute(
            "INSERT INTO images (id, date_added, date_modified, path, bucket_id, bucket_name)
             VALUES (?1, ?2, ?3, ?4, ?5, 'Camera')",
            params![id, date_added, date_added, format!("/dcim/{}.jpg", id), bucket],
        )
        .unwrap();
    }

    fn insert_video(conn: &Connection, id: i64, date_added: i64, bucket: &str) {
        conn.execute(
            "INSERT INTO videos (id, date_added, date_modified, path, bucket_id, bucket_name,
                                 duration_ms)
             VALUES (?1, ?2, ?3, ?4, ?5, 'Camera', 2000)",
            params![id, date_added, date_added, format!("/movies/{}.mp4", id), bucket],
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_albums_grouped_and_sorted() {
        let fx = fixture(|conn| {
            insert_image(conn, 1, 100, "a");
            insert_image(conn, 2, 300, "b");
            insert_image(conn, 3, 200, "a");
            insert_video(conn, 10, 400, "a");
        });

        let albums = fx
            .service
            .get_albums(&MediaFilter::new(true, true))
            .await
            .unwrap();

        assert_eq!(albums.len(), 2);
        let a = albums.iter().find(|album| album.id == "a").unwrap();
        let ids: Vec<&str> = a.files.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["10", "3", "1"]);
        let b = albums.iter().find(|album| album.id == "b").unwrap();
        assert_eq!(b.files.len(), 1);
    }

    #[tokio::test]
    async fn test_media_assets_are_compact_records() {
        let fx = fixture(|conn| {
            insert_video(conn, 10, 400, "a");
        });

        let assets = fx
            .service
            .get_media_assets(&MediaFilter::new(false, true))
            .await
            .unwrap();

        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].id, "10");
        assert_eq!(assets[0].media_type, MediaType::Video);
        assert_eq!(assets[0].duration, Some(2.0));
    }

    #[tokio::test]
    async fn test_thumbnail_generated_once_then_cached_and_registered() {
        let fx = fixture(|conn| {
            insert_image(conn, 1, 100, "a");
        });
        let token = CancellationToken::new();

        let first = fx
            .service
            .get_thumbnail("1", MediaType::Image, &token)
            .await
            .unwrap();
        let second = fx
            .service
            .get_thumbnail("1", MediaType::Image, &token)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert!(first.exists());
        assert_eq!(fx.renderer.calls.load(Ordering::SeqCst), 1);

        // The fresh entry was registered, so album queries now attach it.
        let albums = fx
            .service
            .get_albums(&MediaFilter::new(true, false))
            .await
            .unwrap();
        assert_eq!(
            albums[0].files[0].thumbnail_path.as_deref(),
            Some(first.display().to_string().as_str())
        );
    }

    #[tokio::test]
    async fn test_get_media_file_can_load_thumbnail() {
        let fx = fixture(|conn| {
            insert_image(conn, 1, 100, "a");
        });
        let token = CancellationToken::new();

        let bare = fx
            .service
            .get_media_file("1", MediaType::Image, false, &token)
            .await
            .unwrap();
        assert!(bare.thumbnail_path.is_none());

        let with_thumb = fx
            .service
            .get_media_file("1", MediaType::Image, true, &token)
            .await
            .unwrap();
        assert!(with_thumb.thumbnail_path.is_some());
    }

    #[tokio::test]
    async fn test_missing_asset_is_not_found() {
        let fx = fixture(|_| {});
        let token = CancellationToken::new();

        let result = fx.service.get_thumbnail("9", MediaType::Image, &token).await;
        assert!(matches!(result, Err(GalleryError::NotFound(_))));

        let result = fx.service.get_video_path("9").await;
        assert!(matches!(result, Err(GalleryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_video_path_resolves_from_index() {
        let fx = fixture(|conn| {
            insert_video(conn, 10, 400, "a");
        });

        let path = fx.service.get_video_path("10").await.unwrap();
        assert_eq!(path, "/movies/10.mp4");
    }

    #[tokio::test]
    async fn test_live_photo_export_writes_paired_video() {
        let dirs = tempfile::tempdir().unwrap();
        let paired = dirs.path().join("live.mov");
        std::fs::write(&paired, b"mov").unwrap();
        let paired_str = paired.display().to_string();

        let fx = fixture(move |conn| {
            conn.execute(
                "INSERT INTO images (id, date_added, date_modified, path, bucket_id,
                                     is_live_photo, paired_video_path)
                 VALUES (1, 100, 100, '/dcim/1.heic', 'a', 1, ?1)",
                params![paired_str],
            )
            .unwrap();
            insert_image(conn, 2, 50, "a");
        });
        let token = CancellationToken::new();

        let exported = fx.service.get_live_photo_path("1", &token).await.unwrap();
        assert!(std::path::Path::new(&exported).exists());

        // A plain still is not exportable.
        let result = fx.service.get_live_photo_path("2", &token).await;
        assert!(matches!(result, Err(GalleryError::NotFound(_))));
    }
}
