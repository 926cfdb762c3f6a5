use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use tokio_util::sync::CancellationToken;

use crate::error::GalleryError;
use crate::models::{MediaFile, MediaType};

const JPEG_QUALITY: u8 = 100;

/// Renders a reduced-size preview of an asset.
///
/// Implementations wrap the platform image service; [`FileRenderer`] is a
/// plain file-decoding fallback for still images.
#[async_trait]
pub trait ThumbnailRenderer: Send + Sync {
    async fn render(
        &self,
        file: &MediaFile,
        target_size: u32,
    ) -> Result<DynamicImage, GalleryError>;
}

/// Content-addressed thumbnail cache.
///
/// Entries are keyed by asset id and modification stamp. Editing an asset
/// changes its stamp and therefore its cache path, so a stale preview is
/// never served for a changed asset; superseded entries are orphaned rather
/// than evicted.
pub struct ThumbnailCache {
    dir: PathBuf,
    image_size: u32,
    video_size: u32,
    renderer: Arc<dyn ThumbnailRenderer>,
    // One lock per in-flight cache key, so concurrent requests for the same
    // asset await a single generation.
    inflight: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl ThumbnailCache {
    pub fn new(
        dir: PathBuf,
        image_size: u32,
        video_size: u32,
        renderer: Arc<dyn ThumbnailRenderer>,
    ) -> Self {
        Self {
            dir,
            image_size,
            video_size,
            renderer,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Deterministic cache path for one revision of an asset. The platform
    /// id is base64-encoded so arbitrary identifiers stay filesystem-safe.
    pub fn entry_path(&self, id: &str, modified_at: i64) -> PathBuf {
        let name = URL_SAFE_NO_PAD.encode(id.as_bytes());
        self.dir.join(format!("{}-{}.jpg", name, modified_at))
    }

    /// Existence check only; a miss is not an error.
    pub fn lookup(&self, id: &str, modified_at: i64) -> Option<PathBuf> {
        let path = self.entry_path(id, modified_at);
        path.exists().then_some(path)
    }

    pub fn target_size(&self, kind: MediaType) -> u32 {
        match kind {
            MediaType::Image => self.image_size,
            MediaType::Video => self.video_size,
        }
    }

    /// Returns the cached thumbnail for the asset, generating it on miss.
    ///
    /// The boolean is true when a new entry was written, so the caller can
    /// register it with the platform's own thumbnail registry.
    pub async fn get_or_create(
        &self,
        file: &MediaFile,
        modified_at: i64,
        token: &CancellationToken,
    ) -> Result<(PathBuf, bool), GalleryError> {
        let path = self.entry_path(&file.id, modified_at);
        if path.exists() {
            return Ok((path, false));
        }

        let key_lock = self.key_lock(&path);
        let _guard = key_lock.lock().await;
        if path.exists() {
            // Another caller finished this key while we waited for the lock.
            return Ok((path, false));
        }

        let target_size = self.target_size(file.media_type);
        let image = tokio::select! {
            _ = token.cancelled() => return Err(GalleryError::Cancelled),
            rendered = self.renderer.render(file, target_size) => rendered?,
        };

        write_jpeg(path.clone(), image).await?;
        log::debug!("thumbnail for {} written to {}", file.id, path.display());
        Ok((path, true))
    }

    fn key_lock(&self, path: &Path) -> Arc<tokio::sync::Mutex<()>> {
        let key = path.to_string_lossy().into_owned();
        let mut inflight = self.inflight.lock().unwrap_or_else(|e| e.into_inner());
        inflight.entry(key).or_default().clone()
    }
}

/// Encodes the bitmap into a temp sibling and renames it into place, so a
/// failed generation never leaves a partial file at the cache path.
async fn write_jpeg(path: PathBuf, image: DynamicImage) -> Result<(), GalleryError> {
    tokio::task::spawn_blocking(move || {
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(image.into_rgb8())
            .write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY))
            .map_err(|e| GalleryError::GenerationFailed(format!("jpeg encoding failed: {}", e)))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp = path.with_extension("jpg.tmp");
        if let Err(e) = fs::write(&tmp, buffer.into_inner()).and_then(|_| fs::rename(&tmp, &path)) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        Ok(())
    })
    .await
    .map_err(|e| GalleryError::GenerationFailed(format!("encode task failed: {}", e)))?
}

/// Renderer that decodes the asset's backing file directly.
///
/// Covers still images with a resolved path; video frames need the
/// platform's own rendering service.
pub struct FileRenderer;

#[async_trait]
impl ThumbnailRenderer for FileRenderer {
    async fn render(
        &self,
        file: &MediaFile,
        target_size: u32,
    ) -> Result<DynamicImage, GalleryError> {
        if file.media_type == MediaType::Video {
            return Err(GalleryError::GenerationFailed(
                "video previews require a platform renderer".to_string(),
            ));
        }

        let path = match file.path.clone() {
            Some(path) => path,
            None => {
                return Err(GalleryError::GenerationFailed(format!(
                    "no resolved path for asset {}",
                    file.id
                )))
            }
        };

        tokio::task::spawn_blocking(move || {
            let img = image::open(&path).map_err(|e| {
                GalleryError::GenerationFailed(format!("failed to decode {}: {}", path, e))
            })?;
            Ok(img.resize(target_size, target_size, FilterType::Lanczos3))
        })
        .await
        .map_err(|e| GalleryError::GenerationFailed(format!("decode task failed: {}", e)))?
    }
}
