// Caller-facing method surface.
//
// Each operation takes a flat JSON argument record and returns a
// JSON-encoded success payload, or a (code, message) failure pair. Required
// arguments are validated before any platform interaction.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use media_gallery::{
    CancellationToken, DateRange, GalleryService, MediaFilter, MediaType,
};

use crate::error::{BridgeError, ErrorCode};

/// Dispatches one named operation against the gallery service.
///
/// The token lets the host abandon a dispatched call; cancellation surfaces
/// as an `ERROR` failure like any other platform-layer abort.
pub async fn handle(
    service: &GalleryService,
    method: &str,
    arguments: &Value,
    token: &CancellationToken,
) -> Result<String, BridgeError> {
    log::debug!("handling {}", method);

    match method {
        "getAlbums" => {
            let with_images = bool_arg(arguments, "withImages")?;
            let with_videos = bool_arg(arguments, "withVideos")?;

            let albums = service
                .get_albums(&MediaFilter::new(with_images, with_videos))
                .await?;
            encode(&albums)
        }
        "v2/getMediaAssets" => {
            let types = type_list_arg(arguments, "types")?;
            let start = date_arg(arguments, "startDate")?;
            let end = date_arg(arguments, "endDate")?;

            let filter = MediaFilter::new(
                types.contains(&MediaType::Image),
                types.contains(&MediaType::Video),
            )
            .with_range(DateRange { start, end });
            let assets = service.get_media_assets(&filter).await?;
            encode(&assets)
        }
        "getMediaFile" => {
            let file_id = str_arg(arguments, "fileId")?;
            let kind = type_arg(arguments, "type")?;
            let load_thumbnail = bool_arg(arguments, "loadThumbnail")?;

            let file = service
                .get_media_file(file_id, kind, load_thumbnail, token)
                .await?;
            encode(&file)
        }
        "getThumbnail" => {
            let file_id = str_arg(arguments, "fileId")?;
            let kind = type_arg(arguments, "type")?;

            let path = service.get_thumbnail(file_id, kind, token).await?;
            Ok(path.display().to_string())
        }
        "getLivePhotoPath" => {
            let file_id = str_arg(arguments, "fileId")?;
            Ok(service.get_live_photo_path(file_id, token).await?)
        }
        "getVideoPath" => {
            let file_id = str_arg(arguments, "fileId")?;
            Ok(service.get_video_path(file_id).await?)
        }
        _ => Err(BridgeError::not_implemented(method)),
    }
}

fn encode<T: Serialize>(value: &T) -> Result<String, BridgeError> {
    serde_json::to_string(value).map_err(|e| BridgeError {
        code: ErrorCode::Error,
        message: e.to_string(),
    })
}

fn bool_arg(arguments: &Value, name: &str) -> Result<bool, BridgeError> {
    arguments
        .get(name)
        .and_then(Value::as_bool)
        .ok_or_else(|| BridgeError::invalid_arguments(name))
}

fn str_arg<'a>(arguments: &'a Value, name: &str) -> Result<&'a str, BridgeError> {
    arguments
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| BridgeError::invalid_arguments(name))
}

fn date_arg(arguments: &Value, name: &str) -> Result<DateTime<Utc>, BridgeError> {
    let seconds = arguments
        .get(name)
        .and_then(Value::as_f64)
        .ok_or_else(|| BridgeError::invalid_arguments(name))?;
    DateTime::from_timestamp(seconds as i64, 0)
        .ok_or_else(|| BridgeError::invalid_arguments(name))
}

fn type_arg(arguments: &Value, name: &str) -> Result<MediaType, BridgeError> {
    let ordinal = arguments
        .get(name)
        .and_then(Value::as_u64)
        .ok_or_else(|| BridgeError::invalid_arguments(name))?;
    u8::try_from(ordinal)
        .ok()
        .and_then(MediaType::from_ordinal)
        .ok_or_else(|| BridgeError::invalid_arguments(name))
}

/// The type list must be present and well-formed; unknown ordinals within
/// it are skipped rather than failing the whole call.
fn type_list_arg(arguments: &Value, name: &str) -> Result<Vec<MediaType>, BridgeError> {
    let values = arguments
        .get(name)
        .and_then(Value::as_array)
        .ok_or_else(|| BridgeError::invalid_arguments(name))?;

    let mut types = Vec::new();
    for value in values {
        let ordinal = value
            .as_u64()
            .ok_or_else(|| BridgeError::invalid_arguments(name))?;
        if let Some(kind) = u8::try_from(ordinal).ok().and_then(MediaType::from_ordinal) {
            types.push(kind);
        }
    }
    Ok(types)
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_gallery::{
        init_index_schema, FileRenderer, GalleryConfig, IndexSource,
    };
    use rusqlite::{params, Connection};
    use serde_json::json;
    use std::sync::Arc;

    fn service(dir: &std::path::Path) -> GalleryService {
        let conn = Connection::open_in_memory().unwrap();
        init_index_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO images (id, date_added, date_modified, path, bucket_id)
             VALUES (1, 100, 100, '/dcim/1.jpg', 'a')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO videos (id, date_added, date_modified, path, bucket_id, duration_ms)
             VALUES (2, 200, 200, '/movies/2.mp4', 'a', 1500)",
            params![],
        )
        .unwrap();

        let source = Arc::new(IndexSource::new(conn));
        let config = GalleryConfig {
            cache_dir: dir.join("thumbs"),
            resource_dir: dir.join("resources"),
            ..GalleryConfig::default()
        };
        GalleryService::new(config, source.clone(), source, Arc::new(FileRenderer))
    }

    #[tokio::test]
    async fn test_get_albums_returns_json_payload() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());
        let token = CancellationToken::new();

        let payload = handle(
            &service,
            "getAlbums",
            &json!({"withImages": true, "withVideos": true}),
            &token,
        )
        .await
        .unwrap();

        let albums: Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(albums.as_array().unwrap().len(), 1);
        assert_eq!(albums[0]["files"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_argument_is_invalid_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());
        let token = CancellationToken::new();

        let err = handle(&service, "getAlbums", &json!({"withImages": true}), &token)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidArguments);
        assert_eq!(err.message, "withVideos must not be null");

        // Wrong type counts as missing.
        let err = handle(
            &service,
            "getThumbnail",
            &json!({"fileId": 1, "type": 0}),
            &token,
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidArguments);
    }

    #[tokio::test]
    async fn test_unknown_method_is_not_implemented() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());

        let err = handle(
            &service,
            "getSomethingElse",
            &json!({}),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotImplemented);
    }

    #[tokio::test]
    async fn test_lookup_miss_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());

        let err = handle(
            &service,
            "getMediaFile",
            &json!({"fileId": "99", "type": 0, "loadThumbnail": false}),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_get_media_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());

        let payload = handle(
            &service,
            "getMediaFile",
            &json!({"fileId": "2", "type": 1, "loadThumbnail": false}),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        let file: Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(file["id"], "2");
        assert_eq!(file["type"], 1);
        assert_eq!(file["duration"], 1.5);
    }

    #[tokio::test]
    async fn test_media_assets_respect_type_and_date_filters() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());
        let token = CancellationToken::new();

        let payload = handle(
            &service,
            "v2/getMediaAssets",
            &json!({"types": [1], "startDate": 0.0, "endDate": 1000.0}),
            &token,
        )
        .await
        .unwrap();
        let assets: Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(assets.as_array().unwrap().len(), 1);
        assert_eq!(assets[0]["id"], "2");

        let payload = handle(
            &service,
            "v2/getMediaAssets",
            &json!({"types": [0, 1], "startDate": 150.0, "endDate": 180.0}),
            &token,
        )
        .await
        .unwrap();
        let assets: Value = serde_json::from_str(&payload).unwrap();
        assert!(assets.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_video_path_resolves() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());

        let path = handle(
            &service,
            "getVideoPath",
            &json!({"fileId": "2"}),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(path, "/movies/2.mp4");
    }
}
