//! # Media Gallery
//!
//! Cross-platform access to device photo and video libraries: albums,
//! media file metadata and on-demand thumbnails.
//!
//! This crate provides the platform-independent pipeline:
//! - Media source adapters querying the device media index
//! - Album aggregation with first-encounter ordering and recency sorting
//! - A content-addressed thumbnail cache keyed by asset id and
//!   modification stamp
//! - Normalization of raw platform records into uniform media files
//!
//! ## Platform Separation
//!
//! Platform-specific metadata quirks live behind the [`Normalizer`]
//! interface, and the platform rendering/export services behind
//! [`ThumbnailRenderer`] and [`ResourceWriter`]. The caller-facing method
//! surface (argument parsing, wire error codes) belongs to the bridge
//! crate, not here.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use media_gallery::{GalleryConfig, GalleryService, IndexSource};
//!
//! let conn = rusqlite::Connection::open("media-index.db")?;
//! let source = Arc::new(IndexSource::new(conn));
//! let service = GalleryService::new(
//!     GalleryConfig::default(),
//!     source.clone(),
//!     source,
//!     Arc::new(media_gallery::FileRenderer),
//! );
//! ```

pub mod album;
pub mod error;
pub mod models;
pub mod normalize;
pub mod schema;
pub mod service;
pub mod source;
pub mod thumbnail;

pub use album::aggregate_albums;
pub use error::GalleryError;
pub use models::{Album, GalleryConfig, MediaAsset, MediaFile, MediaType, Orientation};
pub use normalize::{MediaStoreNormalizer, Normalizer, PhotoKitNormalizer, RawRecord};
pub use schema::init_index_schema;
pub use service::GalleryService;
pub use source::{DateRange, IndexSource, MediaFilter, MediaSource, ResourceWriter};
pub use thumbnail::{FileRenderer, ThumbnailCache, ThumbnailRenderer};

pub use tokio_util::sync::CancellationToken;
