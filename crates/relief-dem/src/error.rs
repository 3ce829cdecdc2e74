//! Errors raised while reading, writing and downloading elevation tiles.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when working with elevation tiles and rasters.
#[derive(Debug, Error)]
pub enum DemError {
    /// I/O error reading or writing a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TIFF decoding or encoding error.
    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// Invalid GeoTIFF - missing or inconsistent georeferencing.
    #[error("Invalid GeoTIFF: {0}")]
    InvalidGeoTiff(String),

    /// Region identifier does not match `[ns]DD[ew]DDD`.
    #[error("Invalid region identifier '{0}' (expected e.g. n29w082)")]
    InvalidRegion(String),

    /// Invalid tile filename - cannot find a region identifier in it.
    #[error("Invalid tile filename: {0}")]
    InvalidFilename(String),

    /// Pixel buffer does not match the raster dimensions.
    #[error("Raster data length {actual} does not match {width}x{height}")]
    DataLength {
        /// Raster width in pixels.
        width: u32,
        /// Raster height in pixels.
        height: u32,
        /// Number of values supplied.
        actual: usize,
    },

    /// HTTP client error.
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Failed to download a tile from the archive.
    #[error("Failed to download {url}: {reason}")]
    TransferFailed {
        /// URL that was requested.
        url: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to move a finished download into place.
    #[error("Failed to store download at {path}: {source}")]
    StoreFailed {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
