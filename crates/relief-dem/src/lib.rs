//! # relief-dem
//!
//! USGS 1 arc-second elevation tiles: naming, rasters and download.
//!
//! ## Overview
//!
//! USGS 3DEP staged products are organised by 1x1 degree cells. Each cell is
//! identified by its north-west corner, e.g. `n29w082` covers latitude 28°N
//! to 29°N and longitude 82°W to 81°W. This crate provides:
//!
//! - [`Region`]: a validated identifier and every name derived from it
//!   (download URL, local file name, raster store object names)
//! - [`Raster`]: a single-band `f32` grid read from and written to GeoTIFF
//! - [`TileFetcher`]: downloads tiles through a [`TileSource`] with bounded
//!   retry
//!
//! ## Examples
//!
//! ```no_run
//! use relief_dem::{FetchOptions, Raster, Region, ReqwestTileSource, TileFetcher};
//! use std::path::Path;
//!
//! let region = Region::parse("n29w082")?;
//! let fetcher = TileFetcher::new(ReqwestTileSource::new()?, FetchOptions::default());
//! let outcome = fetcher.fetch_region(&region, Path::new("downloads"))?;
//!
//! let raster = Raster::from_file(outcome.path())?;
//! println!("{:?} pixels, range {:?}", raster.dimensions(), raster.value_range());
//! # Ok::<(), relief_dem::DemError>(())
//! ```

mod error;
pub mod fetch;
mod raster;
mod region;

pub use error::DemError;
pub use fetch::{
    DownloadStats, FetchOptions, FetchOutcome, ReqwestTileSource, TileFetcher, TileSource,
};
pub use raster::{GeoGrid, Raster, RasterHeader, TileBounds, NODATA_VALUE};
pub use region::{
    RasterKind, Region, DEFAULT_ARCHIVE_BASE_URL, ELEVATION_PREFIX, HILLSHADE_PREFIX,
    RASTER_EXTENSION,
};

/// Result type for DEM operations.
pub type Result<T> = std::result::Result<T, DemError>;
