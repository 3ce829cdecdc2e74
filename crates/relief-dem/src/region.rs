//! Region identifiers and the naming conventions derived from them.
//!
//! A region names one 1x1 degree USGS 3DEP tile by its north-west corner,
//! e.g. `n29w082` covers latitude 28°N to 29°N and longitude 82°W to 81°W.
//! Every artifact the pipeline produces for a region is named from the
//! identifier alone, so the mapping below must stay a pure function of it.

use crate::raster::TileBounds;
use crate::{DemError, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Base URL of the USGS 1 arc-second staged products.
pub const DEFAULT_ARCHIVE_BASE_URL: &str =
    "http://prd-tnm.s3.amazonaws.com/StagedProducts/Elevation/1/TIFF";

/// Store object name prefix for ingested elevation rasters.
pub const ELEVATION_PREFIX: &str = "USGS_1_";

/// Store object name prefix for derived hillshade rasters.
pub const HILLSHADE_PREFIX: &str = "HS_";

/// File extension used for every raster written to disk.
pub const RASTER_EXTENSION: &str = "tif";

/// The two raster kinds produced per region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RasterKind {
    /// Source elevation data.
    Elevation,
    /// Shaded relief derived from the elevation data.
    Hillshade,
}

impl RasterKind {
    /// Object name prefix for this kind.
    pub const fn prefix(&self) -> &'static str {
        match self {
            RasterKind::Elevation => ELEVATION_PREFIX,
            RasterKind::Hillshade => HILLSHADE_PREFIX,
        }
    }

    /// Lowercase name for logs.
    pub const fn as_str(&self) -> &'static str {
        match self {
            RasterKind::Elevation => "elevation",
            RasterKind::Hillshade => "hillshade",
        }
    }
}

impl fmt::Display for RasterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated tile identifier such as `n29w082`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Region {
    id: String,
    /// Latitude of the north edge (negative for south).
    north: i32,
    /// Longitude of the west edge (negative for west).
    west: i32,
}

impl Region {
    /// Parse a region identifier. Input is case-insensitive; the stored form
    /// is lowercase.
    pub fn parse(s: &str) -> Result<Self> {
        let id = s.trim().to_ascii_lowercase();
        let bytes = id.as_bytes();

        if bytes.len() != 7 || !id.is_ascii() {
            return Err(DemError::InvalidRegion(s.to_string()));
        }

        let lat_hemi = bytes[0];
        let lon_hemi = bytes[3];
        if !matches!(lat_hemi, b'n' | b's') || !matches!(lon_hemi, b'e' | b'w') {
            return Err(DemError::InvalidRegion(s.to_string()));
        }

        let lat_digits = &id[1..3];
        let lon_digits = &id[4..7];
        if !lat_digits.bytes().all(|b| b.is_ascii_digit())
            || !lon_digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(DemError::InvalidRegion(s.to_string()));
        }

        let lat: i32 = lat_digits
            .parse()
            .map_err(|_| DemError::InvalidRegion(s.to_string()))?;
        let lon: i32 = lon_digits
            .parse()
            .map_err(|_| DemError::InvalidRegion(s.to_string()))?;

        if lat > 90 || lon > 180 {
            return Err(DemError::InvalidRegion(s.to_string()));
        }

        Ok(Self {
            north: if lat_hemi == b'n' { lat } else { -lat },
            west: if lon_hemi == b'w' { -lon } else { lon },
            id,
        })
    }

    /// Find the first region identifier embedded in a file name, e.g.
    /// `USGS_1_n29w082.tif` or `USGS_13_n48w123_20240327.tif`.
    pub fn find_in(filename: &str) -> Option<Self> {
        let lower = filename.to_ascii_lowercase();
        let bytes = lower.as_bytes();
        if bytes.len() < 7 {
            return None;
        }
        (0..=bytes.len() - 7).find_map(|start| {
            // Require a non-alphanumeric boundary so "...xn29w0821" is not matched.
            let before_ok = start == 0 || !bytes[start - 1].is_ascii_alphanumeric();
            let after_ok = start + 7 == bytes.len() || !bytes[start + 7].is_ascii_digit();
            if before_ok && after_ok {
                lower.get(start..start + 7).and_then(|s| Region::parse(s).ok())
            } else {
                None
            }
        })
    }

    /// The identifier string (lowercase).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Download URL for this region under an archive base URL.
    pub fn download_url(&self, archive_base: &str) -> String {
        format!(
            "{}/{}/{}",
            archive_base.trim_end_matches('/'),
            self.id,
            self.file_name()
        )
    }

    /// Local file name of the downloaded elevation tile.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.object_name(RasterKind::Elevation), RASTER_EXTENSION)
    }

    /// Local path of the downloaded elevation tile under a download root.
    pub fn local_path(&self, download_root: &Path) -> PathBuf {
        download_root.join(self.file_name())
    }

    /// Raster store object name for the given kind.
    pub fn object_name(&self, kind: RasterKind) -> String {
        format!("{}{}", kind.prefix(), self.id)
    }

    /// Geographic bounds covered by this tile.
    pub fn bounds(&self) -> TileBounds {
        let max_lat = self.north as f64;
        let min_lon = self.west as f64;
        TileBounds {
            min_lat: max_lat - 1.0,
            max_lat,
            min_lon,
            max_lon: min_lon + 1.0,
        }
    }
}

impl FromStr for Region {
    type Err = DemError;

    fn from_str(s: &str) -> Result<Self> {
        Region::parse(s)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl AsRef<str> for Region {
    fn as_ref(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let region = Region::parse("n29w082").unwrap();
        assert_eq!(region.id(), "n29w082");
        assert_eq!(region.to_string(), "n29w082");
    }

    #[test]
    fn test_parse_normalizes_case() {
        let region: Region = " N29W082 ".parse().unwrap();
        assert_eq!(region.id(), "n29w082");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "n29w82", "x29w082", "n29x082", "n2aw082", "n29w0821", "n95w082", "n29w190"] {
            assert!(Region::parse(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_naming_is_deterministic() {
        let region = Region::parse("n29w082").unwrap();
        assert_eq!(region.file_name(), "USGS_1_n29w082.tif");
        assert_eq!(region.object_name(RasterKind::Elevation), "USGS_1_n29w082");
        assert_eq!(region.object_name(RasterKind::Hillshade), "HS_n29w082");
        assert_eq!(
            region.local_path(Path::new("/data")),
            PathBuf::from("/data/USGS_1_n29w082.tif")
        );
    }

    #[test]
    fn test_download_url() {
        let region = Region::parse("n29w082").unwrap();
        let expected = "http://prd-tnm.s3.amazonaws.com/StagedProducts/Elevation/1/TIFF/n29w082/USGS_1_n29w082.tif";
        assert_eq!(region.download_url(DEFAULT_ARCHIVE_BASE_URL), expected);
        // Trailing slash on the base is tolerated
        let base = format!("{}/", DEFAULT_ARCHIVE_BASE_URL);
        assert_eq!(region.download_url(&base), expected);
    }

    #[test]
    fn test_bounds_north_west() {
        let bounds = Region::parse("n29w082").unwrap().bounds();
        assert_eq!(bounds.min_lat, 28.0);
        assert_eq!(bounds.max_lat, 29.0);
        assert_eq!(bounds.min_lon, -82.0);
        assert_eq!(bounds.max_lon, -81.0);
    }

    #[test]
    fn test_bounds_south_east() {
        let bounds = Region::parse("s34e151").unwrap().bounds();
        assert_eq!(bounds.max_lat, -34.0);
        assert_eq!(bounds.min_lat, -35.0);
        assert_eq!(bounds.min_lon, 151.0);
        assert_eq!(bounds.max_lon, 152.0);
    }

    #[test]
    fn test_find_in_filename() {
        let region = Region::find_in("USGS_13_n48w123_20240327.tif").unwrap();
        assert_eq!(region.id(), "n48w123");

        let region = Region::find_in("HS_n29w082.tif").unwrap();
        assert_eq!(region.id(), "n29w082");

        assert!(Region::find_in("elevation.tif").is_none());
    }
}
