//! Single-band raster grid backed by a GeoTIFF file.

use crate::region::Region;
use crate::{DemError, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::{colortype, TiffEncoder, TiffKind};
use tiff::tags::Tag;

/// GeoTIFF ModelPixelScaleTag.
const MODEL_PIXEL_SCALE_TAG: u16 = 33550;
/// GeoTIFF ModelTiepointTag.
const MODEL_TIEPOINT_TAG: u16 = 33922;
/// GeoTIFF GeoKeyDirectoryTag.
const GEO_KEY_DIRECTORY_TAG: u16 = 34735;
/// GDAL_NODATA tag, stored as an ASCII string.
const GDAL_NODATA_TAG: u16 = 42113;

/// GeoKey directory for a geographic (lat/lon, NAD83) raster with
/// pixel-is-area semantics, which is what USGS 3DEP tiles carry.
const GEO_KEYS_NAD83: [u16; 16] = [
    1, 1, 0, 3, // header: version 1.1.0, 3 keys
    1024, 0, 1, 2, // GTModelType = Geographic
    1025, 0, 1, 1, // GTRasterType = PixelIsArea
    2048, 0, 1, 4269, // GeographicType = NAD83
];

/// Metres per degree of latitude.
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Decoder buffer floor; larger images get limits sized to their pixel count.
const MIN_DECODE_LIMIT: usize = 1024 * 1024 * 1024;

/// Widest sample type a tile may carry (f64 / i64 / u64).
const MAX_SAMPLE_BYTES: usize = 8;

/// Largest pixel payload written as classic TIFF. Classic offsets are 32-bit;
/// the headroom covers tags and strip tables.
const CLASSIC_TIFF_MAX_BYTES: u64 = u32::MAX as u64 - 64 * 1024 * 1024;

/// No-data value used by USGS DEMs and by every raster this crate writes.
pub const NODATA_VALUE: f32 = -999_999.0;

/// Geographic bounds of a raster in degrees, edges inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl TileBounds {
    /// Whether `(lat, lon)` lies inside or on an edge.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }

    /// Smallest bounds covering both `self` and `other`.
    pub fn union(&self, other: &TileBounds) -> TileBounds {
        TileBounds {
            min_lat: self.min_lat.min(other.min_lat),
            max_lat: self.max_lat.max(other.max_lat),
            min_lon: self.min_lon.min(other.min_lon),
            max_lon: self.max_lon.max(other.max_lon),
        }
    }
}

/// Placement of a raster on the globe: the north-west corner of pixel (0, 0)
/// and the pixel size in degrees. Rows run north to south.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoGrid {
    /// Longitude of the west edge of column 0.
    pub origin_lon: f64,
    /// Latitude of the north edge of row 0.
    pub origin_lat: f64,
    /// Pixel width in degrees of longitude.
    pub pixel_width: f64,
    /// Pixel height in degrees of latitude (positive).
    pub pixel_height: f64,
}

impl GeoGrid {
    /// Grid that stretches `width` x `height` pixels over `bounds`.
    pub fn from_bounds(bounds: &TileBounds, width: u32, height: u32) -> Self {
        Self {
            origin_lon: bounds.min_lon,
            origin_lat: bounds.max_lat,
            pixel_width: (bounds.max_lon - bounds.min_lon) / width.max(1) as f64,
            pixel_height: (bounds.max_lat - bounds.min_lat) / height.max(1) as f64,
        }
    }

    /// Bounds covered by a `width` x `height` raster on this grid.
    pub fn bounds(&self, width: u32, height: u32) -> TileBounds {
        TileBounds {
            min_lat: self.origin_lat - height as f64 * self.pixel_height,
            max_lat: self.origin_lat,
            min_lon: self.origin_lon,
            max_lon: self.origin_lon + width as f64 * self.pixel_width,
        }
    }

    /// Centre coordinate (lat, lon) of a pixel.
    pub fn pixel_center(&self, col: u32, row: u32) -> (f64, f64) {
        (
            self.origin_lat - (row as f64 + 0.5) * self.pixel_height,
            self.origin_lon + (col as f64 + 0.5) * self.pixel_width,
        )
    }
}

/// Size and placement of a raster, read without decoding pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterHeader {
    pub width: u32,
    pub height: u32,
    pub grid: GeoGrid,
}

impl RasterHeader {
    /// Read the header of a GeoTIFF file.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut decoder = Decoder::new(File::open(path)?)?;
        let (width, height) = decoder.dimensions()?;
        decoder = decoder.with_limits(decoder_limits(width, height));
        let grid = Raster::read_geotransform(&mut decoder, path, width, height)?;
        Ok(Self { width, height, grid })
    }

    pub fn bounds(&self) -> TileBounds {
        self.grid.bounds(self.width, self.height)
    }
}

/// Decoder limits large enough for a `width` x `height` image of any sample type.
fn decoder_limits(width: u32, height: u32) -> Limits {
    let pixels = (width as usize).saturating_mul(height as usize);
    let buffer = pixels.saturating_mul(MAX_SAMPLE_BYTES).max(MIN_DECODE_LIMIT);
    let mut limits = Limits::default();
    limits.decoding_buffer_size = buffer;
    limits.intermediate_buffer_size = buffer;
    limits.ifd_value_size = MIN_DECODE_LIMIT;
    limits
}

/// Whether an `f32` image of this size must be written as BigTIFF.
fn needs_bigtiff(width: u32, height: u32) -> bool {
    width as u64 * height as u64 * std::mem::size_of::<f32>() as u64 > CLASSIC_TIFF_MAX_BYTES
}

/// A single-band `f32` raster.
///
/// USGS 1 arc-second tiles are typically 3612 x 3612 pixels covering
/// 1 degree of latitude and longitude plus a 6 pixel overlap.
#[derive(Debug, Clone)]
pub struct Raster {
    /// Values in row-major order (north to south, west to east).
    data: Vec<f32>,
    /// Width of the raster in pixels.
    width: u32,
    /// Height of the raster in pixels.
    height: u32,
    /// Geographic placement.
    grid: GeoGrid,
    /// No-data value (values equal to this should be treated as missing).
    no_data_value: Option<f32>,
}

impl Raster {
    /// Create a raster with every pixel set to `fill`.
    pub fn filled(width: u32, height: u32, grid: GeoGrid, fill: f32) -> Self {
        Self {
            data: vec![fill; width as usize * height as usize],
            width,
            height,
            grid,
            no_data_value: Some(NODATA_VALUE),
        }
    }

    /// Create a raster with every pixel set to no-data.
    pub fn empty(width: u32, height: u32, grid: GeoGrid) -> Self {
        Self::filled(width, height, grid, NODATA_VALUE)
    }

    /// Create a raster from existing row-major values.
    pub fn from_data(width: u32, height: u32, grid: GeoGrid, data: Vec<f32>) -> Result<Self> {
        if data.len() != width as usize * height as usize {
            return Err(DemError::DataLength {
                width,
                height,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            grid,
            no_data_value: Some(NODATA_VALUE),
        })
    }

    /// Load a raster from a GeoTIFF file.
    ///
    /// Georeferencing comes from the ModelTiepoint/ModelPixelScale tags; when
    /// those are missing the bounds are derived from a region identifier in
    /// the file name (e.g. `USGS_1_n29w082.tif`).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut decoder = Decoder::new(File::open(path)?)?;
        let (width, height) = decoder.dimensions()?;
        decoder = decoder.with_limits(decoder_limits(width, height));

        let grid = Self::read_geotransform(&mut decoder, path, width, height)?;
        let data = Self::decode_data(&mut decoder)?;
        let no_data_value = Self::read_nodata(&mut decoder);

        Ok(Self {
            data,
            width,
            height,
            grid,
            no_data_value,
        })
    }

    /// Read the geotransform from GeoTIFF tags, falling back to the file name.
    fn read_geotransform<R: std::io::Read + std::io::Seek>(
        decoder: &mut Decoder<R>,
        path: &Path,
        width: u32,
        height: u32,
    ) -> Result<GeoGrid> {
        let tiepoint = decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_TIEPOINT_TAG));
        let pixel_scale = decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE_TAG));

        if let (Ok(tiepoint), Ok(scale)) = (tiepoint, pixel_scale) {
            if tiepoint.len() >= 6 && scale.len() >= 2 {
                // Raster point (i, j) maps to model point (x, y).
                let (i, j) = (tiepoint[0], tiepoint[1]);
                let (scale_x, scale_y) = (scale[0], scale[1]);
                if scale_x <= 0.0 || scale_y <= 0.0 {
                    return Err(DemError::InvalidGeoTiff(format!(
                        "{}: non-positive pixel scale ({}, {})",
                        path.display(),
                        scale_x,
                        scale_y
                    )));
                }
                return Ok(GeoGrid {
                    origin_lon: tiepoint[3] - i * scale_x,
                    origin_lat: tiepoint[4] + j * scale_y,
                    pixel_width: scale_x,
                    pixel_height: scale_y,
                });
            }
        }

        let bounds = Self::bounds_from_filename(path)?;
        Ok(GeoGrid::from_bounds(&bounds, width, height))
    }

    /// Parse tile bounds from a file name containing a region identifier.
    fn bounds_from_filename(path: &Path) -> Result<TileBounds> {
        let filename = path
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| DemError::InvalidFilename(path.display().to_string()))?;

        Region::find_in(filename)
            .map(|region| region.bounds())
            .ok_or_else(|| DemError::InvalidFilename(filename.to_string()))
    }

    /// Decode pixel data from the TIFF decoder.
    fn decode_data<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Result<Vec<f32>> {
        let result = decoder.read_image()?;

        match result {
            DecodingResult::F32(data) => Ok(data),
            DecodingResult::F64(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::I16(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::I32(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::U16(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::U32(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::U8(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::I8(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::U64(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
            DecodingResult::I64(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
        }
    }

    /// No-data value from the GDAL tag, falling back to [`NODATA_VALUE`] when absent.
    fn read_nodata<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Option<f32> {
        match decoder.get_tag_ascii_string(Tag::from_u16_exhaustive(GDAL_NODATA_TAG)) {
            Ok(text) => text.trim_matches('\0').trim().parse().ok(),
            Err(_) => Some(NODATA_VALUE),
        }
    }

    /// Write the raster as a single-band 32-bit float GeoTIFF. Rasters too
    /// large for 32-bit offsets are written as BigTIFF.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.save_as(path, needs_bigtiff(self.width, self.height))
    }

    fn save_as<P: AsRef<Path>>(&self, path: P, big: bool) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = BufWriter::new(File::create(path)?);
        if big {
            self.encode(TiffEncoder::new_big(file)?)
        } else {
            self.encode(TiffEncoder::new(file)?)
        }
    }

    fn encode<W, K>(&self, mut encoder: TiffEncoder<W, K>) -> Result<()>
    where
        W: std::io::Write + std::io::Seek,
        K: TiffKind,
    {
        let mut image = encoder.new_image::<colortype::Gray32Float>(self.width, self.height)?;

        let tiepoint = [0.0, 0.0, 0.0, self.grid.origin_lon, self.grid.origin_lat, 0.0];
        let scale = [self.grid.pixel_width, self.grid.pixel_height, 0.0];
        let nodata = self.no_data_value.unwrap_or(NODATA_VALUE).to_string();

        let dir = image.encoder();
        dir.write_tag(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE_TAG), &scale[..])?;
        dir.write_tag(Tag::from_u16_exhaustive(MODEL_TIEPOINT_TAG), &tiepoint[..])?;
        dir.write_tag(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY_TAG), &GEO_KEYS_NAD83[..])?;
        dir.write_tag(Tag::from_u16_exhaustive(GDAL_NODATA_TAG), nodata.as_str())?;

        image.write_data(&self.data)?;
        Ok(())
    }

    /// Whether a value is missing (NaN or equal to the no-data value).
    pub fn is_nodata(&self, value: f32) -> bool {
        if value.is_nan() {
            return true;
        }
        match self.no_data_value {
            Some(nodata) => (value - nodata).abs() < 0.001,
            None => false,
        }
    }

    /// Get the value at a pixel, or `None` if it is no-data or out of range.
    pub fn get(&self, col: u32, row: u32) -> Option<f32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        let value = self.data[self.index(col, row)];
        if self.is_nodata(value) {
            None
        } else {
            Some(value)
        }
    }

    /// Set the value at a pixel. Out-of-range writes are ignored.
    pub fn set(&mut self, col: u32, row: u32, value: f32) {
        if col < self.width && row < self.height {
            let idx = self.index(col, row);
            self.data[idx] = value;
        }
    }

    /// Nearest-pixel value at a geographic coordinate.
    pub fn sample_nearest(&self, lat: f64, lon: f64) -> Option<f32> {
        let col = ((lon - self.grid.origin_lon) / self.grid.pixel_width).floor();
        let row = ((self.grid.origin_lat - lat) / self.grid.pixel_height).floor();
        if col < 0.0 || row < 0.0 {
            return None;
        }
        self.get(col as u32, row as u32)
    }

    fn index(&self, col: u32, row: u32) -> usize {
        row as usize * self.width as usize + col as usize
    }

    /// Raw pixel values in row-major order.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable raw pixel values in row-major order.
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// The no-data value, if any.
    pub fn no_data_value(&self) -> Option<f32> {
        self.no_data_value
    }

    /// Geographic placement of this raster.
    pub fn grid(&self) -> GeoGrid {
        self.grid
    }

    /// Get the geographic bounds of this raster.
    pub fn bounds(&self) -> TileBounds {
        self.grid.bounds(self.width, self.height)
    }

    /// Size and placement without the pixels.
    pub fn header(&self) -> RasterHeader {
        RasterHeader {
            width: self.width,
            height: self.height,
            grid: self.grid,
        }
    }

    /// Get the dimensions of this raster in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Pixel size in degrees, `(lon, lat)`.
    pub fn resolution(&self) -> (f64, f64) {
        (self.grid.pixel_width, self.grid.pixel_height)
    }

    /// Pixel size in metres at the raster's middle latitude, `(x, y)`.
    pub fn resolution_meters(&self) -> (f64, f64) {
        let bounds = self.bounds();
        let mid_lat = 0.5 * (bounds.min_lat + bounds.max_lat);
        let x = self.grid.pixel_width * METERS_PER_DEGREE * mid_lat.to_radians().cos();
        (x, self.grid.pixel_height * METERS_PER_DEGREE)
    }

    /// Minimum and maximum of the valid values, or `None` if every pixel is no-data.
    pub fn value_range(&self) -> Option<(f32, f32)> {
        self.data
            .iter()
            .copied()
            .filter(|v| !self.is_nodata(*v))
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}
