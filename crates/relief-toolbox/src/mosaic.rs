//! Mosaic several rasters onto one grid.
//!
//! The output covers the union of every input (and the existing target, if
//! any). Inputs are painted in order with nearest-pixel sampling; where they
//! overlap, the last valid value wins.
//!
//! [`mosaic_canvas`] sizes the output from input headers alone, so callers
//! can then load and [`paint`] one input at a time.

use crate::{Result, ToolboxError};
use relief_dem::{GeoGrid, Raster, RasterHeader, TileBounds};

/// Mosaic in-memory `inputs` onto an optional existing raster.
///
/// The existing raster's content is kept and painted over. Output pixel size
/// follows the existing raster, else the first input.
pub fn mosaic_onto(existing: Option<&Raster>, inputs: &[Raster]) -> Result<Raster> {
    let headers: Vec<RasterHeader> = inputs.iter().map(Raster::header).collect();
    let mut output = mosaic_canvas(existing, &headers)?;
    for source in inputs {
        paint(&mut output, source);
    }
    Ok(output)
}

/// The output grid for `inputs`, with `existing` already painted on it.
pub fn mosaic_canvas(existing: Option<&Raster>, inputs: &[RasterHeader]) -> Result<Raster> {
    let Some(first) = inputs.first() else {
        return Err(ToolboxError::InvalidParameter(
            "mosaic needs at least one input".into(),
        ));
    };

    let reference = existing.map(Raster::header).unwrap_or(*first);
    let (pixel_width, pixel_height) = (reference.grid.pixel_width, reference.grid.pixel_height);
    let bounds = existing
        .map(Raster::bounds)
        .into_iter()
        .chain(inputs.iter().map(RasterHeader::bounds))
        .fold(first.bounds(), |acc, b| acc.union(&b));

    let width = cells(bounds.max_lon - bounds.min_lon, pixel_width)?;
    let height = cells(bounds.max_lat - bounds.min_lat, pixel_height)?;
    let grid = GeoGrid {
        origin_lon: bounds.min_lon,
        origin_lat: bounds.max_lat,
        pixel_width,
        pixel_height,
    };

    let mut output = Raster::empty(width, height, grid);
    if let Some(existing) = existing {
        paint(&mut output, existing);
    }
    Ok(output)
}

fn cells(extent: f64, pixel: f64) -> Result<u32> {
    if !(pixel > 0.0) || !extent.is_finite() {
        return Err(ToolboxError::InvalidParameter(format!(
            "cannot grid extent {} at pixel size {}",
            extent, pixel
        )));
    }
    // Snap near-integer counts so float noise does not add a sliver column.
    let n = (extent / pixel - 1e-6).ceil().max(1.0);
    if n > u32::MAX as f64 {
        return Err(ToolboxError::InvalidParameter(format!(
            "mosaic of {} cells is too large",
            n
        )));
    }
    Ok(n as u32)
}

/// Paint every valid pixel of `source` that falls on `output`.
pub fn paint(output: &mut Raster, source: &Raster) {
    let grid = output.grid();
    let (width, height) = output.dimensions();
    let TileBounds {
        min_lat,
        max_lat,
        min_lon,
        max_lon,
    } = source.bounds();

    let col_start = ((min_lon - grid.origin_lon) / grid.pixel_width).floor().max(0.0) as u32;
    let col_end = (((max_lon - grid.origin_lon) / grid.pixel_width).ceil() as u32).min(width);
    let row_start = ((grid.origin_lat - max_lat) / grid.pixel_height).floor().max(0.0) as u32;
    let row_end = (((grid.origin_lat - min_lat) / grid.pixel_height).ceil() as u32).min(height);

    for row in row_start..row_end {
        for col in col_start..col_end {
            let (lat, lon) = grid.pixel_center(col, row);
            if let Some(v) = source.sample_nearest(lat, lon) {
                output.set(col, row, v);
            }
        }
    }
}
