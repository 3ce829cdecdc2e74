//! Hillshade (shaded relief) from an elevation raster.
//!
//! Horn's 3x3 finite difference gives the surface gradient; the shade is
//! the cosine of the angle between the surface normal and the sun,
//! scaled to 0..=255. Cell sizes in degrees are converted to metres at the
//! raster's centre latitude before the gradient is taken.

use crate::{Result, ToolboxError};
use relief_dem::Raster;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Illumination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HillshadeParams {
    /// Sun azimuth in degrees (0 = north, clockwise).
    pub azimuth: f64,
    /// Sun altitude in degrees above the horizon.
    pub altitude: f64,
    /// Vertical exaggeration.
    pub z_factor: f64,
}

impl Default for HillshadeParams {
    fn default() -> Self {
        Self {
            azimuth: 315.0,
            altitude: 45.0,
            z_factor: 1.0,
        }
    }
}

impl HillshadeParams {
    /// Check that the angles and z-factor are usable.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=360.0).contains(&self.azimuth) {
            return Err(ToolboxError::InvalidParameter(format!(
                "azimuth {} outside 0..=360",
                self.azimuth
            )));
        }
        if !(0.0..=90.0).contains(&self.altitude) {
            return Err(ToolboxError::InvalidParameter(format!(
                "altitude {} outside 0..=90",
                self.altitude
            )));
        }
        if !(self.z_factor > 0.0) {
            return Err(ToolboxError::InvalidParameter(format!(
                "z-factor {} must be positive",
                self.z_factor
            )));
        }
        Ok(())
    }
}

/// Compute a hillshade raster on the same grid as `dem`.
///
/// No-data cells stay no-data. Missing neighbours (raster edge or no-data)
/// take the centre cell's value.
pub fn hillshade(dem: &Raster, params: &HillshadeParams) -> Result<Raster> {
    params.validate()?;

    let (width, height) = dem.dimensions();
    let (cell_x, cell_y) = dem.resolution_meters();
    if !(cell_x > 0.0 && cell_y > 0.0) {
        return Err(ToolboxError::InvalidParameter(format!(
            "cell size {}x{} m is not positive",
            cell_x, cell_y
        )));
    }

    let azimuth_rad = {
        let math = 360.0 - params.azimuth + 90.0;
        (if math >= 360.0 { math - 360.0 } else { math }).to_radians()
    };
    let zenith_rad = (90.0 - params.altitude).to_radians();
    let (sin_zenith, cos_zenith) = zenith_rad.sin_cos();

    let mut output = Raster::empty(width, height, dem.grid());

    for row in 0..height {
        for col in 0..width {
            let Some(e) = dem.get(col, row) else {
                continue;
            };

            let at = |dc: i64, dr: i64| -> f64 {
                let c = col as i64 + dc;
                let r = row as i64 + dr;
                if c < 0 || r < 0 {
                    return e as f64;
                }
                dem.get(c as u32, r as u32).unwrap_or(e) as f64
            };

            let (a, b, c) = (at(-1, -1), at(0, -1), at(1, -1));
            let (d, f) = (at(-1, 0), at(1, 0));
            let (g, h, i) = (at(-1, 1), at(0, 1), at(1, 1));

            // Row 0 is north, so dz_dy is positive when the surface rises southward.
            let dz_dx = ((c + 2.0 * f + i) - (a + 2.0 * d + g)) * params.z_factor / (8.0 * cell_x);
            let dz_dy = ((g + 2.0 * h + i) - (a + 2.0 * b + c)) * params.z_factor / (8.0 * cell_y);

            let slope_rad = (dz_dx * dz_dx + dz_dy * dz_dy).sqrt().atan();
            let aspect_rad = if dz_dx.abs() < 1e-12 && dz_dy.abs() < 1e-12 {
                0.0
            } else {
                let aspect = dz_dy.atan2(-dz_dx);
                if aspect < 0.0 {
                    2.0 * PI + aspect
                } else {
                    aspect
                }
            };

            let shade = cos_zenith * slope_rad.cos()
                + sin_zenith * slope_rad.sin() * (azimuth_rad - aspect_rad).cos();

            output.set(col, row, (shade.clamp(0.0, 1.0) * 255.0).round() as f32);
        }
    }

    Ok(output)
}
