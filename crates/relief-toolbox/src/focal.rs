//! Focal (moving window) statistics.

use crate::{Result, ToolboxError};
use relief_dem::Raster;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Statistic computed over each window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocalStatistic {
    /// Arithmetic mean
    #[default]
    Mean,
    /// Minimum value
    #[serde(alias = "min")]
    Minimum,
    /// Maximum value
    #[serde(alias = "max")]
    Maximum,
    /// Median value
    Median,
}

impl fmt::Display for FocalStatistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FocalStatistic::Mean => "mean",
            FocalStatistic::Minimum => "minimum",
            FocalStatistic::Maximum => "maximum",
            FocalStatistic::Median => "median",
        })
    }
}

/// Parameters for focal statistics over a square window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocalParams {
    /// Statistic to compute.
    pub statistic: FocalStatistic,
    /// Window radius (window side = 2 * radius + 1).
    pub radius: u32,
}

impl Default for FocalParams {
    fn default() -> Self {
        Self {
            statistic: FocalStatistic::Mean,
            radius: 1,
        }
    }
}

impl FocalParams {
    /// Side length of the window in cells.
    pub fn window_size(&self) -> u32 {
        2 * self.radius + 1
    }
}

/// Compute a focal statistic for every valid cell.
///
/// No-data cells stay no-data; no-data neighbours and cells beyond the
/// raster edge are left out of the window.
pub fn focal_statistics(raster: &Raster, params: &FocalParams) -> Result<Raster> {
    if params.radius == 0 {
        return Err(ToolboxError::InvalidParameter(
            "focal radius must be > 0".into(),
        ));
    }

    let (width, height) = raster.dimensions();
    let r = params.radius as i64;
    let mut output = Raster::empty(width, height, raster.grid());
    let mut values: Vec<f64> = Vec::with_capacity(params.window_size().pow(2) as usize);

    for row in 0..height {
        for col in 0..width {
            if raster.get(col, row).is_none() {
                continue;
            }

            values.clear();
            for dr in -r..=r {
                for dc in -r..=r {
                    let nr = row as i64 + dr;
                    let nc = col as i64 + dc;
                    if nr < 0 || nc < 0 {
                        continue;
                    }
                    if let Some(v) = raster.get(nc as u32, nr as u32) {
                        values.push(v as f64);
                    }
                }
            }

            output.set(col, row, compute_statistic(&mut values, params.statistic) as f32);
        }
    }

    Ok(output)
}

fn compute_statistic(values: &mut [f64], stat: FocalStatistic) -> f64 {
    match stat {
        FocalStatistic::Mean => values.iter().sum::<f64>() / values.len() as f64,
        FocalStatistic::Minimum => values.iter().cloned().fold(f64::INFINITY, f64::min),
        FocalStatistic::Maximum => values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        FocalStatistic::Median => {
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let mid = values.len() / 2;
            if values.len() % 2 == 0 {
                (values[mid - 1] + values[mid]) / 2.0
            } else {
                values[mid]
            }
        }
    }
}
