//! Colour ramps and the built-in ramp catalogue.

use serde::{Deserialize, Serialize};
use std::fmt;

/// RGB colour with 0..=255 channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// A colour stop: position in [0, 1] mapped to a colour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub t: f64,
    pub color: Rgb,
}

impl ColorStop {
    pub const fn new(t: f64, r: u8, g: u8, b: u8) -> Self {
        Self {
            t,
            color: Rgb::new(r, g, b),
        }
    }
}

/// A named multi-stop colour ramp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorRamp {
    pub name: String,
    pub stops: Vec<ColorStop>,
}

impl ColorRamp {
    pub fn new(name: impl Into<String>, stops: &[ColorStop]) -> Self {
        Self {
            name: name.into(),
            stops: stops.to_vec(),
        }
    }

    /// Colour at position `t` (clamped to [0, 1]), linearly interpolated
    /// between the surrounding stops.
    pub fn color_at(&self, t: f64) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let (Some(first), Some(last)) = (self.stops.first(), self.stops.last()) else {
            return Rgb::new(0, 0, 0);
        };
        if t <= first.t {
            return first.color;
        }
        if t >= last.t {
            return last.color;
        }

        for pair in self.stops.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if t >= lo.t && t <= hi.t {
                let span = hi.t - lo.t;
                let f = if span > 0.0 { (t - lo.t) / span } else { 0.0 };
                let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * f).round() as u8;
                return Rgb::new(
                    mix(lo.color.r, hi.color.r),
                    mix(lo.color.g, hi.color.g),
                    mix(lo.color.b, hi.color.b),
                );
            }
        }
        last.color
    }

    /// `n` evenly spaced colours across the ramp, e.g. one per class break.
    pub fn sample(&self, n: usize) -> Vec<Rgb> {
        match n {
            0 => Vec::new(),
            1 => vec![self.color_at(0.5)],
            _ => (0..n)
                .map(|i| self.color_at(i as f64 / (n - 1) as f64))
                .collect(),
        }
    }
}

// ─── Built-in catalogue ───────────────────────────────────────────────

const ELEVATION_1_STOPS: &[ColorStop] = &[
    ColorStop::new(0.00, 56, 168, 0),
    ColorStop::new(0.20, 139, 209, 0),
    ColorStop::new(0.40, 255, 255, 0),
    ColorStop::new(0.60, 255, 170, 0),
    ColorStop::new(0.80, 168, 112, 0),
    ColorStop::new(1.00, 255, 255, 255),
];

const ELEVATION_2_STOPS: &[ColorStop] = &[
    ColorStop::new(0.00, 34, 139, 34),
    ColorStop::new(0.25, 144, 190, 60),
    ColorStop::new(0.50, 220, 200, 80),
    ColorStop::new(0.75, 180, 120, 60),
    ColorStop::new(1.00, 255, 255, 255),
];

const BLACK_TO_WHITE_STOPS: &[ColorStop] = &[
    ColorStop::new(0.0, 0, 0, 0),
    ColorStop::new(1.0, 255, 255, 255),
];

const WHITE_TO_BLACK_STOPS: &[ColorStop] = &[
    ColorStop::new(0.0, 255, 255, 255),
    ColorStop::new(1.0, 0, 0, 0),
];

const BATHYMETRY_STOPS: &[ColorStop] = &[
    ColorStop::new(0.0, 8, 29, 88),
    ColorStop::new(0.5, 65, 182, 196),
    ColorStop::new(1.0, 237, 248, 177),
];

/// Ramps every new project document starts with.
pub fn builtin_ramps() -> Vec<ColorRamp> {
    vec![
        ColorRamp::new("Elevation #1", ELEVATION_1_STOPS),
        ColorRamp::new("Elevation #2", ELEVATION_2_STOPS),
        ColorRamp::new("Black to White", BLACK_TO_WHITE_STOPS),
        ColorRamp::new("White to Black", WHITE_TO_BLACK_STOPS),
        ColorRamp::new("Bathymetry #1", BATHYMETRY_STOPS),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_has_default_ramps() {
        let names: Vec<_> = builtin_ramps().into_iter().map(|r| r.name).collect();
        assert!(names.contains(&"Elevation #1".to_string()));
        assert!(names.contains(&"Black to White".to_string()));
    }

    #[test]
    fn test_interpolation() {
        let ramp = ColorRamp::new("bw", BLACK_TO_WHITE_STOPS);
        assert_eq!(ramp.color_at(0.0), Rgb::new(0, 0, 0));
        assert_eq!(ramp.color_at(1.0), Rgb::new(255, 255, 255));
        assert_eq!(ramp.color_at(0.5), Rgb::new(128, 128, 128));
        assert_eq!(ramp.color_at(-3.0), Rgb::new(0, 0, 0));
        assert_eq!(ramp.color_at(f64::NAN), Rgb::new(0, 0, 0));
    }

    #[test]
    fn test_sample_endpoints() {
        let ramp = ColorRamp::new("e1", ELEVATION_1_STOPS);
        let colors = ramp.sample(18);
        assert_eq!(colors.len(), 18);
        assert_eq!(colors[0], Rgb::new(56, 168, 0));
        assert_eq!(colors[17].to_string(), "#ffffff");
    }
}
