//! Color utility functions for label colors.
//!
//! Label colors are sampled from a colormap at evenly spaced positions
//! `index / label_count`, so neighbouring labels land far apart on the map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_COLORMAP;

/// Number of entries in a sampled colormap lookup table.
const LUT_SIZE: usize = 256;

/// Control points of the `gist_rainbow` colormap: (position, rgb).
const GIST_RAINBOW: [(f64, [f64; 3]); 8] = [
    (0.000, [1.00, 0.00, 0.16]),
    (0.030, [1.00, 0.00, 0.00]),
    (0.215, [1.00, 1.00, 0.00]),
    (0.400, [0.00, 1.00, 0.00]),
    (0.586, [0.00, 1.00, 1.00]),
    (0.770, [0.00, 0.00, 1.00]),
    (0.954, [1.00, 0.00, 1.00]),
    (1.000, [1.00, 0.00, 0.75]),
];

/// Colormaps available for label colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Colormap {
    /// Red → yellow → green → cyan → blue → magenta
    #[default]
    GistRainbow,
    /// Full-saturation hue wheel
    Hsv,
}

impl Colormap {
    /// Look a colormap up by name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            DEFAULT_COLORMAP => Some(Colormap::GistRainbow),
            "hsv" => Some(Colormap::Hsv),
            _ => None,
        }
    }

    /// Sample the colormap at `value` in `[0, 1]`.
    pub fn sample(self, value: f64) -> [u8; 3] {
        match self {
            Colormap::GistRainbow => {
                // Quantize to the lookup table first so colors match a 256-entry LUT
                let value = value.clamp(0.0, 1.0);
                let index = ((value * LUT_SIZE as f64) as usize).min(LUT_SIZE - 1);
                let x = index as f64 / (LUT_SIZE - 1) as f64;
                interpolate_segments(&GIST_RAINBOW, x).map(|c| (c * 255.0) as u8)
            }
            Colormap::Hsv => {
                let hue = (value.clamp(0.0, 1.0) * 360.0) as f32 % 360.0;
                let (r, g, b) = hsv_to_rgb(hue, 1.0, 1.0);
                [r, g, b].map(|c| (c * 255.0) as u8)
            }
        }
    }
}

fn interpolate_segments(stops: &[(f64, [f64; 3])], x: f64) -> [f64; 3] {
    for pair in stops.windows(2) {
        let (x0, c0) = pair[0];
        let (x1, c1) = pair[1];
        if x <= x1 {
            let t = if x1 > x0 { (x - x0) / (x1 - x0) } else { 0.0 };
            return [0, 1, 2].map(|i| c0[i] + (c1[i] - c0[i]) * t);
        }
    }
    stops.last().map(|(_, c)| *c).unwrap_or([0.0; 3])
}

/// Convert HSV to RGB.
///
/// # Arguments
/// * `h` - Hue in degrees (0-360)
/// * `s` - Saturation (0.0-1.0)
/// * `v` - Value/brightness (0.0-1.0)
///
/// # Returns
/// RGB tuple with values in range 0.0-1.0
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (r + m, g + m, b + m)
}

/// Format an RGB triple as `#rrggbb`.
pub fn to_hex(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

/// Parse `#rrggbb` (the leading `#` is optional).
pub fn parse_hex(hex: &str) -> Option<[u8; 3]> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

/// Mapping from label name to `#rrggbb` display color.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelColorMap {
    colors: BTreeMap<String, String>,
}

impl LabelColorMap {
    /// Build colors for every label, sampling the colormap at `index / count`.
    pub fn generate(labels: &[String], colormap: Colormap) -> Self {
        let count = labels.len();
        let colors = labels
            .iter()
            .enumerate()
            .map(|(index, label)| {
                let rgb = colormap.sample(index as f64 / count as f64);
                (label.clone(), to_hex(rgb))
            })
            .collect();
        Self { colors }
    }

    /// Hex color for a label.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.colors.get(label).map(String::as_str)
    }

    /// Parsed RGB color for a label.
    pub fn rgb(&self, label: &str) -> Option<[u8; 3]> {
        self.get(label).and_then(parse_hex)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.colors.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
