//! Continuous colormaps sampled on [0, 1].

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RenderError;
use crate::style::Color;

/// ColorBrewer PuBu, 9 classes.
const PUBU: &[(u8, u8, u8)] = &[
    (0xff, 0xf7, 0xfb),
    (0xec, 0xe7, 0xf2),
    (0xd0, 0xd1, 0xe6),
    (0xa6, 0xbd, 0xdb),
    (0x74, 0xa9, 0xcf),
    (0x36, 0x90, 0xc0),
    (0x05, 0x70, 0xb0),
    (0x04, 0x5a, 0x8d),
    (0x02, 0x38, 0x58),
];

/// ColorBrewer Greys, 9 classes (light to dark).
const GREYS: &[(u8, u8, u8)] = &[
    (0xff, 0xff, 0xff),
    (0xf0, 0xf0, 0xf0),
    (0xd9, 0xd9, 0xd9),
    (0xbd, 0xbd, 0xbd),
    (0x96, 0x96, 0x96),
    (0x73, 0x73, 0x73),
    (0x52, 0x52, 0x52),
    (0x25, 0x25, 0x25),
    (0x00, 0x00, 0x00),
];

/// Cyclic twilight map re-centred on its light end: dark purple through
/// blue to near-white at 0.5, then orange-red back to dark.
const TWILIGHT_SHIFTED: &[(u8, u8, u8)] = &[
    (0x2f, 0x14, 0x36),
    (0x3c, 0x28, 0x60),
    (0x46, 0x47, 0x8c),
    (0x54, 0x6d, 0xa8),
    (0x6d, 0x92, 0xbb),
    (0x99, 0xb4, 0xc9),
    (0xc9, 0xd2, 0xd9),
    (0xe2, 0xd9, 0xe2),
    (0xd8, 0xc0, 0xb2),
    (0xcb, 0x97, 0x7d),
    (0xbd, 0x6b, 0x56),
    (0xa6, 0x45, 0x41),
    (0x84, 0x27, 0x3f),
    (0x5b, 0x17, 0x3d),
    (0x2f, 0x14, 0x36),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Colormap {
    #[serde(rename = "PuBu")]
    PuBu,
    #[serde(rename = "Greys")]
    Greys,
    #[serde(rename = "Greys_r")]
    GreysR,
    #[serde(rename = "twilight_shifted")]
    TwilightShifted,
}

impl Colormap {
    pub fn name(&self) -> &'static str {
        match self {
            Colormap::PuBu => "PuBu",
            Colormap::Greys => "Greys",
            Colormap::GreysR => "Greys_r",
            Colormap::TwilightShifted => "twilight_shifted",
        }
    }

    /// Color at `t`, clamped to [0, 1]. NaN maps to transparent.
    pub fn sample(&self, t: f32) -> Color {
        if t.is_nan() {
            return Color::NONE;
        }
        let t = t.clamp(0.0, 1.0);
        match self {
            Colormap::PuBu => interpolate(PUBU, t),
            Colormap::Greys => interpolate(GREYS, t),
            Colormap::GreysR => interpolate(GREYS, 1.0 - t),
            Colormap::TwilightShifted => interpolate(TWILIGHT_SHIFTED, t),
        }
    }

    /// Color for `value` normalized linearly by `vmin..vmax`.
    pub fn sample_value(&self, value: f32, vmin: f32, vmax: f32) -> Color {
        let range = vmax - vmin;
        let t = if range.abs() < f32::EPSILON {
            0.5
        } else {
            (value - vmin) / range
        };
        self.sample(t)
    }
}

fn interpolate(stops: &[(u8, u8, u8)], t: f32) -> Color {
    let last = stops.len() - 1;
    let pos = t * last as f32;
    let i = (pos.floor() as usize).min(last);
    let j = (i + 1).min(last);
    let frac = pos - i as f32;
    let (r0, g0, b0) = stops[i];
    let (r1, g1, b1) = stops[j];
    Color::rgb(r0, g0, b0).lerp(Color::rgb(r1, g1, b1), frac)
}

impl FromStr for Colormap {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PuBu" => Ok(Colormap::PuBu),
            "Greys" => Ok(Colormap::Greys),
            "Greys_r" => Ok(Colormap::GreysR),
            "twilight_shifted" => Ok(Colormap::TwilightShifted),
            other => Err(RenderError::UnknownColormap(other.to_string())),
        }
    }
}
