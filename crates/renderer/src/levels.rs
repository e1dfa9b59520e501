//! Contour level selection.

use serde::{Deserialize, Serialize};

/// Candidate step multipliers for automatic levels.
const NICE_STEPS: [f64; 5] = [1.0, 2.0, 2.5, 5.0, 10.0];

/// Maximum number of intervals for automatic levels.
const AUTO_BINS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutoLevels {
    #[serde(rename = "auto")]
    Auto,
}

/// Levels as written in product configuration:
///
/// ```yaml
/// levels: [900, 904, 908]
/// levels: { start: 30, stop: 160, step: 10 }   # stop excluded
/// levels: auto
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Levels {
    List(Vec<f32>),
    Range { start: f32, stop: f32, step: f32 },
    Auto(AutoLevels),
}

impl Default for Levels {
    fn default() -> Self {
        Levels::Auto(AutoLevels::Auto)
    }
}

impl Levels {
    pub fn range(start: f32, stop: f32, step: f32) -> Self {
        Levels::Range { start, stop, step }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, Levels::Auto(_))
    }

    /// Levels bounding filled bands. `data_range` is only consulted for
    /// automatic levels.
    pub fn band_levels(&self, data_range: Option<(f32, f32)>) -> Vec<f32> {
        match self {
            Levels::List(list) => {
                let mut levels: Vec<f32> = list.iter().copied().filter(|v| v.is_finite()).collect();
                levels.sort_by(f32::total_cmp);
                levels.dedup();
                levels
            }
            Levels::Range { start, stop, step } => arange(*start, *stop, *step),
            Levels::Auto(_) => data_range
                .map(|(lo, hi)| nice_levels(lo, hi, AUTO_BINS))
                .unwrap_or_default(),
        }
    }

    /// Levels for line contours. Automatic levels keep only values strictly
    /// inside the data range.
    pub fn line_levels(&self, data_range: Option<(f32, f32)>) -> Vec<f32> {
        let levels = self.band_levels(data_range);
        match (self, data_range) {
            (Levels::Auto(_), Some((lo, hi))) => {
                levels.into_iter().filter(|&l| l > lo && l < hi).collect()
            }
            _ => levels,
        }
    }
}

/// `start, start + step, ...` up to but excluding `stop`.
pub fn arange(start: f32, stop: f32, step: f32) -> Vec<f32> {
    if !(step > 0.0 && stop > start) {
        return Vec::new();
    }
    let (start, stop, step) = (start as f64, stop as f64, step as f64);
    let count = ((stop - start) / step).ceil() as usize;
    (0..count).map(|k| (start + k as f64 * step) as f32).collect()
}

/// Evenly spaced round-number levels covering `[min, max]` with at most
/// `max_bins` intervals.
pub fn nice_levels(min: f32, max: f32, max_bins: usize) -> Vec<f32> {
    if !min.is_finite() || !max.is_finite() || max_bins == 0 {
        return Vec::new();
    }
    let (min, max) = (min as f64, max as f64);
    if max <= min {
        return vec![min as f32];
    }

    let raw = (max - min) / max_bins as f64;
    let mut magnitude = 10f64.powf(raw.log10().floor());
    loop {
        for s in NICE_STEPS {
            let step = s * magnitude;
            let lo = (min / step).floor();
            let hi = (max / step).ceil();
            if (hi - lo) as usize <= max_bins {
                return (lo as i64..=hi as i64)
                    .map(|k| (k as f64 * step) as f32)
                    .collect();
            }
        }
        magnitude *= 10.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arange_excludes_stop() {
        let levels = arange(30.0, 160.0, 10.0);
        assert_eq!(levels.first(), Some(&30.0));
        assert_eq!(levels.last(), Some(&150.0));
        assert_eq!(levels.len(), 13);

        let temps = arange(-10.0, 120.0, 2.0);
        assert_eq!(temps.len(), 65);
        assert_eq!(temps.last(), Some(&118.0));
        assert!(arange(0.0, 1.0, 0.0).is_empty());
    }

    #[test]
    fn test_nice_levels_heights() {
        // 500 hPa heights over CONUS
        let levels = nice_levels(5230.0, 5890.0, 8);
        assert_eq!(levels, vec![5200.0, 5300.0, 5400.0, 5500.0, 5600.0, 5700.0, 5800.0, 5900.0]);
    }

    #[test]
    fn test_nice_levels_small_range() {
        let levels = nice_levels(0.1, 0.9, 8);
        assert!(levels.len() <= 9);
        assert!(levels[0] <= 0.1 && *levels.last().unwrap() >= 0.9);
        let step = levels[1] - levels[0];
        assert!((step - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_line_levels_strictly_inside() {
        let levels = Levels::default().line_levels(Some((5230.0, 5890.0)));
        assert_eq!(levels.first(), Some(&5300.0));
        assert_eq!(levels.last(), Some(&5800.0));
        assert!(Levels::default().line_levels(None).is_empty());
    }

    #[test]
    fn test_yaml_forms() {
        let list: Levels = serde_yaml::from_str("[904, 900, 908]").unwrap();
        assert_eq!(list.band_levels(None), vec![900.0, 904.0, 908.0]);

        let range: Levels = serde_yaml::from_str("{ start: 900, stop: 1056, step: 4 }").unwrap();
        assert_eq!(range, Levels::range(900.0, 1056.0, 4.0));
        assert_eq!(range.band_levels(None).len(), 39);

        let auto: Levels = serde_yaml::from_str("auto").unwrap();
        assert!(auto.is_auto());
    }
}
