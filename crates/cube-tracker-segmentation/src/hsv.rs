//! RGB -> HSV conversion and per-colour HSV acceptance ranges.

use serde::{Deserialize, Serialize};

/// HSV triple: hue in degrees `[0, 360)`, saturation and value in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsv {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

impl Hsv {
    pub fn from_rgb(rgb: [u8; 3]) -> Self {
        let r = rgb[0] as f32 / 255.0;
        let g = rgb[1] as f32 / 255.0;
        let b = rgb[2] as f32 / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let h = if delta <= f32::EPSILON {
            0.0
        } else if max == r {
            60.0 * ((g - b) / delta).rem_euclid(6.0)
        } else if max == g {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };
        let s = if max <= f32::EPSILON { 0.0 } else { delta / max };

        Self {
            h: h.rem_euclid(360.0),
            s,
            v: max,
        }
    }
}

/// Acceptance region of one face colour.
///
/// The hue interval wraps through 0 when `hue_min > hue_max` (e.g. red:
/// `340..20`). All bounds are inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HsvRange {
    pub hue_min: f32,
    pub hue_max: f32,
    pub sat_min: f32,
    #[serde(default = "one")]
    pub sat_max: f32,
    pub val_min: f32,
    #[serde(default = "one")]
    pub val_max: f32,
}

fn one() -> f32 {
    1.0
}

impl HsvRange {
    pub fn new(hue_min: f32, hue_max: f32, sat_min: f32, val_min: f32) -> Self {
        Self {
            hue_min,
            hue_max,
            sat_min,
            sat_max: 1.0,
            val_min,
            val_max: 1.0,
        }
    }

    pub fn contains(&self, hsv: Hsv) -> bool {
        let hue_ok = if self.hue_min <= self.hue_max {
            hsv.h >= self.hue_min && hsv.h <= self.hue_max
        } else {
            hsv.h >= self.hue_min || hsv.h <= self.hue_max
        };
        hue_ok
            && hsv.s >= self.sat_min
            && hsv.s <= self.sat_max
            && hsv.v >= self.val_min
            && hsv.v <= self.val_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn primaries_have_expected_hues() {
        assert_relative_eq!(Hsv::from_rgb([255, 0, 0]).h, 0.0);
        assert_relative_eq!(Hsv::from_rgb([255, 255, 0]).h, 60.0);
        assert_relative_eq!(Hsv::from_rgb([0, 255, 0]).h, 120.0);
        assert_relative_eq!(Hsv::from_rgb([0, 255, 255]).h, 180.0);
        assert_relative_eq!(Hsv::from_rgb([0, 0, 255]).h, 240.0);
        assert_relative_eq!(Hsv::from_rgb([255, 0, 255]).h, 300.0);
    }

    #[test]
    fn grey_has_no_saturation() {
        let hsv = Hsv::from_rgb([90, 90, 90]);
        assert_eq!(hsv.s, 0.0);
        assert_relative_eq!(hsv.v, 90.0 / 255.0);
        assert_eq!(Hsv::from_rgb([0, 0, 0]).s, 0.0);
    }

    #[test]
    fn wrapping_hue_range() {
        let red = HsvRange::new(340.0, 20.0, 0.3, 0.1);
        assert!(red.contains(Hsv::from_rgb([230, 20, 40])));
        assert!(red.contains(Hsv::from_rgb([230, 40, 20])));
        assert!(!red.contains(Hsv::from_rgb([20, 230, 40])));
        assert!(!red.contains(Hsv::from_rgb([120, 110, 110])));
    }
}
