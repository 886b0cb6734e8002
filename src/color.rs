//! Pure color-space utilities: RGBCCT/RGB/HSV representations and the
//! interpolation routines the effect engine builds on. Nothing in this
//! module holds state or performs I/O.
use serde::{Deserialize, Serialize};

/// Five-channel panel color: red, green, blue, cool-white, warm-white,
/// each `0..=255`. `alpha` is an optional blend weight and is never sent
/// on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RgbcctColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub cool: u8,
    pub warm: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f32>,
}

impl RgbcctColor {
    pub const BLACK: RgbcctColor = RgbcctColor {
        r: 0,
        g: 0,
        b: 0,
        cool: 0,
        warm: 0,
        alpha: None,
    };

    /// Pure warm/cool white, used as the SolidColor default target when no
    /// preset is resolvable.
    pub const WHITE: RgbcctColor = RgbcctColor {
        r: 255,
        g: 255,
        b: 255,
        cool: 255,
        warm: 0,
        alpha: None,
    };

    pub const fn new(r: u8, g: u8, b: u8, cool: u8, warm: u8) -> Self {
        RgbcctColor {
            r,
            g,
            b,
            cool,
            warm,
            alpha: None,
        }
    }

    pub fn rgb(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Per-channel linear lerp toward `to`, rounded and clamped. `alpha` is
    /// not interpolated; the caller's own value is preserved.
    pub fn lerp(&self, to: &RgbcctColor, t: f32) -> RgbcctColor {
        RgbcctColor {
            r: lerp_u8(self.r, to.r, t),
            g: lerp_u8(self.g, to.g, t),
            b: lerp_u8(self.b, to.b, t),
            cool: lerp_u8(self.cool, to.cool, t),
            warm: lerp_u8(self.warm, to.warm, t),
            alpha: self.alpha,
        }
    }

    /// Scale rgb+cct channels by a brightness factor in `[0,1]`, rounded
    /// and clamped. Used when writing a DMX buffer.
    pub fn scaled(&self, brightness: f32) -> RgbcctColor {
        let b = brightness.clamp(0.0, 1.0);
        RgbcctColor {
            r: scale_u8(self.r, b),
            g: scale_u8(self.g, b),
            b: scale_u8(self.b, b),
            cool: scale_u8(self.cool, b),
            warm: scale_u8(self.warm, b),
            alpha: self.alpha,
        }
    }
}

fn scale_u8(v: u8, factor: f32) -> u8 {
    ((v as f32) * factor).round().clamp(0.0, 255.0) as u8
}

fn lerp_u8(from: u8, to: u8, t: f32) -> u8 {
    let t = t.clamp(0.0, 1.0);
    (from as f32 + (to as f32 - from as f32) * t)
        .round()
        .clamp(0.0, 255.0) as u8
}

/// Hue in degrees `[0,360)`, saturation/value in `[0,1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HsvColor {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

impl HsvColor {
    pub fn from_rgb(rgb: [u8; 3]) -> HsvColor {
        let r = rgb[0] as f32 / 255.0;
        let g = rgb[1] as f32 / 255.0;
        let b = rgb[2] as f32 / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let h = if delta.abs() < f32::EPSILON {
            0.0
        } else if max == r {
            60.0 * (((g - b) / delta).rem_euclid(6.0))
        } else if max == g {
            60.0 * (((b - r) / delta) + 2.0)
        } else {
            60.0 * (((r - g) / delta) + 4.0)
        };

        let s = if max.abs() < f32::EPSILON { 0.0 } else { delta / max };

        HsvColor {
            h: h.rem_euclid(360.0),
            s,
            v: max,
        }
    }

    pub fn to_rgb(&self) -> [u8; 3] {
        let h = self.h.rem_euclid(360.0);
        let c = self.v * self.s;
        let x = c * (1.0 - ((h / 60.0).rem_euclid(2.0) - 1.0).abs());
        let m = self.v - c;

        let (r1, g1, b1) = if h < 60.0 {
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

        [
            ((r1 + m) * 255.0).round().clamp(0.0, 255.0) as u8,
            ((g1 + m) * 255.0).round().clamp(0.0, 255.0) as u8,
            ((b1 + m) * 255.0).round().clamp(0.0, 255.0) as u8,
        ]
    }
}

/// Linear per-channel RGB lerp. `cool`/`warm` are carried along linearly
/// too, so this doubles as the RGBCCT blend used outside gradients.
pub fn lerp_rgb(from: &RgbcctColor, to: &RgbcctColor, t: f32) -> RgbcctColor {
    from.lerp(to, t)
}

/// Hue-correct HSV interpolation between two RGB endpoints, taking the
/// shortest arc around the hue wheel. `cool`/`warm` channels are linear,
/// matching `ColorManager::interpolate_gradient`'s rule that CCT channels
/// are never run through the HSV path.
pub fn lerp_hsv(from: &RgbcctColor, to: &RgbcctColor, t: f32) -> RgbcctColor {
    let mut a = HsvColor::from_rgb(from.rgb());
    let b = HsvColor::from_rgb(to.rgb());

    if (b.h - a.h).abs() > 180.0 {
        if a.h < b.h {
            a.h += 360.0;
        } else {
            a.h -= 360.0;
        }
    }

    let t = t.clamp(0.0, 1.0);
    let h = a.h + (b.h - a.h) * t;
    let s = a.s + (b.s - a.s) * t;
    let v = a.v + (b.v - a.v) * t;
    let rgb = HsvColor { h, s, v }.to_rgb();

    RgbcctColor {
        r: rgb[0],
        g: rgb[1],
        b: rgb[2],
        cool: lerp_u8(from.cool, to.cool, t),
        warm: lerp_u8(from.warm, to.warm, t),
        alpha: from.alpha,
    }
}

pub fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsv_roundtrip_primary_colors() {
        for rgb in [[255u8, 0, 0], [0, 255, 0], [0, 0, 255], [0, 0, 0], [255, 255, 255]] {
            let hsv = HsvColor::from_rgb(rgb);
            let back = hsv.to_rgb();
            assert!(
                back.iter().zip(rgb.iter()).all(|(a, b)| (*a as i16 - *b as i16).abs() <= 1),
                "roundtrip mismatch: {:?} -> {:?} -> {:?}",
                rgb,
                hsv,
                back
            );
        }
    }

    #[test]
    fn hsv_shortest_arc_red_to_blue_is_magenta() {
        let red = RgbcctColor::new(255, 0, 0, 0, 0);
        let blue = RgbcctColor::new(0, 0, 255, 0, 0);
        let mid = lerp_hsv(&red, &blue, 0.5);
        let hsv = HsvColor::from_rgb(mid.rgb());
        // shortest arc from 0 to 240 passes through 300 (magenta), not 120 (green/cyan)
        assert!(hsv.h > 270.0 && hsv.h < 330.0, "expected magenta-range hue, got {}", hsv.h);
    }

    #[test]
    fn lerp_clamps_and_rounds() {
        let black = RgbcctColor::BLACK;
        let white = RgbcctColor::WHITE;
        let half = black.lerp(&white, 0.5);
        assert_eq!(half.r, 128);
        assert_eq!(half.cool, 128);
        assert_eq!(half.warm, 0);
    }

    #[test]
    fn scaled_clamps_to_byte_range() {
        let c = RgbcctColor::new(200, 200, 200, 200, 200);
        let scaled = c.scaled(1.5);
        assert_eq!(scaled.r, 255);
    }
}
