//! Named color presets: solid colors and gradients, plus the gradient
//! sampling routine effects use to turn a scalar position into a color.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::color::{lerp_hsv, lerp_rgb, RgbcctColor};

/// The color space a [`Gradient`] is interpolated in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSpace {
    Rgb,
    Hsv,
}

/// One positioned color along a [`Gradient`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GradientStop {
    pub position: f32,
    pub color: RgbcctColor,
}

/// An ordered list of [`GradientStop`]s sampled by position. Stops are
/// normalized to ascending order on construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Gradient {
    pub stops: Vec<GradientStop>,
    pub space: ColorSpace,
}

impl Gradient {
    pub fn new(mut stops: Vec<GradientStop>, space: ColorSpace) -> Self {
        stops.sort_by(|a, b| a.position.partial_cmp(&b.position).unwrap());
        Gradient { stops, space }
    }

    /// A degenerate gradient showing the same color everywhere, used when
    /// an effect is handed a solid [`ColorPreset`] but needs a gradient
    /// source (Flow).
    pub fn solid(color: RgbcctColor) -> Self {
        Gradient {
            stops: vec![
                GradientStop { position: 0.0, color },
                GradientStop { position: 1.0, color },
            ],
            space: ColorSpace::Rgb,
        }
    }

    pub fn reversed(&self) -> Gradient {
        let stops = self
            .stops
            .iter()
            .map(|s| GradientStop {
                position: 1.0 - s.position,
                color: s.color,
            })
            .collect();
        Gradient::new(stops, self.space)
    }

    /// Sample the gradient at `p` (clamped to `[0,1]`).
    pub fn sample(&self, p: f32) -> RgbcctColor {
        let p = p.clamp(0.0, 1.0);

        let Some(first) = self.stops.first() else {
            return RgbcctColor::BLACK;
        };
        if self.stops.len() == 1 || p <= first.position {
            return first.color;
        }
        let last = self.stops.last().unwrap();
        if p >= last.position {
            return last.color;
        }

        let hi_idx = self
            .stops
            .iter()
            .position(|s| s.position >= p)
            .unwrap_or(self.stops.len() - 1);
        let hi = &self.stops[hi_idx];
        let lo = &self.stops[hi_idx - 1];

        let range = hi.position - lo.position;
        let local = if range.abs() < f32::EPSILON {
            0.0
        } else {
            (p - lo.position) / range
        };

        match self.space {
            ColorSpace::Rgb => lerp_rgb(&lo.color, &hi.color, local),
            ColorSpace::Hsv => lerp_hsv(&lo.color, &hi.color, local),
        }
    }
}

/// A named color reference: either a flat solid color or a [`Gradient`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColorPreset {
    Solid { color: RgbcctColor },
    Gradient { gradient: Gradient },
}

impl ColorPreset {
    /// The color an effect should treat as this preset's "single" target:
    /// the solid color, or the gradient sampled at its midpoint.
    pub fn representative_color(&self) -> RgbcctColor {
        match self {
            ColorPreset::Solid { color } => *color,
            ColorPreset::Gradient { gradient } => gradient.sample(0.5),
        }
    }

    /// A [`Gradient`] view of this preset: itself if already a gradient,
    /// or a degenerate solid gradient otherwise. Used by Flow.
    pub fn as_gradient(&self) -> Gradient {
        match self {
            ColorPreset::Solid { color } => Gradient::solid(*color),
            ColorPreset::Gradient { gradient } => gradient.clone(),
        }
    }
}

/// Holds the named [`ColorPreset`]s available to effects. Presets may be
/// added at any time; there is no persistence here (unlike effect
/// presets) since the engine reloads its color library from configuration
/// on every start.
#[derive(Debug, Default)]
pub struct ColorManager {
    presets: HashMap<String, ColorPreset>,
}

impl ColorManager {
    pub fn new() -> Self {
        ColorManager::default()
    }

    pub fn add_preset(&mut self, name: impl Into<String>, preset: ColorPreset) {
        self.presets.insert(name.into(), preset);
    }

    pub fn get_preset(&self, name: &str) -> Option<&ColorPreset> {
        self.presets.get(name)
    }

    pub fn has_preset(&self, name: &str) -> bool {
        self.presets.contains_key(name)
    }

    pub fn remove_preset(&mut self, name: &str) -> Option<ColorPreset> {
        self.presets.remove(name)
    }

    pub fn list_presets(&self) -> Vec<(&String, &ColorPreset)> {
        self.presets.iter().collect()
    }

    /// Load a `{name: ColorPreset}` map parsed from configuration,
    /// skipping (and logging) any entry that fails structural validation
    /// rather than aborting the whole load.
    pub fn load_presets_from_config(&mut self, raw: serde_json::Value) {
        let Some(obj) = raw.as_object() else {
            log::warn!("color preset config is not a JSON object, ignoring");
            return;
        };
        for (name, value) in obj {
            match serde_json::from_value::<ColorPreset>(value.clone()) {
                Ok(preset) => {
                    self.add_preset(name.clone(), preset);
                }
                Err(e) => {
                    log::warn!("skipping invalid color preset '{name}': {e}");
                }
            }
        }
    }

    /// Sample `gradient` at `p`, delegating to [`Gradient::sample`]. Kept
    /// as a method on the manager so effect code can resolve a named
    /// preset and sample it in one place.
    pub fn interpolate_gradient(&self, gradient: &Gradient, p: f32) -> RgbcctColor {
        gradient.sample(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(pos: f32, r: u8, g: u8, b: u8) -> GradientStop {
        GradientStop {
            position: pos,
            color: RgbcctColor::new(r, g, b, 0, 0),
        }
    }

    #[test]
    fn sample_is_exact_at_stop_positions() {
        let g = Gradient::new(
            vec![stop(0.0, 255, 0, 0), stop(0.5, 0, 255, 0), stop(1.0, 0, 0, 255)],
            ColorSpace::Rgb,
        );
        assert_eq!(g.sample(0.0).rgb(), [255, 0, 0]);
        assert_eq!(g.sample(0.5).rgb(), [0, 255, 0]);
        assert_eq!(g.sample(1.0).rgb(), [0, 0, 255]);
    }

    #[test]
    fn rgb_sample_commutes_with_reversal() {
        let g = Gradient::new(vec![stop(0.0, 255, 0, 0), stop(1.0, 0, 0, 255)], ColorSpace::Rgb);
        let rev = g.reversed();
        for i in 0..=10 {
            let p = i as f32 / 10.0;
            let a = g.sample(p).rgb();
            let b = rev.sample(1.0 - p).rgb();
            assert_eq!(a, b, "mismatch at p={p}");
        }
    }

    #[test]
    fn single_stop_gradient_is_constant() {
        let g = Gradient::new(vec![stop(0.3, 10, 20, 30)], ColorSpace::Rgb);
        assert_eq!(g.sample(0.0).rgb(), [10, 20, 30]);
        assert_eq!(g.sample(1.0).rgb(), [10, 20, 30]);
    }

    #[test]
    fn empty_gradient_samples_black() {
        let g = Gradient {
            stops: vec![],
            space: ColorSpace::Rgb,
        };
        assert_eq!(g.sample(0.5), RgbcctColor::BLACK);
    }
}
