//! Editing state: continuous sliders, toggle filters, and the quarter-turn
//! transform.
//!
//! [`AdjustmentState`] is a value object. Every field is always defined and
//! in range: setters clamp instead of rejecting, and [`AdjustmentState::reset`]
//! returns everything to identity. Rendering never mutates it; the renderer
//! reads it through [`AdjustmentState::filter_chain`] and the transform
//! getters.
//!
//! ## Ranges
//!
//! | Slider | Range | Identity |
//! |---|---|---|
//! | brightness | -100 ..= 100 (percent offset) | 0 |
//! | contrast | -100 ..= 100 | 0 |
//! | saturation | -100 ..= 100 | 0 |
//! | hue | 0 .. 360 degrees, wraps | 0 |
//! | blur | 0 ..= 50 pixels | 0 |

use crate::imaging::{FilterChain, FilterEffect};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Radius of the fixed blur applied by the blur toggle.
pub const BLUR_PRESET_PX: f32 = 5.0;

/// Contrast percent used by the "sharpen" toggle.
///
/// Sharpen is a contrast boost alias, not a real sharpening kernel.
pub const SHARPEN_CONTRAST_PERCENT: f32 = 200.0;

/// Upper bound of the blur slider in pixels.
pub const MAX_BLUR_PX: f32 = 50.0;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} '{name}' (expected one of: {expected})")]
pub struct UnknownName {
    kind: &'static str,
    name: String,
    expected: &'static str,
}

/// One of the five continuous sliders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Continuous {
    Brightness,
    Contrast,
    Saturation,
    Hue,
    Blur,
}

impl Continuous {
    pub const ALL: [Continuous; 5] = [
        Continuous::Brightness,
        Continuous::Contrast,
        Continuous::Saturation,
        Continuous::Hue,
        Continuous::Blur,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Continuous::Brightness => "brightness",
            Continuous::Contrast => "contrast",
            Continuous::Saturation => "saturation",
            Continuous::Hue => "hue",
            Continuous::Blur => "blur",
        }
    }

    /// Bring `value` into this slider's range.
    ///
    /// Hue wraps around the color wheel; the others clamp. Non-finite input
    /// maps to the identity value.
    pub fn clamp(self, value: f32) -> f32 {
        if !value.is_finite() {
            return 0.0;
        }
        match self {
            Continuous::Brightness | Continuous::Contrast | Continuous::Saturation => {
                value.clamp(-100.0, 100.0)
            }
            Continuous::Hue => value.rem_euclid(360.0),
            Continuous::Blur => value.clamp(0.0, MAX_BLUR_PX),
        }
    }
}

impl fmt::Display for Continuous {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Continuous {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Continuous::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownName {
                kind: "adjustment",
                name: s.to_string(),
                expected: "brightness, contrast, saturation, hue, blur",
            })
    }
}

/// A toggleable filter with fixed parameters.
///
/// Variant order is the composition order: active filters are always applied
/// grayscale → sepia → invert → blur-preset → sharpen, whatever order they
/// were switched on in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscreteFilter {
    Grayscale,
    Sepia,
    Invert,
    BlurPreset,
    Sharpen,
}

impl DiscreteFilter {
    pub const ALL: [DiscreteFilter; 5] = [
        DiscreteFilter::Grayscale,
        DiscreteFilter::Sepia,
        DiscreteFilter::Invert,
        DiscreteFilter::BlurPreset,
        DiscreteFilter::Sharpen,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DiscreteFilter::Grayscale => "grayscale",
            DiscreteFilter::Sepia => "sepia",
            DiscreteFilter::Invert => "invert",
            DiscreteFilter::BlurPreset => "blur-preset",
            DiscreteFilter::Sharpen => "sharpen",
        }
    }

    /// The fixed effect this toggle contributes to the chain.
    pub fn effect(self) -> FilterEffect {
        match self {
            DiscreteFilter::Grayscale => FilterEffect::Grayscale(100.0),
            DiscreteFilter::Sepia => FilterEffect::Sepia(100.0),
            DiscreteFilter::Invert => FilterEffect::Invert(100.0),
            DiscreteFilter::BlurPreset => FilterEffect::Blur(BLUR_PRESET_PX),
            DiscreteFilter::Sharpen => FilterEffect::Contrast(SHARPEN_CONTRAST_PERCENT),
        }
    }
}

impl fmt::Display for DiscreteFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DiscreteFilter {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The toolbar button for the preset was labelled plain "blur".
        if s.eq_ignore_ascii_case("blur") {
            return Ok(DiscreteFilter::BlurPreset);
        }
        DiscreteFilter::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownName {
                kind: "filter",
                name: s.to_string(),
                expected: "grayscale, sepia, invert, blur-preset, sharpen",
            })
    }
}

/// A single rotate button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationStep {
    /// +90°
    Clockwise,
    /// -90°
    CounterClockwise,
}

impl RotationStep {
    pub fn degrees(self) -> i64 {
        match self {
            RotationStep::Clockwise => 90,
            RotationStep::CounterClockwise => -90,
        }
    }
}

impl TryFrom<i64> for RotationStep {
    type Error = i64;

    /// Accepts exactly `90` or `-90`; anything else is handed back.
    fn try_from(degrees: i64) -> Result<Self, Self::Error> {
        match degrees {
            90 => Ok(RotationStep::Clockwise),
            -90 => Ok(RotationStep::CounterClockwise),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipAxis {
    Horizontal,
    Vertical,
}

/// Complete editing state for the current image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Recipe")]
pub struct AdjustmentState {
    brightness: f32,
    contrast: f32,
    saturation: f32,
    hue: f32,
    blur: f32,
    filters: BTreeSet<DiscreteFilter>,
    rotation: i64,
    flip_x: bool,
    flip_y: bool,
}

impl Default for AdjustmentState {
    fn default() -> Self {
        Self {
            brightness: 0.0,
            contrast: 0.0,
            saturation: 0.0,
            hue: 0.0,
            blur: 0.0,
            filters: BTreeSet::new(),
            rotation: 0,
            flip_x: false,
            flip_y: false,
        }
    }
}

impl AdjustmentState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a slider, clamping into its range. Returns the stored value.
    pub fn set_continuous(&mut self, kind: Continuous, value: f32) -> f32 {
        let value = kind.clamp(value);
        *self.slot_mut(kind) = value;
        value
    }

    pub fn continuous(&self, kind: Continuous) -> f32 {
        match kind {
            Continuous::Brightness => self.brightness,
            Continuous::Contrast => self.contrast,
            Continuous::Saturation => self.saturation,
            Continuous::Hue => self.hue,
            Continuous::Blur => self.blur,
        }
    }

    fn slot_mut(&mut self, kind: Continuous) -> &mut f32 {
        match kind {
            Continuous::Brightness => &mut self.brightness,
            Continuous::Contrast => &mut self.contrast,
            Continuous::Saturation => &mut self.saturation,
            Continuous::Hue => &mut self.hue,
            Continuous::Blur => &mut self.blur,
        }
    }

    /// Flip membership of `filter`. Returns whether it is now active.
    pub fn toggle_discrete_filter(&mut self, filter: DiscreteFilter) -> bool {
        if self.filters.remove(&filter) {
            false
        } else {
            self.filters.insert(filter);
            true
        }
    }

    pub fn is_active(&self, filter: DiscreteFilter) -> bool {
        self.filters.contains(&filter)
    }

    /// Active toggles in composition order.
    pub fn active_filters(&self) -> impl Iterator<Item = DiscreteFilter> + '_ {
        self.filters.iter().copied()
    }

    /// Accumulate a quarter turn. Only wrapped when the sum would overflow.
    pub fn rotate(&mut self, step: RotationStep) {
        self.rotation = match self.rotation.checked_add(step.degrees()) {
            Some(sum) => sum,
            None => self.normalized_rotation() + step.degrees(),
        };
    }

    /// Raw accumulated rotation in degrees (may be negative or exceed 360).
    pub fn rotation(&self) -> i64 {
        self.rotation
    }

    /// Rotation in `[0, 360)`, as used for rendering.
    pub fn normalized_rotation(&self) -> i64 {
        crate::imaging::normalize_rotation(self.rotation)
    }

    pub fn flip(&mut self, axis: FlipAxis) {
        match axis {
            FlipAxis::Horizontal => self.flip_x = !self.flip_x,
            FlipAxis::Vertical => self.flip_y = !self.flip_y,
        }
    }

    pub fn flip_x(&self) -> bool {
        self.flip_x
    }

    pub fn flip_y(&self) -> bool {
        self.flip_y
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Compose the ordered filter chain for this state.
    ///
    /// The five slider effects always come first, in fixed order, followed by
    /// the active toggles in declaration order.
    pub fn filter_chain(&self) -> FilterChain {
        let mut effects = vec![
            FilterEffect::Brightness(self.brightness + 100.0),
            FilterEffect::Contrast(self.contrast + 100.0),
            FilterEffect::Saturate(self.saturation + 100.0),
            FilterEffect::HueRotate(self.hue),
            FilterEffect::Blur(self.blur),
        ];
        effects.extend(self.active_filters().map(DiscreteFilter::effect));
        FilterChain::new(effects)
    }
}

/// Serialized form of [`AdjustmentState`]. Every field is optional and
/// out-of-range values are clamped on the way in.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Recipe {
    brightness: f32,
    contrast: f32,
    saturation: f32,
    hue: f32,
    blur: f32,
    filters: BTreeSet<DiscreteFilter>,
    rotation: i64,
    flip_x: bool,
    flip_y: bool,
}

/// A recipe rotation that is not a whole number of quarter turns.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("rotation {0}° is not a multiple of 90")]
pub struct InvalidRotation(pub i64);

impl TryFrom<Recipe> for AdjustmentState {
    type Error = InvalidRotation;

    fn try_from(recipe: Recipe) -> Result<Self, Self::Error> {
        if recipe.rotation % 90 != 0 {
            return Err(InvalidRotation(recipe.rotation));
        }
        let mut state = AdjustmentState {
            filters: recipe.filters,
            rotation: recipe.rotation.rem_euclid(360),
            flip_x: recipe.flip_x,
            flip_y: recipe.flip_y,
            ..AdjustmentState::default()
        };
        state.set_continuous(Continuous::Brightness, recipe.brightness);
        state.set_continuous(Continuous::Contrast, recipe.contrast);
        state.set_continuous(Continuous::Saturation, recipe.saturation);
        state.set_continuous(Continuous::Hue, recipe.hue);
        state.set_continuous(Continuous::Blur, recipe.blur);
        Ok(state)
    }
}
