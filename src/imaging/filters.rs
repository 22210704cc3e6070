//! Typed filter chain and its pixel implementation.
//!
//! A [`FilterChain`] is an ordered list of [`FilterEffect`]s. It has two
//! renderings: [`FilterChain::to_css`] produces the familiar
//! `brightness(120%) blur(2px)` text (logs, CLI output), and [`apply_chain`]
//! runs the effects over an RGBA buffer.
//!
//! Color math works directly on sRGB channel values in `[0, 1]` using the
//! Filter Effects color matrices. Each step clamps before the next one runs.
//! Steps that are identity for their parameter are skipped, so an identity
//! chain leaves pixels bit-for-bit untouched.

use image::RgbaImage;
use image::imageops;
use rayon::prelude::*;
use std::fmt;

/// One named, parameterized effect.
///
/// Percent-valued effects use 100 as "unchanged" for brightness, contrast and
/// saturate, and 0 as "off" for grayscale, sepia and invert.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterEffect {
    Brightness(f32),
    Contrast(f32),
    Saturate(f32),
    /// Degrees.
    HueRotate(f32),
    /// Gaussian standard deviation in pixels.
    Blur(f32),
    Grayscale(f32),
    Sepia(f32),
    Invert(f32),
}

impl FilterEffect {
    pub fn to_css(&self) -> String {
        match self {
            FilterEffect::Brightness(p) => format!("brightness({p}%)"),
            FilterEffect::Contrast(p) => format!("contrast({p}%)"),
            FilterEffect::Saturate(p) => format!("saturate({p}%)"),
            FilterEffect::HueRotate(deg) => format!("hue-rotate({deg}deg)"),
            FilterEffect::Blur(px) => format!("blur({px}px)"),
            FilterEffect::Grayscale(p) => format!("grayscale({p}%)"),
            FilterEffect::Sepia(p) => format!("sepia({p}%)"),
            FilterEffect::Invert(p) => format!("invert({p}%)"),
        }
    }

    /// True when applying this effect cannot change any pixel.
    pub fn is_identity(&self) -> bool {
        match *self {
            FilterEffect::Brightness(p) | FilterEffect::Contrast(p) | FilterEffect::Saturate(p) => {
                p == 100.0
            }
            FilterEffect::HueRotate(deg) => deg.rem_euclid(360.0) == 0.0,
            FilterEffect::Blur(px) => px <= 0.0,
            FilterEffect::Grayscale(p) | FilterEffect::Sepia(p) | FilterEffect::Invert(p) => {
                p <= 0.0
            }
        }
    }

    /// Per-pixel form of the effect, or `None` for neighbourhood effects.
    fn color_op(&self) -> Option<ColorOp> {
        let op = match *self {
            FilterEffect::Brightness(p) => {
                let a = (p / 100.0).max(0.0);
                ColorOp::Linear { slope: a, intercept: 0.0 }
            }
            FilterEffect::Contrast(p) => {
                let a = (p / 100.0).max(0.0);
                ColorOp::Linear { slope: a, intercept: 0.5 - 0.5 * a }
            }
            FilterEffect::Saturate(p) => ColorOp::Matrix(saturate_matrix((p / 100.0).max(0.0))),
            FilterEffect::HueRotate(deg) => ColorOp::Matrix(hue_rotate_matrix(deg)),
            FilterEffect::Grayscale(p) => ColorOp::Matrix(grayscale_matrix(unit_amount(p))),
            FilterEffect::Sepia(p) => ColorOp::Matrix(sepia_matrix(unit_amount(p))),
            FilterEffect::Invert(p) => {
                let a = unit_amount(p);
                ColorOp::Linear { slope: 1.0 - 2.0 * a, intercept: a }
            }
            FilterEffect::Blur(_) => return None,
        };
        Some(op)
    }
}

impl fmt::Display for FilterEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

/// Ordered sequence of effects applied cumulatively in a single draw.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterChain {
    effects: Vec<FilterEffect>,
}

impl FilterChain {
    pub fn new(effects: Vec<FilterEffect>) -> Self {
        Self { effects }
    }

    pub fn effects(&self) -> &[FilterEffect] {
        &self.effects
    }

    pub fn is_identity(&self) -> bool {
        self.effects.iter().all(FilterEffect::is_identity)
    }

    /// Space-separated CSS filter text; `none` for an empty chain.
    pub fn to_css(&self) -> String {
        if self.effects.is_empty() {
            return "none".to_string();
        }
        self.effects
            .iter()
            .map(FilterEffect::to_css)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

type Matrix3 = [[f32; 3]; 3];

#[derive(Debug, Clone, Copy, PartialEq)]
enum ColorOp {
    /// `c' = slope * c + intercept` on every color channel.
    Linear { slope: f32, intercept: f32 },
    Matrix(Matrix3),
}

impl ColorOp {
    #[inline]
    fn apply(&self, rgb: [f32; 3]) -> [f32; 3] {
        match self {
            ColorOp::Linear { slope, intercept } => {
                rgb.map(|c| slope.mul_add(c, *intercept).clamp(0.0, 1.0))
            }
            ColorOp::Matrix(m) => {
                let [r, g, b] = rgb;
                [
                    (m[0][0] * r + m[0][1] * g + m[0][2] * b).clamp(0.0, 1.0),
                    (m[1][0] * r + m[1][1] * g + m[1][2] * b).clamp(0.0, 1.0),
                    (m[2][0] * r + m[2][1] * g + m[2][2] * b).clamp(0.0, 1.0),
                ]
            }
        }
    }
}

fn unit_amount(percent: f32) -> f32 {
    (percent / 100.0).clamp(0.0, 1.0)
}

fn saturate_matrix(s: f32) -> Matrix3 {
    [
        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
    ]
}

fn hue_rotate_matrix(degrees: f32) -> Matrix3 {
    let (sin, cos) = degrees.to_radians().sin_cos();
    [
        [
            0.213 + cos * 0.787 - sin * 0.213,
            0.715 - cos * 0.715 - sin * 0.715,
            0.072 - cos * 0.072 + sin * 0.928,
        ],
        [
            0.213 - cos * 0.213 + sin * 0.143,
            0.715 + cos * 0.285 + sin * 0.140,
            0.072 - cos * 0.072 - sin * 0.283,
        ],
        [
            0.213 - cos * 0.213 - sin * 0.787,
            0.715 - cos * 0.715 + sin * 0.715,
            0.072 + cos * 0.928 + sin * 0.072,
        ],
    ]
}

fn grayscale_matrix(amount: f32) -> Matrix3 {
    let t = 1.0 - amount;
    [
        [0.2126 + 0.7874 * t, 0.7152 - 0.7152 * t, 0.0722 - 0.0722 * t],
        [0.2126 - 0.2126 * t, 0.7152 + 0.2848 * t, 0.0722 - 0.0722 * t],
        [0.2126 - 0.2126 * t, 0.7152 - 0.7152 * t, 0.0722 + 0.9278 * t],
    ]
}

fn sepia_matrix(amount: f32) -> Matrix3 {
    let t = 1.0 - amount;
    [
        [0.393 + 0.607 * t, 0.769 - 0.769 * t, 0.189 - 0.189 * t],
        [0.349 - 0.349 * t, 0.686 + 0.314 * t, 0.168 - 0.168 * t],
        [0.272 - 0.272 * t, 0.534 - 0.534 * t, 0.131 + 0.869 * t],
    ]
}

/// Run every effect of `chain` over `image` in order. Alpha is preserved by
/// the color effects; blur spreads it like any other channel.
pub fn apply_chain(image: &mut RgbaImage, chain: &FilterChain) {
    let mut pending: Vec<ColorOp> = Vec::new();
    for effect in chain.effects().iter().filter(|e| !e.is_identity()) {
        match effect.color_op() {
            Some(op) => pending.push(op),
            None => {
                apply_color_ops(image, &pending);
                pending.clear();
                if let FilterEffect::Blur(sigma) = *effect {
                    *image = imageops::blur(&*image, sigma);
                }
            }
        }
    }
    apply_color_ops(image, &pending);
}

/// Apply a run of per-pixel ops in a single pass over the buffer.
fn apply_color_ops(image: &mut RgbaImage, ops: &[ColorOp]) {
    if ops.is_empty() {
        return;
    }
    let raw: &mut [u8] = image;
    raw.par_chunks_exact_mut(4).for_each(|px| {
        let mut rgb = [
            f32::from(px[0]) / 255.0,
            f32::from(px[1]) / 255.0,
            f32::from(px[2]) / 255.0,
        ];
        for op in ops {
            rgb = op.apply(rgb);
        }
        px[0] = unit_to_u8(rgb[0]);
        px[1] = unit_to_u8(rgb[1]);
        px[2] = unit_to_u8(rgb[2]);
    });
}

#[inline]
fn unit_to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn single_pixel(rgba: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(1, 1, Rgba(rgba))
    }

    fn run(effects: Vec<FilterEffect>, rgba: [u8; 4]) -> [u8; 4] {
        let mut img = single_pixel(rgba);
        apply_chain(&mut img, &FilterChain::new(effects));
        img.get_pixel(0, 0).0
    }

    #[test]
    fn css_text_for_each_effect() {
        assert_eq!(FilterEffect::Brightness(150.0).to_css(), "brightness(150%)");
        assert_eq!(FilterEffect::HueRotate(90.0).to_css(), "hue-rotate(90deg)");
        assert_eq!(FilterEffect::Blur(2.5).to_css(), "blur(2.5px)");
        assert_eq!(FilterEffect::Invert(100.0).to_css(), "invert(100%)");
    }

    #[test]
    fn empty_chain_serializes_as_none() {
        assert_eq!(FilterChain::default().to_css(), "none");
        assert!(FilterChain::default().is_identity());
    }

    #[test]
    fn identity_chain_leaves_pixels_untouched() {
        let chain = FilterChain::new(vec![
            FilterEffect::Brightness(100.0),
            FilterEffect::Contrast(100.0),
            FilterEffect::Saturate(100.0),
            FilterEffect::HueRotate(360.0),
            FilterEffect::Blur(0.0),
        ]);
        let mut img = RgbaImage::from_fn(4, 3, |x, y| Rgba([x as u8 * 60, y as u8 * 80, 17, 200]));
        let before = img.clone();
        apply_chain(&mut img, &chain);
        assert_eq!(img, before);
    }

    #[test]
    fn brightness_scales_channels() {
        assert_eq!(run(vec![FilterEffect::Brightness(50.0)], [200, 100, 50, 255]), [100, 50, 25, 255]);
        assert_eq!(run(vec![FilterEffect::Brightness(200.0)], [200, 100, 0, 255]), [255, 200, 0, 255]);
    }

    #[test]
    fn zero_contrast_collapses_to_mid_gray() {
        assert_eq!(run(vec![FilterEffect::Contrast(0.0)], [10, 240, 77, 255]), [128, 128, 128, 255]);
    }

    #[test]
    fn invert_flips_channels_and_keeps_alpha() {
        assert_eq!(run(vec![FilterEffect::Invert(100.0)], [0, 100, 255, 42]), [255, 155, 0, 42]);
    }

    #[test]
    fn grayscale_equalizes_channels() {
        let [r, g, b, a] = run(vec![FilterEffect::Grayscale(100.0)], [200, 30, 90, 255]);
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert_eq!(a, 255);
    }

    #[test]
    fn sepia_of_white_is_clamped_warm_tone() {
        // Rows sum to 1.351, 1.203 and 0.937 of white.
        assert_eq!(run(vec![FilterEffect::Sepia(100.0)], [255, 255, 255, 255]), [255, 255, 239, 255]);
    }

    #[test]
    fn zero_saturation_matches_luminance_gray() {
        let [r, g, b, _] = run(vec![FilterEffect::Saturate(0.0)], [255, 0, 0, 255]);
        assert_eq!((r, g, b), (54, 54, 54));
    }

    #[test]
    fn hue_rotate_keeps_grays_gray() {
        assert_eq!(run(vec![FilterEffect::HueRotate(120.0)], [128, 128, 128, 255]), [128, 128, 128, 255]);
    }

    #[test]
    fn effects_apply_in_chain_order() {
        // invert then darken differs from darken then invert
        let a = run(
            vec![FilterEffect::Invert(100.0), FilterEffect::Brightness(50.0)],
            [0, 0, 0, 255],
        );
        let b = run(
            vec![FilterEffect::Brightness(50.0), FilterEffect::Invert(100.0)],
            [0, 0, 0, 255],
        );
        assert_eq!(a, [128, 128, 128, 255]);
        assert_eq!(b, [255, 255, 255, 255]);
    }

    #[test]
    fn blur_softens_a_hard_edge() {
        let mut img = RgbaImage::from_fn(9, 1, |x, _| {
            if x < 4 { Rgba([0, 0, 0, 255]) } else { Rgba([255, 255, 255, 255]) }
        });
        apply_chain(&mut img, &FilterChain::new(vec![FilterEffect::Blur(2.0)]));
        let edge = img.get_pixel(4, 0).0[0];
        assert!(edge > 0 && edge < 255, "edge pixel should be mixed, got {edge}");
    }

    #[test]
    fn identity_detection() {
        assert!(FilterEffect::HueRotate(720.0).is_identity());
        assert!(!FilterEffect::HueRotate(1.0).is_identity());
        assert!(FilterEffect::Grayscale(0.0).is_identity());
        assert!(!FilterEffect::Contrast(200.0).is_identity());
    }
}
