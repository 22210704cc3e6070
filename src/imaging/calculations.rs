//! Pure geometry for the renderer.
//!
//! All functions here are pure and testable without any surface or pixels.

/// Destination rectangle of the fitted image, in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FitRect {
    /// Width and height rounded to whole pixels (at least 1 when non-empty).
    pub fn pixel_size(&self) -> (u32, u32) {
        let round = |v: f64| if v <= 0.0 { 0 } else { v.round().max(1.0) as u32 };
        (round(self.width), round(self.height))
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }
}

/// Largest aspect-preserving rectangle for `image` inside `canvas`, centered.
///
/// With `ar = w / h`: a canvas wider than the image (`cw / ch > ar`) is
/// height-bound, otherwise width-bound.
///
/// # Examples
/// ```
/// # use retouch::imaging::calculate_fit_rect;
/// let fit = calculate_fit_rect((1920, 1080), (800, 600));
/// assert_eq!((fit.width, fit.height), (800.0, 450.0));
/// assert_eq!((fit.x, fit.y), (0.0, 75.0));
/// ```
pub fn calculate_fit_rect(image: (u32, u32), canvas: (u32, u32)) -> FitRect {
    let (img_w, img_h) = image;
    let (cw, ch) = (canvas.0 as f64, canvas.1 as f64);

    if img_w == 0 || img_h == 0 || cw <= 0.0 || ch <= 0.0 {
        return FitRect {
            x: cw / 2.0,
            y: ch / 2.0,
            width: 0.0,
            height: 0.0,
        };
    }

    let ar = img_w as f64 / img_h as f64;
    let (width, height) = if cw / ch > ar {
        // Canvas is wider: height matches
        (ch * ar, ch)
    } else {
        // Canvas is taller (or same shape): width matches
        (cw, cw / ar)
    };

    FitRect {
        x: (cw - width) / 2.0,
        y: (ch - height) / 2.0,
        width,
        height,
    }
}

/// Map an accumulated rotation into `[0, 360)`.
pub fn normalize_rotation(degrees: i64) -> i64 {
    degrees.rem_euclid(360)
}

/// `(sin, cos)` of an angle, snapped to exact values near quarter turns.
///
/// `cos(π/2)` is ~6e-17 in floating point; left alone it nudges sample
/// positions that land on pixel boundaries and breaks pixel-exact quarter
/// turns.
pub fn snapped_sin_cos(radians: f64) -> (f64, f64) {
    const EPS: f64 = 1e-12;
    let snap = |v: f64| {
        if v.abs() < EPS {
            0.0
        } else if (v - 1.0).abs() < EPS {
            1.0
        } else if (v + 1.0).abs() < EPS {
            -1.0
        } else {
            v
        }
    };
    let (sin, cos) = radians.sin_cos();
    (snap(sin), snap(cos))
}
