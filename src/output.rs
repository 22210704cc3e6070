//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Chain
//!
//! ```text
//! Filters
//!     brightness(125%)
//!     contrast(100%)
//!     saturate(100%)
//!     hue-rotate(0deg)
//!     blur(0px)
//!     sepia(100%)
//! Transform
//!     Rotation: 90°
//!     Flip: horizontal
//! CSS: brightness(125%) contrast(100%) saturate(100%) hue-rotate(0deg) blur(0px) sepia(100%)
//! ```
//!
//! ## Apply
//!
//! ```text
//! photo.jpg (1920x1080)
//!     Canvas: 1920x1080
//!     Fit: 1920x1080 at (0, 0)
//!     Filters: brightness(125%) contrast(100%) ...
//!     Rotation: 90°
//!     Flip: none
//! Exported edited-image.png → out (48213 bytes)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::adjust::AdjustmentState;
use crate::editor::Exported;
use crate::imaging::RenderPlan;
use crate::viewport::Viewport;
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn flip_label(flip_x: bool, flip_y: bool) -> &'static str {
    match (flip_x, flip_y) {
        (false, false) => "none",
        (true, false) => "horizontal",
        (false, true) => "vertical",
        (true, true) => "horizontal, vertical",
    }
}

// ============================================================================
// Chain
// ============================================================================

/// Format the filter chain and transform of `state`.
pub fn format_chain_output(state: &AdjustmentState) -> Vec<String> {
    let chain = state.filter_chain();
    let mut lines = vec!["Filters".to_string()];
    for effect in chain.effects() {
        lines.push(format!("{}{}", indent(1), effect));
    }
    lines.push("Transform".to_string());
    lines.push(format!(
        "{}Rotation: {}°",
        indent(1),
        state.normalized_rotation()
    ));
    lines.push(format!(
        "{}Flip: {}",
        indent(1),
        flip_label(state.flip_x(), state.flip_y())
    ));
    lines.push(format!("CSS: {}", chain.to_css()));
    lines
}

pub fn print_chain_output(state: &AdjustmentState) {
    for line in format_chain_output(state) {
        println!("{}", line);
    }
}

// ============================================================================
// Apply
// ============================================================================

/// Format the result of a headless `apply` session.
///
/// `plan` is `None` when nothing was drawn; `exported` is `None` when the
/// export was skipped.
pub fn format_apply_output(
    input: &Path,
    image_dims: (u32, u32),
    viewport: Viewport,
    plan: Option<&RenderPlan>,
    exported: Option<&Exported>,
    output_dir: &Path,
) -> Vec<String> {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    let mut lines = vec![format!("{} ({}x{})", name, image_dims.0, image_dims.1)];
    lines.push(format!(
        "{}Canvas: {}x{}",
        indent(1),
        viewport.width(),
        viewport.height()
    ));

    if let Some(plan) = plan {
        let (fit_w, fit_h) = plan.fit.pixel_size();
        lines.push(format!(
            "{}Fit: {}x{} at ({}, {})",
            indent(1),
            fit_w,
            fit_h,
            plan.fit.x.round(),
            plan.fit.y.round()
        ));
        lines.push(format!("{}Filters: {}", indent(1), plan.chain));
        lines.push(format!("{}Rotation: {}°", indent(1), plan.rotation_degrees));
        lines.push(format!(
            "{}Flip: {}",
            indent(1),
            flip_label(plan.flip_x, plan.flip_y)
        ));
    }

    match exported {
        Some(e) => lines.push(format!(
            "Exported {} → {} ({} bytes)",
            e.file_name,
            output_dir.display(),
            e.bytes
        )),
        None => lines.push("Nothing to export".to_string()),
    }
    lines
}

pub fn print_apply_output(
    input: &Path,
    image_dims: (u32, u32),
    viewport: Viewport,
    plan: Option<&RenderPlan>,
    exported: Option<&Exported>,
    output_dir: &Path,
) {
    for line in format_apply_output(input, image_dims, viewport, plan, exported, output_dir) {
        println!("{}", line);
    }
}
