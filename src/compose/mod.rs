mod enhance;
mod shadow;

pub use enhance::{enhance_object, SOFTEN_SIGMA, TONE_MAX, TONE_MIN};
pub use shadow::{cast_shadow, shadow_layer, SHADOW_ALPHA, SHADOW_OFFSET, SHADOW_SIGMA};

use image::imageops::{self, FilterType};
use image::RgbaImage;
use rand::rngs::StdRng;

use crate::error::{BlendError, BlendResult};

/// The object's fit box is a square of side background_width / 4.
pub const FIT_DIVISOR: u32 = 4;

/// Scene anchor as fractions of the background size.
pub const ANCHOR_X_FRACTION: f64 = 0.7;
pub const ANCHOR_Y_FRACTION: f64 = 0.6;

/// Top-left anchor for the object in a scene of the given size,
/// truncated toward zero.
pub fn scene_placement(width: u32, height: u32) -> (i64, i64) {
    (
        (width as f64 * ANCHOR_X_FRACTION) as i64,
        (height as f64 * ANCHOR_Y_FRACTION) as i64,
    )
}

/// Side of the square fit box for a background of the given width.
pub fn fit_box(width: u32) -> u32 {
    width / FIT_DIVISOR
}

/// Shrink `cutout` to fit inside `max_w` x `max_h`, preserving aspect
/// ratio. Never upscales; a cutout already inside the box comes back
/// unchanged.
pub fn fit_within(cutout: &RgbaImage, max_w: u32, max_h: u32) -> RgbaImage {
    let (w, h) = cutout.dimensions();
    if w <= max_w && h <= max_h {
        return cutout.clone();
    }
    let ratio = (max_w as f64 / w as f64).min(max_h as f64 / h as f64);
    let new_w = ((w as f64 * ratio) as u32).max(1);
    let new_h = ((h as f64 * ratio) as u32).max(1);
    imageops::resize(cutout, new_w, new_h, FilterType::Lanczos3)
}

/// Composite `cutout` onto `background` at the scene anchor, fitting it
/// into the square fit box first. The background is mutated in place
/// and keeps its dimensions.
pub fn composite_fit(
    background: &mut RgbaImage,
    cutout: &RgbaImage,
    rng: &mut StdRng,
) -> BlendResult<()> {
    let side = fit_box(background.width());
    if side == 0 {
        return Err(BlendError::compositing(format!(
            "background of width {} leaves no room for the object",
            background.width()
        )));
    }
    let resized = fit_within(cutout, side, side);
    let placement = scene_placement(background.width(), background.height());
    paste_with_shadow(background, &resized, placement, rng);
    Ok(())
}

/// Composite `cutout` onto `background` at an explicit placement. The
/// scale factor sets the fit box as a multiple of the cutout's native
/// size; the resize is shrink-only, so a box larger than the cutout
/// leaves it at its native size.
pub fn composite_scaled(
    background: &mut RgbaImage,
    cutout: &RgbaImage,
    scale: f64,
    placement: (i64, i64),
    rng: &mut StdRng,
) -> BlendResult<()> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(BlendError::compositing(format!(
            "object scale factor {scale} is degenerate"
        )));
    }
    let box_w = ((cutout.width() as f64 * scale) as u32).max(1);
    let box_h = ((cutout.height() as f64 * scale) as u32).max(1);
    let resized = fit_within(cutout, box_w, box_h);
    paste_with_shadow(background, &resized, placement, rng);
    Ok(())
}

/// Shared tail of both composite paths: tonal enhancement, then the
/// soft shadow, then the alpha paste. Parts of the object or shadow
/// falling outside the canvas are clipped.
fn paste_with_shadow(
    background: &mut RgbaImage,
    resized: &RgbaImage,
    placement: (i64, i64),
    rng: &mut StdRng,
) {
    let enhanced = enhance_object(resized, rng);
    cast_shadow(background, enhanced.dimensions(), placement);
    imageops::overlay(background, &enhanced, placement.0, placement.1);
}
