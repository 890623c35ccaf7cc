use image::{imageops, Rgba, RgbaImage};

/// Fill of the shadow rectangle: black at partial opacity.
pub const SHADOW_ALPHA: u8 = 100;

/// Gaussian sigma used to soften the shadow rectangle.
pub const SHADOW_SIGMA: f32 = 5.0;

/// Fixed down-right offset of the shadow relative to the object.
pub const SHADOW_OFFSET: (i64, i64) = (5, 5);

/// Build a soft shadow layer matching an object of `width` x `height`.
///
/// The solid rectangle is blurred inside a transparent margin and then
/// cropped back to the requested size, so the border pixels genuinely
/// fade out instead of being clamped against the layer edge. Border
/// alpha lands strictly between 0 and [`SHADOW_ALPHA`].
pub fn shadow_layer(width: u32, height: u32) -> RgbaImage {
    let margin = (SHADOW_SIGMA * 3.0).ceil() as u32;
    let mut padded = RgbaImage::from_pixel(
        width + 2 * margin,
        height + 2 * margin,
        Rgba([0, 0, 0, 0]),
    );
    let rect = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, SHADOW_ALPHA]));
    imageops::replace(&mut padded, &rect, margin as i64, margin as i64);

    let blurred = imageops::blur(&padded, SHADOW_SIGMA);
    imageops::crop_imm(&blurred, margin, margin, width, height).to_image()
}

/// Stamp a soft shadow for an object of `size` placed at `placement`,
/// shifted down-right by [`SHADOW_OFFSET`]. The layer is alpha-blended
/// onto the background; parts falling outside the canvas are clipped.
pub fn cast_shadow(background: &mut RgbaImage, size: (u32, u32), placement: (i64, i64)) {
    let layer = shadow_layer(size.0, size.1);
    imageops::overlay(
        background,
        &layer,
        placement.0 + SHADOW_OFFSET.0,
        placement.1 + SHADOW_OFFSET.1,
    );
}
