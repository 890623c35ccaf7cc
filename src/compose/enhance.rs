use image::{imageops, RgbaImage};
use rand::rngs::StdRng;
use rand::Rng;

/// Bounds of the brightness and contrast draws. The band is narrow so
/// the object varies between renders without visibly changing palette.
pub const TONE_MIN: f32 = 0.9;
pub const TONE_MAX: f32 = 1.1;

/// Sigma of the softening blur applied after the tonal adjustments.
pub const SOFTEN_SIGMA: f32 = 0.5;

/// Tonally match a cutout to its scene: scale brightness and contrast
/// by factors drawn from [0.9, 1.1], then soften the whole layer with
/// a light Gaussian blur to knock down matting artifacts at the edges.
///
/// Dimensions are preserved. The blur runs over all four channels, so
/// hard alpha edges come out slightly feathered.
pub fn enhance_object(cutout: &RgbaImage, rng: &mut StdRng) -> RgbaImage {
    let brightness = rng.random_range(TONE_MIN..=TONE_MAX);
    let contrast = rng.random_range(TONE_MIN..=TONE_MAX);
    tracing::debug!(
        "Enhance: brightness {:.3}, contrast {:.3}",
        brightness,
        contrast
    );

    let mut adjusted = cutout.clone();
    scale_brightness(&mut adjusted, brightness);
    scale_contrast(&mut adjusted, contrast);
    imageops::blur(&adjusted, SOFTEN_SIGMA)
}

/// Multiply the color channels by `factor`, leaving alpha untouched.
fn scale_brightness(image: &mut RgbaImage, factor: f32) {
    for pixel in image.pixels_mut() {
        for i in 0..3 {
            let scaled = pixel[i] as f32 * factor;
            pixel[i] = scaled.clamp(0.0, 255.0) as u8;
        }
    }
}

/// Spread the color channels away from (factor > 1) or toward
/// (factor < 1) the image's mean luminance, leaving alpha untouched.
fn scale_contrast(image: &mut RgbaImage, factor: f32) {
    let mean = mean_luminance(image);
    for pixel in image.pixels_mut() {
        for i in 0..3 {
            let val = pixel[i] as f32;
            let spread = mean + (val - mean) * factor;
            pixel[i] = spread.clamp(0.0, 255.0) as u8;
        }
    }
}

/// Mean ITU-R 601-2 luminance (0.299*R + 0.587*G + 0.114*B) over every
/// pixel, alpha ignored.
fn mean_luminance(image: &RgbaImage) -> f32 {
    let mut sum = 0.0f64;
    for pixel in image.pixels() {
        let luma =
            0.299 * pixel[0] as f32 + 0.587 * pixel[1] as f32 + 0.114 * pixel[2] as f32;
        sum += luma as f64;
    }
    let count = (image.width() as u64 * image.height() as u64).max(1);
    (sum / count as f64) as f32
}
