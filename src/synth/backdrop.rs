use image::{Rgba, RgbaImage};

use super::BackgroundSynthesizer;
use crate::error::{BlendError, BlendResult};

/// Gradient colors, sky band down to floor band.
const TOP: [u8; 3] = [168, 186, 205];
const BOTTOM: [u8; 3] = [94, 84, 74];

/// Offline stand-in for the text-to-image service: paints a vertical
/// gradient at the ordered size. The prompt is only logged, so renders
/// are fully deterministic.
pub struct GradientBackdrop;

impl BackgroundSynthesizer for GradientBackdrop {
    fn generate(&mut self, prompt: &str, width: u32, height: u32) -> BlendResult<RgbaImage> {
        if width == 0 || height == 0 {
            return Err(BlendError::invalid_input(format!(
                "background of {width}x{height} cannot be generated"
            )));
        }

        tracing::info!(
            "Painting {}x{} fallback backdrop (prompt ignored: \"{}\")",
            width,
            height,
            prompt
        );

        let denom = (height - 1).max(1) as f32;
        Ok(RgbaImage::from_fn(width, height, |_, y| {
            let t = y as f32 / denom;
            let mix =
                |a: u8, b: u8| -> u8 { (a as f32 + (b as f32 - a as f32) * t).round() as u8 };
            Rgba([
                mix(TOP[0], BOTTOM[0]),
                mix(TOP[1], BOTTOM[1]),
                mix(TOP[2], BOTTOM[2]),
                255,
            ])
        }))
    }
}
