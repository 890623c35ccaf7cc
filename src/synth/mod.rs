mod backdrop;
mod sd_webui;

pub use backdrop::GradientBackdrop;
pub use sd_webui::SdWebuiSynthesizer;

use image::RgbaImage;

use crate::error::BlendResult;

/// Trait for background generation backends
pub trait BackgroundSynthesizer {
    /// Produce an RGBA background of exactly `width` x `height` matching
    /// the text prompt
    fn generate(&mut self, prompt: &str, width: u32, height: u32) -> BlendResult<RgbaImage>;
}
