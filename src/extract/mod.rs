mod onnx;
mod passthrough;

pub use onnx::OnnxExtractor;
pub use passthrough::AlphaPassthrough;

use image::RgbaImage;

use crate::error::BlendResult;

/// Trait for object extraction backends
pub trait ObjectExtractor {
    /// Decode raw image bytes and return the object as an RGBA cutout
    /// whose alpha channel carries the matte
    fn extract(&mut self, bytes: &[u8]) -> BlendResult<RgbaImage>;
}
