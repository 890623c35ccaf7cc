use image::RgbaImage;

use super::ObjectExtractor;
use crate::error::{BlendError, BlendResult};

/// Extractor that keeps the image's own alpha channel as the matte.
///
/// Used when no matting model is configured: pre-cut PNGs pass through
/// unchanged, while fully opaque inputs composite as a solid block.
pub struct AlphaPassthrough;

impl ObjectExtractor for AlphaPassthrough {
    fn extract(&mut self, bytes: &[u8]) -> BlendResult<RgbaImage> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| BlendError::invalid_input(format!("unreadable object image: {e}")))?;
        let cutout = decoded.to_rgba8();

        if cutout.pixels().all(|p| p[3] == 255) {
            tracing::warn!(
                "Object image has no transparency; the full rectangle will be pasted"
            );
        }

        Ok(cutout)
    }
}
