use image::imageops::{self, FilterType};
use image::RgbaImage;
use rand::rngs::StdRng;

use crate::compose;
use crate::error::{BlendError, BlendResult};
use crate::synth::BackgroundSynthesizer;

/// Zoom factor for frame `index` of `total`: starts at 1.0 and walks
/// linearly to just under 2.0.
pub fn zoom_factor(index: u32, total: u32) -> f64 {
    1.0 + index as f64 / total as f64
}

/// Snap a dimension down to the previous multiple of 8.
pub fn snap8(value: u32) -> u32 {
    (value / 8) * 8
}

/// Generation size for a frame: the base size scaled by `zoom`, each
/// axis snapped down to the diffusion grid.
pub fn frame_dimensions(base_width: u32, base_height: u32, zoom: f64) -> (u32, u32) {
    (
        snap8((base_width as f64 * zoom) as u32),
        snap8((base_height as f64 * zoom) as u32),
    )
}

/// Object scale for a frame: sized against a quarter of the frame
/// width, then grown with the zoom.
pub fn object_scale(frame_width: u32, cutout_width: u32, zoom: f64) -> f64 {
    (frame_width as f64 / 4.0) / cutout_width as f64 * zoom
}

/// Anchor for a frame: the scene anchor pushed outward with the zoom,
/// truncated toward zero. Late frames may push the object past the
/// canvas edge; the composite clips it there.
pub fn frame_placement(frame_width: u32, frame_height: u32, zoom: f64) -> (i64, i64) {
    (
        (frame_width as f64 * compose::ANCHOR_X_FRACTION * zoom) as i64,
        (frame_height as f64 * compose::ANCHOR_Y_FRACTION * zoom) as i64,
    )
}

/// Render the zoom-out sequence: one freshly generated background per
/// frame, the cutout refit against the frame's scale box and
/// re-composited on each, and every frame resized back to the base size
/// so the whole sequence encodes at one resolution.
pub fn render_frames(
    synthesizer: &mut dyn BackgroundSynthesizer,
    cutout: &RgbaImage,
    prompt: &str,
    base_width: u32,
    base_height: u32,
    num_frames: u32,
    rng: &mut StdRng,
) -> BlendResult<Vec<RgbaImage>> {
    if num_frames == 0 {
        return Err(BlendError::invalid_input("frame count must be non-zero"));
    }
    if cutout.width() == 0 || cutout.height() == 0 {
        return Err(BlendError::invalid_input("cutout is empty"));
    }

    let mut frames = Vec::with_capacity(num_frames as usize);

    for index in 0..num_frames {
        let zoom = zoom_factor(index, num_frames);
        let (frame_width, frame_height) = frame_dimensions(base_width, base_height, zoom);

        tracing::info!(
            "Frame {}/{}: zoom {:.3}, scene {}x{}",
            index + 1,
            num_frames,
            zoom,
            frame_width,
            frame_height
        );

        let mut frame = synthesizer.generate(prompt, frame_width, frame_height)?;

        let scale = object_scale(frame_width, cutout.width(), zoom);
        let placement = frame_placement(frame_width, frame_height, zoom);
        compose::composite_scaled(&mut frame, cutout, scale, placement, rng)?;

        let frame = if frame.dimensions() == (base_width, base_height) {
            frame
        } else {
            imageops::resize(&frame, base_width, base_height, FilterType::Lanczos3)
        };
        frames.push(frame);
    }

    Ok(frames)
}
