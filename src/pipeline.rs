use std::path::Path;

use image::RgbaImage;
use rand::rngs::StdRng;

use crate::compose;
use crate::error::{BlendError, BlendResult};
use crate::extract::ObjectExtractor;
use crate::synth::BackgroundSynthesizer;
use crate::video::{self, VideoSink};

/// Base scene size: the still output resolution and the video's
/// first-frame generation size.
pub const BASE_WIDTH: u32 = 768;
pub const BASE_HEIGHT: u32 = 512;

/// Video defaults
pub const DEFAULT_FRAMES: u32 = 60;
pub const DEFAULT_FPS: u32 = 24;

/// Produce a single composited still: extract the object, generate one
/// base-size background, blend them, and save to `output` with the
/// format inferred from its extension.
pub fn generate_still(
    extractor: &mut dyn ObjectExtractor,
    synthesizer: &mut dyn BackgroundSynthesizer,
    input: &Path,
    prompt: &str,
    output: &Path,
    rng: &mut StdRng,
) -> BlendResult<()> {
    let cutout = load_cutout(extractor, input)?;

    let mut background = synthesizer.generate(prompt, BASE_WIDTH, BASE_HEIGHT)?;
    compose::composite_fit(&mut background, &cutout, rng)?;

    background.save(output).map_err(|e| {
        BlendError::invalid_input(format!("failed to save '{}': {e}", output.display()))
    })?;

    tracing::info!("Wrote {}", output.display());
    Ok(())
}

/// Produce the zoom-out video: extract the object once, render
/// `num_frames` freshly generated scenes, and hand the sequence to the
/// sink. Frame count and rate are checked before any expensive work.
pub fn generate_video(
    extractor: &mut dyn ObjectExtractor,
    synthesizer: &mut dyn BackgroundSynthesizer,
    sink: &mut dyn VideoSink,
    input: &Path,
    prompt: &str,
    num_frames: u32,
    fps: u32,
    rng: &mut StdRng,
) -> BlendResult<()> {
    if num_frames == 0 {
        return Err(BlendError::invalid_input("frame count must be non-zero"));
    }
    if fps == 0 {
        return Err(BlendError::invalid_input("frame rate must be non-zero"));
    }

    let cutout = load_cutout(extractor, input)?;

    let frames = video::render_frames(
        synthesizer,
        &cutout,
        prompt,
        BASE_WIDTH,
        BASE_HEIGHT,
        num_frames,
        rng,
    )?;

    sink.encode(&frames, fps)
}

fn load_cutout(extractor: &mut dyn ObjectExtractor, input: &Path) -> BlendResult<RgbaImage> {
    let bytes = std::fs::read(input).map_err(|e| {
        BlendError::invalid_input(format!(
            "cannot read object image '{}': {e}",
            input.display()
        ))
    })?;

    let cutout = extractor.extract(&bytes)?;
    tracing::info!(
        "Extracted {}x{} cutout from {}",
        cutout.width(),
        cutout.height(),
        input.display()
    );
    Ok(cutout)
}
