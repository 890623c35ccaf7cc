mod ffmpeg;
mod sequencer;

pub use ffmpeg::{is_ffmpeg_on_path, FfmpegSink};
pub use sequencer::{
    frame_dimensions, frame_placement, object_scale, render_frames, snap8, zoom_factor,
};

use image::RgbaImage;

use crate::error::BlendResult;

/// Trait for encoded-video destinations
pub trait VideoSink {
    /// Encode an ordered sequence of same-size RGBA frames at `fps`
    fn encode(&mut self, frames: &[RgbaImage], fps: u32) -> BlendResult<()>;
}
