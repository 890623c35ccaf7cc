use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use image::RgbaImage;

use super::VideoSink;
use crate::error::{BlendError, BlendResult};

/// MP4 sink backed by the system `ffmpeg` binary.
///
/// Frames are streamed to ffmpeg's stdin as raw RGBA and encoded as
/// yuv420p H.264 with faststart. Using the system binary avoids native
/// FFmpeg dev header/lib requirements. The output file is overwritten
/// if it already exists.
pub struct FfmpegSink {
    out_path: PathBuf,
}

impl FfmpegSink {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
        }
    }
}

impl VideoSink for FfmpegSink {
    fn encode(&mut self, frames: &[RgbaImage], fps: u32) -> BlendResult<()> {
        let (width, height) = validate_sequence(frames, fps)?;

        ensure_parent_dir(&self.out_path)?;

        if !is_ffmpeg_on_path() {
            return Err(BlendError::encoding(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        tracing::info!(
            "Encoding {} frames at {}x{}, {} fps, to {}",
            frames.len(),
            width,
            height,
            fps,
            self.out_path.display()
        );

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        cmd.arg("-y")
            .args([
                "-loglevel",
                "error",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "-s",
                &format!("{width}x{height}"),
                "-r",
                &fps.to_string(),
                "-i",
                "pipe:0",
                "-an",
                "-c:v",
                "libx264",
                "-pix_fmt",
                "yuv420p",
                "-movflags",
                "+faststart",
            ])
            .arg(&self.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            BlendError::encoding(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| BlendError::encoding("failed to open ffmpeg stdin"))?;

        for (index, frame) in frames.iter().enumerate() {
            stdin.write_all(frame.as_raw()).map_err(|e| {
                BlendError::encoding(format!("failed to write frame {index} to ffmpeg stdin: {e}"))
            })?;
        }
        drop(stdin);

        let output = child
            .wait_with_output()
            .map_err(|e| BlendError::encoding(format!("failed to wait for ffmpeg: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BlendError::encoding(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

/// Check the whole sequence before spawning anything: encoding is the
/// expensive final stage and a bad frame must fail it immediately.
fn validate_sequence(frames: &[RgbaImage], fps: u32) -> BlendResult<(u32, u32)> {
    let first = frames
        .first()
        .ok_or_else(|| BlendError::invalid_input("cannot encode an empty frame sequence"))?;
    if fps == 0 {
        return Err(BlendError::invalid_input("frame rate must be non-zero"));
    }

    let (width, height) = first.dimensions();
    if width == 0 || height == 0 {
        return Err(BlendError::encoding(format!(
            "frame size {width}x{height} must be non-zero"
        )));
    }
    if width % 2 != 0 || height % 2 != 0 {
        return Err(BlendError::encoding(format!(
            "frame size {width}x{height} must be even for yuv420p output"
        )));
    }

    for (index, frame) in frames.iter().enumerate() {
        if frame.dimensions() != (width, height) {
            return Err(BlendError::encoding(format!(
                "frame {index} is {}x{}, expected {width}x{height}",
                frame.width(),
                frame.height()
            )));
        }
    }

    Ok((width, height))
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn ensure_parent_dir(path: &Path) -> BlendResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                BlendError::invalid_input(format!(
                    "failed to create output directory '{}': {e}",
                    parent.display()
                ))
            })?;
        }
    }
    Ok(())
}
