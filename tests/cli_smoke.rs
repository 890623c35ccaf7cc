use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};

fn sceneblend_exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_sceneblend")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "sceneblend.exe"
            } else {
                "sceneblend"
            });
            p
        })
}

fn write_object(path: &Path) {
    let mut object = RgbaImage::from_pixel(80, 80, Rgba([0, 0, 0, 0]));
    for y in 10..70 {
        for x in 10..70 {
            object.put_pixel(x, y, Rgba([220, 40, 40, 255]));
        }
    }
    object.save(path).unwrap();
}

#[test]
fn cli_image_writes_png() {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();

    let input = dir.join("object.png");
    let output = dir.join("scene.png");
    let _ = std::fs::remove_file(&output);
    write_object(&input);

    let status = std::process::Command::new(sceneblend_exe())
        .args([
            "image",
            "--image",
            input.to_string_lossy().as_ref(),
            "--text-prompt",
            "a foggy harbor at dawn",
            "--output",
            output.to_string_lossy().as_ref(),
            "--seed",
            "7",
        ])
        .status()
        .unwrap();

    assert!(status.success());
    let scene = image::open(&output).unwrap().to_rgba8();
    assert_eq!(scene.dimensions(), (768, 512));
}

#[test]
fn cli_video_writes_mp4_when_ffmpeg_is_present() {
    if !sceneblend::video::is_ffmpeg_on_path() {
        eprintln!("ffmpeg not on PATH; skipping video smoke test");
        return;
    }

    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();

    let input = dir.join("object_video.png");
    let output = dir.join("scene.mp4");
    let _ = std::fs::remove_file(&output);
    write_object(&input);

    let status = std::process::Command::new(sceneblend_exe())
        .args([
            "video",
            "--image",
            input.to_string_lossy().as_ref(),
            "--text-prompt",
            "a foggy harbor at dawn",
            "--output",
            output.to_string_lossy().as_ref(),
            "--frames",
            "2",
            "--fps",
            "8",
            "--seed",
            "7",
        ])
        .status()
        .unwrap();

    assert!(status.success());
    let size = std::fs::metadata(&output).unwrap().len();
    assert!(size > 0, "encoded file is empty");
}

#[test]
fn cli_rejects_zero_frames() {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();

    let input = dir.join("object_zero.png");
    write_object(&input);

    let status = std::process::Command::new(sceneblend_exe())
        .args([
            "video",
            "--image",
            input.to_string_lossy().as_ref(),
            "--text-prompt",
            "x",
            "--output",
            dir.join("never.mp4").to_string_lossy().as_ref(),
            "--frames",
            "0",
        ])
        .status()
        .unwrap();

    assert!(!status.success());
}
