use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;

use sceneblend::extract::{AlphaPassthrough, OnnxExtractor};
use sceneblend::synth::{GradientBackdrop, SdWebuiSynthesizer};
use sceneblend::video::FfmpegSink;
use sceneblend::{pipeline, BackgroundSynthesizer, ObjectExtractor};

#[derive(Parser, Debug)]
#[command(author, version, about = "Blend a cut-out object into generated scenes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite the object onto one generated background image
    Image(ImageArgs),

    /// Render a zoom-out sequence of generated scenes into an MP4
    /// (needs `ffmpeg` on PATH)
    Video(VideoArgs),
}

#[derive(Parser, Debug)]
struct ImageArgs {
    /// Path to the object image
    #[arg(long)]
    image: PathBuf,

    /// Text prompt describing the background scene
    #[arg(long)]
    text_prompt: String,

    /// Output image path (format inferred from the extension)
    #[arg(long)]
    output: PathBuf,

    /// Path to the background-removal model (ONNX file)
    /// If not provided, the image's own alpha channel is kept
    #[arg(long)]
    model: Option<PathBuf>,

    /// Base URL of a Stable Diffusion WebUI compatible service
    /// If not provided, a flat gradient backdrop is painted instead
    #[arg(long)]
    api_url: Option<String>,

    /// Seed for the enhancement draws (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[derive(Parser, Debug)]
struct VideoArgs {
    /// Path to the object image
    #[arg(long)]
    image: PathBuf,

    /// Text prompt describing the background scenes
    #[arg(long)]
    text_prompt: String,

    /// Output video path
    #[arg(long)]
    output: PathBuf,

    /// Number of frames to render
    #[arg(long, default_value_t = pipeline::DEFAULT_FRAMES)]
    frames: u32,

    /// Output frame rate
    #[arg(long, default_value_t = pipeline::DEFAULT_FPS)]
    fps: u32,

    /// Path to the background-removal model (ONNX file)
    /// If not provided, the image's own alpha channel is kept
    #[arg(long)]
    model: Option<PathBuf>,

    /// Base URL of a Stable Diffusion WebUI compatible service
    /// If not provided, a flat gradient backdrop is painted instead
    #[arg(long)]
    api_url: Option<String>,

    /// Seed for the enhancement draws (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Image(args) => run_image(args),
        Command::Video(args) => run_video(args),
    }
}

fn run_image(args: ImageArgs) -> Result<()> {
    init_logging(args.debug);

    tracing::info!("sceneblend starting");
    tracing::info!("Object: {}", args.image.display());
    tracing::info!("Prompt: {}", args.text_prompt);
    tracing::info!("Scene: {}x{}", pipeline::BASE_WIDTH, pipeline::BASE_HEIGHT);

    let mut extractor = build_extractor(args.model.as_deref())?;
    let mut synthesizer = build_synthesizer(args.api_url.as_deref())?;
    let mut rng = build_rng(args.seed);

    pipeline::generate_still(
        extractor.as_mut(),
        synthesizer.as_mut(),
        &args.image,
        &args.text_prompt,
        &args.output,
        &mut rng,
    )?;

    Ok(())
}

fn run_video(args: VideoArgs) -> Result<()> {
    init_logging(args.debug);

    tracing::info!("sceneblend starting");
    tracing::info!("Object: {}", args.image.display());
    tracing::info!("Prompt: {}", args.text_prompt);
    tracing::info!("Frames: {} at {} fps", args.frames, args.fps);

    let mut extractor = build_extractor(args.model.as_deref())?;
    let mut synthesizer = build_synthesizer(args.api_url.as_deref())?;
    let mut sink = FfmpegSink::new(&args.output);
    let mut rng = build_rng(args.seed);

    pipeline::generate_video(
        extractor.as_mut(),
        synthesizer.as_mut(),
        &mut sink,
        &args.image,
        &args.text_prompt,
        args.frames,
        args.fps,
        &mut rng,
    )?;

    Ok(())
}

fn init_logging(debug: bool) {
    let log_level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();
}

fn build_extractor(model_path: Option<&std::path::Path>) -> Result<Box<dyn ObjectExtractor>> {
    if let Some(path) = model_path {
        tracing::info!("Loading background-removal model from {}", path.display());
        let extractor =
            OnnxExtractor::new(path).context("Failed to load background-removal model")?;
        Ok(Box::new(extractor))
    } else {
        tracing::info!("No model given; keeping the object image's own alpha channel");
        Ok(Box::new(AlphaPassthrough))
    }
}

fn build_synthesizer(api_url: Option<&str>) -> Result<Box<dyn BackgroundSynthesizer>> {
    if let Some(url) = api_url {
        tracing::info!("Using text-to-image service at {}", url);
        let synthesizer =
            SdWebuiSynthesizer::new(url).context("Failed to set up text-to-image client")?;
        Ok(Box::new(synthesizer))
    } else {
        tracing::info!("No API URL given; painting gradient backdrops instead");
        Ok(Box::new(GradientBackdrop))
    }
}

fn build_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}
