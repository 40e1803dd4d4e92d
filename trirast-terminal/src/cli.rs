// cli.rs - Command-line interface configuration
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "trirast")]
#[command(about = "Software triangle rasterizer", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Render a single frame to a BMP file
    Render(RenderArgs),
    /// Render an animation to BMP frames and encode them with ffmpeg
    Animate(AnimateArgs),
    /// Play the animation in the terminal
    Preview(PreviewArgs),
}

/// Options shared by every subcommand that renders to files.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputSize {
    /// Override the scene's image width
    #[arg(long)]
    pub width: Option<usize>,

    /// Override the scene's image height
    #[arg(long)]
    pub height: Option<usize>,

    /// Compose frames on all cores
    #[arg(long, default_value = "false")]
    pub parallel: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    /// JSON scene description (defaults to the demo cube)
    #[arg(long)]
    pub scene: Option<PathBuf>,

    #[arg(short, long, default_value = "triangle.bmp")]
    pub output: PathBuf,

    #[command(flatten)]
    pub size: OutputSize,
}

#[derive(Args, Debug, Clone)]
pub struct AnimateArgs {
    /// JSON scene description (defaults to the demo cube)
    #[arg(long)]
    pub scene: Option<PathBuf>,

    /// Number of frames (defaults to the scene's animation settings)
    #[arg(long)]
    pub frames: Option<usize>,

    /// Frames per second of the encoded video
    #[arg(long)]
    pub fps: Option<u32>,

    /// Directory for the intermediate BMP frames
    #[arg(long, default_value = "frames")]
    pub frames_dir: PathBuf,

    #[arg(short, long, default_value = "animation.mp4")]
    pub output: PathBuf,

    /// Keep the BMP frames after encoding
    #[arg(long, default_value = "false")]
    pub keep_frames: bool,

    /// Only write BMP frames, do not run ffmpeg
    #[arg(long, default_value = "false")]
    pub no_video: bool,

    #[command(flatten)]
    pub size: OutputSize,
}

#[derive(Args, Debug, Clone)]
pub struct PreviewArgs {
    /// JSON scene description (defaults to the demo cube)
    #[arg(long)]
    pub scene: Option<PathBuf>,
}
