/// trirast - software triangle rasterizer
///
/// Subcommands:
///   - render: write one frame as a BMP
///   - animate: write BMP frames and encode them with ffmpeg
///   - preview: play the animation in the terminal (arrows orbit, Q/ESC quits)
use anyhow::Result;
use clap::Parser;
use trirast_terminal::cli::{Cli, Command};
use trirast_terminal::commands;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match &cli.command {
        Command::Render(args) => commands::render(args),
        Command::Animate(args) => commands::animate(args),
        Command::Preview(args) => commands::preview(args),
    }
}
