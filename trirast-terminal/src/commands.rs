/// Subcommand implementations
use anyhow::{bail, Context, Result};
use trirast_core::{bmp, Animation, Framebuffer, Scene, SceneConfig};

use crate::assemble::{encode_video, FrameDirectory};
use crate::cli::{AnimateArgs, OutputSize, PreviewArgs, RenderArgs};
use crate::demo::load_or_demo;
use crate::TerminalPreview;

/// Image size after command-line overrides.
fn frame_size(config: &SceneConfig, size: &OutputSize) -> Result<(usize, usize)> {
    let width = size.width.unwrap_or(config.width);
    let height = size.height.unwrap_or(config.height);
    if width == 0 || height == 0 {
        bail!("image size {width}x{height} must be non-zero");
    }
    Ok((width, height))
}

#[cfg(feature = "parallel")]
fn compose(scene: &Scene, width: usize, height: usize, parallel: bool) -> Result<Framebuffer> {
    let frame = if parallel {
        scene.compose_frame_parallel(width, height)?
    } else {
        scene.compose_frame(width, height)?
    };
    Ok(frame)
}

#[cfg(not(feature = "parallel"))]
fn compose(scene: &Scene, width: usize, height: usize, parallel: bool) -> Result<Framebuffer> {
    if parallel {
        log::warn!("built without the parallel feature, composing sequentially");
    }
    Ok(scene.compose_frame(width, height)?)
}

pub fn render(args: &RenderArgs) -> Result<()> {
    let (config, base) = load_or_demo(args.scene.as_deref())?;
    let (width, height) = frame_size(&config, &args.size)?;
    let scene = config
        .build_scene(&base)
        .context("Failed to build scene")?;

    let frame = compose(&scene, width, height, args.size.parallel)?;
    bmp::write(&args.output, &frame)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    log::info!(
        "wrote {}x{} image with {} lit pixels to {}",
        width,
        height,
        frame.count_lit(),
        args.output.display()
    );
    Ok(())
}

pub fn animate(args: &AnimateArgs) -> Result<()> {
    let (config, base) = load_or_demo(args.scene.as_deref())?;
    let (width, height) = frame_size(&config, &args.size)?;
    let frame_count = args.frames.unwrap_or(config.animation.frames);
    let fps = args.fps.unwrap_or(config.animation.fps);
    let transform = config.animation.transform();
    let mut scene = config
        .build_scene(&base)
        .context("Failed to build scene")?;

    let dir = FrameDirectory::prepare(&args.frames_dir)?;
    let mut sequence = dir.sequence();
    Animation::new(width, height, frame_count)
        .with_parallel(args.size.parallel)
        .run(&mut scene, |t| transform.apply(t), &mut sequence)
        .context("Failed to render animation")?;

    if args.no_video {
        log::info!(
            "wrote {} frames to {}",
            sequence.written().len(),
            dir.path().display()
        );
        return Ok(());
    }

    encode_video(&sequence.glob_pattern(), fps, &args.output)?;
    if !args.keep_frames {
        dir.remove_frames(sequence.written())?;
    }
    Ok(())
}

pub fn preview(args: &PreviewArgs) -> Result<()> {
    let (config, base) = load_or_demo(args.scene.as_deref())?;
    let transform = config.animation.transform();
    let scene = config
        .build_scene(&base)
        .context("Failed to build scene")?;

    let mut app = TerminalPreview::new(scene, transform, config.animation.fps)
        .context("Failed to query terminal size")?;
    app.run().context("Terminal preview failed")?;
    Ok(())
}
