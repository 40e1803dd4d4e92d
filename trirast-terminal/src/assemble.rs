/// Frame directories and video assembly through ffmpeg
use anyhow::{bail, Context, Result};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use trirast_core::bmp::BmpSequence;

/// File name prefix for rendered frames
pub const FRAME_PREFIX: &str = "frame_";

/// A directory holding one animation's BMP frames.
#[derive(Debug, Clone)]
pub struct FrameDirectory {
    path: PathBuf,
}

impl FrameDirectory {
    /// Create `path` if needed and remove frames left over from earlier runs.
    ///
    /// Only files named like our frames are removed; anything else in the
    /// directory is left alone.
    pub fn prepare(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create frame directory: {}", path.display()))?;

        let dir = Self { path };
        let stale = dir.existing_frames()?;
        if !stale.is_empty() {
            log::info!(
                "removing {} stale frames from {}",
                stale.len(),
                dir.path.display()
            );
            dir.remove_frames(&stale)?;
        }
        Ok(dir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A frame sink writing into this directory.
    pub fn sequence(&self) -> BmpSequence {
        BmpSequence::new(&self.path, FRAME_PREFIX)
    }

    /// Frame files currently in the directory, sorted by name.
    pub fn existing_frames(&self) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.path)
            .with_context(|| format!("Failed to read frame directory: {}", self.path.display()))?;

        let mut frames = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_frame = path
                .file_name()
                .and_then(|name| name.to_str())
                .map_or(false, |name| name.starts_with(FRAME_PREFIX) && name.ends_with(".bmp"));
            if is_frame && path.is_file() {
                frames.push(path);
            }
        }
        frames.sort();
        Ok(frames)
    }

    pub fn remove_frames(&self, frames: &[PathBuf]) -> Result<()> {
        for frame in frames {
            fs::remove_file(frame)
                .with_context(|| format!("Failed to delete frame: {}", frame.display()))?;
        }
        log::debug!("removed {} frames from {}", frames.len(), self.path.display());
        Ok(())
    }
}

/// Arguments passed to ffmpeg to turn a glob of frames into a video.
pub fn ffmpeg_args(pattern: &str, fps: u32, output: &Path) -> Vec<OsString> {
    let fps = fps.to_string();
    let mut args: Vec<OsString> = [
        "-y",
        "-framerate",
        fps.as_str(),
        "-pattern_type",
        "glob",
        "-i",
        pattern,
        "-pix_fmt",
        "yuv420p",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();
    args.push(output.as_os_str().to_owned());
    args
}

/// Encode the frames matching `pattern` into `output` at `fps`.
pub fn encode_video(pattern: &str, fps: u32, output: &Path) -> Result<()> {
    if fps == 0 {
        bail!("frame rate must be positive");
    }

    log::info!("encoding {} at {} fps", output.display(), fps);
    let result = Command::new("ffmpeg")
        .args(ffmpeg_args(pattern, fps, output))
        .output()
        .context("Failed to run ffmpeg. Is it installed and on PATH?")?;

    if !result.status.success() {
        bail!(
            "ffmpeg exited with {}: {}",
            result.status,
            String::from_utf8_lossy(&result.stderr).trim()
        );
    }

    log::info!("wrote {}", output.display());
    Ok(())
}
