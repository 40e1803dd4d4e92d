//! Frame sequences: transform the scene, compose, hand the frame on.

use std::time::Instant;

use crate::error::RenderError;
use crate::framebuffer::Framebuffer;
use crate::geometry::Triangle;
use crate::scene::Scene;

/// Receives composed frames in order.
pub trait FrameSink {
    fn emit(&mut self, index: usize, frame: Framebuffer) -> Result<(), RenderError>;
}

impl FrameSink for Vec<Framebuffer> {
    fn emit(&mut self, _index: usize, frame: Framebuffer) -> Result<(), RenderError> {
        self.push(frame);
        Ok(())
    }
}

/// Adapts a closure into a [`FrameSink`].
pub struct FnSink<F>(pub F);

impl<F> FrameSink for FnSink<F>
where
    F: FnMut(usize, Framebuffer) -> Result<(), RenderError>,
{
    fn emit(&mut self, index: usize, frame: Framebuffer) -> Result<(), RenderError> {
        (self.0)(index, frame)
    }
}

/// Parameters of a frame sequence.
#[derive(Debug, Clone, Copy)]
pub struct Animation {
    pub width: usize,
    pub height: usize,
    pub frame_count: usize,
    /// Checked before each frame; never interrupts a frame in progress.
    pub deadline: Option<Instant>,
    /// Use tile-parallel composition when available.
    pub parallel: bool,
}

impl Animation {
    pub fn new(width: usize, height: usize, frame_count: usize) -> Self {
        Self {
            width,
            height,
            frame_count,
            deadline: None,
            parallel: false,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Render `frame_count` frames.
    ///
    /// Before each frame every triangle is replaced by `transform(triangle)`,
    /// so frame `k` shows the scene after `k + 1` applications. The scene
    /// keeps its final state afterwards.
    pub fn run<S: FrameSink + ?Sized>(
        &self,
        scene: &mut Scene,
        mut transform: impl FnMut(&Triangle) -> Triangle,
        sink: &mut S,
    ) -> Result<(), RenderError> {
        log::info!(
            "rendering {} frames at {}x{} ({} triangles)",
            self.frame_count,
            self.width,
            self.height,
            scene.len()
        );
        for index in 0..self.frame_count {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    return Err(RenderError::DeadlineExceeded { frame: index });
                }
            }
            scene.transform_triangles(&mut transform);
            let frame = self.compose(scene)?;
            sink.emit(index, frame)?;
            if (index + 1) % 10 == 0 || index + 1 == self.frame_count {
                log::info!("frame {}/{}", index + 1, self.frame_count);
            }
        }
        Ok(())
    }

    fn compose(&self, scene: &Scene) -> Result<Framebuffer, RenderError> {
        #[cfg(feature = "parallel")]
        if self.parallel {
            return scene.compose_frame_parallel(self.width, self.height);
        }
        scene.compose_frame(self.width, self.height)
    }
}

/// Compose a single frame of the scene as it stands.
pub fn render_single_frame(
    scene: &Scene,
    width: usize,
    height: usize,
) -> Result<Framebuffer, RenderError> {
    scene.compose_frame(width, height)
}

/// Render a sequence into memory.
pub fn render_sequence(
    scene: &mut Scene,
    width: usize,
    height: usize,
    frame_count: usize,
    transform: impl FnMut(&Triangle) -> Triangle,
) -> Result<Vec<Framebuffer>, RenderError> {
    let mut frames = Vec::with_capacity(frame_count);
    Animation::new(width, height, frame_count).run(scene, transform, &mut frames)?;
    Ok(frames)
}
