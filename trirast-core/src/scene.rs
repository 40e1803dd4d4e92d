//! Scene ownership and frame composition.

use crate::error::RenderError;
use crate::framebuffer::{Framebuffer, RenderTarget};
use crate::geometry::Triangle;
use crate::projection::Camera;
use crate::raster::{RenderOptions, SkipReason};

/// Rows per band when composing in parallel.
#[cfg(feature = "parallel")]
pub const BAND_ROWS: usize = 16;

/// Counts of what happened to each triangle during one composition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub drawn: usize,
    pub behind_camera: usize,
    pub back_facing: usize,
    pub degenerate: usize,
}

impl FrameStats {
    fn record(&mut self, skipped: Option<SkipReason>) {
        match skipped {
            None => self.drawn += 1,
            Some(SkipReason::BehindCamera) => self.behind_camera += 1,
            Some(SkipReason::BackFacing) => self.back_facing += 1,
            Some(SkipReason::Degenerate) => self.degenerate += 1,
        }
    }
}

/// Triangles plus the camera that views them.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    triangles: Vec<Triangle>,
    camera: Camera,
    options: RenderOptions,
}

impl Scene {
    pub fn new(camera: Camera) -> Self {
        Self {
            triangles: Vec::new(),
            camera,
            options: RenderOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn add(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn extend(&mut self, triangles: impl IntoIterator<Item = Triangle>) {
        self.triangles.extend(triangles);
    }

    pub fn clear(&mut self) {
        self.triangles.clear();
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: RenderOptions) {
        self.options = options;
    }

    /// Replace every triangle with `f(triangle)`, in order.
    pub fn transform_triangles(&mut self, mut f: impl FnMut(&Triangle) -> Triangle) {
        for triangle in &mut self.triangles {
            *triangle = f(triangle);
        }
    }

    /// Rasterize all triangles in submission order and return the image.
    ///
    /// The depth buffer lives only for the duration of this call. On equal
    /// depth the earlier triangle keeps the pixel.
    pub fn compose_frame(&self, width: usize, height: usize) -> Result<Framebuffer, RenderError> {
        let (target, stats) = self.compose_target(width, height)?;
        log::debug!(
            "composed {}x{} frame: {} drawn, {} behind camera, {} back-facing, {} degenerate",
            width,
            height,
            stats.drawn,
            stats.behind_camera,
            stats.back_facing,
            stats.degenerate
        );
        Ok(target.into_framebuffer())
    }

    /// Diagnostics and test hook behind [`compose_frame`](Self::compose_frame).
    ///
    /// Hands back the depth buffer alongside the image, plus per-triangle
    /// outcomes. Renderers should call `compose_frame`, which drops the depth
    /// buffer before returning.
    #[doc(hidden)]
    pub fn compose_target(
        &self,
        width: usize,
        height: usize,
    ) -> Result<(RenderTarget, FrameStats), RenderError> {
        let mut target = RenderTarget::new(width, height)?;
        let mut stats = FrameStats::default();
        for triangle in &self.triangles {
            let skipped = triangle.rasterize(&mut target, &self.camera, &self.options);
            if let Some(reason) = skipped {
                log::trace!("skipped triangle {:?}: {:?}", triangle.vertices(), reason);
            }
            stats.record(skipped);
        }
        Ok((target, stats))
    }

    /// Tile-parallel composition, bit-identical to [`compose_frame`](Self::compose_frame).
    ///
    /// Triangles are prepared in parallel, then each band of [`BAND_ROWS`]
    /// rows is filled by one worker walking every triangle in submission
    /// order.
    #[cfg(feature = "parallel")]
    pub fn compose_frame_parallel(
        &self,
        width: usize,
        height: usize,
    ) -> Result<Framebuffer, RenderError> {
        use crate::raster::Preparation;
        use rayon::prelude::*;

        let mut target = RenderTarget::new(width, height)?;
        let prepared: Vec<Preparation> = self
            .triangles
            .par_iter()
            .map(|t| t.prepare(&self.camera, width, height, &self.options))
            .collect();

        let mut stats = FrameStats::default();
        let ready: Vec<_> = prepared
            .iter()
            .filter_map(|p| match p {
                Preparation::Ready(ready) => {
                    stats.record(None);
                    Some(ready)
                }
                Preparation::Skipped(reason) => {
                    stats.record(Some(*reason));
                    None
                }
            })
            .collect();

        target.bands(BAND_ROWS).into_par_iter().for_each(|mut band| {
            for triangle in &ready {
                triangle.fill(&mut band);
            }
        });

        log::debug!(
            "composed {}x{} frame in parallel: {} drawn, {} skipped",
            width,
            height,
            stats.drawn,
            stats.behind_camera + stats.back_facing + stats.degenerate
        );
        Ok(target.into_framebuffer())
    }
}
