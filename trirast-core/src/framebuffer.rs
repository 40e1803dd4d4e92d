//! Color and depth buffers.
//!
//! Both buffers are row-major with the origin at the top-left pixel. A
//! [`RenderTarget`] pairs them so their dimensions always agree.

use crate::error::RenderError;

/// An 8-bit RGB triple.
pub type Rgb = [u8; 3];

fn allocate<T: Clone>(width: usize, height: usize, fill: T) -> Result<Vec<T>, RenderError> {
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidDimensions { width, height });
    }
    let len = width
        .checked_mul(height)
        .ok_or(RenderError::Allocation { width, height })?;
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| RenderError::Allocation { width, height })?;
    buffer.resize(len, fill);
    Ok(buffer)
}

/// RGB image, initialized to black.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Result<Self, RenderError> {
        Ok(Self {
            width,
            height,
            pixels: allocate(width, height, [0; 3])?,
        })
    }

    /// Wrap existing pixel data; `pixels.len()` must equal `width * height`.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<Rgb>) -> Result<Self, RenderError> {
        if width == 0 || height == 0 || width.checked_mul(height) != Some(pixels.len()) {
            return Err(RenderError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Color at `(x, y)`, or `None` if out of bounds.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, color: Rgb) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = color;
        }
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    /// Iterate rows from top to bottom.
    pub fn rows(&self) -> std::slice::ChunksExact<'_, Rgb> {
        self.pixels.chunks_exact(self.width)
    }

    /// Number of pixels that are not black.
    pub fn count_lit(&self) -> usize {
        self.pixels.iter().filter(|p| **p != [0; 3]).count()
    }
}

/// Per-pixel nearest depth, initialized to `+inf`.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthBuffer {
    width: usize,
    height: usize,
    depths: Vec<f32>,
}

impl DepthBuffer {
    pub fn new(width: usize, height: usize) -> Result<Self, RenderError> {
        Ok(Self {
            width,
            height,
            depths: allocate(width, height, f32::INFINITY)?,
        })
    }

    pub fn depth(&self, x: usize, y: usize) -> Option<f32> {
        (x < self.width && y < self.height).then(|| self.depths[y * self.width + x])
    }
}

/// Framebuffer plus depth buffer of the same size, owned by one composition.
#[derive(Debug, Clone)]
pub struct RenderTarget {
    color: Framebuffer,
    depth: DepthBuffer,
}

impl RenderTarget {
    pub fn new(width: usize, height: usize) -> Result<Self, RenderError> {
        Ok(Self {
            color: Framebuffer::new(width, height)?,
            depth: DepthBuffer::new(width, height)?,
        })
    }

    pub fn width(&self) -> usize {
        self.color.width
    }

    pub fn height(&self) -> usize {
        self.color.height
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.color
    }

    pub fn depth_buffer(&self) -> &DepthBuffer {
        &self.depth
    }

    /// Drop the depth buffer and keep the image.
    pub fn into_framebuffer(self) -> Framebuffer {
        self.color
    }

    /// The whole target as a single band.
    pub(crate) fn band(&mut self) -> Band<'_> {
        Band {
            y0: 0,
            width: self.color.width,
            color: &mut self.color.pixels,
            depth: &mut self.depth.depths,
        }
    }

    /// Split into disjoint bands of at most `rows` rows each.
    #[cfg(feature = "parallel")]
    pub(crate) fn bands(&mut self, rows: usize) -> Vec<Band<'_>> {
        let width = self.color.width;
        let chunk = width * rows.max(1);
        self.color
            .pixels
            .chunks_mut(chunk)
            .zip(self.depth.depths.chunks_mut(chunk))
            .enumerate()
            .map(|(i, (color, depth))| Band {
                y0: i * rows.max(1),
                width,
                color,
                depth,
            })
            .collect()
    }
}

/// A horizontal slice of a render target: rows `y0..y0 + rows()`.
pub(crate) struct Band<'a> {
    pub y0: usize,
    pub width: usize,
    pub color: &'a mut [Rgb],
    pub depth: &'a mut [f32],
}

impl Band<'_> {
    pub fn rows(&self) -> usize {
        self.color.len() / self.width
    }

    /// Write `color` at `(x, y)` if `depth` is strictly nearer than the
    /// stored value. `y` is in target coordinates.
    #[inline]
    pub fn test_and_set(&mut self, x: usize, y: usize, depth: f32, color: Rgb) {
        let idx = (y - self.y0) * self.width + x;
        if depth < self.depth[idx] {
            self.depth[idx] = depth;
            self.color[idx] = color;
        }
    }
}
