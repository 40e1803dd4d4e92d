//! trirast core library: software triangle rasterization
//!
//! Perspective projection, depth-tested flat-shaded scan conversion, frame
//! composition and animation, plus BMP output and STL/JSON scene input.

pub mod animation;
pub mod bmp;
pub mod config;
pub mod error;
pub mod framebuffer;
pub mod geometry;
pub mod projection;
pub mod raster;
pub mod scene;
pub mod stl;
pub mod transform;

// Re-export commonly used types
pub use animation::{render_sequence, render_single_frame, Animation, FnSink, FrameSink};
pub use config::SceneConfig;
pub use error::{BmpError, RenderError, StlError};
pub use framebuffer::{DepthBuffer, Framebuffer, RenderTarget, Rgb};
pub use geometry::{Triangle, Vector, VectorExt};
pub use projection::{Camera, Projected, ViewBasis};
pub use raster::{DepthInterpolation, NearPlanePolicy, RenderOptions, SkipReason};
pub use scene::{FrameStats, Scene};
pub use transform::{Motion, Transform};
