//! Triangle scan conversion.
//!
//! Rasterizing a triangle happens in two steps. [`Triangle::prepare`] projects,
//! clips, culls and shades it once per frame. [`PreparedTriangle::fill`]
//! then scan-converts the result into a band of rows of a render target.
//! Filling never looks at other triangles, so disjoint bands can be filled
//! independently as long as each band sees triangles in submission order.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::framebuffer::{Band, RenderTarget, Rgb};
use crate::geometry::{Triangle, Vector};
use crate::projection::{Camera, NEAR_EPSILON};

/// What to do with triangles that reach the near plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NearPlanePolicy {
    /// Clip against `near + NEAR_EPSILON` in view space, keeping the visible part.
    #[default]
    Clip,
    /// Drop the whole triangle if any vertex is at or behind the near plane.
    Reject,
    /// Clamp each vertex depth inside the projection and draw whatever results.
    Clamp,
}

/// How depth is interpolated across a triangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthInterpolation {
    /// Screen-space linear interpolation of view depth.
    #[default]
    Linear,
    /// Interpolate `1/z` and invert.
    PerspectiveCorrect,
}

impl DepthInterpolation {
    #[inline]
    fn interpolate(self, (u, v, w): (f32, f32, f32), z: [f32; 3]) -> f32 {
        match self {
            DepthInterpolation::Linear => u * z[0] + v * z[1] + w * z[2],
            DepthInterpolation::PerspectiveCorrect => {
                1.0 / (u / z[0] + v / z[1] + w / z[2])
            }
        }
    }
}

/// Rasterizer settings shared by every triangle of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderOptions {
    pub near_plane: NearPlanePolicy,
    pub depth: DepthInterpolation,
    /// Lower bound on the lighting factor.
    pub ambient: f32,
    pub backface_culling: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            near_plane: NearPlanePolicy::Clip,
            depth: DepthInterpolation::Linear,
            ambient: 0.3,
            backface_culling: true,
        }
    }
}

/// Why a triangle produced no fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Entirely behind the near plane, or touching it under `Reject`.
    BehindCamera,
    BackFacing,
    /// Zero projected area.
    Degenerate,
}

/// Barycentric weights relative to a fixed 2D triangle.
#[derive(Debug, Clone, Copy)]
pub struct Barycentric {
    origin: Vector2<f32>,
    v0: Vector2<f32>,
    v1: Vector2<f32>,
    d00: f32,
    d01: f32,
    d11: f32,
    denom: f32,
}

impl Barycentric {
    /// Returns `None` when `denom` is exactly zero (collinear points).
    pub fn new(a: Vector2<f32>, b: Vector2<f32>, c: Vector2<f32>) -> Option<Self> {
        let v0 = b - a;
        let v1 = c - a;
        let d00 = v0.dot(&v0);
        let d01 = v0.dot(&v1);
        let d11 = v1.dot(&v1);
        let denom = d00 * d11 - d01 * d01;
        if denom == 0.0 {
            return None;
        }
        Some(Self {
            origin: a,
            v0,
            v1,
            d00,
            d01,
            d11,
            denom,
        })
    }

    /// Weights `(u, v, w)` of `a`, `b` and `c` for point `p`.
    #[inline]
    pub fn weights(&self, p: Vector2<f32>) -> (f32, f32, f32) {
        let v2 = p - self.origin;
        let d20 = v2.dot(&self.v0);
        let d21 = v2.dot(&self.v1);
        let v = (self.d11 * d20 - self.d01 * d21) / self.denom;
        let w = (self.d00 * d21 - self.d01 * d20) / self.denom;
        (1.0 - v - w, v, w)
    }
}

/// Barycentric weights of `p` in triangle `abc`, or `None` if it is degenerate.
pub fn barycentric(
    a: Vector2<f32>,
    b: Vector2<f32>,
    c: Vector2<f32>,
    p: Vector2<f32>,
) -> Option<(f32, f32, f32)> {
    Barycentric::new(a, b, c).map(|bary| bary.weights(p))
}

/// Scale a color by a lighting factor into 8-bit channels.
///
/// Channels are truncated toward zero and wrap like 8-bit storage; callers
/// keep colors in `0..=255` to avoid wraparound.
pub fn shade(color: Vector, lighting: f32) -> Rgb {
    let channel = |c: f32| (c * lighting) as i32 as u8;
    [channel(color.x), channel(color.y), channel(color.z)]
}

/// A triangle in screen space: `x`, `y` in pixels and `z` as view depth.
#[derive(Debug, Clone, Copy)]
struct ScreenTriangle {
    vertices: [Vector; 3],
    bary: Barycentric,
}

impl ScreenTriangle {
    fn new(a: Vector, b: Vector, c: Vector) -> Option<Self> {
        let bary = Barycentric::new(a.xy(), b.xy(), c.xy())?;
        Some(Self {
            vertices: [a, b, c],
            bary,
        })
    }
}

/// A projected, clipped and shaded triangle ready to be filled.
#[derive(Debug, Clone)]
pub struct PreparedTriangle {
    parts: Vec<ScreenTriangle>,
    color: Rgb,
    depth: DepthInterpolation,
}

/// Result of [`Triangle::prepare`].
#[derive(Debug, Clone)]
pub enum Preparation {
    Ready(PreparedTriangle),
    Skipped(SkipReason),
}

/// Sutherland-Hodgman against the plane `z = plane`, keeping `z >= plane`.
fn clip_near(view: &[Vector; 3], plane: f32) -> Vec<Vector> {
    let mut out = Vec::with_capacity(4);
    for i in 0..3 {
        let current = view[i];
        let next = view[(i + 1) % 3];
        let current_inside = current.z >= plane;
        if current_inside {
            out.push(current);
        }
        if current_inside != (next.z >= plane) {
            let t = (plane - current.z) / (next.z - current.z);
            let mut crossing = current + (next - current) * t;
            crossing.z = plane;
            out.push(crossing);
        }
    }
    out
}

impl Triangle {
    /// Project, clip, cull and shade this triangle for a `width x height` target.
    pub fn prepare(
        &self,
        camera: &Camera,
        width: usize,
        height: usize,
        options: &RenderOptions,
    ) -> Preparation {
        let basis = camera.basis();
        let view = self.vertices().map(|v| basis.to_view(&v));
        let near = camera.near_plane();

        let polygon = match options.near_plane {
            NearPlanePolicy::Clamp => view.to_vec(),
            NearPlanePolicy::Reject => {
                if view.iter().any(|v| v.z <= near) {
                    return Preparation::Skipped(SkipReason::BehindCamera);
                }
                view.to_vec()
            }
            NearPlanePolicy::Clip => {
                let clipped = clip_near(&view, near + NEAR_EPSILON);
                if clipped.len() < 3 {
                    return Preparation::Skipped(SkipReason::BehindCamera);
                }
                clipped
            }
        };

        if options.backface_culling && !self.is_facing_camera(&camera.position()) {
            return Preparation::Skipped(SkipReason::BackFacing);
        }

        let screen: Vec<Vector> = polygon
            .iter()
            .map(|v| {
                let p = camera.project_view(v, width, height);
                Vector::new(p.x, p.y, p.depth)
            })
            .collect();

        // Fan triangulation; clipping yields at most a quad
        let parts: Vec<ScreenTriangle> = (1..screen.len() - 1)
            .filter_map(|i| ScreenTriangle::new(screen[0], screen[i], screen[i + 1]))
            .collect();
        if parts.is_empty() {
            return Preparation::Skipped(SkipReason::Degenerate);
        }

        let lighting = options
            .ambient
            .max(-self.normal().dot(&camera.light_direction()));

        Preparation::Ready(PreparedTriangle {
            parts,
            color: shade(self.color(), lighting),
            depth: options.depth,
        })
    }

    /// Paint this triangle into `target`, depth-testing every fragment.
    ///
    /// Returns why nothing was drawn, if that is the case.
    pub fn rasterize(
        &self,
        target: &mut RenderTarget,
        camera: &Camera,
        options: &RenderOptions,
    ) -> Option<SkipReason> {
        match self.prepare(camera, target.width(), target.height(), options) {
            Preparation::Ready(prepared) => {
                prepared.fill(&mut target.band());
                None
            }
            Preparation::Skipped(reason) => Some(reason),
        }
    }
}

impl PreparedTriangle {
    /// Flat-shaded color written for every covered pixel.
    pub fn color(&self) -> Rgb {
        self.color
    }

    /// Scan-convert into the rows covered by `band`.
    pub(crate) fn fill(&self, band: &mut Band<'_>) {
        let rows = band.rows();
        if rows == 0 {
            return;
        }
        let max_x = band.width as i64 - 1;
        let band_top = band.y0 as i64;
        let band_bottom = band_top + rows as i64 - 1;

        for part in &self.parts {
            let [a, b, c] = part.vertices;

            let min_x = (a.x.min(b.x).min(c.x).floor() as i64).clamp(0, max_x);
            let max_xb = (a.x.max(b.x).max(c.x).ceil() as i64).clamp(0, max_x);
            let min_y = (a.y.min(b.y).min(c.y).floor() as i64).clamp(band_top, band_bottom);
            let max_y = (a.y.max(b.y).max(c.y).ceil() as i64).clamp(band_top, band_bottom);

            let depths = [a.z, b.z, c.z];
            for y in min_y..=max_y {
                for x in min_x..=max_xb {
                    let p = Vector2::new(x as f32 + 0.5, y as f32 + 0.5);
                    let weights = part.bary.weights(p);
                    let (u, v, w) = weights;
                    if u >= 0.0 && v >= 0.0 && w >= 0.0 {
                        let depth = self.depth.interpolate(weights, depths);
                        band.test_and_set(x as usize, y as usize, depth, self.color);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v2(x: f32, y: f32) -> Vector2<f32> {
        Vector2::new(x, y)
    }

    fn facing_triangle(z: f32, color: Vector) -> Triangle {
        Triangle::new(
            Vector::new(-1.0, -1.0, z),
            Vector::new(1.0, -1.0, z),
            Vector::new(0.0, 1.0, z),
            color,
        )
    }

    #[test]
    fn test_barycentric_vertices_and_center() {
        let (a, b, c) = (v2(0.0, 0.0), v2(4.0, 0.0), v2(0.0, 4.0));
        let (u, v, w) = barycentric(a, b, c, a).unwrap();
        assert!((u - 1.0).abs() < 1e-6 && v.abs() < 1e-6 && w.abs() < 1e-6);
        let (u, v, w) = barycentric(a, b, c, v2(1.0, 1.0)).unwrap();
        assert!((u - 0.5).abs() < 1e-6);
        assert!((v - 0.25).abs() < 1e-6);
        assert!((w - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_barycentric_outside_has_negative_weight() {
        let (u, v, w) =
            barycentric(v2(0.0, 0.0), v2(4.0, 0.0), v2(0.0, 4.0), v2(5.0, 5.0)).unwrap();
        assert!(u < 0.0 || v < 0.0 || w < 0.0);
    }

    #[test]
    fn test_barycentric_degenerate_is_none() {
        assert!(barycentric(v2(0.0, 0.0), v2(1.0, 1.0), v2(2.0, 2.0), v2(0.5, 0.5)).is_none());
    }

    #[test]
    fn test_shade_truncates_and_wraps() {
        assert_eq!(shade(Vector::new(255.0, 100.0, 0.0), 0.5), [127, 50, 0]);
        assert_eq!(shade(Vector::new(300.0, 0.0, 0.0), 1.0), [44, 0, 0]);
    }

    #[test]
    fn test_clip_near_keeps_visible_part() {
        let view = [
            Vector::new(0.0, 0.0, 2.0),
            Vector::new(1.0, 0.0, -1.0),
            Vector::new(0.0, 1.0, 2.0),
        ];
        let clipped = clip_near(&view, 1.0);
        assert_eq!(clipped.len(), 4);
        assert!(clipped.iter().all(|v| v.z >= 1.0));

        let behind = view.map(|v| Vector::new(v.x, v.y, -5.0));
        assert!(clip_near(&behind, 1.0).is_empty());
    }

    #[test]
    fn test_back_facing_triangle_is_skipped() {
        let camera = Camera::default();
        let t = facing_triangle(0.0, Vector::new(255.0, 0.0, 0.0));
        let flipped = Triangle::new(t.a(), t.c(), t.b(), t.color());
        let options = RenderOptions::default();

        assert!(matches!(
            t.prepare(&camera, 64, 64, &options),
            Preparation::Ready(_)
        ));
        assert!(matches!(
            flipped.prepare(&camera, 64, 64, &options),
            Preparation::Skipped(SkipReason::BackFacing)
        ));

        let no_cull = RenderOptions {
            backface_culling: false,
            ..options
        };
        assert!(matches!(
            flipped.prepare(&camera, 64, 64, &no_cull),
            Preparation::Ready(_)
        ));
    }

    #[test]
    fn test_edge_on_triangle_is_degenerate() {
        let camera = Camera::default();
        // Two vertices on the view axis land on the same pixel
        let t = Triangle::new(
            Vector::new(0.0, 0.0, 0.0),
            Vector::new(0.0, 0.0, 1.0),
            Vector::new(0.0, 1.0, 0.0),
            Vector::new(255.0, 255.0, 255.0),
        );
        let options = RenderOptions {
            backface_culling: false,
            ..RenderOptions::default()
        };
        assert!(matches!(
            t.prepare(&camera, 64, 64, &options),
            Preparation::Skipped(SkipReason::Degenerate)
        ));
    }

    #[test]
    fn test_facing_light_is_full_brightness() {
        let camera = Camera::default();
        let t = facing_triangle(0.0, Vector::new(200.0, 100.0, 50.0));
        match t.prepare(&camera, 64, 64, &RenderOptions::default()) {
            Preparation::Ready(prepared) => assert_eq!(prepared.color(), [200, 100, 50]),
            Preparation::Skipped(reason) => panic!("unexpected skip: {reason:?}"),
        }
    }

    #[test]
    fn test_rasterize_writes_depth_near_view_distance() {
        let camera = Camera::default();
        let mut target = RenderTarget::new(64, 64).unwrap();
        let t = facing_triangle(0.0, Vector::new(255.0, 255.0, 255.0));
        assert_eq!(t.rasterize(&mut target, &camera, &RenderOptions::default()), None);

        let fb = target.framebuffer();
        assert!(fb.count_lit() > 0);
        assert_eq!(fb.pixel(32, 32), Some([255, 255, 255]));
        let depth = target.depth_buffer().depth(32, 32).unwrap();
        assert!((depth - 5.0).abs() < 1e-3);
        assert_eq!(fb.pixel(0, 0), Some([0, 0, 0]));
    }

    #[test]
    fn test_perspective_correct_depth_matches_for_flat_triangle() {
        let camera = Camera::default();
        let t = facing_triangle(0.0, Vector::new(255.0, 255.0, 255.0));
        let linear = RenderOptions::default();
        let correct = RenderOptions {
            depth: DepthInterpolation::PerspectiveCorrect,
            ..linear
        };

        let mut a = RenderTarget::new(32, 32).unwrap();
        let mut b = RenderTarget::new(32, 32).unwrap();
        t.rasterize(&mut a, &camera, &linear);
        t.rasterize(&mut b, &camera, &correct);
        // Constant depth: both modes agree
        let da = a.depth_buffer().depth(16, 16).unwrap();
        let db = b.depth_buffer().depth(16, 16).unwrap();
        assert!((da - db).abs() < 1e-4);
    }

    #[test]
    fn test_perspective_correct_depth_for_tilted_triangle() {
        let camera = Camera::default();
        // Leans toward the camera: view depths 8, 8 and 2
        let t = Triangle::new(
            Vector::new(-2.0, -1.0, -3.0),
            Vector::new(2.0, -1.0, -3.0),
            Vector::new(0.0, 1.5, 3.0),
            Vector::new(255.0, 255.0, 255.0),
        );
        let (width, height) = (64, 64);
        let screen = t.vertices().map(|p| camera.project(&p, width, height));
        let z = screen.map(|s| s.depth);
        for (got, want) in z.iter().zip([8.0, 8.0, 2.0]) {
            assert!((got - want).abs() < 1e-5);
        }

        let center = camera.project(&t.centroid(), width, height);
        let (x, y) = (center.x.floor() as usize, center.y.floor() as usize);
        let (u, v, w) = barycentric(
            v2(screen[0].x, screen[0].y),
            v2(screen[1].x, screen[1].y),
            v2(screen[2].x, screen[2].y),
            v2(x as f32 + 0.5, y as f32 + 0.5),
        )
        .unwrap();
        assert!(u > 0.05 && v > 0.05 && w > 0.05, "({u}, {v}, {w})");
        let linear = u * z[0] + v * z[1] + w * z[2];
        let correct = 1.0 / (u / z[0] + v / z[1] + w / z[2]);
        assert!((linear - correct).abs() > 0.5);

        let depth_at = |depth| {
            let options = RenderOptions {
                depth,
                ..RenderOptions::default()
            };
            let mut target = RenderTarget::new(width, height).unwrap();
            assert_eq!(t.rasterize(&mut target, &camera, &options), None);
            target.depth_buffer().depth(x, y).unwrap()
        };
        let got = depth_at(DepthInterpolation::PerspectiveCorrect);
        assert!((got - correct).abs() < 1e-4, "{got} vs {correct}");
        let got = depth_at(DepthInterpolation::Linear);
        assert!((got - linear).abs() < 1e-4, "{got} vs {linear}");
    }
}
