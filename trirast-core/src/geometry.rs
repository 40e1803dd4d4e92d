/// Geometry primitives: vectors and flat-colored triangles
use nalgebra::Vector3;

/// A 3-component vector used for positions, directions and RGB colors
pub type Vector = Vector3<f32>;

/// Operations the rasterizer needs beyond what nalgebra provides
pub trait VectorExt {
    /// Unit vector in the same direction, or the zero vector when the
    /// length is exactly zero.
    fn normalize_or_zero(&self) -> Vector;
}

impl VectorExt for Vector {
    fn normalize_or_zero(&self) -> Vector {
        let length = self.norm();
        if length == 0.0 {
            Vector::zeros()
        } else {
            *self / length
        }
    }
}

/// Rotate `(x, y)` by `angle` radians about the origin.
#[inline]
fn rotate_2d(x: f32, y: f32, angle: f32) -> (f32, f32) {
    let (sin, cos) = angle.sin_cos();
    (x * cos - y * sin, x * sin + y * cos)
}

/// A triangle with a flat color and a derived face normal.
///
/// Vertices are only reachable through the transform methods so the normal
/// can never go stale. Counter-clockwise winding (seen from the viewer) is
/// front-facing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    a: Vector,
    b: Vector,
    c: Vector,
    color: Vector,
    normal: Vector,
}

impl Triangle {
    pub fn new(a: Vector, b: Vector, c: Vector, color: Vector) -> Self {
        let mut triangle = Self {
            a,
            b,
            c,
            color,
            normal: Vector::zeros(),
        };
        triangle.update_normal();
        triangle
    }

    pub fn a(&self) -> Vector {
        self.a
    }

    pub fn b(&self) -> Vector {
        self.b
    }

    pub fn c(&self) -> Vector {
        self.c
    }

    pub fn vertices(&self) -> [Vector; 3] {
        [self.a, self.b, self.c]
    }

    /// RGB color, nominally in `0.0..=255.0` per channel
    pub fn color(&self) -> Vector {
        self.color
    }

    pub fn set_color(&mut self, color: Vector) {
        self.color = color;
    }

    /// Unit face normal, zero for collinear vertices
    pub fn normal(&self) -> Vector {
        self.normal
    }

    pub fn centroid(&self) -> Vector {
        (self.a + self.b + self.c) / 3.0
    }

    /// True if the three vertices are collinear (zero-length normal)
    pub fn is_degenerate(&self) -> bool {
        self.normal == Vector::zeros()
    }

    fn update_normal(&mut self) {
        let edge1 = self.b - self.a;
        let edge2 = self.c - self.a;
        self.normal = edge1.cross(&edge2).normalize_or_zero();
    }

    fn map_vertices(&mut self, f: impl Fn(Vector) -> Vector) {
        self.a = f(self.a);
        self.b = f(self.b);
        self.c = f(self.c);
        self.update_normal();
    }

    /// Rotate x/y about the world origin, leaving z untouched.
    pub fn rotate_around_origin(&mut self, angle: f32) {
        self.map_vertices(|v| {
            let (x, y) = rotate_2d(v.x, v.y, angle);
            Vector::new(x, y, v.z)
        });
    }

    /// Rotate x/y about the centroid, leaving z untouched.
    pub fn rotate_around_centroid(&mut self, angle: f32) {
        let pivot = self.centroid();
        self.map_vertices(|v| {
            let (x, y) = rotate_2d(v.x - pivot.x, v.y - pivot.y, angle);
            Vector::new(x + pivot.x, y + pivot.y, v.z)
        });
    }

    /// Rotate about the vertical axis through the centroid.
    pub fn rotate_around_centroid_y(&mut self, angle: f32) {
        let pivot = self.centroid();
        let (sin, cos) = angle.sin_cos();
        self.map_vertices(|v| {
            let dx = v.x - pivot.x;
            let dz = v.z - pivot.z;
            Vector::new(
                pivot.x + dx * cos + dz * sin,
                v.y,
                pivot.z - dx * sin + dz * cos,
            )
        });
    }

    /// Scale every axis relative to the centroid.
    pub fn scale_from_centroid(&mut self, scalar: f32) {
        let pivot = self.centroid();
        self.map_vertices(|v| pivot + (v - pivot) * scalar);
    }

    pub fn translate(&mut self, offset: Vector) {
        self.map_vertices(|v| v + offset);
    }

    /// True when the face normal points towards `camera_position`.
    pub fn is_facing_camera(&self, camera_position: &Vector) -> bool {
        let to_camera = *camera_position - self.centroid();
        self.normal.dot(&to_camera) > 0.0
    }
}

/// Build an axis-aligned cube centered at the origin, one color per face.
///
/// Faces are wound counter-clockwise when viewed from outside, in the order
/// front (+z), back, top (+y), bottom, right (+x), left.
pub fn cube(size: f32, face_colors: [Vector; 6]) -> Vec<Triangle> {
    let h = size / 2.0;
    let v = Vector::new;
    let quads = [
        [v(-h, -h, h), v(h, -h, h), v(h, h, h), v(-h, h, h)],
        [v(h, -h, -h), v(-h, -h, -h), v(-h, h, -h), v(h, h, -h)],
        [v(-h, h, h), v(h, h, h), v(h, h, -h), v(-h, h, -h)],
        [v(-h, -h, -h), v(h, -h, -h), v(h, -h, h), v(-h, -h, h)],
        [v(h, -h, h), v(h, -h, -h), v(h, h, -h), v(h, h, h)],
        [v(-h, -h, -h), v(-h, -h, h), v(-h, h, h), v(-h, h, -h)],
    ];

    let mut triangles = Vec::with_capacity(12);
    for (quad, color) in quads.iter().zip(face_colors) {
        triangles.push(Triangle::new(quad[0], quad[1], quad[2], color));
        triangles.push(Triangle::new(quad[0], quad[2], quad[3], color));
    }
    triangles
}
