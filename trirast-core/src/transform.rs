/// Per-frame rigid transforms applied to triangles
use serde::{Deserialize, Serialize};

use crate::geometry::{Triangle, Vector};

/// A single incremental motion. Angles are in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Motion {
    RotateOrigin(f32),
    RotateCentroid(f32),
    RotateCentroidY(f32),
    ScaleFromCentroid(f32),
    Translate([f32; 3]),
}

impl Motion {
    pub fn apply_in_place(&self, triangle: &mut Triangle) {
        match *self {
            Motion::RotateOrigin(angle) => triangle.rotate_around_origin(angle),
            Motion::RotateCentroid(angle) => triangle.rotate_around_centroid(angle),
            Motion::RotateCentroidY(angle) => triangle.rotate_around_centroid_y(angle),
            Motion::ScaleFromCentroid(s) => triangle.scale_from_centroid(s),
            Motion::Translate([x, y, z]) => triangle.translate(Vector::new(x, y, z)),
        }
    }

    /// The motion that undoes this one. A zero scale has no inverse and
    /// maps to itself.
    pub fn inverse(&self) -> Motion {
        match *self {
            Motion::RotateOrigin(angle) => Motion::RotateOrigin(-angle),
            Motion::RotateCentroid(angle) => Motion::RotateCentroid(-angle),
            Motion::RotateCentroidY(angle) => Motion::RotateCentroidY(-angle),
            Motion::ScaleFromCentroid(s) if s != 0.0 => Motion::ScaleFromCentroid(1.0 / s),
            Motion::ScaleFromCentroid(s) => Motion::ScaleFromCentroid(s),
            Motion::Translate([x, y, z]) => Motion::Translate([-x, -y, -z]),
        }
    }
}

/// An ordered list of motions applied once per frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transform {
    motions: Vec<Motion>,
}

impl Transform {
    pub fn new(motions: Vec<Motion>) -> Self {
        Self { motions }
    }

    pub fn identity() -> Self {
        Self::default()
    }

    pub fn then(mut self, motion: Motion) -> Self {
        self.motions.push(motion);
        self
    }

    pub fn motions(&self) -> &[Motion] {
        &self.motions
    }

    pub fn is_identity(&self) -> bool {
        self.motions.is_empty()
    }

    /// Return the transformed copy of `triangle`.
    pub fn apply(&self, triangle: &Triangle) -> Triangle {
        let mut next = *triangle;
        for motion in &self.motions {
            motion.apply_in_place(&mut next);
        }
        next
    }

    /// Inverse motions in reverse order.
    pub fn inverse(&self) -> Self {
        Self {
            motions: self.motions.iter().rev().map(Motion::inverse).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Triangle {
        Triangle::new(
            Vector::new(1.0, 2.0, 3.0),
            Vector::new(4.0, 2.0, 1.0),
            Vector::new(2.0, 5.0, 2.0),
            Vector::new(10.0, 20.0, 30.0),
        )
    }

    fn close(a: &Triangle, b: &Triangle) -> bool {
        a.vertices()
            .iter()
            .zip(b.vertices().iter())
            .all(|(p, q)| (p - q).norm() < 1e-4)
    }

    #[test]
    fn test_identity_keeps_triangle() {
        let t = sample();
        assert!(Transform::identity().is_identity());
        assert_eq!(Transform::identity().apply(&t), t);
    }

    #[test]
    fn test_inverse_round_trip() {
        let transform = Transform::identity()
            .then(Motion::RotateCentroid(0.4))
            .then(Motion::RotateCentroidY(-0.9))
            .then(Motion::ScaleFromCentroid(1.5))
            .then(Motion::Translate([1.0, -2.0, 0.5]))
            .then(Motion::RotateOrigin(0.2));
        let t = sample();
        let back = transform.inverse().apply(&transform.apply(&t));
        assert!(close(&back, &t));
        assert_eq!(back.color(), t.color());
    }

    #[test]
    fn test_motion_serde_names() {
        let transform: Transform =
            serde_json::from_str(r#"[{"rotate_centroid": 0.05}, {"translate": [0, 0, -1]}]"#)
                .unwrap();
        assert_eq!(
            transform.motions(),
            &[Motion::RotateCentroid(0.05), Motion::Translate([0.0, 0.0, -1.0])]
        );
    }
}
