//! JSON scene description.
//!
//! ```json
//! {
//!   "width": 800,
//!   "height": 600,
//!   "camera": { "position": [0, 0, 5], "target": [0, 0, 0], "fov_degrees": 45 },
//!   "render": { "near_plane": "clip", "ambient": 0.3 },
//!   "triangles": [
//!     { "a": [-1, -1, 0], "b": [1, -1, 0], "c": [0, 1, 0], "color": [255, 0, 0] }
//!   ],
//!   "meshes": [{ "path": "part.stl", "color": [200, 200, 200], "scale": 0.1 }],
//!   "animation": { "frames": 120, "fps": 30, "motion": [{ "rotate_centroid_y": 0.05 }] }
//! }
//! ```
//!
//! Mesh paths are resolved relative to the directory passed to
//! [`SceneConfig::build_scene`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::RenderError;
use crate::geometry::{Triangle, Vector};
use crate::projection::Camera;
use crate::raster::RenderOptions;
use crate::scene::Scene;
use crate::stl;
use crate::transform::{Motion, Transform};

fn vector(v: [f32; 3]) -> Vector {
    Vector::new(v[0], v[1], v[2])
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub up: [f32; 3],
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 5.0],
            target: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
            fov_degrees: 45.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl CameraConfig {
    pub fn build(&self) -> Result<Camera, RenderError> {
        Camera::new(
            vector(self.position),
            vector(self.target),
            vector(self.up),
            self.fov_degrees.to_radians(),
            self.near,
            self.far,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TriangleConfig {
    pub a: [f32; 3],
    pub b: [f32; 3],
    pub c: [f32; 3],
    #[serde(default = "default_color")]
    pub color: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeshConfig {
    pub path: PathBuf,
    #[serde(default = "default_color")]
    pub color: [f32; 3],
    /// Uniform scale about the origin, applied before `offset`.
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default)]
    pub offset: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnimationConfig {
    pub frames: usize,
    pub fps: u32,
    pub motion: Vec<Motion>,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            frames: 60,
            fps: 30,
            motion: vec![Motion::RotateCentroid(0.05)],
        }
    }
}

impl AnimationConfig {
    pub fn transform(&self) -> Transform {
        Transform::new(self.motion.clone())
    }
}

fn default_color() -> [f32; 3] {
    [255.0, 255.0, 255.0]
}

fn default_scale() -> f32 {
    1.0
}

/// A complete scene description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    pub width: usize,
    pub height: usize,
    pub camera: CameraConfig,
    pub render: RenderOptions,
    pub triangles: Vec<TriangleConfig>,
    pub meshes: Vec<MeshConfig>,
    pub animation: AnimationConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            camera: CameraConfig::default(),
            render: RenderOptions::default(),
            triangles: Vec::new(),
            meshes: Vec::new(),
            animation: AnimationConfig::default(),
        }
    }
}

impl SceneConfig {
    pub fn from_json(text: &str) -> Result<Self, RenderError> {
        serde_json::from_str(text).map_err(|e| RenderError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RenderError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| RenderError::io(path, e))?;
        let config = Self::from_json(&text)?;
        log::debug!(
            "loaded {} with {} triangles and {} meshes",
            path.display(),
            config.triangles.len(),
            config.meshes.len()
        );
        Ok(config)
    }

    /// Build the camera and triangle list, loading meshes relative to `base_dir`.
    pub fn build_scene(&self, base_dir: &Path) -> Result<Scene, RenderError> {
        let mut scene = Scene::new(self.camera.build()?).with_options(self.render);

        scene.extend(
            self.triangles
                .iter()
                .map(|t| Triangle::new(vector(t.a), vector(t.b), vector(t.c), vector(t.color))),
        );

        for mesh in &self.meshes {
            let path = base_dir.join(&mesh.path);
            let data = fs::read(&path).map_err(|e| RenderError::io(&path, e))?;
            let mut triangles = stl::parse_stl(&data, vector(mesh.color)).map_err(|source| {
                RenderError::Stl {
                    path: path.clone(),
                    source,
                }
            })?;
            let offset = vector(mesh.offset);
            for t in &mut triangles {
                // Scale about the origin: scale about the centroid, then move
                // the centroid by the same factor.
                let centroid = t.centroid();
                t.scale_from_centroid(mesh.scale);
                t.translate(centroid * (mesh.scale - 1.0) + offset);
            }
            log::info!("loaded {} triangles from {}", triangles.len(), path.display());
            scene.extend(triangles);
        }

        if scene.is_empty() {
            log::warn!("scene description contains no triangles");
        }
        Ok(scene)
    }
}
