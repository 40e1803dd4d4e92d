/// Built-in scene used when no scene file is given
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use trirast_core::config::{AnimationConfig, CameraConfig, TriangleConfig};
use trirast_core::geometry::cube;
use trirast_core::transform::Motion;
use trirast_core::{SceneConfig, Vector};

fn array(v: Vector) -> [f32; 3] {
    [v.x, v.y, v.z]
}

fn face_colors() -> [Vector; 6] {
    [
        Vector::new(220.0, 60.0, 60.0),
        Vector::new(60.0, 200.0, 90.0),
        Vector::new(70.0, 110.0, 230.0),
        Vector::new(235.0, 200.0, 60.0),
        Vector::new(60.0, 210.0, 220.0),
        Vector::new(210.0, 80.0, 210.0),
    ]
}

/// A colored cube seen from above and to the side, spinning about z.
pub fn demo_config() -> SceneConfig {
    let triangles = cube(2.0, face_colors())
        .into_iter()
        .map(|t| TriangleConfig {
            a: array(t.a()),
            b: array(t.b()),
            c: array(t.c()),
            color: array(t.color()),
        })
        .collect();

    SceneConfig {
        camera: CameraConfig {
            position: [3.0, 2.5, 4.0],
            ..CameraConfig::default()
        },
        triangles,
        animation: AnimationConfig {
            frames: 120,
            fps: 30,
            motion: vec![Motion::RotateOrigin(0.05)],
        },
        ..SceneConfig::default()
    }
}

/// Load `path`, or the demo scene when absent.
///
/// Returns the configuration and the directory mesh paths are relative to.
pub fn load_or_demo(path: Option<&Path>) -> Result<(SceneConfig, PathBuf)> {
    match path {
        Some(path) => {
            let config = SceneConfig::load(path)
                .with_context(|| format!("Failed to load scene: {}", path.display()))?;
            let base = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            Ok((config, base))
        }
        None => {
            log::info!("no scene file given, using the demo cube");
            Ok((demo_config(), PathBuf::from(".")))
        }
    }
}
