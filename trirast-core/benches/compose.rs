use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use trirast_core::geometry::cube;
use trirast_core::{Camera, Scene, Triangle, Vector};

fn face_colors() -> [Vector; 6] {
    [
        Vector::new(230.0, 60.0, 60.0),
        Vector::new(60.0, 230.0, 60.0),
        Vector::new(60.0, 60.0, 230.0),
        Vector::new(230.0, 230.0, 60.0),
        Vector::new(60.0, 230.0, 230.0),
        Vector::new(230.0, 60.0, 230.0),
    ]
}

fn cube_scene() -> Scene {
    let camera = Camera::new(
        Vector::new(2.0, 2.0, 4.0),
        Vector::zeros(),
        Vector::new(0.0, 1.0, 0.0),
        std::f32::consts::FRAC_PI_4,
        0.1,
        100.0,
    )
    .unwrap();
    let mut scene = Scene::new(camera);
    scene.extend(cube(2.0, face_colors()));
    scene
}

/// Scene of `count` overlapping triangles stacked along the view axis
fn stacked_scene(count: usize) -> Scene {
    let mut scene = Scene::new(Camera::default());
    for i in 0..count {
        let z = -(i as f32) * 0.01;
        let shade = (i * 37 % 200) as f32 + 55.0;
        let mut t = Triangle::new(
            Vector::new(-1.5, -1.5, z),
            Vector::new(1.5, -1.5, z),
            Vector::new(0.0, 1.5, z),
            Vector::new(shade, 255.0 - shade, 128.0),
        );
        t.rotate_around_centroid(i as f32 * 0.1);
        scene.add(t);
    }
    scene
}

/// Benchmark: cube frame at common resolutions
fn bench_compose_cube(c: &mut Criterion) {
    let scene = cube_scene();
    let mut group = c.benchmark_group("compose_cube");

    for (width, height) in [(320, 240), (800, 600), (1920, 1080)] {
        let label = format!("{width}x{height}");
        group.bench_with_input(
            BenchmarkId::new("sequential", &label),
            &(width, height),
            |b, &(w, h)| b.iter(|| black_box(scene.compose_frame(black_box(w), black_box(h)))),
        );
        #[cfg(feature = "parallel")]
        group.bench_with_input(
            BenchmarkId::new("parallel", &label),
            &(width, height),
            |b, &(w, h)| {
                b.iter(|| black_box(scene.compose_frame_parallel(black_box(w), black_box(h))))
            },
        );
    }
    group.finish();
}

/// Benchmark: overdraw cost as the triangle count grows
fn bench_compose_overdraw(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose_overdraw");

    for count in [10, 100, 1000] {
        let scene = stacked_scene(count);
        group.bench_with_input(BenchmarkId::new("sequential", count), &count, |b, _| {
            b.iter(|| black_box(scene.compose_frame(800, 600)))
        });
        #[cfg(feature = "parallel")]
        group.bench_with_input(BenchmarkId::new("parallel", count), &count, |b, _| {
            b.iter(|| black_box(scene.compose_frame_parallel(800, 600)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compose_cube, bench_compose_overdraw);
criterion_main!(benches);
