// Copyright @yucwang 2026

use crate::core::lights::LightSampler;
use crate::core::rng::LcgRng;
use crate::core::scene::{Camera, Scene};
use crate::integrators::{estimate_li, IntegratorKind};
use crate::math::bitmap::Bitmap;
use crate::math::constants::{Float, Vector4f};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::mpsc;
use std::thread;

#[derive(Debug, Clone, Copy)]
pub struct RenderParams {
    /// Vertical resolution; the width follows from the camera aspect.
    pub resolution: usize,
    pub samples: u32,
    pub bounces: u32,
    pub integrator: IntegratorKind,
    pub parallel: bool,
    pub camera_id: usize,
}

/// Batch renderer: partitions rows across scoped workers, runs them to
/// completion and joins once. Per-pixel seeding depends only on the pixel
/// index, so sequential and parallel runs produce identical images.
pub struct SimpleRenderer {
    params: RenderParams,
}

impl SimpleRenderer {
    pub fn new(params: RenderParams) -> Self {
        Self { params }
    }

    pub fn render(&self, scene: &Scene) -> std::result::Result<Bitmap, String> {
        let params = self.params;
        if params.resolution == 0 {
            return Err(String::from("resolution must be positive"));
        }
        if params.samples == 0 {
            return Err(String::from("sample count must be at least 1"));
        }
        let camera = scene
            .camera(params.camera_id)
            .ok_or_else(|| format!("camera {} does not exist", params.camera_id))?;

        let height = params.resolution;
        let width = (camera.aspect * height as Float).round() as usize;
        if width == 0 {
            return Err(String::from("camera aspect collapses the image width"));
        }

        let lights = LightSampler::build(scene);
        log::info!(
            "rendering {}x{} at {} spp, {} bounces, {} integrator",
            width, height, params.samples, params.bounces, params.integrator.name()
        );

        let mut bitmap = Bitmap::new(width, height);
        let progress = ProgressBar::new(height as u64);
        progress.set_style(
            ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} rows")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let thread_count = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        if params.parallel && thread_count > 1 {
            let (tx, rx) = mpsc::channel::<(usize, Vec<Vector4f>)>();
            let lights = &lights;
            thread::scope(|scope| {
                for worker in 0..thread_count {
                    let tx = tx.clone();
                    scope.spawn(move || {
                        for row in worker_rows(height, thread_count, worker) {
                            let cells = render_row(scene, lights, camera, &params, row, width);
                            if tx.send((row, cells)).is_err() {
                                break;
                            }
                        }
                    });
                }

                drop(tx);
                for _ in 0..height {
                    if let Ok((row, cells)) = rx.recv() {
                        bitmap.set_row(row, cells);
                        progress.inc(1);
                    }
                }
            });
        } else {
            for row in 0..height {
                let cells = render_row(scene, &lights, camera, &params, row, width);
                bitmap.set_row(row, cells);
                progress.inc(1);
            }
        }
        progress.finish_and_clear();
        Ok(bitmap)
    }
}

/// Rows owned by one worker: the round-robin interleave
/// `row % workers == worker`. Workers cover all rows disjointly.
pub fn worker_rows(height: usize, workers: usize, worker: usize) -> impl Iterator<Item = usize> {
    (worker..height).step_by(workers.max(1))
}

fn render_row(scene: &Scene,
              lights: &LightSampler,
              camera: &Camera,
              params: &RenderParams,
              row: usize,
              width: usize) -> Vec<Vector4f> {
    let inv_samples = 1.0 / params.samples as Float;
    let mut cells = Vec::with_capacity(width);
    for col in 0..width {
        let mut rng = LcgRng::new((row * width + col) as u64);
        let mut accum = Vector4f::zeros();
        for _ in 0..params.samples {
            let ray = camera.sample_ray(col, row, params.resolution, &mut rng);
            let li = estimate_li(params.integrator, scene, lights, &ray, params.bounces, &mut rng);
            // Non-finite samples are dropped from the numerator but still
            // count in the divisor.
            if li.is_finite() {
                accum += Vector4f::new(li[0], li[1], li[2], 1.0);
            }
        }
        cells.push(accum * inv_samples);
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scene::{Environment, Instance, Material, Scene};
    use crate::core::shape::{Shape, Topology};
    use crate::math::constants::Vector3f;
    use crate::math::spectrum::RGBSpectrum;

    fn test_camera() -> Camera {
        Camera::look_at(
            Vector3f::new(0.0, 0.0, 1.0),
            Vector3f::new(0.0, 0.0, 0.0),
            Vector3f::new(0.0, 1.0, 0.0),
            std::f32::consts::FRAC_PI_2,
            1.0,
        )
    }

    fn params(integrator: IntegratorKind, parallel: bool) -> RenderParams {
        RenderParams {
            resolution: 4,
            samples: 4,
            bounces: 3,
            integrator,
            parallel,
            camera_id: 0,
        }
    }

    #[test]
    fn test_worker_rows_cover_disjointly() {
        let height = 23;
        for workers in 1..6 {
            let mut seen = vec![0usize; height];
            for worker in 0..workers {
                for row in worker_rows(height, workers, worker) {
                    assert_eq!(row % workers, worker);
                    seen[row] += 1;
                }
            }
            assert!(seen.iter().all(|&count| count == 1));
        }
    }

    #[test]
    fn test_missing_camera_fails_fast() {
        let mut scene = Scene::new();
        scene.build_bvh();
        let renderer = SimpleRenderer::new(params(IntegratorKind::Naive, false));
        assert!(renderer.render(&scene).is_err());
    }

    #[test]
    fn test_environment_render_is_constant() {
        let mut scene = Scene::new();
        scene.add_camera(test_camera());
        scene.add_environment(Environment {
            emission: RGBSpectrum::gray(2.0),
            texture: None,
        });
        scene.build_bvh();

        let renderer = SimpleRenderer::new(RenderParams {
            bounces: 0,
            ..params(IntegratorKind::Naive, false)
        });
        let image = renderer.render(&scene).expect("render");
        assert_eq!(image.width(), 4);
        assert_eq!(image.height(), 4);
        for pixel in image.pixels() {
            assert_eq!(*pixel, Vector4f::new(2.0, 2.0, 2.0, 1.0));
        }
    }

    fn emissive_cover_scene(e: Float) -> Scene {
        let mut scene = Scene::new();
        scene.add_camera(test_camera());
        let shape = scene.add_shape(Shape::new(
            vec![
                Vector3f::new(-1000.0, -1000.0, -1.0),
                Vector3f::new(1000.0, -1000.0, -1.0),
                Vector3f::new(0.0, 1000.0, -1.0),
            ],
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Topology::Triangles(vec![[0, 1, 2]]),
        ));
        let material = scene.add_material(Material {
            kd: RGBSpectrum::default(),
            ks: RGBSpectrum::default(),
            ke: RGBSpectrum::gray(e),
            rs: 0.0,
            kd_texture: None,
            ke_texture: None,
        });
        scene.add_instance(Instance { shape, material });
        scene.build_bvh();
        scene
    }

    #[test]
    fn test_emissive_cover_renders_emission_for_all_integrators() {
        let scene = emissive_cover_scene(2.5);
        for integrator in &[IntegratorKind::Naive, IntegratorKind::Product,
                            IntegratorKind::Direct, IntegratorKind::Mis] {
            let renderer = SimpleRenderer::new(params(*integrator, false));
            let image = renderer.render(&scene).expect("render");
            for pixel in image.pixels() {
                assert_eq!(*pixel, Vector4f::new(2.5, 2.5, 2.5, 1.0),
                           "integrator {:?}", integrator);
            }
        }
    }

    #[test]
    fn test_parallel_matches_sequential_bitwise() {
        let scene = emissive_cover_scene(1.5);
        let sequential = SimpleRenderer::new(params(IntegratorKind::Direct, false))
            .render(&scene)
            .expect("render");
        let parallel_a = SimpleRenderer::new(params(IntegratorKind::Direct, true))
            .render(&scene)
            .expect("render");
        let parallel_b = SimpleRenderer::new(params(IntegratorKind::Direct, true))
            .render(&scene)
            .expect("render");

        assert_eq!(sequential.pixels(), parallel_a.pixels());
        assert_eq!(parallel_a.pixels(), parallel_b.pixels());
    }
}
