// Copyright @yucwang 2026

pub mod direct;
pub mod mis;
pub mod naive;
pub mod product;

use crate::core::lights::LightSampler;
use crate::core::rng::LcgRng;
use crate::core::scene::Scene;
use crate::math::ray::Ray3f;
use crate::math::spectrum::RGBSpectrum;

/// Transport estimator strategy. Names are validated once at configuration
/// time; per-sample dispatch is a plain match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegratorKind {
    Naive,
    Product,
    Direct,
    Mis,
}

impl IntegratorKind {
    pub fn from_name(name: &str) -> std::result::Result<Self, String> {
        match name {
            "naive" => Ok(IntegratorKind::Naive),
            "product" => Ok(IntegratorKind::Product),
            "direct" => Ok(IntegratorKind::Direct),
            "mis" => Ok(IntegratorKind::Mis),
            _ => Err(format!(
                "unknown integrator: {} (expected naive, product, direct or mis)",
                name
            )),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            IntegratorKind::Naive => "naive",
            IntegratorKind::Product => "product",
            IntegratorKind::Direct => "direct",
            IntegratorKind::Mis => "mis",
        }
    }
}

pub fn estimate_li(kind: IntegratorKind,
                   scene: &Scene,
                   lights: &LightSampler,
                   ray: &Ray3f,
                   bounces: u32,
                   rng: &mut LcgRng) -> RGBSpectrum {
    match kind {
        IntegratorKind::Naive => naive::estimate_li(scene, lights, ray, bounces, rng),
        IntegratorKind::Product => product::estimate_li(scene, lights, ray, bounces, rng),
        IntegratorKind::Direct => direct::estimate_li(scene, lights, ray, bounces, rng),
        IntegratorKind::Mis => mis::estimate_li(scene, lights, ray, bounces, rng),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scene::{Instance, Material, Scene};
    use crate::core::shape::{Shape, Topology};
    use crate::math::constants::Vector3f;

    #[test]
    fn test_integrator_names_round_trip() {
        for name in &["naive", "product", "direct", "mis"] {
            let kind = IntegratorKind::from_name(name).expect("known name");
            assert_eq!(kind.name(), *name);
        }
    }

    #[test]
    fn test_unknown_integrator_rejected() {
        let err = IntegratorKind::from_name("bidirectional").unwrap_err();
        assert!(err.contains("bidirectional"));
    }

    fn emissive_cover_scene(e: f32) -> Scene {
        let mut scene = Scene::new();
        let shape = scene.add_shape(Shape::new(
            vec![
                Vector3f::new(-100.0, -100.0, -1.0),
                Vector3f::new(100.0, -100.0, -1.0),
                Vector3f::new(0.0, 100.0, -1.0),
            ],
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Topology::Triangles(vec![[0, 1, 2]]),
        ));
        let material = scene.add_material(Material {
            kd: crate::math::spectrum::RGBSpectrum::default(),
            ks: crate::math::spectrum::RGBSpectrum::default(),
            ke: crate::math::spectrum::RGBSpectrum::gray(e),
            rs: 0.0,
            kd_texture: None,
            ke_texture: None,
        });
        scene.add_instance(Instance { shape, material });
        scene.build_bvh();
        scene
    }

    #[test]
    fn test_all_integrators_agree_on_pure_emission() {
        let scene = emissive_cover_scene(2.5);
        let lights = LightSampler::build(&scene);
        let ray = Ray3f::new(Vector3f::new(0.0, 0.0, 1.0),
                             Vector3f::new(0.0, 0.0, -1.0), None, None);

        for kind in &[IntegratorKind::Naive, IntegratorKind::Product,
                      IntegratorKind::Direct, IntegratorKind::Mis] {
            for bounces in &[0u32, 1, 4] {
                let mut rng = LcgRng::new(5);
                let li = estimate_li(*kind, &scene, &lights, &ray, *bounces, &mut rng);
                assert_eq!(li, crate::math::spectrum::RGBSpectrum::gray(2.5),
                           "integrator {:?} bounces {}", kind, bounces);
            }
        }
    }

    #[test]
    fn test_all_integrators_black_on_void() {
        let mut scene = Scene::new();
        scene.build_bvh();
        let lights = LightSampler::build(&scene);
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, -1.0), None, None);

        for kind in &[IntegratorKind::Naive, IntegratorKind::Product,
                      IntegratorKind::Direct, IntegratorKind::Mis] {
            let mut rng = LcgRng::new(9);
            let li = estimate_li(*kind, &scene, &lights, &ray, 4, &mut rng);
            assert!(li.is_black());
        }
    }
}
