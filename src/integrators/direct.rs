// Copyright @yucwang 2026

use crate::core::brdf::{eval_brdfcos, sample_brdfcos, weight_brdfcos};
use crate::core::lights::LightSampler;
use crate::core::point::ShadePoint;
use crate::core::rng::LcgRng;
use crate::core::scene::Scene;
use crate::math::constants::EPSILON;
use crate::math::ray::Ray3f;
use crate::math::spectrum::RGBSpectrum;

/// Next-event estimation at every shaded point plus one BRDF-sampled
/// continuation ray, recursing with Russian roulette.
pub fn estimate_li(scene: &Scene,
                   lights: &LightSampler,
                   ray: &Ray3f,
                   bounces: u32,
                   rng: &mut LcgRng) -> RGBSpectrum {
    let point = scene.intersect_point(ray);
    point.le + shade(scene, lights, &point, bounces, rng)
}

// Reflected radiance leaving `point` toward `point.wo`, excluding the
// point's own emission.
fn shade(scene: &Scene,
         lights: &LightSampler,
         point: &ShadePoint,
         bounces: u32,
         rng: &mut LcgRng) -> RGBSpectrum {
    if point.emission_only() || bounces == 0 {
        return RGBSpectrum::default();
    }

    let mut radiance = RGBSpectrum::default();

    // Next-event estimation; a missing light set simply contributes
    // nothing for this bounce.
    if let Some(lp) = lights.sample(scene, point, rng) {
        let light_weight = lights.weight(&point.p, &lp);
        if light_weight > 0.0 && !lp.le.is_black() {
            let wi = -lp.wo;
            radiance += lp.le * eval_brdfcos(point, &wi) * light_weight;
        }
    }

    // One indirect bounce sampled from the BRDF.
    let wi = sample_brdfcos(point, rng);
    let brdf_weight = weight_brdfcos(point, &wi);
    if brdf_weight <= 0.0 {
        return radiance;
    }
    let f = eval_brdfcos(point, &wi);
    if f.is_black() {
        return radiance;
    }

    let next = Ray3f::new(point.p, wi, Some(EPSILON), None);
    let hit = scene.intersect_point(&next);

    // Emission along the sampled ray counts only where the light sampler
    // could not have produced it (environment hits, or no lights at all);
    // next-event estimation already covers the rest.
    if !hit.le.is_black() && lights.pdf(&point.p, &hit) <= 0.0 {
        radiance += hit.le * f * brdf_weight;
    }

    let contribution = f * brdf_weight;
    let pr = contribution.max_component().min(1.0);
    if bounces > 1 && pr > 0.0 && rng.next_f32() <= pr {
        radiance += shade(scene, lights, &hit, bounces - 1, rng) * contribution / pr;
    }

    radiance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scene::{Instance, Material, Scene};
    use crate::core::shape::{Shape, Topology};
    use crate::math::constants::{Float, Vector3f, PI};

    // A unit-ish emissive quad directly above a lambertian floor; the
    // analytic direct irradiance at the floor center under the quad is
    // close to E * area * cos^2 / (pi d^2) for a small far light, which we
    // use as a loose sanity target.
    fn floor_and_light(light_half: Float, height: Float) -> Scene {
        let mut scene = Scene::new();

        let floor = scene.add_shape(Shape::new(
            vec![
                Vector3f::new(-50.0, -50.0, 0.0),
                Vector3f::new(50.0, -50.0, 0.0),
                Vector3f::new(50.0, 50.0, 0.0),
                Vector3f::new(-50.0, 50.0, 0.0),
            ],
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Topology::Triangles(vec![[0, 1, 2], [0, 2, 3]]),
        ));
        let matte = scene.add_material(Material {
            kd: RGBSpectrum::gray(1.0),
            ks: RGBSpectrum::default(),
            ke: RGBSpectrum::default(),
            rs: 0.0,
            kd_texture: None,
            ke_texture: None,
        });
        scene.add_instance(Instance { shape: floor, material: matte });

        let light = scene.add_shape(Shape::new(
            vec![
                Vector3f::new(-light_half, -light_half, height),
                Vector3f::new(light_half, -light_half, height),
                Vector3f::new(light_half, light_half, height),
                Vector3f::new(-light_half, light_half, height),
            ],
            Vec::new(),
            Vec::new(),
            Vec::new(),
            // Wound downward, toward the floor.
            Topology::Triangles(vec![[0, 2, 1], [0, 3, 2]]),
        ));
        let emitter = scene.add_material(Material {
            kd: RGBSpectrum::default(),
            ks: RGBSpectrum::default(),
            ke: RGBSpectrum::gray(1.0),
            rs: 0.0,
            kd_texture: None,
            ke_texture: None,
        });
        scene.add_instance(Instance { shape: light, material: emitter });

        scene.build_bvh();
        scene
    }

    #[test]
    fn test_direct_lighting_monte_carlo_consistency() {
        let light_half = 0.25;
        let height = 4.0;
        let scene = floor_and_light(light_half, height);
        let lights = LightSampler::build(&scene);

        // Shade the floor just off center, viewed from above.
        let ray = Ray3f::new(Vector3f::new(0.01, 0.02, 1.0),
                             Vector3f::new(0.0, 0.0, -1.0), None, None);

        let samples = 4096;
        let mut sum = 0.0;
        let mut rng = LcgRng::new(123);
        for _ in 0..samples {
            let li = estimate_li(&scene, &lights, &ray, 1, &mut rng);
            assert!(li.is_finite());
            sum += li[0];
        }
        let mean = sum / samples as Float;

        let area = (2.0 * light_half) * (2.0 * light_half);
        let expected = area / (PI * height * height);
        // Small-source approximation plus Monte Carlo noise: stay loose.
        assert!((mean - expected).abs() < 0.35 * expected,
                "mean {} vs expected {}", mean, expected);
    }
}
