// Copyright @yucwang 2026

use crate::core::lights::LightSampler;
use crate::core::rng::LcgRng;
use crate::core::scene::Scene;
use crate::core::tangent_frame::{build_tangent_frame, local_to_world};
use crate::math::constants::{ EPSILON, INV_PI };
use crate::math::ray::Ray3f;
use crate::math::spectrum::RGBSpectrum;
use crate::math::warp::{sample_cosine_hemisphere, sample_cosine_hemisphere_pdf};

/// Brute-force path tracing: cosine-sampled diffuse bounces only, no
/// next-event estimation. Recursion depth is bounded by `bounces`.
pub fn estimate_li(scene: &Scene,
                   lights: &LightSampler,
                   ray: &Ray3f,
                   bounces: u32,
                   rng: &mut LcgRng) -> RGBSpectrum {
    let point = scene.intersect_point(ray);
    if point.emission_only() || bounces == 0 {
        return point.le;
    }

    let (tangent, bitangent) = build_tangent_frame(&point.n);
    let local = sample_cosine_hemisphere(&rng.next_2d());
    let wi = local_to_world(&local, &tangent, &bitangent, &point.n);
    let cos_theta = point.n.dot(&wi).max(0.0);
    let pdf = sample_cosine_hemisphere_pdf(cos_theta);
    if pdf <= 0.0 {
        return point.le;
    }

    // Per-bounce throughput factor; for a diffuse lobe under cosine
    // sampling this reduces to kd.
    let contribution = point.kd * (cos_theta * INV_PI / pdf);
    let pr = contribution.max_component().min(1.0);
    if rng.next_f32() > pr {
        return point.le;
    }

    let next = Ray3f::new(point.p, wi, Some(EPSILON), None);
    let indirect = estimate_li(scene, lights, &next, bounces - 1, rng);
    point.le + indirect * contribution / pr
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scene::{Environment, Scene};
    use crate::math::constants::Vector3f as V3;

    #[test]
    fn test_environment_only_returns_emission() {
        let mut scene = Scene::new();
        scene.add_environment(Environment {
            emission: RGBSpectrum::new(0.25, 0.5, 1.0),
            texture: None,
        });
        scene.build_bvh();
        let lights = LightSampler::build(&scene);

        let ray = Ray3f::new(V3::zeros(), V3::new(0.3, -0.2, -1.0), None, None);
        let mut rng = LcgRng::new(1);
        let li = estimate_li(&scene, &lights, &ray, 0, &mut rng);
        assert_eq!(li, RGBSpectrum::new(0.25, 0.5, 1.0));
    }
}
