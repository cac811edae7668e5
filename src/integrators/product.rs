// Copyright @yucwang 2026

use crate::core::lights::LightSampler;
use crate::core::rng::LcgRng;
use crate::core::scene::Scene;
use crate::core::tangent_frame::{build_tangent_frame, local_to_world};
use crate::math::constants::{ EPSILON, INV_PI };
use crate::math::ray::Ray3f;
use crate::math::spectrum::RGBSpectrum;
use crate::math::warp::{sample_cosine_hemisphere, sample_cosine_hemisphere_pdf};

/// The naive estimator rewritten as an iterative loop over a running
/// throughput. Statistically identical to `naive::estimate_li`; the loop
/// form keeps the stack flat on long paths.
pub fn estimate_li(scene: &Scene,
                   _lights: &LightSampler,
                   ray: &Ray3f,
                   bounces: u32,
                   rng: &mut LcgRng) -> RGBSpectrum {
    let mut radiance = RGBSpectrum::default();
    let mut throughput = RGBSpectrum::white();
    let mut ray = Ray3f::new(ray.origin(), ray.dir(), Some(ray.min_t), Some(ray.max_t));

    let mut bounce = 0;
    loop {
        let point = scene.intersect_point(&ray);
        radiance += throughput * point.le;
        if point.emission_only() || bounce == bounces {
            break;
        }

        let (tangent, bitangent) = build_tangent_frame(&point.n);
        let local = sample_cosine_hemisphere(&rng.next_2d());
        let wi = local_to_world(&local, &tangent, &bitangent, &point.n);
        let cos_theta = point.n.dot(&wi).max(0.0);
        let pdf = sample_cosine_hemisphere_pdf(cos_theta);
        if pdf <= 0.0 {
            break;
        }

        let contribution = point.kd * (cos_theta * INV_PI / pdf);
        let pr = contribution.max_component().min(1.0);
        if rng.next_f32() > pr {
            break;
        }
        throughput = throughput * contribution / pr;

        ray = Ray3f::new(point.p, wi, Some(EPSILON), None);
        bounce += 1;
    }

    radiance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scene::{Environment, Scene};
    use crate::math::constants::Vector3f;

    #[test]
    fn test_matches_environment_emission() {
        let mut scene = Scene::new();
        scene.add_environment(Environment {
            emission: RGBSpectrum::gray(3.0),
            texture: None,
        });
        scene.build_bvh();
        let lights = LightSampler::build(&scene);

        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 1.0, 0.0), None, None);
        let mut rng = LcgRng::new(2);
        let li = estimate_li(&scene, &lights, &ray, 8, &mut rng);
        assert_eq!(li, RGBSpectrum::gray(3.0));
    }
}
