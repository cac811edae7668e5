// Copyright @yucwang 2026

use crate::core::brdf::{eval_brdfcos, sample_brdfcos, weight_brdfcos};
use crate::core::lights::LightSampler;
use crate::core::point::ShadePoint;
use crate::core::rng::LcgRng;
use crate::core::scene::Scene;
use crate::math::constants::{ EPSILON, Float };
use crate::math::ray::Ray3f;
use crate::math::spectrum::RGBSpectrum;

pub(crate) fn balance_heuristic(pdf_a: Float, pdf_b: Float) -> Float {
    if pdf_a <= 0.0 {
        return 0.0;
    }
    pdf_a / (pdf_a + pdf_b)
}

/// Light sampling and BRDF sampling combined with the balance heuristic at
/// every bounce. Both densities are expressed in solid angle before they
/// are mixed.
pub fn estimate_li(scene: &Scene,
                   lights: &LightSampler,
                   ray: &Ray3f,
                   bounces: u32,
                   rng: &mut LcgRng) -> RGBSpectrum {
    let point = scene.intersect_point(ray);
    point.le + shade(scene, lights, &point, bounces, rng)
}

fn shade(scene: &Scene,
         lights: &LightSampler,
         point: &ShadePoint,
         bounces: u32,
         rng: &mut LcgRng) -> RGBSpectrum {
    if point.emission_only() || bounces == 0 {
        return RGBSpectrum::default();
    }

    let mut radiance = RGBSpectrum::default();

    // Light-sampling strategy.
    if let Some(lp) = lights.sample(scene, point, rng) {
        let pdf_light = lights.pdf(&point.p, &lp);
        if pdf_light > 0.0 && !lp.le.is_black() {
            let wi = -lp.wo;
            let brdf_weight = weight_brdfcos(point, &wi);
            let pdf_brdf = if brdf_weight > 0.0 { 1.0 / brdf_weight } else { 0.0 };
            let mis = balance_heuristic(pdf_light, pdf_brdf);
            radiance += lp.le * eval_brdfcos(point, &wi) * (mis / pdf_light);
        }
    }

    // BRDF-sampling strategy.
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

    if !hit.le.is_black() {
        let pdf_brdf = 1.0 / brdf_weight;
        let pdf_light = lights.pdf(&point.p, &hit);
        let mis = balance_heuristic(pdf_brdf, pdf_light);
        radiance += hit.le * f * (mis * brdf_weight);
    }

    let contribution = f * brdf_weight;
    let pr = contribution.max_component().min(1.0);
    if bounces > 1 && pr > 0.0 && rng.next_f32() <= pr {
        radiance += shade(scene, lights, &hit, bounces - 1, rng) * contribution / pr;
    }

    radiance
}
