// Copyright @yucwang 2026

use crate::core::point::ShadePoint;
use crate::core::rng::LcgRng;
use crate::core::shape::GeometryKind;
use crate::core::tangent_frame::{build_tangent_frame, local_to_world, world_to_local};
use crate::math::constants::{ Float, INV_PI, PI, TWO_PI, Vector2f, Vector3f };
use crate::math::spectrum::RGBSpectrum;
use crate::math::warp::{
    sample_cosine_hemisphere, sample_cosine_hemisphere_pdf,
    sample_uniform_sphere, sample_uniform_sphere_pdf,
};

fn sin_from_cos(cos_theta: Float) -> Float {
    (1.0 - cos_theta * cos_theta).max(0.0).min(1.0).sqrt()
}

fn roughness_to_alpha(rs: Float) -> Float {
    (rs * rs).max(1e-4)
}

pub fn ggx_d(cos_theta: Float, alpha: Float) -> Float {
    if cos_theta <= 0.0 {
        return 0.0;
    }
    let a2 = alpha * alpha;
    let cos2 = cos_theta * cos_theta;
    let denom = cos2 * (a2 - 1.0) + 1.0;
    a2 / (PI * denom * denom)
}

pub fn ggx_g1(cos_theta: Float, alpha: Float) -> Float {
    if cos_theta <= 0.0 {
        return 0.0;
    }
    let cos2 = cos_theta * cos_theta;
    let sin2 = (1.0 - cos2).max(0.0);
    if sin2 <= 0.0 {
        return 1.0;
    }
    let tan2 = sin2 / cos2.max(1e-6);
    let root = (1.0 + alpha * alpha * tan2).sqrt();
    2.0 / (1.0 + root)
}

pub fn ggx_g(cos_i: Float, cos_o: Float, alpha: Float) -> Float {
    ggx_g1(cos_i, alpha) * ggx_g1(cos_o, alpha)
}

/// Half vector drawn proportionally to `D(h) cos(h)`, in the local frame.
pub fn sample_ggx(u: &Vector2f, alpha: Float) -> Vector3f {
    let phi = TWO_PI * u.x;
    let u2 = u.y.min(1.0 - 1e-6).max(0.0);
    let tan2 = (alpha * alpha) * u2 / (1.0 - u2).max(1e-6);
    let cos_theta = 1.0 / (1.0 + tan2).sqrt();
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    Vector3f::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

pub fn reflect(wo: Vector3f, m: Vector3f) -> Vector3f {
    m * (2.0 * wo.dot(&m)) - wo
}

// Solid-angle density of the reflected direction under ggx half-vector
// sampling, in the local frame.
fn pdf_ggx_reflection(wo: Vector3f, wi: Vector3f, alpha: Float) -> Float {
    let h = wo + wi;
    let len = h.norm();
    if len <= 1e-8 {
        return 0.0;
    }
    let h = h / len;
    let o_dot_h = wo.dot(&h);
    if h.z <= 0.0 || o_dot_h <= 1e-6 {
        return 0.0;
    }
    ggx_d(h.z, alpha) * h.z / (4.0 * o_dot_h)
}

/// BRDF times the incoming cosine, dispatched on the primitive kind of the
/// shaded point. Zero for emission-only points.
pub fn eval_brdfcos(point: &ShadePoint, wi: &Vector3f) -> RGBSpectrum {
    if point.emission_only() {
        return RGBSpectrum::default();
    }
    match point.kind {
        GeometryKind::Points => eval_points(point, wi),
        GeometryKind::Lines => eval_lines(point, wi),
        GeometryKind::Triangles => eval_triangles(point, wi),
    }
}

// Isotropic lobe with a forward bias; the bias term is clamped so the
// value stays non-negative over the whole sphere.
fn eval_points(point: &ShadePoint, wi: &Vector3f) -> RGBSpectrum {
    let bias = (2.0 * point.wo.dot(wi) + 1.0).max(0.0);
    (point.kd + point.ks) * (bias / TWO_PI)
}

// Hair-style fiber model; `n` holds the fiber tangent.
fn eval_lines(point: &ShadePoint, wi: &Vector3f) -> RGBSpectrum {
    let tangent = point.n;
    let sin_i = sin_from_cos(tangent.dot(wi));
    let sin_o = sin_from_cos(tangent.dot(&point.wo));

    let mut result = RGBSpectrum::default();
    if !point.kd.is_black() {
        result += point.kd * (sin_i * INV_PI);
    }
    if !point.ks.is_black() && point.rs > 0.0 && sin_i > 0.0 && sin_o > 0.0 {
        let h = (point.wo + *wi).normalize();
        let sin_h = sin_from_cos(tangent.dot(&h));
        let ns = 2.0 / (point.rs * point.rs) - 2.0;
        let d = (ns + 2.0) * sin_h.powf(ns) / (2.0 + PI);
        result += point.ks * (sin_i * d / (4.0 * sin_i * sin_o));
    }
    result
}

// Lambertian plus ggx microfacet lobe, upper hemisphere only.
fn eval_triangles(point: &ShadePoint, wi: &Vector3f) -> RGBSpectrum {
    let cos_i = point.n.dot(wi);
    let cos_o = point.n.dot(&point.wo);
    if cos_i <= 0.0 || cos_o <= 0.0 {
        return RGBSpectrum::default();
    }

    let mut result = point.kd * (cos_i * INV_PI);
    if !point.ks.is_black() {
        let h = (point.wo + *wi).normalize();
        let alpha = roughness_to_alpha(point.rs);
        let d = ggx_d(point.n.dot(&h), alpha);
        let g = ggx_g(cos_i, cos_o, alpha);
        result += point.ks * (d * g / (4.0 * cos_o * cos_i) * cos_i);
    }
    result
}

/// Draws an incoming direction for the point. Point and line kinds sample
/// the full sphere uniformly; triangles mix cosine-hemisphere and ggx
/// half-vector sampling when a specular lobe is present.
pub fn sample_brdfcos(point: &ShadePoint, rng: &mut LcgRng) -> Vector3f {
    match point.kind {
        GeometryKind::Points | GeometryKind::Lines => sample_uniform_sphere(&rng.next_2d()),
        GeometryKind::Triangles => {
            let (tangent, bitangent) = build_tangent_frame(&point.n);
            let local = if point.ks.is_black() || rng.next_f32() < 0.5 {
                sample_cosine_hemisphere(&rng.next_2d())
            } else {
                let wo_local = world_to_local(&point.wo, &tangent, &bitangent, &point.n);
                let h = sample_ggx(&rng.next_2d(), roughness_to_alpha(point.rs));
                reflect(wo_local, h)
            };
            local_to_world(&local, &tangent, &bitangent, &point.n)
        }
    }
}

/// Reciprocal of the exact density `sample_brdfcos` uses for `wi`; zero
/// when the direction is unreachable.
pub fn weight_brdfcos(point: &ShadePoint, wi: &Vector3f) -> Float {
    if point.emission_only() {
        return 0.0;
    }
    let pdf = match point.kind {
        GeometryKind::Points | GeometryKind::Lines => sample_uniform_sphere_pdf(),
        GeometryKind::Triangles => {
            let cos_i = point.n.dot(wi);
            let diffuse = sample_cosine_hemisphere_pdf(cos_i.max(0.0));
            if point.ks.is_black() {
                diffuse
            } else {
                let (tangent, bitangent) = build_tangent_frame(&point.n);
                let wo_local = world_to_local(&point.wo, &tangent, &bitangent, &point.n);
                let wi_local = world_to_local(wi, &tangent, &bitangent, &point.n);
                let specular = pdf_ggx_reflection(wo_local, wi_local,
                                                  roughness_to_alpha(point.rs));
                0.5 * diffuse + 0.5 * specular
            }
        }
    };
    if pdf > 0.0 {
        1.0 / pdf
    } else {
        0.0
    }
}
