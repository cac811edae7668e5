// Copyright @yucwang 2026

use crate::core::point::ShadePoint;
use crate::core::rng::LcgRng;
use crate::core::scene::Scene;
use crate::core::shape::GeometryKind;
use crate::math::constants::{ EPSILON, Float, Vector2f, Vector3f };
use crate::math::ray::Ray3f;
use crate::math::warp::square_to_triangle;

struct Light {
    instance: usize,
    kind: GeometryKind,
    /// Cumulative element weights: area for triangles, one per point.
    element_cdf: Vec<Float>,
    weight: Float,
}

/// Next-event estimation support: emissive triangle meshes and point sets,
/// selected proportionally to total area (meshes) or element count (point
/// sets). Built once per scene.
pub struct LightSampler {
    lights: Vec<Light>,
    cdf: Vec<Float>,
    total_weight: Float,
}

impl LightSampler {
    pub fn build(scene: &Scene) -> Self {
        let mut lights = Vec::new();
        let mut cdf = Vec::new();
        let mut total_weight = 0.0;

        for (index, instance) in scene.instances().iter().enumerate() {
            let material = scene.material(instance.material);
            if material.ke.is_black() {
                continue;
            }
            let shape = scene.shape(instance.shape);
            let kind = shape.kind();
            if kind == GeometryKind::Lines {
                continue;
            }

            let mut element_cdf = Vec::with_capacity(shape.element_count());
            let mut weight = 0.0;
            for element in 0..shape.element_count() {
                weight += match kind {
                    GeometryKind::Points => 1.0,
                    _ => shape.element_area(element),
                };
                element_cdf.push(weight);
            }
            if weight <= 0.0 {
                continue;
            }

            total_weight += weight;
            cdf.push(total_weight);
            lights.push(Light { instance: index, kind, element_cdf, weight });
        }

        log::info!("initialized {} lights", lights.len());
        Self { lights, cdf, total_weight }
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn total_weight(&self) -> Float {
        self.total_weight
    }

    fn find(&self, instance: usize) -> Option<&Light> {
        self.lights.iter().find(|light| light.instance == instance)
    }

    /// Picks one light by inverse-CDF lookup, samples a position on it
    /// uniformly by area, and probes the scene toward that position. The
    /// returned point is whatever the probe actually hit, so occlusion
    /// falls out of the evaluation path itself. None when the scene has no
    /// lights.
    pub fn sample(&self, scene: &Scene, from: &ShadePoint, rng: &mut LcgRng)
        -> Option<ShadePoint> {
        if self.is_empty() {
            return None;
        }

        let pick = rng.next_f32() * self.total_weight;
        let mut light_index = self.cdf.partition_point(|&c| c < pick);
        if light_index >= self.lights.len() {
            light_index = self.lights.len() - 1;
        }
        let light = &self.lights[light_index];

        let pick_element = rng.next_f32() * light.weight;
        let mut element = light.element_cdf.partition_point(|&c| c < pick_element);
        if element >= light.element_cdf.len() {
            element = light.element_cdf.len() - 1;
        }

        let shape = scene.shape(scene.instances()[light.instance].shape);
        let uv = match light.kind {
            GeometryKind::Triangles => square_to_triangle(&rng.next_2d()),
            _ => Vector2f::new(0.0, 0.0),
        };
        let (target, _, _) = shape.interpolate(element, uv);

        let direction = target - from.p;
        if direction.norm() <= EPSILON {
            return None;
        }
        let ray = Ray3f::new(from.p, direction, Some(EPSILON), None);
        Some(scene.intersect_point(&ray))
    }

    /// Solid-angle density of reaching `lp` from `from` through `sample`:
    /// selection probability times area density, converted by
    /// `dist^2 / cos(theta_light)`. Zero when `lp` is not light geometry.
    pub fn pdf(&self, from: &Vector3f, lp: &ShadePoint) -> Float {
        let instance = match lp.instance {
            Some(instance) => instance,
            None => return 0.0,
        };
        let light = match self.find(instance) {
            Some(light) => light,
            None => return 0.0,
        };

        let to_light = lp.p - *from;
        let dist2 = to_light.dot(&to_light);
        if dist2 <= 0.0 {
            return 0.0;
        }

        match light.kind {
            GeometryKind::Points => dist2 / self.total_weight,
            _ => {
                let dir = to_light / dist2.sqrt();
                let cos_light = lp.n.dot(&(-dir)).max(0.0);
                if cos_light <= 0.0 {
                    return 0.0;
                }
                // Selection weight cancels against the per-light area.
                dist2 / (self.total_weight * cos_light)
            }
        }
    }

    /// Reciprocal combined density; zero marks "no next-event contribution".
    pub fn weight(&self, from: &Vector3f, lp: &ShadePoint) -> Float {
        let pdf = self.pdf(from, lp);
        if pdf > 0.0 {
            1.0 / pdf
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scene::{Instance, Material, Scene};
    use crate::core::shape::{Shape, Topology};
    use crate::math::spectrum::RGBSpectrum;

    fn quad_shape(size: Float, z: Float) -> Shape {
        Shape::new(
            vec![
                Vector3f::new(-size, -size, z),
                Vector3f::new(size, -size, z),
                Vector3f::new(size, size, z),
                Vector3f::new(-size, size, z),
            ],
            Vec::new(),
            Vec::new(),
            Vec::new(),
            // Wound so the emitting side faces -z, toward the origin.
            Topology::Triangles(vec![[0, 2, 1], [0, 3, 2]]),
        )
    }

    fn emissive_material(e: Float) -> Material {
        Material {
            kd: RGBSpectrum::default(),
            ks: RGBSpectrum::default(),
            ke: RGBSpectrum::gray(e),
            rs: 0.0,
            kd_texture: None,
            ke_texture: None,
        }
    }

    fn light_scene() -> Scene {
        let mut scene = Scene::new();
        let small = scene.add_shape(quad_shape(0.5, 2.0));
        let large = scene.add_shape(quad_shape(1.0, 3.0));
        let material = scene.add_material(emissive_material(5.0));
        scene.add_instance(Instance { shape: small, material });
        scene.add_instance(Instance { shape: large, material });
        scene.build_bvh();
        scene
    }

    #[test]
    fn test_build_weights_proportional_to_area() {
        let scene = light_scene();
        let lights = LightSampler::build(&scene);
        assert_eq!(lights.len(), 2);
        // Quads of half-size 0.5 and 1.0 have areas 1 and 4.
        assert!((lights.total_weight() - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_build_skips_non_emissive() {
        let mut scene = Scene::new();
        let shape = scene.add_shape(quad_shape(1.0, 0.0));
        let material = scene.add_material(Material::default());
        scene.add_instance(Instance { shape, material });
        scene.build_bvh();

        let lights = LightSampler::build(&scene);
        assert!(lights.is_empty());

        let from = ShadePoint::void(Vector3f::new(0.0, 0.0, 1.0));
        let mut rng = LcgRng::new(1);
        assert!(lights.sample(&scene, &from, &mut rng).is_none());
    }

    #[test]
    fn test_sample_and_pdf_reciprocal() {
        let scene = light_scene();
        let lights = LightSampler::build(&scene);
        let mut from = ShadePoint::void(Vector3f::new(0.0, 0.0, 1.0));
        from.p = Vector3f::new(0.1, -0.2, 0.0);

        let mut rng = LcgRng::new(11);
        let mut hits = 0;
        for _ in 0..64 {
            let lp = match lights.sample(&scene, &from, &mut rng) {
                Some(lp) => lp,
                None => continue,
            };
            if lp.instance.is_none() {
                continue;
            }
            hits += 1;
            assert!(!lp.le.is_black());

            let pdf = lights.pdf(&from.p, &lp);
            let weight = lights.weight(&from.p, &lp);
            assert!(pdf > 0.0);
            assert!((pdf * weight - 1.0).abs() < 1e-4);
        }
        assert!(hits > 0);
    }

    #[test]
    fn test_pdf_zero_off_light() {
        let scene = light_scene();
        let lights = LightSampler::build(&scene);
        let env = ShadePoint::void(Vector3f::new(0.0, 0.0, 1.0));
        assert_eq!(lights.pdf(&Vector3f::zeros(), &env), 0.0);
        assert_eq!(lights.weight(&Vector3f::zeros(), &env), 0.0);
    }
}
