// Copyright @yucwang 2026

use crate::core::bvh::BVH;
use crate::core::point::ShadePoint;
use crate::core::rng::LcgRng;
use crate::core::shape::{GeometryKind, Shape};
use crate::core::texture::ImageTexture;
use crate::math::aabb::AABB;
use crate::math::constants::{ Float, Vector2f, Vector3f, PI, TWO_PI };
use crate::math::ray::Ray3f;
use crate::math::spectrum::RGBSpectrum;

/// Pinhole camera with a rigid frame. The image plane sits at unit
/// distance along `forward`; its half height is `2 tan(yfov / 2)`.
pub struct Camera {
    pub origin: Vector3f,
    pub right: Vector3f,
    pub up: Vector3f,
    pub forward: Vector3f,
    pub yfov: Float,
    pub aspect: Float,
}

impl Camera {
    pub fn look_at(origin: Vector3f,
                   target: Vector3f,
                   up: Vector3f,
                   yfov: Float,
                   aspect: Float) -> Self {
        let forward = (target - origin).normalize();
        let right = forward.cross(&up).normalize();
        let up = right.cross(&forward).normalize();
        Self { origin, right, up, forward, yfov, aspect }
    }

    /// Ray through the continuous image position (u, v) in [0,1)^2,
    /// v running top to bottom.
    pub fn ray_through(&self, u: Float, v: Float) -> Ray3f {
        let plane_h = 2.0 * (0.5 * self.yfov).tan();
        let plane_w = plane_h * self.aspect;
        let dir = self.right * ((u - 0.5) * plane_w)
            + self.up * ((0.5 - v) * plane_h)
            + self.forward;
        Ray3f::new(self.origin, dir, None, None)
    }

    /// One jittered primary ray through pixel (i, j) at the given vertical
    /// resolution. Pure in everything but the RNG stream.
    pub fn sample_ray(&self, i: usize, j: usize, resolution: usize, rng: &mut LcgRng) -> Ray3f {
        let width = (self.aspect * resolution as Float).round();
        let height = resolution as Float;
        let u = (i as Float + rng.next_f32()) / width;
        let v = (j as Float + rng.next_f32()) / height;
        self.ray_through(u, v)
    }
}

pub struct Material {
    pub kd: RGBSpectrum,
    pub ks: RGBSpectrum,
    pub ke: RGBSpectrum,
    pub rs: Float,
    pub kd_texture: Option<usize>,
    pub ke_texture: Option<usize>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            kd: RGBSpectrum::gray(0.7),
            ks: RGBSpectrum::default(),
            ke: RGBSpectrum::default(),
            rs: 0.1,
            kd_texture: None,
            ke_texture: None,
        }
    }
}

pub struct Environment {
    pub emission: RGBSpectrum,
    pub texture: Option<usize>,
}

pub struct Instance {
    pub shape: usize,
    pub material: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    pub instance: usize,
    pub element: usize,
    pub uv: Vector2f,
    pub t: Float,
}

/// The world as the estimators see it: read-only after load, shared by
/// every worker for the duration of a render.
pub struct Scene {
    cameras: Vec<Camera>,
    shapes: Vec<Shape>,
    materials: Vec<Material>,
    textures: Vec<ImageTexture>,
    instances: Vec<Instance>,
    environments: Vec<Environment>,
    bvh: Option<BVH>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            cameras: Vec::new(),
            shapes: Vec::new(),
            materials: Vec::new(),
            textures: Vec::new(),
            instances: Vec::new(),
            environments: Vec::new(),
            bvh: None,
        }
    }

    pub fn add_camera(&mut self, camera: Camera) -> usize {
        self.cameras.push(camera);
        self.cameras.len() - 1
    }

    pub fn add_shape(&mut self, shape: Shape) -> usize {
        self.shapes.push(shape);
        self.shapes.len() - 1
    }

    pub fn add_material(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    pub fn add_texture(&mut self, texture: ImageTexture) -> usize {
        self.textures.push(texture);
        self.textures.len() - 1
    }

    pub fn add_instance(&mut self, instance: Instance) -> usize {
        self.bvh = None;
        self.instances.push(instance);
        self.instances.len() - 1
    }

    pub fn add_environment(&mut self, environment: Environment) -> usize {
        self.environments.push(environment);
        self.environments.len() - 1
    }

    pub fn camera(&self, camera_id: usize) -> Option<&Camera> {
        self.cameras.get(camera_id)
    }

    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    pub fn shape(&self, index: usize) -> &Shape {
        &self.shapes[index]
    }

    pub fn material(&self, index: usize) -> &Material {
        &self.materials[index]
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn environments(&self) -> &[Environment] {
        &self.environments
    }

    /// Builds the instance-level BVH. Must run once after the scene is
    /// assembled and before any intersection query.
    pub fn build_bvh(&mut self) {
        let bounds: Vec<AABB> = self.instances
            .iter()
            .map(|instance| self.shapes[instance.shape].bounding_box())
            .collect();
        self.bvh = Some(BVH::build(&bounds));
    }

    pub fn intersect(&self, ray: &Ray3f) -> Option<RayHit> {
        let bvh = self.bvh.as_ref().expect("scene BVH must be built before intersection");
        bvh.intersect(ray, |instance, ray| {
            self.shapes[self.instances[instance].shape]
                .intersect(ray)
                .map(|(element, uv, t)| ((element, uv, t), t))
        })
        .map(|(instance, (element, uv, t))| RayHit { instance, element, uv, t })
    }

    fn sample_texture(&self, texture: Option<usize>, uv: Vector2f) -> RGBSpectrum {
        match texture.and_then(|index| self.textures.get(index)) {
            Some(texture) => texture.sample(uv),
            None => RGBSpectrum::white(),
        }
    }

    /// Summed emission of every environment along `dir`, using the
    /// latitude-longitude parametrization.
    pub fn eval_environment(&self, dir: &Vector3f) -> RGBSpectrum {
        let mut le = RGBSpectrum::default();
        if self.environments.is_empty() {
            return le;
        }

        let mut u = dir.z.atan2(dir.x) / TWO_PI;
        if u < 0.0 {
            u += 1.0;
        }
        let v = dir.y.max(-1.0).min(1.0).acos() / PI;
        let uv = Vector2f::new(u, v);
        for environment in &self.environments {
            le += environment.emission * self.sample_texture(environment.texture, uv);
        }
        le
    }

    /// The probe: one nearest-hit query turned into a ShadePoint. Misses
    /// become environment samples, or a void point in an unlit scene.
    pub fn intersect_point(&self, ray: &Ray3f) -> ShadePoint {
        let wo = -ray.dir();
        match self.intersect(ray) {
            Some(hit) => self.eval_hit(&hit, wo),
            None => {
                if self.environments.is_empty() {
                    ShadePoint::void(wo)
                } else {
                    ShadePoint::environment(self.eval_environment(&ray.dir()), wo)
                }
            }
        }
    }

    fn eval_hit(&self, hit: &RayHit, wo: Vector3f) -> ShadePoint {
        let instance = &self.instances[hit.instance];
        let shape = &self.shapes[instance.shape];
        let material = &self.materials[instance.material];

        let (p, n, tc) = shape.interpolate(hit.element, hit.uv);
        let kind = shape.kind();
        let n = match kind {
            GeometryKind::Points => wo,
            _ => n,
        };

        ShadePoint {
            instance: Some(hit.instance),
            kind,
            p,
            n,
            le: material.ke * self.sample_texture(material.ke_texture, tc),
            wo,
            kd: material.kd * self.sample_texture(material.kd_texture, tc),
            ks: material.ks,
            rs: material.rs,
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shape::Topology;

    pub fn camera_facing_negative_z() -> Camera {
        Camera::look_at(
            Vector3f::new(0.0, 0.0, 1.0),
            Vector3f::new(0.0, 0.0, 0.0),
            Vector3f::new(0.0, 1.0, 0.0),
            std::f32::consts::FRAC_PI_2,
            1.0,
        )
    }

    fn big_triangle() -> Shape {
        Shape::new(
            vec![
                Vector3f::new(-100.0, -100.0, -1.0),
                Vector3f::new(100.0, -100.0, -1.0),
                Vector3f::new(0.0, 100.0, -1.0),
            ],
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Topology::Triangles(vec![[0, 1, 2]]),
        )
    }

    #[test]
    fn test_camera_center_ray() {
        let camera = camera_facing_negative_z();
        let ray = camera.ray_through(0.5, 0.5);
        assert!((ray.dir() - camera.forward).norm() < 1e-6);

        let right_of_center = camera.ray_through(0.9, 0.5);
        assert!(right_of_center.dir().dot(&camera.right) > 0.0);
        let below_center = camera.ray_through(0.5, 0.9);
        assert!(below_center.dir().dot(&camera.up) < 0.0);
    }

    #[test]
    fn test_probe_environment_and_void() {
        let mut scene = Scene::new();
        scene.build_bvh();
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, -1.0), None, None);

        let void = scene.intersect_point(&ray);
        assert!(void.emission_only());
        assert!(void.le.is_black());
        assert!(void.instance.is_none());

        scene.add_environment(Environment {
            emission: RGBSpectrum::new(0.5, 1.0, 2.0),
            texture: None,
        });
        let env = scene.intersect_point(&ray);
        assert!(env.emission_only());
        assert_eq!(env.le, RGBSpectrum::new(0.5, 1.0, 2.0));
    }

    #[test]
    fn test_probe_emissive_surface() {
        let mut scene = Scene::new();
        let shape = scene.add_shape(big_triangle());
        let material = scene.add_material(Material {
            kd: RGBSpectrum::default(),
            ks: RGBSpectrum::default(),
            ke: RGBSpectrum::new(3.0, 3.0, 3.0),
            rs: 0.0,
            kd_texture: None,
            ke_texture: None,
        });
        scene.add_instance(Instance { shape, material });
        scene.build_bvh();

        let ray = Ray3f::new(Vector3f::new(0.0, 0.0, 1.0),
                             Vector3f::new(0.0, 0.0, -1.0), None, None);
        let point = scene.intersect_point(&ray);
        assert_eq!(point.instance, Some(0));
        assert!(point.emission_only());
        assert_eq!(point.le, RGBSpectrum::new(3.0, 3.0, 3.0));
        assert!((point.p.z - -1.0).abs() < 1e-5);
    }

    #[test]
    fn test_probe_diffuse_surface_defaults_white_texture() {
        let mut scene = Scene::new();
        let shape = scene.add_shape(big_triangle());
        let material = scene.add_material(Material {
            kd: RGBSpectrum::new(0.25, 0.5, 0.75),
            ..Material::default()
        });
        scene.add_instance(Instance { shape, material });
        scene.build_bvh();

        let ray = Ray3f::new(Vector3f::new(0.0, 0.0, 1.0),
                             Vector3f::new(0.0, 0.0, -1.0), None, None);
        let point = scene.intersect_point(&ray);
        assert!(!point.emission_only());
        assert_eq!(point.kd, RGBSpectrum::new(0.25, 0.5, 0.75));
        assert!(point.n.z.abs() > 0.99);
    }
}
