// Copyright @yucwang 2026

use crate::core::bvh::BVH;
use crate::math::aabb::AABB;
use crate::math::constants::{ Float, Vector2f, Vector3f };
use crate::math::ray::Ray3f;

const DEFAULT_RADIUS: Float = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Points,
    Lines,
    Triangles,
}

/// Element topology over the shared vertex arrays. A shape holds exactly
/// one kind; mixed-kind shapes are not representable.
pub enum Topology {
    Points(Vec<u32>),
    Lines(Vec<[u32; 2]>),
    Triangles(Vec<[u32; 3]>),
}

pub struct Shape {
    positions: Vec<Vector3f>,
    normals: Vec<Vector3f>,
    texcoords: Vec<Vector2f>,
    radius: Vec<Float>,
    topology: Topology,
    bvh: BVH,
}

impl Shape {
    pub fn new(positions: Vec<Vector3f>,
               normals: Vec<Vector3f>,
               texcoords: Vec<Vector2f>,
               radius: Vec<Float>,
               topology: Topology) -> Self {
        let mut shape = Self {
            positions,
            normals,
            texcoords,
            radius,
            topology,
            bvh: BVH::build(&[]),
        };
        let bounds: Vec<AABB> = (0..shape.element_count())
            .map(|e| shape.element_bounds(e))
            .collect();
        shape.bvh = BVH::build(&bounds);
        shape
    }

    pub fn kind(&self) -> GeometryKind {
        match self.topology {
            Topology::Points(_) => GeometryKind::Points,
            Topology::Lines(_) => GeometryKind::Lines,
            Topology::Triangles(_) => GeometryKind::Triangles,
        }
    }

    pub fn element_count(&self) -> usize {
        match &self.topology {
            Topology::Points(points) => points.len(),
            Topology::Lines(lines) => lines.len(),
            Topology::Triangles(triangles) => triangles.len(),
        }
    }

    pub fn positions(&self) -> &[Vector3f] {
        &self.positions
    }

    fn vertex_radius(&self, index: u32) -> Float {
        self.radius.get(index as usize).copied().unwrap_or(DEFAULT_RADIUS)
    }

    pub fn element_bounds(&self, element: usize) -> AABB {
        match &self.topology {
            Topology::Points(points) => {
                let v = points[element];
                let p = self.positions[v as usize];
                AABB::new(p, p).padded(self.vertex_radius(v))
            }
            Topology::Lines(lines) => {
                let [v0, v1] = lines[element];
                let r = self.vertex_radius(v0).max(self.vertex_radius(v1));
                AABB::new(self.positions[v0 as usize], self.positions[v1 as usize]).padded(r)
            }
            Topology::Triangles(triangles) => {
                let [v0, v1, v2] = triangles[element];
                let mut bounds = AABB::new(self.positions[v0 as usize],
                                           self.positions[v1 as usize]);
                bounds.expand_by_point(&self.positions[v2 as usize]);
                bounds
            }
        }
    }

    pub fn bounding_box(&self) -> AABB {
        let mut bounds = AABB::default();
        for e in 0..self.element_count() {
            bounds.expand_by_aabb(&self.element_bounds(e));
        }
        bounds
    }

    /// Nearest element hit: (element, barycentric uv, t).
    pub fn intersect(&self, ray: &Ray3f) -> Option<(usize, Vector2f, Float)> {
        self.bvh
            .intersect(ray, |element, ray| {
                self.intersect_element(element, ray).map(|(uv, t)| ((uv, t), t))
            })
            .map(|(element, (uv, t))| (element, uv, t))
    }

    pub fn intersect_element(&self, element: usize, ray: &Ray3f) -> Option<(Vector2f, Float)> {
        match &self.topology {
            Topology::Points(points) => {
                let v = points[element];
                self.intersect_point(self.positions[v as usize], self.vertex_radius(v), ray)
            }
            Topology::Lines(lines) => {
                let [v0, v1] = lines[element];
                self.intersect_line(v0, v1, ray)
            }
            Topology::Triangles(triangles) => {
                let [v0, v1, v2] = triangles[element];
                self.intersect_triangle(self.positions[v0 as usize],
                                        self.positions[v1 as usize],
                                        self.positions[v2 as usize],
                                        ray)
            }
        }
    }

    fn intersect_point(&self, center: Vector3f, radius: Float, ray: &Ray3f)
        -> Option<(Vector2f, Float)> {
        let oc = ray.origin() - center;
        let b = oc.dot(&ray.dir());
        let c = oc.dot(&oc) - radius * radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }

        let sqrt_disc = disc.sqrt();
        let t0 = -b - sqrt_disc;
        let t1 = -b + sqrt_disc;
        let t = if ray.test_segment(t0) {
            t0
        } else if ray.test_segment(t1) {
            t1
        } else {
            return None;
        };
        Some((Vector2f::new(0.0, 0.0), t))
    }

    fn intersect_line(&self, v0: u32, v1: u32, ray: &Ray3f) -> Option<(Vector2f, Float)> {
        let p0 = self.positions[v0 as usize];
        let p1 = self.positions[v1 as usize];
        let ab = p1 - p0;
        let len2 = ab.dot(&ab);
        if len2 < 1e-12 {
            return None;
        }

        // Closest approach between the ray and the segment.
        let w0 = ray.origin() - p0;
        let b = ray.dir().dot(&ab);
        let d = w0.dot(&ray.dir());
        let e = w0.dot(&ab);
        let denom = b * b - len2;
        if denom.abs() < 1e-12 {
            return None;
        }
        let mut u = (d * b - e) / denom;
        u = u.max(0.0).min(1.0);
        let on_segment = p0 + ab * u;
        let t = (on_segment - ray.origin()).dot(&ray.dir());
        if !ray.test_segment(t) {
            return None;
        }

        let r = self.vertex_radius(v0) * (1.0 - u) + self.vertex_radius(v1) * u;
        let dist = (ray.at(t) - on_segment).norm();
        if dist > r {
            return None;
        }
        Some((Vector2f::new(u, 0.0), t))
    }

    // Moeller-Trumbore.
    fn intersect_triangle(&self, p0: Vector3f, p1: Vector3f, p2: Vector3f, ray: &Ray3f)
        -> Option<(Vector2f, Float)> {
        let edge1 = p1 - p0;
        let edge2 = p2 - p0;
        let pvec = ray.dir().cross(&edge2);
        let det = edge1.dot(&pvec);
        if det.abs() < 1e-12 {
            return None;
        }

        let inv_det = 1.0 / det;
        let tvec = ray.origin() - p0;
        let u = tvec.dot(&pvec) * inv_det;
        if u < 0.0 || u > 1.0 {
            return None;
        }
        let qvec = tvec.cross(&edge1);
        let v = ray.dir().dot(&qvec) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = edge2.dot(&qvec) * inv_det;
        if !ray.test_segment(t) {
            return None;
        }
        Some((Vector2f::new(u, v), t))
    }

    /// Barycentric interpolation of position, normal and texcoord over the
    /// hit element. The returned normal is the face normal when the shape
    /// carries no vertex normals; for lines it is the segment tangent.
    pub fn interpolate(&self, element: usize, uv: Vector2f) -> (Vector3f, Vector3f, Vector2f) {
        match &self.topology {
            Topology::Points(points) => {
                let v = points[element] as usize;
                let n = self.normals.get(v).copied().unwrap_or_else(Vector3f::zeros);
                (self.positions[v], n, self.texcoord(v))
            }
            Topology::Lines(lines) => {
                let [v0, v1] = lines[element];
                let (v0, v1) = (v0 as usize, v1 as usize);
                let u = uv.x;
                let p = self.positions[v0] * (1.0 - u) + self.positions[v1] * u;
                let tangent = (self.positions[v1] - self.positions[v0]).normalize();
                let tc = self.texcoord(v0) * (1.0 - u) + self.texcoord(v1) * u;
                (p, tangent, tc)
            }
            Topology::Triangles(triangles) => {
                let [v0, v1, v2] = triangles[element];
                let (v0, v1, v2) = (v0 as usize, v1 as usize, v2 as usize);
                let w0 = 1.0 - uv.x - uv.y;
                let p = self.positions[v0] * w0
                    + self.positions[v1] * uv.x
                    + self.positions[v2] * uv.y;
                let n = if self.normals.len() == self.positions.len() {
                    (self.normals[v0] * w0 + self.normals[v1] * uv.x + self.normals[v2] * uv.y)
                        .normalize()
                } else {
                    (self.positions[v1] - self.positions[v0])
                        .cross(&(self.positions[v2] - self.positions[v0]))
                        .normalize()
                };
                let tc = self.texcoord(v0) * w0 + self.texcoord(v1) * uv.x + self.texcoord(v2) * uv.y;
                (p, n, tc)
            }
        }
    }

    fn texcoord(&self, vertex: usize) -> Vector2f {
        self.texcoords.get(vertex).copied().unwrap_or_else(Vector2f::zeros)
    }

    pub fn element_area(&self, element: usize) -> Float {
        match &self.topology {
            Topology::Points(_) => 1.0,
            Topology::Lines(lines) => {
                let [v0, v1] = lines[element];
                (self.positions[v1 as usize] - self.positions[v0 as usize]).norm()
            }
            Topology::Triangles(triangles) => {
                let [v0, v1, v2] = triangles[element];
                let e1 = self.positions[v1 as usize] - self.positions[v0 as usize];
                let e2 = self.positions[v2 as usize] - self.positions[v0 as usize];
                0.5 * e1.cross(&e2).norm()
            }
        }
    }
}
